use super::Builder;
use crate::components::{Boolean, Clause, Column, Condition, Predicate};
use crate::expression::Expression;
use crate::operator;
use crate::value::{BindValue, Value};
use chrono::NaiveDateTime;

/// `IN` 条件的取值：值列表、子查询，或用于构造子查询的回调
pub enum InValues<'a> {
    List(Vec<Value>),
    Query(Builder),
    With(Box<dyn FnOnce(Builder) -> Builder + 'a>),
}

impl<'a> InValues<'a> {
    /// 回调收到一个空的构建器，返回的构建器作为子查询
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(Builder) -> Builder + 'a,
    {
        InValues::With(Box::new(f))
    }
}

impl<'a, T: Into<Value>> From<Vec<T>> for InValues<'a> {
    fn from(values: Vec<T>) -> Self {
        InValues::List(values.into_iter().map(Into::into).collect())
    }
}

impl<'a, T: Into<Value>, const N: usize> From<[T; N]> for InValues<'a> {
    fn from(values: [T; N]) -> Self {
        InValues::List(values.into_iter().map(Into::into).collect())
    }
}

impl<'a, 'b, T: Into<Value> + Clone> From<&'b [T]> for InValues<'a> {
    fn from(values: &'b [T]) -> Self {
        InValues::List(values.iter().cloned().map(Into::into).collect())
    }
}

impl<'a, 'b, T: Into<Value> + Clone> From<&'b Vec<T>> for InValues<'a> {
    fn from(values: &'b Vec<T>) -> Self {
        values.as_slice().into()
    }
}

impl<'a> From<Builder> for InValues<'a> {
    fn from(query: Builder) -> Self {
        InValues::Query(query)
    }
}

// 单个值视为只有一个元素的列表
macro_rules! impl_in_single {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'a> From<$ty> for InValues<'a> {
                fn from(value: $ty) -> Self {
                    InValues::List(vec![value.into()])
                }
            }
        )*
    };
}

impl_in_single!(
    String,
    &str,
    i64,
    i32,
    i16,
    u32,
    f64,
    f32,
    bool,
    NaiveDateTime,
    BindValue,
    Expression,
);

impl Builder {
    // ========== WHERE ==========

    /// `column operator value`，运算符不在白名单内时 panic
    pub fn and_where(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.base(Clause::Where, Boolean::And, column.into(), operator, value.into())
    }

    pub fn or_where(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.base(Clause::Where, Boolean::Or, column.into(), operator, value.into())
    }

    pub fn where_raw(self, expr: impl Into<Expression>) -> Self {
        self.raw_condition(Clause::Where, Boolean::And, expr.into())
    }

    pub fn or_where_raw(self, expr: impl Into<Expression>) -> Self {
        self.raw_condition(Clause::Where, Boolean::Or, expr.into())
    }

    /// 括号分组：`builder.where_group(|b| b.and_where("a", "=", 1).or_where("b", "=", 2))`
    ///
    /// 回调返回的构建器没有任何条件时，不输出分组。
    pub fn where_group<F>(self, f: F) -> Self
    where
        F: FnOnce(Builder) -> Builder,
    {
        self.group(Clause::Where, Boolean::And, f)
    }

    pub fn or_where_group<F>(self, f: F) -> Self
    where
        F: FnOnce(Builder) -> Builder,
    {
        self.group(Clause::Where, Boolean::Or, f)
    }

    /// `column IN ( ... )`，取值可以是列表、单个值、子查询或回调
    ///
    /// 空列表输出恒假条件 `0 = 1`。
    pub fn where_in<'a>(
        self,
        column: impl Into<Column>,
        values: impl Into<InValues<'a>>,
    ) -> Self {
        self.in_condition(Boolean::And, column.into(), values.into(), false)
    }

    pub fn or_where_in<'a>(
        self,
        column: impl Into<Column>,
        values: impl Into<InValues<'a>>,
    ) -> Self {
        self.in_condition(Boolean::Or, column.into(), values.into(), false)
    }

    /// 空列表输出恒真条件 `1 = 1`
    pub fn where_not_in<'a>(
        self,
        column: impl Into<Column>,
        values: impl Into<InValues<'a>>,
    ) -> Self {
        self.in_condition(Boolean::And, column.into(), values.into(), true)
    }

    pub fn or_where_not_in<'a>(
        self,
        column: impl Into<Column>,
        values: impl Into<InValues<'a>>,
    ) -> Self {
        self.in_condition(Boolean::Or, column.into(), values.into(), true)
    }

    pub fn where_between(
        self,
        column: impl Into<Column>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Self {
        self.between(Boolean::And, column.into(), min.into(), max.into(), false)
    }

    pub fn or_where_between(
        self,
        column: impl Into<Column>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Self {
        self.between(Boolean::Or, column.into(), min.into(), max.into(), false)
    }

    pub fn where_not_between(
        self,
        column: impl Into<Column>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Self {
        self.between(Boolean::And, column.into(), min.into(), max.into(), true)
    }

    pub fn or_where_not_between(
        self,
        column: impl Into<Column>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Self {
        self.between(Boolean::Or, column.into(), min.into(), max.into(), true)
    }

    pub fn where_null(self, column: impl Into<Column>) -> Self {
        self.null(Boolean::And, column.into(), false)
    }

    pub fn or_where_null(self, column: impl Into<Column>) -> Self {
        self.null(Boolean::Or, column.into(), false)
    }

    pub fn where_not_null(self, column: impl Into<Column>) -> Self {
        self.null(Boolean::And, column.into(), true)
    }

    pub fn or_where_not_null(self, column: impl Into<Column>) -> Self {
        self.null(Boolean::Or, column.into(), true)
    }

    // ========== HAVING ==========

    pub fn having(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.base(Clause::Having, Boolean::And, column.into(), operator, value.into())
    }

    pub fn or_having(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.base(Clause::Having, Boolean::Or, column.into(), operator, value.into())
    }

    pub fn having_raw(self, expr: impl Into<Expression>) -> Self {
        self.raw_condition(Clause::Having, Boolean::And, expr.into())
    }

    pub fn or_having_raw(self, expr: impl Into<Expression>) -> Self {
        self.raw_condition(Clause::Having, Boolean::Or, expr.into())
    }

    /// 回调中使用 `having` / `or_having` 添加分组内的条件
    ///
    /// 只有 `having*` 系列的调用会进入分组，回调里的 `where*` 条件会被丢弃。
    pub fn having_group<F>(self, f: F) -> Self
    where
        F: FnOnce(Builder) -> Builder,
    {
        self.group(Clause::Having, Boolean::And, f)
    }

    pub fn or_having_group<F>(self, f: F) -> Self
    where
        F: FnOnce(Builder) -> Builder,
    {
        self.group(Clause::Having, Boolean::Or, f)
    }

    // ========== 内部实现 ==========

    fn base(
        mut self,
        clause: Clause,
        boolean: Boolean,
        column: Column,
        operator: &str,
        value: Value,
    ) -> Self {
        let operator = operator::checked(operator);
        let mut bindings = column.bindings().to_vec();
        bindings.extend(value.bindings());
        self.push_condition(
            clause,
            boolean,
            Predicate::Base {
                column,
                operator,
                value,
            },
            bindings,
        );
        self
    }

    fn raw_condition(mut self, clause: Clause, boolean: Boolean, expr: Expression) -> Self {
        let bindings = expr.bindings().to_vec();
        self.push_condition(clause, boolean, Predicate::Raw(expr), bindings);
        self
    }

    fn group<F>(mut self, clause: Clause, boolean: Boolean, f: F) -> Self
    where
        F: FnOnce(Builder) -> Builder,
    {
        let mut scoped = f(self.scoped());
        let bindings = scoped.bindings.get(clause).to_vec();
        let conditions = match clause {
            Clause::Having => std::mem::take(&mut scoped.components.havings),
            _ => std::mem::take(&mut scoped.components.wheres),
        };
        if !conditions.is_empty() {
            self.push_condition(clause, boolean, Predicate::Group(conditions), bindings);
        }
        self
    }

    fn in_condition(
        mut self,
        boolean: Boolean,
        column: Column,
        values: InValues<'_>,
        not: bool,
    ) -> Self {
        let query = match values {
            InValues::List(values) if values.is_empty() => {
                // 空列表不引用列，列上的绑定值也不输出
                let constant = if not { "1 = 1" } else { "0 = 1" };
                self.push_condition(
                    Clause::Where,
                    boolean,
                    Predicate::Raw(Expression::new(constant)),
                    Vec::new(),
                );
                return self;
            }
            InValues::List(values) => {
                let mut bindings = column.bindings().to_vec();
                for value in &values {
                    bindings.extend(value.bindings());
                }
                self.push_condition(
                    Clause::Where,
                    boolean,
                    Predicate::In {
                        column,
                        values,
                        not,
                    },
                    bindings,
                );
                return self;
            }
            InValues::Query(query) => query,
            InValues::With(f) => f(Builder::new()),
        };

        let mut bindings = column.bindings().to_vec();
        bindings.extend(query.data());
        self.push_condition(
            Clause::Where,
            boolean,
            Predicate::InQuery {
                column,
                query: Box::new(query),
                not,
            },
            bindings,
        );
        self
    }

    fn between(
        mut self,
        boolean: Boolean,
        column: Column,
        min: Value,
        max: Value,
        not: bool,
    ) -> Self {
        let mut bindings = column.bindings().to_vec();
        bindings.extend(min.bindings());
        bindings.extend(max.bindings());
        self.push_condition(
            Clause::Where,
            boolean,
            Predicate::Between {
                column,
                min,
                max,
                not,
            },
            bindings,
        );
        self
    }

    fn null(mut self, boolean: Boolean, column: Column, not: bool) -> Self {
        let bindings = column.bindings().to_vec();
        self.push_condition(Clause::Where, boolean, Predicate::Null { column, not }, bindings);
        self
    }

    /// 分组回调使用的构建器，沿用当前表名
    fn scoped(&self) -> Builder {
        Builder {
            table: self.table.clone(),
            ..Builder::default()
        }
    }

    fn push_condition(
        &mut self,
        clause: Clause,
        boolean: Boolean,
        predicate: Predicate,
        bindings: Vec<BindValue>,
    ) {
        let conditions = match clause {
            Clause::Having => &mut self.components.havings,
            _ => &mut self.components.wheres,
        };
        // 第一个条件不带连接词
        let boolean = if conditions.is_empty() {
            Boolean::None
        } else {
            boolean
        };
        conditions.push(Condition { boolean, predicate });
        self.bindings.push(clause, bindings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::table;
    use crate::grammar::{MySqlGrammar, PostgresGrammar};
    use crate::raw;

    fn pg(builder: &Builder) -> String {
        builder.sql_for(&PostgresGrammar)
    }

    #[test]
    fn test_where_or_group() {
        let builder = table("users")
            .and_where("id", "=", 1)
            .or_where_group(|b| b.and_where("id", "=", 2).or_where("id", "=", 3));
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "users" WHERE "id" = $1 OR ( "id" = $2 OR "id" = $3 )"#
        );
        assert_eq!(
            builder.data(),
            vec![BindValue::from(1), BindValue::from(2), BindValue::from(3)]
        );
    }

    #[test]
    fn test_nested_groups() {
        let builder = table("users").where_group(|b| {
            b.and_where("a", "=", 1)
                .or_where_group(|b| b.and_where("b", "=", 2).and_where("c", "=", 3))
        });
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "users" WHERE ( "a" = $1 OR ( "b" = $2 AND "c" = $3 ) )"#
        );
    }

    #[test]
    fn test_empty_group_is_skipped() {
        let builder = table("users")
            .and_where("id", "=", 1)
            .or_where_group(|b| b);
        assert_eq!(pg(&builder), r#"SELECT * FROM "users" WHERE "id" = $1"#);
    }

    #[test]
    fn test_group_receives_table() {
        let builder = table("users").where_group(|b| {
            assert_eq!(b.table_name(), "users");
            b.and_where("id", "=", 1)
        });
        assert_eq!(pg(&builder), r#"SELECT * FROM "users" WHERE ( "id" = $1 )"#);
    }

    #[test]
    fn test_where_raw() {
        let builder = table("users")
            .where_raw("id = 1")
            .or_where("age", "=", crate::raw("2"));
        assert_eq!(pg(&builder), r#"SELECT * FROM "users" WHERE id = 1 OR "age" = 2"#);
        assert!(builder.data().is_empty());
    }

    #[test]
    fn test_where_raw_placeholders_follow_counter() {
        let builder = table("users")
            .and_where("city", "=", "Moscow")
            .where_raw(raw!("age BETWEEN ? AND ?", 18, 30))
            .and_where("status", "=", 1);
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "users" WHERE "city" = $1 AND age BETWEEN $2 AND $3 AND "status" = $4"#
        );
        assert_eq!(builder.data().len(), 4);
    }

    #[test]
    fn test_where_null() {
        let builder = table("users")
            .where_null("country")
            .where_not_null("city")
            .or_where_null("region")
            .or_where_not_null("zip");
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "users" WHERE "country" IS NULL AND "city" IS NOT NULL OR "region" IS NULL OR "zip" IS NOT NULL"#
        );
    }

    #[test]
    fn test_where_between() {
        let builder = table("users")
            .where_between("create_at", "2019-01-01", "2019-12-31")
            .where_not_between("create_at", "2019-06-01", "2019-06-30");
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "users" WHERE "create_at" BETWEEN $1 AND $2 AND "create_at" NOT BETWEEN $3 AND $4"#
        );
        assert_eq!(
            builder.data(),
            vec![
                BindValue::from("2019-01-01"),
                BindValue::from("2019-12-31"),
                BindValue::from("2019-06-01"),
                BindValue::from("2019-06-30")
            ]
        );
    }

    #[test]
    fn test_where_in_list() {
        let builder = table("users")
            .where_in("id", vec![1, 2, 3])
            .or_where_in("id", [4, 5])
            .or_where_in("id", 6);
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "users" WHERE "id" IN ( $1, $2, $3 ) OR "id" IN ( $4, $5 ) OR "id" IN ( $6 )"#
        );
        assert_eq!(builder.data().len(), 6);
    }

    #[test]
    fn test_where_in_slice() {
        let ids = vec![7_i64, 8];
        let builder = table("users").where_not_in("id", &ids);
        assert_eq!(pg(&builder), r#"SELECT * FROM "users" WHERE "id" NOT IN ( $1, $2 )"#);
        assert_eq!(builder.data(), vec![BindValue::Int64(7), BindValue::Int64(8)]);
    }

    #[test]
    fn test_where_in_empty() {
        let empty: Vec<i32> = Vec::new();
        let builder = table("users")
            .where_in("id", empty.clone())
            .or_where_not_in("id", empty);
        assert_eq!(pg(&builder), r#"SELECT * FROM "users" WHERE 0 = 1 OR 1 = 1"#);
        assert!(builder.data().is_empty());
    }

    #[test]
    fn test_where_in_sub_query() {
        let builder = table("users").where_in(
            "id",
            InValues::with(|b| {
                b.from("orders")
                    .select(["user_id"])
                    .and_where("city", "=", "Moscow")
            }),
        );
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "users" WHERE "id" IN ( SELECT "user_id" FROM "orders" WHERE "city" = $1 )"#
        );
        assert_eq!(builder.data(), vec![BindValue::from("Moscow")]);
    }

    #[test]
    fn test_where_not_in_builder() {
        let banned = table("bans").select(["user_id"]).and_where("active", "=", true);
        let builder = table("users")
            .and_where("age", ">", 18)
            .where_not_in("id", banned);
        assert_eq!(
            builder.sql_for(&MySqlGrammar),
            "SELECT * FROM `users` WHERE `age` > ? AND `id` NOT IN ( SELECT `user_id` FROM `bans` WHERE `active` = ? )"
        );
        assert_eq!(
            builder.data(),
            vec![BindValue::from(18), BindValue::from(true)]
        );
    }

    #[test]
    fn test_where_sub_query_value() {
        let latest = table("orders").select_raw("MAX(created_at)");
        let builder = table("orders").and_where("created_at", "=", latest);
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "orders" WHERE "created_at" = ( SELECT MAX(created_at) FROM "orders" )"#
        );
    }

    #[test]
    fn test_raw_column() {
        let builder = table("users").and_where(raw!("lower(name) || ?", "x"), "LIKE", "jack%");
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "users" WHERE lower(name) || $1 LIKE $2"#
        );
        assert_eq!(
            builder.data(),
            vec![BindValue::from("x"), BindValue::from("jack%")]
        );
    }

    #[test]
    #[should_panic(expected = "sqlxfluent: operator")]
    fn test_where_rejects_operator() {
        table("users").and_where("id", "===", 1);
    }

    #[test]
    fn test_having() {
        let builder = table("users")
            .select(["country"])
            .count("*", "count")
            .and_where("age", ">", 18)
            .group_by(["country"])
            .having_group(|b| b.having("count", ">", 10).having("count", "<", 100))
            .or_having_raw(raw!("SUM(score) > ?", 1000));
        assert_eq!(
            pg(&builder),
            r#"SELECT "country", COUNT(*) as "count" FROM "users" WHERE "age" > $1 GROUP BY "country" HAVING ( "count" > $2 AND "count" < $3 ) OR SUM(score) > $4"#
        );
        assert_eq!(
            builder.data(),
            vec![
                BindValue::from(18),
                BindValue::from(10),
                BindValue::from(100),
                BindValue::from(1000)
            ]
        );
    }

    #[test]
    fn test_or_having() {
        let builder = table("users")
            .group_by(["city"])
            .having("total", ">=", 5)
            .or_having("total", "=", 0);
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "users" GROUP BY "city" HAVING "total" >= $1 OR "total" = $2"#
        );
    }

    #[test]
    fn test_having_group_ignores_where_calls() {
        let builder = table("users")
            .group_by(["city"])
            .having_group(|b| b.where_null("city").having("n", ">", 1));
        assert_eq!(
            pg(&builder),
            r#"SELECT * FROM "users" GROUP BY "city" HAVING ( "n" > $1 )"#
        );
        assert_eq!(builder.data(), vec![BindValue::from(1)]);
    }
}
