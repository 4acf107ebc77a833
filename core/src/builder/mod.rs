//! 链式 SQL 构建器
//!
//! 通过 [`table`] 或 [`Builder::new`] 创建，链式调用积累子句，
//! 最后由 [`Builder::sql`] / [`Builder::data`] 生成语句与绑定值。

mod conditions;
mod join;

pub use conditions::InValues;
pub use join::Joiner;

use crate::components::{
    Aggregate, Bindings, Clause, Column, Components, Direction, InsertRows, Kind, Order, Source,
};
use crate::expression::Expression;
use crate::grammar::compiler::Compiler;
use crate::grammar::Grammar;
use crate::registry;
use crate::value::{BindValue, Data, Value};
use std::sync::Arc;

/// 从数据源创建构建器：表名（可带别名）、原始片段或子查询
pub fn table(source: impl Into<Source>) -> Builder {
    Builder::new().from(source)
}

#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) kind: Kind,
    pub(crate) table: String,
    pub(crate) components: Components,
    pub(crate) bindings: Bindings,
    grammar: Option<Arc<dyn Grammar>>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定该构建器使用的方言，优先于全局默认方言
    pub fn with_grammar(mut self, grammar: Arc<dyn Grammar>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    /// 当前表名（含别名写法）
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// 表的别名，没有别名时为表名本身
    pub(crate) fn alias(&self) -> Option<&str> {
        self.table.split_whitespace().last()
    }

    /// 替换 FROM 数据源
    pub fn from(mut self, source: impl Into<Source>) -> Self {
        let source = source.into();
        let bindings = match &source {
            Source::Table(name) => {
                self.table = name.trim().to_string();
                Vec::new()
            }
            Source::Raw(expr) => expr.bindings().to_vec(),
            Source::Query(sub) => sub.data(),
        };
        self.bindings.replace(Clause::From, bindings);
        self.components.from = Some(source);
        self
    }

    /// 追加查询列，支持 `name as alias` 写法
    pub fn select<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Column>,
    {
        if !self.mark(Kind::Select) {
            return self;
        }
        for column in columns {
            let column = column.into();
            self.bindings
                .push(Clause::Select, column.bindings().iter().cloned());
            self.components.select.push(column);
        }
        self
    }

    /// 追加原始查询列
    pub fn select_raw(self, expr: impl Into<Expression>) -> Self {
        self.select([Column::Raw(expr.into())])
    }

    pub fn count(self, column: impl Into<Column>, alias: &str) -> Self {
        self.aggregate("COUNT", column.into(), alias)
    }

    pub fn sum(self, column: impl Into<Column>, alias: &str) -> Self {
        self.aggregate("SUM", column.into(), alias)
    }

    pub fn avg(self, column: impl Into<Column>, alias: &str) -> Self {
        self.aggregate("AVG", column.into(), alias)
    }

    pub fn min(self, column: impl Into<Column>, alias: &str) -> Self {
        self.aggregate("MIN", column.into(), alias)
    }

    pub fn max(self, column: impl Into<Column>, alias: &str) -> Self {
        self.aggregate("MAX", column.into(), alias)
    }

    fn aggregate(mut self, function: &'static str, column: Column, alias: &str) -> Self {
        if !self.mark(Kind::Select) {
            return self;
        }
        self.bindings
            .push(Clause::Aggregate, column.bindings().iter().cloned());
        self.components.aggregates.push(Aggregate {
            function,
            column,
            alias: alias.to_string(),
        });
        self
    }

    pub fn group_by<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Column>,
    {
        for column in columns {
            let column = column.into();
            self.bindings
                .push(Clause::Group, column.bindings().iter().cloned());
            self.components.groups.push(column);
        }
        self
    }

    pub fn group_by_raw(self, expr: impl Into<Expression>) -> Self {
        self.group_by([Column::Raw(expr.into())])
    }

    /// 排序，`direction` 只接受 ASC / DESC
    pub fn order_by(mut self, column: impl Into<Column>, direction: &str) -> Self {
        let direction = Direction::parse(direction);
        let column = column.into();
        self.bindings
            .push(Clause::Order, column.bindings().iter().cloned());
        self.components.orders.push(Order { column, direction });
        self
    }

    /// LIMIT 以参数形式绑定，重复调用以最后一次为准
    pub fn limit(mut self, limit: impl Into<Value>) -> Self {
        let limit = limit.into();
        self.bindings.replace(Clause::Limit, limit.bindings());
        self.components.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: impl Into<Value>) -> Self {
        let offset = offset.into();
        self.bindings.replace(Clause::Offset, offset.bindings());
        self.components.offset = Some(offset);
        self
    }

    /// 插入一行或多行
    ///
    /// 第一行确定列顺序（按列名排序），之后每行的列必须完全一致。
    /// 再次调用会继续追加行。
    pub fn insert<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = Data>,
    {
        if !self.mark(Kind::Insert) {
            return self;
        }
        let insert = self
            .components
            .insert
            .get_or_insert_with(InsertRows::default);

        for row in rows {
            let columns = row.columns();
            if insert.rows.is_empty() {
                insert.columns = columns;
            } else if columns != insert.columns {
                panic!(
                    "sqlxfluent: insert row columns {:?} do not match {:?}",
                    columns, insert.columns
                );
            }

            let values = row.into_values();
            for value in &values {
                self.bindings.push(Clause::Values, value.bindings());
            }
            insert.rows.push(values);
        }
        self
    }

    /// 插入冲突时忽略该行（MySQL `INSERT IGNORE`、SQLite `INSERT OR IGNORE`、
    /// PostgreSQL `ON CONFLICT DO NOTHING`）
    pub fn or_ignore(mut self) -> Self {
        self.components.or_ignore = true;
        self
    }

    /// 插入后返回的列，MySQL 下忽略
    pub fn returning<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.components
            .returning
            .extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn update(mut self, data: Data) -> Self {
        if !self.mark(Kind::Update) {
            return self;
        }
        let bindings = data.iter().flat_map(|(_, value)| value.bindings()).collect();
        self.bindings.replace(Clause::Set, bindings);
        self.components.set = Some(data);
        self
    }

    pub fn delete(mut self) -> Self {
        self.mark(Kind::Delete);
        self
    }

    /// 设置语句类型，已经是其他类型时返回 false，本次调用不生效
    fn mark(&mut self, kind: Kind) -> bool {
        if self.kind == Kind::Unset {
            self.kind = kind;
        }
        self.kind == kind
    }

    /// 使用当前方言生成 SQL
    ///
    /// 方言优先取 [`Builder::with_grammar`]，其次取全局默认方言，都没有时 panic。
    pub fn sql(&self) -> String {
        let grammar = self.resolve_grammar();
        self.sql_for(grammar.as_ref())
    }

    /// 使用指定方言生成 SQL，可重复调用，结果一致
    pub fn sql_for(&self, grammar: &dyn Grammar) -> String {
        let sql = Compiler::new(grammar).compile(self);
        tracing::trace!(
            target: "sqlxfluent::compile",
            dialect = grammar.name(),
            sql = %sql,
            "compiled statement"
        );
        sql
    }

    /// 按占位符顺序排列的绑定值
    pub fn data(&self) -> Vec<BindValue> {
        self.bindings.flatten(self.kind)
    }

    pub fn build(&self) -> (String, Vec<BindValue>) {
        (self.sql(), self.data())
    }

    pub fn build_for(&self, grammar: &dyn Grammar) -> (String, Vec<BindValue>) {
        (self.sql_for(grammar), self.data())
    }

    fn resolve_grammar(&self) -> Arc<dyn Grammar> {
        self.grammar
            .clone()
            .or_else(registry::default_grammar)
            .unwrap_or_else(|| panic!("sqlxfluent: no grammar selected, call use_grammar first"))
    }
}
