use super::Builder;
use crate::components::{Boolean, Clause, Column, JoinClause, JoinCondition, JoinKind, JoinOn};
use crate::operator;
use crate::value::{BindValue, Value};

/// JOIN 的 ON 条件构造器
///
/// ```ignore
/// table("users as us").left_join_with("orders as ord", |j| {
///     j.on("us.id", "=", "ord.user_id").and_where("ord.status", "=", "paid")
/// });
/// ```
#[derive(Debug, Clone)]
pub struct Joiner {
    clause: JoinClause,
    bindings: Vec<BindValue>,
}

impl Joiner {
    fn new(kind: JoinKind, table: Column) -> Self {
        let bindings = table.bindings().to_vec();
        Self {
            clause: JoinClause {
                kind,
                table,
                conditions: Vec::new(),
            },
            bindings,
        }
    }

    /// 两列比较
    pub fn on(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.columns(Boolean::And, first.into(), operator, second.into())
    }

    pub fn or_on(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.columns(Boolean::Or, first.into(), operator, second.into())
    }

    /// 列与绑定值比较
    pub fn and_where(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.value(Boolean::And, column.into(), operator, value.into())
    }

    pub fn or_where(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.value(Boolean::Or, column.into(), operator, value.into())
    }

    fn columns(mut self, boolean: Boolean, first: Column, operator: &str, second: Column) -> Self {
        let operator = operator::checked(operator);
        self.bindings.extend_from_slice(first.bindings());
        self.bindings.extend_from_slice(second.bindings());
        self.push(
            boolean,
            JoinOn::Columns {
                first,
                operator,
                second,
            },
        );
        self
    }

    fn value(mut self, boolean: Boolean, column: Column, operator: &str, value: Value) -> Self {
        let operator = operator::checked(operator);
        self.bindings.extend_from_slice(column.bindings());
        self.bindings.extend(value.bindings());
        self.push(
            boolean,
            JoinOn::Value {
                column,
                operator,
                value,
            },
        );
        self
    }

    fn push(&mut self, boolean: Boolean, on: JoinOn) {
        let boolean = if self.clause.conditions.is_empty() {
            Boolean::None
        } else {
            boolean
        };
        self.clause.conditions.push(JoinCondition { boolean, on });
    }
}

impl Builder {
    /// `INNER JOIN table ON ( first operator second )`
    pub fn join(
        self,
        table: impl Into<Column>,
        first: &str,
        operator: &str,
        second: &str,
    ) -> Self {
        self.join_with(table, |j| j.on(first, operator, second))
    }

    pub fn left_join(
        self,
        table: impl Into<Column>,
        first: &str,
        operator: &str,
        second: &str,
    ) -> Self {
        self.left_join_with(table, |j| j.on(first, operator, second))
    }

    /// 通过 [`Joiner`] 组合多个 ON 条件
    pub fn join_with<F>(self, table: impl Into<Column>, f: F) -> Self
    where
        F: FnOnce(Joiner) -> Joiner,
    {
        self.push_join(f(Joiner::new(JoinKind::Inner, table.into())))
    }

    pub fn left_join_with<F>(self, table: impl Into<Column>, f: F) -> Self
    where
        F: FnOnce(Joiner) -> Joiner,
    {
        self.push_join(f(Joiner::new(JoinKind::Left, table.into())))
    }

    fn push_join(mut self, joiner: Joiner) -> Self {
        self.bindings.push(Clause::Join, joiner.bindings);
        self.components.joins.push(joiner.clause);
        self
    }
}
