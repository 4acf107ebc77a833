use super::Grammar;
use crate::builder::Builder;
use crate::components::{
    Aggregate, Column, Components, Condition, JoinClause, JoinOn, Kind, Order, Predicate, Source,
};
use crate::expression::Expression;
use crate::value::Value;

/// 单次编译的状态
///
/// 每次生成 SQL 都新建一个 `Compiler`，占位符计数从 0 开始；
/// 子查询与外层语句共用同一个计数器。
pub(crate) struct Compiler<'g> {
    grammar: &'g dyn Grammar,
    placeholders: usize,
}

impl<'g> Compiler<'g> {
    pub(crate) fn new(grammar: &'g dyn Grammar) -> Self {
        Self {
            grammar,
            placeholders: 0,
        }
    }

    pub(crate) fn compile(&mut self, builder: &Builder) -> String {
        match builder.kind {
            Kind::Unset | Kind::Select => self.compile_select(builder),
            Kind::Insert => self.compile_insert(builder),
            Kind::Update => self.compile_update(builder),
            Kind::Delete => self.compile_delete(builder),
        }
    }

    fn compile_select(&mut self, builder: &Builder) -> String {
        let c = &builder.components;
        let parts = [
            self.compile_columns(c),
            self.compile_from(c),
            self.compile_joins(&c.joins),
            self.compile_conditions("WHERE", &c.wheres),
            self.compile_groups(&c.groups),
            self.compile_conditions("HAVING", &c.havings),
            self.compile_orders(&c.orders),
            self.compile_value("LIMIT", c.limit.as_ref()),
            self.compile_value("OFFSET", c.offset.as_ref()),
        ];
        combine(&parts)
    }

    fn compile_delete(&mut self, builder: &Builder) -> String {
        let c = &builder.components;
        let parts = [
            "DELETE".to_string(),
            self.compile_from(c),
            self.compile_conditions("WHERE", &c.wheres),
        ];
        combine(&parts)
    }

    fn compile_update(&mut self, builder: &Builder) -> String {
        let c = &builder.components;
        let table = format!("UPDATE {}", self.compile_target(builder));

        let mut assignments = Vec::new();
        if let Some(data) = &c.set {
            for (column, value) in data.iter() {
                let column = self.grammar.wrap_name(column);
                let value = self.parameter(value);
                assignments.push(format!("{} = {}", column, value));
            }
        }
        let set = if assignments.is_empty() {
            String::new()
        } else {
            format!("SET {}", assignments.join(", "))
        };

        let parts = [table, set, self.compile_conditions("WHERE", &c.wheres)];
        combine(&parts)
    }

    fn compile_insert(&mut self, builder: &Builder) -> String {
        let c = &builder.components;
        let grammar = self.grammar;
        let target = format!("INTO {}", self.compile_target(builder));

        let mut columns = String::new();
        let mut values = String::new();
        if let Some(insert) = c.insert.as_ref().filter(|i| !i.columns.is_empty()) {
            let wrapped: Vec<String> = insert
                .columns
                .iter()
                .map(|column| grammar.wrap_name(column))
                .collect();
            columns = format!("( {} )", wrapped.join(", "));

            let mut tuples = Vec::with_capacity(insert.rows.len());
            for row in &insert.rows {
                let params: Vec<String> = row.iter().map(|v| self.parameter(v)).collect();
                tuples.push(format!("( {} )", params.join(", ")));
            }
            values = format!("VALUES {}", tuples.join(", "));
        }

        let returning = if c.returning.is_empty() || !grammar.supports_returning() {
            String::new()
        } else {
            let wrapped: Vec<String> = c
                .returning
                .iter()
                .map(|column| grammar.wrap_name(column))
                .collect();
            format!("RETURNING {}", wrapped.join(", "))
        };

        let parts = [
            grammar.insert_keyword(c.or_ignore).to_string(),
            target,
            columns,
            values,
            grammar.on_conflict(c.or_ignore).to_string(),
            returning,
        ];
        combine(&parts)
    }

    fn compile_columns(&mut self, c: &Components) -> String {
        let mut columns = Vec::with_capacity(c.select.len() + c.aggregates.len());
        for column in &c.select {
            columns.push(self.wrap(column));
        }
        for aggregate in &c.aggregates {
            columns.push(self.compile_aggregate(aggregate));
        }

        if columns.is_empty() {
            "SELECT *".to_string()
        } else {
            format!("SELECT {}", columns.join(", "))
        }
    }

    fn compile_aggregate(&mut self, aggregate: &Aggregate) -> String {
        let column = self.wrap(&aggregate.column);
        if aggregate.alias.is_empty() {
            format!("{}({})", aggregate.function, column)
        } else {
            format!(
                "{}({}) as {}",
                aggregate.function,
                column,
                self.grammar.quote(&aggregate.alias)
            )
        }
    }

    fn compile_from(&mut self, c: &Components) -> String {
        match &c.from {
            None => String::new(),
            Some(Source::Table(name)) => format!("FROM {}", self.wrap_str(name)),
            Some(Source::Raw(expr)) => format!("FROM {}", self.prepare_raw(expr)),
            Some(Source::Query(sub)) => {
                let sql = self.compile(sub);
                match sub.alias() {
                    Some(alias) => format!("FROM ( {} ) as {}", sql, self.grammar.quote(alias)),
                    None => format!("FROM ( {} )", sql),
                }
            }
        }
    }

    /// UPDATE / INSERT 的目标表：表名或原始片段，子查询不能作为写入目标
    fn compile_target(&mut self, builder: &Builder) -> String {
        match &builder.components.from {
            Some(Source::Table(name)) => self.wrap_str(name),
            Some(Source::Raw(expr)) => self.prepare_raw(expr),
            Some(Source::Query(_)) => {
                panic!("sqlxfluent: a sub-query cannot be the target of INSERT or UPDATE")
            }
            None => self.wrap_str(&builder.table),
        }
    }

    fn compile_joins(&mut self, joins: &[JoinClause]) -> String {
        let mut compiled = Vec::with_capacity(joins.len());
        for join in joins {
            let table = self.wrap(&join.table);
            if join.conditions.is_empty() {
                compiled.push(format!("{} JOIN {}", join.kind.as_str(), table));
                continue;
            }

            let mut conditions = Vec::with_capacity(join.conditions.len());
            for condition in &join.conditions {
                let on = match &condition.on {
                    JoinOn::Columns {
                        first,
                        operator,
                        second,
                    } => {
                        let first = self.wrap(first);
                        let second = self.wrap(second);
                        format!("{} {} {}", first, operator, second)
                    }
                    JoinOn::Value {
                        column,
                        operator,
                        value,
                    } => {
                        let column = self.wrap(column);
                        let value = self.parameter(value);
                        format!("{} {} {}", column, operator, value)
                    }
                };
                conditions.push(combine(&[condition.boolean.as_str(), on.as_str()]));
            }

            compiled.push(format!(
                "{} JOIN {} ON ( {} )",
                join.kind.as_str(),
                table,
                conditions.join(" ")
            ));
        }
        compiled.join(" ")
    }

    fn compile_conditions(&mut self, keyword: &str, conditions: &[Condition]) -> String {
        if conditions.is_empty() {
            return String::new();
        }
        format!("{} {}", keyword, self.conditions(conditions))
    }

    fn conditions(&mut self, conditions: &[Condition]) -> String {
        let mut compiled = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let predicate = self.predicate(&condition.predicate);
            compiled.push(combine(&[condition.boolean.as_str(), predicate.as_str()]));
        }
        compiled.join(" ")
    }

    fn predicate(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Base {
                column,
                operator,
                value,
            } => {
                let column = self.wrap(column);
                let value = self.parameter(value);
                format!("{} {} {}", column, operator, value)
            }
            Predicate::Raw(expr) => self.prepare_raw(expr),
            Predicate::Group(conditions) => format!("( {} )", self.conditions(conditions)),
            Predicate::Between {
                column,
                min,
                max,
                not,
            } => {
                let column = self.wrap(column);
                let min = self.parameter(min);
                let max = self.parameter(max);
                let keyword = if *not { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{} {} {} AND {}", column, keyword, min, max)
            }
            Predicate::Null { column, not } => {
                let keyword = if *not { "IS NOT NULL" } else { "IS NULL" };
                format!("{} {}", self.wrap(column), keyword)
            }
            Predicate::In {
                column,
                values,
                not,
            } => {
                let column = self.wrap(column);
                let params: Vec<String> = values.iter().map(|v| self.parameter(v)).collect();
                format!("{} {} ( {} )", column, in_keyword(*not), params.join(", "))
            }
            Predicate::InQuery { column, query, not } => {
                let column = self.wrap(column);
                let sql = self.compile(query);
                format!("{} {} ( {} )", column, in_keyword(*not), sql)
            }
        }
    }

    fn compile_groups(&mut self, groups: &[Column]) -> String {
        if groups.is_empty() {
            return String::new();
        }
        let columns: Vec<String> = groups.iter().map(|c| self.wrap(c)).collect();
        format!("GROUP BY {}", columns.join(", "))
    }

    fn compile_orders(&mut self, orders: &[Order]) -> String {
        if orders.is_empty() {
            return String::new();
        }
        let mut compiled = Vec::with_capacity(orders.len());
        for order in orders {
            let column = self.wrap(&order.column);
            compiled.push(format!("{} {}", column, order.direction.as_str()));
        }
        format!("ORDER BY {}", compiled.join(", "))
    }

    fn compile_value(&mut self, keyword: &str, value: Option<&Value>) -> String {
        match value {
            Some(value) => format!("{} {}", keyword, self.parameter(value)),
            None => String::new(),
        }
    }

    fn parameter(&mut self, value: &Value) -> String {
        match value {
            Value::Bind(_) => self.next_placeholder(),
            Value::Raw(expr) => self.prepare_raw(expr),
            Value::Query(sub) => format!("( {} )", self.compile(sub)),
        }
    }

    fn next_placeholder(&mut self) -> String {
        self.placeholders += 1;
        self.grammar.placeholder(self.placeholders)
    }

    /// 原样输出片段，每个绑定值依次替换一个 `?`
    ///
    /// `?` 少于绑定值时，多出的绑定值仍然占用编号。
    fn prepare_raw(&mut self, expr: &Expression) -> String {
        let mut remaining = expr.bindings().len();
        if remaining == 0 {
            return expr.text().to_string();
        }

        let mut sql = String::with_capacity(expr.text().len() + remaining * 2);
        for ch in expr.text().chars() {
            if ch == '?' && remaining > 0 {
                sql.push_str(&self.next_placeholder());
                remaining -= 1;
            } else {
                sql.push(ch);
            }
        }
        self.placeholders += remaining;
        sql
    }

    fn wrap(&mut self, column: &Column) -> String {
        match column {
            Column::Name(name) => self.wrap_str(name),
            Column::Raw(expr) => self.prepare_raw(expr),
        }
    }

    /// `name`、`name alias`、`name as alias` 三种写法
    fn wrap_str(&self, value: &str) -> String {
        let segments: Vec<&str> = value.split_whitespace().collect();
        match segments.as_slice() {
            [] => String::new(),
            [name] => self.grammar.wrap_name(name),
            [name, alias] | [name, _, alias] => format!(
                "{} as {}",
                self.grammar.wrap_name(name),
                self.grammar.quote(alias)
            ),
            _ => self.grammar.wrap_name(value),
        }
    }
}

fn in_keyword(not: bool) -> &'static str {
    if not {
        "NOT IN"
    } else {
        "IN"
    }
}

/// 用单个空格拼接非空片段
pub(crate) fn combine<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
