//! 构建器内部保存的子句结构，由编译器按方言渲染

use crate::builder::Builder;
use crate::expression::Expression;
use crate::value::{BindValue, Data, Value};
use std::collections::BTreeMap;

/// 语句类型，第一次设置后不再改变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Kind {
    #[default]
    Unset,
    Select,
    Insert,
    Update,
    Delete,
}

/// 绑定值分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Clause {
    Select,
    Aggregate,
    From,
    Join,
    Set,
    Values,
    Where,
    Group,
    Having,
    Order,
    Limit,
    Offset,
}

impl Kind {
    /// 各语句类型下绑定值的输出顺序，与编译时子句的顺序一致
    pub(crate) fn clauses(self) -> &'static [Clause] {
        match self {
            Kind::Unset | Kind::Select => &[
                Clause::Select,
                Clause::Aggregate,
                Clause::From,
                Clause::Join,
                Clause::Where,
                Clause::Group,
                Clause::Having,
                Clause::Order,
                Clause::Limit,
                Clause::Offset,
            ],
            Kind::Insert => &[Clause::From, Clause::Values],
            Kind::Update => &[Clause::From, Clause::Set, Clause::Where],
            Kind::Delete => &[Clause::From, Clause::Where],
        }
    }
}

/// 条件之间的连接词，追加时确定：第一个条件为 `None`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Boolean {
    None,
    And,
    Or,
}

impl Boolean {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Boolean::None => "",
            Boolean::And => "AND",
            Boolean::Or => "OR",
        }
    }
}

/// 列引用：普通名称（会被转义）或原始片段
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Name(String),
    Raw(Expression),
}

impl Column {
    pub(crate) fn bindings(&self) -> &[BindValue] {
        match self {
            Column::Name(_) => &[],
            Column::Raw(expr) => expr.bindings(),
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::Name(name.to_string())
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::Name(name)
    }
}

impl From<&String> for Column {
    fn from(name: &String) -> Self {
        Column::Name(name.clone())
    }
}

impl From<Expression> for Column {
    fn from(expr: Expression) -> Self {
        Column::Raw(expr)
    }
}

/// FROM 数据源
#[derive(Debug, Clone)]
pub enum Source {
    /// 表名，可带别名：`users as u`
    Table(String),
    Raw(Expression),
    /// 子查询，别名取子查询的表名
    Query(Box<Builder>),
}

impl From<&str> for Source {
    fn from(name: &str) -> Self {
        Source::Table(name.to_string())
    }
}

impl From<String> for Source {
    fn from(name: String) -> Self {
        Source::Table(name)
    }
}

impl From<Expression> for Source {
    fn from(expr: Expression) -> Self {
        Source::Raw(expr)
    }
}

impl From<Builder> for Source {
    fn from(builder: Builder) -> Self {
        Source::Query(Box::new(builder))
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Predicate {
    Base {
        column: Column,
        operator: &'static str,
        value: Value,
    },
    Raw(Expression),
    /// 括号分组，保存分组内的条件
    Group(Vec<Condition>),
    Between {
        column: Column,
        min: Value,
        max: Value,
        not: bool,
    },
    Null {
        column: Column,
        not: bool,
    },
    In {
        column: Column,
        values: Vec<Value>,
        not: bool,
    },
    InQuery {
        column: Column,
        query: Box<Builder>,
        not: bool,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Condition {
    pub(crate) boolean: Boolean,
    pub(crate) predicate: Predicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum JoinOn {
    /// 两列比较：`a.id = b.a_id`
    Columns {
        first: Column,
        operator: &'static str,
        second: Column,
    },
    /// 列与值比较
    Value {
        column: Column,
        operator: &'static str,
        value: Value,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct JoinCondition {
    pub(crate) boolean: Boolean,
    pub(crate) on: JoinOn,
}

#[derive(Debug, Clone)]
pub(crate) struct JoinClause {
    pub(crate) kind: JoinKind,
    pub(crate) table: Column,
    pub(crate) conditions: Vec<JoinCondition>,
}

#[derive(Debug, Clone)]
pub(crate) struct Aggregate {
    pub(crate) function: &'static str,
    pub(crate) column: Column,
    pub(crate) alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// 仅接受 ASC / DESC（不区分大小写）
    pub(crate) fn parse(direction: &str) -> Self {
        match direction.trim().to_uppercase().as_str() {
            "ASC" => Direction::Asc,
            "DESC" => Direction::Desc,
            _ => panic!(
                "sqlxfluent: order direction \"{}\" is not allowed",
                direction
            ),
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Order {
    pub(crate) column: Column,
    pub(crate) direction: Direction,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct InsertRows {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Components {
    pub(crate) select: Vec<Column>,
    pub(crate) aggregates: Vec<Aggregate>,
    pub(crate) from: Option<Source>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) wheres: Vec<Condition>,
    pub(crate) groups: Vec<Column>,
    pub(crate) havings: Vec<Condition>,
    pub(crate) orders: Vec<Order>,
    pub(crate) limit: Option<Value>,
    pub(crate) offset: Option<Value>,
    pub(crate) set: Option<Data>,
    pub(crate) insert: Option<InsertRows>,
    pub(crate) or_ignore: bool,
    pub(crate) returning: Vec<String>,
}

/// 按子句分类保存的绑定值
#[derive(Debug, Clone, Default)]
pub(crate) struct Bindings(BTreeMap<Clause, Vec<BindValue>>);

impl Bindings {
    pub(crate) fn push<I>(&mut self, clause: Clause, values: I)
    where
        I: IntoIterator<Item = BindValue>,
    {
        self.0.entry(clause).or_default().extend(values);
    }

    /// 覆盖某一类绑定值（LIMIT / OFFSET / FROM 只保留最后一次）
    pub(crate) fn replace(&mut self, clause: Clause, values: Vec<BindValue>) {
        self.0.insert(clause, values);
    }

    pub(crate) fn get(&self, clause: Clause) -> &[BindValue] {
        self.0.get(&clause).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn flatten(&self, kind: Kind) -> Vec<BindValue> {
        kind.clauses()
            .iter()
            .flat_map(|clause| self.get(*clause).iter().cloned())
            .collect()
    }
}
