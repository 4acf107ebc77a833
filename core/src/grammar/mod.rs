//! SQL 方言
//!
//! 每种方言只负责标识符转义、占位符和少量插入语法的差异，
//! 子句的拼接统一由 [`compiler`] 完成。

pub(crate) mod compiler;
mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;

use std::fmt;

pub trait Grammar: fmt::Debug + Send + Sync {
    /// 方言名称
    fn name(&self) -> &'static str;

    /// 转义单个标识符
    fn quote(&self, identifier: &str) -> String;

    /// 第 `index` 个占位符，从 1 开始
    fn placeholder(&self, index: usize) -> String;

    /// 转义带点号的名称，`*` 保持原样：`us.id` -> `"us"."id"`
    fn wrap_name(&self, name: &str) -> String {
        name.split('.')
            .map(|segment| {
                if segment == "*" {
                    segment.to_string()
                } else {
                    self.quote(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// INSERT 关键字，`or_ignore` 时部分方言在此处改写
    fn insert_keyword(&self, _or_ignore: bool) -> &'static str {
        "INSERT"
    }

    /// 插入冲突子句，输出在 VALUES 之后
    fn on_conflict(&self, _or_ignore: bool) -> &'static str {
        ""
    }

    fn supports_returning(&self) -> bool {
        true
    }
}

/// 用 `quote` 包裹标识符，内部同样的引号字符加倍
pub(crate) fn quote_with(identifier: &str, quote: char) -> String {
    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push(quote);
    for ch in identifier.chars() {
        if ch == quote {
            quoted.push(quote);
        }
        quoted.push(ch);
    }
    quoted.push(quote);
    quoted
}
