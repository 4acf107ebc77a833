//! 链式、方言感知的 SQL 构建器
//!
//! ```ignore
//! use sqlxfluent::{table, use_grammar};
//!
//! use_grammar("postgres");
//! let builder = table("users")
//!     .select(["id", "name"])
//!     .and_where("age", ">", 18)
//!     .order_by("name", "ASC")
//!     .limit(10);
//!
//! assert_eq!(
//!     builder.sql(),
//!     r#"SELECT "id", "name" FROM "users" WHERE "age" > $1 ORDER BY "name" ASC LIMIT $2"#
//! );
//! ```

pub mod builder;
pub mod components;
pub mod db_pool;
pub mod error;
pub mod executor;
pub mod expression;
pub mod grammar;
pub mod model;
pub mod operator;
pub mod registry;
pub mod transaction;
pub mod value;

pub use builder::{table, Builder, InValues, Joiner};
pub use components::{Column, Source};
pub use db_pool::{DbDriver, DbPool};
pub use error::{Result, SqlxFluentError};
pub use executor::{ExecResult, FromDbRow, Querier};
pub use expression::{raw, Expression};
pub use grammar::{Grammar, MySqlGrammar, PostgresGrammar, SqliteGrammar};
pub use model::{IntoData, Model};
pub use registry::{default_grammar, register_grammar, use_grammar};
pub use transaction::Transaction;
pub use value::{BindValue, Data, Value};

// 重新导出 derive 的所有公共 API（宏）
pub use sqlxfluent_derive::*;
