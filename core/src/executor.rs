use crate::builder::Builder;
use crate::db_pool::{DbDriver, DbPool};
use crate::error::{Result, SqlxFluentError};
use crate::value::BindValue;
use async_trait::async_trait;

/// 可从三种数据库行类型解码的结果类型
pub trait FromDbRow:
    Send
    + Unpin
    + 'static
    + for<'r> sqlx::FromRow<'r, sqlx::mysql::MySqlRow>
    + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>
    + for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow>
{
}

impl<T> FromDbRow for T where
    T: Send
        + Unpin
        + 'static
        + for<'r> sqlx::FromRow<'r, sqlx::mysql::MySqlRow>
        + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>
        + for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow>
{
}

/// 写操作的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// MySQL / SQLite 的自增 ID，PostgreSQL 请使用 `returning`
    pub last_insert_id: Option<i64>,
}

pub(crate) fn log_statement(sql: &str, binds: &[BindValue]) {
    tracing::debug!(target: "sqlxfluent::sql", sql, binds = ?binds, "executing statement");
}

macro_rules! exec_on {
    ($db:ty, $executor:expr, $sql:expr, $binds:expr) => {{
        let mut query = sqlx::query::<$db>($sql);
        for bind in $binds {
            $crate::apply_bind_value!(query, bind);
        }
        query.execute($executor).await?
    }};
}

macro_rules! fetch_all_on {
    ($db:ty, $row:ty, $executor:expr, $sql:expr, $binds:expr) => {{
        let mut query = sqlx::query_as::<$db, $row>($sql);
        for bind in $binds {
            $crate::apply_bind_value!(query, bind);
        }
        query.fetch_all($executor).await?
    }};
}

macro_rules! fetch_optional_on {
    ($db:ty, $row:ty, $executor:expr, $sql:expr, $binds:expr) => {{
        let mut query = sqlx::query_as::<$db, $row>($sql);
        for bind in $binds {
            $crate::apply_bind_value!(query, bind);
        }
        query.fetch_optional($executor).await?
    }};
}

pub(crate) use {exec_on, fetch_all_on, fetch_optional_on};

/// 数据库执行器，统一 DbPool 和 Transaction 的接口
///
/// `exec` / `fetch_*` 接收已经生成好的 SQL；`execute` / `get` / `first`
/// 接收构建器，并使用执行器自身驱动对应的方言生成 SQL。
#[async_trait]
pub trait Querier: Send {
    /// 获取驱动类型
    fn driver(&self) -> DbDriver;

    async fn exec(&mut self, sql: &str, binds: Vec<BindValue>) -> Result<ExecResult>;

    async fn fetch_all<T: FromDbRow>(&mut self, sql: &str, binds: Vec<BindValue>)
        -> Result<Vec<T>>;

    async fn fetch_optional<T: FromDbRow>(
        &mut self,
        sql: &str,
        binds: Vec<BindValue>,
    ) -> Result<Option<T>>;

    /// 执行 insert / update / delete
    async fn execute(&mut self, builder: &Builder) -> Result<ExecResult> {
        let (sql, binds) = builder.build_for(self.driver().grammar().as_ref());
        self.exec(&sql, binds).await
    }

    /// 查询所有行
    async fn get<T: FromDbRow>(&mut self, builder: &Builder) -> Result<Vec<T>> {
        let (sql, binds) = builder.build_for(self.driver().grammar().as_ref());
        self.fetch_all(&sql, binds).await
    }

    /// 查询第一行，没有结果时返回 [`SqlxFluentError::NoRows`]
    async fn first<T: FromDbRow>(&mut self, builder: &Builder) -> Result<T> {
        let (sql, binds) = builder.build_for(self.driver().grammar().as_ref());
        self.fetch_optional(&sql, binds)
            .await?
            .ok_or(SqlxFluentError::NoRows)
    }
}

#[async_trait]
impl Querier for DbPool {
    fn driver(&self) -> DbDriver {
        DbPool::driver(self)
    }

    async fn exec(&mut self, sql: &str, binds: Vec<BindValue>) -> Result<ExecResult> {
        log_statement(sql, &binds);
        match DbPool::driver(self) {
            DbDriver::MySql => {
                let pool = self.mysql_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                let result = exec_on!(sqlx::MySql, pool, sql, binds);
                Ok(ExecResult {
                    rows_affected: result.rows_affected(),
                    last_insert_id: Some(result.last_insert_id() as i64),
                })
            }
            DbDriver::Postgres => {
                let pool = self.pg_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                let result = exec_on!(sqlx::Postgres, pool, sql, binds);
                Ok(ExecResult {
                    rows_affected: result.rows_affected(),
                    last_insert_id: None,
                })
            }
            DbDriver::Sqlite => {
                let pool = self.sqlite_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                let result = exec_on!(sqlx::Sqlite, pool, sql, binds);
                Ok(ExecResult {
                    rows_affected: result.rows_affected(),
                    last_insert_id: Some(result.last_insert_rowid()),
                })
            }
        }
    }

    async fn fetch_all<T: FromDbRow>(
        &mut self,
        sql: &str,
        binds: Vec<BindValue>,
    ) -> Result<Vec<T>> {
        log_statement(sql, &binds);
        let rows = match DbPool::driver(self) {
            DbDriver::MySql => {
                let pool = self.mysql_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                fetch_all_on!(sqlx::MySql, T, pool, sql, binds)
            }
            DbDriver::Postgres => {
                let pool = self.pg_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                fetch_all_on!(sqlx::Postgres, T, pool, sql, binds)
            }
            DbDriver::Sqlite => {
                let pool = self.sqlite_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                fetch_all_on!(sqlx::Sqlite, T, pool, sql, binds)
            }
        };
        Ok(rows)
    }

    async fn fetch_optional<T: FromDbRow>(
        &mut self,
        sql: &str,
        binds: Vec<BindValue>,
    ) -> Result<Option<T>> {
        log_statement(sql, &binds);
        let row = match DbPool::driver(self) {
            DbDriver::MySql => {
                let pool = self.mysql_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                fetch_optional_on!(sqlx::MySql, T, pool, sql, binds)
            }
            DbDriver::Postgres => {
                let pool = self.pg_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                fetch_optional_on!(sqlx::Postgres, T, pool, sql, binds)
            }
            DbDriver::Sqlite => {
                let pool = self.sqlite_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                fetch_optional_on!(sqlx::Sqlite, T, pool, sql, binds)
            }
        };
        Ok(row)
    }
}
