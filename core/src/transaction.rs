use crate::db_pool::{DbDriver, DbPool};
use crate::error::{Result, SqlxFluentError};
use crate::executor::{
    exec_on, fetch_all_on, fetch_optional_on, log_statement, ExecResult, FromDbRow, Querier,
};
use crate::value::BindValue;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;

/// 宏：简化事务闭包的写法，自动处理 `Box::pin`
///
/// 使用示例：
/// ```ignore
/// sqlxfluent::transaction!(pool, |tx| async move {
///     tx.execute(&table("users").insert([row])).await?;
///     Ok(())
/// }).await?;
/// ```
#[macro_export]
macro_rules! transaction {
    // 匹配引用形式：&pool
    (&$pool:expr, |$tx:ident| async move $body:block) => {
        $pool.transaction(|$tx| Box::pin(async move $body))
    };
    // 匹配值形式：pool（会自动借用）
    ($pool:expr, |$tx:ident| async move $body:block) => {
        $pool.transaction(|$tx| Box::pin(async move $body))
    };
}

/// 数据库事务包装器
///
/// `commit` / `rollback` 会消耗事务；未提交就被丢弃的事务由 sqlx 自动回滚。
#[derive(Debug)]
pub enum Transaction<'tx> {
    MySql(sqlx::Transaction<'tx, sqlx::MySql>),
    Postgres(sqlx::Transaction<'tx, sqlx::Postgres>),
    Sqlite(sqlx::Transaction<'tx, sqlx::Sqlite>),
}

impl<'tx> Transaction<'tx> {
    /// 获取事务的驱动类型
    pub fn driver(&self) -> DbDriver {
        match self {
            Transaction::MySql(_) => DbDriver::MySql,
            Transaction::Postgres(_) => DbDriver::Postgres,
            Transaction::Sqlite(_) => DbDriver::Sqlite,
        }
    }

    /// 提交事务
    pub async fn commit(self) -> Result<()> {
        match self {
            Transaction::MySql(tx) => tx.commit().await?,
            Transaction::Postgres(tx) => tx.commit().await?,
            Transaction::Sqlite(tx) => tx.commit().await?,
        }
        tracing::debug!(target: "sqlxfluent::sql", "transaction committed");
        Ok(())
    }

    /// 回滚事务
    pub async fn rollback(self) -> Result<()> {
        match self {
            Transaction::MySql(tx) => tx.rollback().await?,
            Transaction::Postgres(tx) => tx.rollback().await?,
            Transaction::Sqlite(tx) => tx.rollback().await?,
        }
        tracing::debug!(target: "sqlxfluent::sql", "transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl<'tx> Querier for Transaction<'tx> {
    fn driver(&self) -> DbDriver {
        Transaction::driver(self)
    }

    async fn exec(&mut self, sql: &str, binds: Vec<BindValue>) -> Result<ExecResult> {
        log_statement(sql, &binds);
        match self {
            Transaction::MySql(tx) => {
                let result = exec_on!(sqlx::MySql, &mut **tx, sql, binds);
                Ok(ExecResult {
                    rows_affected: result.rows_affected(),
                    last_insert_id: Some(result.last_insert_id() as i64),
                })
            }
            Transaction::Postgres(tx) => {
                let result = exec_on!(sqlx::Postgres, &mut **tx, sql, binds);
                Ok(ExecResult {
                    rows_affected: result.rows_affected(),
                    last_insert_id: None,
                })
            }
            Transaction::Sqlite(tx) => {
                let result = exec_on!(sqlx::Sqlite, &mut **tx, sql, binds);
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
        let rows = match self {
            Transaction::MySql(tx) => fetch_all_on!(sqlx::MySql, T, &mut **tx, sql, binds),
            Transaction::Postgres(tx) => fetch_all_on!(sqlx::Postgres, T, &mut **tx, sql, binds),
            Transaction::Sqlite(tx) => fetch_all_on!(sqlx::Sqlite, T, &mut **tx, sql, binds),
        };
        Ok(rows)
    }

    async fn fetch_optional<T: FromDbRow>(
        &mut self,
        sql: &str,
        binds: Vec<BindValue>,
    ) -> Result<Option<T>> {
        log_statement(sql, &binds);
        let row = match self {
            Transaction::MySql(tx) => fetch_optional_on!(sqlx::MySql, T, &mut **tx, sql, binds),
            Transaction::Postgres(tx) => {
                fetch_optional_on!(sqlx::Postgres, T, &mut **tx, sql, binds)
            }
            Transaction::Sqlite(tx) => fetch_optional_on!(sqlx::Sqlite, T, &mut **tx, sql, binds),
        };
        Ok(row)
    }
}

impl DbPool {
    /// 开始一个事务
    pub async fn begin(&self) -> Result<Transaction<'static>> {
        let tx = match self.driver() {
            DbDriver::MySql => {
                let pool = self.mysql_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                Transaction::MySql(pool.begin().await?)
            }
            DbDriver::Postgres => {
                let pool = self.pg_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                Transaction::Postgres(pool.begin().await?)
            }
            DbDriver::Sqlite => {
                let pool = self.sqlite_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                Transaction::Sqlite(pool.begin().await?)
            }
        };
        tracing::debug!(
            target: "sqlxfluent::sql",
            driver = self.driver().name(),
            "transaction started"
        );
        Ok(tx)
    }

    /// 在事务中执行闭包函数
    /// 如果闭包返回 Ok，则自动提交事务
    /// 如果闭包返回 Err，则自动回滚事务
    ///
    /// 推荐配合 [`transaction!`](crate::transaction) 宏使用。
    pub async fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        for<'a> F: FnOnce(
            &'a mut Transaction<'static>,
        )
            -> Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send + 'a>>,
        E: From<SqlxFluentError>,
    {
        let mut tx = self.begin().await.map_err(E::from)?;

        match f(&mut tx).await {
            Ok(result) => {
                tx.commit().await.map_err(E::from)?;
                Ok(result)
            }
            Err(e) => {
                // 回滚失败时保留原始错误
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(target: "sqlxfluent::sql", error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }
}
