use crate::builder::Builder;
use crate::error::{Result, SqlxFluentError};
use crate::executor::{log_statement, FromDbRow};
use crate::grammar::{Grammar, MySqlGrammar, PostgresGrammar, SqliteGrammar};
use futures_util::TryStreamExt;
use sqlx::Pool;
use std::sync::Arc;

/// 绑定值应用到 sqlx 查询上
#[macro_export]
macro_rules! apply_bind_value {
    ($query:expr, $bind:expr) => {
        match $bind {
            $crate::BindValue::String(s) => {
                $query = $query.bind(s);
            }
            $crate::BindValue::Int64(i) => {
                $query = $query.bind(i);
            }
            $crate::BindValue::Int32(i) => {
                $query = $query.bind(i);
            }
            $crate::BindValue::Int16(i) => {
                $query = $query.bind(i);
            }
            $crate::BindValue::Float64(f) => {
                $query = $query.bind(f);
            }
            $crate::BindValue::Float32(f) => {
                $query = $query.bind(f);
            }
            $crate::BindValue::Bool(b) => {
                $query = $query.bind(b);
            }
            $crate::BindValue::Bytes(bytes) => {
                $query = $query.bind(bytes);
            }
            $crate::BindValue::DateTime(dt) => {
                $query = $query.bind(dt);
            }
            $crate::BindValue::Null => {
                $query = $query.bind(Option::<String>::None);
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    MySql,
    Postgres,
    Sqlite,
}

impl DbDriver {
    pub fn from_url(url: &str) -> Result<Self> {
        if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Ok(DbDriver::MySql)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(DbDriver::Postgres)
        } else if url.starts_with("sqlite://") || url.starts_with("sqlite:") {
            Ok(DbDriver::Sqlite)
        } else {
            Err(SqlxFluentError::UnsupportedDatabase(url.to_string()))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DbDriver::MySql => "mysql",
            DbDriver::Postgres => "postgres",
            DbDriver::Sqlite => "sqlite3",
        }
    }

    /// 驱动对应的方言，执行语句时优先于全局默认方言
    pub fn grammar(&self) -> Arc<dyn Grammar> {
        match self {
            DbDriver::MySql => Arc::new(MySqlGrammar),
            DbDriver::Postgres => Arc::new(PostgresGrammar),
            DbDriver::Sqlite => Arc::new(SqliteGrammar),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbPool {
    driver: DbDriver,
    mysql: Option<Arc<Pool<sqlx::MySql>>>,
    pg: Option<Arc<Pool<sqlx::Postgres>>>,
    sqlite: Option<Arc<Pool<sqlx::Sqlite>>>,
}

impl DbPool {
    /// 从数据库 URL 连接并创建 DbPool
    pub async fn connect(url: &str) -> Result<Self> {
        let driver = DbDriver::from_url(url)?;

        let pool = match driver {
            DbDriver::MySql => {
                let pool = Pool::<sqlx::MySql>::connect(url).await?;
                Self::from_mysql_pool(Arc::new(pool))
            }
            DbDriver::Postgres => {
                let pool = Pool::<sqlx::Postgres>::connect(url).await?;
                Self::from_postgres_pool(Arc::new(pool))
            }
            DbDriver::Sqlite => {
                let pool = Pool::<sqlx::Sqlite>::connect(url).await?;
                Self::from_sqlite_pool(Arc::new(pool))
            }
        };
        tracing::info!(target: "sqlxfluent::pool", driver = driver.name(), "connected");
        Ok(pool)
    }

    /// 读取 `DATABASE_URL`（支持 .env 文件）并连接
    pub async fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| SqlxFluentError::Config("DATABASE_URL is not set".to_string()))?;
        Self::connect(&url).await
    }

    pub fn from_mysql_pool(pool: Arc<Pool<sqlx::MySql>>) -> Self {
        Self {
            driver: DbDriver::MySql,
            mysql: Some(pool),
            pg: None,
            sqlite: None,
        }
    }

    pub fn from_postgres_pool(pool: Arc<Pool<sqlx::Postgres>>) -> Self {
        Self {
            driver: DbDriver::Postgres,
            mysql: None,
            pg: Some(pool),
            sqlite: None,
        }
    }

    pub fn from_sqlite_pool(pool: Arc<Pool<sqlx::Sqlite>>) -> Self {
        Self {
            driver: DbDriver::Sqlite,
            mysql: None,
            pg: None,
            sqlite: Some(pool),
        }
    }

    pub fn driver(&self) -> DbDriver {
        self.driver
    }

    pub fn mysql_pool(&self) -> Option<&Pool<sqlx::MySql>> {
        self.mysql.as_deref()
    }

    pub fn pg_pool(&self) -> Option<&Pool<sqlx::Postgres>> {
        self.pg.as_deref()
    }

    pub fn sqlite_pool(&self) -> Option<&Pool<sqlx::Sqlite>> {
        self.sqlite.as_deref()
    }

    /// 分批读取查询结果
    ///
    /// 每凑满 `size` 行调用一次回调，最后不足一批的行也会交给回调；
    /// 回调返回 `Ok(false)` 时停止读取。
    pub async fn chunk<T, F>(&self, builder: &Builder, size: usize, mut callback: F) -> Result<()>
    where
        T: FromDbRow,
        F: FnMut(Vec<T>) -> Result<bool>,
    {
        let size = size.max(1);
        let (sql, binds) = builder.build_for(self.driver.grammar().as_ref());
        log_statement(&sql, &binds);

        macro_rules! drain {
            ($db:ty, $pool:expr) => {{
                let mut query = sqlx::query_as::<$db, T>(&sql);
                for bind in binds {
                    $crate::apply_bind_value!(query, bind);
                }
                let mut rows = query.fetch($pool);
                let mut batch = Vec::with_capacity(size);
                while let Some(row) = rows.try_next().await? {
                    batch.push(row);
                    if batch.len() == size {
                        let full = std::mem::replace(&mut batch, Vec::with_capacity(size));
                        if !callback(full)? {
                            return Ok(());
                        }
                    }
                }
                if !batch.is_empty() {
                    callback(batch)?;
                }
                Ok(())
            }};
        }

        match self.driver {
            DbDriver::MySql => {
                let pool = self.mysql_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                drain!(sqlx::MySql, pool)
            }
            DbDriver::Postgres => {
                let pool = self.pg_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                drain!(sqlx::Postgres, pool)
            }
            DbDriver::Sqlite => {
                let pool = self.sqlite_pool().ok_or(SqlxFluentError::NoPoolAvailable)?;
                drain!(sqlx::Sqlite, pool)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_from_url() {
        assert_eq!(
            DbDriver::from_url("mysql://root@localhost/app").unwrap(),
            DbDriver::MySql
        );
        assert_eq!(
            DbDriver::from_url("postgresql://localhost/app").unwrap(),
            DbDriver::Postgres
        );
        assert_eq!(
            DbDriver::from_url("sqlite::memory:").unwrap(),
            DbDriver::Sqlite
        );
        assert!(matches!(
            DbDriver::from_url("mssql://localhost"),
            Err(SqlxFluentError::UnsupportedDatabase(_))
        ));
    }

    #[test]
    fn test_driver_grammar() {
        assert_eq!(DbDriver::MySql.grammar().name(), "mysql");
        assert_eq!(DbDriver::Postgres.grammar().name(), "postgres");
        assert_eq!(DbDriver::Sqlite.grammar().name(), DbDriver::Sqlite.name());
    }
}
