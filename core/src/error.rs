use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlxFluentError {
    #[error("Unsupported database URL: {0}")]
    UnsupportedDatabase(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("No connection pool available for driver")]
    NoPoolAvailable,
    /// 查询结果为空（first 等单行查询）
    #[error("No rows in result set")]
    NoRows,
    /// 数据载荷无法转换（例如非对象的 JSON）
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SqlxFluentError>;
