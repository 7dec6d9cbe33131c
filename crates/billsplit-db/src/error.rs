//! Errors raised by the cache database.
//!
//! `billsplit-ledger` folds every variant into `LedgerError::Cache`, which
//! the server reports as a 500.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// The file could not be opened or the pool is gone.
    #[error("Cannot open cache database: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected a statement.
    #[error("Cache query failed: {0}")]
    QueryFailed(String),

    #[error("Cache transaction failed: {0}")]
    TransactionFailed(String),

    /// No connection became free in time, usually a long-held write lock.
    #[error("Cache database busy")]
    Busy,

    #[error("Cache database error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),
            sqlx::Error::ColumnNotFound(column) => {
                DbError::Internal(format!("missing column {column}"))
            }
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_categorized() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::Busy));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::Internal(_)
        ));
    }
}
