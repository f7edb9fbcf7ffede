use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    Connection(String),
    #[error("Database query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Corrupt row in ohlcv_data: {0}")]
    CorruptRow(String),
}
