use thiserror::Error;
use yuno_core::RowError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("malformed policy row: {0}")]
    Row(#[from] RowError),

    #[error("{0}")]
    Other(String),
}
