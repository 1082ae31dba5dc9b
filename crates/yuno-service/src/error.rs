use thiserror::Error;
use yuno_store::StoreError;

/// Failures the service surfaces. Upstream failures never appear here: every
/// read path recovers from them by falling back to the cache.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("cache error: {0}")]
    Store(#[from] StoreError),
}
