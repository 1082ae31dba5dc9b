use async_trait::async_trait;
use yuno_core::{Policy, PolicyQuery};

use crate::StoreError;

/// A page of cached policies and the total match count ignoring the window.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPage {
    pub policies: Vec<Policy>,
    pub total: u64,
}

/// The cache operations the policy service depends on.
#[async_trait]
pub trait PolicyCache: Send + Sync {
    /// Filtered page ordered by popularity, then `updated_at`.
    async fn query_page(&self, query: &PolicyQuery) -> Result<StoredPage, StoreError>;

    /// Filtered page (no age bounds) ordered by popularity, then `created_at`.
    async fn query_cached_page(&self, query: &PolicyQuery) -> Result<StoredPage, StoreError>;

    /// Insert or overwrite one policy, stamping `cached_at` and `updated_at` to now.
    async fn upsert_one(&self, policy: &Policy) -> Result<(), StoreError>;

    /// Insert or overwrite many policies in one statement, keeping each
    /// element's own `cached_at`. Returns the number of rows written.
    async fn upsert_batch(&self, policies: &[Policy]) -> Result<usize, StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Policy>, StoreError>;
}
