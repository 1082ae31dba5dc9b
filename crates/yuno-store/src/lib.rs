//! Policy cache storage: the `policies` table behind a read/upsert trait.

mod cache;
mod error;
mod filter;

pub use cache::{PolicyCache, StoredPage};
pub use error::StoreError;
pub use filter::{PageOrder, QueryBuilder, SqlValue};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckPolicyStore;
