//! Policy service: serves listings from the cache while fresh, reads through
//! to the open API otherwise, and rebuilds the cache with a full sync.

pub mod error;
pub mod service;

pub use error::ServiceError;
pub use service::PolicyService;
