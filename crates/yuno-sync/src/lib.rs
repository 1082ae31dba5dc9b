//! Upstream layer: the youth-policy open API client and the fetch trait the
//! policy service depends on.

mod upstream;

#[cfg(feature = "http")]
pub mod http;

pub use upstream::{PolicyUpstream, UpstreamError, filter_by_age};

#[cfg(feature = "http")]
pub use http::OntongClient;
