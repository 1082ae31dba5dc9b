//! Provider-facing seam: the fetch trait, its error type, and the local age
//! filter applied to providers that cannot filter by age.

use async_trait::async_trait;
use thiserror::Error;
use yuno_core::{AgeFilter, Policy, PolicyQuery, YouthPolicyDetail, YouthPolicyList};

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no open API key configured")]
    MissingApiKey,
    #[error("detail response for {0} carried no policy")]
    EmptyDetail(String),
}

/// Fetch operations the policy service needs from the provider.
#[async_trait]
pub trait PolicyUpstream: Send + Sync {
    async fn fetch_list(&self, query: &PolicyQuery) -> Result<YouthPolicyList, UpstreamError>;

    async fn fetch_detail(&self, id: &str) -> Result<YouthPolicyDetail, UpstreamError>;

    /// Whether the provider applies age bounds itself. The open API does not.
    fn filters_age(&self) -> bool {
        false
    }
}

/// Client-side age filtering for providers that cannot filter by age.
pub fn filter_by_age(policies: Vec<Policy>, age: &AgeFilter) -> Vec<Policy> {
    if age.is_empty() {
        return policies;
    }
    policies
        .into_iter()
        .filter(|policy| age.admits(policy.target_age))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yuno_core::AgeRange;

    #[test]
    fn age_filter_keeps_overlapping_and_unstated() {
        let mut young = Policy::new("young", "t");
        young.target_age = Some(AgeRange { min: 19, max: 24 });
        let mut old = Policy::new("old", "t");
        old.target_age = Some(AgeRange { min: 35, max: 39 });
        let open = Policy::new("open", "t");

        let kept = filter_by_age(vec![young, old, open], &AgeFilter::new(Some(20), Some(30)));
        let ids: Vec<&str> = kept.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["young", "open"]);
    }
}
