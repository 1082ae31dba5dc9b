//! HTTP client for the youth-policy open API (`youthPolicy.json` and
//! `youthPolicyDetail.json`).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{error, info};
use yuno_core::{
    PolicyQuery, UpstreamConfig, YouthPolicyDetail, YouthPolicyDetailEnvelope, YouthPolicyList,
};

use crate::{PolicyUpstream, UpstreamError};

const USER_AGENT: &str = concat!("Yuno-Backend/", env!("CARGO_PKG_VERSION"));

/// Client for the 온통청년 open API.
///
/// Every call is a single GET with a whole-request timeout; failures are
/// returned to the caller and never retried here.
pub struct OntongClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OntongClient {
    /// Create a client from upstream configuration.
    ///
    /// `base_url` should be like `https://www.youthcenter.go.kr/openapi`; a
    /// trailing slash is trimmed.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Provider query parameters for a listing request, excluding the key.
    pub fn list_params(query: &PolicyQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("display", query.limit.to_string()),
            ("pageIndex", query.page.to_string()),
        ];
        if let Some(category) = query.category {
            params.push(("bizTycdSel", category.code().to_string()));
        }
        if let Some(region) = query.region.as_deref() {
            params.push(("srchPolicyRegion", region.to_string()));
        }
        if let Some(search) = query.search.as_deref() {
            params.push(("query", search.to_string()));
        }
        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<T, UpstreamError> {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::MissingApiKey)?;
        let url = format!("{}{}", self.base_url, path);

        info!(method = "GET", path, "open API request");
        let resp = self
            .client
            .get(&url)
            .query(&[("openApiVlak", api_key)])
            .query(&params)
            .send()
            .await
            .inspect_err(|e| error!(path, error = %e, "open API request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(path, status = status.as_u16(), "open API returned an error status");
            return Err(UpstreamError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl PolicyUpstream for OntongClient {
    async fn fetch_list(&self, query: &PolicyQuery) -> Result<YouthPolicyList, UpstreamError> {
        let list: YouthPolicyList = self
            .get_json("/youthPolicy.json", Self::list_params(query))
            .await?;
        info!(count = list.records().len(), total = list.total_count, "fetched policy list");
        Ok(list)
    }

    async fn fetch_detail(&self, id: &str) -> Result<YouthPolicyDetail, UpstreamError> {
        let envelope: YouthPolicyDetailEnvelope = self
            .get_json("/youthPolicyDetail.json", vec![("bizId", id.to_string())])
            .await?;
        envelope
            .youth_policy_detail
            .ok_or_else(|| UpstreamError::EmptyDetail(id.to_string()))
    }
}
