//! HTTP surface: `/api/policies`, `/api/policies/:id`, `/api` and `/health`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use yuno_core::query::{DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT};
use yuno_core::{Category, PolicyQuery};
use yuno_service::PolicyService;

const AGE_MIN: i64 = 18;
const AGE_MAX: i64 = 65;
const SEARCH_MIN_CHARS: usize = 2;
const SEARCH_MAX_CHARS: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PolicyService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api", get(api_index))
        .route("/api/policies", get(list_policies))
        .route("/api/policies/:id", get(policy_detail))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind `host:port` and serve until the process is stopped.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ── Responses ──

#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    message: &'static str,
    data: T,
}

impl<T: Serialize> Envelope<T> {
    fn ok(message: &'static str, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message,
            data,
        })
    }
}

/// One rejected query parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub location: &'static str,
    pub path: &'static str,
    pub msg: &'static str,
    pub value: String,
}

impl FieldError {
    fn query(path: &'static str, msg: &'static str, value: &str) -> Self {
        Self {
            location: "query",
            path,
            msg,
            value: value.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<FieldError>),
    NotFound,
    Server(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Validation Error",
                    "message": "Invalid query parameters",
                    "details": details,
                })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Not Found", "message": "Policy not found"})),
            )
                .into_response(),
            ApiError::Server(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Server Error", "message": message})),
            )
                .into_response(),
        }
    }
}

// ── Query validation ──

/// Raw listing parameters, validated by [`PolicyParams::validate`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub search: Option<String>,
    pub age_min: Option<String>,
    pub age_max: Option<String>,
}

impl PolicyParams {
    /// Check every parameter and collect all failures at once.
    pub fn validate(&self) -> Result<PolicyQuery, Vec<FieldError>> {
        let mut errors = Vec::new();

        let page = int_in_range(
            &mut errors,
            "page",
            self.page.as_deref(),
            1,
            i64::from(u32::MAX),
            "Page must be a positive integer",
        )
        .unwrap_or(DEFAULT_PAGE);
        let limit = int_in_range(
            &mut errors,
            "limit",
            self.limit.as_deref(),
            1,
            i64::from(MAX_LIMIT),
            "Limit must be between 1 and 100",
        )
        .unwrap_or(DEFAULT_LIMIT);
        let age_min = int_in_range(
            &mut errors,
            "ageMin",
            self.age_min.as_deref(),
            AGE_MIN,
            AGE_MAX,
            "Age min must be between 18 and 65",
        );
        let age_max = int_in_range(
            &mut errors,
            "ageMax",
            self.age_max.as_deref(),
            AGE_MIN,
            AGE_MAX,
            "Age max must be between 18 and 65",
        );

        let category = self.category.as_deref().and_then(|raw| {
            let parsed = Category::from_name(raw).filter(|c| *c != Category::Other);
            if parsed.is_none() {
                errors.push(FieldError::query("category", "Invalid category", raw));
            }
            parsed
        });

        let search = self.search.as_deref().and_then(|raw| {
            let trimmed = raw.trim();
            let chars = trimmed.chars().count();
            if (SEARCH_MIN_CHARS..=SEARCH_MAX_CHARS).contains(&chars) {
                Some(trimmed.to_string())
            } else {
                errors.push(FieldError::query(
                    "search",
                    "Search query must be between 2 and 100 characters",
                    raw,
                ));
                None
            }
        });

        let region = self
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut query = PolicyQuery::new(page, limit).with_age(age_min, age_max);
        query.category = category;
        query.region = region;
        query.search = search;
        Ok(query)
    }
}

fn int_in_range(
    errors: &mut Vec<FieldError>,
    path: &'static str,
    raw: Option<&str>,
    min: i64,
    max: i64,
    msg: &'static str,
) -> Option<u32> {
    let raw = raw?;
    match raw.trim().parse::<i64>() {
        Ok(value) if (min..=max).contains(&value) => u32::try_from(value).ok(),
        _ => {
            errors.push(FieldError::query(path, msg, raw));
            None
        }
    }
}

// ── Handlers ──

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn api_index() -> impl IntoResponse {
    Json(json!({
        "name": "Yuno API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Youth policy data service (온통청년 정책 API)",
        "endpoints": {
            "policies": "/api/policies",
            "health": "/health",
        },
    }))
}

async fn list_policies(
    State(state): State<AppState>,
    Query(params): Query<PolicyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.validate().map_err(ApiError::Validation)?;
    let page = state.service.list_policies(&query).await;
    Ok(Envelope::ok("Policies retrieved successfully", page))
}

async fn policy_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.service.get_policy_detail(&id).await {
        Ok(Some(policy)) => Ok(Envelope::ok("Policy details retrieved successfully", policy)),
        Ok(None) => Err(ApiError::NotFound),
        Err(e) => {
            error!(id = %id, error = %e, "policy detail lookup failed");
            Err(ApiError::Server("Failed to retrieve policy details"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tower::ServiceExt;
    use yuno_core::{
        ManualClock, Policy, ServiceConfig, YouthPolicyDetail, YouthPolicyList, YouthPolicyRecord,
    };
    use yuno_store::DuckPolicyStore;
    use yuno_sync::{PolicyUpstream, UpstreamError};

    /// Lists two fixed records; every detail lookup fails.
    struct TwoPolicies;

    #[async_trait]
    impl PolicyUpstream for TwoPolicies {
        async fn fetch_list(&self, _: &PolicyQuery) -> Result<YouthPolicyList, UpstreamError> {
            let record = |id: &str| YouthPolicyRecord {
                biz_id: Some(id.to_string()),
                title: Some(format!("정책 {id}")),
                ..Default::default()
            };
            Ok(YouthPolicyList {
                youth_policy: Some(vec![record("R1"), record("R2")]),
                total_count: 2,
            })
        }

        async fn fetch_detail(&self, id: &str) -> Result<YouthPolicyDetail, UpstreamError> {
            Err(UpstreamError::EmptyDetail(id.to_string()))
        }
    }

    fn app() -> (Arc<DuckPolicyStore>, Router) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let store = Arc::new(DuckPolicyStore::open().unwrap().with_clock(clock.clone()));
        let service = PolicyService::new(
            store.clone(),
            Arc::new(TwoPolicies),
            clock,
            ServiceConfig::default(),
        );
        let state = AppState {
            service: Arc::new(service),
        };
        (store, router(state))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn params(pairs: &[(&str, &str)]) -> PolicyParams {
        let mut p = PolicyParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "page" => p.page = value,
                "limit" => p.limit = value,
                "category" => p.category = value,
                "region" => p.region = value,
                "search" => p.search = value,
                "ageMin" => p.age_min = value,
                "ageMax" => p.age_max = value,
                other => panic!("unknown parameter {other}"),
            }
        }
        p
    }

    #[test]
    fn defaults_apply_when_absent() {
        let query = PolicyParams::default().validate().unwrap();
        assert_eq!(query, PolicyQuery::new(1, 20));
    }

    #[test]
    fn valid_params_build_query() {
        let query = params(&[
            ("page", "2"),
            ("limit", "50"),
            ("category", "주거지원"),
            ("region", "  서울 "),
            ("search", " 월세 "),
            ("ageMin", "20"),
            ("ageMax", "30"),
        ])
        .validate()
        .unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 50);
        assert_eq!(query.category, Some(Category::Housing));
        assert_eq!(query.region.as_deref(), Some("서울"));
        assert_eq!(query.search.as_deref(), Some("월세"));
        assert_eq!(query.age.min, Some(20));
        assert_eq!(query.age.max, Some(30));
    }

    #[test]
    fn every_failure_is_reported() {
        let errors = params(&[
            ("page", "0"),
            ("limit", "101"),
            ("category", "기타"),
            ("search", " a "),
            ("ageMin", "17"),
            ("ageMax", "abc"),
        ])
        .validate()
        .unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["page", "limit", "ageMin", "ageMax", "category", "search"]);
        assert_eq!(errors[0].value, "0");
        assert!(errors.iter().all(|e| e.location == "query"));
    }

    #[test]
    fn search_length_counts_characters() {
        let hundred = "가".repeat(100);
        assert!(params(&[("search", &hundred)]).validate().is_ok());
        let too_long = "가".repeat(101);
        assert!(params(&[("search", &too_long)]).validate().is_err());
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (_, app) = app();
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn list_wraps_page_in_envelope() {
        let (_, app) = app();
        let (status, body) = get_json(app, "/api/policies?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Policies retrieved successfully");
        assert_eq!(body["data"]["policies"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["policies"][0]["id"], "R1");
        assert_eq!(body["data"]["pagination"]["hasNext"], true);
        assert_eq!(body["data"]["pagination"]["limit"], 2);
    }

    #[tokio::test]
    async fn invalid_params_are_rejected_before_the_service() {
        let (store, app) = app();
        let (status, body) = get_json(app, "/api/policies?limit=0&category=nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation Error");
        assert_eq!(body["message"], "Invalid query parameters");
        assert_eq!(body["details"][0]["path"], "limit");
        assert_eq!(body["details"][1]["path"], "category");
        assert_eq!(body["details"][1]["value"], "nope");
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn detail_falls_back_to_cached_row() {
        let (store, app) = app();
        store.upsert_one(&Policy::new("C1", "캐시된 정책")).unwrap();

        let (status, body) = get_json(app, "/api/policies/C1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Policy details retrieved successfully");
        assert_eq!(body["data"]["title"], "캐시된 정책");
    }

    #[tokio::test]
    async fn unknown_detail_is_404() {
        let (_, app) = app();
        let (status, body) = get_json(app, "/api/policies/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not Found", "message": "Policy not found"}));
    }

    #[tokio::test]
    async fn index_lists_endpoints() {
        let (_, app) = app();
        let (status, body) = get_json(app, "/api").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Yuno API");
        assert_eq!(body["endpoints"]["policies"], "/api/policies");
    }
}
