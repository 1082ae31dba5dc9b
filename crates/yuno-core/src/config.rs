//! Runtime configuration, read from the environment with development defaults.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.youthcenter.go.kr/openapi";

/// Connection settings for the youth-policy open API.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// `openApiVlak` credential. Without it only cached data can be served.
    pub api_key: Option<String>,
    /// Whole-request timeout for every outbound call.
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl UpstreamConfig {
    /// Environment variables:
    /// - `ONTONG_API_KEY`: open API credential (optional)
    /// - `ONTONG_API_BASE_URL`: override for the provider base URL
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = std::env::var("ONTONG_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let base_url = std::env::var("ONTONG_API_BASE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(defaults.base_url);
        Self {
            base_url,
            api_key,
            timeout: defaults.timeout,
        }
    }
}

/// Read-through and sync tuning.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Cached pages older than this are refreshed from upstream.
    pub freshness_window: Duration,
    /// Page size used by the full-catalog sync.
    pub sync_page_size: u32,
    /// Pause between successive sync page fetches.
    pub sync_page_delay: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(6 * 60 * 60),
            sync_page_size: 100,
            sync_page_delay: Duration::from_secs(1),
        }
    }
}

impl ServiceConfig {
    /// Environment variables:
    /// - `YUNO_FRESHNESS_HOURS`: staleness window in hours (default: 6)
    /// - `YUNO_SYNC_DELAY_MS`: delay between sync pages (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let freshness_window = std::env::var("YUNO_FRESHNESS_HOURS")
            .ok()
            .and_then(|s| freshness_from_hours(&s))
            .unwrap_or(defaults.freshness_window);
        let sync_page_delay = std::env::var("YUNO_SYNC_DELAY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.sync_page_delay);
        Self {
            freshness_window,
            sync_page_size: defaults.sync_page_size,
            sync_page_delay,
        }
    }
}

/// Whole hours as a window. `None` when unparsable or too large to express in seconds.
fn freshness_from_hours(raw: &str) -> Option<Duration> {
    let hours = raw.trim().parse::<u64>().ok()?;
    hours.checked_mul(60 * 60).map(Duration::from_secs)
}
