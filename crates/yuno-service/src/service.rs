use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use yuno_core::transform::{detail_to_canonical, to_canonical_list};
use yuno_core::{Clock, Policy, PolicyPage, PolicyQuery, ServiceConfig};
use yuno_store::PolicyCache;
use yuno_sync::{PolicyUpstream, filter_by_age};

use crate::ServiceError;

/// Read-through policy service.
///
/// Listings come from the cache while its newest row is younger than the
/// freshness window; otherwise from the open API, with the fetched rows
/// written back to the cache by a detached task. Requests never wait on
/// that task; short-lived callers drain it with [`PolicyService::wait_for_refills`].
pub struct PolicyService {
    cache: Arc<dyn PolicyCache>,
    upstream: Arc<dyn PolicyUpstream>,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
    refills: Mutex<JoinSet<()>>,
}

impl PolicyService {
    pub fn new(
        cache: Arc<dyn PolicyCache>,
        upstream: Arc<dyn PolicyUpstream>,
        clock: Arc<dyn Clock>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            cache,
            upstream,
            clock,
            config,
            refills: Mutex::new(JoinSet::new()),
        }
    }

    /// True when `cached_at` is strictly less than the freshness window ago.
    /// A missing timestamp is never fresh.
    pub fn is_fresh(&self, cached_at: Option<DateTime<Utc>>) -> bool {
        let Some(cached_at) = cached_at else {
            return false;
        };
        let age = self.clock.now() - cached_at;
        match TimeDelta::from_std(self.config.freshness_window) {
            Ok(window) => age < window,
            Err(_) => true,
        }
    }

    /// List policies for `query`. Never fails: upstream failures fall back to
    /// the cached page (stale or not), and anything else yields the empty page.
    pub async fn list_policies(&self, query: &PolicyQuery) -> PolicyPage {
        let cached = match self.cache.query_page(query).await {
            Ok(stored) => PolicyPage::from_cache(stored.policies, stored.total, query),
            Err(e) => {
                error!(error = %e, page = query.page, "cache lookup failed");
                return PolicyPage::empty(query.page, query.limit);
            }
        };

        if !cached.is_empty() && self.is_fresh(cached.last_cached()) {
            debug!(count = cached.policies.len(), page = query.page, "serving fresh cache page");
            return cached;
        }

        info!(page = query.page, cached = cached.policies.len(), "cache stale or empty, reading through");
        match self.upstream.fetch_list(query).await {
            Ok(list) => {
                let mut policies = to_canonical_list(list.records(), self.clock.now());
                if !self.upstream.filters_age() {
                    policies = filter_by_age(policies, &query.age);
                }
                if !policies.is_empty() {
                    self.refill_in_background(policies.clone());
                }
                PolicyPage::from_upstream(policies, list.total_count, query)
            }
            Err(e) => {
                warn!(error = %e, cached = cached.policies.len(), "upstream fetch failed, serving cache");
                if cached.is_empty() {
                    PolicyPage::empty(query.page, query.limit)
                } else {
                    cached
                }
            }
        }
    }

    /// Write `policies` to the cache one by one on a detached task.
    ///
    /// A failed row is logged and skipped. Must be called from within a
    /// tokio runtime.
    pub fn refill_in_background(&self, policies: Vec<Policy>) {
        let cache = Arc::clone(&self.cache);
        let mut refills = self.refills.lock().unwrap_or_else(|e| e.into_inner());
        // Reap finished refills so a long-running server does not accumulate them.
        while refills.try_join_next().is_some() {}
        refills.spawn(async move {
            let mut stored = 0usize;
            let mut failed = 0usize;
            for policy in &policies {
                match cache.upsert_one(policy).await {
                    Ok(()) => stored += 1,
                    Err(e) => {
                        failed += 1;
                        warn!(id = %policy.id, error = %e, "cache refill failed for policy");
                    }
                }
            }
            info!(stored, failed, "cache refill finished");
        });
    }

    /// Wait until every refill spawned so far has finished. One-shot callers
    /// use this before the runtime shuts down and cancels pending tasks.
    pub async fn wait_for_refills(&self) {
        loop {
            let mut pending =
                std::mem::take(&mut *self.refills.lock().unwrap_or_else(|e| e.into_inner()));
            if pending.is_empty() {
                return;
            }
            while let Some(result) = pending.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "cache refill task did not complete");
                }
            }
        }
    }

    /// Cache-only listing ordered by popularity, then insertion time.
    /// Store failures yield the empty first page.
    pub async fn list_cached_policies(&self, query: &PolicyQuery) -> PolicyPage {
        match self.cache.query_cached_page(query).await {
            Ok(stored) => PolicyPage::from_cache(stored.policies, stored.total, query),
            Err(e) => {
                error!(error = %e, "cached listing failed");
                PolicyPage::empty(1, query.limit)
            }
        }
    }

    /// One policy by id: the open API first, the cache when the API fails.
    pub async fn get_policy_detail(&self, id: &str) -> Result<Option<Policy>, ServiceError> {
        match self.upstream.fetch_detail(id).await {
            Ok(detail) => Ok(Some(detail_to_canonical(&detail, self.clock.now()))),
            Err(e) => {
                warn!(id, error = %e, "upstream detail failed, reading cache");
                Ok(self.cache.get_by_id(id).await?)
            }
        }
    }

    /// Walk the whole catalog page by page through the read path and batch
    /// write every page. Stops at the first short or empty page. Returns the
    /// number of policies written; any cache write failure aborts the sweep.
    pub async fn sync_policies(&self) -> Result<usize, ServiceError> {
        let limit = self.config.sync_page_size;
        let mut page = 1u32;
        let mut total = 0usize;

        info!(limit, "policy sync started");
        loop {
            let result = self.list_policies(&PolicyQuery::new(page, limit)).await;
            let fetched = result.policies.len();
            if fetched == 0 {
                break;
            }

            self.cache.upsert_batch(&result.policies).await?;
            total += fetched;
            info!(page, fetched, total, "synced policy page");

            if fetched < limit as usize {
                break;
            }
            page += 1;
            tokio::time::sleep(self.config.sync_page_delay).await;
        }

        info!(total, "policy sync finished");
        Ok(total)
    }
}
