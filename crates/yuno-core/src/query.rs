//! Listing filters and paginated results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::{AgeRange, Category, Policy};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// Optional eligible-age bounds requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgeFilter {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl AgeFilter {
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Overlap test against a policy's eligible range.
    ///
    /// With both bounds, a range entirely outside `[min, max]` is rejected.
    /// With one bound, only that side is checked. Policies that state no
    /// range are always admitted.
    pub fn admits(&self, range: Option<AgeRange>) -> bool {
        let Some(range) = range else {
            return true;
        };
        match (self.min, self.max) {
            (Some(min), Some(max)) => !(range.max < min || range.min > max),
            (Some(min), None) => range.max >= min,
            (None, Some(max)) => range.min <= max,
            (None, None) => true,
        }
    }
}

/// Filters and page window for a policy listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<Category>,
    pub region: Option<String>,
    pub search: Option<String>,
    pub age: AgeFilter,
}

impl Default for PolicyQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

impl PolicyQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            category: None,
            region: None,
            search: None,
            age: AgeFilter::default(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_age(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.age = AgeFilter::new(min, max);
        self
    }

    /// Row offset of the first item on this page. Page numbers start at 1.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_next: bool,
}

/// One page of policies plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyPage {
    pub policies: Vec<Policy>,
    pub pagination: Pagination,
}

impl PolicyPage {
    /// The empty result: no policies, `total = 0`, page and limit echoed.
    pub fn empty(page: u32, limit: u32) -> Self {
        Self {
            policies: Vec::new(),
            pagination: Pagination {
                page,
                limit,
                total: 0,
                has_next: false,
            },
        }
    }

    /// A page read from the cache, where the total match count is known.
    pub fn from_cache(policies: Vec<Policy>, total: u64, query: &PolicyQuery) -> Self {
        let has_next = query.offset() + u64::from(query.limit) < total;
        Self {
            policies,
            pagination: Pagination {
                page: query.page,
                limit: query.limit,
                total,
                has_next,
            },
        }
    }

    /// A page fetched from the open API, whose total count is unreliable:
    /// `hasNext` only says whether the page came back full.
    pub fn from_upstream(policies: Vec<Policy>, total: u64, query: &PolicyQuery) -> Self {
        let has_next = policies.len() == query.limit as usize;
        Self {
            policies,
            pagination: Pagination {
                page: query.page,
                limit: query.limit,
                total,
                has_next,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Most recent `cached_at` on the page, if any row carries one.
    pub fn last_cached(&self) -> Option<DateTime<Utc>> {
        self.policies.iter().filter_map(|p| p.cached_at).max()
    }
}
