//! Transformer from open API wire records into canonical [`Policy`] values.
//!
//! Every parser here is total: malformed dates, ages, or codes degrade to
//! `None` or defaults and never fail the transform.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use tracing::debug;

use crate::policy::{AgeRange, Category, ContactInfo, Policy, PolicyStatus};
use crate::region::region_set;
use crate::wire::{YouthPolicyDetail, YouthPolicyRecord};

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}\.?\d{2}\.?\d{2}").expect("Invalid date token regex"));

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Invalid integer regex"));

/// Start and end dates extracted from a period string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Parse `"2024.01.01~2024.12.31"` style periods (dots optional).
///
/// The first date token is the start and the last is the end, so a single
/// date yields `start == end`. Tokens that are not real calendar dates are
/// treated as absent.
pub fn parse_date_range(text: &str) -> DateRange {
    let tokens: Vec<&str> = DATE_TOKEN.find_iter(text).map(|m| m.as_str()).collect();
    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return DateRange::default();
    };
    DateRange {
        start: parse_date_token(first),
        end: parse_date_token(last),
    }
}

fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
    let field = |range: std::ops::Range<usize>| digits.get(range).and_then(|s| s.parse::<u32>().ok());
    let parsed = match (field(0..4), field(4..6), field(6..8)) {
        (Some(year), Some(month), Some(day)) => NaiveDate::from_ymd_opt(year as i32, month, day),
        _ => None,
    };
    if parsed.is_none() {
        debug!(token, "discarding invalid date token");
    }
    parsed
}

/// Parse free-text age eligibility such as `"19~34세"` or `"만 20세"`.
///
/// The first two integers are `[min, max]`; a single integer is both bounds.
pub fn parse_age(text: &str) -> Option<AgeRange> {
    let mut numbers = INTEGER.find_iter(text).filter_map(|m| m.as_str().parse::<u32>().ok());
    let min = numbers.next()?;
    let max = numbers.next().unwrap_or(min);
    Some(AgeRange { min, max })
}

/// Split a comma-separated field, trimming and dropping empty entries.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Map one listing record into a canonical policy stamped with `cached_at = now`.
pub fn to_canonical(record: &YouthPolicyRecord, now: DateTime<Utc>) -> Policy {
    let period = record
        .application_period
        .as_deref()
        .map(parse_date_range)
        .unwrap_or_default();
    let age_info = non_empty(&record.age_info);

    Policy {
        id: record.biz_id.as_deref().map(str::trim).unwrap_or_default().to_string(),
        title: record.title.clone().unwrap_or_default(),
        category: record
            .category_code
            .as_deref()
            .map(Category::from_code)
            .unwrap_or(Category::Other),
        description: non_empty(&record.introduction),
        content: non_empty(&record.support_content),
        deadline: period.end,
        start_date: period.start,
        end_date: period.end,
        application_url: non_empty(&record.application_url),
        contact_info: None,
        requirements: age_info.clone().into_iter().collect(),
        benefits: Vec::new(),
        documents: Vec::new(),
        region: region_set(record.region_code.as_deref()),
        target_age: age_info.as_deref().and_then(parse_age),
        target_education: None,
        tags: record.keyword.as_deref().map(split_list).unwrap_or_default(),
        image_url: None,
        status: PolicyStatus::Active,
        view_count: 0,
        popularity_score: 0.0,
        cached_at: Some(now),
        updated_at: None,
    }
}

/// Map a listing page, skipping records that carry no `bizId`.
pub fn to_canonical_list(records: &[YouthPolicyRecord], now: DateTime<Utc>) -> Vec<Policy> {
    records
        .iter()
        .map(|record| to_canonical(record, now))
        .filter(|policy| {
            if policy.id.is_empty() {
                debug!(title = %policy.title, "skipping upstream record without bizId");
                return false;
            }
            true
        })
        .collect()
}

/// Map a detail record: the listing transform of the same item, merged with
/// contact, benefit, and document fields.
pub fn detail_to_canonical(detail: &YouthPolicyDetail, now: DateTime<Utc>) -> Policy {
    let mut policy = to_canonical(&detail.record, now);
    policy.contact_info = Some(ContactInfo {
        department: non_empty(&detail.department),
        phone: non_empty(&detail.phone),
        email: non_empty(&detail.email),
    });
    policy.benefits = non_empty(&detail.record.support_content)
        .into_iter()
        .collect();
    policy.documents = detail.documents.as_deref().map(split_list).unwrap_or_default();
    policy
}
