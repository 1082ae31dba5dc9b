//! Column-level form of a [`Policy`] for the `policies` table.
//!
//! Structured sub-fields are stored as JSON text, dates as ISO calendar
//! dates, and timestamps as RFC 3339 UTC strings with microsecond precision
//! (fixed width, so they also sort correctly as text).

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::policy::{AgeRange, Category, ContactInfo, Policy, PolicyStatus};

#[derive(Debug, Error)]
pub enum RowError {
    #[error("column {column}: invalid JSON: {source}")]
    Json {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("column {column}: invalid date {value:?}")]
    Date { column: &'static str, value: String },

    #[error("column {column}: invalid timestamp {value:?}")]
    Timestamp { column: &'static str, value: String },

    #[error("unknown status {0:?}")]
    Status(String),
}

/// One `policies` row as bindable column values.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub deadline: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub application_url: Option<String>,
    pub contact_info: Option<String>,
    pub requirements: String,
    pub benefits: String,
    pub documents: String,
    pub region: String,
    pub target_age: Option<String>,
    /// Mirrors `target_age.min` for SQL range filtering.
    pub age_min: Option<i32>,
    /// Mirrors `target_age.max` for SQL range filtering.
    pub age_max: Option<i32>,
    pub target_education: Option<String>,
    pub tags: String,
    pub image_url: Option<String>,
    pub status: String,
    pub view_count: i64,
    pub popularity_score: f64,
    pub cached_at: Option<String>,
    pub updated_at: Option<String>,
}

impl PolicyRow {
    pub fn from_policy(policy: &Policy) -> Result<Self, RowError> {
        Ok(Self {
            id: policy.id.clone(),
            title: policy.title.clone(),
            category: policy.category.name().to_string(),
            description: policy.description.clone(),
            content: policy.content.clone(),
            deadline: policy.deadline.map(format_date),
            start_date: policy.start_date.map(format_date),
            end_date: policy.end_date.map(format_date),
            application_url: policy.application_url.clone(),
            contact_info: to_json_opt("contact_info", policy.contact_info.as_ref())?,
            requirements: to_json("requirements", &policy.requirements)?,
            benefits: to_json("benefits", &policy.benefits)?,
            documents: to_json("documents", &policy.documents)?,
            region: to_json("region", &policy.region)?,
            target_age: to_json_opt("target_age", policy.target_age.as_ref())?,
            age_min: policy.target_age.and_then(|r| i32::try_from(r.min).ok()),
            age_max: policy.target_age.and_then(|r| i32::try_from(r.max).ok()),
            target_education: to_json_opt("target_education", policy.target_education.as_ref())?,
            tags: to_json("tags", &policy.tags)?,
            image_url: policy.image_url.clone(),
            status: policy.status.as_str().to_string(),
            view_count: policy.view_count,
            popularity_score: policy.popularity_score,
            cached_at: policy.cached_at.map(format_timestamp),
            updated_at: policy.updated_at.map(format_timestamp),
        })
    }

    pub fn into_policy(self) -> Result<Policy, RowError> {
        Ok(Policy {
            category: Category::from_name(&self.category).unwrap_or(Category::Other),
            deadline: parse_date_opt("deadline", self.deadline)?,
            start_date: parse_date_opt("start_date", self.start_date)?,
            end_date: parse_date_opt("end_date", self.end_date)?,
            contact_info: from_json_opt::<ContactInfo>("contact_info", self.contact_info)?,
            requirements: from_json("requirements", &self.requirements)?,
            benefits: from_json("benefits", &self.benefits)?,
            documents: from_json("documents", &self.documents)?,
            region: from_json("region", &self.region)?,
            target_age: from_json_opt::<AgeRange>("target_age", self.target_age)?,
            target_education: from_json_opt::<String>("target_education", self.target_education)?,
            tags: from_json("tags", &self.tags)?,
            status: PolicyStatus::parse(&self.status).ok_or(RowError::Status(self.status))?,
            cached_at: parse_timestamp_opt("cached_at", self.cached_at)?,
            updated_at: parse_timestamp_opt("updated_at", self.updated_at)?,
            id: self.id,
            title: self.title,
            description: self.description,
            content: self.content,
            application_url: self.application_url,
            image_url: self.image_url,
            view_count: self.view_count,
            popularity_score: self.popularity_score,
        })
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>, RowError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| RowError::Timestamp {
            column,
            value: value.to_string(),
        })
}

fn parse_timestamp_opt(
    column: &'static str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, RowError> {
    value.map(|v| parse_timestamp(column, &v)).transpose()
}

fn parse_date_opt(column: &'static str, value: Option<String>) -> Result<Option<NaiveDate>, RowError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d").map_err(|_| RowError::Date { column, value: v })
        })
        .transpose()
}

fn to_json<T: Serialize + ?Sized>(column: &'static str, value: &T) -> Result<String, RowError> {
    serde_json::to_string(value).map_err(|source| RowError::Json { column, source })
}

fn to_json_opt<T: Serialize>(column: &'static str, value: Option<&T>) -> Result<Option<String>, RowError> {
    value.map(|v| to_json(column, v)).transpose()
}

fn from_json<T: DeserializeOwned>(column: &'static str, text: &str) -> Result<T, RowError> {
    serde_json::from_str(text).map_err(|source| RowError::Json { column, source })
}

fn from_json_opt<T: DeserializeOwned>(
    column: &'static str,
    text: Option<String>,
) -> Result<Option<T>, RowError> {
    text.map(|t| from_json(column, &t)).transpose()
}
