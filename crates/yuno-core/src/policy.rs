//! Canonical youth-policy record shared by the cache store, the open API
//! client, and the read-through service.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Region name used when the upstream region code is unknown.
pub const NATIONWIDE: &str = "전국";

/// Policy domain category.
///
/// Seven domain categories are published by the open API, each with a fixed
/// `bizTycdSel` code. Anything else lands in [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "장학금")]
    Scholarship,
    #[serde(rename = "창업지원")]
    Startup,
    #[serde(rename = "취업지원")]
    Employment,
    #[serde(rename = "주거지원")]
    Housing,
    #[serde(rename = "생활복지")]
    Welfare,
    #[serde(rename = "문화")]
    Culture,
    #[serde(rename = "참여권리")]
    Participation,
    #[serde(rename = "기타")]
    Other,
}

/// Bidirectional name/code table for the seven domain categories.
const CATEGORY_TABLE: [(Category, &str, &str); 7] = [
    (Category::Scholarship, "장학금", "023010"),
    (Category::Startup, "창업지원", "023020"),
    (Category::Employment, "취업지원", "023030"),
    (Category::Housing, "주거지원", "023040"),
    (Category::Welfare, "생활복지", "023050"),
    (Category::Culture, "문화", "023060"),
    (Category::Participation, "참여권리", "023070"),
];

impl Category {
    /// The seven categories a client may filter on.
    pub const DOMAIN: [Category; 7] = [
        Category::Scholarship,
        Category::Startup,
        Category::Employment,
        Category::Housing,
        Category::Welfare,
        Category::Culture,
        Category::Participation,
    ];

    /// Korean display name, also the stored column value.
    pub fn name(self) -> &'static str {
        CATEGORY_TABLE
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("기타")
    }

    /// Upstream `bizTycdSel` code. [`Category::Other`] has no code and maps to `""`.
    pub fn code(self) -> &'static str {
        CATEGORY_TABLE
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, _, code)| *code)
            .unwrap_or("")
    }

    /// Map an upstream code to a category; unknown codes degrade to `Other`.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        CATEGORY_TABLE
            .iter()
            .find(|(_, _, c)| *c == code)
            .map(|(category, _, _)| *category)
            .unwrap_or(Category::Other)
    }

    /// Parse a Korean category name. `"기타"` parses to `Other`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name == "기타" {
            return Some(Category::Other);
        }
        CATEGORY_TABLE
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(category, _, _)| *category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    #[default]
    Active,
    Inactive,
}

impl PolicyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyStatus::Active => "active",
            PolicyStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PolicyStatus::Active),
            "inactive" => Some(PolicyStatus::Inactive),
            _ => None,
        }
    }
}

/// Contact details for the department running a policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub department: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Inclusive eligible age range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

/// A youth policy in its canonical form.
///
/// This is both the shape returned to HTTP clients (camelCase JSON) and the
/// shape written to the `policies` table via [`PolicyRow`](crate::PolicyRow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub description: Option<String>,
    pub content: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub application_url: Option<String>,
    pub contact_info: Option<ContactInfo>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    pub region: Vec<String>,
    pub target_age: Option<AgeRange>,
    pub target_education: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: PolicyStatus,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub popularity_score: f64,
    pub cached_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Policy {
    /// A policy with the given id and title and every other field at its default.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: Category::Other,
            description: None,
            content: None,
            deadline: None,
            start_date: None,
            end_date: None,
            application_url: None,
            contact_info: None,
            requirements: Vec::new(),
            benefits: Vec::new(),
            documents: Vec::new(),
            region: vec![NATIONWIDE.to_string()],
            target_age: None,
            target_education: None,
            tags: Vec::new(),
            image_url: None,
            status: PolicyStatus::Active,
            view_count: 0,
            popularity_score: 0.0,
            cached_at: None,
            updated_at: None,
        }
    }

    /// Human-readable application period, e.g. `2024. 1. 1. ~ 2024. 12. 31.`.
    ///
    /// Open-ended ranges render as `start ~` or `~ end`; no dates render as `-`.
    pub fn application_period(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => format!("{} ~ {}", korean_date(start), korean_date(end)),
            (Some(start), None) => format!("{} ~", korean_date(start)),
            (None, Some(end)) => format!("~ {}", korean_date(end)),
            (None, None) => "-".to_string(),
        }
    }
}

fn korean_date(date: NaiveDate) -> String {
    format!("{}. {}. {}.", date.year(), date.month(), date.day())
}
