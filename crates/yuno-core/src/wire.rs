//! Wire records returned by the youth-policy open API.
//!
//! Field names follow the provider's JSON exactly; every field is optional
//! because the provider omits empty values freely.

use serde::{Deserialize, Deserializer, Serialize};

/// Response body of `youthPolicy.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YouthPolicyList {
    #[serde(rename = "youthPolicy", default)]
    pub youth_policy: Option<Vec<YouthPolicyRecord>>,
    #[serde(rename = "totalCount", default, deserialize_with = "lenient_count")]
    pub total_count: u64,
}

impl YouthPolicyList {
    pub fn records(&self) -> &[YouthPolicyRecord] {
        self.youth_policy.as_deref().unwrap_or_default()
    }
}

/// One listing entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YouthPolicyRecord {
    #[serde(rename = "bizId", default)]
    pub biz_id: Option<String>,
    /// Policy title.
    #[serde(rename = "polyBizSjnm", default)]
    pub title: Option<String>,
    /// Category code, e.g. `023040`.
    #[serde(rename = "bizTycdSel", default)]
    pub category_code: Option<String>,
    /// Short introduction.
    #[serde(rename = "polyItcnCn", default)]
    pub introduction: Option<String>,
    /// Support content.
    #[serde(rename = "sporCn", default)]
    pub support_content: Option<String>,
    /// Application period text, e.g. `2024.01.01~2024.12.31`.
    #[serde(rename = "rqutPrdCn", default)]
    pub application_period: Option<String>,
    #[serde(rename = "rqutUrla", default)]
    pub application_url: Option<String>,
    /// Free-text age eligibility, e.g. `만 19세~34세`.
    #[serde(rename = "ageInfo", default)]
    pub age_info: Option<String>,
    #[serde(rename = "polyRlmCd", default)]
    pub region_code: Option<String>,
    /// Comma-separated keywords.
    #[serde(rename = "keyword", default)]
    pub keyword: Option<String>,
}

/// Response body of `youthPolicyDetail.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YouthPolicyDetailEnvelope {
    #[serde(rename = "youthPolicyDetail", default)]
    pub youth_policy_detail: Option<YouthPolicyDetail>,
}

/// Detail entry: the listing fields plus contact and document fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YouthPolicyDetail {
    #[serde(flatten)]
    pub record: YouthPolicyRecord,
    /// Operating department.
    #[serde(rename = "cnsgNmor", default)]
    pub department: Option<String>,
    #[serde(rename = "tintCherCn", default)]
    pub phone: Option<String>,
    #[serde(rename = "cherCtpcCn", default)]
    pub email: Option<String>,
    /// Comma-separated submission documents.
    #[serde(rename = "pstnPaprCn", default)]
    pub documents: Option<String>,
}

/// `totalCount` arrives as a number or a numeric string depending on the endpoint.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
