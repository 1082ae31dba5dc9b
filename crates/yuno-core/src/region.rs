//! Region code table for the open API's `polyRlmCd` field.

use crate::policy::NATIONWIDE;

const REGION_TABLE: [(&str, &str); 18] = [
    ("003002000", NATIONWIDE),
    ("003002001", "서울"),
    ("003002002", "부산"),
    ("003002003", "대구"),
    ("003002004", "인천"),
    ("003002005", "광주"),
    ("003002006", "대전"),
    ("003002007", "울산"),
    ("003002008", "경기"),
    ("003002009", "강원"),
    ("003002010", "충북"),
    ("003002011", "충남"),
    ("003002012", "전북"),
    ("003002013", "전남"),
    ("003002014", "경북"),
    ("003002015", "경남"),
    ("003002016", "제주"),
    ("003002017", "세종"),
];

/// Region name for an upstream region code.
pub fn region_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    REGION_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Region set for an optional upstream code. Unknown or missing codes mean
/// the policy applies nationwide.
pub fn region_set(code: Option<&str>) -> Vec<String> {
    let name = code.and_then(region_name).unwrap_or(NATIONWIDE);
    vec![name.to_string()]
}
