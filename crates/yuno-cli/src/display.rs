//! Text rendering for policies: a grouped vertical card for one policy and a
//! compact one-line-per-policy listing for a page.

use std::fmt::Write;

use yuno_core::{Policy, PolicyPage};

const MAX_LIST_ITEMS: usize = 10;
const TITLE_WIDTH: usize = 40;

/// Render a single policy as a card grouped by section. Empty sections are omitted.
pub fn format_policy_card(policy: &Policy) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", policy.id);
    let _ = writeln!(out, "{}", policy.title);
    let _ = writeln!(out);

    let contact = policy.contact_info.as_ref();
    let age = policy
        .target_age
        .map(|r| format!("{}~{}세", r.min, r.max));

    section(
        &mut out,
        "Overview",
        &[
            ("category", Some(policy.category.to_string())),
            ("status", Some(policy.status.as_str().to_string())),
            ("region", list(&policy.region)),
            ("tags", list(&policy.tags)),
            ("description", policy.description.clone()),
            ("content", policy.content.clone()),
        ],
    );
    section(
        &mut out,
        "Application",
        &[
            ("period", Some(policy.application_period())),
            ("deadline", policy.deadline.map(|d| d.to_string())),
            ("url", policy.application_url.clone()),
            ("documents", list(&policy.documents)),
        ],
    );
    section(
        &mut out,
        "Eligibility",
        &[
            ("target_age", age),
            ("target_education", policy.target_education.clone()),
            ("requirements", list(&policy.requirements)),
            ("benefits", list(&policy.benefits)),
        ],
    );
    section(
        &mut out,
        "Contact",
        &[
            ("department", contact.and_then(|c| c.department.clone())),
            ("phone", contact.and_then(|c| c.phone.clone())),
            ("email", contact.and_then(|c| c.email.clone())),
        ],
    );
    section(
        &mut out,
        "Cache",
        &[
            ("cached_at", policy.cached_at.map(|t| t.to_rfc3339())),
            ("updated_at", policy.updated_at.map(|t| t.to_rfc3339())),
        ],
    );
    out
}

/// Render a page as one line per policy followed by the pagination footer.
pub fn format_policy_page(page: &PolicyPage) -> String {
    let mut out = String::new();
    if page.is_empty() {
        let _ = writeln!(out, "(no policies)");
    }
    for policy in &page.policies {
        let _ = writeln!(
            out,
            "{:<18} {:<8} {:<w$} {}",
            policy.id,
            policy.category.name(),
            truncate(&policy.title, TITLE_WIDTH),
            policy.application_period(),
            w = TITLE_WIDTH,
        );
    }
    let p = &page.pagination;
    let _ = writeln!(
        out,
        "-- page {} (limit {}), {} total{}",
        p.page,
        p.limit,
        p.total,
        if p.has_next { ", more available" } else { "" }
    );
    out
}

fn section(out: &mut String, header: &str, rows: &[(&str, Option<String>)]) {
    if rows.iter().all(|(_, v)| v.as_deref().is_none_or(str::is_empty)) {
        return;
    }
    let _ = writeln!(out, "{header}");
    for (label, value) in rows {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            let _ = writeln!(out, "  {:<26} {}", label, value);
        }
    }
    let _ = writeln!(out);
}

fn list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let shown: Vec<&str> = items.iter().take(MAX_LIST_ITEMS).map(String::as_str).collect();
    let mut joined = shown.join(", ");
    if items.len() > MAX_LIST_ITEMS {
        let _ = write!(joined, " ... and {} more", items.len() - MAX_LIST_ITEMS);
    }
    Some(joined)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars - 1).collect();
    cut.push('…');
    cut
}
