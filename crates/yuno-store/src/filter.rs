//! Parameterized WHERE-clause builder for policy listings.
//!
//! Predicates are `&'static str` SQL fragments with `?` placeholders, so
//! only literal SQL ever reaches the query text; client-supplied filter
//! values travel exclusively as bound [`SqlValue`]s.

use yuno_core::{PolicyQuery, PolicyStatus};

/// A value bound to one `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
}

/// Sort order for a listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrder {
    /// `popularity_score DESC, updated_at DESC`: the read-through path.
    Updated,
    /// `popularity_score DESC, created_at DESC`: the cache-only listing.
    Created,
}

impl PageOrder {
    pub fn order_by(self) -> &'static str {
        match self {
            PageOrder::Updated => "ORDER BY popularity_score DESC, updated_at DESC, id ASC",
            PageOrder::Created => "ORDER BY popularity_score DESC, created_at DESC, id ASC",
        }
    }
}

/// Accumulates `(predicate, bound values)` pairs joined with `AND`.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    predicates: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate and the values for its placeholders, in order.
    pub fn push(
        &mut self,
        predicate: &'static str,
        values: impl IntoIterator<Item = SqlValue>,
    ) -> &mut Self {
        let before = self.values.len();
        self.values.extend(values);
        debug_assert_eq!(
            predicate.matches('?').count(),
            self.values.len() - before,
            "placeholder count mismatch in {predicate:?}"
        );
        self.predicates.push(predicate);
        self
    }

    /// Conditions for a policy listing. Age bounds are only applied when
    /// `with_age` is set; the cache-only listing ignores them.
    pub fn for_policies(query: &PolicyQuery, with_age: bool) -> Self {
        let mut builder = Self::new();
        builder.push(
            "status = ?",
            [SqlValue::Text(PolicyStatus::Active.as_str().to_string())],
        );

        if let Some(category) = query.category {
            builder.push("category = ?", [SqlValue::Text(category.name().to_string())]);
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            builder.push(
                r"(title ILIKE ? ESCAPE '\' OR description ILIKE ? ESCAPE '\')",
                [SqlValue::Text(pattern.clone()), SqlValue::Text(pattern)],
            );
        }

        if let Some(region) = query.region.as_deref().filter(|s| !s.is_empty()) {
            // `region` holds a JSON array of strings; match one quoted element.
            let element = serde_json::Value::String(region.to_string()).to_string();
            builder.push(
                r"region LIKE ? ESCAPE '\'",
                [SqlValue::Text(format!("%{}%", escape_like(&element)))],
            );
        }

        if with_age {
            if let Some(min) = query.age.min {
                builder.push(
                    "(age_max IS NULL OR age_max >= ?)",
                    [SqlValue::Int(i64::from(min))],
                );
            }
            if let Some(max) = query.age.max {
                builder.push(
                    "(age_min IS NULL OR age_min <= ?)",
                    [SqlValue::Int(i64::from(max))],
                );
            }
        }

        builder
    }

    /// `WHERE a AND b ...`, or an empty string when no predicate was added.
    pub fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        format!("WHERE {}", self.predicates.join(" AND "))
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// Escape `LIKE` metacharacters so user text matches literally.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use yuno_core::Category;

    #[test]
    fn status_is_always_filtered() {
        let builder = QueryBuilder::for_policies(&PolicyQuery::default(), true);
        assert_eq!(builder.where_clause(), "WHERE status = ?");
        assert_eq!(builder.values(), &[SqlValue::Text("active".into())]);
    }

    #[test]
    fn filters_compose_conjunctively_in_order() {
        let query = PolicyQuery::new(1, 20)
            .with_category(Category::Housing)
            .with_search("월세")
            .with_region("서울")
            .with_age(Some(20), Some(30));
        let builder = QueryBuilder::for_policies(&query, true);
        assert_eq!(
            builder.where_clause(),
            r"WHERE status = ? AND category = ? AND (title ILIKE ? ESCAPE '\' OR description ILIKE ? ESCAPE '\') AND region LIKE ? ESCAPE '\' AND (age_max IS NULL OR age_max >= ?) AND (age_min IS NULL OR age_min <= ?)"
        );
        assert_eq!(
            builder.values(),
            &[
                SqlValue::Text("active".into()),
                SqlValue::Text("주거지원".into()),
                SqlValue::Text("%월세%".into()),
                SqlValue::Text("%월세%".into()),
                SqlValue::Text("%\"서울\"%".into()),
                SqlValue::Int(20),
                SqlValue::Int(30),
            ]
        );
    }

    #[test]
    fn age_is_skipped_when_disabled() {
        let query = PolicyQuery::default().with_age(Some(20), None);
        let builder = QueryBuilder::for_policies(&query, false);
        assert_eq!(builder.values().len(), 1);
    }

    #[test]
    fn hostile_input_only_reaches_bound_values() {
        let query = PolicyQuery::default().with_search("'; DROP TABLE policies; --");
        let builder = QueryBuilder::for_policies(&query, true);
        assert!(!builder.where_clause().contains("DROP"));
        assert_eq!(
            builder.values()[1],
            SqlValue::Text("%'; DROP TABLE policies; --%".into())
        );
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like(r"100%_a\b"), r"100\%\_a\\b");
    }

    #[test]
    fn empty_builder_has_no_where() {
        assert_eq!(QueryBuilder::new().where_clause(), "");
    }
}
