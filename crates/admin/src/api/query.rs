//! Nested query-string serialization.
//!
//! The commerce API reads filters, sorting and pagination from bracketed keys:
//! `filters[status][$eq]=paid&sort[0]=created_at:desc&pagination[page]=2`.
//! Values are percent-encoded; keys and brackets are kept literal.

use serde::Serialize;
use serde_json::{Map, Value};

/// Encode a JSON object as a nested query string.
///
/// Nulls are skipped, arrays use numeric indices, and nested objects extend
/// the key with `[child]`. Non-object input yields an empty string.
#[must_use]
pub fn encode(value: &Value) -> String {
    let mut pairs = Vec::new();
    if let Value::Object(map) = value {
        for (key, child) in map {
            push_pairs(&mut pairs, key, child);
        }
    }
    pairs.join("&")
}

fn push_pairs(pairs: &mut Vec<String>, prefix: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push(format!("{prefix}={b}")),
        Value::Number(n) => pairs.push(format!("{prefix}={n}")),
        Value::String(s) => pairs.push(format!("{prefix}={}", urlencoding::encode(s))),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                push_pairs(pairs, &format!("{prefix}[{i}]"), item);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                push_pairs(pairs, &format!("{prefix}[{key}]"), child);
            }
        }
    }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Pagination block of a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 25,
        }
    }
}

/// Filters, sorting and pagination for list endpoints.
///
/// ```
/// use serde_json::json;
/// use vitrine_admin::api::{ListQuery, SortDirection};
///
/// let query = ListQuery::new()
///     .page(2)
///     .sort_by("created_at", SortDirection::Desc)
///     .filter("status", json!({"$eq": "paid"}));
/// assert_eq!(
///     query.to_query_string(),
///     "filters[status][$eq]=paid&pagination[page]=2&pagination[pageSize]=25&sort[0]=created_at%3Adesc"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Map::is_empty")]
    filters: Map<String, Value>,
    pagination: Pagination,
    #[serde(rename = "q", skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sort: Vec<String>,
}

impl ListQuery {
    /// Empty query: first page, default page size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a page (1-based).
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.pagination.page = page;
        self
    }

    /// Set the page size.
    #[must_use]
    pub const fn page_size(mut self, size: u32) -> Self {
        self.pagination.page_size = size;
        self
    }

    /// Append a sort key. Earlier keys take precedence.
    #[must_use]
    pub fn sort_by(mut self, field: &str, direction: SortDirection) -> Self {
        let dir = match direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        self.sort.push(format!("{field}:{dir}"));
        self
    }

    /// Add a filter on a field. The value may be a scalar or an operator
    /// object such as `{"$contains": "blue"}`.
    #[must_use]
    pub fn filter(mut self, field: &str, condition: Value) -> Self {
        self.filters.insert(field.to_string(), condition);
        self
    }

    /// Free-text search.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Encode as a query string (without the leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        serde_json::to_value(self)
            .map(|value| encode(&value))
            .unwrap_or_default()
    }
}
