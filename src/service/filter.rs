//! Filter Predicates
//!
//! The predicate language the service boundary accepts: column equality with
//! `and`/`or` combinators. The `or` combinator is load-bearing - the
//! friendship existence check must test both orderings of a user pair in one
//! query.
//!
//! Filters evaluate locally against JSON rows (`matches`, used by
//! `MemoryService`) and render to the hosted service's query-string syntax
//! (`to_query_pairs`, used by `RestService`).

use serde_json::Value;

/// A row predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every row
    All,
    /// Column equals value
    Eq(String, Value),
    /// All sub-filters match
    And(Vec<Filter>),
    /// At least one sub-filter matches
    Or(Vec<Filter>),
}

impl Filter {
    /// Column equality
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    /// Conjunction of filters
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    /// Disjunction of filters
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Evaluate this filter against a JSON row
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(column, value) => row.get(column) == Some(value),
            Filter::And(filters) => filters.iter().all(|f| f.matches(row)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }

    /// Render this filter as query-string parameters.
    ///
    /// Top-level conjunctions flatten to one `column=eq.value` pair per leaf;
    /// disjunctions render as a single `or=(...)` parameter with nested
    /// `and(...)` groups, matching the hosted service's row API.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        match self {
            Filter::All => Vec::new(),
            Filter::Eq(column, value) => {
                vec![(column.clone(), format!("eq.{}", render_value(value)))]
            }
            Filter::And(filters) => filters.iter().flat_map(|f| f.to_query_pairs()).collect(),
            Filter::Or(filters) => {
                let inner = filters.iter().map(render_expr).collect::<Vec<_>>().join(",");
                vec![("or".to_string(), format!("({})", inner))]
            }
        }
    }
}

/// Render a filter as a nested expression (inside `or=(...)`)
fn render_expr(filter: &Filter) -> String {
    match filter {
        Filter::All => String::new(),
        Filter::Eq(column, value) => format!("{}.eq.{}", column, render_value(value)),
        Filter::And(filters) => {
            let inner = filters.iter().map(render_expr).collect::<Vec<_>>().join(",");
            format!("and({})", inner)
        }
        Filter::Or(filters) => {
            let inner = filters.iter().map(render_expr).collect::<Vec<_>>().join(",");
            format!("or({})", inner)
        }
    }
}

/// Render a JSON value for the query string (strings unquoted)
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result ordering for `select`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column to sort by
    pub column: String,
    /// Ascending when true
    pub ascending: bool,
}

impl Order {
    /// Ascending order on a column
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    /// Descending order on a column
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }

    /// Query-string form, e.g. `created_at.asc`
    pub fn to_query_value(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}
