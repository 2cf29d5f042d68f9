// src/sheets/query/mod.rs
// Request/response shapes of the page query path plus the compilers that
// turn filter and sort rules into a storage-independent condition AST.

pub mod condition;
pub mod page;
pub mod predicate;
pub mod search;
pub mod sort;

pub use condition::{CellTest, Condition, OrderExpression, OrderKey, OrderSource, SqlFragment};
pub use page::{PageLimits, QueryEngine};
pub use predicate::{compile_filter, compile_filters};
pub use sort::compile_sort;

use crate::sheets::column_data_type::deserialize_type_hint;
use crate::sheets::definitions::{ColumnDataType, ColumnDefinition, ViewDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

impl FilterOperator {
    pub fn requires_value(&self) -> bool {
        !matches!(self, FilterOperator::IsEmpty | FilterOperator::IsNotEmpty)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let op = match raw.trim().to_ascii_lowercase().as_str() {
            "equals" | "eq" | "=" => FilterOperator::Equals,
            "contains" => FilterOperator::Contains,
            "notcontains" | "not_contains" => FilterOperator::NotContains,
            "greaterthan" | "gt" | ">" => FilterOperator::GreaterThan,
            "lessthan" | "lt" | "<" => FilterOperator::LessThan,
            "isempty" | "empty" => FilterOperator::IsEmpty,
            "isnotempty" | "notempty" => FilterOperator::IsNotEmpty,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    pub column_id: String,
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Accepted for request-shape compatibility; the column catalog decides.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_type_hint",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_type: Option<ColumnDataType>,
}

impl FilterRule {
    pub fn new(column_id: impl Into<String>, operator: FilterOperator, value: Option<&str>) -> Self {
        Self {
            column_id: column_id.into(),
            operator,
            value: value.map(str::to_string),
            data_type: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRule {
    pub column_id: String,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_type_hint",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_type: Option<ColumnDataType>,
}

impl SortRule {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
            data_type: None,
        }
    }
}

/// One `GetPage` call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub table_id: String,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<u64>,
    #[serde(default)]
    pub filters: Vec<FilterRule>,
    /// Only the first rule is applied.
    #[serde(default)]
    pub sorting: Vec<SortRule>,
    #[serde(default)]
    pub search_term: Option<String>,
    /// Column ids whose cells are left out of the returned items.
    #[serde(default)]
    pub hidden_columns: Vec<String>,
}

impl PageRequest {
    pub fn for_table(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cursor(mut self, cursor: u64) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn filter(mut self, rule: FilterRule) -> Self {
        self.filters.push(rule);
        self
    }

    pub fn sort(mut self, rule: SortRule) -> Self {
        self.sorting.push(rule);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Fill unset clauses from a saved view. Anything already present on the
    /// request wins over the view.
    pub fn with_view_defaults(mut self, view: &ViewDefinition) -> Self {
        if self.filters.is_empty() {
            self.filters = view.filters.clone();
        }
        if self.sorting.is_empty() {
            self.sorting = view.sorting.clone();
        }
        if self.hidden_columns.is_empty() {
            self.hidden_columns = view.hidden_columns.clone();
        }
        self
    }

    /// Search term with surrounding whitespace removed; `None` when blank.
    pub fn effective_search_term(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCell {
    pub cell_id: i64,
    pub column_id: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageItem {
    pub row_id: i64,
    pub position: i64,
    pub cells: Vec<PageCell>,
}

impl PageItem {
    pub fn value_of(&self, column_id: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|c| c.column_id == column_id)
            .and_then(|c| c.value.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SearchMatch {
    #[serde(rename_all = "camelCase")]
    Column { column_id: String },
    #[serde(rename_all = "camelCase")]
    Cell {
        cell_id: i64,
        column_id: String,
        /// Absolute index of the row within the filtered, sorted result.
        row_index: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<PageItem>,
    pub search_matches: Vec<SearchMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_filtered_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<u64>,
}

/// A table's columns keyed by id, loaded once per request.
#[derive(Debug, Clone, Default)]
pub struct ColumnCatalog {
    ordered: Vec<ColumnDefinition>,
    by_id: HashMap<String, usize>,
}

impl ColumnCatalog {
    pub fn new(mut columns: Vec<ColumnDefinition>) -> Self {
        columns.sort_by_key(|c| c.position);
        let by_id = columns
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.id.clone(), idx))
            .collect();
        Self {
            ordered: columns,
            by_id,
        }
    }

    pub fn get(&self, column_id: &str) -> Option<&ColumnDefinition> {
        self.by_id.get(column_id).map(|&idx| &self.ordered[idx])
    }

    pub fn data_type(&self, column_id: &str) -> Option<ColumnDataType> {
        self.get(column_id).map(|c| c.data_type)
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.ordered
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_presentation_shape() {
        let json = r#"{
            "tableId": "t1",
            "limit": 50,
            "filters": [{"columnId": "age", "operator": "greaterThan", "value": "30", "type": "number"},
                        {"columnId": "name", "operator": "isEmpty"}],
            "sorting": [{"columnId": "name", "direction": "desc", "type": "string"}],
            "searchTerm": "bo"
        }"#;
        let req: PageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.limit, Some(50));
        assert_eq!(req.cursor, None);
        assert_eq!(req.filters[0].operator, FilterOperator::GreaterThan);
        assert_eq!(req.filters[0].data_type, Some(ColumnDataType::Number));
        assert_eq!(req.filters[1].value, None);
        assert_eq!(req.sorting[0].direction, SortDirection::Desc);
        assert_eq!(req.sorting[0].data_type, Some(ColumnDataType::Text));
    }

    #[test]
    fn test_request_ignores_unknown_type_hints() {
        let json = r#"{
            "tableId": "t1",
            "filters": [{"columnId": "due", "operator": "equals", "value": "2024-01-01", "type": "date"}],
            "sorting": [{"columnId": "due", "direction": "asc", "type": "datetime"}]
        }"#;
        let req: PageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.filters[0].data_type, None);
        assert_eq!(req.filters[0].value.as_deref(), Some("2024-01-01"));
        assert_eq!(req.sorting[0].data_type, None);
        assert_eq!(req.sorting[0].direction, SortDirection::Asc);
    }

    #[test]
    fn test_search_match_wire_shape() {
        let m = SearchMatch::Cell {
            cell_id: 7,
            column_id: "c".into(),
            row_index: 3,
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["kind"], "cell");
        assert_eq!(v["cellId"], 7);
        assert_eq!(v["rowIndex"], 3);
        let col = serde_json::to_value(SearchMatch::Column { column_id: "c".into() }).unwrap();
        assert_eq!(col["kind"], "column");
        assert_eq!(col["columnId"], "c");
    }

    #[test]
    fn test_page_omits_absent_counters() {
        let v = serde_json::to_value(Page::default()).unwrap();
        assert!(v.get("nextCursor").is_none());
        assert!(v.get("totalFilteredCount").is_none());
    }

    #[test]
    fn test_view_defaults_do_not_override_request() {
        let view = ViewDefinition {
            id: "v".into(),
            table_id: "t".into(),
            name: "Adults".into(),
            filters: vec![FilterRule::new("age", FilterOperator::GreaterThan, Some("17"))],
            sorting: vec![SortRule::new("name", SortDirection::Asc)],
            hidden_columns: vec!["notes".into()],
            created_at: String::new(),
        };
        let req = PageRequest::for_table("t")
            .sort(SortRule::new("age", SortDirection::Desc))
            .with_view_defaults(&view);
        assert_eq!(req.filters.len(), 1);
        assert_eq!(req.sorting[0].column_id, "age");
        assert_eq!(req.hidden_columns, vec!["notes".to_string()]);
    }

    #[test]
    fn test_blank_search_term_is_absent() {
        assert_eq!(PageRequest::for_table("t").search("   ").effective_search_term(), None);
        assert_eq!(PageRequest::for_table("t").search(" bo ").effective_search_term(), Some("bo"));
    }
}
