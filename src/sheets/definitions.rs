// src/sheets/definitions.rs
// Entity types of the cell store: tables, columns, rows, cells and views.

use serde::{Deserialize, Serialize};

pub use super::column_data_type::{parse_column_data_type, ColumnDataType};
use super::query::{FilterRule, SortRule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub id: String,
    pub table_id: String,
    pub name: String,
    pub data_type: ColumnDataType,
    /// Dense, zero-based display order within the table.
    pub position: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRecord {
    pub id: i64,
    /// Monotonic insertion order; never reused within a table.
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    pub id: i64,
    pub row_id: i64,
    pub column_id: String,
    pub value: Option<String>,
}

/// A saved (filters, sorting, hidden columns) bundle for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDefinition {
    pub id: String,
    pub table_id: String,
    pub name: String,
    #[serde(default)]
    pub filters: Vec<FilterRule>,
    #[serde(default)]
    pub sorting: Vec<SortRule>,
    #[serde(default)]
    pub hidden_columns: Vec<String>,
    pub created_at: String,
}

/// Columns and placeholder rows a new table starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSeed {
    pub columns: Vec<(String, ColumnDataType)>,
    pub rows: usize,
}

impl Default for TableSeed {
    fn default() -> Self {
        Self {
            columns: vec![
                ("Name".to_string(), ColumnDataType::Text),
                ("Age".to_string(), ColumnDataType::Number),
            ],
            rows: 3,
        }
    }
}

impl TableSeed {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: 0,
        }
    }
}

/// The authenticated caller, as handed over by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: String,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// The operating-system user running this process.
    pub fn current_os_user() -> Self {
        Self::new(whoami::username())
    }
}
