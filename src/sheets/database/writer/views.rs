// src/sheets/database/writer/views.rs
// Saved views: named (filters, sorting, hidden columns) bundles per table

use super::super::error::{DbError, DbResult};
use super::super::schema::VIEWS;
use super::helpers::{new_id, now_timestamp};
use crate::sheets::definitions::ViewDefinition;
use crate::sheets::query::{FilterRule, SortRule};
use rusqlite::{params, Connection};

/// Insert or replace the view called `name` on a table
pub fn save_view(
    conn: &Connection,
    table_id: &str,
    name: &str,
    filters: &[FilterRule],
    sorting: &[SortRule],
    hidden_columns: &[String],
) -> DbResult<ViewDefinition> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::Validation("View name must not be empty".to_string()));
    }
    let view = ViewDefinition {
        id: new_id(),
        table_id: table_id.to_string(),
        name: name.to_string(),
        filters: filters.to_vec(),
        sorting: sorting.to_vec(),
        hidden_columns: hidden_columns.to_vec(),
        created_at: now_timestamp(),
    };

    let (id, created_at): (String, String) = conn.query_row(
        &format!(
            "INSERT INTO {} (id, table_id, name, filters, sorting, hidden_columns, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (table_id, name) DO UPDATE SET
                filters = excluded.filters,
                sorting = excluded.sorting,
                hidden_columns = excluded.hidden_columns
             RETURNING id, created_at",
            VIEWS
        ),
        params![
            view.id,
            view.table_id,
            view.name,
            serde_json::to_value(&view.filters)?,
            serde_json::to_value(&view.sorting)?,
            serde_json::to_value(&view.hidden_columns)?,
            view.created_at
        ],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    tracing::debug!("Saved view '{}' on table {}", view.name, table_id);
    Ok(ViewDefinition {
        id,
        created_at,
        ..view
    })
}
