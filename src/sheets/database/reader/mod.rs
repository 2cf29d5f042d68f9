// src/sheets/database/reader/mod.rs
mod queries;

use super::error::{DbError, DbResult};
use crate::sheets::definitions::{
    CellRecord, ColumnDefinition, RowRecord, TableInfo, UserContext, ViewDefinition,
};
use rusqlite::Connection;

pub use queries::ROW_ID_CHUNK;

/// Database reader - provides all read operations on the cell store
pub struct DbReader;

impl DbReader {
    pub fn get_table(conn: &Connection, table_id: &str) -> DbResult<Option<TableInfo>> {
        queries::get_table(conn, table_id)
    }

    pub fn table_exists(conn: &Connection, table_id: &str) -> DbResult<bool> {
        Ok(queries::get_table(conn, table_id)?.is_some())
    }

    /// Tables owned by `owner`, oldest first
    pub fn list_tables(conn: &Connection, owner: &str) -> DbResult<Vec<TableInfo>> {
        queries::list_tables(conn, owner)
    }

    /// Existence and ownership check the page and bulk paths rely on callers doing
    pub fn require_table_access(
        conn: &Connection,
        table_id: &str,
        user: &UserContext,
    ) -> DbResult<TableInfo> {
        queries::require_table_access(conn, table_id, user)
    }

    pub fn read_columns(conn: &Connection, table_id: &str) -> DbResult<Vec<ColumnDefinition>> {
        queries::read_columns(conn, table_id)
    }

    /// Resolve a column by id, falling back to a case-insensitive name match
    pub fn resolve_column(
        conn: &Connection,
        table_id: &str,
        id_or_name: &str,
    ) -> DbResult<ColumnDefinition> {
        let columns = queries::read_columns(conn, table_id)?;
        columns
            .iter()
            .find(|c| c.id == id_or_name)
            .or_else(|| columns.iter().find(|c| c.name.eq_ignore_ascii_case(id_or_name)))
            .cloned()
            .ok_or_else(|| DbError::ColumnNotFound(id_or_name.to_string()))
    }

    pub fn get_column(conn: &Connection, column_id: &str) -> DbResult<Option<ColumnDefinition>> {
        queries::get_column(conn, column_id)
    }

    pub fn read_rows(conn: &Connection, table_id: &str) -> DbResult<Vec<RowRecord>> {
        queries::read_rows(conn, table_id)
    }

    pub fn count_rows(conn: &Connection, table_id: &str) -> DbResult<u64> {
        queries::count_rows(conn, table_id)
    }

    pub fn row_table_id(conn: &Connection, row_id: i64) -> DbResult<Option<String>> {
        queries::row_table_id(conn, row_id)
    }

    pub fn read_cell(
        conn: &Connection,
        row_id: i64,
        column_id: &str,
    ) -> DbResult<Option<CellRecord>> {
        queries::read_cell(conn, row_id, column_id)
    }

    /// Batched cell fetch for a set of rows (no per-row queries)
    pub fn cells_for_rows(conn: &Connection, row_ids: &[i64]) -> DbResult<Vec<CellRecord>> {
        queries::cells_for_rows(conn, row_ids)
    }

    pub fn list_views(conn: &Connection, table_id: &str) -> DbResult<Vec<ViewDefinition>> {
        queries::list_views(conn, table_id)
    }

    pub fn get_view(conn: &Connection, table_id: &str, name: &str) -> DbResult<ViewDefinition> {
        queries::get_view_by_name(conn, table_id, name)?
            .ok_or_else(|| DbError::ViewNotFound(name.to_string()))
    }
}
