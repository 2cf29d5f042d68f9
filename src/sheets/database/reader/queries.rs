// src/sheets/database/reader/queries.rs
// READ-only queries against the cell store.

use super::super::error::{DbError, DbResult};
use super::super::schema::{CELLS, COLUMNS, ROWS, TABLES, VIEWS};
use super::super::writer::helpers::build_placeholders;
use crate::sheets::definitions::{
    parse_column_data_type, CellRecord, ColumnDataType, ColumnDefinition, RowRecord, TableInfo,
    UserContext, ViewDefinition,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

/// Row ids bound per `IN (...)` list when fetching cells.
pub const ROW_ID_CHUNK: usize = 500;

fn table_from_row(row: &Row<'_>) -> rusqlite::Result<TableInfo> {
    Ok(TableInfo {
        id: row.get(0)?,
        name: row.get(1)?,
        owner: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn column_from_row(row: &Row<'_>) -> rusqlite::Result<ColumnDefinition> {
    let raw_type: String = row.get(3)?;
    let data_type = parse_column_data_type(&raw_type).unwrap_or_else(|| {
        tracing::warn!("Unknown column data type '{}', treating as text", raw_type);
        ColumnDataType::Text
    });
    Ok(ColumnDefinition {
        id: row.get(0)?,
        table_id: row.get(1)?,
        name: row.get(2)?,
        data_type,
        position: row.get(4)?,
    })
}

pub fn get_table(conn: &Connection, table_id: &str) -> DbResult<Option<TableInfo>> {
    let table = conn
        .query_row(
            &format!("SELECT id, name, owner, created_at FROM {} WHERE id = ?", TABLES),
            [table_id],
            table_from_row,
        )
        .optional()?;
    Ok(table)
}

pub fn list_tables(conn: &Connection, owner: &str) -> DbResult<Vec<TableInfo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, owner, created_at FROM {} WHERE owner = ? ORDER BY created_at, name",
        TABLES
    ))?;
    let tables = stmt
        .query_map([owner], table_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tables)
}

/// Verify table exists and belongs to `user`, or return an error
pub fn require_table_access(
    conn: &Connection,
    table_id: &str,
    user: &UserContext,
) -> DbResult<TableInfo> {
    let table = get_table(conn, table_id)?
        .ok_or_else(|| DbError::TableNotFound(table_id.to_string()))?;
    if table.owner != user.user_id {
        return Err(DbError::AccessDenied {
            user: user.user_id.clone(),
            table_id: table_id.to_string(),
        });
    }
    Ok(table)
}

/// Column catalog of a table in display order
pub fn read_columns(conn: &Connection, table_id: &str) -> DbResult<Vec<ColumnDefinition>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT id, table_id, name, data_type, position FROM {} WHERE table_id = ? ORDER BY position",
        COLUMNS
    ))?;
    let columns = stmt
        .query_map([table_id], column_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

pub fn get_column(conn: &Connection, column_id: &str) -> DbResult<Option<ColumnDefinition>> {
    let column = conn
        .query_row(
            &format!(
                "SELECT id, table_id, name, data_type, position FROM {} WHERE id = ?",
                COLUMNS
            ),
            [column_id],
            column_from_row,
        )
        .optional()?;
    Ok(column)
}

/// All rows of a table in position order
pub fn read_rows(conn: &Connection, table_id: &str) -> DbResult<Vec<RowRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, position FROM {} WHERE table_id = ? ORDER BY position",
        ROWS
    ))?;
    let rows = stmt
        .query_map([table_id], |r| {
            Ok(RowRecord {
                id: r.get(0)?,
                position: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_rows(conn: &Connection, table_id: &str) -> DbResult<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE table_id = ?", ROWS),
        [table_id],
        |r| r.get(0),
    )?;
    Ok(count as u64)
}

/// Table a row belongs to
pub fn row_table_id(conn: &Connection, row_id: i64) -> DbResult<Option<String>> {
    let table_id = conn
        .query_row(
            &format!("SELECT table_id FROM {} WHERE id = ?", ROWS),
            [row_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(table_id)
}

pub fn read_cell(conn: &Connection, row_id: i64, column_id: &str) -> DbResult<Option<CellRecord>> {
    let cell = conn
        .query_row(
            &format!(
                "SELECT id, row_id, column_id, value FROM {} WHERE row_id = ? AND column_id = ?",
                CELLS
            ),
            params![row_id, column_id],
            |r| {
                Ok(CellRecord {
                    id: r.get(0)?,
                    row_id: r.get(1)?,
                    column_id: r.get(2)?,
                    value: r.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(cell)
}

/// Every cell of the given rows in one batched read per chunk of ids,
/// ordered by row then column position.
pub fn cells_for_rows(conn: &Connection, row_ids: &[i64]) -> DbResult<Vec<CellRecord>> {
    let mut cells = Vec::new();
    for chunk in row_ids.chunks(ROW_ID_CHUNK) {
        let sql = format!(
            "SELECT c.id, c.row_id, c.column_id, c.value
             FROM {cells} c JOIN {columns} col ON col.id = c.column_id
             WHERE c.row_id IN ({placeholders})
             ORDER BY c.row_id, col.position",
            cells = CELLS,
            columns = COLUMNS,
            placeholders = build_placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |r| {
            Ok(CellRecord {
                id: r.get(0)?,
                row_id: r.get(1)?,
                column_id: r.get(2)?,
                value: r.get(3)?,
            })
        })?;
        for cell in rows {
            cells.push(cell?);
        }
    }
    Ok(cells)
}

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<ViewDefinition> {
    let filters: serde_json::Value = row.get(3)?;
    let sorting: serde_json::Value = row.get(4)?;
    let hidden: serde_json::Value = row.get(5)?;
    let decode = |idx: usize, e: serde_json::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    };
    Ok(ViewDefinition {
        id: row.get(0)?,
        table_id: row.get(1)?,
        name: row.get(2)?,
        filters: serde_json::from_value(filters).map_err(|e| decode(3, e))?,
        sorting: serde_json::from_value(sorting).map_err(|e| decode(4, e))?,
        hidden_columns: serde_json::from_value(hidden).map_err(|e| decode(5, e))?,
        created_at: row.get(6)?,
    })
}

pub fn list_views(conn: &Connection, table_id: &str) -> DbResult<Vec<ViewDefinition>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, table_id, name, filters, sorting, hidden_columns, created_at
         FROM {} WHERE table_id = ? ORDER BY name",
        VIEWS
    ))?;
    let views = stmt
        .query_map([table_id], view_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(views)
}

pub fn get_view_by_name(
    conn: &Connection,
    table_id: &str,
    name: &str,
) -> DbResult<Option<ViewDefinition>> {
    let view = conn
        .query_row(
            &format!(
                "SELECT id, table_id, name, filters, sorting, hidden_columns, created_at
                 FROM {} WHERE table_id = ? AND name = ?",
                VIEWS
            ),
            params![table_id, name],
            view_from_row,
        )
        .optional()?;
    Ok(view)
}
