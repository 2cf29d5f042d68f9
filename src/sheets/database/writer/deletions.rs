// src/sheets/database/writer/deletions.rs
// Deletion operations - cells go with their row, column or table through
// ON DELETE CASCADE

use super::super::error::{DbError, DbResult};
use super::super::schema::{COLUMNS, ROWS, TABLES, VIEWS};
use super::helpers::build_delete_sql;
use rusqlite::{params, Connection, OptionalExtension};

/// Delete a row. Row positions are not compacted, so the position of a
/// deleted row is never reused.
pub fn delete_row(conn: &Connection, row_id: i64) -> DbResult<()> {
    let sql = build_delete_sql(ROWS, "id = ?");
    if conn.execute(&sql, params![row_id])? == 0 {
        return Err(DbError::RowNotFound(row_id));
    }
    Ok(())
}

/// Delete a column and close the gap it leaves in the table's positions
pub fn delete_column(conn: &Connection, column_id: &str) -> DbResult<()> {
    let tx = conn.unchecked_transaction()?;

    let found: Option<(String, i64)> = tx
        .query_row(
            &format!("SELECT table_id, position FROM {} WHERE id = ?", COLUMNS),
            [column_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (table_id, position) =
        found.ok_or_else(|| DbError::ColumnNotFound(column_id.to_string()))?;

    tx.execute(&build_delete_sql(COLUMNS, "id = ?"), [column_id])?;

    // Two-phase shift keeps UNIQUE(table_id, position) satisfied at every step
    tx.execute(
        &format!(
            "UPDATE {} SET position = -position WHERE table_id = ? AND position > ?",
            COLUMNS
        ),
        params![table_id, position],
    )?;
    let compacted = tx.execute(
        &format!(
            "UPDATE {} SET position = -position - 1 WHERE table_id = ? AND position < 0",
            COLUMNS
        ),
        [&table_id],
    )?;

    tx.commit()?;
    tracing::info!(
        "Deleted column {} from table {} ({} columns shifted)",
        column_id,
        table_id,
        compacted
    );
    Ok(())
}

/// Delete a table with all its columns, rows, cells and views
pub fn delete_table(conn: &Connection, table_id: &str) -> DbResult<()> {
    let deleted = conn.execute(&build_delete_sql(TABLES, "id = ?"), [table_id])?;
    if deleted == 0 {
        return Err(DbError::TableNotFound(table_id.to_string()));
    }
    tracing::info!("Deleted table {}", table_id);
    Ok(())
}

pub fn delete_view(conn: &Connection, table_id: &str, name: &str) -> DbResult<()> {
    let deleted = conn.execute(
        &build_delete_sql(VIEWS, "table_id = ? AND name = ?"),
        params![table_id, name],
    )?;
    if deleted == 0 {
        return Err(DbError::ViewNotFound(name.to_string()));
    }
    Ok(())
}
