// src/sheets/database/writer/updates.rs
// Update operations - cell values, names and column order

use super::super::error::{DbError, DbResult};
use super::super::schema::{CELLS, COLUMNS, ROWS, TABLES};
use crate::sheets::definitions::CellRecord;
use rusqlite::{params, Connection, OptionalExtension};

/// Set a cell value. Last write wins; there is no concurrency token.
pub fn update_cell(
    conn: &Connection,
    row_id: i64,
    column_id: &str,
    value: Option<&str>,
) -> DbResult<CellRecord> {
    let cell_id: Option<i64> = conn
        .query_row(
            &format!(
                "UPDATE {} SET value = ? WHERE row_id = ? AND column_id = ? RETURNING id",
                CELLS
            ),
            params![value, row_id, column_id],
            |row| row.get(0),
        )
        .optional()?;

    match cell_id {
        Some(id) => Ok(CellRecord {
            id,
            row_id,
            column_id: column_id.to_string(),
            value: value.map(str::to_string),
        }),
        None => {
            let row_exists: bool = conn.query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", ROWS),
                [row_id],
                |row| row.get(0),
            )?;
            if row_exists {
                Err(DbError::ColumnNotFound(column_id.to_string()))
            } else {
                Err(DbError::RowNotFound(row_id))
            }
        }
    }
}

pub fn rename_column(conn: &Connection, column_id: &str, new_name: &str) -> DbResult<()> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(DbError::Validation("Column name must not be empty".to_string()));
    }
    let updated = conn.execute(
        &format!("UPDATE {} SET name = ? WHERE id = ?", COLUMNS),
        params![new_name, column_id],
    )?;
    if updated == 0 {
        return Err(DbError::ColumnNotFound(column_id.to_string()));
    }
    Ok(())
}

pub fn rename_table(conn: &Connection, table_id: &str, new_name: &str) -> DbResult<()> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(DbError::Validation("Table name must not be empty".to_string()));
    }
    let updated = conn.execute(
        &format!("UPDATE {} SET name = ? WHERE id = ?", TABLES),
        params![new_name, table_id],
    )?;
    if updated == 0 {
        return Err(DbError::TableNotFound(table_id.to_string()));
    }
    Ok(())
}

/// Rewrite the column positions of a table to `0..n` following
/// `ordered_ids`. Columns of the table missing from `ordered_ids` keep their
/// relative order after the listed ones; a repeated id counts once.
pub fn update_column_positions(
    conn: &Connection,
    table_id: &str,
    ordered_ids: &[String],
) -> DbResult<()> {
    let tx = conn.unchecked_transaction()?;

    let mut stmt = tx.prepare(&format!(
        "SELECT id FROM {} WHERE table_id = ? ORDER BY position",
        COLUMNS
    ))?;
    let current = stmt
        .query_map([table_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    if let Some(unknown) = ordered_ids.iter().find(|id| !current.contains(id)) {
        return Err(DbError::ColumnNotFound(unknown.clone()));
    }
    // Repeated ids keep their first slot; positions must stay 0..n
    let mut final_order: Vec<&String> = Vec::with_capacity(current.len());
    for id in ordered_ids.iter().chain(current.iter()) {
        if !final_order.contains(&id) {
            final_order.push(id);
        }
    }

    // Phase 1: move every position out of the way (negative) so the remap
    // below never collides with UNIQUE(table_id, position)
    let shifted = tx.execute(
        &format!(
            "UPDATE {} SET position = -(position + 1) WHERE table_id = ?",
            COLUMNS
        ),
        [table_id],
    )?;
    tracing::debug!("Phase 1: moved {} column positions out of the way", shifted);

    // Phase 2: apply final positions
    {
        let mut stmt = tx.prepare(&format!("UPDATE {} SET position = ? WHERE id = ?", COLUMNS))?;
        for (position, id) in final_order.iter().enumerate() {
            stmt.execute(params![position as i64, id])?;
        }
    }

    tx.commit()?;
    tracing::info!(
        "Reordered {} columns of table {}",
        final_order.len(),
        table_id
    );
    Ok(())
}
