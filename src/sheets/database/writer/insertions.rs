// src/sheets/database/writer/insertions.rs
// Insertion operations - tables, columns, rows and their cell fan-out

use super::super::error::{DbError, DbResult};
use super::super::schema::{CELLS, COLUMNS, ROWS, TABLES};
use super::helpers::{build_values_tuples, new_id, now_timestamp};
use crate::sheets::definitions::{ColumnDataType, ColumnDefinition, RowRecord, TableInfo, TableSeed};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

/// Cells per multi-row INSERT. Three bound values each keeps a statement
/// under SQLite's historical 999-variable ceiling.
pub const CELLS_PER_STATEMENT: usize = 300;

/// A cell to be written by `insert_cells`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCell<'a> {
    pub row_id: i64,
    pub column_id: &'a str,
    pub value: Option<String>,
}

fn require_name(kind: &str, name: &str) -> DbResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DbError::Validation(format!("{} name must not be empty", kind)));
    }
    Ok(trimmed.to_string())
}

/// Insert the table record itself (no columns, rows or cells)
pub fn insert_table(conn: &Connection, owner: &str, name: &str) -> DbResult<TableInfo> {
    let table = TableInfo {
        id: new_id(),
        name: require_name("Table", name)?,
        owner: owner.to_string(),
        created_at: now_timestamp(),
    };
    conn.execute(
        &format!(
            "INSERT INTO {} (id, name, owner, next_row_position, created_at) VALUES (?, ?, ?, 0, ?)",
            TABLES
        ),
        params![table.id, table.name, table.owner, table.created_at],
    )?;
    Ok(table)
}

/// Insert a column record at `max(position) + 1` without touching cells
pub fn insert_column(
    conn: &Connection,
    table_id: &str,
    name: &str,
    data_type: ColumnDataType,
) -> DbResult<ColumnDefinition> {
    let name = require_name("Column", name)?;
    let next_position: i64 = conn.query_row(
        &format!(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM {} WHERE table_id = ?",
            COLUMNS
        ),
        [table_id],
        |row| row.get(0),
    )?;
    let column = ColumnDefinition {
        id: new_id(),
        table_id: table_id.to_string(),
        name,
        data_type,
        position: next_position,
    };
    conn.execute(
        &format!(
            "INSERT INTO {} (id, table_id, name, data_type, position) VALUES (?, ?, ?, ?, ?)",
            COLUMNS
        ),
        params![
            column.id,
            column.table_id,
            column.name,
            column.data_type.as_str(),
            column.position
        ],
    )?;
    Ok(column)
}

/// Reserve `count` consecutive row positions from the table's monotonic
/// counter and return the first one. Positions are never handed out twice,
/// even after the rows holding them are deleted.
pub fn reserve_row_positions(conn: &Connection, table_id: &str, count: usize) -> DbResult<i64> {
    let start: Option<i64> = conn
        .query_row(
            &format!("SELECT next_row_position FROM {} WHERE id = ?", TABLES),
            [table_id],
            |row| row.get(0),
        )
        .optional()?;
    let start = start.ok_or_else(|| DbError::TableNotFound(table_id.to_string()))?;
    conn.execute(
        &format!(
            "UPDATE {} SET next_row_position = next_row_position + ? WHERE id = ?",
            TABLES
        ),
        params![count as i64, table_id],
    )?;
    Ok(start)
}

/// Insert `count` row records and capture their generated ids
pub fn insert_rows(conn: &Connection, table_id: &str, count: usize) -> DbResult<Vec<RowRecord>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let start = reserve_row_positions(conn, table_id, count)?;
    let mut stmt = conn.prepare_cached(&format!(
        "INSERT INTO {} (table_id, position) VALUES (?, ?)",
        ROWS
    ))?;
    let mut rows = Vec::with_capacity(count);
    for offset in 0..count as i64 {
        let position = start + offset;
        stmt.execute(params![table_id, position])?;
        rows.push(RowRecord {
            id: conn.last_insert_rowid(),
            position,
        });
    }
    Ok(rows)
}

/// Insert cells with multi-row statements, returning the number written
pub fn insert_cells(conn: &Connection, cells: &[NewCell<'_>]) -> DbResult<usize> {
    let mut written = 0;
    for chunk in cells.chunks(CELLS_PER_STATEMENT) {
        let sql = format!(
            "INSERT INTO {} (row_id, column_id, value) VALUES {}",
            CELLS,
            build_values_tuples(chunk.len(), 3)
        );
        let mut values: Vec<Value> = Vec::with_capacity(chunk.len() * 3);
        for cell in chunk {
            values.push(Value::Integer(cell.row_id));
            values.push(Value::Text(cell.column_id.to_string()));
            values.push(cell.value.clone().map_or(Value::Null, Value::Text));
        }
        // Full chunks share one cached statement
        let mut stmt = conn.prepare_cached(&sql)?;
        written += stmt.execute(params_from_iter(values))?;
    }
    Ok(written)
}

/// Give every existing row of a table a NULL cell for `column_id`
pub fn fan_out_cells_for_column(conn: &Connection, table_id: &str, column_id: &str) -> DbResult<usize> {
    let inserted = conn.execute(
        &format!(
            "INSERT INTO {cells} (row_id, column_id, value)
             SELECT r.id, ?, NULL FROM {rows} r WHERE r.table_id = ?",
            cells = CELLS,
            rows = ROWS
        ),
        params![column_id, table_id],
    )?;
    Ok(inserted)
}

/// Fill the full row x column cross product of a table with NULL cells,
/// skipping pairs that already have one
pub fn fan_out_cells_for_table(conn: &Connection, table_id: &str) -> DbResult<usize> {
    let inserted = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO {cells} (row_id, column_id, value)
             SELECT r.id, c.id, NULL
             FROM {rows} r JOIN {columns} c ON c.table_id = r.table_id
             WHERE r.table_id = ?",
            cells = CELLS,
            rows = ROWS,
            columns = COLUMNS
        ),
        [table_id],
    )?;
    Ok(inserted)
}

/// Create a table with its seed columns, seed rows and their cell cross
/// product, all in one transaction
pub fn create_table(conn: &Connection, owner: &str, name: &str, seed: &TableSeed) -> DbResult<TableInfo> {
    let tx = conn.unchecked_transaction()?;
    let table = insert_table(&tx, owner, name)?;
    for (column_name, data_type) in &seed.columns {
        insert_column(&tx, &table.id, column_name, *data_type)?;
    }
    insert_rows(&tx, &table.id, seed.rows)?;
    let cells = fan_out_cells_for_table(&tx, &table.id)?;
    tx.commit()?;

    tracing::info!(
        "Created table '{}' ({}) with {} columns, {} rows, {} cells",
        table.name,
        table.id,
        seed.columns.len(),
        seed.rows,
        cells
    );
    Ok(table)
}

/// Append a column and fan out one NULL cell per existing row
pub fn add_column(
    conn: &Connection,
    table_id: &str,
    name: &str,
    data_type: ColumnDataType,
) -> DbResult<ColumnDefinition> {
    let tx = conn.unchecked_transaction()?;
    let exists: Option<String> = tx
        .query_row(
            &format!("SELECT id FROM {} WHERE id = ?", TABLES),
            [table_id],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(DbError::TableNotFound(table_id.to_string()));
    }
    let column = insert_column(&tx, table_id, name, data_type)?;
    let cells = fan_out_cells_for_column(&tx, table_id, &column.id)?;
    tx.commit()?;

    tracing::info!(
        "Added column '{}' at position {} to table {} ({} cells)",
        column.name,
        column.position,
        table_id,
        cells
    );
    Ok(column)
}

/// Append a row with one cell per column. `values` maps column ids to
/// initial values; columns not mentioned start as NULL.
pub fn add_row(
    conn: &Connection,
    table_id: &str,
    values: &[(String, Option<String>)],
) -> DbResult<RowRecord> {
    let tx = conn.unchecked_transaction()?;
    let mut stmt = tx.prepare(&format!(
        "SELECT id FROM {} WHERE table_id = ? ORDER BY position",
        COLUMNS
    ))?;
    let column_ids = stmt
        .query_map([table_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    if let Some((unknown, _)) = values.iter().find(|(id, _)| !column_ids.contains(id)) {
        return Err(DbError::ColumnNotFound(unknown.clone()));
    }

    let row = insert_rows(&tx, table_id, 1)?
        .pop()
        .ok_or_else(|| DbError::Other("row insert returned no id".to_string()))?;

    let cells: Vec<NewCell<'_>> = column_ids
        .iter()
        .map(|column_id| NewCell {
            row_id: row.id,
            column_id: column_id.as_str(),
            value: values
                .iter()
                .find(|(id, _)| id == column_id)
                .and_then(|(_, v)| v.clone()),
        })
        .collect();
    insert_cells(&tx, &cells)?;
    tx.commit()?;

    tracing::debug!("Added row {} at position {} to table {}", row.id, row.position, table_id);
    Ok(row)
}
