// src/sheets/database/validation.rs
// Validation utilities for cell store integrity checks

use rusqlite::{params, Connection};

use super::error::{DbError, DbResult};
use super::schema::{CELLS, COLUMNS, ROWS, TABLES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCell {
    pub row_id: i64,
    pub column_id: String,
    pub count: i64,
}

/// Outcome of checking that every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutValidationResult {
    pub table_id: String,
    pub total_rows: i64,
    pub total_columns: i64,
    pub total_cells: i64,
    /// Rows holding fewer cells than the table has columns.
    pub rows_missing_cells: Vec<i64>,
    pub duplicates: Vec<DuplicateCell>,
    /// Column positions are not exactly `0..total_columns`.
    pub non_dense_positions: bool,
}

impl FanoutValidationResult {
    pub fn is_valid(&self) -> bool {
        self.rows_missing_cells.is_empty()
            && self.duplicates.is_empty()
            && !self.non_dense_positions
            && self.total_cells == self.total_rows * self.total_columns
    }

    pub fn summary(&self) -> String {
        if self.is_valid() {
            return format!(
                "✓ {}: {} rows x {} columns = {} cells",
                self.table_id, self.total_rows, self.total_columns, self.total_cells
            );
        }
        let mut issues = Vec::new();
        if !self.rows_missing_cells.is_empty() {
            issues.push(format!("{} rows missing cells", self.rows_missing_cells.len()));
        }
        if !self.duplicates.is_empty() {
            issues.push(format!("{} duplicated cells", self.duplicates.len()));
        }
        if self.non_dense_positions {
            issues.push("column positions not dense".to_string());
        }
        let expected = self.total_rows * self.total_columns;
        if self.total_cells != expected {
            issues.push(format!("{} cells, expected {}", self.total_cells, expected));
        }
        format!(
            "⚠ {}: {} rows x {} columns, issues: {}",
            self.table_id,
            self.total_rows,
            self.total_columns,
            issues.join(", ")
        )
    }
}

/// Check the eager cross-product invariant for one table
pub fn validate_cell_fanout(conn: &Connection, table_id: &str) -> DbResult<FanoutValidationResult> {
    let exists: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE id = ?", TABLES),
        [table_id],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(DbError::TableNotFound(table_id.to_string()));
    }

    let total_rows: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE table_id = ?", ROWS),
        [table_id],
        |row| row.get(0),
    )?;

    let (total_columns, min_pos, max_pos, distinct_pos): (i64, Option<i64>, Option<i64>, i64) =
        conn.query_row(
            &format!(
                "SELECT COUNT(*), MIN(position), MAX(position), COUNT(DISTINCT position)
                 FROM {} WHERE table_id = ?",
                COLUMNS
            ),
            [table_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;
    let non_dense_positions = total_columns > 0
        && (min_pos != Some(0)
            || max_pos != Some(total_columns - 1)
            || distinct_pos != total_columns);

    let total_cells: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} c JOIN {} r ON r.id = c.row_id WHERE r.table_id = ?",
            CELLS, ROWS
        ),
        [table_id],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT r.id FROM {rows} r
         LEFT JOIN {cells} c ON c.row_id = r.id
         WHERE r.table_id = ?1
         GROUP BY r.id
         HAVING COUNT(c.id) < ?2
         ORDER BY r.position",
        rows = ROWS,
        cells = CELLS
    ))?;
    let rows_missing_cells = stmt
        .query_map(params![table_id, total_columns], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;

    // UNIQUE(row_id, column_id) forbids this, but databases written by
    // older builds may predate the constraint.
    let mut stmt = conn.prepare(&format!(
        "SELECT c.row_id, c.column_id, COUNT(*) FROM {cells} c
         JOIN {rows} r ON r.id = c.row_id
         WHERE r.table_id = ?
         GROUP BY c.row_id, c.column_id
         HAVING COUNT(*) > 1",
        rows = ROWS,
        cells = CELLS
    ))?;
    let duplicates = stmt
        .query_map([table_id], |row| {
            Ok(DuplicateCell {
                row_id: row.get(0)?,
                column_id: row.get(1)?,
                count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let result = FanoutValidationResult {
        table_id: table_id.to_string(),
        total_rows,
        total_columns,
        total_cells,
        rows_missing_cells,
        duplicates,
        non_dense_positions,
    };
    if result.is_valid() {
        tracing::debug!("{}", result.summary());
    } else {
        tracing::warn!("{}", result.summary());
    }
    Ok(result)
}
