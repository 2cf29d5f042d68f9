// src/sheets/database/schema.rs
// Fixed physical layout of the cell store (entity-attribute-value model).
//
//   sheet_tables  1 ── * sheet_columns
//        │                    │
//        └──── * sheet_rows   │
//                    │        │
//                    └── * sheet_cells (row_id, column_id) UNIQUE
//
// Every foreign key cascades, so deleting a table, row or column removes the
// dependent cells without application-level bookkeeping.

mod migrations;

pub use migrations::{current_version, ensure_migration_tracking, is_migration_applied};

use super::error::DbResult;
use migrations::mark_migration_applied;
use rusqlite::{Connection, OptionalExtension};

pub const TABLES: &str = "sheet_tables";
pub const COLUMNS: &str = "sheet_columns";
pub const ROWS: &str = "sheet_rows";
pub const CELLS: &str = "sheet_cells";
pub const VIEWS: &str = "sheet_views";

const CREATE_CORE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS sheet_tables (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        owner TEXT NOT NULL,
        next_row_position INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS sheet_columns (
        id TEXT PRIMARY KEY,
        table_id TEXT NOT NULL REFERENCES sheet_tables(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        data_type TEXT NOT NULL DEFAULT 'text',
        position INTEGER NOT NULL,
        UNIQUE (table_id, position)
    );
    CREATE TABLE IF NOT EXISTS sheet_rows (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        table_id TEXT NOT NULL REFERENCES sheet_tables(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        UNIQUE (table_id, position)
    );
    CREATE TABLE IF NOT EXISTS sheet_cells (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        row_id INTEGER NOT NULL REFERENCES sheet_rows(id) ON DELETE CASCADE,
        column_id TEXT NOT NULL REFERENCES sheet_columns(id) ON DELETE CASCADE,
        value TEXT,
        UNIQUE (row_id, column_id)
    );
";

const CREATE_VIEWS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS sheet_views (
        id TEXT PRIMARY KEY,
        table_id TEXT NOT NULL REFERENCES sheet_tables(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        filters TEXT NOT NULL DEFAULT '[]',
        sorting TEXT NOT NULL DEFAULT '[]',
        hidden_columns TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL,
        UNIQUE (table_id, name)
    );
";

// Cascading deletes of a column scan sheet_cells by column_id; the UNIQUE
// constraint only covers (row_id, column_id).
const CREATE_SECONDARY_INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_sheet_cells_column ON sheet_cells(column_id);
    CREATE INDEX IF NOT EXISTS idx_sheet_tables_owner ON sheet_tables(owner);
";

/// Create or upgrade the cell store schema. Safe to call on every open.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    ensure_migration_tracking(conn)?;

    let steps: [(i32, &str, &str); 3] = [
        (1, CREATE_CORE_TABLES, "Created tables, columns, rows and cells"),
        (2, CREATE_VIEWS_TABLE, "Added saved views"),
        (3, CREATE_SECONDARY_INDEXES, "Added cell column and owner indexes"),
    ];

    for (version, sql, description) in steps {
        if is_migration_applied(conn, version)? {
            continue;
        }
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        mark_migration_applied(&tx, version, description)?;
        tx.commit()?;
        tracing::info!("Applied schema migration {}: {}", version, description);
    }

    Ok(())
}

/// Check if a physical table exists in the database
pub fn table_exists(conn: &Connection, table_name: &str) -> DbResult<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name=?",
            [table_name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
