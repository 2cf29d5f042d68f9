// src/sheets/database/writer/test_helpers.rs
// Test utilities for database writer and query tests

#![cfg(test)]

use crate::sheets::database::{schema, DbConnection, DbWriter};
use crate::sheets::definitions::{ColumnDataType, ColumnDefinition, TableInfo, TableSeed};
use rusqlite::Connection;

pub const TEST_OWNER: &str = "tester";

/// In-memory connection with the cell store schema applied.
pub fn setup_store_conn() -> Connection {
    let conn = DbConnection::open_in_memory().unwrap();
    schema::ensure_schema(&conn).unwrap();
    conn
}

/// Create a table with `Name: text` and `Age: number` columns and one row
/// per entry of `people`, returning the table and its columns.
///
/// # Example
/// ```ignore
/// let conn = setup_store_conn();
/// let (table, cols) = setup_people_table(&conn, &[(Some("Bob"), Some("42"))]);
/// ```
pub fn setup_people_table(
    conn: &Connection,
    people: &[(Option<&str>, Option<&str>)],
) -> (TableInfo, Vec<ColumnDefinition>) {
    let seed = TableSeed {
        columns: vec![
            ("Name".to_string(), ColumnDataType::Text),
            ("Age".to_string(), ColumnDataType::Number),
        ],
        rows: 0,
    };
    let table = DbWriter::create_table(conn, TEST_OWNER, "People", &seed).unwrap();
    let columns = crate::sheets::database::DbReader::read_columns(conn, &table.id).unwrap();
    for (name, age) in people {
        let values = vec![
            (columns[0].id.clone(), name.map(str::to_string)),
            (columns[1].id.clone(), age.map(str::to_string)),
        ];
        DbWriter::add_row(conn, &table.id, &values).unwrap();
    }
    (table, columns)
}
