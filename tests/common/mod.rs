// tests/common/mod.rs
// Shared fixtures: an on-disk store in a temp dir and a small people table.

#![allow(dead_code)]

use gridstore::sheets::definitions::{ColumnDefinition, TableInfo};
use gridstore::sheets::{CellStore, ColumnDataType, DbReader, DbWriter, TableSeed};
use tempfile::TempDir;

pub const OWNER: &str = "tester";

pub struct Fixture {
    // Held so the directory outlives the store.
    pub dir: TempDir,
    pub store: CellStore,
    pub table: TableInfo,
    pub name_col: ColumnDefinition,
    pub age_col: ColumnDefinition,
}

/// `Name: text, Age: number` table holding one row per entry, in order.
pub fn people(rows: &[(Option<&str>, Option<&str>)]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = CellStore::open(dir.path().join("store.db")).unwrap();
    let conn = store.connect().unwrap();
    let seed = TableSeed {
        columns: vec![
            ("Name".to_string(), ColumnDataType::Text),
            ("Age".to_string(), ColumnDataType::Number),
        ],
        rows: 0,
    };
    let table = DbWriter::create_table(&conn, OWNER, "People", &seed).unwrap();
    let columns = DbReader::read_columns(&conn, &table.id).unwrap();
    let name_col = columns[0].clone();
    let age_col = columns[1].clone();
    for (name, age) in rows {
        DbWriter::add_row(
            &conn,
            &table.id,
            &[
                (name_col.id.clone(), name.map(str::to_string)),
                (age_col.id.clone(), age.map(str::to_string)),
            ],
        )
        .unwrap();
    }
    Fixture {
        dir,
        store,
        table,
        name_col,
        age_col,
    }
}

/// Table of `n` rows named "row 0", "row 1", ...
pub fn numbered(n: usize) -> Fixture {
    let names: Vec<String> = (0..n).map(|i| format!("row {}", i)).collect();
    let rows: Vec<(Option<&str>, Option<&str>)> =
        names.iter().map(|n| (Some(n.as_str()), None)).collect();
    people(&rows)
}
