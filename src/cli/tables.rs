// src/cli/tables.rs
// Table, column, row and cell commands

use super::CliContext;
use crate::sheets::{ColumnDataType, DbError, DbReader, DbResult, DbWriter, TableSeed};

pub fn create_table(
    ctx: &CliContext,
    name: &str,
    columns: Vec<(String, ColumnDataType)>,
    rows: usize,
) -> DbResult<()> {
    let mut seed = TableSeed::default();
    if !columns.is_empty() {
        seed.columns = columns;
    }
    seed.rows = rows;
    let conn = ctx.store.connect()?;
    let table = DbWriter::create_table(&conn, &ctx.user.user_id, name, &seed)?;
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}

pub fn list_tables(ctx: &CliContext) -> DbResult<()> {
    let conn = ctx.store.connect()?;
    let tables = DbReader::list_tables(&conn, &ctx.user.user_id)?;
    if tables.is_empty() {
        println!("No tables for '{}'", ctx.user.user_id);
        return Ok(());
    }
    println!("{:<38} {:<24} {:>8} {}", "Id", "Name", "Rows", "Created");
    println!("{}", "-".repeat(96));
    for table in tables {
        let rows = DbReader::count_rows(&conn, &table.id)?;
        println!(
            "{:<38} {:<24} {:>8} {}",
            table.id, table.name, rows, table.created_at
        );
    }
    Ok(())
}

pub fn drop_table(ctx: &CliContext, table_id: &str) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    DbWriter::delete_table(&conn, &table.id)?;
    println!("Dropped table '{}'", table.name);
    Ok(())
}

pub fn add_column(
    ctx: &CliContext,
    table_id: &str,
    name: &str,
    data_type: ColumnDataType,
) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    let column = DbWriter::add_column(&conn, &table.id, name, data_type)?;
    println!("{}", serde_json::to_string_pretty(&column)?);
    Ok(())
}

pub fn drop_column(ctx: &CliContext, table_id: &str, column: &str) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    let column = DbReader::resolve_column(&conn, &table.id, column)?;
    DbWriter::delete_column(&conn, &column.id)?;
    println!("Dropped column '{}' from '{}'", column.name, table.name);
    Ok(())
}

pub fn add_row(ctx: &CliContext, table_id: &str, values: &[(String, String)]) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    let resolved = values
        .iter()
        .map(|(column, value)| {
            DbReader::resolve_column(&conn, &table.id, column).map(|c| (c.id, Some(value.clone())))
        })
        .collect::<DbResult<Vec<_>>>()?;
    let row = DbWriter::add_row(&conn, &table.id, &resolved)?;
    println!("{}", serde_json::to_string_pretty(&row)?);
    Ok(())
}

pub fn rename_table(ctx: &CliContext, table_id: &str, name: &str) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    DbWriter::rename_table(&conn, &table.id, name)?;
    println!("Renamed table '{}' to '{}'", table.name, name.trim());
    Ok(())
}

pub fn rename_column(ctx: &CliContext, table_id: &str, column: &str, name: &str) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    let column = DbReader::resolve_column(&conn, &table.id, column)?;
    DbWriter::rename_column(&conn, &column.id, name)?;
    println!("Renamed column '{}' to '{}'", column.name, name.trim());
    Ok(())
}

pub fn reorder_columns(ctx: &CliContext, table_id: &str, columns: &[String]) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    let ordered = columns
        .iter()
        .map(|column| DbReader::resolve_column(&conn, &table.id, column).map(|c| c.id))
        .collect::<DbResult<Vec<_>>>()?;
    DbWriter::update_column_positions(&conn, &table.id, &ordered)?;
    for column in DbReader::read_columns(&conn, &table.id)? {
        println!("{:>3} {}", column.position, column.name);
    }
    Ok(())
}

fn require_row_in_table(conn: &rusqlite::Connection, table_id: &str, row_id: i64) -> DbResult<()> {
    match DbReader::row_table_id(conn, row_id)? {
        Some(owner_table) if owner_table == table_id => Ok(()),
        _ => Err(DbError::RowNotFound(row_id)),
    }
}

pub fn drop_row(ctx: &CliContext, table_id: &str, row_id: i64) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    require_row_in_table(&conn, &table.id, row_id)?;
    DbWriter::delete_row(&conn, row_id)?;
    println!("Dropped row {} from '{}'", row_id, table.name);
    Ok(())
}

pub fn set_cell(
    ctx: &CliContext,
    table_id: &str,
    row_id: i64,
    column: &str,
    value: Option<&str>,
) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    require_row_in_table(&conn, &table.id, row_id)?;
    let column = DbReader::resolve_column(&conn, &table.id, column)?;
    let cell = DbWriter::update_cell(&conn, row_id, &column.id, value)?;
    println!("{}", serde_json::to_string_pretty(&cell)?);
    Ok(())
}
