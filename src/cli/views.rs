// src/cli/views.rs
// Saved view commands

use super::{parse_filter_spec, parse_sort_spec, CliContext};
use crate::sheets::query::{FilterOperator, FilterRule, SortDirection, SortRule};
use crate::sheets::{DbError, DbReader, DbResult, DbWriter};
use clap::Args;
use rusqlite::Connection;

#[derive(Args, Debug)]
pub struct SaveViewArgs {
    pub table: String,
    pub name: String,
    /// COLUMN:OPERATOR[:VALUE]; repeatable
    #[arg(long = "filter", value_parser = parse_filter_spec)]
    pub filters: Vec<(String, FilterOperator, Option<String>)>,
    /// COLUMN[:asc|desc]
    #[arg(long, value_parser = parse_sort_spec)]
    pub sort: Option<(String, SortDirection)>,
    /// Column to hide; repeatable
    #[arg(long = "hide")]
    pub hidden: Vec<String>,
}

/// Turn CLI filter specs into rules keyed by column id. Names that do not
/// resolve are kept verbatim so the query side can drop them.
pub fn resolve_filters(
    conn: &Connection,
    table_id: &str,
    specs: &[(String, FilterOperator, Option<String>)],
) -> DbResult<Vec<FilterRule>> {
    specs
        .iter()
        .map(|(column, operator, value)| {
            Ok(FilterRule::new(
                resolve_column_id(conn, table_id, column)?,
                *operator,
                value.as_deref(),
            ))
        })
        .collect()
}

pub fn resolve_sort(
    conn: &Connection,
    table_id: &str,
    spec: Option<&(String, SortDirection)>,
) -> DbResult<Vec<SortRule>> {
    spec.map(|(column, direction)| {
        Ok(SortRule::new(resolve_column_id(conn, table_id, column)?, *direction))
    })
    .into_iter()
    .collect()
}

pub fn resolve_column_id(conn: &Connection, table_id: &str, column: &str) -> DbResult<String> {
    match DbReader::resolve_column(conn, table_id, column) {
        Ok(def) => Ok(def.id),
        Err(DbError::ColumnNotFound(_)) => Ok(column.to_string()),
        Err(e) => Err(e),
    }
}

pub fn save_view(ctx: &CliContext, args: SaveViewArgs) -> DbResult<()> {
    let (conn, table) = ctx.authorize(&args.table)?;
    let filters = resolve_filters(&conn, &table.id, &args.filters)?;
    let sorting = resolve_sort(&conn, &table.id, args.sort.as_ref())?;
    let hidden = args
        .hidden
        .iter()
        .map(|c| DbReader::resolve_column(&conn, &table.id, c).map(|def| def.id))
        .collect::<DbResult<Vec<_>>>()?;
    let view = DbWriter::save_view(&conn, &table.id, &args.name, &filters, &sorting, &hidden)?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub fn list_views(ctx: &CliContext, table_id: &str) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    let views = DbReader::list_views(&conn, &table.id)?;
    if views.is_empty() {
        println!("No views for '{}'", table.name);
        return Ok(());
    }
    for view in views {
        println!(
            "{:<24} filters={} sort={} hidden={}",
            view.name,
            view.filters.len(),
            view.sorting.len(),
            view.hidden_columns.len()
        );
    }
    Ok(())
}

pub fn drop_view(ctx: &CliContext, table_id: &str, name: &str) -> DbResult<()> {
    let (conn, table) = ctx.authorize(table_id)?;
    DbWriter::delete_view(&conn, &table.id, name)?;
    println!("Dropped view '{}' from '{}'", name, table.name);
    Ok(())
}
