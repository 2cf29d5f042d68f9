// src/cli/mod.rs
// Command-line front end over the cell store, query engine and bulk pipeline

pub mod maintenance;
pub mod query;
pub mod tables;
pub mod views;

use crate::settings::AppSettings;
use crate::sheets::definitions::parse_column_data_type;
use crate::sheets::query::{FilterOperator, SortDirection};
use crate::sheets::{CellStore, ColumnDataType, DbReader, DbResult, TableInfo, UserContext};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridstore")]
#[command(about = "GridStore - spreadsheet tables on an EAV cell store", long_about = None)]
pub struct Cli {
    /// Cell store file (overrides settings and GRIDSTORE_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Acting user (defaults to the OS user name)
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a table with seed columns and rows
    CreateTable {
        name: String,
        /// Seed column as NAME[:TYPE]; repeatable. Defaults to Name:text, Age:number
        #[arg(long = "column", value_parser = parse_column_spec)]
        columns: Vec<(String, ColumnDataType)>,
        /// Number of empty seed rows
        #[arg(long, default_value_t = 3)]
        rows: usize,
    },

    /// List tables owned by the acting user
    ListTables,

    /// Delete a table with all its columns, rows, cells and views
    DropTable { table: String },

    /// Append a column
    AddColumn {
        table: String,
        name: String,
        #[arg(long = "type", default_value = "text", value_parser = parse_data_type)]
        data_type: ColumnDataType,
    },

    /// Delete a column and its cells
    DropColumn { table: String, column: String },

    /// Append a row; values as COLUMN=VALUE
    AddRow {
        table: String,
        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },

    /// Rename a table
    RenameTable { table: String, name: String },

    /// Rename a column
    RenameColumn {
        table: String,
        column: String,
        name: String,
    },

    /// Move the listed columns to the front, in the given order
    ReorderColumns {
        table: String,
        #[arg(required = true)]
        columns: Vec<String>,
    },

    /// Delete a row and its cells
    DropRow { table: String, row_id: i64 },

    /// Set (or clear) one cell value
    SetCell {
        table: String,
        row_id: i64,
        column: String,
        /// New value; omit to store NULL
        value: Option<String>,
    },

    /// Fetch one page of rows as JSON
    Page(query::PageArgs),

    /// Append synthetic rows
    BulkInsert {
        table: String,
        count: usize,
        /// Seed for reproducible values
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        timeout: TimeoutArgs,
    },

    /// Save filters, sort and hidden columns under a name
    SaveView(views::SaveViewArgs),

    /// List saved views of a table
    ListViews { table: String },

    /// Delete a saved view
    DropView { table: String, name: String },

    /// Check that every row has exactly one cell per column
    Validate { table: String },

    /// Force a WAL checkpoint
    Checkpoint,

    /// Print effective settings
    Settings {
        /// Persist the effective settings to the settings file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct TimeoutArgs {
    /// Abort the operation after this many milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

/// Column spec `NAME[:TYPE]`
pub fn parse_column_spec(raw: &str) -> Result<(String, ColumnDataType), String> {
    let (name, data_type) = match raw.rsplit_once(':') {
        Some((name, ty)) => (name, parse_data_type(ty)?),
        None => (raw, ColumnDataType::Text),
    };
    if name.trim().is_empty() {
        return Err("column name must not be empty".to_string());
    }
    Ok((name.trim().to_string(), data_type))
}

pub fn parse_data_type(raw: &str) -> Result<ColumnDataType, String> {
    parse_column_data_type(raw).ok_or_else(|| format!("unknown column type '{}'", raw))
}

/// `COLUMN=VALUE`
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(column, value)| (column.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{}'", raw))
}

/// Filter spec `COLUMN:OPERATOR[:VALUE]`
pub fn parse_filter_spec(raw: &str) -> Result<(String, FilterOperator, Option<String>), String> {
    let mut parts = raw.splitn(3, ':');
    let column = parts.next().unwrap_or_default().trim();
    let operator = parts
        .next()
        .ok_or_else(|| format!("expected COLUMN:OPERATOR[:VALUE], got '{}'", raw))?;
    let operator =
        FilterOperator::parse(operator).ok_or_else(|| format!("unknown operator '{}'", operator))?;
    if column.is_empty() {
        return Err("filter column must not be empty".to_string());
    }
    Ok((column.to_string(), operator, parts.next().map(str::to_string)))
}

/// Sort spec `COLUMN[:asc|desc]`. A suffix that is not a direction is part
/// of the column name.
pub fn parse_sort_spec(raw: &str) -> Result<(String, SortDirection), String> {
    let (column, direction) = raw
        .rsplit_once(':')
        .and_then(|(column, dir)| {
            let direction = match dir.trim().to_ascii_lowercase().as_str() {
                "asc" | "ascending" => SortDirection::Asc,
                "desc" | "descending" => SortDirection::Desc,
                _ => return None,
            };
            Some((column, direction))
        })
        .unwrap_or((raw, SortDirection::Asc));
    if column.trim().is_empty() {
        return Err("sort column must not be empty".to_string());
    }
    Ok((column.trim().to_string(), direction))
}

/// Everything a command needs: the opened store and the acting user.
pub struct CliContext {
    pub store: CellStore,
    pub user: UserContext,
    pub settings: AppSettings,
}

impl CliContext {
    pub fn open(cli: &Cli, mut settings: AppSettings) -> DbResult<Self> {
        if let Some(db) = &cli.db {
            settings.database_path = Some(db.clone());
        }
        let store = CellStore::open(settings.resolved_database_path())?;
        let user = cli
            .user
            .clone()
            .map(UserContext::new)
            .unwrap_or_else(UserContext::current_os_user);
        Ok(Self {
            store,
            user,
            settings,
        })
    }

    /// Fresh connection plus the ownership check for `table_id`.
    pub fn authorize(&self, table_id: &str) -> DbResult<(Connection, TableInfo)> {
        let conn = self.store.connect()?;
        let table = DbReader::require_table_access(&conn, table_id, &self.user)?;
        Ok((conn, table))
    }
}

pub async fn run(cli: Cli, settings: AppSettings) -> DbResult<()> {
    let ctx = CliContext::open(&cli, settings)?;
    match cli.command {
        Commands::CreateTable {
            name,
            columns,
            rows,
        } => tables::create_table(&ctx, &name, columns, rows),
        Commands::ListTables => tables::list_tables(&ctx),
        Commands::DropTable { table } => tables::drop_table(&ctx, &table),
        Commands::AddColumn {
            table,
            name,
            data_type,
        } => tables::add_column(&ctx, &table, &name, data_type),
        Commands::DropColumn { table, column } => tables::drop_column(&ctx, &table, &column),
        Commands::AddRow { table, values } => tables::add_row(&ctx, &table, &values),
        Commands::RenameTable { table, name } => tables::rename_table(&ctx, &table, &name),
        Commands::RenameColumn {
            table,
            column,
            name,
        } => tables::rename_column(&ctx, &table, &column, &name),
        Commands::ReorderColumns { table, columns } => {
            tables::reorder_columns(&ctx, &table, &columns)
        }
        Commands::DropRow { table, row_id } => tables::drop_row(&ctx, &table, row_id),
        Commands::SetCell {
            table,
            row_id,
            column,
            value,
        } => tables::set_cell(&ctx, &table, row_id, &column, value.as_deref()),
        Commands::Page(args) => query::page(&ctx, args).await,
        Commands::BulkInsert {
            table,
            count,
            seed,
            timeout,
        } => query::bulk_insert(&ctx, &table, count, seed, timeout).await,
        Commands::SaveView(args) => views::save_view(&ctx, args),
        Commands::ListViews { table } => views::list_views(&ctx, &table),
        Commands::DropView { table, name } => views::drop_view(&ctx, &table, &name),
        Commands::Validate { table } => maintenance::validate(&ctx, &table),
        Commands::Checkpoint => maintenance::checkpoint(&ctx),
        Commands::Settings { save } => maintenance::settings(&ctx, save),
    }
}
