// src/cli/query.rs
// Page query and bulk insert commands

use super::views::{resolve_column_id, resolve_filters, resolve_sort};
use super::{parse_filter_spec, parse_sort_spec, CliContext, TimeoutArgs};
use crate::sheets::query::{FilterOperator, SortDirection};
use crate::sheets::{BulkInserter, Cancellation, DbReader, DbResult, PageRequest, QueryEngine};
use clap::Args;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Args, Debug)]
pub struct PageArgs {
    pub table: String,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long)]
    pub cursor: Option<u64>,
    /// COLUMN:OPERATOR[:VALUE]; repeatable
    #[arg(long = "filter", value_parser = parse_filter_spec)]
    pub filters: Vec<(String, FilterOperator, Option<String>)>,
    /// COLUMN[:asc|desc]
    #[arg(long, value_parser = parse_sort_spec)]
    pub sort: Option<(String, SortDirection)>,
    #[arg(long)]
    pub search: Option<String>,
    /// Saved view supplying filters, sort and hidden columns not given here
    #[arg(long)]
    pub view: Option<String>,
    /// Column to leave out of the items; repeatable
    #[arg(long = "hide")]
    pub hidden: Vec<String>,
    #[command(flatten)]
    pub timeout: TimeoutArgs,
}

impl TimeoutArgs {
    pub fn cancellation(&self) -> Cancellation {
        match self.timeout_ms {
            Some(ms) => Cancellation::with_timeout(Duration::from_millis(ms)),
            None => Cancellation::new(),
        }
    }
}

/// Cancel `cancel` on Ctrl-C until the returned handle is aborted.
fn cancel_on_ctrl_c(cancel: &Cancellation) -> JoinHandle<()> {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
    })
}

pub async fn page(ctx: &CliContext, args: PageArgs) -> DbResult<()> {
    let (conn, table) = ctx.authorize(&args.table)?;

    let mut request = PageRequest::for_table(table.id.clone());
    request.limit = args.limit;
    request.cursor = args.cursor;
    request.search_term = args.search.clone();
    request.filters = resolve_filters(&conn, &table.id, &args.filters)?;
    request.sorting = resolve_sort(&conn, &table.id, args.sort.as_ref())?;
    request.hidden_columns = args
        .hidden
        .iter()
        .map(|c| resolve_column_id(&conn, &table.id, c))
        .collect::<DbResult<Vec<_>>>()?;
    if let Some(view_name) = &args.view {
        let view = DbReader::get_view(&conn, &table.id, view_name)?;
        request = request.with_view_defaults(&view);
    }
    drop(conn);

    let engine = QueryEngine::new(ctx.store.clone(), ctx.settings.page_limits());
    let cancel = args.timeout.cancellation();
    let interrupt = cancel_on_ctrl_c(&cancel);
    let page = engine.fetch_page(&request, &cancel).await;
    interrupt.abort();

    println!("{}", serde_json::to_string_pretty(&page?)?);
    Ok(())
}

pub async fn bulk_insert(
    ctx: &CliContext,
    table_id: &str,
    count: usize,
    seed: Option<u64>,
    timeout: TimeoutArgs,
) -> DbResult<()> {
    let (_, table) = ctx.authorize(table_id)?;

    let mut inserter = BulkInserter::new(ctx.store.clone(), ctx.settings.bulk_config());
    if let Some(seed) = seed {
        inserter = inserter.with_seed(seed);
    }
    let cancel = timeout.cancellation();
    let interrupt = cancel_on_ctrl_c(&cancel);
    let report = inserter.bulk_insert(&table.id, count, &cancel).await;
    interrupt.abort();

    println!("{}", serde_json::to_string_pretty(&report?)?);
    Ok(())
}
