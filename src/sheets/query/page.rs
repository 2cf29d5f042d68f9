// src/sheets/query/page.rs
// Page query engine: one filtered, sorted, offset-paginated window of rows
// with their cells, plus the first-page filtered count and search matches.

use super::condition::{Condition, OrderExpression, SqlFragment};
use super::search::find_matches;
use super::{compile_filters, compile_sort, ColumnCatalog, Page, PageCell, PageItem, PageRequest};
use crate::sheets::database::reader::DbReader;
use crate::sheets::database::schema::ROWS;
use crate::sheets::database::{Cancellation, CellStore, DbError, DbResult};
use crate::sheets::definitions::{CellRecord, RowRecord};
use rusqlite::{params_from_iter, Connection};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

const ROW_ALIAS: &str = "r";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 2500,
            max_limit: 5000,
        }
    }
}

impl PageLimits {
    /// Apply the default and reject anything outside `1..=max_limit`.
    pub fn resolve(&self, requested: Option<u32>) -> DbResult<u32> {
        let limit = requested.unwrap_or(self.default_limit);
        if limit == 0 || limit > self.max_limit {
            return Err(DbError::Validation(format!(
                "limit must be between 1 and {}, got {}",
                self.max_limit, limit
            )));
        }
        Ok(limit)
    }
}

/// A request lowered against its table's column catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub condition: Condition,
    pub order: OrderExpression,
    /// At least one filter survived column resolution.
    pub has_filters: bool,
}

impl CompiledQuery {
    pub fn compile(request: &PageRequest, catalog: &ColumnCatalog) -> Self {
        let filters = compile_filters(&request.filters, catalog);
        let has_filters = !filters.is_empty();
        let condition = Condition::all(
            std::iter::once(Condition::InTable(request.table_id.clone())).chain(filters),
        );
        Self {
            condition,
            order: compile_sort(&request.sorting, catalog),
            has_filters,
        }
    }
}

/// Row ids and positions of `limit` matching rows starting at `offset`,
/// in the compiled order
pub fn select_row_window(
    conn: &Connection,
    query: &CompiledQuery,
    limit: u64,
    offset: u64,
) -> DbResult<Vec<RowRecord>> {
    let (joins, order_by) = query.order.render(ROW_ALIAS);
    let mut sql = SqlFragment::new();
    sql.push_sql(&format!(
        "SELECT {r}.id, {r}.position FROM {rows} {r}",
        r = ROW_ALIAS,
        rows = ROWS
    ))
    .append(joins);
    sql.push_sql(" WHERE ")
        .append(query.condition.render(ROW_ALIAS));
    sql.push_sql(&format!(" ORDER BY {} LIMIT ? OFFSET ?", order_by))
        .push_param(to_sql_int(limit)?)
        .push_param(to_sql_int(offset)?);

    let mut stmt = conn.prepare(&sql.sql)?;
    let rows = stmt
        .query_map(params_from_iter(sql.params.iter()), |row| {
            Ok(RowRecord {
                id: row.get(0)?,
                position: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::from_interruptible)?;
    Ok(rows)
}

/// Number of rows satisfying `condition`
pub fn count_matching_rows(conn: &Connection, condition: &Condition) -> DbResult<u64> {
    let mut sql = SqlFragment::new();
    sql.push_sql(&format!(
        "SELECT COUNT(*) FROM {rows} {r} WHERE ",
        rows = ROWS,
        r = ROW_ALIAS
    ))
    .append(condition.render(ROW_ALIAS));
    let count: i64 = conn
        .query_row(&sql.sql, params_from_iter(sql.params.iter()), |row| row.get(0))
        .map_err(DbError::from_interruptible)?;
    Ok(count.max(0) as u64)
}

/// Group cells under their rows, keeping row order and dropping hidden columns
pub fn assemble_items(
    rows: &[RowRecord],
    cells: Vec<CellRecord>,
    hidden_columns: &HashSet<&str>,
) -> Vec<PageItem> {
    let mut by_row: HashMap<i64, Vec<PageCell>> = HashMap::with_capacity(rows.len());
    for cell in cells {
        if hidden_columns.contains(cell.column_id.as_str()) {
            continue;
        }
        by_row.entry(cell.row_id).or_default().push(PageCell {
            cell_id: cell.id,
            column_id: cell.column_id,
            value: cell.value,
        });
    }
    rows.iter()
        .map(|row| PageItem {
            row_id: row.id,
            position: row.position,
            cells: by_row.remove(&row.id).unwrap_or_default(),
        })
        .collect()
}

fn to_sql_int(value: u64) -> DbResult<i64> {
    i64::try_from(value).map_err(|_| DbError::Validation(format!("{} is out of range", value)))
}

/// Serves `PageRequest`s against a cell store.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: CellStore,
    limits: PageLimits,
}

impl QueryEngine {
    pub fn new(store: CellStore, limits: PageLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    /// Fetch one page. Table existence and ownership are the caller's
    /// concern: an unknown table id yields an empty page.
    pub async fn fetch_page(&self, request: &PageRequest, cancel: &Cancellation) -> DbResult<Page> {
        let started = Instant::now();
        let limit = self.limits.resolve(request.limit)?;
        let cursor = request.cursor.unwrap_or(0);
        to_sql_int(cursor)?;
        cancel.check()?;

        let search_term = request.effective_search_term().map(str::to_string);
        let needs_catalog = !request.filters.is_empty()
            || !request.sorting.is_empty()
            || !request.hidden_columns.is_empty()
            || search_term.is_some();
        let catalog = if needs_catalog {
            let table_id = request.table_id.clone();
            let columns = self
                .store
                .run_blocking(cancel, move |conn| DbReader::read_columns(conn, &table_id))
                .await?;
            ColumnCatalog::new(columns)
        } else {
            ColumnCatalog::default()
        };

        let query = CompiledQuery::compile(request, &catalog);
        let want_count = query.has_filters && cursor == 0;

        let rows_query = query.clone();
        let rows_fut = self.store.run_blocking(cancel, move |conn| {
            select_row_window(conn, &rows_query, u64::from(limit) + 1, cursor)
        });
        let count_condition = query.condition.clone();
        let count_fut = async {
            if want_count {
                self.store
                    .run_blocking(cancel, move |conn| count_matching_rows(conn, &count_condition))
                    .await
                    .map(Some)
            } else {
                Ok(None)
            }
        };
        let (mut rows, total_filtered_count) = tokio::try_join!(rows_fut, count_fut)?;

        let has_more = rows.len() > limit as usize;
        rows.truncate(limit as usize);
        let next_cursor = has_more.then(|| cursor + u64::from(limit));

        let cells = if rows.is_empty() {
            Vec::new()
        } else {
            let row_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
            self.store
                .run_blocking(cancel, move |conn| DbReader::cells_for_rows(conn, &row_ids))
                .await?
        };

        let hidden: HashSet<&str> = request.hidden_columns.iter().map(String::as_str).collect();
        let items = assemble_items(&rows, cells, &hidden);

        let search_matches = match &search_term {
            Some(term) => {
                let visible: Vec<_> = catalog
                    .columns()
                    .iter()
                    .filter(|c| !hidden.contains(c.id.as_str()))
                    .cloned()
                    .collect();
                find_matches(term, &visible, &items, cursor)
            }
            None => Vec::new(),
        };

        tracing::debug!(
            "Page of table {}: {} rows at cursor {} ({} cell predicates, count={:?}, {} search matches) in {:?}",
            request.table_id,
            items.len(),
            cursor,
            query.condition.cell_predicate_count(),
            total_filtered_count,
            search_matches.len(),
            started.elapsed()
        );

        Ok(Page {
            items,
            search_matches,
            total_filtered_count,
            next_cursor,
        })
    }
}
