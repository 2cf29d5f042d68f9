// src/sheets/bulk/mod.rs
// Bulk insert pipeline: synthetic rows and their cells, committed in
// independent, sequential batches with fail-fast partial reporting.

pub mod generator;

pub use generator::ValueGenerator;

use crate::sheets::database::checkpoint::checkpoint_database_file;
use crate::sheets::database::writer::NewCell;
use crate::sheets::database::{Cancellation, CellStore, DbError, DbReader, DbResult, DbWriter};
use crate::sheets::definitions::ColumnDefinition;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkInsertConfig {
    /// Largest `count` accepted by a single request.
    pub max_rows: usize,
    /// Rows per transaction.
    pub row_batch_size: usize,
    /// Cells buffered before they are written.
    pub cell_flush_size: usize,
}

impl Default for BulkInsertConfig {
    fn default() -> Self {
        Self {
            max_rows: 100_000,
            row_batch_size: 9_500,
            cell_flush_size: 12_500,
        }
    }
}

impl BulkInsertConfig {
    fn validate(&self) -> DbResult<()> {
        if self.row_batch_size == 0 || self.cell_flush_size == 0 {
            return Err(DbError::Validation(
                "bulk batch sizes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkInsertReport {
    pub inserted: usize,
    pub requested: usize,
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub batches_committed: usize,
    pub duration_ms: u64,
    pub rows_per_second: f64,
}

/// Write one batch of `rows` rows and their cells in a single transaction.
pub fn insert_batch(
    conn: &mut Connection,
    table_id: &str,
    columns: &[ColumnDefinition],
    rows: usize,
    cell_flush_size: usize,
    generator: &mut ValueGenerator,
    cancel: &Cancellation,
) -> DbResult<usize> {
    let tx = conn.transaction()?;
    let records = DbWriter::insert_rows(&tx, table_id, rows)?;

    let mut buffer: Vec<NewCell<'_>> = Vec::with_capacity(cell_flush_size);
    for row in &records {
        for column in columns {
            buffer.push(NewCell {
                row_id: row.id,
                column_id: column.id.as_str(),
                value: Some(generator.value_for(column.data_type, &column.name)),
            });
        }
        if buffer.len() >= cell_flush_size {
            cancel.check()?;
            DbWriter::insert_cells(&tx, &buffer)?;
            buffer.clear();
        }
    }
    if !buffer.is_empty() {
        DbWriter::insert_cells(&tx, &buffer)?;
    }

    cancel.check()?;
    tx.commit()?;
    Ok(records.len())
}

pub struct BulkInserter {
    store: CellStore,
    config: BulkInsertConfig,
    seed: Option<u64>,
}

impl BulkInserter {
    pub fn new(store: CellStore, config: BulkInsertConfig) -> Self {
        Self {
            store,
            config,
            seed: None,
        }
    }

    /// Make generated values reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Append `count` synthetic rows to `table_id`.
    ///
    /// Request validation and catalog loading fail with an error. Once
    /// batches start, any failure stops the pipeline and is reported in the
    /// result; batches committed before it stay durable.
    pub async fn bulk_insert(
        &self,
        table_id: &str,
        count: usize,
        cancel: &Cancellation,
    ) -> DbResult<BulkInsertReport> {
        self.config.validate()?;
        if count > self.config.max_rows {
            return Err(DbError::Validation(format!(
                "count must be at most {}, got {}",
                self.config.max_rows, count
            )));
        }
        if count == 0 {
            return Ok(BulkInsertReport::default());
        }

        let started = Instant::now();
        let owned_table_id = table_id.to_string();
        let columns = self
            .store
            .run_blocking(cancel, move |conn| {
                if !DbReader::table_exists(conn, &owned_table_id)? {
                    return Err(DbError::TableNotFound(owned_table_id));
                }
                DbReader::read_columns(conn, &owned_table_id)
            })
            .await?;
        let columns = Arc::new(columns);

        let mut report = BulkInsertReport {
            requested: count,
            ..Default::default()
        };
        let batch_size = self.config.row_batch_size;
        let total_batches = count.div_ceil(batch_size);

        for batch_index in 0..total_batches {
            let rows = batch_size.min(count - report.inserted);
            let batch_started = Instant::now();
            let outcome = self.run_batch(table_id, &columns, rows, batch_index, cancel).await;
            match outcome {
                Ok(written) => {
                    report.inserted += written;
                    report.batches_committed += 1;
                    tracing::debug!(
                        "Bulk batch {}/{} for table {}: {} rows in {:?}",
                        batch_index + 1,
                        total_batches,
                        table_id,
                        written,
                        batch_started.elapsed()
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Bulk batch {}/{} for table {} failed, stopping: {}",
                        batch_index + 1,
                        total_batches,
                        table_id,
                        e
                    );
                    report.failed = true;
                    report.error = Some(e.to_string());
                    break;
                }
            }
        }

        if report.inserted > 0 {
            self.checkpoint().await;
        }

        let elapsed = started.elapsed();
        report.duration_ms = elapsed.as_millis() as u64;
        let secs = elapsed.as_secs_f64();
        report.rows_per_second = if secs > 0.0 {
            report.inserted as f64 / secs
        } else {
            0.0
        };

        tracing::info!(
            "Bulk insert into {}: {}/{} rows, {} columns, {} batches, {:.0} rows/s{}",
            table_id,
            report.inserted,
            report.requested,
            columns.len(),
            report.batches_committed,
            report.rows_per_second,
            if report.failed { " (stopped on failure)" } else { "" }
        );
        Ok(report)
    }

    async fn run_batch(
        &self,
        table_id: &str,
        columns: &Arc<Vec<ColumnDefinition>>,
        rows: usize,
        batch_index: usize,
        cancel: &Cancellation,
    ) -> DbResult<usize> {
        let table_id = table_id.to_string();
        let columns = Arc::clone(columns);
        let flush = self.config.cell_flush_size;
        let seed = self.seed;
        let batch_cancel = cancel.clone();
        self.store
            .run_blocking(cancel, move |conn| {
                let mut generator = ValueGenerator::for_batch(seed, batch_index);
                insert_batch(
                    conn,
                    &table_id,
                    &columns,
                    rows,
                    flush,
                    &mut generator,
                    &batch_cancel,
                )
            })
            .await
    }

    async fn checkpoint(&self) {
        let path = self.store.path().to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || checkpoint_database_file(&path)).await;
        match outcome {
            Ok(Ok(Some(stats))) => tracing::debug!("Post-bulk checkpoint: {:?}", stats),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => tracing::warn!("Post-bulk checkpoint failed: {}", e),
            Err(e) => tracing::warn!("Post-bulk checkpoint task failed: {}", e),
        }
    }
}
