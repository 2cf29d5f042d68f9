// src/sheets/mod.rs

// --- Public Interface ---
pub mod bulk;
pub mod column_data_type;
pub mod database;
pub mod definitions;
pub mod query;

pub use bulk::{BulkInsertConfig, BulkInsertReport, BulkInserter};
pub use database::{Cancellation, CellStore, DbError, DbReader, DbResult, DbWriter};
pub use definitions::{ColumnDataType, TableInfo, TableSeed, UserContext, ViewDefinition};
pub use query::{Page, PageLimits, PageRequest, QueryEngine};
