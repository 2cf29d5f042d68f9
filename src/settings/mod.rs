// src/settings/mod.rs
pub mod io;

use crate::sheets::{BulkInsertConfig, PageLimits};
use directories_next::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DB_ENV_VAR: &str = "GRIDSTORE_DB";
pub const LOG_ENV_VAR: &str = "GRIDSTORE_LOG";
const DATA_DIR_NAME: &str = "GridStore";
const DB_FILE_NAME: &str = "gridstore.db";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Cell store file. `None` means `Documents/GridStore/gridstore.db`.
    pub database_path: Option<PathBuf>,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    pub bulk_row_batch_size: usize,
    pub bulk_cell_flush_size: usize,
    pub bulk_max_rows: usize,
    pub log_filter: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let limits = PageLimits::default();
        let bulk = BulkInsertConfig::default();
        Self {
            database_path: None,
            default_page_limit: limits.default_limit,
            max_page_limit: limits.max_limit,
            bulk_row_batch_size: bulk.row_batch_size,
            bulk_cell_flush_size: bulk.cell_flush_size,
            bulk_max_rows: bulk.max_rows,
            log_filter: "info".to_string(),
        }
    }
}

impl AppSettings {
    /// Overlay values taken from the environment (after `.env` is loaded).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup(DB_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(db));
        }
        if let Some(filter) = lookup(LOG_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.log_filter = filter;
        }
    }

    pub fn resolved_database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        let base = UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(|d| d.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join(DATA_DIR_NAME).join(DB_FILE_NAME)
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_limit: self.default_page_limit,
            max_limit: self.max_page_limit,
        }
    }

    pub fn bulk_config(&self) -> BulkInsertConfig {
        BulkInsertConfig {
            max_rows: self.bulk_max_rows,
            row_batch_size: self.bulk_row_batch_size,
            cell_flush_size: self.bulk_cell_flush_size,
        }
    }
}
