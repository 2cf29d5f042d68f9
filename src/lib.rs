// src/lib.rs
//! Spreadsheet-style tabular data store on an entity-attribute-value cell
//! model: paginated filtered/sorted/searched page queries and a batched
//! bulk row generator, backed by SQLite.

pub mod cli;
pub mod settings;
pub mod sheets;
