// src/cli/maintenance.rs
// Integrity, checkpoint and settings commands

use super::CliContext;
use crate::settings::io::save_settings_to_file;
use crate::sheets::database::checkpoint::checkpoint_database;
use crate::sheets::database::validation::validate_cell_fanout;
use crate::sheets::{DbError, DbResult};

pub fn validate(ctx: &CliContext, table_id: &str) -> DbResult<()> {
    let (conn, _) = ctx.authorize(table_id)?;
    let result = validate_cell_fanout(&conn, table_id)?;
    println!("{}", result.summary());
    if result.is_valid() {
        Ok(())
    } else {
        Err(DbError::Other(format!("table {} failed validation", table_id)))
    }
}

pub fn checkpoint(ctx: &CliContext) -> DbResult<()> {
    let conn = ctx.store.connect()?;
    let stats = checkpoint_database(&conn)?;
    println!(
        "Checkpoint of {}: busy={} wal_pages={} checkpointed={}",
        ctx.store.path().display(),
        stats.busy,
        stats.wal_pages,
        stats.checkpointed_pages
    );
    Ok(())
}

pub fn settings(ctx: &CliContext, save: bool) -> DbResult<()> {
    println!("{}", serde_json::to_string_pretty(&ctx.settings)?);
    println!("database: {}", ctx.store.path().display());
    if save {
        save_settings_to_file(&ctx.settings)?;
    }
    Ok(())
}
