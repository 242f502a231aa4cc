//! SQLite-backed persistence for tasks and categories.

pub mod migrations;
pub mod task_db;

pub use task_db::TaskDb;

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::error::Result;

/// Returns `~/.config/taskvault[-dev]/` based on TASKVAULT_ENV.
///
/// Set TASKVAULT_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TASKVAULT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("taskvault-dev")
    } else {
        base_dir.join("taskvault")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

static SHARED: OnceLock<TaskDb> = OnceLock::new();

/// The process-wide shared store handle.
///
/// Initialized lazily on first call and returned unchanged thereafter; it
/// is never replaced. If two threads race on the first call, one
/// initialization wins and the loser's connection is dropped.
///
/// # Errors
/// Returns an error if the database cannot be opened or migrated.
pub fn shared() -> Result<&'static TaskDb> {
    if let Some(db) = SHARED.get() {
        return Ok(db);
    }
    let db = TaskDb::open()?;
    Ok(SHARED.get_or_init(|| db))
}
