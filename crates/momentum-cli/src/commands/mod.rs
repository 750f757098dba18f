pub mod auth;
pub mod config;
pub mod habit;
pub mod planner;
pub mod streak;

use momentum_core::{Config, FileKeyValueStore};
use std::sync::Arc;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Key-value store under the configured storage directory.
pub(crate) fn open_storage(config: &Config) -> Result<Arc<FileKeyValueStore>, Box<dyn std::error::Error>> {
    Ok(Arc::new(FileKeyValueStore::new(config.storage_dir()?)))
}

/// Convert 1-based positions as printed by the list commands.
pub(crate) fn to_indices(positions: &[usize]) -> Result<Vec<usize>, Box<dyn std::error::Error>> {
    positions
        .iter()
        .map(|&p| p.checked_sub(1).ok_or_else(|| "positions start at 1".into()))
        .collect()
}
