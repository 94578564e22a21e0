// Application state module
// Explicit server context shared by every connection

use super::types::Config;
use crate::storage::Storage;

/// Application state
///
/// Built once at startup and handed to each connection behind an `Arc`;
/// handlers never reach for ambient globals to find the storage directory.
pub struct AppState {
    pub config: Config,
    pub storage: Storage,
}

impl AppState {
    /// Create state, making sure the storage directory exists
    pub fn new(config: Config) -> std::io::Result<Self> {
        let storage = Storage::open(&config.storage.dir)?;
        Ok(Self { config, storage })
    }
}
