//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// Process-local, lost on restart
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub backend: StorageBackend,
    /// SQLite database file (ignored by the memory backend)
    pub path: PathBuf,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: PathBuf::from("agent-relay.db"),
        }
    }
}
