//! Conversation loop tuning from TOML (`[registry]`, `[dispatch]`)

use relay_application::DispatchMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegistryConfig {
    /// Seconds a loaded tool catalog stays fresh
    pub ttl_secs: u64,
}

impl Default for FileRegistryConfig {
    fn default() -> Self {
        Self { ttl_secs: 60 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileDispatchMode {
    #[default]
    Sequential,
    Concurrent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    pub mode: FileDispatchMode,
    /// Upper bound of simultaneously running tool calls in concurrent mode
    pub max_in_flight: usize,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        Self {
            mode: FileDispatchMode::Sequential,
            max_in_flight: 4,
        }
    }
}

impl FileDispatchConfig {
    pub fn to_dispatch_mode(&self) -> DispatchMode {
        match self.mode {
            FileDispatchMode::Sequential => DispatchMode::Sequential,
            FileDispatchMode::Concurrent => DispatchMode::Concurrent {
                max_in_flight: self.max_in_flight,
            },
        }
    }
}
