//! Bearer token configuration from TOML (`[[auth.tokens]]`)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuthConfig {
    pub tokens: Vec<FileTokenConfig>,
}

/// One accepted bearer token and what it grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTokenConfig {
    pub token: String,
    pub user_id: String,
    /// Tenant (store) ids this token may act for
    #[serde(default)]
    pub tenants: Vec<String>,
}
