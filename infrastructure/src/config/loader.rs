//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

const APP_DIR: &str = "agent-relay";
const PROJECT_FILE: &str = "agent-relay.toml";
const ENV_PREFIX: &str = "AGENT_RELAY_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment: `AGENT_RELAY_<SECTION>__<KEY>`
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./agent-relay.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/agent-relay/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(&global_path));
            }
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/agent-relay/config.toml if set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        let path = PathBuf::from(PROJECT_FILE);
        path.exists().then_some(path)
    }

    /// Config sources in priority order, with whether each one exists.
    pub fn config_sources(config_path: Option<&PathBuf>) -> Vec<(String, bool)> {
        let mut sources = Vec::new();
        if let Some(path) = config_path {
            sources.push((format!("Explicit: {}", path.display()), path.exists()));
        }
        sources.push((
            format!("Project: ./{}", PROJECT_FILE),
            Self::project_config_path().is_some(),
        ));
        if let Some(path) = Self::global_config_path() {
            sources.push((format!("Global:  {}", path.display()), path.exists()));
        }
        sources
    }
}
