//! Tool Registry
//!
//! Caches the tool catalog with a freshness window. The cache is owned by
//! this object and injected wherever it is needed.
//!
//! Availability wins over freshness: a failed refresh serves the stale
//! catalog, and a failed first load serves an empty one so chat keeps
//! working without tools. Concurrent callers racing past expiry may each
//! refresh; a refresh is idempotent so the race is harmless.

use crate::ports::store::ToolCatalogStore;
use relay_domain::{AgentConfig, ToolDefinition};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

struct CachedCatalog {
    tools: Arc<[ToolDefinition]>,
    loaded_at: Instant,
}

pub struct ToolRegistry {
    store: Arc<dyn ToolCatalogStore>,
    ttl: Duration,
    cache: RwLock<Option<CachedCatalog>>,
}

impl ToolRegistry {
    pub fn new(store: Arc<dyn ToolCatalogStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// The offered tool catalog. Never fails.
    pub async fn load(&self) -> Arc<[ToolDefinition]> {
        if let Some(tools) = self.cached(true) {
            return tools;
        }

        match self.store.active_tools().await {
            Ok(tools) => {
                let tools: Arc<[ToolDefinition]> =
                    tools.into_iter().filter(ToolDefinition::is_offered).collect();
                debug!(count = tools.len(), "Tool registry refreshed");
                *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(CachedCatalog {
                    tools: tools.clone(),
                    loaded_at: Instant::now(),
                });
                tools
            }
            Err(e) => match self.cached(false) {
                Some(stale) => {
                    warn!(error = %e, "Tool registry refresh failed, serving stale catalog");
                    stale
                }
                None => {
                    warn!(error = %e, "Tool registry load failed, continuing without tools");
                    Arc::from(Vec::new())
                }
            },
        }
    }

    /// Filter a catalog to what `config` may use (`enabled_tools`, empty = all).
    pub fn for_agent(config: &AgentConfig, tools: &[ToolDefinition]) -> Vec<ToolDefinition> {
        config.filter_tools(tools)
    }

    /// `load()` followed by [`Self::for_agent`].
    pub async fn tools_for(&self, config: &AgentConfig) -> Vec<ToolDefinition> {
        let tools = self.load().await;
        Self::for_agent(config, &tools)
    }

    /// Drop the cache so the next `load()` hits storage.
    pub fn invalidate(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn cached(&self, fresh_only: bool) -> Option<Arc<[ToolDefinition]>> {
        let guard = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|c| !fresh_only || c.loaded_at.elapsed() < self.ttl)
            .map(|c| c.tools.clone())
    }
}
