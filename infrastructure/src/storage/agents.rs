//! Agent configurations loaded from `[[agents]]`.

use async_trait::async_trait;
use relay_application::ports::store::{AgentStore, StoreError};
use relay_domain::{AgentConfig, AgentId};
use std::collections::HashMap;

pub struct ConfiguredAgents {
    agents: HashMap<AgentId, AgentConfig>,
}

impl ConfiguredAgents {
    /// Later entries with a duplicate id replace earlier ones.
    pub fn new(agents: impl IntoIterator<Item = AgentConfig>) -> Self {
        Self {
            agents: agents.into_iter().map(|a| (a.id.clone(), a)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[async_trait]
impl AgentStore for ConfiguredAgents {
    async fn get(&self, id: &AgentId) -> Result<Option<AgentConfig>, StoreError> {
        Ok(self.agents.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_by_id() {
        let agents = ConfiguredAgents::new(vec![
            AgentConfig::new("helper"),
            AgentConfig::new("analyst"),
        ]);
        assert_eq!(agents.len(), 2);
        assert!(agents.get(&AgentId::new("helper")).await.unwrap().is_some());
        assert!(agents.get(&AgentId::new("ghost")).await.unwrap().is_none());
    }
}
