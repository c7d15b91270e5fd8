//! Per-request agent configuration snapshot.

use crate::core::ids::{AgentId, TenantId};
use crate::tool::entities::ToolDefinition;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_MAX_TOOL_CALLS: u32 = 10;

/// What the agent is allowed to do with business data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub can_read: bool,
    pub can_write: bool,
    pub can_query: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            can_read: true,
            can_write: true,
            can_query: true,
        }
    }
}

impl Capabilities {
    pub fn read_only() -> Self {
        Self {
            can_read: true,
            can_write: false,
            can_query: true,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.can_read && self.can_write && self.can_query
    }
}

/// How much the agent should say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Concise,
    #[default]
    Normal,
    Detailed,
}

/// Agent configuration, immutable for the duration of one chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub id: AgentId,
    /// Owning tenant; `None` means the agent is shared by every tenant.
    pub tenant_id: Option<TenantId>,
    pub name: String,
    pub system_prompt: String,
    pub model: String,
    pub max_tokens: u32,
    /// Turn budget: the maximum number of model calls per request.
    pub max_tool_calls: u32,
    pub temperature: Option<f32>,
    /// Tool names offered to this agent (empty = all)
    pub enabled_tools: Vec<String>,
    #[serde(flatten)]
    pub capabilities: Capabilities,
    pub tone: Option<String>,
    pub verbosity: Verbosity,
    /// Model credential override for this agent
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: AgentId::new("default"),
            tenant_id: None,
            name: "Assistant".to_string(),
            system_prompt: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
            temperature: None,
            enabled_tools: Vec::new(),
            capabilities: Capabilities::default(),
            tone: None,
            verbosity: Verbosity::default(),
            api_key: None,
        }
    }
}

impl AgentConfig {
    pub fn new(id: impl Into<AgentId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tool_calls(mut self, max: u32) -> Self {
        self.max_tool_calls = max;
        self
    }

    pub fn with_enabled_tools(mut self, tools: Vec<String>) -> Self {
        self.enabled_tools = tools;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn owned_by(mut self, tenant: TenantId) -> Self {
        self.tenant_id = Some(tenant);
        self
    }

    /// Model calls allowed per request. Never less than one.
    pub fn turn_budget(&self) -> u32 {
        self.max_tool_calls.max(1)
    }

    pub fn is_visible_to(&self, tenant: &TenantId) -> bool {
        self.tenant_id.as_ref().is_none_or(|owner| owner == tenant)
    }

    pub fn allows_tool(&self, name: &str) -> bool {
        self.enabled_tools.is_empty() || self.enabled_tools.iter().any(|t| t == name)
    }

    /// Filter a catalog down to the tools this agent may see.
    pub fn filter_tools(&self, tools: &[ToolDefinition]) -> Vec<ToolDefinition> {
        tools
            .iter()
            .filter(|tool| self.allows_tool(&tool.name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_budget_floor() {
        assert_eq!(AgentConfig::default().turn_budget(), 10);
        assert_eq!(AgentConfig::default().with_max_tool_calls(0).turn_budget(), 1);
        assert_eq!(AgentConfig::default().with_max_tool_calls(3).turn_budget(), 3);
    }

    #[test]
    fn test_filter_tools() {
        let tools = vec![
            ToolDefinition::new("inventory", "i"),
            ToolDefinition::new("orders", "o"),
            ToolDefinition::new("customers", "c"),
        ];
        let all = AgentConfig::default().filter_tools(&tools);
        assert_eq!(all.len(), 3);

        let some = AgentConfig::default()
            .with_enabled_tools(vec!["orders".to_string(), "missing".to_string()])
            .filter_tools(&tools);
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].name, "orders");
    }

    #[test]
    fn test_visibility() {
        let shared = AgentConfig::new("a");
        assert!(shared.is_visible_to(&TenantId::new("x")));

        let owned = AgentConfig::new("b").owned_by(TenantId::new("x"));
        assert!(owned.is_visible_to(&TenantId::new("x")));
        assert!(!owned.is_visible_to(&TenantId::new("y")));
    }

    #[test]
    fn test_deserialize_flattened_capabilities() {
        let config: AgentConfig = serde_json::from_value(serde_json::json!({
            "id": "support",
            "can_write": false,
            "max_tool_calls": 4,
            "verbosity": "concise"
        }))
        .unwrap();
        assert_eq!(config.id, AgentId::new("support"));
        assert!(!config.capabilities.can_write);
        assert!(config.capabilities.can_read);
        assert_eq!(config.max_tool_calls, 4);
        assert_eq!(config.verbosity, Verbosity::Concise);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = AgentConfig::new("a");
        config.api_key = Some("sk-secret".to_string());
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("api_key").is_none());
    }
}
