//! Tool domain entities

use crate::core::error::DomainError;
use crate::core::ids::{SpanId, TenantId, TraceId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Argument keys that could smuggle a tenant into a handler.
///
/// Handlers receive the tenant explicitly; these keys are stripped from the
/// model-supplied arguments before dispatch.
pub const TENANT_ARGUMENT_KEYS: &[&str] = &["tenant_id", "tenantId", "store_id", "storeId"];

/// Who may invoke a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    /// Offered to the conversational agent.
    #[default]
    Agent,
    /// Only callable from application code, never shown to the model.
    CodeOnly,
    /// Kept in the catalog but never offered.
    Disabled,
}

impl ToolMode {
    pub fn as_str(&self) -> &str {
        match self {
            ToolMode::Agent => "agent",
            ToolMode::CodeOnly => "code_only",
            ToolMode::Disabled => "disabled",
        }
    }

    pub fn is_agent_visible(&self) -> bool {
        matches!(self, ToolMode::Agent)
    }
}

impl std::fmt::Display for ToolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ToolMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(ToolMode::Agent),
            "code_only" => Ok(ToolMode::CodeOnly),
            "disabled" => Ok(ToolMode::Disabled),
            other => Err(DomainError::UnknownToolMode(other.to_string())),
        }
    }
}

/// Catalog entry describing a tool the model may call.
///
/// The engine only reads these; catalog maintenance happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "inventory")
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// JSON schema of the tool input
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub mode: ToolMode,
}

fn default_active() -> bool {
    true
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: empty_object_schema(),
            active: true,
            mode: ToolMode::Agent,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn with_mode(mut self, mode: ToolMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether the registry should offer this tool to agents.
    pub fn is_offered(&self) -> bool {
        self.active && self.mode.is_agent_visible()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidToolDefinition(
                "name must not be empty".to_string(),
            ));
        }
        if !self.input_schema.is_object() {
            return Err(DomainError::InvalidToolDefinition(format!(
                "input_schema of '{}' must be a JSON object",
                self.name
            )));
        }
        Ok(())
    }
}

/// A single tool invocation on its way to the dispatcher.
///
/// Built from a model tool-use block (or by application code) and consumed
/// exactly once. Only the span it produces is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Correlates the result with the model's tool-use block.
    pub tool_use_id: String,
    pub name: String,
    /// Arguments exactly as the model produced them.
    pub arguments: Map<String, Value>,
    pub trace_id: TraceId,
    pub parent_span_id: Option<SpanId>,
    /// Always the server-resolved tenant, never read from `arguments`.
    pub tenant_id: TenantId,
    /// Origin tag recorded on the span (e.g. "chat").
    pub source: String,
}

impl ToolCallRequest {
    pub fn new(
        name: impl Into<String>,
        arguments: Map<String, Value>,
        tenant_id: TenantId,
        trace_id: TraceId,
    ) -> Self {
        Self {
            tool_use_id: String::new(),
            name: name.into(),
            arguments,
            trace_id,
            parent_span_id: None,
            tenant_id,
            source: "chat".to_string(),
        }
    }

    pub fn with_tool_use_id(mut self, id: impl Into<String>) -> Self {
        self.tool_use_id = id.into();
        self
    }

    pub fn with_parent(mut self, parent: SpanId) -> Self {
        self.parent_span_id = Some(parent);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// The sub-action selector, when the model passed a string `action`.
    pub fn action(&self) -> Option<&str> {
        self.arguments.get("action").and_then(Value::as_str)
    }

    /// Span action name: `tool.<name>` or `tool.<name>.<action>`.
    pub fn span_action(&self) -> String {
        match self.action() {
            Some(action) => format!("tool.{}.{}", self.name, action),
            None => format!("tool.{}", self.name),
        }
    }

    /// Arguments as the handler sees them: tenant-identifying keys removed.
    pub fn handler_arguments(&self) -> Map<String, Value> {
        self.arguments
            .iter()
            .filter(|(key, _)| !TENANT_ARGUMENT_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_tool_mode_parse() {
        assert_eq!("agent".parse::<ToolMode>().unwrap(), ToolMode::Agent);
        assert_eq!("code_only".parse::<ToolMode>().unwrap(), ToolMode::CodeOnly);
        assert!("bogus".parse::<ToolMode>().is_err());
    }

    #[test]
    fn test_definition_offered_only_when_active_agent_mode() {
        let tool = ToolDefinition::new("inventory", "Inventory lookups");
        assert!(tool.is_offered());
        assert!(!tool.clone().inactive().is_offered());
        assert!(!tool.with_mode(ToolMode::CodeOnly).is_offered());
    }

    #[test]
    fn test_definition_validate() {
        assert!(ToolDefinition::new("orders", "x").validate().is_ok());
        assert!(ToolDefinition::new(" ", "x").validate().is_err());
        assert!(
            ToolDefinition::new("orders", "x")
                .with_schema(json!("nope"))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_definition_deserialize_defaults() {
        let tool: ToolDefinition = serde_json::from_value(json!({
            "name": "customers",
            "description": "Customer search",
            "input_schema": {"type": "object"}
        }))
        .unwrap();
        assert!(tool.active);
        assert_eq!(tool.mode, ToolMode::Agent);
    }

    #[test]
    fn test_span_action_with_and_without_subaction() {
        let trace = TraceId::new("t");
        let plain =
            ToolCallRequest::new("inventory", Map::new(), TenantId::new("s"), trace.clone());
        assert_eq!(plain.span_action(), "tool.inventory");
        assert_eq!(plain.action(), None);

        let with_action = ToolCallRequest::new(
            "inventory",
            args(json!({"action": "check_stock", "sku": "A1"})),
            TenantId::new("s"),
            trace,
        );
        assert_eq!(with_action.span_action(), "tool.inventory.check_stock");
        assert_eq!(with_action.action(), Some("check_stock"));
    }

    #[test]
    fn test_non_string_action_is_ignored() {
        let request = ToolCallRequest::new(
            "orders",
            args(json!({"action": 7})),
            TenantId::new("s"),
            TraceId::new("t"),
        );
        assert_eq!(request.action(), None);
        assert_eq!(request.span_action(), "tool.orders");
    }

    #[test]
    fn test_handler_arguments_strip_tenant_keys() {
        let request = ToolCallRequest::new(
            "customers",
            args(json!({
                "name": "Jane",
                "store_id": "other-store",
                "storeId": "other-store",
                "tenant_id": "x",
                "tenantId": "y"
            })),
            TenantId::new("mine"),
            TraceId::new("t"),
        );
        let visible = request.handler_arguments();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible["name"], json!("Jane"));
        // the original arguments are untouched for span details
        assert_eq!(request.arguments.len(), 5);
    }
}
