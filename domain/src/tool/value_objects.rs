//! Tool domain value objects
//!
//! [`ToolResult`] is the single normalized outcome of every tool call. It is
//! what the model sees, what the client sees, and what decides a span's
//! severity.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one tool call.
///
/// Serialized as `{"success": true, "data": ...}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireToolResult", into = "WireToolResult")]
pub enum ToolResult {
    Success { data: Value },
    Failure { error: String },
}

impl ToolResult {
    pub fn success(data: Value) -> Self {
        ToolResult::Success { data }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ToolResult::Failure {
            error: error.into(),
        }
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::failure(format!("Unknown tool: {}", name))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ToolResult::Failure { error } => Some(error),
            ToolResult::Success { .. } => None,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            ToolResult::Success { data } => Some(data),
            ToolResult::Failure { .. } => None,
        }
    }

    /// The JSON value handed back to the model as tool-result content.
    pub fn to_value(&self) -> Value {
        match self {
            ToolResult::Success { data } => serde_json::json!({ "success": true, "data": data }),
            ToolResult::Failure { error } => {
                serde_json::json!({ "success": false, "error": error })
            }
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct WireToolResult {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<WireToolResult> for ToolResult {
    fn from(wire: WireToolResult) -> Self {
        if wire.success {
            ToolResult::Success {
                data: wire.data.unwrap_or(Value::Null),
            }
        } else {
            ToolResult::Failure {
                error: wire.error.unwrap_or_default(),
            }
        }
    }
}

impl From<ToolResult> for WireToolResult {
    fn from(result: ToolResult) -> Self {
        match result {
            ToolResult::Success { data } => WireToolResult {
                success: true,
                data: Some(data),
                error: None,
            },
            ToolResult::Failure { error } => WireToolResult {
                success: false,
                data: None,
                error: Some(error),
            },
        }
    }
}
