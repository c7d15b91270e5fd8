//! Span entity
//!
//! One recorded unit of work. Spans sharing a [`TraceId`] form a forest;
//! `parent_id == None` marks a root. Depth is never stored, see
//! [`super::tree::order_trace`].

use crate::core::error::DomainError;
use crate::core::ids::{SpanId, TenantId, TraceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action recorded when a user message enters the engine.
pub const USER_MESSAGE_ACTION: &str = "chat.user_message";
/// Action of the summary span written when a chat run finishes.
pub const ASSISTANT_MESSAGE_ACTION: &str = "chat.assistant_message";
/// Prefix shared by every tool call span.
pub const TOOL_ACTION_PREFIX: &str = "tool.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "error" => Ok(Severity::Error),
            other => Err(DomainError::UnknownSeverity(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub id: SpanId,
    pub trace_id: TraceId,
    pub parent_id: Option<SpanId>,
    pub tenant_id: TenantId,
    /// Namespaced action, e.g. `tool.inventory.adjust` or `chat.user_message`
    pub action: String,
    pub severity: Severity,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
    pub details: Value,
    pub error_message: Option<String>,
}

impl Span {
    /// Start a fresh root span stamped with the current time.
    pub fn new(trace_id: TraceId, tenant_id: TenantId, action: impl Into<String>) -> Self {
        Self {
            id: SpanId::generate(),
            trace_id,
            parent_id: None,
            tenant_id,
            action: action.into(),
            severity: Severity::Info,
            duration_ms: 0,
            created_at: Utc::now(),
            details: Value::Null,
            error_message: None,
        }
    }

    pub fn with_parent(mut self, parent: Option<SpanId>) -> Self {
        self.parent_id = parent;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Mark the span as failed.
    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.severity = Severity::Error;
        self.error_message = Some(message.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_tool_call(&self) -> bool {
        self.action.starts_with(TOOL_ACTION_PREFIX)
    }
}

/// A span positioned in its trace tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanNode {
    #[serde(flatten)]
    pub span: Span,
    /// Hops from the root (root = 0)
    pub depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_span_is_info_root() {
        let span = Span::new(TraceId::new("t1"), TenantId::new("s1"), "tool.orders");
        assert!(span.parent_id.is_none());
        assert!(!span.is_error());
        assert!(span.is_tool_call());
    }

    #[test]
    fn test_failed_sets_severity_and_message() {
        let span = Span::new(TraceId::new("t1"), TenantId::new("s1"), USER_MESSAGE_ACTION)
            .failed("boom");
        assert!(span.is_error());
        assert_eq!(span.error_message.as_deref(), Some("boom"));
        assert!(!span.is_tool_call());
    }

    #[test]
    fn test_severity_roundtrip_str() {
        assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!(Severity::Info.to_string(), "info");
        assert!("warn".parse::<Severity>().is_err());
    }

    #[test]
    fn test_span_node_flattens_span_fields() {
        let span = Span::new(TraceId::new("t1"), TenantId::new("s1"), "tool.x");
        let node = SpanNode { span, depth: 2 };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["depth"], 2);
        assert_eq!(value["action"], "tool.x");
        assert_eq!(value["trace_id"], "t1");
    }
}
