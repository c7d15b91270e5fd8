//! `trace_stats`: lets an agent answer questions about recent tool activity.

use async_trait::async_trait;
use relay_application::TraceRecorder;
use relay_domain::{TenantId, ToolDefinition, ToolHandler, ToolResult};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_WINDOW_SECS: u64 = 24 * 60 * 60;
const MAX_WINDOW_SECS: u64 = 90 * 24 * 60 * 60;

pub struct TraceStatsTool {
    recorder: Arc<TraceRecorder>,
}

impl TraceStatsTool {
    pub const NAME: &'static str = "trace_stats";

    pub fn new(recorder: Arc<TraceRecorder>) -> Self {
        Self { recorder }
    }

    /// Catalog row describing this tool.
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            Self::NAME,
            "Summarize recent assistant activity for this store: traces, tool calls, \
             errors and average duration, grouped by action.",
        )
        .with_schema(json!({
            "type": "object",
            "properties": {
                "window_secs": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Trailing window in seconds (default 86400)"
                }
            }
        }))
    }
}

#[async_trait]
impl ToolHandler for TraceStatsTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(
        &self,
        tenant: &TenantId,
        _action: Option<&str>,
        arguments: &Map<String, Value>,
    ) -> ToolResult {
        let window_secs = match arguments.get("window_secs") {
            None | Some(Value::Null) => DEFAULT_WINDOW_SECS,
            Some(value) => match value.as_u64() {
                Some(secs) if secs > 0 => secs.min(MAX_WINDOW_SECS),
                _ => return ToolResult::failure("window_secs must be a positive integer"),
            },
        };

        match self
            .recorder
            .stats(tenant, Duration::from_secs(window_secs))
            .await
        {
            Ok(stats) => match serde_json::to_value(&stats) {
                Ok(data) => ToolResult::success(data),
                Err(e) => ToolResult::failure(e.to_string()),
            },
            Err(e) => ToolResult::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use relay_domain::{Span, TraceId};

    async fn tool_with_spans() -> TraceStatsTool {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(TraceRecorder::new(store));
        let trace = TraceId::new("t1");
        let tenant = TenantId::new("store-1");
        recorder
            .record(Span::new(trace.clone(), tenant.clone(), "tool.inventory.summary"))
            .await;
        recorder
            .record(Span::new(trace.clone(), tenant.clone(), "tool.customers.find").failed("x"))
            .await;
        recorder
            .record(Span::new(trace, TenantId::new("store-2"), "tool.inventory.summary"))
            .await;
        TraceStatsTool::new(recorder)
    }

    #[tokio::test]
    async fn test_stats_for_calling_tenant_only() {
        let tool = tool_with_spans().await;
        let result = tool
            .execute(&TenantId::new("store-1"), None, &Map::new())
            .await;

        let data = result.data().cloned().unwrap();
        assert_eq!(data["total_spans"], json!(2));
        assert_eq!(data["tool_calls"], json!(2));
        assert_eq!(data["errors"], json!(1));
    }

    #[tokio::test]
    async fn test_rejects_bad_window() {
        let tool = tool_with_spans().await;
        let mut args = Map::new();
        args.insert("window_secs".to_string(), json!("soon"));
        let result = tool.execute(&TenantId::new("store-1"), None, &args).await;
        assert!(!result.is_success());
    }

    #[test]
    fn test_definition_is_valid() {
        let definition = TraceStatsTool::definition();
        assert!(definition.validate().is_ok());
        assert!(definition.is_offered());
    }
}
