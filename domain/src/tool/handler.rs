//! Tool handler contract
//!
//! A [`ToolHandler`] owns the business logic behind one tool name. The
//! dispatcher looks handlers up by exact name and hands them the server
//! resolved tenant; handlers never read a tenant from their arguments.
//!
//! Handlers report business failures as [`ToolResult::Failure`]. A handler
//! that panics is caught by the dispatcher and turned into a failure too, so
//! a broken handler can never take the conversation down with it.

use crate::core::ids::TenantId;
use crate::tool::value_objects::ToolResult;
use async_trait::async_trait;
use serde_json::{Map, Value};

#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Exact tool name this handler serves.
    fn name(&self) -> &str;

    /// Run the tool for `tenant`.
    ///
    /// `action` is the optional sub-action selector taken from the `action`
    /// argument. `arguments` never contain tenant-identifying keys.
    async fn execute(
        &self,
        tenant: &TenantId,
        action: Option<&str>,
        arguments: &Map<String, Value>,
    ) -> ToolResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn execute(
            &self,
            tenant: &TenantId,
            action: Option<&str>,
            arguments: &Map<String, Value>,
        ) -> ToolResult {
            ToolResult::success(json!({
                "tenant": tenant.as_str(),
                "action": action,
                "args": arguments,
            }))
        }
    }

    #[tokio::test]
    async fn test_handler_is_object_safe() {
        let handler: Box<dyn ToolHandler> = Box::new(Echo);
        let result = handler
            .execute(&TenantId::new("s1"), Some("ping"), &Map::new())
            .await;
        assert_eq!(handler.name(), "echo");
        assert_eq!(result.data().unwrap()["tenant"], json!("s1"));
        assert_eq!(result.data().unwrap()["action"], json!("ping"));
    }
}
