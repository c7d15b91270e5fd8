//! Chat parameters: conversation loop control.
//!
//! [`ChatParams`] groups the static parameters that control
//! [`RunChatUseCase`](crate::use_cases::run_chat::RunChatUseCase) and the
//! components it drives. These are application-layer concerns, not domain
//! policy; per-agent limits live on `AgentConfig`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the tool calls of one turn are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DispatchMode {
    /// One at a time, in request order.
    #[default]
    Sequential,
    /// Up to `max_in_flight` at once. Results are still reported in request
    /// order.
    Concurrent { max_in_flight: usize },
}

impl DispatchMode {
    /// Effective parallelism (at least 1).
    pub fn width(&self) -> usize {
        match self {
            DispatchMode::Sequential => 1,
            DispatchMode::Concurrent { max_in_flight } => (*max_in_flight).max(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatParams {
    /// Freshness window of the tool registry cache.
    pub registry_ttl: Duration,
    pub dispatch_mode: DispatchMode,
    /// Capacity of the per-request event channel.
    pub event_buffer: usize,
    /// Source tag recorded on spans when the request carries none.
    pub default_source: String,
    /// Window used by stats queries that do not specify one.
    pub default_stats_window: Duration,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            registry_ttl: Duration::from_secs(60),
            dispatch_mode: DispatchMode::Sequential,
            event_buffer: 64,
            default_source: "chat".to_string(),
            default_stats_window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl ChatParams {
    // ==================== Builder Methods ====================

    pub fn with_registry_ttl(mut self, ttl: Duration) -> Self {
        self.registry_ttl = ttl;
        self
    }

    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ChatParams::default();
        assert_eq!(params.registry_ttl, Duration::from_secs(60));
        assert_eq!(params.dispatch_mode, DispatchMode::Sequential);
        assert_eq!(params.default_source, "chat");
    }

    #[test]
    fn test_dispatch_width() {
        assert_eq!(DispatchMode::Sequential.width(), 1);
        assert_eq!(DispatchMode::Concurrent { max_in_flight: 4 }.width(), 4);
        assert_eq!(DispatchMode::Concurrent { max_in_flight: 0 }.width(), 1);
    }

    #[test]
    fn test_event_buffer_floor() {
        assert_eq!(ChatParams::default().with_event_buffer(0).event_buffer, 1);
    }
}
