//! Tool Dispatcher
//!
//! Routes a [`ToolCallRequest`] to the handler registered under its exact
//! name and records one span per call, success or failure.
//!
//! The dispatcher never returns an error and never lets a panic escape:
//! unknown names, handler failures and handler panics all come back as
//! [`ToolResult::Failure`].

use crate::config::DispatchMode;
use crate::use_cases::trace_recorder::TraceRecorder;
use futures::stream::{self, Stream, StreamExt};
use futures::FutureExt;
use relay_domain::{Span, ToolCallRequest, ToolHandler, ToolResult};
use serde_json::json;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct ToolDispatcher {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    recorder: Arc<TraceRecorder>,
}

impl ToolDispatcher {
    pub fn new(recorder: Arc<TraceRecorder>) -> Self {
        Self {
            handlers: HashMap::new(),
            recorder,
        }
    }

    /// Register a handler under its own name, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.name().to_string();
        if self.handlers.insert(name.clone(), handler).is_some() {
            warn!(tool = %name, "Replacing previously registered tool handler");
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered tool names, sorted.
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run one tool call and record its span.
    pub async fn execute(&self, request: &ToolCallRequest) -> ToolResult {
        let started = Instant::now();
        let result = self.invoke(request).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        debug!(
            tool = %request.name,
            action = request.action().unwrap_or("-"),
            success = result.is_success(),
            duration_ms,
            "Tool call finished"
        );

        let mut span = Span::new(
            request.trace_id.clone(),
            request.tenant_id.clone(),
            request.span_action(),
        )
        .with_parent(request.parent_span_id.clone())
        .with_duration_ms(duration_ms)
        .with_details(json!({
            "arguments": request.arguments,
            "source": request.source,
            "tool_use_id": request.tool_use_id,
            "success": result.is_success(),
        }));
        if let Some(error) = result.error() {
            span = span.failed(error);
        }
        self.recorder.record(span).await;

        result
    }

    /// Run a batch of calls, yielding `(request, result)` in request order.
    ///
    /// In [`DispatchMode::Concurrent`] up to `max_in_flight` calls run at
    /// once; ordering of the yielded results is unaffected.
    pub fn execute_all<'a>(
        &'a self,
        requests: &'a [ToolCallRequest],
        mode: DispatchMode,
    ) -> impl Stream<Item = (&'a ToolCallRequest, ToolResult)> + 'a {
        stream::iter(requests)
            .map(move |request| async move { (request, self.execute(request).await) })
            .buffered(mode.width())
    }

    async fn invoke(&self, request: &ToolCallRequest) -> ToolResult {
        let Some(handler) = self.handlers.get(&request.name) else {
            warn!(tool = %request.name, "Unknown tool requested");
            return ToolResult::unknown_tool(&request.name);
        };

        let arguments = request.handler_arguments();
        let call = handler.execute(&request.tenant_id, request.action(), &arguments);
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(tool = %request.name, panic = %message, "Tool handler panicked");
                ToolResult::failure(format!("Tool '{}' failed: {}", request.name, message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
