//! Trace Recorder
//!
//! Persists spans and reads traces back. Recording is best-effort: a span
//! that cannot be written is logged and dropped, never reported to the
//! caller. The read paths are plain aggregations and surface store errors.

use crate::ports::store::{StoreError, TraceStore};
use chrono::{DateTime, Utc};
use relay_domain::{Span, SpanNode, TenantId, TraceId, TraceStats, order_trace};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Trace store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid stats window: {0}")]
    InvalidWindow(String),
}

pub struct TraceRecorder {
    store: Arc<dyn TraceStore>,
}

impl TraceRecorder {
    pub fn new(store: Arc<dyn TraceStore>) -> Self {
        Self { store }
    }

    /// Persist one span. Failures are logged and swallowed.
    pub async fn record(&self, span: Span) {
        match self.store.append(&span).await {
            Ok(()) => debug!(
                trace_id = %span.trace_id,
                action = %span.action,
                severity = %span.severity,
                "Recorded span"
            ),
            Err(e) => warn!(
                trace_id = %span.trace_id,
                action = %span.action,
                error = %e,
                "Failed to record span"
            ),
        }
    }

    /// Every span of the trace, parent before child, with depths.
    pub async fn reconstruct(&self, trace_id: &TraceId) -> Result<Vec<SpanNode>, TraceError> {
        let spans = self.store.by_trace(trace_id).await?;
        Ok(order_trace(spans))
    }

    /// Statistics over the trailing `window` ending now.
    pub async fn stats(
        &self,
        tenant: &TenantId,
        window: Duration,
    ) -> Result<TraceStats, TraceError> {
        let window = chrono::Duration::from_std(window)
            .map_err(|e| TraceError::InvalidWindow(e.to_string()))?;
        let until = Utc::now();
        let since = until
            .checked_sub_signed(window)
            .ok_or_else(|| {
                TraceError::InvalidWindow("window reaches before the epoch".to_string())
            })?;
        self.stats_between(tenant, since, until).await
    }

    pub async fn stats_between(
        &self,
        tenant: &TenantId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<TraceStats, TraceError> {
        if since > until {
            return Err(TraceError::InvalidWindow(format!(
                "start {} is after end {}",
                since, until
            )));
        }
        let spans = self.store.in_window(tenant, since, until).await?;
        Ok(TraceStats::from_spans(&spans, since, until))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::FakeTraceStore;
    use relay_domain::SpanId;

    fn span(trace: &str, id: &str, parent: Option<&str>, action: &str) -> Span {
        let mut span = Span::new(TraceId::new(trace), TenantId::new("s1"), action)
            .with_parent(parent.map(SpanId::new));
        span.id = SpanId::new(id);
        span
    }

    #[tokio::test]
    async fn test_record_then_reconstruct() {
        let store = Arc::new(FakeTraceStore::default());
        let recorder = TraceRecorder::new(store.clone());

        recorder.record(span("t1", "root", None, "chat.user_message")).await;
        recorder.record(span("t1", "a", Some("root"), "tool.inventory")).await;
        recorder.record(span("t1", "b", Some("root"), "tool.customers")).await;
        recorder.record(span("t2", "other", None, "chat.user_message")).await;

        let nodes = recorder.reconstruct(&TraceId::new("t1")).await.unwrap();
        let depths: Vec<usize> = nodes.iter().map(|n| n.depth).collect();
        assert_eq!(depths, vec![0, 1, 1]);
        assert_eq!(nodes[0].span.id.as_str(), "root");
    }

    #[tokio::test]
    async fn test_record_swallows_store_errors() {
        let store = Arc::new(FakeTraceStore::failing());
        let recorder = TraceRecorder::new(store.clone());
        recorder.record(span("t1", "root", None, "chat.user_message")).await;
        assert!(store.spans().is_empty());
    }

    #[tokio::test]
    async fn test_read_errors_surface() {
        let recorder = TraceRecorder::new(Arc::new(FakeTraceStore::failing()));
        assert!(matches!(
            recorder.reconstruct(&TraceId::new("t")).await,
            Err(TraceError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_for_tenant_window() {
        let store = Arc::new(FakeTraceStore::default());
        let recorder = TraceRecorder::new(store.clone());
        recorder.record(span("t1", "root", None, "chat.user_message")).await;
        recorder
            .record(span("t1", "a", Some("root"), "tool.inventory").failed("nope"))
            .await;
        let mut foreign = span("t9", "x", None, "tool.orders");
        foreign.tenant_id = TenantId::new("s2");
        recorder.record(foreign).await;

        let stats = recorder
            .stats(&TenantId::new("s1"), Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(stats.total_spans, 2);
        assert_eq!(stats.total_traces, 1);
        assert_eq!(stats.tool_calls, 1);
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn test_stats_rejects_inverted_window() {
        let recorder = TraceRecorder::new(Arc::new(FakeTraceStore::default()));
        let now = Utc::now();
        let result = recorder
            .stats_between(&TenantId::new("s1"), now, now - chrono::Duration::seconds(1))
            .await;
        assert!(matches!(result, Err(TraceError::InvalidWindow(_))));
    }
}
