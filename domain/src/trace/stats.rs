//! Aggregate statistics over a window of spans.

use super::span::Span;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStats {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Distinct trace ids among the spans
    pub total_traces: usize,
    pub total_spans: usize,
    /// Spans whose action is namespaced `tool.*`
    pub tool_calls: usize,
    /// Error-severity spans
    pub errors: usize,
    pub avg_duration_ms: f64,
    pub by_action: BTreeMap<String, usize>,
}

impl TraceStats {
    pub fn empty(window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Self {
        Self {
            window_start,
            window_end,
            total_traces: 0,
            total_spans: 0,
            tool_calls: 0,
            errors: 0,
            avg_duration_ms: 0.0,
            by_action: BTreeMap::new(),
        }
    }

    /// Aggregate the given spans. Callers pass spans already restricted to
    /// one tenant and window; the bounds are only carried through.
    pub fn from_spans(
        spans: &[Span],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Self {
        let mut stats = Self::empty(window_start, window_end);
        if spans.is_empty() {
            return stats;
        }

        let mut traces = HashSet::new();
        let mut total_duration: u128 = 0;
        for span in spans {
            traces.insert(&span.trace_id);
            total_duration += u128::from(span.duration_ms);
            if span.is_tool_call() {
                stats.tool_calls += 1;
            }
            if span.is_error() {
                stats.errors += 1;
            }
            *stats.by_action.entry(span.action.clone()).or_insert(0) += 1;
        }

        stats.total_traces = traces.len();
        stats.total_spans = spans.len();
        stats.avg_duration_ms = total_duration as f64 / spans.len() as f64;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{TenantId, TraceId};

    fn span(trace: &str, action: &str, duration_ms: u64) -> Span {
        Span::new(TraceId::new(trace), TenantId::new("s"), action).with_duration_ms(duration_ms)
    }

    #[test]
    fn test_empty_window() {
        let now = Utc::now();
        let stats = TraceStats::from_spans(&[], now, now);
        assert_eq!(stats.total_spans, 0);
        assert_eq!(stats.avg_duration_ms, 0.0);
    }

    #[test]
    fn test_aggregates() {
        let now = Utc::now();
        let spans = vec![
            span("t1", "chat.user_message", 0),
            span("t1", "tool.inventory.summary", 10),
            span("t1", "tool.customers.find", 30).failed("not found"),
            span("t2", "chat.user_message", 0),
            span("t2", "tool.inventory.summary", 20),
        ];
        let stats = TraceStats::from_spans(&spans, now, now);
        assert_eq!(stats.total_traces, 2);
        assert_eq!(stats.total_spans, 5);
        assert_eq!(stats.tool_calls, 3);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.avg_duration_ms, 12.0);
        assert_eq!(stats.by_action["tool.inventory.summary"], 2);
        assert_eq!(stats.by_action["chat.user_message"], 2);
        assert_eq!(stats.by_action.len(), 3);
    }
}
