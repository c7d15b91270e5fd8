//! Trace tree reconstruction
//!
//! Turns the flat span rows of one trace into a depth-annotated, preorder
//! listing: every parent precedes its children, siblings appear in creation
//! order (ties keep storage order).
//!
//! Rows from a real store are not guaranteed to form a clean tree. A span
//! whose parent is missing from the trace, or which names itself as parent,
//! is treated as a root. Spans caught in a parent cycle are never visited
//! from a root; the earliest of them is promoted to a root so every input
//! span appears exactly once.

use super::span::{Span, SpanNode};
use crate::core::ids::SpanId;
use std::collections::HashMap;

/// Order the spans of one trace parent-before-child and compute depths.
pub fn order_trace(spans: Vec<Span>) -> Vec<SpanNode> {
    let mut index_of: HashMap<SpanId, usize> = HashMap::with_capacity(spans.len());
    for (idx, span) in spans.iter().enumerate() {
        index_of.entry(span.id.clone()).or_insert(idx);
    }

    let mut roots = Vec::new();
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, span) in spans.iter().enumerate() {
        match span.parent_id.as_ref().and_then(|p| index_of.get(p)) {
            Some(&parent) if parent != idx => children.entry(parent).or_default().push(idx),
            _ => roots.push(idx),
        }
    }

    let by_created = |a: &usize, b: &usize| {
        spans[*a]
            .created_at
            .cmp(&spans[*b].created_at)
            .then(a.cmp(b))
    };
    roots.sort_by(by_created);
    for siblings in children.values_mut() {
        siblings.sort_by(by_created);
    }

    let mut visited = vec![false; spans.len()];
    let mut order: Vec<(usize, usize)> = Vec::with_capacity(spans.len());

    let walk = |start: usize, visited: &mut Vec<bool>, order: &mut Vec<(usize, usize)>| {
        let mut stack = vec![(start, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            order.push((idx, depth));
            if let Some(kids) = children.get(&idx) {
                for &kid in kids.iter().rev() {
                    stack.push((kid, depth + 1));
                }
            }
        }
    };

    for &root in &roots {
        walk(root, &mut visited, &mut order);
    }

    // cycle members
    let mut leftover: Vec<usize> = (0..spans.len()).filter(|i| !visited[*i]).collect();
    leftover.sort_by(by_created);
    for idx in leftover {
        walk(idx, &mut visited, &mut order);
    }

    let mut slots: Vec<Option<Span>> = spans.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|(idx, depth)| slots[idx].take().map(|span| SpanNode { span, depth }))
        .collect()
}
