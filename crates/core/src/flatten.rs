//! Hierarchy flattener: run model → flat span list with resolved depth,
//! worker and absolute times.

use std::collections::HashSet;
use std::sync::Arc;

use rf_timeline_protocol::SpanId;

use crate::model::{NodeKind, RunModel, RunNode, Span, SpanKind, SpanSet, Status, WorkerId};

/// Flatten a run model in depth-first pre-order.
///
/// Never fails: malformed start times become zero-duration spans at the
/// dataset start, inverted ranges are clamped, and missing or duplicate ids
/// are replaced by path-derived ones.
pub fn flatten(model: &RunModel) -> SpanSet {
    let dataset_start = earliest_start(&model.suites).unwrap_or(0.0);
    let mut walker = Walker {
        spans: Vec::with_capacity(model.node_count()),
        used_ids: HashSet::new(),
        dataset_start,
    };
    for (i, node) in model.suites.iter().enumerate() {
        walker.visit(node, None, i);
    }

    let spans = walker.spans;
    if spans.is_empty() {
        return SpanSet::new(spans, 0.0, 0.0);
    }
    let min_time = spans.iter().map(|s| s.start).fold(f64::INFINITY, f64::min);
    let max_time = spans
        .iter()
        .map(|s| s.end.unwrap_or(s.start))
        .fold(f64::NEG_INFINITY, f64::max);
    tracing::debug!(spans = spans.len(), min_time, max_time, "flattened run model");
    SpanSet::new(spans, min_time, max_time)
}

fn earliest_start(nodes: &[RunNode]) -> Option<f64> {
    let mut min: Option<f64> = None;
    let mut stack: Vec<&RunNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        if let Some(t) = node.start_time.filter(|t| t.is_finite()) {
            min = Some(min.map_or(t, |m| m.min(t)));
        }
        stack.extend(node.child_nodes());
    }
    min
}

struct Walker {
    spans: Vec<Span>,
    used_ids: HashSet<SpanId>,
    dataset_start: f64,
}

/// Context a child inherits from the span it was reached through.
struct ParentCtx<'a> {
    span_id: &'a SpanId,
    kind: SpanKind,
    depth: u32,
    worker: &'a WorkerId,
}

impl Walker {
    fn visit(&mut self, node: &RunNode, parent: Option<&ParentCtx<'_>>, index: usize) {
        let kind = infer_kind(node, parent.map(|p| p.kind));
        let id = self.resolve_id(node, parent.map(|p| p.span_id), index);
        let (start, end) = self.resolve_times(node, &id);
        let worker: WorkerId = match node.worker.as_deref().map(str::trim) {
            Some(w) if !w.is_empty() => Some(Arc::from(w)),
            _ => parent.and_then(|p| p.worker.clone()),
        };
        let depth = parent.map_or(0, |p| p.depth + 1);

        self.spans.push(Span {
            id: id.clone(),
            name: Arc::from(display_name(node, kind)),
            kind,
            status: Status::parse(node.status.as_deref()),
            start,
            end,
            parent: parent.map(|p| p.span_id.clone()),
            worker: worker.clone(),
            depth,
        });

        let ctx = ParentCtx {
            span_id: &id,
            kind,
            depth,
            worker: &worker,
        };
        for (i, child) in node.child_nodes().enumerate() {
            self.visit(child, Some(&ctx), i);
        }
    }

    fn resolve_id(&mut self, node: &RunNode, parent: Option<&SpanId>, index: usize) -> SpanId {
        if let Some(declared) = node.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let id = SpanId::from(declared);
            if self.used_ids.insert(id.clone()) {
                return id;
            }
            tracing::debug!(id = declared, "duplicate node id, synthesizing a path id");
        }

        let base = match parent {
            Some(p) => format!("{p}/{index}"),
            None => format!("r{index}"),
        };
        let mut candidate = SpanId::from(base.as_str());
        let mut n = 1;
        while !self.used_ids.insert(candidate.clone()) {
            candidate = SpanId::from(format!("{base}~{n}"));
            n += 1;
        }
        candidate
    }

    fn resolve_times(&self, node: &RunNode, id: &SpanId) -> (f64, Option<f64>) {
        let Some(start) = node.start_time.filter(|t| t.is_finite()) else {
            tracing::debug!(%id, "malformed start time, defaulting to dataset start");
            return (self.dataset_start, Some(self.dataset_start));
        };
        match node.end_time {
            None => (start, None),
            Some(end) if !end.is_finite() => {
                tracing::debug!(%id, "malformed end time, treating span as zero-duration");
                (start, Some(start))
            }
            Some(end) if end < start => {
                tracing::debug!(%id, start, end, "end before start, clamping");
                (start, Some(start))
            }
            Some(end) => (start, Some(end)),
        }
    }
}

fn infer_kind(node: &RunNode, parent: Option<SpanKind>) -> SpanKind {
    if let Some(kind) = node.kind {
        return match kind {
            NodeKind::Suite => SpanKind::Suite,
            NodeKind::Test => SpanKind::Test,
            NodeKind::Keyword => SpanKind::Keyword,
            NodeKind::Generic => SpanKind::Generic,
        };
    }
    if !node.keywords.is_empty() {
        return SpanKind::Test;
    }
    match parent {
        None => SpanKind::Suite,
        Some(SpanKind::Suite) if !node.children.is_empty() => SpanKind::Suite,
        Some(SpanKind::Suite) => SpanKind::Test,
        Some(SpanKind::Test | SpanKind::Keyword) => SpanKind::Keyword,
        Some(SpanKind::Generic) => SpanKind::Generic,
    }
}

fn display_name(node: &RunNode, kind: SpanKind) -> String {
    let name = node.name.trim();
    if !name.is_empty() {
        return name.to_string();
    }
    match kind {
        SpanKind::Suite => "(unnamed suite)".into(),
        SpanKind::Test => "(unnamed test)".into(),
        SpanKind::Keyword => node
            .keyword_type
            .clone()
            .unwrap_or_else(|| "(unnamed keyword)".into()),
        SpanKind::Generic => "(unnamed span)".into(),
    }
}
