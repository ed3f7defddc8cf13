use serde::{Deserialize, Serialize};

use crate::ids::SpanId;

/// Which view produced a selection.
///
/// Only used to route a selection to the *other* view; it is never stored
/// with the span or the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Timeline,
    Tree,
}

impl std::fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeline => write!(f, "timeline"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// The single event stream shared by the timeline and its consumers.
///
/// Serialized as `{"type":"span-selected","spanId":..,"source":..}` and
/// `{"type":"time-range-selected","start":..,"end":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TimelineEvent {
    #[serde(rename_all = "camelCase")]
    SpanSelected {
        span_id: SpanId,
        source: SelectionSource,
    },
    TimeRangeSelected { start: f64, end: f64 },
}

/// Read-only diagnostic snapshot of an engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugState {
    pub span_count: usize,
    pub worker_count: usize,
    pub lane_count: usize,
    pub open_span_count: usize,
    pub min_time: f64,
    pub max_time: f64,
    pub selected: Option<SpanId>,
}
