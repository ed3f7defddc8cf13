use std::collections::HashMap;
use std::sync::Arc;

use rf_timeline_protocol::{SpanId, ThemeToken};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Suite,
    Test,
    Keyword,
    Generic,
}

impl SpanKind {
    pub fn tier(self) -> Tier {
        match self {
            Self::Suite => Tier::Suite,
            Self::Test => Tier::Test,
            Self::Keyword | Self::Generic => Tier::Keyword,
        }
    }
}

/// Coarse hierarchy level. Lane numbering restarts per (worker, tier) so
/// suites, tests and keywords never share a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Suite,
    Test,
    Keyword,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Suite, Tier::Test, Tier::Keyword];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pass,
    Fail,
    Skip,
    NotRun,
}

impl Status {
    /// Map a raw status string; unknown or missing values become `NotRun`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("PASS") => Self::Pass,
            Some("FAIL") => Self::Fail,
            Some("SKIP") => Self::Skip,
            Some("NOT_RUN" | "NOT RUN") => Self::NotRun,
            Some(other) => {
                if !other.is_empty() {
                    tracing::debug!(status = other, "unknown status, defaulting to NOT_RUN");
                }
                Self::NotRun
            }
            None => Self::NotRun,
        }
    }

    pub fn theme_token(self) -> ThemeToken {
        match self {
            Self::Pass => ThemeToken::StatusPass,
            Self::Fail => ThemeToken::StatusFail,
            Self::Skip => ThemeToken::StatusSkip,
            Self::NotRun => ThemeToken::StatusNotRun,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Skip => write!(f, "SKIP"),
            Self::NotRun => write!(f, "NOT_RUN"),
        }
    }
}

/// Concurrency context of a span. `None` is the single implicit worker.
pub type WorkerId = Option<Arc<str>>;

/// A timed unit of execution, flattened out of the run model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub id: SpanId,
    pub name: Arc<str>,
    pub kind: SpanKind,
    pub status: Status,
    /// Start in seconds.
    pub start: f64,
    /// End in seconds, `None` while the span is still open.
    pub end: Option<f64>,
    /// May reference an id outside the set; such spans are treated as roots.
    pub parent: Option<SpanId>,
    pub worker: WorkerId,
    pub depth: u32,
}

impl Span {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn tier(&self) -> Tier {
        self.kind.tier()
    }

    /// End used for overlap decisions: open spans never finish.
    pub fn overlap_end(&self) -> f64 {
        self.end.unwrap_or(f64::INFINITY)
    }

    /// End used for drawing: open spans run to `horizon`.
    pub fn visible_end(&self, horizon: f64) -> f64 {
        self.end.unwrap_or(horizon).max(self.start)
    }

    pub fn duration(&self) -> Option<f64> {
        self.end.map(|end| end - self.start)
    }
}

/// An immutable, id-indexed span list plus its time bounds.
///
/// Rebuilt wholesale on load and on every live refresh, never patched.
#[derive(Debug, Clone, Default)]
pub struct SpanSet {
    spans: Vec<Span>,
    index: HashMap<SpanId, usize>,
    min_time: f64,
    max_time: f64,
}

impl SpanSet {
    /// Build a set from spans with unique ids. Later duplicates are dropped.
    pub fn new(spans: Vec<Span>, min_time: f64, max_time: f64) -> Self {
        let mut index = HashMap::with_capacity(spans.len());
        let mut unique = Vec::with_capacity(spans.len());
        for span in spans {
            if index.contains_key(&span.id) {
                tracing::debug!(id = %span.id, "duplicate span id dropped");
                continue;
            }
            index.insert(span.id.clone(), unique.len());
            unique.push(span);
        }
        Self {
            spans: unique,
            index,
            min_time,
            max_time: max_time.max(min_time),
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Span> {
        self.index.get(id).map(|&i| &self.spans[i])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    pub fn duration(&self) -> f64 {
        self.max_time - self.min_time
    }

    pub fn open_count(&self) -> usize {
        self.spans.iter().filter(|s| s.is_open()).count()
    }

    /// Parent of `span`, if it exists in this set.
    pub fn parent_of(&self, span: &Span) -> Option<&Span> {
        span.parent.as_ref().and_then(|p| self.get(p.as_str()))
    }

    /// Distinct workers: the implicit worker first (when used), then named
    /// workers in order of first appearance.
    pub fn workers(&self) -> Vec<WorkerId> {
        let mut named: Vec<WorkerId> = Vec::new();
        let mut has_implicit = false;
        for span in &self.spans {
            match &span.worker {
                None => has_implicit = true,
                Some(w) => {
                    if !named.iter().any(|n| n.as_deref() == Some(&**w)) {
                        named.push(Some(w.clone()));
                    }
                }
            }
        }
        let mut workers = Vec::with_capacity(named.len() + 1);
        if has_implicit {
            workers.push(None);
        }
        workers.extend(named);
        workers
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Closed keyword span on the implicit worker.
    pub fn span(id: &str, start: f64, end: f64) -> Span {
        Span {
            id: SpanId::from(id),
            name: Arc::from(id),
            kind: SpanKind::Keyword,
            status: Status::Pass,
            start,
            end: Some(end),
            parent: None,
            worker: None,
            depth: 0,
        }
    }

    pub fn set(spans: Vec<Span>) -> SpanSet {
        let min = spans.iter().map(|s| s.start).fold(f64::INFINITY, f64::min);
        let max = spans
            .iter()
            .map(|s| s.end.unwrap_or(s.start))
            .fold(f64::NEG_INFINITY, f64::max);
        if min.is_finite() {
            SpanSet::new(spans, min, max)
        } else {
            SpanSet::new(spans, 0.0, 0.0)
        }
    }
}
