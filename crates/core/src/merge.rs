//! Live-mode merge of a freshly flattened span set into the previous one.

use crate::model::SpanSet;

/// Counts from one merge, for logging and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Previously open spans that now carry an end.
    pub closed: usize,
    pub appended: usize,
    /// Ids present before but missing from the fresh set.
    pub dropped: usize,
}

/// Merge `fresh` into `previous`, keyed by span id.
///
/// Order is stable: surviving spans keep their previous position, new ids
/// append in the fresh walk order. Closed spans are kept as they were; open
/// spans take the fresh version. Bounds grow to the union of both sets.
pub fn merge(previous: &SpanSet, fresh: SpanSet) -> (SpanSet, MergeStats) {
    if previous.is_empty() {
        let appended = fresh.len();
        return (fresh, MergeStats { appended, ..MergeStats::default() });
    }
    if fresh.is_empty() {
        tracing::warn!(dropped = previous.len(), "refresh produced no spans, keeping previous set");
        return (previous.clone(), MergeStats::default());
    }

    let mut stats = MergeStats::default();
    let mut spans = Vec::with_capacity(previous.len().max(fresh.len()));
    for old in previous.iter() {
        match fresh.get(old.id.as_str()) {
            None => {
                tracing::warn!(id = %old.id, "span vanished from refreshed run model, dropping");
                stats.dropped += 1;
            }
            Some(_) if !old.is_open() => spans.push(old.clone()),
            Some(new) => {
                if !new.is_open() {
                    stats.closed += 1;
                }
                spans.push(new.clone());
            }
        }
    }
    for new in fresh.iter() {
        if !previous.contains(new.id.as_str()) {
            spans.push(new.clone());
            stats.appended += 1;
        }
    }

    let min_time = previous.min_time().min(fresh.min_time());
    let max_time = previous.max_time().max(fresh.max_time());
    tracing::debug!(
        closed = stats.closed,
        appended = stats.appended,
        dropped = stats.dropped,
        min_time,
        max_time,
        "merged refresh"
    );
    (SpanSet::new(spans, min_time, max_time), stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use crate::model::span::test_support::{set, span};

    fn ids(spans: &SpanSet) -> Vec<String> {
        spans.iter().map(|s| s.id.to_string()).collect()
    }

    #[test]
    fn open_span_closes_and_new_ids_append() {
        let mut open = span("b", 2.0, 2.0);
        open.end = None;
        let previous = set(vec![span("a", 0.0, 1.0), open]);

        let mut closed = span("b", 2.0, 5.0);
        closed.status = Status::Fail;
        let fresh = set(vec![span("a", 0.0, 1.0), closed, span("c", 4.0, 6.0)]);

        let (merged, stats) = merge(&previous, fresh);
        assert_eq!(ids(&merged), vec!["a", "b", "c"]);
        assert_eq!(merged.get("b").and_then(|s| s.end), Some(5.0));
        assert_eq!(merged.get("b").map(|s| s.status), Some(Status::Fail));
        assert_eq!(
            stats,
            MergeStats {
                closed: 1,
                appended: 1,
                dropped: 0
            }
        );
    }

    #[test]
    fn closed_spans_are_unchanged() {
        let previous = set(vec![span("a", 0.0, 1.0)]);
        let mut rewritten = span("a", 0.0, 9.0);
        rewritten.status = Status::Skip;
        let (merged, _) = merge(&previous, set(vec![rewritten]));
        assert_eq!(merged.get("a"), previous.get("a"));
    }

    #[test]
    fn bounds_are_the_union() {
        let previous = set(vec![span("a", 10.0, 20.0)]);
        let fresh = set(vec![span("a", 10.0, 20.0), span("early", 5.0, 6.0), span("late", 30.0, 40.0)]);
        let (merged, _) = merge(&previous, fresh);
        assert_eq!((merged.min_time(), merged.max_time()), (5.0, 40.0));

        let narrower = set(vec![span("a", 10.0, 20.0)]);
        let (again, _) = merge(&merged, narrower);
        assert_eq!((again.min_time(), again.max_time()), (5.0, 40.0));
    }

    #[test]
    fn vanished_ids_are_dropped() {
        let previous = set(vec![span("a", 0.0, 1.0), span("b", 1.0, 2.0)]);
        let (merged, stats) = merge(&previous, set(vec![span("b", 1.0, 2.0)]));
        assert_eq!(ids(&merged), vec!["b"]);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn n_previous_plus_k_new() {
        let previous = set((0..50).map(|i| span(&format!("p{i}"), i as f64, i as f64 + 1.0)).collect());
        let mut fresh: Vec<_> = previous.iter().cloned().collect();
        fresh.extend((0..7).map(|i| span(&format!("n{i}"), 60.0, 61.0)));
        let (merged, _) = merge(&previous, set(fresh));
        assert_eq!(merged.len(), 57);
    }
}
