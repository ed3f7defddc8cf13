//! Greedy interval-graph coloring of spans onto display lanes.
//!
//! Within each (worker, tier) group spans are sorted by start (ties by id)
//! and placed in the lowest lane whose last span has already ended. A new
//! lane is only opened when every existing lane is busy at the span's start,
//! so the lane count equals the group's maximum simultaneous overlap.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Span, SpanSet, Tier, WorkerId};

/// Lane pool identifier: lanes are numbered from zero per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LaneKey {
    pub worker: WorkerId,
    pub tier: Tier,
}

impl LaneKey {
    pub fn of(span: &Span) -> Self {
        Self {
            worker: span.worker.clone(),
            tier: span.tier(),
        }
    }
}

/// Output of lane assignment for one span set.
#[derive(Debug, Clone, Default)]
pub struct LaneAssignment {
    /// Lane per span, indexed like `SpanSet::spans()`.
    lanes: Vec<u32>,
    counts: HashMap<LaneKey, u32>,
}

impl LaneAssignment {
    pub fn lane(&self, span_index: usize) -> Option<u32> {
        self.lanes.get(span_index).copied()
    }

    pub fn lanes(&self) -> &[u32] {
        &self.lanes
    }

    /// Number of lanes used by a group; zero for groups without spans.
    pub fn lane_count(&self, key: &LaneKey) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Lanes across all groups.
    pub fn total_lanes(&self) -> usize {
        self.counts.values().map(|&c| c as usize).sum()
    }
}

/// Assign a lane to every span in the set.
pub fn assign_lanes(spans: &SpanSet) -> LaneAssignment {
    let mut groups: HashMap<LaneKey, Vec<usize>> = HashMap::new();
    for (i, span) in spans.iter().enumerate() {
        groups.entry(LaneKey::of(span)).or_default().push(i);
    }

    let mut lanes = vec![0u32; spans.len()];
    let mut counts = HashMap::with_capacity(groups.len());
    for (key, mut members) in groups {
        let count = pack_group(spans.spans(), &mut members, &mut lanes);
        counts.insert(key, count);
    }
    LaneAssignment { lanes, counts }
}

/// Pack one group; writes lanes for `members` and returns the lane count.
fn pack_group(spans: &[Span], members: &mut [usize], lanes: &mut [u32]) -> u32 {
    members.sort_by(|&a, &b| by_start_then_id(&spans[a], &spans[b]));

    let mut lane_ends: Vec<f64> = Vec::new();
    for &i in members.iter() {
        let span = &spans[i];
        let end = span.overlap_end();
        match lane_ends.iter().position(|&lane_end| lane_end <= span.start) {
            Some(lane) => {
                lane_ends[lane] = end;
                lanes[i] = lane as u32;
            }
            None => {
                lanes[i] = lane_ends.len() as u32;
                lane_ends.push(end);
            }
        }
    }
    lane_ends.len() as u32
}

fn by_start_then_id(a: &Span, b: &Span) -> Ordering {
    a.start.total_cmp(&b.start).then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::SpanKind;
    use crate::model::span::test_support::{set, span};

    fn lanes_by_id(spans: &SpanSet, assignment: &LaneAssignment) -> Vec<u32> {
        (0..spans.len())
            .map(|i| assignment.lane(i).unwrap_or(u32::MAX))
            .collect()
    }

    /// Max number of half-open intervals covering a single instant.
    fn clique_number(intervals: &[(f64, f64)]) -> u32 {
        let mut events: Vec<(f64, i32)> = Vec::new();
        for &(s, e) in intervals {
            events.push((s, 1));
            events.push((e, -1));
        }
        // Ends sort before starts at the same instant (half-open intervals).
        events.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut depth = 0;
        let mut max = 0;
        for (_, delta) in events {
            depth += delta;
            max = max.max(depth);
        }
        max as u32
    }

    /// Small deterministic generator so property loops stay reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next_f64(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    #[test]
    fn sequential_spans_share_one_lane() {
        let spans = set(vec![
            span("a", 0.0, 1.0),
            span("b", 1.0, 2.0),
            span("c", 2.0, 3.0),
        ]);
        let assignment = assign_lanes(&spans);
        assert_eq!(lanes_by_id(&spans, &assignment), vec![0, 0, 0]);
    }

    #[test]
    fn middle_span_overlapping_both_neighbours() {
        let spans = set(vec![
            span("a", 0.0, 1.0),
            span("b", 0.5, 2.5),
            span("c", 2.0, 3.0),
        ]);
        let assignment = assign_lanes(&spans);
        assert_eq!(lanes_by_id(&spans, &assignment), vec![0, 1, 0]);
    }

    #[test]
    fn mutually_overlapping_spans_get_distinct_lanes() {
        let spans = set(vec![
            span("a", 0.0, 3.0),
            span("b", 0.5, 3.0),
            span("c", 1.0, 3.0),
        ]);
        let assignment = assign_lanes(&spans);
        assert_eq!(lanes_by_id(&spans, &assignment), vec![0, 1, 2]);
    }

    #[test]
    fn open_span_lane_is_never_reused() {
        let mut open = span("open", 0.0, 0.0);
        open.end = None;
        let spans = set(vec![open, span("later", 100.0, 101.0)]);
        let assignment = assign_lanes(&spans);
        assert_eq!(lanes_by_id(&spans, &assignment), vec![0, 1]);
    }

    #[test]
    fn lanes_restart_per_worker_and_tier() {
        let mut suite = span("suite", 0.0, 10.0);
        suite.kind = SpanKind::Suite;
        let mut other_worker = span("w2", 0.0, 10.0);
        other_worker.worker = Some(Arc::from("pabot-2"));
        let spans = set(vec![suite, span("kw", 0.0, 10.0), other_worker]);
        let assignment = assign_lanes(&spans);
        assert_eq!(lanes_by_id(&spans, &assignment), vec![0, 0, 0]);
        assert_eq!(assignment.total_lanes(), 3);
        let key = LaneKey {
            worker: None,
            tier: Tier::Test,
        };
        assert_eq!(assignment.lane_count(&key), 0);
    }

    #[test]
    fn ties_break_by_id() {
        let spans = set(vec![span("b", 0.0, 1.0), span("a", 0.0, 1.0)]);
        let assignment = assign_lanes(&spans);
        // "a" sorts first and takes lane 0 even though it was listed second.
        assert_eq!(lanes_by_id(&spans, &assignment), vec![1, 0]);
    }

    #[test]
    fn lane_count_equals_clique_number_and_lanes_never_overlap() {
        let mut rng = Lcg(0x5eed);
        for round in 0..200 {
            let n = 1 + (rng.next_f64() * 40.0) as usize;
            let mut spans = Vec::with_capacity(n);
            let mut intervals = Vec::with_capacity(n);
            for i in 0..n {
                let start = (rng.next_f64() * 100.0).floor();
                let len = 1.0 + (rng.next_f64() * 30.0).floor();
                spans.push(span(&format!("s{round}-{i}"), start, start + len));
                intervals.push((start, start + len));
            }
            let spans = set(spans);
            let assignment = assign_lanes(&spans);
            let key = LaneKey {
                worker: None,
                tier: Tier::Keyword,
            };
            let count = assignment.lane_count(&key);
            assert_eq!(count, clique_number(&intervals), "round {round}");

            for (i, a) in spans.iter().enumerate() {
                for (j, b) in spans.iter().enumerate().skip(i + 1) {
                    if assignment.lane(i) == assignment.lane(j) {
                        let overlap = a.start < b.overlap_end() && b.start < a.overlap_end();
                        assert!(!overlap, "round {round}: {} and {} share a lane", a.id, b.id);
                    }
                }
            }
        }
    }

    #[test]
    fn assignment_is_deterministic() {
        let build = || {
            set(vec![
                span("x", 0.0, 4.0),
                span("y", 1.0, 2.0),
                span("z", 1.0, 5.0),
                span("w", 3.0, 6.0),
            ])
        };
        let first = assign_lanes(&build());
        for _ in 0..10 {
            assert_eq!(assign_lanes(&build()).lanes(), first.lanes());
        }
    }
}
