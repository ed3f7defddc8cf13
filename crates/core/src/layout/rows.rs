//! Vertical layout: worker blocks, one row per (worker, tier, lane).
//!
//! Row coordinates are content coordinates: `y = 0` is the top of the first
//! worker block, directly under the time axis, before vertical pan.

use std::collections::HashMap;
use std::ops::Range;

use crate::config::TimelineConfig;
use crate::layout::lanes::{LaneAssignment, LaneKey};
use crate::model::{SpanSet, Tier, WorkerId};

#[derive(Debug, Clone)]
pub struct Row {
    pub worker: WorkerId,
    pub tier: Tier,
    pub lane: u32,
    pub y: f64,
    pub height: f64,
    /// Span indices sorted by start. Members never overlap, so their ends
    /// are sorted as well.
    spans: Vec<usize>,
}

impl Row {
    pub fn spans(&self) -> &[usize] {
        &self.spans
    }

    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.y && y < self.y + self.height
    }
}

#[derive(Debug, Clone)]
pub struct WorkerBlock {
    pub worker: WorkerId,
    pub y: f64,
    pub height: f64,
    /// Zero when worker labels are suppressed.
    pub header_height: f64,
    pub rows: Range<usize>,
}

impl WorkerBlock {
    pub fn label(&self) -> &str {
        self.worker.as_deref().unwrap_or("main")
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowLayout {
    rows: Vec<Row>,
    blocks: Vec<WorkerBlock>,
    row_of_span: Vec<usize>,
    content_height: f64,
    show_worker_labels: bool,
}

impl RowLayout {
    pub fn build(spans: &SpanSet, lanes: &LaneAssignment, config: &TimelineConfig) -> Self {
        let workers = spans.workers();
        let show_worker_labels = !(workers.len() == 1 && workers[0].is_none()) && !workers.is_empty();
        let header_height = if show_worker_labels {
            config.worker_header_height
        } else {
            0.0
        };
        let row_height = config.row_height();

        let mut rows = Vec::new();
        let mut blocks = Vec::with_capacity(workers.len());
        // First row of each (worker, tier) pool.
        let mut pool_start: HashMap<LaneKey, usize> = HashMap::new();
        let mut y = 0.0;

        for worker in workers {
            let first_row = rows.len();
            let block_y = y;
            y += header_height;
            for tier in Tier::ALL {
                let key = LaneKey {
                    worker: worker.clone(),
                    tier,
                };
                let count = lanes.lane_count(&key);
                if count == 0 {
                    continue;
                }
                pool_start.insert(key, rows.len());
                for lane in 0..count {
                    rows.push(Row {
                        worker: worker.clone(),
                        tier,
                        lane,
                        y,
                        height: row_height,
                        spans: Vec::new(),
                    });
                    y += row_height;
                }
            }
            blocks.push(WorkerBlock {
                worker,
                y: block_y,
                height: y - block_y,
                header_height,
                rows: first_row..rows.len(),
            });
        }

        let mut row_of_span = vec![usize::MAX; spans.len()];
        for (i, span) in spans.iter().enumerate() {
            let Some(&first) = pool_start.get(&LaneKey::of(span)) else {
                continue;
            };
            let row = first + lanes.lane(i).unwrap_or(0) as usize;
            if let Some(r) = rows.get_mut(row) {
                r.spans.push(i);
                row_of_span[i] = row;
            }
        }
        let all = spans.spans();
        for row in &mut rows {
            row.spans.sort_by(|&a, &b| {
                all[a]
                    .start
                    .total_cmp(&all[b].start)
                    .then_with(|| all[a].id.cmp(&all[b].id))
            });
        }

        Self {
            rows,
            blocks,
            row_of_span,
            content_height: y,
            show_worker_labels,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn blocks(&self) -> &[WorkerBlock] {
        &self.blocks
    }

    /// Height of all worker blocks, excluding the axis.
    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    /// False when the only worker is the implicit one.
    pub fn show_worker_labels(&self) -> bool {
        self.show_worker_labels
    }

    pub fn row_of_span(&self, span_index: usize) -> Option<&Row> {
        self.row_of_span
            .get(span_index)
            .and_then(|&r| self.rows.get(r))
    }

    /// Row under a content-space y, if any.
    pub fn row_at(&self, y: f64) -> Option<&Row> {
        let i = self.rows.partition_point(|r| r.y + r.height <= y);
        self.rows.get(i).filter(|r| r.contains_y(y))
    }

    /// Members of `row` whose drawn extent intersects `[t0, t1]`.
    /// Open spans are drawn up to `horizon`.
    pub fn visible_in<'a>(
        &self,
        row: &'a Row,
        spans: &SpanSet,
        t0: f64,
        t1: f64,
        horizon: f64,
    ) -> &'a [usize] {
        let all = spans.spans();
        let first = row
            .spans
            .partition_point(|&i| all[i].visible_end(horizon) < t0);
        let last = row.spans.partition_point(|&i| all[i].start <= t1);
        if first >= last {
            return &[];
        }
        &row.spans[first..last]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::layout::lanes::assign_lanes;
    use crate::model::SpanKind;
    use crate::model::span::test_support::{set, span};

    fn layout(spans: &SpanSet) -> RowLayout {
        RowLayout::build(spans, &assign_lanes(spans), &TimelineConfig::default())
    }

    #[test]
    fn single_implicit_worker_hides_labels() {
        let spans = set(vec![span("a", 0.0, 1.0), span("b", 0.5, 2.0)]);
        let rows = layout(&spans);
        assert!(!rows.show_worker_labels());
        assert_eq!(rows.rows().len(), 2);
        assert_eq!(rows.content_height(), 2.0 * TimelineConfig::default().row_height());
    }

    #[test]
    fn rows_ordered_by_tier_within_worker() {
        let mut suite = span("suite", 0.0, 10.0);
        suite.kind = SpanKind::Suite;
        let mut test = span("test", 0.0, 10.0);
        test.kind = SpanKind::Test;
        let spans = set(vec![span("kw", 0.0, 1.0), test, suite]);
        let rows = layout(&spans);
        let tiers: Vec<_> = rows.rows().iter().map(|r| r.tier).collect();
        assert_eq!(tiers, vec![Tier::Suite, Tier::Test, Tier::Keyword]);
    }

    #[test]
    fn named_workers_get_headers_and_height_tracks_lanes() {
        let config = TimelineConfig::default();
        let mut a = span("a", 0.0, 5.0);
        a.worker = Some(Arc::from("w1"));
        let mut b = span("b", 1.0, 5.0);
        b.worker = Some(Arc::from("w1"));
        let mut c = span("c", 0.0, 5.0);
        c.worker = Some(Arc::from("w2"));
        let spans = set(vec![a, b, c]);
        let rows = layout(&spans);
        assert!(rows.show_worker_labels());
        assert_eq!(rows.blocks().len(), 2);
        let expected = 2.0 * config.worker_header_height + 3.0 * config.row_height();
        assert!((rows.content_height() - expected).abs() < 1e-9);
        assert_eq!(rows.blocks()[1].rows, 2..3);
    }

    #[test]
    fn row_at_finds_rows_and_misses_outside() {
        let spans = set(vec![span("a", 0.0, 1.0), span("b", 0.5, 2.0)]);
        let rows = layout(&spans);
        let h = TimelineConfig::default().row_height();
        assert_eq!(rows.row_at(0.0).map(|r| r.lane), Some(0));
        assert_eq!(rows.row_at(h + 1.0).map(|r| r.lane), Some(1));
        assert!(rows.row_at(-1.0).is_none());
        assert!(rows.row_at(10.0 * h).is_none());
    }

    #[test]
    fn visible_in_clips_by_time() {
        let spans = set(vec![
            span("a", 0.0, 1.0),
            span("b", 2.0, 3.0),
            span("c", 4.0, 5.0),
        ]);
        let rows = layout(&spans);
        let row = &rows.rows()[0];
        let visible = rows.visible_in(row, &spans, 2.5, 4.5, spans.max_time());
        assert_eq!(visible, &[1, 2]);
        assert!(rows.visible_in(row, &spans, 6.0, 7.0, spans.max_time()).is_empty());
    }
}
