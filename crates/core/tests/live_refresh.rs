//! Integration test: an in-progress run refreshed through a live feed.

use std::collections::VecDeque;

use rf_timeline_core::model::Status;
use rf_timeline_core::{
    LiveFeed, RunModel, SpanId, TimelineConfig, TimelineEngine, Transport, TransportError,
};

fn running() -> RunModel {
    RunModel::from_json(include_bytes!("fixtures/live-1.json")).expect("live-1 should parse")
}

fn finished() -> RunModel {
    RunModel::from_json(include_bytes!("fixtures/live-2.json")).expect("live-2 should parse")
}

struct Scripted(VecDeque<Result<Option<RunModel>, TransportError>>);

impl Transport for Scripted {
    fn poll(&mut self) -> Result<Option<RunModel>, TransportError> {
        self.0.pop_front().unwrap_or(Ok(None))
    }
}

#[test]
fn open_spans_close_and_new_spans_append() {
    let mut engine = TimelineEngine::new(&running(), TimelineConfig::default());
    engine.resize(800.0, 300.0);
    let before = engine.debug_state();
    assert_eq!(before.span_count, 5);
    assert_eq!(before.open_span_count, 3);
    assert_eq!((before.min_time, before.max_time), (100.0, 103.5));
    let smoke = engine.spans().get("n-t1").cloned();

    let stats = engine.refresh(&finished());
    assert_eq!((stats.closed, stats.appended, stats.dropped), (3, 2, 0));

    let after = engine.debug_state();
    assert_eq!(after.span_count, 7);
    assert_eq!(after.open_span_count, 0);
    assert_eq!((after.min_time, after.max_time), (100.0, 112.0));
    assert_eq!(engine.spans().get("n-t1").cloned(), smoke);
    assert_eq!(engine.spans().get("n-t2").map(|s| s.status), Some(Status::Fail));
    assert_eq!(engine.title(), "Nightly");

    // New spans come after the survivors.
    let ids: Vec<_> = engine.spans().iter().map(|s| s.id.to_string()).collect();
    assert_eq!(&ids[5..], ["n-t3", "n-t3-k1"]);
    assert_eq!(engine.viewport().max_time(), 112.0);
}

#[test]
fn bounds_never_shrink() {
    let mut engine = TimelineEngine::new(&finished(), TimelineConfig::default());
    engine.resize(800.0, 300.0);
    engine.refresh(&running());
    assert_eq!(engine.viewport().max_time(), 112.0);
    assert_eq!(engine.spans().max_time(), 112.0);
}

#[test]
fn selection_survives_refresh_when_span_remains() {
    let mut engine = TimelineEngine::new(&running(), TimelineConfig::default());
    engine.resize(800.0, 300.0);
    assert!(engine.highlight_span("n-t2-k1"));
    engine.refresh(&finished());
    assert_eq!(engine.selected_span(), Some(&SpanId::from("n-t2-k1")));
}

#[test]
fn feed_applies_only_the_latest_poll() {
    let mut transport = Scripted(VecDeque::from([
        Ok(Some(running())),
        Err(TransportError::Other("timeout".into())),
        Ok(Some(finished())),
    ]));
    let mut feed = LiveFeed::new();
    for _ in 0..3 {
        feed.pump(&mut transport);
    }
    assert_eq!(feed.superseded(), 1);

    let mut engine = TimelineEngine::new(&RunModel::default(), TimelineConfig::default());
    engine.resize(800.0, 300.0);
    assert!(!engine.render().is_empty());
    let model = feed.take().expect("a model should be pending");
    engine.refresh(&model);
    assert_eq!(engine.debug_state().span_count, 7);
    assert_eq!(engine.viewport().min_time(), 100.0);
    assert!(!feed.has_pending());
}
