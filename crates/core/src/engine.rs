//! The owned engine instance behind one rendered timeline.

use std::cell::RefCell;
use std::rc::Rc;

use rf_timeline_protocol::{DebugState, RenderCommand, SelectionSource, SpanId, TimelineEvent};

use crate::bus::{EventBus, SubscriptionId};
use crate::config::TimelineConfig;
use crate::error::LoadError;
use crate::flatten::flatten;
use crate::gesture::{GestureAction, GestureState, InputEvent};
use crate::layout::{LaneAssignment, RowLayout, assign_lanes};
use crate::merge::{MergeStats, merge};
use crate::model::{RunModel, Span, SpanSet};
use crate::selection::{SelectionCoordinator, SelectionEffect, TreeView, connect_tree_view};
use crate::viewport::Viewport;
use crate::views::{TimelineScene, hit_test, render_timeline};

/// One timeline: span data, layout, view state and its event bus.
///
/// Instances share nothing; a host creates one per rendered report. All
/// methods run on the host's event loop and events raised by a call are
/// published only after that call's mutation has completed.
pub struct TimelineEngine {
    config: TimelineConfig,
    title: String,
    spans: SpanSet,
    lanes: LaneAssignment,
    rows: RowLayout,
    viewport: Viewport,
    selection: SelectionCoordinator,
    bus: EventBus,
    gesture: GestureState,
    hovered: Option<SpanId>,
    range: Option<(f64, f64)>,
}

impl TimelineEngine {
    /// Build an engine for `model`. The surface starts at zero size, so
    /// nothing renders until the first [`resize`](Self::resize).
    pub fn new(model: &RunModel, config: TimelineConfig) -> Self {
        let config = config.sanitized();
        let spans = flatten(model);
        let viewport = Viewport::new(&config, spans.min_time(), spans.max_time(), 0.0, 0.0);
        let mut engine = Self {
            config,
            title: model.title.clone(),
            spans,
            lanes: LaneAssignment::default(),
            rows: RowLayout::default(),
            viewport,
            selection: SelectionCoordinator::new(),
            bus: EventBus::new(),
            gesture: GestureState::default(),
            hovered: None,
            range: None,
        };
        engine.relayout();
        tracing::info!(
            title = %engine.title,
            spans = engine.spans.len(),
            workers = engine.rows.blocks().len(),
            lanes = engine.lanes.total_lanes(),
            "loaded run model"
        );
        engine
    }

    pub fn from_json(data: &[u8], config: TimelineConfig) -> Result<Self, LoadError> {
        Ok(Self::new(&RunModel::from_json(data)?, config))
    }

    /// Merge a refreshed run model into the current data.
    ///
    /// Lanes are recomputed from scratch, time bounds only grow, and a
    /// selection whose span disappeared is cleared without an event.
    pub fn refresh(&mut self, model: &RunModel) -> MergeStats {
        let was_empty = self.spans.is_empty();
        let (spans, stats) = merge(&self.spans, flatten(model));
        self.spans = spans;
        if !model.title.is_empty() {
            self.title = model.title.clone();
        }

        if was_empty {
            self.viewport = Viewport::new(
                &self.config,
                self.spans.min_time(),
                self.spans.max_time(),
                self.viewport.width(),
                self.viewport.height(),
            );
        } else {
            self.viewport
                .extend_bounds(self.spans.min_time(), self.spans.max_time());
        }
        self.relayout();

        self.selection.validate(&self.spans);
        if self
            .hovered
            .as_ref()
            .is_some_and(|id| !self.spans.contains(id.as_str()))
        {
            self.hovered = None;
        }
        tracing::info!(
            spans = self.spans.len(),
            closed = stats.closed,
            appended = stats.appended,
            dropped = stats.dropped,
            "refreshed"
        );
        stats
    }

    fn relayout(&mut self) {
        self.lanes = assign_lanes(&self.spans);
        self.rows = RowLayout::build(&self.spans, &self.lanes, &self.config);
        self.viewport.set_content_height(self.rows.content_height());
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.resize(width, height);
    }

    /// Route one input event. Returns true when the frame needs redrawing.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        let actions = self
            .gesture
            .handle(&event, self.config.click_tolerance_px, self.config.zoom_step);
        let mut events = Vec::new();
        let mut redraw = false;
        for action in actions {
            redraw |= self.apply(action, &mut events);
        }
        self.publish(events);
        redraw
    }

    fn apply(&mut self, action: GestureAction, events: &mut Vec<TimelineEvent>) -> bool {
        match action {
            GestureAction::Pan { dx, dy } => {
                self.viewport.pan_by(dx, dy);
                true
            }
            GestureAction::Zoom { factor, pivot_x } => {
                self.viewport.zoom_by(factor, pivot_x);
                true
            }
            GestureAction::Hover { x, y } => {
                let hovered = self.hit_test(x, y).map(|s| s.id.clone());
                if hovered == self.hovered {
                    return false;
                }
                self.hovered = hovered;
                true
            }
            GestureAction::ClearHover => self.hovered.take().is_some(),
            GestureAction::Click { x, y } => {
                let Some(id) = self.hit_test(x, y).map(|s| s.id.clone()) else {
                    return false;
                };
                let effects = self.selection.select(id, SelectionSource::Timeline);
                let changed = !effects.is_empty();
                self.apply_effects(effects, events);
                changed
            }
            GestureAction::RangeUpdate { from_x, to_x } => {
                self.range = Some(self.range_between(from_x, to_x));
                true
            }
            GestureAction::RangeFinish { from_x, to_x } => {
                let (start, end) = self.range_between(from_x, to_x);
                self.range = Some((start, end));
                events.push(TimelineEvent::TimeRangeSelected { start, end });
                true
            }
            GestureAction::RangeCancel => self.range.take().is_some(),
            GestureAction::Resize { width, height } => {
                self.viewport.resize(width, height);
                true
            }
        }
    }

    /// Ordered times under two screen x positions, clamped to the data.
    fn range_between(&self, a: f64, b: f64) -> (f64, f64) {
        let clamp = |x: f64| {
            self.viewport
                .screen_x_to_time(x)
                .max(self.spans.min_time())
                .min(self.spans.max_time())
        };
        let (ta, tb) = (clamp(a), clamp(b));
        (ta.min(tb), ta.max(tb))
    }

    fn apply_effects(&mut self, effects: Vec<SelectionEffect>, events: &mut Vec<TimelineEvent>) {
        for effect in effects {
            match effect {
                SelectionEffect::Emit(event) => events.push(event),
                SelectionEffect::CenterOn(id) => self.center_on(&id),
            }
        }
    }

    fn center_on(&mut self, id: &SpanId) {
        let Some(index) = self.spans.index_of(id.as_str()) else {
            return;
        };
        self.viewport.center_on(&self.spans.spans()[index]);
        if let Some(row) = self.rows.row_of_span(index) {
            self.viewport.reveal_row(row.y, row.height);
        }
    }

    fn publish(&mut self, events: Vec<TimelineEvent>) {
        for event in &events {
            self.bus.publish(event);
        }
    }

    fn select(&mut self, span_id: &str, source: SelectionSource) -> bool {
        let Some(span) = self.spans.get(span_id) else {
            tracing::debug!(span_id, %source, "selection request for unknown span ignored");
            return false;
        };
        let effects = self.selection.select(span.id.clone(), source);
        let mut events = Vec::new();
        self.apply_effects(effects, &mut events);
        self.publish(events);
        true
    }

    /// Select and center a span on behalf of the tree view. Returns false
    /// for ids not in the current data.
    pub fn highlight_span(&mut self, span_id: &str) -> bool {
        self.select(span_id, SelectionSource::Tree)
    }

    /// Select a span as if it had been clicked on the timeline.
    pub fn select_from_timeline(&mut self, span_id: &str) -> bool {
        self.select(span_id, SelectionSource::Timeline)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Back to zoom 1 with the whole run in view.
    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    /// Pan by a pixel offset, for hosts driving the view from keys.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.viewport.pan_by(dx, dy);
    }

    pub fn zoom_by(&mut self, factor: f64, pivot_x: f64) {
        self.viewport.zoom_by(factor, pivot_x);
    }

    pub fn render(&self) -> Vec<RenderCommand> {
        render_timeline(&TimelineScene {
            spans: &self.spans,
            rows: &self.rows,
            viewport: &self.viewport,
            config: &self.config,
            selected: self.selection.selected(),
            hovered: self.hovered.as_ref(),
            range: self.range,
        })
    }

    /// Topmost span drawn at a surface point.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&Span> {
        hit_test(
            &self.spans,
            &self.rows,
            &self.viewport,
            &self.config,
            x,
            y,
        )
        .map(|i| &self.spans.spans()[i])
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&TimelineEvent) + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Keep `tree` highlighting whatever is selected on the timeline.
    pub fn connect_tree_view<T: TreeView + 'static>(&mut self, tree: Rc<RefCell<T>>) -> SubscriptionId {
        connect_tree_view(&mut self.bus, tree)
    }

    pub fn selected_span(&self) -> Option<&SpanId> {
        self.selection.selected()
    }

    pub fn hovered_span(&self) -> Option<&SpanId> {
        self.hovered.as_ref()
    }

    pub fn time_range_selection(&self) -> Option<(f64, f64)> {
        self.range
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn spans(&self) -> &SpanSet {
        &self.spans
    }

    pub fn rows(&self) -> &RowLayout {
        &self.rows
    }

    pub fn lanes(&self) -> &LaneAssignment {
        &self.lanes
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Surface height needed to show every row without scrolling.
    pub fn content_height(&self) -> f64 {
        self.config.axis_height + self.rows.content_height()
    }

    pub fn debug_state(&self) -> DebugState {
        DebugState {
            span_count: self.spans.len(),
            worker_count: self.rows.blocks().len(),
            lane_count: self.lanes.total_lanes(),
            open_span_count: self.spans.open_count(),
            min_time: self.spans.min_time(),
            max_time: self.spans.max_time(),
            selected: self.selection.selected().cloned(),
        }
    }
}

impl std::fmt::Debug for TimelineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineEngine")
            .field("title", &self.title)
            .field("spans", &self.spans.len())
            .field("viewport", &self.viewport)
            .field("selected", &self.selection.selected())
            .field("bus", &self.bus)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::RunNode;

    fn node(id: &str, start: f64, end: Option<f64>, children: Vec<RunNode>) -> RunNode {
        RunNode {
            name: id.into(),
            id: Some(id.into()),
            status: Some("PASS".into()),
            start_time: Some(start),
            end_time: end,
            children,
            ..RunNode::default()
        }
    }

    fn model() -> RunModel {
        RunModel {
            title: "sample".into(),
            suites: vec![node(
                "s1",
                0.0,
                Some(10.0),
                vec![node("t1", 0.0, Some(4.0), vec![]), node("t2", 5.0, Some(10.0), vec![])],
            )],
            ..RunModel::default()
        }
    }

    fn engine() -> TimelineEngine {
        let mut engine = TimelineEngine::new(&model(), TimelineConfig::default());
        engine.resize(1140.0, 400.0);
        engine
    }

    fn recorder(engine: &mut TimelineEngine) -> Rc<RefCell<Vec<TimelineEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        engine.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        log
    }

    #[test]
    fn nothing_renders_before_first_resize() {
        let engine = TimelineEngine::new(&model(), TimelineConfig::default());
        assert!(engine.render().is_empty());
    }

    #[test]
    fn click_selects_and_emits_once() {
        let mut engine = engine();
        let log = recorder(&mut engine);
        // Test row sits under the suite row: y = 24 + 20 + a few px.
        let press = InputEvent::PointerDown { x: 170.0, y: 50.0, shift: false };
        let release = InputEvent::PointerUp { x: 170.0, y: 50.0 };
        engine.handle_input(press);
        assert!(engine.handle_input(release));
        assert_eq!(engine.selected_span().map(SpanId::as_str), Some("t1"));

        engine.handle_input(press);
        assert!(!engine.handle_input(release));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn click_on_empty_space_keeps_selection() {
        let mut engine = engine();
        engine.select_from_timeline("t2");
        engine.handle_input(InputEvent::PointerDown { x: 570.0, y: 50.0, shift: false });
        engine.handle_input(InputEvent::PointerUp { x: 570.0, y: 50.0 });
        assert_eq!(engine.selected_span().map(SpanId::as_str), Some("t2"));
    }

    #[test]
    fn highlight_unknown_span_is_ignored() {
        let mut engine = engine();
        let log = recorder(&mut engine);
        assert!(!engine.highlight_span("nope"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn shift_drag_emits_clamped_range() {
        let mut engine = engine();
        let log = recorder(&mut engine);
        engine.handle_input(InputEvent::PointerDown { x: 620.0, y: 60.0, shift: true });
        engine.handle_input(InputEvent::PointerUp { x: 1135.0, y: 60.0 });
        assert_eq!(
            log.borrow().last(),
            Some(&TimelineEvent::TimeRangeSelected { start: 5.0, end: 10.0 })
        );
    }

    #[test]
    fn hover_tracks_pointer_and_leave_clears_it() {
        let mut engine = engine();
        assert!(engine.handle_input(InputEvent::PointerMove { x: 700.0, y: 50.0 }));
        assert_eq!(engine.hovered_span().map(SpanId::as_str), Some("t2"));
        assert!(!engine.handle_input(InputEvent::PointerMove { x: 710.0, y: 50.0 }));
        assert!(engine.handle_input(InputEvent::PointerLeave));
        assert!(engine.hovered_span().is_none());
    }

    #[test]
    fn refresh_clears_vanished_selection_silently() {
        let mut engine = engine();
        engine.select_from_timeline("t2");
        let log = recorder(&mut engine);
        let mut shrunk = model();
        shrunk.suites[0].children.pop();
        engine.refresh(&shrunk);
        assert!(engine.selected_span().is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn debug_state_reports_counts() {
        let state = engine().debug_state();
        assert_eq!(state.span_count, 3);
        assert_eq!(state.worker_count, 1);
        assert_eq!(state.lane_count, 2);
        assert_eq!((state.min_time, state.max_time), (0.0, 10.0));
    }

    #[test]
    fn content_height_covers_axis_and_rows() {
        let engine = engine();
        let config = TimelineConfig::default();
        assert_eq!(engine.content_height(), config.axis_height + 2.0 * config.row_height());
    }
}
