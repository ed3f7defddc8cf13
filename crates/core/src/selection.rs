//! Cross-view selection state.
//!
//! The coordinator never touches the bus or the viewport itself: every
//! transition returns the effects the engine must apply once the mutation
//! is complete. Echo between the two views is prevented by the source tag
//! carried on each event.

use std::cell::RefCell;
use std::rc::Rc;

use rf_timeline_protocol::{SelectionSource, SpanId, TimelineEvent};

use crate::bus::{EventBus, SubscriptionId};
use crate::model::SpanSet;

/// The companion hierarchical view, as seen by the timeline.
pub trait TreeView {
    /// Highlight the node for `span_id` and scroll it into view. Must not
    /// select back into the timeline.
    fn highlight_span(&mut self, span_id: &SpanId);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEffect {
    /// Publish on the engine's bus.
    Emit(TimelineEvent),
    /// Center the viewport on the span and reveal its row.
    CenterOn(SpanId),
}

#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    selected: Option<SpanId>,
    source: Option<SelectionSource>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&SpanId> {
        self.selected.as_ref()
    }

    /// View that produced the current selection.
    pub fn source(&self) -> Option<SelectionSource> {
        self.source
    }

    /// Select `span_id` on behalf of `source`.
    ///
    /// Re-selecting the current span is a no-op: nothing is emitted and the
    /// viewport is left where the user put it.
    pub fn select(&mut self, span_id: SpanId, source: SelectionSource) -> Vec<SelectionEffect> {
        let mut effects = Vec::with_capacity(2);
        if self.selected.as_ref() == Some(&span_id) {
            return effects;
        }

        tracing::debug!(%span_id, %source, "selection changed");
        self.selected = Some(span_id.clone());
        self.source = Some(source);
        if source == SelectionSource::Tree {
            effects.push(SelectionEffect::CenterOn(span_id.clone()));
        }
        effects.push(SelectionEffect::Emit(TimelineEvent::SpanSelected { span_id, source }));
        effects
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.source = None;
    }

    /// Drop a selection whose span is no longer in `spans`. Returns true when
    /// the selection was cleared.
    pub fn validate(&mut self, spans: &SpanSet) -> bool {
        match &self.selected {
            Some(id) if !spans.contains(id.as_str()) => {
                tracing::debug!(%id, "selected span vanished, clearing selection");
                self.clear();
                true
            }
            _ => false,
        }
    }
}

/// Forward timeline-originated selections to `tree`. Selections the tree
/// produced itself are not sent back.
pub fn connect_tree_view<T>(bus: &mut EventBus, tree: Rc<RefCell<T>>) -> SubscriptionId
where
    T: TreeView + 'static,
{
    bus.subscribe(move |event| {
        if let TimelineEvent::SpanSelected {
            span_id,
            source: SelectionSource::Timeline,
        } = event
        {
            tree.borrow_mut().highlight_span(span_id);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::span::test_support::{set, span};

    fn id(s: &str) -> SpanId {
        SpanId::from(s)
    }

    #[test]
    fn timeline_selection_emits_without_centering() {
        let mut sel = SelectionCoordinator::new();
        let effects = sel.select(id("a"), SelectionSource::Timeline);
        assert_eq!(
            effects,
            vec![SelectionEffect::Emit(TimelineEvent::SpanSelected {
                span_id: id("a"),
                source: SelectionSource::Timeline,
            })]
        );
        assert_eq!(sel.selected(), Some(&id("a")));
    }

    #[test]
    fn tree_selection_centers_then_emits() {
        let mut sel = SelectionCoordinator::new();
        let effects = sel.select(id("a"), SelectionSource::Tree);
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0], SelectionEffect::CenterOn(id("a")));
        assert_eq!(sel.source(), Some(SelectionSource::Tree));
    }

    #[test]
    fn reselecting_emits_nothing() {
        let mut sel = SelectionCoordinator::new();
        sel.select(id("a"), SelectionSource::Timeline);
        assert!(sel.select(id("a"), SelectionSource::Timeline).is_empty());
        assert!(sel.select(id("a"), SelectionSource::Tree).is_empty());
        sel.select(id("b"), SelectionSource::Tree);
        assert!(sel.select(id("b"), SelectionSource::Tree).is_empty());
        assert_eq!(sel.selected(), Some(&id("b")));
        assert_eq!(sel.source(), Some(SelectionSource::Tree));
    }

    #[test]
    fn validate_clears_vanished_target() {
        let mut sel = SelectionCoordinator::new();
        sel.select(id("gone"), SelectionSource::Timeline);
        let spans = set(vec![span("kept", 0.0, 1.0)]);
        assert!(sel.validate(&spans));
        assert!(sel.selected().is_none());
        assert!(!sel.validate(&spans));
    }

    #[derive(Default)]
    struct RecordingTree(Vec<String>);

    impl TreeView for RecordingTree {
        fn highlight_span(&mut self, span_id: &SpanId) {
            self.0.push(span_id.to_string());
        }
    }

    #[test]
    fn tree_only_hears_timeline_selections() {
        let tree = Rc::new(RefCell::new(RecordingTree::default()));
        let mut bus = EventBus::new();
        connect_tree_view(&mut bus, Rc::clone(&tree));
        bus.publish(&TimelineEvent::SpanSelected {
            span_id: id("a"),
            source: SelectionSource::Timeline,
        });
        bus.publish(&TimelineEvent::SpanSelected {
            span_id: id("b"),
            source: SelectionSource::Tree,
        });
        bus.publish(&TimelineEvent::TimeRangeSelected { start: 0.0, end: 1.0 });
        assert_eq!(tree.borrow().0, vec!["a"]);
    }
}
