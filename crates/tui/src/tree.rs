//! Collapsible suite/test/keyword tree shown beside the timeline.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rf_timeline_core::model::{SpanKind, Status};
use rf_timeline_core::{SpanId, SpanSet, TreeView};

#[derive(Debug, Clone)]
struct Node {
    id: SpanId,
    name: Arc<str>,
    kind: SpanKind,
    status: Status,
    open: bool,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// One visible line of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLine {
    pub id: SpanId,
    pub name: Arc<str>,
    pub kind: SpanKind,
    pub status: Status,
    pub open: bool,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
}

#[derive(Debug, Default)]
pub struct TreePane {
    nodes: Vec<Node>,
    index: HashMap<SpanId, usize>,
    roots: Vec<usize>,
    expanded: HashSet<SpanId>,
    cursor: Option<SpanId>,
}

impl TreePane {
    pub fn new(spans: &SpanSet) -> Self {
        let mut pane = Self::default();
        pane.rebuild(spans);
        let roots: Vec<SpanId> = pane.roots.iter().map(|&i| pane.nodes[i].id.clone()).collect();
        pane.expanded.extend(roots);
        pane
    }

    /// Rebuild from a refreshed span set. Expansion state and the cursor are
    /// kept for ids that still exist.
    pub fn rebuild(&mut self, spans: &SpanSet) {
        self.nodes = spans
            .iter()
            .map(|span| Node {
                id: span.id.clone(),
                name: Arc::clone(&span.name),
                kind: span.kind,
                status: span.status,
                open: span.is_open(),
                parent: None,
                children: Vec::new(),
            })
            .collect();
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self.roots.clear();

        for (i, span) in spans.iter().enumerate() {
            let parent = span
                .parent
                .as_ref()
                .and_then(|p| self.index.get(p.as_str()).copied())
                .filter(|&p| p != i);
            match parent {
                Some(p) => {
                    self.nodes[i].parent = Some(p);
                    self.nodes[p].children.push(i);
                }
                None => self.roots.push(i),
            }
        }

        self.expanded.retain(|id| spans.contains(id.as_str()));
        if self.cursor.as_ref().is_some_and(|c| !spans.contains(c.as_str())) {
            self.cursor = None;
        }
    }

    pub fn visible(&self) -> Vec<TreeLine> {
        let mut lines = Vec::new();
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&i| (i, 0)).collect();
        while let Some((i, depth)) = stack.pop() {
            let node = &self.nodes[i];
            let expanded = self.expanded.contains(&node.id);
            lines.push(TreeLine {
                id: node.id.clone(),
                name: Arc::clone(&node.name),
                kind: node.kind,
                status: node.status,
                open: node.open,
                depth,
                has_children: !node.children.is_empty(),
                expanded,
            });
            if expanded {
                stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
            }
        }
        lines
    }

    pub fn cursor(&self) -> Option<&SpanId> {
        self.cursor.as_ref()
    }

    /// Position of the cursor among the visible lines.
    pub fn cursor_line(&self, lines: &[TreeLine]) -> Option<usize> {
        let cursor = self.cursor.as_ref()?;
        lines.iter().position(|l| &l.id == cursor)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let lines = self.visible();
        if lines.is_empty() {
            return;
        }
        let next = match self.cursor_line(&lines) {
            Some(at) => at.saturating_add_signed(delta).min(lines.len() - 1),
            None => 0,
        };
        self.cursor = Some(lines[next].id.clone());
    }

    pub fn toggle(&mut self) {
        let Some(id) = self.cursor.clone() else {
            return;
        };
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    /// Collapse the cursor node, or jump to its parent when already collapsed.
    pub fn collapse_or_parent(&mut self) {
        let Some(&i) = self.cursor.as_ref().and_then(|c| self.index.get(c.as_str())) else {
            return;
        };
        let id = self.nodes[i].id.clone();
        if !self.expanded.remove(&id)
            && let Some(p) = self.nodes[i].parent
        {
            self.cursor = Some(self.nodes[p].id.clone());
        }
    }

    pub fn expand(&mut self) {
        if let Some(id) = self.cursor.clone() {
            self.expanded.insert(id);
        }
    }
}

impl TreeView for TreePane {
    /// Reveal the span: expand every ancestor and move the cursor onto it.
    fn highlight_span(&mut self, span_id: &SpanId) {
        let Some(&i) = self.index.get(span_id.as_str()) else {
            return;
        };
        let mut parent = self.nodes[i].parent;
        while let Some(p) = parent {
            self.expanded.insert(self.nodes[p].id.clone());
            parent = self.nodes[p].parent;
        }
        self.cursor = Some(span_id.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rf_timeline_core::{RunModel, TimelineConfig, TimelineEngine};

    use super::*;

    const RUN: &str = r#"{
        "title": "Tree",
        "suites": [{
            "name": "Root", "id": "s1", "status": "FAIL", "start_time": 0.0, "end_time": 10.0,
            "children": [
                {"name": "Alpha", "id": "t1", "status": "PASS", "start_time": 0.0, "end_time": 4.0,
                 "keywords": [{"name": "Log", "id": "k1", "status": "PASS", "start_time": 0.5, "end_time": 1.0}]},
                {"name": "Beta", "id": "t2", "status": "FAIL", "start_time": 4.0, "end_time": 10.0}
            ]
        }]
    }"#;

    fn engine() -> TimelineEngine {
        let mut engine = TimelineEngine::from_json(RUN.as_bytes(), TimelineConfig::default()).unwrap();
        engine.resize(800.0, 300.0);
        engine
    }

    fn names(pane: &TreePane) -> Vec<String> {
        pane.visible().iter().map(|l| format!("{}{}", " ".repeat(l.depth), l.name)).collect()
    }

    #[test]
    fn roots_start_expanded() {
        let pane = TreePane::new(engine().spans());
        assert_eq!(names(&pane), ["Root", " Alpha", " Beta"]);
    }

    #[test]
    fn highlight_expands_ancestors() {
        let mut pane = TreePane::new(engine().spans());
        pane.highlight_span(&SpanId::from("k1"));
        assert_eq!(names(&pane), ["Root", " Alpha", "  Log", " Beta"]);
        let lines = pane.visible();
        assert_eq!(pane.cursor_line(&lines), Some(2));
    }

    #[test]
    fn cursor_moves_within_bounds_and_toggles() {
        let mut pane = TreePane::new(engine().spans());
        pane.move_cursor(1);
        assert_eq!(pane.cursor().map(SpanId::as_str), Some("s1"));
        pane.move_cursor(5);
        assert_eq!(pane.cursor().map(SpanId::as_str), Some("t2"));
        pane.move_cursor(-1);
        pane.toggle();
        assert_eq!(names(&pane).len(), 4);
        pane.collapse_or_parent();
        pane.collapse_or_parent();
        assert_eq!(pane.cursor().map(SpanId::as_str), Some("s1"));
    }

    #[test]
    fn orphans_become_roots() {
        let spans = rf_timeline_core::flatten::flatten(&RunModel::from_json(RUN.as_bytes()).unwrap());
        let kept: Vec<_> = spans.iter().filter(|s| s.id != "s1").cloned().collect();
        let set = SpanSet::new(kept, spans.min_time(), spans.max_time());
        let pane = TreePane::new(&set);
        assert_eq!(names(&pane), ["Alpha", " Log", "Beta"]);
    }

    #[test]
    fn timeline_click_reveals_span_in_tree() {
        let mut engine = engine();
        let pane = Rc::new(RefCell::new(TreePane::new(engine.spans())));
        engine.connect_tree_view(Rc::clone(&pane));
        assert!(engine.select_from_timeline("k1"));
        assert_eq!(pane.borrow().cursor().map(SpanId::as_str), Some("k1"));
        assert_eq!(pane.borrow().visible().len(), 4);
    }
}
