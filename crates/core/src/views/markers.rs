use std::sync::Arc;

use rf_timeline_protocol::{Point, RenderCommand, ThemeToken};

use crate::model::{SpanKind, SpanSet};
use crate::viewport::Viewport;

/// Render suite and test boundaries as vertical lines below the axis.
///
/// Markers closer than `min_spacing_px` to the previously drawn one are
/// skipped; at a shared position the suite marker wins.
pub fn render_markers(spans: &SpanSet, viewport: &Viewport, min_spacing_px: f64) -> Vec<RenderCommand> {
    if viewport.is_empty() || spans.is_empty() {
        return Vec::new();
    }

    let left = viewport.left_margin();
    let right = left + viewport.timeline_width();
    let mut positions: Vec<(f64, ThemeToken)> = Vec::new();
    for span in spans.iter() {
        let token = match span.kind {
            SpanKind::Suite => ThemeToken::SuiteMarker,
            SpanKind::Test => ThemeToken::TestMarker,
            _ => continue,
        };
        for t in std::iter::once(span.start).chain(span.end) {
            let x = viewport.time_to_screen_x(t);
            if x >= left && x <= right {
                positions.push((x, token));
            }
        }
    }
    if positions.is_empty() {
        return Vec::new();
    }
    positions.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then_with(|| marker_rank(a.1).cmp(&marker_rank(b.1)))
    });

    let top = viewport.axis_height();
    let bottom = viewport.height();
    let mut commands = Vec::with_capacity(positions.len() + 2);
    commands.push(RenderCommand::BeginGroup {
        id: Arc::from("markers"),
        label: Some(Arc::from("Boundaries")),
    });

    let mut last_x = f64::NEG_INFINITY;
    for (x, token) in positions {
        if x - last_x < min_spacing_px {
            continue;
        }
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, top),
            to: Point::new(x, bottom),
            color: token,
            width: 1.0,
        });
        last_x = x;
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

fn marker_rank(token: ThemeToken) -> u8 {
    match token {
        ThemeToken::SuiteMarker => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineConfig;
    use crate::model::span::test_support::{set, span};

    fn lines(cmds: &[RenderCommand]) -> Vec<(f64, ThemeToken)> {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawLine { from, color, .. } => Some((from.x, *color)),
                _ => None,
            })
            .collect()
    }

    fn sample() -> SpanSet {
        let mut suite = span("s", 0.0, 10.0);
        suite.kind = SpanKind::Suite;
        let mut test = span("t", 0.0, 4.0);
        test.kind = SpanKind::Test;
        set(vec![suite, test, span("kw", 1.0, 2.0)])
    }

    #[test]
    fn marks_suite_and_test_boundaries_only() {
        let spans = sample();
        let vp = Viewport::new(&TimelineConfig::default(), 0.0, 10.0, 1140.0, 300.0);
        let found = lines(&render_markers(&spans, &vp, 2.0));
        // suite start and test start coincide: the suite marker is kept.
        assert_eq!(
            found,
            vec![
                (120.0, ThemeToken::SuiteMarker),
                (520.0, ThemeToken::TestMarker),
                (1120.0, ThemeToken::SuiteMarker),
            ]
        );
    }

    #[test]
    fn close_markers_are_thinned() {
        let spans = sample();
        let vp = Viewport::new(&TimelineConfig::default(), 0.0, 10.0, 1140.0, 300.0);
        assert_eq!(lines(&render_markers(&spans, &vp, 500.0)).len(), 2);
    }

    #[test]
    fn open_spans_mark_only_their_start() {
        let mut suite = span("s", 0.0, 0.0);
        suite.kind = SpanKind::Suite;
        suite.end = None;
        let spans = set(vec![suite, span("kw", 0.0, 5.0)]);
        let vp = Viewport::new(&TimelineConfig::default(), 0.0, 5.0, 1140.0, 300.0);
        assert_eq!(lines(&render_markers(&spans, &vp, 2.0)).len(), 1);
    }
}
