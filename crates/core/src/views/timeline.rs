use std::sync::Arc;

use rf_timeline_protocol::{Point, Rect, RenderCommand, SpanId, TextAlign, ThemeToken};

use crate::config::TimelineConfig;
use crate::layout::RowLayout;
use crate::model::SpanSet;
use crate::viewport::Viewport;
use crate::views::markers::render_markers;
use crate::views::time_axis::render_time_axis;

const LABEL_FONT_SIZE: f64 = 11.0;
const GLOW_PX: f64 = 2.0;

/// Everything one frame of the timeline depends on.
pub struct TimelineScene<'a> {
    pub spans: &'a SpanSet,
    pub rows: &'a RowLayout,
    pub viewport: &'a Viewport,
    pub config: &'a TimelineConfig,
    pub selected: Option<&'a SpanId>,
    pub hovered: Option<&'a SpanId>,
    /// In-progress or finished time-range selection, in seconds.
    pub range: Option<(f64, f64)>,
}

/// Render the Gantt timeline: worker blocks, status-colored bars, boundary
/// markers, the range overlay and the time axis on top.
pub fn render_timeline(scene: &TimelineScene<'_>) -> Vec<RenderCommand> {
    let vp = scene.viewport;
    if vp.is_empty() {
        return Vec::new();
    }

    let mut commands = Vec::with_capacity(scene.spans.len().min(4_096) + 64);

    commands.push(RenderCommand::BeginGroup {
        id: Arc::from("background"),
        label: None,
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, vp.width(), vp.height()),
        color: ThemeToken::Background,
        border_color: None,
        label: None,
        span_id: None,
    });
    commands.push(RenderCommand::EndGroup);

    render_worker_blocks(scene, &mut commands);

    let plot = Rect::new(
        vp.left_margin(),
        vp.axis_height(),
        vp.timeline_width(),
        (vp.height() - vp.axis_height()).max(0.0),
    );
    commands.push(RenderCommand::SetClip { rect: plot });
    render_bars(scene, &mut commands);
    commands.extend(render_markers(scene.spans, vp, scene.config.marker_min_spacing_px));
    if let Some((a, b)) = scene.range {
        let x0 = vp.time_to_screen_x(a.min(b));
        let x1 = vp.time_to_screen_x(a.max(b));
        commands.push(RenderCommand::BeginGroup {
            id: Arc::from("range-selection"),
            label: None,
        });
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x0, plot.y, x1 - x0, plot.h),
            color: ThemeToken::RangeSelection,
            border_color: None,
            label: None,
            span_id: None,
        });
        commands.push(RenderCommand::EndGroup);
    }
    commands.push(RenderCommand::ClearClip);

    commands.extend(render_time_axis(vp));
    commands
}

fn render_worker_blocks(scene: &TimelineScene<'_>, commands: &mut Vec<RenderCommand>) {
    let vp = scene.viewport;
    let rows = scene.rows.rows();
    let top = vp.axis_height();
    let bottom = vp.height();

    commands.push(RenderCommand::BeginGroup {
        id: Arc::from("workers"),
        label: None,
    });
    for (b, block) in scene.rows.blocks().iter().enumerate() {
        let y = vp.content_to_screen_y(block.y);
        if y + block.height < top || y > bottom {
            continue;
        }

        if b > 0 {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(0.0, y),
                to: Point::new(vp.width(), y),
                color: ThemeToken::WorkerSeparator,
                width: 1.0,
            });
        }
        if scene.rows.show_worker_labels() && block.header_height > 0.0 {
            commands.push(RenderCommand::DrawText {
                position: Point::new(4.0, y + block.header_height - 4.0),
                text: Arc::from(block.label()),
                color: ThemeToken::WorkerLabel,
                font_size: LABEL_FONT_SIZE,
                align: TextAlign::Left,
            });
        }

        for (i, row) in rows[block.rows.clone()].iter().enumerate() {
            let row_y = vp.content_to_screen_y(row.y);
            if row_y + row.height < top || row_y > bottom {
                continue;
            }
            let color = if i % 2 == 0 {
                ThemeToken::LaneBackground
            } else {
                ThemeToken::LaneBackgroundAlt
            };
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(vp.left_margin(), row_y, vp.timeline_width(), row.height),
                color,
                border_color: None,
                label: None,
                span_id: None,
            });
        }
    }
    commands.push(RenderCommand::EndGroup);
}

fn render_bars(scene: &TimelineScene<'_>, commands: &mut Vec<RenderCommand>) {
    let vp = scene.viewport;
    let spans = scene.spans;
    let horizon = spans.max_time();
    let (t0, t1) = vp.visible_time_range();
    let top = vp.axis_height();
    let bottom = vp.height();
    let bar_height = scene.config.lane_height;
    let min_width = scene.config.min_bar_width;

    commands.push(RenderCommand::BeginGroup {
        id: Arc::from("spans"),
        label: Some(Arc::from("Spans")),
    });
    for row in scene.rows.rows() {
        let y = vp.content_to_screen_y(row.y);
        if y + row.height < top || y > bottom {
            continue;
        }
        for &i in scene.rows.visible_in(row, spans, t0, t1, horizon) {
            let span = &spans.spans()[i];
            let x0 = vp.time_to_screen_x(span.start);
            let x1 = vp.time_to_screen_x(span.visible_end(horizon));
            let rect = Rect::new(x0, y, (x1 - x0).max(min_width), bar_height);

            let is_selected = scene.selected == Some(&span.id);
            let border = if is_selected {
                ThemeToken::SelectionHighlight
            } else if scene.hovered == Some(&span.id) {
                ThemeToken::HoverHighlight
            } else if span.is_open() {
                ThemeToken::OpenSpanBorder
            } else {
                ThemeToken::SpanBorder
            };

            if is_selected {
                commands.push(RenderCommand::DrawRect {
                    rect: rect.expand(GLOW_PX),
                    color: ThemeToken::SelectionGlow,
                    border_color: None,
                    label: None,
                    span_id: None,
                });
            }
            commands.push(RenderCommand::DrawRect {
                rect,
                color: span.status.theme_token(),
                border_color: Some(border),
                label: Some(span.name.clone()),
                span_id: Some(span.id.clone()),
            });
        }
    }
    commands.push(RenderCommand::EndGroup);
}

/// Index of the span drawn under the screen point, if any.
///
/// Bars narrower than `min_bar_width` are treated as that wide, matching
/// how they are drawn. The lane gap below each bar is not part of it.
pub fn hit_test(
    spans: &SpanSet,
    rows: &RowLayout,
    viewport: &Viewport,
    config: &TimelineConfig,
    x: f64,
    y: f64,
) -> Option<usize> {
    let left = viewport.left_margin();
    if viewport.is_empty()
        || x < left
        || x > left + viewport.timeline_width()
        || y < viewport.axis_height()
        || y > viewport.height()
    {
        return None;
    }

    let content_y = viewport.screen_to_content_y(y);
    let row = rows.row_at(content_y)?;
    if content_y - row.y > config.lane_height {
        return None;
    }
    let t = viewport.screen_x_to_time(x);
    let tolerance = config.min_bar_width / viewport.px_per_second();
    let horizon = spans.max_time();
    let all = spans.spans();

    let candidates = row.spans().partition_point(|&i| all[i].start <= t);
    row.spans()[..candidates]
        .iter()
        .rev()
        .take(2)
        .copied()
        .find(|&i| {
            let span = &all[i];
            span.visible_end(horizon).max(span.start + tolerance) >= t
        })
}
