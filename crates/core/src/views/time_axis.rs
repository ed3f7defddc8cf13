use std::sync::Arc;

use rf_timeline_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken};

use crate::viewport::Viewport;

const MAJOR_TICK_HEIGHT: f64 = 10.0;
const MINOR_TICK_HEIGHT: f64 = 4.0;
const FONT_SIZE: f64 = 10.0;
const MIN_MAJOR_SPACING_PX: f64 = 80.0;
/// Upper bound on ticks per frame, whatever the zoom.
const MAX_TICKS: i64 = 2_000;

/// Render the time axis strip along the top of the surface.
///
/// Ticks are placed at multiples of a "nice" interval measured from the
/// dataset start, so labels read as offsets into the run.
pub fn render_time_axis(viewport: &Viewport) -> Vec<RenderCommand> {
    let axis_height = viewport.axis_height();
    let timeline_width = viewport.timeline_width();
    if viewport.is_empty() || axis_height <= 0.0 || timeline_width <= 0.0 {
        return Vec::new();
    }

    let mut commands = Vec::with_capacity(64);
    commands.push(RenderCommand::BeginGroup {
        id: Arc::from("time-axis"),
        label: None,
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, viewport.width(), axis_height),
        color: ThemeToken::AxisBackground,
        border_color: Some(ThemeToken::LaneBorder),
        label: None,
        span_id: None,
    });

    let left = viewport.left_margin();
    let right = left + timeline_width;
    let (t0, t1) = viewport.visible_time_range();
    let origin = viewport.min_time();
    let (major, subdivisions) = nice_interval(t1 - t0, timeline_width);
    let minor = major / f64::from(subdivisions);

    let first = ((t0 - origin) / minor).ceil() as i64;
    let last = ((t1 - origin) / minor).floor() as i64;
    for k in first..=last.min(first + MAX_TICKS) {
        let offset = k as f64 * minor;
        let x = viewport.time_to_screen_x(origin + offset);
        if x < left || x > right {
            continue;
        }
        if k.rem_euclid(i64::from(subdivisions)) != 0 {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(x, axis_height - MINOR_TICK_HEIGHT),
                to: Point::new(x, axis_height),
                color: ThemeToken::AxisTick,
                width: 0.5,
            });
            continue;
        }

        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, axis_height - MAJOR_TICK_HEIGHT),
            to: Point::new(x, axis_height),
            color: ThemeToken::AxisTick,
            width: 1.0,
        });
        commands.push(RenderCommand::DrawText {
            position: Point::new(x + 3.0, axis_height - MAJOR_TICK_HEIGHT - 2.0),
            text: Arc::from(format_offset(offset, major)),
            color: ThemeToken::TextPrimary,
            font_size: FONT_SIZE,
            align: TextAlign::Left,
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

/// Choose a major tick interval in seconds for `duration` seconds spread over
/// `width_px`. Returns (major_interval, subdivisions).
pub(crate) fn nice_interval(duration: f64, width_px: f64) -> (f64, u32) {
    let target_count = (width_px / MIN_MAJOR_SPACING_PX).max(2.0);
    let raw = duration / target_count;
    if !raw.is_finite() || raw <= 0.0 {
        return (1.0, 2);
    }

    if raw <= 10.0 {
        // 1-2-5 progression
        let magnitude = 10.0_f64.powf(raw.log10().floor());
        for (step, subdivisions) in [(1.0, 2), (2.0, 2), (5.0, 5), (10.0, 2)] {
            let interval = step * magnitude;
            if interval >= raw {
                return (interval, subdivisions);
            }
        }
        return (10.0 * magnitude, 2);
    }

    let minute_steps: &[(f64, u32)] = &[
        (20.0, 2),
        (30.0, 3),
        (60.0, 2),
        (120.0, 2),
        (300.0, 5),
        (600.0, 2),
        (900.0, 3),
        (1_800.0, 3),
        (3_600.0, 2),
    ];
    for &(interval, subdivisions) in minute_steps {
        if interval >= raw {
            return (interval, subdivisions);
        }
    }
    ((raw / 3_600.0).ceil() * 3_600.0, 2)
}

/// Format an offset from the dataset start, e.g. `850ms`, `1.250s`, `2m05s`.
pub(crate) fn format_offset(seconds: f64, interval: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let abs = seconds.abs();
    if abs < 1e-12 {
        return "0s".into();
    }
    if abs >= 60.0 {
        if interval >= 1.0 {
            let total = abs.round() as u64;
            format!("{sign}{}m{:02}s", total / 60, total % 60)
        } else {
            let mins = (abs / 60.0).floor();
            format!("{sign}{}m{:06.3}s", mins as u64, abs - mins * 60.0)
        }
    } else if abs >= 1.0 {
        format!("{sign}{abs:.3}s")
    } else if interval >= 0.001 {
        format!("{sign}{:.0}ms", abs * 1_000.0)
    } else {
        format!("{sign}{:.3}ms", abs * 1_000.0)
    }
}
