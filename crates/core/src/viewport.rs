//! Zoom/pan state and the time ↔ pixel mapping.
//!
//! Every offset the viewport derives (zoom pivot, centering, bound changes)
//! is recomputed from the target time and the current zoom alone. The
//! previous `pan_x` is never an input to those computations, which is what
//! keeps repeated centering from drifting.

use crate::config::TimelineConfig;
use crate::model::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    width: f64,
    height: f64,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
    min_time: f64,
    max_time: f64,
    /// Height of the rows below the axis; bounds vertical pan.
    content_height: f64,

    min_zoom: f64,
    max_zoom: f64,
    left_margin: f64,
    right_margin: f64,
    axis_height: f64,
    default_px_per_second: f64,
}

impl Viewport {
    pub fn new(config: &TimelineConfig, min_time: f64, max_time: f64, width: f64, height: f64) -> Self {
        let mut viewport = Self {
            width: width.max(0.0),
            height: height.max(0.0),
            zoom: 1.0_f64.max(config.min_zoom).min(config.max_zoom),
            pan_x: 0.0,
            pan_y: 0.0,
            min_time,
            max_time: max_time.max(min_time),
            content_height: 0.0,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            left_margin: config.left_margin,
            right_margin: config.right_margin,
            axis_height: config.axis_height,
            default_px_per_second: config.default_px_per_second,
        };
        viewport.clamp();
        viewport
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan_x(&self) -> f64 {
        self.pan_x
    }

    pub fn pan_y(&self) -> f64 {
        self.pan_y
    }

    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    pub fn left_margin(&self) -> f64 {
        self.left_margin
    }

    pub fn axis_height(&self) -> f64 {
        self.axis_height
    }

    /// Nothing can be drawn on a zero-area surface.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Width of the plotting area between the margins.
    pub fn timeline_width(&self) -> f64 {
        (self.width - self.left_margin - self.right_margin).max(0.0)
    }

    /// Screen x of the plotting area's horizontal center.
    pub fn center_x(&self) -> f64 {
        self.left_margin + self.timeline_width() / 2.0
    }

    /// Pixels per second at zoom 1: the whole dataset fits the plotting area.
    /// Degenerate datasets or surfaces fall back to a fixed scale.
    fn base_scale(&self) -> f64 {
        let range = self.max_time - self.min_time;
        let width = self.timeline_width();
        if range > 0.0 && range.is_finite() && width > 0.0 {
            width / range
        } else {
            self.default_px_per_second
        }
    }

    pub fn px_per_second(&self) -> f64 {
        self.base_scale() * self.zoom
    }

    /// Zoomed width of the dataset's extent.
    pub fn content_width(&self) -> f64 {
        (self.max_time - self.min_time) * self.px_per_second()
    }

    /// Screen x of `t` as if `pan_x` were zero.
    pub fn unpanned_x(&self, t: f64) -> f64 {
        self.left_margin + (t - self.min_time) * self.px_per_second()
    }

    pub fn time_to_screen_x(&self, t: f64) -> f64 {
        self.unpanned_x(t) + self.pan_x
    }

    pub fn screen_x_to_time(&self, x: f64) -> f64 {
        self.min_time + (x - self.pan_x - self.left_margin) / self.px_per_second()
    }

    /// Screen y of a content-space row coordinate.
    pub fn content_to_screen_y(&self, y: f64) -> f64 {
        self.axis_height + y + self.pan_y
    }

    pub fn screen_to_content_y(&self, y: f64) -> f64 {
        y - self.axis_height - self.pan_y
    }

    /// Time range currently covered by the plotting area.
    pub fn visible_time_range(&self) -> (f64, f64) {
        (
            self.screen_x_to_time(self.left_margin),
            self.screen_x_to_time(self.left_margin + self.timeline_width()),
        )
    }

    /// Zoom by `factor`, keeping the time under `pivot_x` fixed on screen.
    pub fn zoom_by(&mut self, factor: f64, pivot_x: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.set_zoom(self.zoom * factor, pivot_x);
    }

    pub fn set_zoom(&mut self, zoom: f64, pivot_x: f64) {
        if !zoom.is_finite() {
            return;
        }
        let pivot_time = self.screen_x_to_time(pivot_x);
        self.zoom = zoom.max(self.min_zoom).min(self.max_zoom);
        self.pan_x = pivot_x - self.unpanned_x(pivot_time);
        self.clamp();
    }

    /// Pan by a pointer delta in pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() {
            self.pan_x += dx;
        }
        if dy.is_finite() {
            self.pan_y += dy;
        }
        self.clamp();
    }

    /// Put `t` at the horizontal center of the plotting area.
    pub fn center_on_time(&mut self, t: f64) {
        if !t.is_finite() {
            return;
        }
        self.pan_x = self.center_x() - self.unpanned_x(t);
        self.clamp();
    }

    /// Center on a span's start, which is defined for open spans too.
    pub fn center_on(&mut self, span: &Span) {
        self.center_on_time(span.start);
    }

    /// Scroll vertically so a content-space row band is visible. Rows already
    /// on screen leave the pan untouched; others are centered.
    pub fn reveal_row(&mut self, row_y: f64, row_height: f64) {
        let band = self.rows_height();
        let top = row_y + self.pan_y;
        if top >= 0.0 && top + row_height <= band {
            return;
        }
        self.pan_y = (band - row_height) / 2.0 - row_y;
        self.clamp();
    }

    /// Zoom 1, dataset fitted to the plotting area, scrolled to the top.
    pub fn reset(&mut self) {
        self.zoom = 1.0_f64.max(self.min_zoom).min(self.max_zoom);
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.clamp();
    }

    /// Track a surface resize, keeping the time at the left edge in place.
    pub fn resize(&mut self, width: f64, height: f64) {
        let left_time = self.screen_x_to_time(self.left_margin);
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.pan_x = self.left_margin - self.unpanned_x(left_time);
        self.clamp();
    }

    /// Grow the time bounds to the union with `[min_time, max_time]`.
    /// Bounds never shrink; the time at the left edge stays in place.
    pub fn extend_bounds(&mut self, min_time: f64, max_time: f64) {
        let new_min = if min_time.is_finite() { self.min_time.min(min_time) } else { self.min_time };
        let new_max = if max_time.is_finite() { self.max_time.max(max_time) } else { self.max_time };
        if new_min == self.min_time && new_max == self.max_time {
            return;
        }
        let left_time = self.screen_x_to_time(self.left_margin);
        self.min_time = new_min;
        self.max_time = new_max;
        self.pan_x = self.left_margin - self.unpanned_x(left_time);
        self.clamp();
    }

    pub fn set_content_height(&mut self, content_height: f64) {
        self.content_height = content_height.max(0.0);
        self.clamp();
    }

    /// Height available to rows below the axis.
    fn rows_height(&self) -> f64 {
        (self.height - self.axis_height).max(0.0)
    }

    /// `pan_x` after applying the horizontal bounds to `pan_x`.
    pub fn clamped_pan_x(&self, pan_x: f64) -> f64 {
        let view = self.timeline_width();
        let content = self.content_width();
        if content <= view {
            (view - content) / 2.0
        } else if pan_x.is_finite() {
            pan_x.clamp(view - content, 0.0)
        } else {
            0.0
        }
    }

    pub fn clamped_pan_y(&self, pan_y: f64) -> f64 {
        let band = self.rows_height();
        if self.content_height <= band {
            0.0
        } else if pan_y.is_finite() {
            pan_y.clamp(band - self.content_height, 0.0)
        } else {
            0.0
        }
    }

    fn clamp(&mut self) {
        self.pan_x = self.clamped_pan_x(self.pan_x);
        self.pan_y = self.clamped_pan_y(self.pan_y);
    }
}
