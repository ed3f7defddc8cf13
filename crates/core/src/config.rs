use rf_timeline_protocol::StatusColors;
use serde::{Deserialize, Serialize};

/// Tunables for one timeline instance.
///
/// All fields default, so hosts may supply any subset (TOML, env, JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplicative zoom per 100 units of wheel delta.
    pub zoom_step: f64,
    /// Gutter left of the plotting area, holds worker labels.
    pub left_margin: f64,
    pub right_margin: f64,
    pub axis_height: f64,
    pub lane_height: f64,
    pub lane_gap: f64,
    pub worker_header_height: f64,
    /// Scale used when the dataset has no time range to fit.
    pub default_px_per_second: f64,
    /// Pointer travel below which a press/release counts as a click.
    pub click_tolerance_px: f64,
    pub min_bar_width: f64,
    pub marker_min_spacing_px: f64,
    /// Status fills supplied by the host's styling.
    pub colors: StatusColors,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 10_000.0,
            zoom_step: 1.2,
            left_margin: 120.0,
            right_margin: 20.0,
            axis_height: 24.0,
            lane_height: 18.0,
            lane_gap: 2.0,
            worker_header_height: 18.0,
            default_px_per_second: 100.0,
            click_tolerance_px: 4.0,
            min_bar_width: 1.0,
            marker_min_spacing_px: 2.0,
            colors: StatusColors::default(),
        }
    }
}

impl TimelineConfig {
    pub fn row_height(&self) -> f64 {
        self.lane_height + self.lane_gap
    }

    /// Copy with out-of-range values pulled back to something drawable.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        let non_negative = |v: f64, fallback: f64| if v.is_finite() && v >= 0.0 { v } else { fallback };

        let min_zoom = positive(self.min_zoom, defaults.min_zoom);
        let max_zoom = positive(self.max_zoom, defaults.max_zoom).max(min_zoom);
        Self {
            min_zoom,
            max_zoom,
            zoom_step: if self.zoom_step.is_finite() && self.zoom_step > 1.0 {
                self.zoom_step
            } else {
                defaults.zoom_step
            },
            left_margin: non_negative(self.left_margin, defaults.left_margin),
            right_margin: non_negative(self.right_margin, defaults.right_margin),
            axis_height: non_negative(self.axis_height, defaults.axis_height),
            lane_height: positive(self.lane_height, defaults.lane_height),
            lane_gap: non_negative(self.lane_gap, defaults.lane_gap),
            worker_header_height: non_negative(self.worker_header_height, defaults.worker_header_height),
            default_px_per_second: positive(self.default_px_per_second, defaults.default_px_per_second),
            click_tolerance_px: non_negative(self.click_tolerance_px, defaults.click_tolerance_px),
            min_bar_width: non_negative(self.min_bar_width, defaults.min_bar_width),
            marker_min_spacing_px: non_negative(self.marker_min_spacing_px, defaults.marker_min_spacing_px),
            colors: self.colors,
        }
    }

    /// Parse a JSON config; unknown keys are ignored, missing keys default.
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(data).map(|c| c.sanitized())
    }
}
