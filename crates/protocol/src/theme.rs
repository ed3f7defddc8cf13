use serde::{Deserialize, Serialize};

use crate::types::Color;

/// Semantic color tokens resolved by the host's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    // Span status fills, taken from host styling via `StatusColors`.
    StatusPass,
    StatusFail,
    StatusSkip,
    StatusNotRun,

    SpanBorder,
    OpenSpanBorder,

    LaneBackground,
    LaneBackgroundAlt,
    LaneBorder,

    WorkerSeparator,
    WorkerLabel,

    AxisBackground,
    AxisTick,

    TextPrimary,
    TextMuted,

    SuiteMarker,
    TestMarker,

    SelectionHighlight,
    SelectionGlow,
    HoverHighlight,
    RangeSelection,

    Background,
}

/// The four status colors the engine reads from the hosting surface.
///
/// Everything else about styling stays with the host; only these are
/// configurable because they carry meaning (pass/fail at a glance).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusColors {
    pub pass: Color,
    pub fail: Color,
    pub skip: Color,
    pub not_run: Color,
}

impl Default for StatusColors {
    fn default() -> Self {
        Self {
            pass: Color::from_hex(0x4caf50),
            fail: Color::from_hex(0xe53935),
            skip: Color::from_hex(0xfbc02d),
            not_run: Color::from_hex(0x9e9e9e),
        }
    }
}

impl StatusColors {
    /// Host color for a status token, `None` for every other token.
    pub fn resolve(&self, token: ThemeToken) -> Option<Color> {
        match token {
            ThemeToken::StatusPass => Some(self.pass),
            ThemeToken::StatusFail => Some(self.fail),
            ThemeToken::StatusSkip => Some(self.skip),
            ThemeToken::StatusNotRun => Some(self.not_run),
            _ => None,
        }
    }
}
