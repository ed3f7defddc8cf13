use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ids::SpanId;
use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// The engine emits a `Vec<RenderCommand>` per frame. Hosts replay the list
/// in order; each command carries everything it needs, so a host never has
/// to look back into the span set to paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderCommand {
    /// Draw a filled rectangle, optionally with a text label and the span it
    /// represents (hosts may use it for tooltips or accessibility hooks).
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
        label: Option<Arc<str>>,
        span_id: Option<SpanId>,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: Arc<str>,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Draw a line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: ThemeToken,
        width: f64,
    },

    /// Restrict subsequent drawing to a rectangular region.
    SetClip { rect: Rect },

    /// Remove the active clip region.
    ClearClip,

    /// Begin a logical group (axis, worker block, bars). Hosts may use this
    /// for layering or input routing.
    BeginGroup {
        id: Arc<str>,
        label: Option<Arc<str>>,
    },

    /// End the current group.
    EndGroup,
}

impl RenderCommand {
    /// Span carried by a `DrawRect`, if any.
    pub fn span_id(&self) -> Option<&SpanId> {
        match self {
            Self::DrawRect { span_id, .. } => span_id.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_op_tag() {
        let cmd = RenderCommand::DrawLine {
            from: Point::new(0.0, 0.0),
            to: Point::new(0.0, 10.0),
            color: ThemeToken::SuiteMarker,
            width: 1.0,
        };
        let json = serde_json::to_string(&cmd).unwrap_or_default();
        assert!(json.contains(r#""op":"draw_line""#), "{json}");
    }

    #[test]
    fn span_id_only_on_rects() {
        let rect = RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, 5.0, 5.0),
            color: ThemeToken::StatusPass,
            border_color: None,
            label: None,
            span_id: Some(SpanId::from("k1")),
        };
        assert_eq!(rect.span_id().map(SpanId::as_str), Some("k1"));
        assert!(RenderCommand::ClearClip.span_id().is_none());
    }
}
