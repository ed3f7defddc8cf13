//! Replays engine render commands onto a terminal cell buffer.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use rf_timeline_protocol::{RenderCommand, StatusColors, TextAlign, ThemeToken};

/// Surface pixels covered by one terminal cell.
pub const CELL_WIDTH: f64 = 8.0;
pub const CELL_HEIGHT: f64 = 20.0;

fn theme_to_color(token: ThemeToken, colors: &StatusColors) -> Color {
    if let Some(c) = colors.resolve(token) {
        let (r, g, b) = c.to_rgb8();
        return Color::Rgb(r, g, b);
    }
    match token {
        ThemeToken::SpanBorder => Color::Black,
        ThemeToken::OpenSpanBorder => Color::Cyan,
        ThemeToken::LaneBackground => Color::Black,
        ThemeToken::LaneBackgroundAlt => Color::Rgb(20, 20, 20),
        ThemeToken::LaneBorder => Color::DarkGray,
        ThemeToken::WorkerSeparator => Color::Gray,
        ThemeToken::WorkerLabel => Color::White,
        ThemeToken::AxisBackground => Color::Rgb(30, 30, 30),
        ThemeToken::AxisTick => Color::DarkGray,
        ThemeToken::TextPrimary => Color::White,
        ThemeToken::TextMuted => Color::DarkGray,
        ThemeToken::SuiteMarker => Color::Yellow,
        ThemeToken::TestMarker => Color::Magenta,
        ThemeToken::SelectionHighlight => Color::LightYellow,
        ThemeToken::SelectionGlow => Color::Yellow,
        ThemeToken::HoverHighlight => Color::LightBlue,
        ThemeToken::RangeSelection => Color::Rgb(40, 60, 110),
        ThemeToken::Background => Color::Black,
        ThemeToken::StatusPass | ThemeToken::StatusFail | ThemeToken::StatusSkip | ThemeToken::StatusNotRun => {
            Color::Gray
        }
    }
}

fn col(x: f64) -> i64 {
    (x / CELL_WIDTH).floor() as i64
}

fn row(y: f64) -> i64 {
    (y / CELL_HEIGHT).floor() as i64
}

/// Cell-space painter bounded by the pane area and the active clip.
struct Painter<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    clip: Rect,
}

impl Painter<'_> {
    /// Buffer position of a pane-relative cell, if it is inside the clip.
    fn cell(&self, c: i64, r: i64) -> Option<(u16, u16)> {
        let x = i64::from(self.area.x) + c;
        let y = i64::from(self.area.y) + r;
        let inside = x >= i64::from(self.clip.x)
            && x < i64::from(self.clip.right())
            && y >= i64::from(self.clip.y)
            && y < i64::from(self.clip.bottom());
        inside.then(|| (x as u16, y as u16))
    }

    fn set_clip(&mut self, rect: &rf_timeline_protocol::Rect) {
        let (c0, r0) = (col(rect.x), row(rect.y));
        let (c1, r1) = (col(rect.right()).max(c0), row(rect.bottom()).max(r0));
        let to_u16 = |v: i64| v.clamp(0, i64::from(u16::MAX)) as u16;
        let clip = Rect::new(
            self.area.x.saturating_add(to_u16(c0)),
            self.area.y.saturating_add(to_u16(r0)),
            to_u16(c1 - c0),
            to_u16(r1 - r0),
        );
        self.clip = clip.intersection(self.area);
    }

    fn fill(&mut self, rect: &rf_timeline_protocol::Rect, bg: Color) {
        let (c0, r0) = (col(rect.x), row(rect.y));
        let c1 = (rect.right() / CELL_WIDTH).ceil() as i64;
        let r1 = (rect.bottom() / CELL_HEIGHT).ceil() as i64;
        for r in r0..r1.max(r0 + 1) {
            for c in c0..c1.max(c0 + 1) {
                if let Some(pos) = self.cell(c, r) {
                    self.buf[pos].set_char(' ').set_bg(bg);
                }
            }
        }
    }

    fn text(&mut self, c: i64, r: i64, text: &str, fg: Color, max: usize) {
        for (i, ch) in text.chars().take(max).enumerate() {
            if let Some(pos) = self.cell(c + i as i64, r) {
                self.buf[pos].set_char(ch).set_fg(fg);
            }
        }
    }
}

/// Paint `commands` (in surface pixels) into `area` of `buf`.
pub fn paint(commands: &[RenderCommand], area: Rect, buf: &mut Buffer, colors: &StatusColors) {
    let mut painter = Painter { buf, area, clip: area };
    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
                span_id,
            } => {
                // The glow is wider than the bar by less than a cell.
                if *color == ThemeToken::SelectionGlow {
                    continue;
                }
                painter.fill(rect, theme_to_color(*color, colors));
                if span_id.is_none() {
                    continue;
                }
                let (c0, r0) = (col(rect.x), row(rect.y));
                let width = ((rect.right() / CELL_WIDTH).ceil() as i64 - c0).max(1) as usize;
                let emphasis = matches!(
                    border_color,
                    Some(ThemeToken::SelectionHighlight | ThemeToken::HoverHighlight)
                );
                if let Some(label) = label
                    && width > 2
                {
                    painter.text(c0, r0, label, Color::Black, width);
                }
                if emphasis {
                    for c in c0..c0 + width as i64 {
                        if let Some(pos) = painter.cell(c, r0) {
                            painter.buf[pos].set_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD));
                        }
                    }
                } else if *border_color == Some(ThemeToken::OpenSpanBorder)
                    && let Some(pos) = painter.cell(c0 + width as i64 - 1, r0)
                {
                    painter.buf[pos].set_char('▶').set_fg(theme_to_color(ThemeToken::OpenSpanBorder, colors));
                }
            }
            RenderCommand::DrawLine { from, to, color, .. } => {
                let fg = theme_to_color(*color, colors);
                if (from.x - to.x).abs() < CELL_WIDTH / 2.0 {
                    let c = col(from.x);
                    for r in row(from.y.min(to.y))..=row(from.y.max(to.y) - 0.5) {
                        if let Some(pos) = painter.cell(c, r) {
                            painter.buf[pos].set_char('│').set_fg(fg);
                        }
                    }
                } else {
                    let r = row(from.y);
                    for c in col(from.x.min(to.x))..=col(from.x.max(to.x) - 0.5) {
                        if let Some(pos) = painter.cell(c, r) {
                            painter.buf[pos].set_char('─').set_fg(fg);
                        }
                    }
                }
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                align,
                ..
            } => {
                let len = text.chars().count() as i64;
                let start = match align {
                    TextAlign::Left => col(position.x),
                    TextAlign::Center => col(position.x) - len / 2,
                    TextAlign::Right => col(position.x) - len,
                };
                // Text is positioned by its baseline.
                painter.text(start, row(position.y - 1.0), text, theme_to_color(*color, colors), usize::MAX);
            }
            RenderCommand::SetClip { rect } => painter.set_clip(rect),
            RenderCommand::ClearClip => painter.clip = area,
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
}
