//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use rf_timeline_protocol::{RenderCommand, StatusColors, TextAlign, ThemeToken};

/// Render a list of commands as an SVG document string.
///
/// Status fills come from `colors`; every other token uses the built-in
/// light or dark palette.
pub fn render_svg(
    commands: &[RenderCommand],
    width: f64,
    height: f64,
    colors: &StatusColors,
    dark: bool,
) -> String {
    let mut svg = String::with_capacity(commands.len() * 160);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:system-ui,-apple-system,sans-serif;font-size:11px">"#,
    ));

    let mut clip_count = 0usize;
    let mut clip_open = false;
    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
                span_id,
            } => {
                let fill = resolve_color(*color, colors, dark);
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}""#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
                if *color == ThemeToken::SelectionGlow || *color == ThemeToken::RangeSelection {
                    svg.push_str(r#" fill-opacity="0.35""#);
                }
                if let Some(border) = border_color {
                    svg.push_str(&format!(r#" stroke="{}" stroke-width="1""#, resolve_color(*border, colors, dark)));
                }
                if let Some(id) = span_id {
                    svg.push_str(&format!(r#" data-span-id="{}""#, escape_xml(id.as_str())));
                }
                svg.push('>');
                if let Some(label) = label {
                    svg.push_str(&format!("<title>{}</title>", escape_xml(label)));
                }
                svg.push_str("</rect>");

                // Inline label when the bar is wide enough.
                if let Some(label) = label
                    && span_id.is_some()
                    && rect.w > 30.0
                {
                    let text_color = resolve_color(ThemeToken::TextPrimary, colors, dark);
                    let max_chars = (rect.w / 7.0) as usize;
                    let text = if label.chars().count() > max_chars && max_chars > 2 {
                        let truncated: String = label.chars().take(max_chars - 1).collect();
                        format!("{truncated}…")
                    } else {
                        label.to_string()
                    };
                    svg.push_str(&format!(
                        r#"<text x="{}" y="{}" fill="{text_color}" style="pointer-events:none">{}</text>"#,
                        rect.x + 3.0,
                        rect.y + rect.h * 0.75,
                        escape_xml(&text),
                    ));
                }
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
            } => {
                let stroke = resolve_color(*color, colors, dark);
                svg.push_str(&format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{stroke}" stroke-width="{line_width}"/>"#,
                    from.x, from.y, to.x, to.y,
                ));
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                font_size,
                align,
            } => {
                let fill = resolve_color(*color, colors, dark);
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" fill="{fill}" font-size="{font_size}" text-anchor="{anchor}">{}</text>"#,
                    position.x,
                    position.y,
                    escape_xml(text),
                ));
            }
            RenderCommand::SetClip { rect } => {
                if clip_open {
                    svg.push_str("</g>");
                }
                clip_count += 1;
                svg.push_str(&format!(
                    r#"<clipPath id="clip{clip_count}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath><g clip-path="url(#clip{clip_count})">"#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
                clip_open = true;
            }
            RenderCommand::ClearClip => {
                if clip_open {
                    svg.push_str("</g>");
                    clip_open = false;
                }
            }
            // Groups carry no visual meaning in a static document.
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
    if clip_open {
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

fn resolve_color(token: ThemeToken, colors: &StatusColors, dark: bool) -> String {
    if let Some(color) = colors.resolve(token) {
        return color.to_hex();
    }
    let hex = if dark {
        match token {
            ThemeToken::Background => "#181818",
            ThemeToken::LaneBackground => "#1e1e1e",
            ThemeToken::LaneBackgroundAlt => "#242424",
            ThemeToken::LaneBorder | ThemeToken::SpanBorder => "#303030",
            ThemeToken::WorkerSeparator => "#616161",
            ThemeToken::AxisBackground => "#202020",
            ThemeToken::AxisTick | ThemeToken::TextMuted => "#9e9e9e",
            ThemeToken::TextPrimary | ThemeToken::WorkerLabel => "#ececec",
            ThemeToken::OpenSpanBorder => "#80deea",
            ThemeToken::SuiteMarker => "#ffd600",
            ThemeToken::TestMarker => "#7e57c2",
            ThemeToken::SelectionHighlight | ThemeToken::HoverHighlight => "#448aff",
            ThemeToken::SelectionGlow | ThemeToken::RangeSelection => "#82b1ff",
            _ => "#616161",
        }
    } else {
        match token {
            ThemeToken::Background => "#ffffff",
            ThemeToken::LaneBackground => "#f8f9fa",
            ThemeToken::LaneBackgroundAlt => "#f1f3f5",
            ThemeToken::LaneBorder | ThemeToken::SpanBorder => "#dee2e6",
            ThemeToken::WorkerSeparator => "#adb5bd",
            ThemeToken::AxisBackground => "#f1f3f5",
            ThemeToken::AxisTick | ThemeToken::TextMuted => "#666677",
            ThemeToken::TextPrimary | ThemeToken::WorkerLabel => "#1a1a2e",
            ThemeToken::OpenSpanBorder => "#00838f",
            ThemeToken::SuiteMarker => "#e67e22",
            ThemeToken::TestMarker => "#8e44ad",
            ThemeToken::SelectionHighlight | ThemeToken::HoverHighlight => "#ffb300",
            ThemeToken::SelectionGlow | ThemeToken::RangeSelection => "#ffd60a",
            _ => "#999999",
        }
    };
    hex.to_string()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_timeline_protocol::{Color, Point, Rect, SpanId};

    fn bar(label: &str) -> RenderCommand {
        RenderCommand::DrawRect {
            rect: Rect::new(10.0, 20.0, 100.0, 18.0),
            color: ThemeToken::StatusFail,
            border_color: Some(ThemeToken::SpanBorder),
            label: Some(label.into()),
            span_id: Some(SpanId::from("s1-t1")),
        }
    }

    #[test]
    fn status_fill_comes_from_host_colors() {
        let colors = StatusColors {
            fail: Color::from_hex(0x123456),
            ..StatusColors::default()
        };
        let svg = render_svg(&[bar("Login fails")], 800.0, 400.0, &colors, true);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("#123456"));
        assert!(svg.contains(r#"data-span-id="s1-t1""#));
        assert!(svg.contains("Login fails"));
    }

    #[test]
    fn escapes_xml_entities() {
        let svg = render_svg(&[bar("Should Be <Equal> & ok")], 400.0, 100.0, &StatusColors::default(), false);
        assert!(svg.contains("Should Be &lt;Equal&gt; &amp; ok"));
    }

    #[test]
    fn clip_regions_are_balanced() {
        let commands = vec![
            RenderCommand::SetClip {
                rect: Rect::new(0.0, 0.0, 50.0, 50.0),
            },
            bar("inside"),
            RenderCommand::ClearClip,
            RenderCommand::SetClip {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            },
        ];
        let svg = render_svg(&commands, 100.0, 100.0, &StatusColors::default(), false);
        assert_eq!(svg.matches("<g ").count(), svg.matches("</g>").count());
        assert!(svg.contains(r##"clip-path="url(#clip2)""##));
    }

    #[test]
    fn lines_and_text_become_svg_elements() {
        let commands = vec![
            RenderCommand::DrawLine {
                from: Point::new(5.0, 0.0),
                to: Point::new(5.0, 40.0),
                color: ThemeToken::SuiteMarker,
                width: 1.0,
            },
            RenderCommand::DrawText {
                text: "2s".into(),
                position: Point::new(90.0, 16.0),
                color: ThemeToken::TextMuted,
                font_size: 10.0,
                align: TextAlign::Right,
            },
        ];
        let svg = render_svg(&commands, 100.0, 50.0, &StatusColors::default(), false);
        assert!(svg.contains(r##"<line x1="5" y1="0" x2="5" y2="40" stroke="#e67e22" stroke-width="1"/>"##));
        assert!(svg.contains(r##"<text x="90" y="16" fill="#666677" font-size="10" text-anchor="end">2s</text>"##));
    }
}
