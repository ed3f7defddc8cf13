//! Interactive viewer: tree pane and timeline pane sharing one engine.

use std::cell::RefCell;
use std::io::stdout;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span as TextSpan};
use ratatui::widgets::{Block, Borders, Paragraph};
use rf_timeline_core::gesture::InputEvent;
use rf_timeline_core::model::Status;
use rf_timeline_core::{LiveFeed, TimelineConfig, TimelineEngine, TimelineEvent, Transport};

use crate::renderer::{self, CELL_HEIGHT, CELL_WIDTH};
use crate::tree::TreePane;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tree,
    Timeline,
}

/// Live-mode state: the transport, its pending-model slot and the cadence.
pub struct Live {
    transport: Box<dyn Transport>,
    feed: LiveFeed,
    interval: Duration,
    next_poll: Instant,
}

impl Live {
    pub fn new(transport: Box<dyn Transport>, interval: Duration) -> Self {
        Self {
            transport,
            feed: LiveFeed::new(),
            interval,
            next_poll: Instant::now() + interval,
        }
    }
}

pub struct App {
    engine: TimelineEngine,
    tree: Rc<RefCell<TreePane>>,
    focus: Focus,
    live: Option<Live>,
    tree_width: u16,
    timeline_area: Rect,
    status: Rc<RefCell<String>>,
    quit: bool,
}

/// Snap vertical metrics to whole cells so every row lands on its own line.
pub fn terminal_config(config: &TimelineConfig) -> TimelineConfig {
    TimelineConfig {
        axis_height: CELL_HEIGHT,
        lane_height: CELL_HEIGHT,
        lane_gap: 0.0,
        worker_header_height: CELL_HEIGHT,
        min_bar_width: CELL_WIDTH,
        marker_min_spacing_px: CELL_WIDTH,
        click_tolerance_px: CELL_WIDTH / 2.0,
        ..config.clone()
    }
}

impl App {
    pub fn new(mut engine: TimelineEngine, tree_width: u16, live: Option<Live>) -> Self {
        let tree = Rc::new(RefCell::new(TreePane::new(engine.spans())));
        engine.connect_tree_view(Rc::clone(&tree));
        let status = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&status);
        engine.subscribe(move |event| {
            if let TimelineEvent::TimeRangeSelected { start, end } = event {
                *sink.borrow_mut() = format!("range {:.3}s", end - start);
            }
        });
        Self {
            engine,
            tree,
            focus: Focus::Tree,
            live,
            tree_width,
            timeline_area: Rect::default(),
            status,
            quit: false,
        }
    }

    pub fn engine(&self) -> &TimelineEngine {
        &self.engine
    }

    pub fn tree(&self) -> &Rc<RefCell<TreePane>> {
        &self.tree
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Split the terminal and resize the engine to the timeline pane.
    pub fn layout(&mut self, area: Rect) -> (Rect, Rect, Rect, Rect) {
        let [header, body, footer] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)]).areas(area);
        let [tree, timeline] =
            Layout::horizontal([Constraint::Length(self.tree_width), Constraint::Min(1)]).areas(body);
        if timeline != self.timeline_area {
            self.timeline_area = timeline;
            self.engine.resize(
                f64::from(timeline.width) * CELL_WIDTH,
                f64::from(timeline.height) * CELL_HEIGHT,
            );
        }
        (header, tree, timeline, footer)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Tree => Focus::Timeline,
                    Focus::Timeline => Focus::Tree,
                };
            }
            KeyCode::Char('0') => self.engine.reset_view(),
            _ => match self.focus {
                Focus::Tree => self.tree_key(key.code),
                Focus::Timeline => self.timeline_key(key.code),
            },
        }
    }

    fn tree_key(&mut self, code: KeyCode) {
        let mut tree = self.tree.borrow_mut();
        match code {
            KeyCode::Up | KeyCode::Char('k') => tree.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => tree.move_cursor(1),
            KeyCode::PageUp => tree.move_cursor(-10),
            KeyCode::PageDown => tree.move_cursor(10),
            KeyCode::Left | KeyCode::Char('h') => tree.collapse_or_parent(),
            KeyCode::Right | KeyCode::Char('l') => tree.expand(),
            KeyCode::Char(' ') => tree.toggle(),
            KeyCode::Enter => {
                let Some(id) = tree.cursor().cloned() else {
                    return;
                };
                drop(tree);
                self.engine.highlight_span(id.as_str());
            }
            _ => {}
        }
    }

    fn timeline_key(&mut self, code: KeyCode) {
        let step = CELL_WIDTH * 8.0;
        let pivot = self.engine.viewport().center_x();
        let zoom = self.engine.config().zoom_step;
        match code {
            KeyCode::Left | KeyCode::Char('h') => self.engine.pan_by(step, 0.0),
            KeyCode::Right | KeyCode::Char('l') => self.engine.pan_by(-step, 0.0),
            KeyCode::Up | KeyCode::Char('k') => self.engine.pan_by(0.0, CELL_HEIGHT),
            KeyCode::Down | KeyCode::Char('j') => self.engine.pan_by(0.0, -CELL_HEIGHT),
            KeyCode::Char('+' | '=') => self.engine.zoom_by(zoom, pivot),
            KeyCode::Char('-') => self.engine.zoom_by(1.0 / zoom, pivot),
            KeyCode::Char('c') => self.engine.clear_selection(),
            _ => {}
        }
    }

    /// Translate a mouse event over the timeline pane into engine input.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let at = Position::new(mouse.column, mouse.row);
        let area = self.timeline_area;
        if !area.contains(at) {
            if matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                self.engine.handle_input(InputEvent::PointerLeave);
            }
            return;
        }
        self.focus = Focus::Timeline;
        let x = f64::from(mouse.column - area.x) * CELL_WIDTH + CELL_WIDTH / 2.0;
        let y = f64::from(mouse.row - area.y) * CELL_HEIGHT + CELL_HEIGHT / 2.0;
        let shift = mouse.modifiers.contains(KeyModifiers::SHIFT);
        let input = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => InputEvent::PointerDown { x, y, shift },
            MouseEventKind::Up(MouseButton::Left) => InputEvent::PointerUp { x, y },
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => InputEvent::PointerMove { x, y },
            MouseEventKind::ScrollUp => wheel(x, y, 0.0, -100.0, shift),
            MouseEventKind::ScrollDown => wheel(x, y, 0.0, 100.0, shift),
            MouseEventKind::ScrollLeft => wheel(x, y, -CELL_WIDTH * 4.0, 0.0, false),
            MouseEventKind::ScrollRight => wheel(x, y, CELL_WIDTH * 4.0, 0.0, false),
            _ => return,
        };
        self.engine.handle_input(input);
    }

    /// Poll the live transport when due and apply the newest model.
    pub fn tick(&mut self, now: Instant) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if now < live.next_poll {
            return;
        }
        live.next_poll = now + live.interval;
        live.feed.pump(live.transport.as_mut());
        if let Some(model) = live.feed.take() {
            let stats = self.engine.refresh(&model);
            self.tree.borrow_mut().rebuild(self.engine.spans());
            *self.status.borrow_mut() = format!(
                "refreshed: {} closed, {} new, {} dropped",
                stats.closed, stats.appended, stats.dropped
            );
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let (header, tree_area, timeline_area, footer) = self.layout(frame.area());
        let state = self.engine.debug_state();

        let live = if self.live.is_some() { " | live" } else { "" };
        let title = format!(
            " {} | {} spans, {} workers{live} | Tab focus | +/- zoom | 0 reset | q quit ",
            self.engine.title(),
            state.span_count,
            state.worker_count,
        );
        frame.render_widget(
            Paragraph::new(title).style(Style::default().fg(Color::White).bg(Color::DarkGray)),
            header,
        );

        self.draw_tree(frame, tree_area);

        let commands = self.engine.render();
        renderer::paint(&commands, timeline_area, frame.buffer_mut(), &self.engine.config().colors);

        let selected = self
            .engine
            .selected_span()
            .and_then(|id| self.engine.spans().get(id.as_str()))
            .map(|s| match s.duration() {
                Some(d) => format!("{} [{}] {:.3}s", s.name, s.status, d),
                None => format!("{} [{}] running", s.name, s.status),
            })
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(format!(" {selected}  {}", self.status.borrow())).style(Style::default().fg(Color::Gray)),
            footer,
        );
    }

    fn draw_tree(&self, frame: &mut Frame, area: Rect) {
        let border = if self.focus == Focus::Tree { Color::White } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let tree = self.tree.borrow();
        let lines = tree.visible();
        let cursor = tree.cursor_line(&lines);
        let height = usize::from(inner.height);
        let first = cursor.map_or(0, |c| c.saturating_sub(height.saturating_sub(1)));
        let colors = &self.engine.config().colors;

        let rendered: Vec<Line> = lines
            .iter()
            .enumerate()
            .skip(first)
            .take(height)
            .map(|(i, line)| {
                let marker = match (line.has_children, line.expanded) {
                    (false, _) => "  ",
                    (true, true) => "▾ ",
                    (true, false) => "▸ ",
                };
                let status = match line.status {
                    Status::Pass => colors.pass,
                    Status::Fail => colors.fail,
                    Status::Skip => colors.skip,
                    Status::NotRun => colors.not_run,
                };
                let (r, g, b) = status.to_rgb8();
                let mut style = Style::default();
                if Some(i) == cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Line::from(vec![
                    TextSpan::raw(" ".repeat(line.depth * 2)),
                    TextSpan::raw(marker),
                    TextSpan::styled(if line.open { "◌ " } else { "● " }, Style::default().fg(Color::Rgb(r, g, b))),
                    TextSpan::styled(line.name.to_string(), style),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(rendered), inner);
    }

    /// Run the event loop until the user quits.
    pub fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
        while !self.quit {
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
            self.tick(Instant::now());
        }
        Ok(())
    }
}

fn wheel(x: f64, y: f64, delta_x: f64, delta_y: f64, shift: bool) -> InputEvent {
    InputEvent::Wheel {
        x,
        y,
        delta_x,
        delta_y,
        shift,
    }
}
