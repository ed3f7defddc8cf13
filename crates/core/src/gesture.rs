//! Pointer/wheel gesture routing.
//!
//! [`GestureState`] turns raw host input into pixel-space actions. It knows
//! nothing about spans or time; the engine hit-tests and converts.

use serde::{Deserialize, Serialize};

/// Host input, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, shift: bool },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    PointerLeave,
    Wheel {
        x: f64,
        y: f64,
        delta_x: f64,
        delta_y: f64,
        shift: bool,
    },
    Resize { width: f64, height: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    Pan { dx: f64, dy: f64 },
    Zoom { factor: f64, pivot_x: f64 },
    Hover { x: f64, y: f64 },
    ClearHover,
    Click { x: f64, y: f64 },
    /// Range selection in progress between two screen x positions.
    RangeUpdate { from_x: f64, to_x: f64 },
    RangeFinish { from_x: f64, to_x: f64 },
    RangeCancel,
    Resize { width: f64, height: f64 },
}

#[derive(Debug, Clone, Default)]
pub struct GestureState {
    is_dragging: bool,
    is_selecting: bool,
    press: Option<(f64, f64)>,
    last: (f64, f64),
    /// Farthest distance from the press point during this gesture.
    travel: f64,
}

impl GestureState {
    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    pub fn is_selecting(&self) -> bool {
        self.is_selecting
    }

    pub fn handle(&mut self, event: &InputEvent, click_tolerance: f64, zoom_step: f64) -> Vec<GestureAction> {
        match *event {
            InputEvent::PointerDown { x, y, shift } => {
                self.press = Some((x, y));
                self.last = (x, y);
                self.travel = 0.0;
                if shift {
                    self.is_selecting = true;
                    self.is_dragging = false;
                    vec![GestureAction::RangeUpdate { from_x: x, to_x: x }]
                } else {
                    self.is_dragging = true;
                    self.is_selecting = false;
                    Vec::new()
                }
            }
            InputEvent::PointerMove { x, y } => {
                self.track(x, y);
                let (last_x, last_y) = std::mem::replace(&mut self.last, (x, y));
                if self.is_dragging {
                    let (dx, dy) = (x - last_x, y - last_y);
                    if dx == 0.0 && dy == 0.0 {
                        return Vec::new();
                    }
                    vec![GestureAction::Pan { dx, dy }]
                } else if self.is_selecting {
                    let from_x = self.press.map_or(x, |(px, _)| px);
                    vec![GestureAction::RangeUpdate { from_x, to_x: x }]
                } else {
                    vec![GestureAction::Hover { x, y }]
                }
            }
            InputEvent::PointerUp { x, y } => {
                self.track(x, y);
                let press = self.press.take();
                let actions = if self.is_dragging && self.travel < click_tolerance {
                    vec![GestureAction::Click { x, y }]
                } else if self.is_selecting {
                    let from_x = press.map_or(x, |(px, _)| px);
                    if (x - from_x).abs() >= click_tolerance {
                        vec![GestureAction::RangeFinish { from_x, to_x: x }]
                    } else {
                        vec![GestureAction::RangeCancel]
                    }
                } else {
                    Vec::new()
                };
                self.is_dragging = false;
                self.is_selecting = false;
                actions
            }
            InputEvent::PointerLeave => {
                let mut actions = vec![GestureAction::ClearHover];
                if self.is_selecting {
                    actions.push(GestureAction::RangeCancel);
                }
                self.is_dragging = false;
                self.is_selecting = false;
                self.press = None;
                actions
            }
            InputEvent::Wheel {
                x,
                delta_x,
                delta_y,
                shift,
                ..
            } => {
                let mut actions = Vec::with_capacity(2);
                let (pan, zoom) = if shift { (delta_x + delta_y, 0.0) } else { (delta_x, delta_y) };
                if pan != 0.0 && pan.is_finite() {
                    actions.push(GestureAction::Pan { dx: -pan, dy: 0.0 });
                }
                if zoom != 0.0 && zoom.is_finite() {
                    actions.push(GestureAction::Zoom {
                        factor: zoom_step.powf(-zoom / 100.0),
                        pivot_x: x,
                    });
                }
                actions
            }
            InputEvent::Resize { width, height } => vec![GestureAction::Resize { width, height }],
        }
    }

    fn track(&mut self, x: f64, y: f64) {
        if let Some((px, py)) = self.press {
            self.travel = self.travel.max((x - px).hypot(y - py));
        }
    }
}
