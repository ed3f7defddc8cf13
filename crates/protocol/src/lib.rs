pub mod commands;
pub mod events;
pub mod ids;
pub mod theme;
pub mod types;

pub use commands::{RenderCommand, TextAlign};
pub use events::{DebugState, SelectionSource, TimelineEvent};
pub use ids::SpanId;
pub use theme::{StatusColors, ThemeToken};
pub use types::{Color, Point, Rect};
