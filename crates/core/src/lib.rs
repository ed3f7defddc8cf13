//! Timeline rendering and selection-sync engine for hierarchical test runs.
//!
//! A run model is flattened into spans, packed onto per-worker lanes and
//! drawn as a flat list of [`RenderCommand`]s that any host can replay.

pub mod bus;
pub mod config;
pub mod engine;
pub mod error;
pub mod flatten;
pub mod gesture;
pub mod layout;
pub mod live;
pub mod merge;
pub mod model;
pub mod selection;
pub mod svg;
pub mod viewport;
pub mod views;

pub use bus::{EventBus, SubscriptionId};
pub use config::TimelineConfig;
pub use engine::TimelineEngine;
pub use error::{LoadError, TransportError};
pub use gesture::InputEvent;
pub use live::{LiveFeed, Transport};
pub use merge::MergeStats;
pub use model::{RunModel, RunNode, Span, SpanKind, SpanSet, Status};
pub use selection::TreeView;
pub use viewport::Viewport;

pub use rf_timeline_protocol::{
    DebugState, RenderCommand, SelectionSource, SpanId, StatusColors, TimelineEvent,
};
