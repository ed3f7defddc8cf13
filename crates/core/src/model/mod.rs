pub mod run;
pub mod span;

pub use run::{NodeKind, RunModel, RunNode};
pub use span::{Span, SpanKind, SpanSet, Status, Tier, WorkerId};
