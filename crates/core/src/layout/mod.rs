pub mod lanes;
pub mod rows;

pub use lanes::{LaneAssignment, LaneKey, assign_lanes};
pub use rows::{Row, RowLayout, WorkerBlock};
