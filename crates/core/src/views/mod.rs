pub mod markers;
pub mod time_axis;
pub mod timeline;

pub use markers::render_markers;
pub use time_axis::render_time_axis;
pub use timeline::{TimelineScene, hit_test, render_timeline};
