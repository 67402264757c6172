#![forbid(unsafe_code)]

pub mod model;
pub mod rules;
pub mod time;
pub mod tracker;

pub use time::Clock;
pub use tracker::ProgressTracker;
