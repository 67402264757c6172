#![forbid(unsafe_code)]

pub mod error;
pub mod overview;
pub mod progress_service;

pub use upskill_core::Clock;

pub use error::ProgressServiceError;
pub use overview::{ActivityEntry, ProgressOverview, RoleOverview};
pub use progress_service::ProgressService;
