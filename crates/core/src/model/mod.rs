mod badge;
mod ids;
mod lesson;
mod progress;
mod role;
mod snapshot;

pub use badge::{Badge, default_badge_catalog};
pub use ids::{BadgeId, LessonId};
pub use lesson::{CatalogError, Lesson, LessonCatalog};
pub use progress::{LessonState, ProgressRecord, Rating};
pub use role::{Role, RoleParseError};
pub use snapshot::Snapshot;
