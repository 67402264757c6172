use chrono::{DateTime, Utc};

use upskill_core::model::{LessonId, Rating, Role};

/// Aggregated view of overall progress, useful for a dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressOverview {
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub completion_percent: f64,
    pub earned_badges: usize,
    pub total_badges: usize,
    pub minutes_spent: u32,
    pub active_day_streak: u32,
    pub current_role: Option<Role>,
}

/// Progress within a single role track.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleOverview {
    pub role: Role,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub completion_percent: f64,
}

/// One row of the recent-activity feed: a completed lesson and when.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub lesson_id: LessonId,
    pub completed_at: DateTime<Utc>,
    pub rating: Option<Rating>,
}
