use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::LessonId;

//
// ─── RATING ────────────────────────────────────────────────────────────────────
//

/// Helpfulness rating a learner can attach to a lesson outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Positive,
    Negative,
}

//
// ─── LESSON STATE ──────────────────────────────────────────────────────────────
//

/// Derived completion state of a single lesson.
///
/// `Absent` means no outcome was ever recorded; the record itself is
/// created lazily on the first outcome. There is no terminal state and no
/// deletion transition: a lesson toggles between `Incomplete` and
/// `Completed` on subsequent outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonState {
    Absent,
    Incomplete,
    Completed,
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Completion and rating state for one lesson.
///
/// At most one record exists per lesson id. `completed_at` is set the
/// instant `completed` becomes true and cleared again when the lesson is
/// un-completed; an outcome is always a full overwrite of the
/// completed/rating fields, never a partial merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub lesson_id: LessonId,
    pub completed: bool,
    pub rating: Option<Rating>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Builds the record for a freshly recorded outcome.
    #[must_use]
    pub fn from_outcome(
        lesson_id: LessonId,
        completed: bool,
        rating: Option<Rating>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            lesson_id,
            completed,
            rating,
            completed_at: completed.then_some(now),
        }
    }

    /// Overwrites this record with a new outcome.
    ///
    /// The completion timestamp follows the completed flag: set to `now`
    /// when completing, cleared when un-completing.
    pub fn apply_outcome(&mut self, completed: bool, rating: Option<Rating>, now: DateTime<Utc>) {
        self.completed = completed;
        self.rating = rating;
        self.completed_at = completed.then_some(now);
    }

    /// Derived state of this record.
    #[must_use]
    pub fn state(&self) -> LessonState {
        if self.completed {
            LessonState::Completed
        } else {
            LessonState::Incomplete
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn completion_sets_timestamp() {
        let record = ProgressRecord::from_outcome(
            LessonId::from("hr-1"),
            true,
            Some(Rating::Positive),
            fixed_now(),
        );
        assert_eq!(record.completed_at, Some(fixed_now()));
        assert_eq!(record.state(), LessonState::Completed);
    }

    #[test]
    fn incomplete_outcome_has_no_timestamp() {
        let record = ProgressRecord::from_outcome(LessonId::from("hr-1"), false, None, fixed_now());
        assert_eq!(record.completed_at, None);
        assert_eq!(record.state(), LessonState::Incomplete);
    }

    #[test]
    fn uncompleting_clears_timestamp_and_rating_is_overwritten() {
        let mut record = ProgressRecord::from_outcome(
            LessonId::from("ops-1"),
            true,
            Some(Rating::Negative),
            fixed_now(),
        );
        record.apply_outcome(false, None, fixed_now() + chrono::Duration::hours(1));
        assert!(!record.completed);
        assert_eq!(record.rating, None);
        assert_eq!(record.completed_at, None);
    }

    #[test]
    fn rating_serializes_lowercase() {
        let json = serde_json::to_string(&Rating::Positive).unwrap();
        assert_eq!(json, "\"positive\"");
    }
}
