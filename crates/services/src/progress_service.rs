use std::sync::{Arc, Mutex, MutexGuard};

use upskill_core::model::{
    Badge, BadgeId, LessonCatalog, LessonId, LessonState, Rating, Role, Snapshot,
    default_badge_catalog,
};
use upskill_core::rules::default_rules;
use upskill_core::tracker::ProgressTracker;
use upskill_core::Clock;

use storage::repository::{SnapshotRepository, Storage};

use crate::error::ProgressServiceError;
use crate::overview::{ActivityEntry, ProgressOverview, RoleOverview};

//
// ─── PROGRESS SERVICE ──────────────────────────────────────────────────────────
//

/// Process-wide progress and achievement store.
///
/// Owns the tracker behind a mutex so that outcome recording and badge
/// unlocking are serialized in multi-threaded hosts, and mirrors every
/// mutation into the snapshot repository. Persistence is fire-and-forget:
/// the in-memory tracker is the source of truth for the running session,
/// and a failed write is silently dropped.
pub struct ProgressService {
    clock: Clock,
    catalog: Arc<LessonCatalog>,
    snapshots: Arc<dyn SnapshotRepository>,
    state: Mutex<ProgressTracker>,
}

impl ProgressService {
    /// Builds a service over an explicit snapshot repository, restoring
    /// persisted state when present.
    ///
    /// A missing or malformed snapshot, or a failing load, falls back to
    /// the empty default state: no progress, the full badge catalog
    /// locked, no active role.
    pub async fn restore(
        clock: Clock,
        catalog: Arc<LessonCatalog>,
        snapshots: Arc<dyn SnapshotRepository>,
    ) -> Self {
        let snapshot = snapshots.load().await.ok().flatten();
        let tracker = match snapshot {
            Some(snapshot) => {
                ProgressTracker::restore(default_badge_catalog(), default_rules(), snapshot)
            }
            None => ProgressTracker::new(default_badge_catalog(), default_rules()),
        };

        Self {
            clock,
            catalog,
            snapshots,
            state: Mutex::new(tracker),
        }
    }

    /// Builds a service with in-memory persistence, for tests and demos.
    pub async fn in_memory(clock: Clock, catalog: Arc<LessonCatalog>) -> Self {
        Self::restore(clock, catalog, Storage::in_memory().snapshots).await
    }

    /// Builds a service backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the connection or migrations fail.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: Arc<LessonCatalog>,
    ) -> Result<Self, ProgressServiceError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::restore(clock, catalog, storage.snapshots).await)
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Records a lesson outcome and evaluates badge rules.
    ///
    /// Returns the badges newly earned by this call. Callers that only
    /// want the spec'd void semantics can drop the return value.
    pub async fn record_lesson_outcome(
        &self,
        lesson_id: LessonId,
        completed: bool,
        rating: Option<Rating>,
    ) -> Vec<BadgeId> {
        let now = self.clock.now();
        let (earned, snapshot) = {
            let mut tracker = self.lock_state();
            let earned =
                tracker.record_lesson_outcome(&self.catalog, lesson_id, completed, rating, now);
            (earned, tracker.snapshot())
        };
        self.persist(&snapshot).await;
        earned
    }

    /// Unlocks a badge by id; unknown ids are a silent no-op.
    ///
    /// Returns true only when this call earned the badge.
    pub async fn unlock_badge(&self, badge_id: &BadgeId) -> bool {
        let now = self.clock.now();
        let (earned, snapshot) = {
            let mut tracker = self.lock_state();
            let earned = tracker.unlock_badge(badge_id, now);
            (earned, tracker.snapshot())
        };
        self.persist(&snapshot).await;
        earned
    }

    /// Sets the active learning track.
    pub async fn set_current_role(&self, role: Option<Role>) {
        let snapshot = {
            let mut tracker = self.lock_state();
            tracker.set_current_role(role);
            tracker.snapshot()
        };
        self.persist(&snapshot).await;
    }

    /// Full store reset: clears the persisted snapshot and reinitializes
    /// the tracker to the empty default state.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the persisted snapshot cannot be
    /// removed; the in-memory state is reset regardless.
    pub async fn reset(&self) -> Result<(), ProgressServiceError> {
        {
            let mut tracker = self.lock_state();
            *tracker = ProgressTracker::new(default_badge_catalog(), default_rules());
        }
        self.snapshots.clear().await?;
        Ok(())
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    /// Dashboard aggregates over the whole catalog.
    #[must_use]
    pub fn overview(&self) -> ProgressOverview {
        let tracker = self.lock_state();
        ProgressOverview {
            completed_lessons: tracker.completed_count(),
            total_lessons: self.catalog.len(),
            completion_percent: tracker.completion_percent(&self.catalog),
            earned_badges: tracker.earned_badge_count(),
            total_badges: tracker.badges().len(),
            minutes_spent: tracker.minutes_spent(&self.catalog),
            active_day_streak: tracker.active_day_streak(self.clock.now().date_naive()),
            current_role: tracker.current_role(),
        }
    }

    /// Aggregates for a single role track.
    #[must_use]
    pub fn role_overview(&self, role: Role) -> RoleOverview {
        let tracker = self.lock_state();
        RoleOverview {
            role,
            completed_lessons: tracker.role_completed_count(&self.catalog, role),
            total_lessons: self.catalog.role_len(role),
            completion_percent: tracker.role_completion_percent(&self.catalog, role),
        }
    }

    /// Completed lessons, newest first, truncated to `limit`.
    #[must_use]
    pub fn recent_activity(&self, limit: usize) -> Vec<ActivityEntry> {
        let tracker = self.lock_state();
        tracker
            .recent_activity(limit)
            .into_iter()
            .filter_map(|record| {
                record.completed_at.map(|completed_at| ActivityEntry {
                    lesson_id: record.lesson_id,
                    completed_at,
                    rating: record.rating,
                })
            })
            .collect()
    }

    /// The full badge catalog with current earned state.
    #[must_use]
    pub fn badges(&self) -> Vec<Badge> {
        self.lock_state().badges().to_vec()
    }

    #[must_use]
    pub fn current_role(&self) -> Option<Role> {
        self.lock_state().current_role()
    }

    /// Derived completion state of a lesson.
    #[must_use]
    pub fn lesson_state(&self, lesson_id: &LessonId) -> LessonState {
        self.lock_state().lesson_state(lesson_id)
    }

    /// The lesson catalog this store reads denominators from.
    #[must_use]
    pub fn catalog(&self) -> &LessonCatalog {
        &self.catalog
    }

    fn lock_state(&self) -> MutexGuard<'_, ProgressTracker> {
        // Tracker mutations are total; a panic mid-mutation cannot leave it
        // logically inconsistent, so a poisoned lock is safe to reclaim.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn persist(&self, snapshot: &Snapshot) {
        // Best-effort: the snapshot is advisory for the next cold start.
        let _ = self.snapshots.save(snapshot).await;
    }
}
