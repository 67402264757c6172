use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::model::{
    Badge, BadgeId, LessonCatalog, LessonId, LessonState, ProgressRecord, Rating, Role, Snapshot,
};
use crate::rules::{BadgeRule, RuleContext};

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Authoritative in-process holder of progress, badge, and role state.
///
/// The tracker is a plain reducer: the only write paths are
/// [`record_lesson_outcome`](Self::record_lesson_outcome),
/// [`unlock_badge`](Self::unlock_badge), and
/// [`set_current_role`](Self::set_current_role). All operations are total
/// and synchronous; unknown ids are no-ops rather than errors. Hosts with
/// more than one thread must serialize mutations externally.
///
/// The lesson catalog is borrowed per call, never owned: the tracker
/// consumes lesson ids as opaque strings and only asks the catalog for
/// role membership and denominators.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    progress: Vec<ProgressRecord>,
    badges: Vec<Badge>,
    current_role: Option<Role>,
    rules: Vec<BadgeRule>,
}

impl ProgressTracker {
    /// Creates an empty tracker with the given badge catalog and rule table.
    #[must_use]
    pub fn new(badges: Vec<Badge>, rules: Vec<BadgeRule>) -> Self {
        Self {
            progress: Vec::new(),
            badges,
            current_role: None,
            rules,
        }
    }

    /// Rebuilds a tracker from a persisted snapshot.
    ///
    /// The badge catalog identity is fixed at initialization: earned flags
    /// are carried over from the snapshot for known ids, while badge ids
    /// the catalog no longer contains are dropped. Duplicate progress
    /// records in a tampered snapshot collapse to the last occurrence.
    #[must_use]
    pub fn restore(badges: Vec<Badge>, rules: Vec<BadgeRule>, snapshot: Snapshot) -> Self {
        let mut tracker = Self::new(badges, rules);

        for record in snapshot.progress {
            match tracker.find_record_mut(&record.lesson_id) {
                Some(existing) => *existing = record,
                None => tracker.progress.push(record),
            }
        }

        for persisted in snapshot.badges {
            if !persisted.earned {
                continue;
            }
            if let Some(badge) = tracker.find_badge_mut(&persisted.id) {
                badge.earned = true;
                badge.earned_at = persisted.earned_at;
            }
        }

        tracker.current_role = snapshot.current_role;
        tracker
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Records a lesson outcome and evaluates the badge rule table.
    ///
    /// Upserts the progress record for `lesson_id` (full overwrite of the
    /// completed/rating fields; `completed_at` follows the completed flag),
    /// then runs every rule in table order against the updated progress
    /// set. Rule evaluation observes the just-written record.
    ///
    /// Returns the ids of badges earned by this call, in table order;
    /// already-earned badges are never returned again.
    pub fn record_lesson_outcome(
        &mut self,
        catalog: &LessonCatalog,
        lesson_id: LessonId,
        completed: bool,
        rating: Option<Rating>,
        now: DateTime<Utc>,
    ) -> Vec<BadgeId> {
        match self.find_record_mut(&lesson_id) {
            Some(record) => record.apply_outcome(completed, rating, now),
            None => self
                .progress
                .push(ProgressRecord::from_outcome(lesson_id.clone(), completed, rating, now)),
        }

        let completed_total = self.completed_count();
        let just_recorded = self
            .record(&lesson_id)
            .cloned()
            .unwrap_or_else(|| ProgressRecord::from_outcome(lesson_id, completed, rating, now));
        let ctx = RuleContext::new(catalog, &just_recorded, completed_total);

        let due: Vec<BadgeId> = self
            .rules
            .iter()
            .filter(|rule| rule.trigger.fires(&ctx))
            .map(|rule| rule.badge_id.clone())
            .collect();

        due.into_iter()
            .filter(|badge_id| self.unlock_badge(badge_id, now))
            .collect()
    }

    /// Marks a badge as earned at `now`.
    ///
    /// Idempotent: re-unlocking an earned badge leaves `earned_at` alone.
    /// Unknown ids are a silent no-op so the rule table stays decoupled
    /// from caller correctness. Returns true only when this call earned
    /// the badge.
    pub fn unlock_badge(&mut self, badge_id: &BadgeId, now: DateTime<Utc>) -> bool {
        match self.find_badge_mut(badge_id) {
            Some(badge) => badge.earn(now),
            None => false,
        }
    }

    /// Sets the active learning track. No effect on progress or badges.
    pub fn set_current_role(&mut self, role: Option<Role>) {
        self.current_role = role;
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn progress(&self) -> &[ProgressRecord] {
        &self.progress
    }

    #[must_use]
    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    #[must_use]
    pub fn current_role(&self) -> Option<Role> {
        self.current_role
    }

    /// The progress record for a lesson, if one was ever created.
    #[must_use]
    pub fn record(&self, lesson_id: &LessonId) -> Option<&ProgressRecord> {
        self.progress.iter().find(|r| &r.lesson_id == lesson_id)
    }

    /// Derived completion state of a lesson.
    #[must_use]
    pub fn lesson_state(&self, lesson_id: &LessonId) -> LessonState {
        self.record(lesson_id)
            .map_or(LessonState::Absent, ProgressRecord::state)
    }

    /// The badge with the given id, if it exists in the catalog.
    #[must_use]
    pub fn badge(&self, badge_id: &BadgeId) -> Option<&Badge> {
        self.badges.iter().find(|b| &b.id == badge_id)
    }

    //
    // ─── AGGREGATES ────────────────────────────────────────────────────────────
    //

    /// Completed lessons across all roles.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.progress.iter().filter(|r| r.completed).count()
    }

    /// Completion percentage over the whole catalog, 0.0 when it is empty.
    #[must_use]
    pub fn completion_percent(&self, catalog: &LessonCatalog) -> f64 {
        percent(self.completed_count(), catalog.len())
    }

    /// Completed lessons belonging to the given role per the catalog.
    #[must_use]
    pub fn role_completed_count(&self, catalog: &LessonCatalog, role: Role) -> usize {
        self.progress
            .iter()
            .filter(|r| r.completed && catalog.role_of(&r.lesson_id) == Some(role))
            .count()
    }

    /// Completion percentage within one role, 0.0 when the role has no lessons.
    #[must_use]
    pub fn role_completion_percent(&self, catalog: &LessonCatalog, role: Role) -> f64 {
        percent(
            self.role_completed_count(catalog, role),
            catalog.role_len(role),
        )
    }

    /// Number of earned badges.
    #[must_use]
    pub fn earned_badge_count(&self) -> usize {
        self.badges.iter().filter(|b| b.earned).count()
    }

    /// Minutes of catalog content covered by completed lessons.
    ///
    /// Completed lessons the catalog does not know contribute nothing.
    #[must_use]
    pub fn minutes_spent(&self, catalog: &LessonCatalog) -> u32 {
        self.progress
            .iter()
            .filter(|r| r.completed)
            .filter_map(|r| catalog.get(&r.lesson_id))
            .map(|lesson| lesson.duration_minutes)
            .sum()
    }

    /// Completed records with a timestamp, newest first, truncated to `limit`.
    #[must_use]
    pub fn recent_activity(&self, limit: usize) -> Vec<ProgressRecord> {
        let mut recent: Vec<ProgressRecord> = self
            .progress
            .iter()
            .filter(|r| r.completed && r.completed_at.is_some())
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        recent.truncate(limit);
        recent
    }

    /// Consecutive calendar days with at least one completion, ending today
    /// or yesterday.
    ///
    /// Derived and non-authoritative: nothing is stored and no badge rule
    /// reads it.
    #[must_use]
    pub fn active_day_streak(&self, today: NaiveDate) -> u32 {
        let mut days: Vec<NaiveDate> = self
            .progress
            .iter()
            .filter(|r| r.completed)
            .filter_map(|r| r.completed_at)
            .map(|at| at.date_naive())
            .collect();
        days.sort_unstable();
        days.dedup();

        let mut cursor = if days.binary_search(&today).is_ok() {
            today
        } else {
            today - Duration::days(1)
        };

        let mut streak = 0;
        while days.binary_search(&cursor).is_ok() {
            streak += 1;
            cursor = cursor - Duration::days(1);
        }
        streak
    }

    /// The persisted slice of the tracker state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            progress: self.progress.clone(),
            badges: self.badges.clone(),
            current_role: self.current_role,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

impl ProgressTracker {
    fn find_record_mut(&mut self, lesson_id: &LessonId) -> Option<&mut ProgressRecord> {
        self.progress.iter_mut().find(|r| &r.lesson_id == lesson_id)
    }

    fn find_badge_mut(&mut self, badge_id: &BadgeId) -> Option<&mut Badge> {
        self.badges.iter_mut().find(|b| &b.id == badge_id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_badge_catalog;
    use crate::rules::default_rules;
    use crate::time::fixed_now;

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(default_badge_catalog(), default_rules())
    }

    fn complete(tracker: &mut ProgressTracker, catalog: &LessonCatalog, lesson: &str) -> Vec<BadgeId> {
        tracker.record_lesson_outcome(catalog, LessonId::from(lesson), true, None, fixed_now())
    }

    #[test]
    fn upsert_keeps_one_record_per_lesson() {
        let catalog = LessonCatalog::builtin();
        let mut tracker = tracker();

        complete(&mut tracker, &catalog, "hr-1");
        tracker.record_lesson_outcome(
            &catalog,
            LessonId::from("hr-1"),
            false,
            Some(Rating::Negative),
            fixed_now(),
        );
        complete(&mut tracker, &catalog, "hr-1");

        assert_eq!(tracker.progress().len(), 1);
        assert_eq!(tracker.lesson_state(&LessonId::from("hr-1")), LessonState::Completed);
    }

    #[test]
    fn lesson_state_machine_transitions() {
        let catalog = LessonCatalog::builtin();
        let mut tracker = tracker();
        let id = LessonId::from("ops-1");

        assert_eq!(tracker.lesson_state(&id), LessonState::Absent);

        tracker.record_lesson_outcome(&catalog, id.clone(), false, None, fixed_now());
        assert_eq!(tracker.lesson_state(&id), LessonState::Incomplete);
        assert_eq!(tracker.record(&id).unwrap().completed_at, None);

        tracker.record_lesson_outcome(&catalog, id.clone(), true, None, fixed_now());
        assert_eq!(tracker.lesson_state(&id), LessonState::Completed);
        assert_eq!(tracker.record(&id).unwrap().completed_at, Some(fixed_now()));

        // Un-completing clears the timestamp but keeps the record.
        tracker.record_lesson_outcome(&catalog, id.clone(), false, None, fixed_now());
        assert_eq!(tracker.lesson_state(&id), LessonState::Incomplete);
        assert_eq!(tracker.record(&id).unwrap().completed_at, None);
    }

    #[test]
    fn first_completion_earns_first_lesson_badge() {
        let catalog = LessonCatalog::builtin();
        let mut tracker = tracker();

        let earned = complete(&mut tracker, &catalog, "marketing-1");
        assert_eq!(earned, vec![BadgeId::from("first-lesson")]);

        let earned = complete(&mut tracker, &catalog, "hr-1");
        assert!(earned.is_empty());
        assert_eq!(tracker.earned_badge_count(), 1);
    }

    #[test]
    fn marketing_apprentice_needs_three_completions() {
        let catalog = LessonCatalog::builtin();
        let mut tracker = tracker();

        complete(&mut tracker, &catalog, "marketing-1");
        complete(&mut tracker, &catalog, "marketing-2");
        let apprentice = BadgeId::from("marketing-apprentice");
        assert!(!tracker.badge(&apprentice).unwrap().earned);

        let earned = complete(&mut tracker, &catalog, "marketing-project");
        assert_eq!(earned, vec![apprentice.clone()]);
        assert!(tracker.badge(&apprentice).unwrap().earned);
    }

    #[test]
    fn badge_earned_flag_is_monotonic() {
        let catalog = LessonCatalog::builtin();
        let mut tracker = tracker();

        complete(&mut tracker, &catalog, "support-1");
        let first = BadgeId::from("first-lesson");
        let earned_at = tracker.badge(&first).unwrap().earned_at;
        assert!(earned_at.is_some());

        // Un-complete everything; the badge must survive.
        tracker.record_lesson_outcome(
            &catalog,
            LessonId::from("support-1"),
            false,
            None,
            fixed_now(),
        );
        let badge = tracker.badge(&first).unwrap();
        assert!(badge.earned);
        assert_eq!(badge.earned_at, earned_at);
    }

    #[test]
    fn unlock_badge_is_idempotent_and_ignores_unknown_ids() {
        let mut tracker = tracker();
        let streak = BadgeId::from("streak-week");
        let first = fixed_now();
        let later = first + Duration::days(1);

        assert!(tracker.unlock_badge(&streak, first));
        assert!(!tracker.unlock_badge(&streak, later));
        assert_eq!(tracker.badge(&streak).unwrap().earned_at, Some(first));

        assert!(!tracker.unlock_badge(&BadgeId::from("no-such-badge"), first));
        assert_eq!(tracker.badges().len(), default_badge_catalog().len());
    }

    #[test]
    fn completion_percent_is_zero_for_empty_catalog() {
        let empty = LessonCatalog::default();
        let mut tracker = tracker();
        complete(&mut tracker, &empty, "orphan-1");

        assert!((tracker.completion_percent(&empty) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn per_role_aggregates_use_catalog_membership() {
        let catalog = LessonCatalog::builtin();
        let mut tracker = tracker();

        complete(&mut tracker, &catalog, "hr-1");
        complete(&mut tracker, &catalog, "marketing-1");

        assert_eq!(tracker.role_completed_count(&catalog, Role::Hr), 1);
        assert_eq!(tracker.role_completed_count(&catalog, Role::Marketing), 1);
        assert_eq!(tracker.role_completed_count(&catalog, Role::Ops), 0);
        // hr has two lessons in the builtin catalog.
        assert!((tracker.role_completion_percent(&catalog, Role::Hr) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn minutes_spent_sums_completed_durations() {
        let catalog = LessonCatalog::builtin();
        let mut tracker = tracker();

        complete(&mut tracker, &catalog, "hr-1"); // 7 minutes
        complete(&mut tracker, &catalog, "support-1"); // 5 minutes
        complete(&mut tracker, &catalog, "unknown-1"); // not in catalog

        assert_eq!(tracker.minutes_spent(&catalog), 12);
    }

    #[test]
    fn recent_activity_is_newest_first_and_truncated() {
        let catalog = LessonCatalog::builtin();
        let mut tracker = tracker();
        let base = fixed_now();

        for (i, lesson) in ["hr-1", "hr-2", "ops-1"].iter().enumerate() {
            tracker.record_lesson_outcome(
                &catalog,
                LessonId::from(*lesson),
                true,
                None,
                base + Duration::hours(i as i64),
            );
        }
        tracker.record_lesson_outcome(&catalog, LessonId::from("support-1"), false, None, base);

        let recent = tracker.recent_activity(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].lesson_id, LessonId::from("ops-1"));
        assert_eq!(recent[1].lesson_id, LessonId::from("hr-2"));
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let catalog = LessonCatalog::builtin();
        let mut tracker = tracker();
        let base = fixed_now();

        for (i, lesson) in ["hr-1", "hr-2", "ops-1"].iter().enumerate() {
            tracker.record_lesson_outcome(
                &catalog,
                LessonId::from(*lesson),
                true,
                None,
                base + Duration::days(i as i64),
            );
        }

        let last_day = (base + Duration::days(2)).date_naive();
        assert_eq!(tracker.active_day_streak(last_day), 3);
        // A quiet "today" still counts a streak that ended yesterday.
        assert_eq!(tracker.active_day_streak(last_day + Duration::days(1)), 3);
        assert_eq!(tracker.active_day_streak(last_day + Duration::days(2)), 0);
    }

    #[test]
    fn snapshot_restore_reproduces_state() {
        let catalog = LessonCatalog::builtin();
        let mut tracker = tracker();

        complete(&mut tracker, &catalog, "marketing-1");
        tracker.record_lesson_outcome(
            &catalog,
            LessonId::from("hr-1"),
            true,
            Some(Rating::Positive),
            fixed_now(),
        );
        tracker.set_current_role(Some(Role::Marketing));

        let restored = ProgressTracker::restore(
            default_badge_catalog(),
            default_rules(),
            tracker.snapshot(),
        );

        assert_eq!(restored.progress(), tracker.progress());
        assert_eq!(restored.badges(), tracker.badges());
        assert_eq!(restored.current_role(), Some(Role::Marketing));
    }

    #[test]
    fn restore_drops_badges_outside_the_catalog() {
        let mut snapshot = Snapshot::default();
        let mut stale = Badge::locked("retired-badge", "Retired", "", "🏺");
        stale.earn(fixed_now());
        snapshot.badges.push(stale);

        let mut known = Badge::locked("first-lesson", "Getting Started", "", "🎯");
        known.earn(fixed_now());
        snapshot.badges.push(known);

        let restored =
            ProgressTracker::restore(default_badge_catalog(), default_rules(), snapshot);

        assert!(restored.badge(&BadgeId::from("retired-badge")).is_none());
        assert!(restored.badge(&BadgeId::from("first-lesson")).unwrap().earned);
        assert_eq!(restored.badges().len(), default_badge_catalog().len());
    }

    #[test]
    fn restore_collapses_duplicate_progress_records() {
        let mut snapshot = Snapshot::default();
        snapshot.progress.push(ProgressRecord::from_outcome(
            LessonId::from("hr-1"),
            false,
            None,
            fixed_now(),
        ));
        snapshot.progress.push(ProgressRecord::from_outcome(
            LessonId::from("hr-1"),
            true,
            Some(Rating::Positive),
            fixed_now(),
        ));

        let restored =
            ProgressTracker::restore(default_badge_catalog(), default_rules(), snapshot);

        assert_eq!(restored.progress().len(), 1);
        assert!(restored.progress()[0].completed);
    }
}
