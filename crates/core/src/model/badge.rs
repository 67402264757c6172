use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::BadgeId;

//
// ─── BADGE ─────────────────────────────────────────────────────────────────────
//

/// A named achievement with a monotonic earned flag.
///
/// The badge catalog is fixed at initialization; only `earned` and
/// `earned_at` ever change, and only through [`Badge::earn`]. Once earned,
/// a badge never reverts during normal operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    pub label: String,
    pub description: String,
    pub icon: String,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
}

impl Badge {
    /// Creates an unearned badge for the fixed catalog.
    #[must_use]
    pub fn locked(
        id: impl Into<BadgeId>,
        label: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            icon: icon.into(),
            earned: false,
            earned_at: None,
        }
    }

    /// Marks the badge as earned at `now`.
    ///
    /// Idempotent: earning an already-earned badge leaves `earned_at`
    /// untouched. Returns true only on the locked-to-earned transition.
    pub fn earn(&mut self, now: DateTime<Utc>) -> bool {
        if self.earned {
            return false;
        }
        self.earned = true;
        self.earned_at = Some(now);
        true
    }
}

/// The fixed badge catalog shipped with the app.
///
/// Identity is the id set; unlock logic never introduces new ids.
#[must_use]
pub fn default_badge_catalog() -> Vec<Badge> {
    vec![
        Badge::locked(
            "first-lesson",
            "Getting Started",
            "Completed your first lesson",
            "🎯",
        ),
        Badge::locked(
            "marketing-apprentice",
            "Marketing Apprentice",
            "Completed 3 marketing lessons",
            "📈",
        ),
        Badge::locked("hr-helper", "HR Helper", "Mastered HR communications", "👥"),
        Badge::locked(
            "ops-optimizer",
            "Operations Optimizer",
            "Streamlined 5 processes",
            "⚙️",
        ),
        Badge::locked(
            "support-star",
            "Support Star",
            "Achieved 90%+ satisfaction rating",
            "⭐",
        ),
        Badge::locked("streak-week", "Week Warrior", "7-day learning streak", "🔥"),
    ]
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn earn_is_idempotent() {
        let mut badge = Badge::locked("first-lesson", "Getting Started", "", "🎯");
        let first = fixed_now();
        let later = first + chrono::Duration::days(2);

        assert!(badge.earn(first));
        assert!(!badge.earn(later));
        assert_eq!(badge.earned_at, Some(first));
        assert!(badge.earned);
    }

    #[test]
    fn default_catalog_ids_are_unique() {
        let catalog = default_badge_catalog();
        let mut ids: Vec<_> = catalog.iter().map(|b| b.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
        assert!(catalog.iter().all(|b| !b.earned && b.earned_at.is_none()));
    }
}
