use crate::model::{BadgeId, LessonCatalog, ProgressRecord, Role};

//
// ─── RULE CONTEXT ──────────────────────────────────────────────────────────────
//

/// What a rule gets to observe after an outcome has been written.
///
/// The just-recorded lesson is always visible to the rule, together with
/// the completed total over the entire progress set (the upsert happens
/// strictly before evaluation, so the total includes the new outcome).
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The record written by the triggering `record_lesson_outcome` call.
    pub just_recorded: &'a ProgressRecord,
    /// Role of the just-recorded lesson per the catalog, if known.
    pub lesson_role: Option<Role>,
    /// Completed lessons across all roles, including the new outcome.
    pub completed_total: usize,
}

impl<'a> RuleContext<'a> {
    /// Assembles the context for one rule pass.
    #[must_use]
    pub fn new(
        catalog: &LessonCatalog,
        just_recorded: &'a ProgressRecord,
        completed_total: usize,
    ) -> Self {
        Self {
            just_recorded,
            lesson_role: catalog.role_of(&just_recorded.lesson_id),
            completed_total,
        }
    }
}

//
// ─── TRIGGERS ──────────────────────────────────────────────────────────────────
//

/// Unlock predicate shapes.
///
/// Every trigger is a membership test on the just-recorded lesson plus a
/// threshold over the full progress set. Adding a badge rule means adding
/// a row to the table, not new evaluation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fires when the just-recorded outcome is the very first completion.
    FirstCompletion,
    /// Fires when the just-recorded lesson belongs to `role` and the
    /// completed total across all roles has reached `min_completed`.
    ///
    /// The threshold is deliberately cross-role: completing two HR lessons
    /// and then one marketing lesson earns the marketing badge with a
    /// threshold of three.
    RoleThreshold { role: Role, min_completed: usize },
}

impl Trigger {
    /// Evaluates this trigger against the context.
    ///
    /// Triggers only ever fire on a completion; un-completing a lesson can
    /// never unlock anything.
    #[must_use]
    pub fn fires(self, ctx: &RuleContext<'_>) -> bool {
        if !ctx.just_recorded.completed {
            return false;
        }
        match self {
            Trigger::FirstCompletion => ctx.completed_total == 1,
            Trigger::RoleThreshold {
                role,
                min_completed,
            } => ctx.lesson_role == Some(role) && ctx.completed_total >= min_completed,
        }
    }
}

//
// ─── RULE TABLE ────────────────────────────────────────────────────────────────
//

/// One row of the unlock table: a trigger and the badge it unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRule {
    pub badge_id: BadgeId,
    pub trigger: Trigger,
}

impl BadgeRule {
    #[must_use]
    pub fn new(badge_id: impl Into<BadgeId>, trigger: Trigger) -> Self {
        Self {
            badge_id: badge_id.into(),
            trigger,
        }
    }
}

/// The unlock table shipped with the default badge catalog.
///
/// Evaluated top to bottom after every recorded outcome. `streak-week`
/// has no row here; it can only be unlocked explicitly.
#[must_use]
pub fn default_rules() -> Vec<BadgeRule> {
    vec![
        BadgeRule::new("first-lesson", Trigger::FirstCompletion),
        BadgeRule::new(
            "marketing-apprentice",
            Trigger::RoleThreshold {
                role: Role::Marketing,
                min_completed: 3,
            },
        ),
        BadgeRule::new(
            "hr-helper",
            Trigger::RoleThreshold {
                role: Role::Hr,
                min_completed: 3,
            },
        ),
        BadgeRule::new(
            "ops-optimizer",
            Trigger::RoleThreshold {
                role: Role::Ops,
                min_completed: 5,
            },
        ),
        BadgeRule::new(
            "support-star",
            Trigger::RoleThreshold {
                role: Role::Support,
                min_completed: 3,
            },
        ),
    ]
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonId, ProgressRecord};
    use crate::time::fixed_now;

    fn completed(lesson: &str) -> ProgressRecord {
        ProgressRecord::from_outcome(LessonId::from(lesson), true, None, fixed_now())
    }

    #[test]
    fn first_completion_fires_only_at_one() {
        let catalog = LessonCatalog::builtin();
        let record = completed("support-1");

        let at_one = RuleContext::new(&catalog, &record, 1);
        let at_two = RuleContext::new(&catalog, &record, 2);
        assert!(Trigger::FirstCompletion.fires(&at_one));
        assert!(!Trigger::FirstCompletion.fires(&at_two));
    }

    #[test]
    fn uncompletion_never_fires() {
        let catalog = LessonCatalog::builtin();
        let record =
            ProgressRecord::from_outcome(LessonId::from("marketing-1"), false, None, fixed_now());
        let ctx = RuleContext::new(&catalog, &record, 1);

        assert!(!Trigger::FirstCompletion.fires(&ctx));
        let threshold = Trigger::RoleThreshold {
            role: Role::Marketing,
            min_completed: 1,
        };
        assert!(!threshold.fires(&ctx));
    }

    #[test]
    fn role_threshold_needs_matching_role_and_count() {
        let catalog = LessonCatalog::builtin();
        let trigger = Trigger::RoleThreshold {
            role: Role::Marketing,
            min_completed: 3,
        };

        let marketing = completed("marketing-2");
        assert!(!trigger.fires(&RuleContext::new(&catalog, &marketing, 2)));
        assert!(trigger.fires(&RuleContext::new(&catalog, &marketing, 3)));
        assert!(trigger.fires(&RuleContext::new(&catalog, &marketing, 4)));

        let hr = completed("hr-1");
        assert!(!trigger.fires(&RuleContext::new(&catalog, &hr, 5)));
    }

    #[test]
    fn threshold_counts_completions_across_roles() {
        let catalog = LessonCatalog::builtin();
        let trigger = Trigger::RoleThreshold {
            role: Role::Marketing,
            min_completed: 3,
        };
        // Third completion overall, first marketing lesson.
        let record = completed("marketing-1");
        assert!(trigger.fires(&RuleContext::new(&catalog, &record, 3)));
    }

    #[test]
    fn unknown_lesson_matches_no_role() {
        let catalog = LessonCatalog::builtin();
        let record = completed("mystery-1");
        let trigger = Trigger::RoleThreshold {
            role: Role::Marketing,
            min_completed: 1,
        };
        assert!(!trigger.fires(&RuleContext::new(&catalog, &record, 9)));
    }

    #[test]
    fn default_table_covers_every_role() {
        let rules = default_rules();
        assert!(rules.iter().any(|r| r.trigger == Trigger::FirstCompletion));
        for role in Role::ALL {
            assert!(
                rules.iter().any(|r| matches!(
                    r.trigger,
                    Trigger::RoleThreshold { role: rule_role, .. } if rule_role == role
                )),
                "missing rule for {role}"
            );
        }
    }
}
