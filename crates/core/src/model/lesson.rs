use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::role::Role;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("duplicate lesson id: {0}")]
    DuplicateLessonId(LessonId),
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// Read-only descriptor of one unit of instructional content.
///
/// Lessons are owned by the catalog; the tracker only ever sees their ids
/// and asks the catalog for role membership and durations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: LessonId,
    pub role: Role,
    pub title: String,
    pub duration_minutes: u32,
    pub skills: Vec<String>,
    pub is_project: bool,
    pub description: String,
}

impl Lesson {
    #[must_use]
    pub fn new(
        id: impl Into<LessonId>,
        role: Role,
        title: impl Into<String>,
        duration_minutes: u32,
        skills: &[&str],
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            title: title.into(),
            duration_minutes,
            skills: skills.iter().map(ToString::to_string).collect(),
            is_project: false,
            description: description.into(),
        }
    }

    /// Marks this lesson as a capstone project for its role.
    #[must_use]
    pub fn project(mut self) -> Self {
        self.is_project = true;
        self
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Fixed, enumerable list of lessons, keyed uniquely by lesson id.
///
/// The catalog is externally owned relative to the tracker: the tracker
/// borrows it for role membership tests and percentage denominators but
/// never mutates or validates progress against it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LessonCatalog {
    lessons: Vec<Lesson>,
}

impl LessonCatalog {
    /// Builds a catalog from the given lessons.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateLessonId` if two lessons share an id.
    pub fn new(lessons: Vec<Lesson>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for lesson in &lessons {
            if !seen.insert(lesson.id.clone()) {
                return Err(CatalogError::DuplicateLessonId(lesson.id.clone()));
            }
        }
        Ok(Self { lessons })
    }

    /// The catalog shipped with the app: four tracks, seven lessons.
    ///
    /// # Panics
    ///
    /// Never panics; the built-in ids are unique by construction.
    #[must_use]
    pub fn builtin() -> Self {
        let lessons = vec![
            Lesson::new(
                "marketing-1",
                Role::Marketing,
                "Write Compelling Ad Copy",
                8,
                &["copywriting", "persuasion", "targeting"],
                "Craft ad copy that converts using proven frameworks",
            ),
            Lesson::new(
                "marketing-2",
                Role::Marketing,
                "Analyze Campaign Performance",
                10,
                &["analytics", "optimization", "reporting"],
                "Interpret campaign data and generate actionable insights",
            ),
            Lesson::new(
                "marketing-project",
                Role::Marketing,
                "Launch Product Campaign",
                25,
                &["strategy", "execution", "measurement"],
                "Plan and execute a complete product launch campaign",
            )
            .project(),
            Lesson::new(
                "hr-1",
                Role::Hr,
                "Draft Policy Communications",
                7,
                &["communication", "policy", "clarity"],
                "Create clear, empathetic policy announcements",
            ),
            Lesson::new(
                "hr-2",
                Role::Hr,
                "Screen Candidate Resumes",
                6,
                &["evaluation", "matching", "efficiency"],
                "Quickly identify top candidates from resume pools",
            ),
            Lesson::new(
                "ops-1",
                Role::Ops,
                "Automate Workflow Documentation",
                9,
                &["documentation", "automation", "processes"],
                "Create process documentation that teams can follow",
            ),
            Lesson::new(
                "support-1",
                Role::Support,
                "Generate Tone-Adjusted Responses",
                5,
                &["empathy", "communication", "resolution"],
                "Craft support responses that match customer needs",
            ),
        ];
        Self::new(lessons).expect("builtin catalog has unique ids")
    }

    /// Number of lessons in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    /// Looks up a lesson descriptor by id.
    #[must_use]
    pub fn get(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| &lesson.id == id)
    }

    /// Role membership test for badge rules and per-role aggregates.
    ///
    /// Returns `None` for ids the catalog does not know; the tracker treats
    /// such lessons as belonging to no role.
    #[must_use]
    pub fn role_of(&self, id: &LessonId) -> Option<Role> {
        self.get(id).map(|lesson| lesson.role)
    }

    /// Lessons belonging to the given role, in catalog order.
    pub fn lessons_for_role(&self, role: Role) -> impl Iterator<Item = &Lesson> {
        self.lessons.iter().filter(move |lesson| lesson.role == role)
    }

    /// Number of lessons for the given role.
    #[must_use]
    pub fn role_len(&self, role: Role) -> usize {
        self.lessons_for_role(role).count()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_lesson_ids() {
        let lessons = vec![
            Lesson::new("marketing-1", Role::Marketing, "A", 5, &[], ""),
            Lesson::new("marketing-1", Role::Marketing, "B", 5, &[], ""),
        ];
        let err = LessonCatalog::new(lessons).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateLessonId(LessonId::from("marketing-1"))
        );
    }

    #[test]
    fn builtin_catalog_covers_all_roles() {
        let catalog = LessonCatalog::builtin();
        assert_eq!(catalog.len(), 7);
        for role in Role::ALL {
            assert!(catalog.role_len(role) >= 1, "no lessons for {role}");
        }
    }

    #[test]
    fn role_of_unknown_lesson_is_none() {
        let catalog = LessonCatalog::builtin();
        assert_eq!(catalog.role_of(&LessonId::from("marketing-1")), Some(Role::Marketing));
        assert_eq!(catalog.role_of(&LessonId::from("nope-1")), None);
    }
}
