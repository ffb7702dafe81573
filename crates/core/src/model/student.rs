use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::StudentId;
use crate::model::step::{ProgressError, SignOff, StepIndex, StepStatus};
use crate::progression::{self, Steps};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudentError {
    #[error("student name cannot be empty")]
    EmptyName,

    #[error("step {index} is completed but an earlier step is not")]
    GatingViolation { index: u8 },
}

//
// ─── STUDENT ───────────────────────────────────────────────────────────────────
//

/// One student walking through the registration checklist.
///
/// Identity, name, grade and creation time never change after construction.
/// Steps only move from pending to completed, except through [`Student::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    id: StudentId,
    name: String,
    grade: Option<String>,
    created_at: DateTime<Utc>,
    steps: Steps,
}

impl Student {
    /// Creates a student with every step pending.
    ///
    /// # Errors
    ///
    /// Returns `StudentError::EmptyName` if name is empty or whitespace-only.
    pub fn new(
        id: StudentId,
        name: impl Into<String>,
        grade: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, StudentError> {
        Self::from_persisted(id, name, grade, created_at, progression::pending_steps())
    }

    /// Rehydrate a student from persisted parts.
    ///
    /// # Errors
    ///
    /// Returns `StudentError::EmptyName` for a blank name and
    /// `StudentError::GatingViolation` if a step is completed ahead of its predecessor.
    pub fn from_persisted(
        id: StudentId,
        name: impl Into<String>,
        grade: Option<String>,
        created_at: DateTime<Utc>,
        steps: Steps,
    ) -> Result<Self, StudentError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(StudentError::EmptyName);
        }
        if let Some(index) = progression::first_gating_violation(&steps) {
            return Err(StudentError::GatingViolation {
                index: index.value(),
            });
        }

        let grade = grade
            .map(|g| g.trim().to_owned())
            .filter(|g| !g.is_empty());

        Ok(Self {
            id,
            name: name.to_owned(),
            grade,
            created_at,
            steps,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn grade(&self) -> Option<&str> {
        self.grade.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn step(&self, index: StepIndex) -> &StepStatus {
        &self.steps[index.slot()]
    }

    /// Steps paired with their index, in checklist order.
    pub fn steps(&self) -> impl Iterator<Item = (StepIndex, &StepStatus)> {
        StepIndex::all().zip(self.steps.iter())
    }

    #[must_use]
    pub fn is_locked(&self, index: StepIndex) -> bool {
        progression::is_locked(&self.steps, index)
    }

    /// Signs off a step on behalf of a staff member.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::StepLocked` if the previous step is pending and
    /// `ProgressError::EmptyInitials` if `initials` is blank. The student is
    /// unchanged on error.
    pub fn sign_step(
        &mut self,
        index: StepIndex,
        initials: &str,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), ProgressError> {
        if self.is_locked(index) {
            return Err(ProgressError::StepLocked {
                index: index.value(),
            });
        }
        let sign_off = SignOff::new(initials, note, at)?;
        progression::sign(&mut self.steps, index, sign_off)
    }

    /// Returns every step to pending. Identity and profile fields are kept.
    pub fn reset(&mut self) {
        self.steps = progression::pending_steps();
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        progression::completed_count(&self.steps)
    }

    #[must_use]
    pub fn percent_complete(&self) -> u8 {
        progression::percent_complete(&self.steps)
    }

    #[must_use]
    pub fn current_step_index(&self) -> StepIndex {
        progression::current_step_index(&self.steps)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_count() == StepIndex::COUNT
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.completed_count() > 0
    }

    /// When the final step was signed, once every step is complete.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        if !self.is_complete() {
            return None;
        }
        self.step(StepIndex::LAST)
            .sign_off()
            .map(SignOff::completed_at)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn build_student() -> Student {
        Student::new(
            StudentId::generate(),
            "Ana Lopez",
            Some("9".into()),
            fixed_now(),
        )
        .unwrap()
    }

    fn step(n: u8) -> StepIndex {
        StepIndex::new(n).unwrap()
    }

    #[test]
    fn student_new_rejects_empty_name() {
        let err = Student::new(StudentId::generate(), "  ", None, fixed_now()).unwrap_err();
        assert_eq!(err, StudentError::EmptyName);
    }

    #[test]
    fn student_trims_name_and_filters_blank_grade() {
        let student =
            Student::new(StudentId::generate(), "  Ana  ", Some(" ".into()), fixed_now()).unwrap();
        assert_eq!(student.name(), "Ana");
        assert_eq!(student.grade(), None);
    }

    #[test]
    fn fresh_student_starts_at_step_one() {
        let student = build_student();
        assert_eq!(student.current_step_index(), StepIndex::FIRST);
        assert_eq!(student.percent_complete(), 0);
        assert!(!student.is_started());
        assert!(student.steps().all(|(_, s)| *s == StepStatus::Pending));
    }

    #[test]
    fn signing_in_order_walks_progress() {
        let mut student = build_student();
        let expected: [u8; 7] = [14, 29, 43, 57, 71, 86, 100];
        for (i, pct) in (1..=7).zip(expected) {
            student
                .sign_step(step(i), "jd", None, fixed_now())
                .unwrap();
            assert_eq!(student.percent_complete(), pct);
            let current = if i < 7 { i + 1 } else { 7 };
            assert_eq!(student.current_step_index(), step(current));
        }
        assert!(student.is_complete());
        assert_eq!(student.completed_at(), Some(fixed_now()));
    }

    #[test]
    fn empty_initials_leave_student_unchanged() {
        let mut student = build_student();
        let before = student.clone();
        let err = student
            .sign_step(StepIndex::FIRST, "   ", Some("note"), fixed_now())
            .unwrap_err();
        assert_eq!(err, ProgressError::EmptyInitials);
        assert_eq!(student, before);
    }

    #[test]
    fn locked_step_is_rejected() {
        let mut student = build_student();
        student
            .sign_step(StepIndex::FIRST, "jd", None, fixed_now())
            .unwrap();
        let before = student.clone();
        let err = student
            .sign_step(step(3), "jd", None, fixed_now())
            .unwrap_err();
        assert_eq!(err, ProgressError::StepLocked { index: 3 });
        assert_eq!(student, before);
    }

    #[test]
    fn re_signing_is_last_write_wins() {
        let mut student = build_student();
        student
            .sign_step(StepIndex::FIRST, "ab", Some("first"), fixed_now())
            .unwrap();
        let later = fixed_now() + Duration::minutes(10);
        student
            .sign_step(StepIndex::FIRST, "cd", None, later)
            .unwrap();

        let sign_off = student.step(StepIndex::FIRST).sign_off().unwrap();
        assert_eq!(sign_off.initials(), "CD");
        assert_eq!(sign_off.note(), None);
        assert_eq!(sign_off.completed_at(), later);
        assert_eq!(student.completed_count(), 1);
    }

    #[test]
    fn reset_keeps_identity_and_clears_steps() {
        let mut student = build_student();
        for i in 1..=7 {
            student.sign_step(step(i), "jd", None, fixed_now()).unwrap();
        }
        let id = student.id();
        student.reset();

        assert_eq!(student.id(), id);
        assert_eq!(student.name(), "Ana Lopez");
        assert_eq!(student.grade(), Some("9"));
        assert_eq!(student.created_at(), fixed_now());
        assert_eq!(student.percent_complete(), 0);
        for i in 1..=7 {
            assert_eq!(student.is_locked(step(i)), i > 1);
        }
    }

    #[test]
    fn from_persisted_rejects_gating_violation() {
        let mut steps = progression::pending_steps();
        steps[2] = StepStatus::Completed(SignOff::new("jd", None, fixed_now()).unwrap());
        let err = Student::from_persisted(StudentId::generate(), "Ana", None, fixed_now(), steps)
            .unwrap_err();
        assert_eq!(err, StudentError::GatingViolation { index: 3 });
    }
}
