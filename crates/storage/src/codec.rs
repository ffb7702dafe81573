//! JSON shape of the persisted student collection.
//!
//! The document is an array of students, each carrying its seven step records:
//!
//! ```json
//! [{ "id": "…", "name": "Ana", "grade": "9", "createdAt": "…",
//!    "steps": [{ "step": 1, "completed": true, "initials": "JD", "completedAt": "…" }, …] }]
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use checklist_core::model::{
    ProgressError, SignOff, StepIndex, StepStatus, Student, StudentError, StudentId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::StorageError;

/// Reasons a persisted record cannot become a domain `Student`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
    #[error("expected {} steps, found {found}", StepIndex::COUNT)]
    StepCount { found: usize },

    #[error("step record at position {position} is labelled step {found}")]
    StepOrder { position: usize, found: u8 },

    #[error("step {step} is completed without initials and timestamp")]
    MissingSignOff { step: u8 },

    #[error("step {step} is pending but carries sign-off fields")]
    UnexpectedSignOff { step: u8 },

    #[error("student {id} appears more than once")]
    DuplicateId { id: StudentId },

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error(transparent)]
    Student(#[from] StudentError),
}

/// Persisted shape for one checklist step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step: u8,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepRecord {
    fn from_status(index: StepIndex, status: &StepStatus) -> Self {
        match status {
            StepStatus::Pending => Self {
                step: index.value(),
                completed: false,
                initials: None,
                note: None,
                completed_at: None,
            },
            StepStatus::Completed(sign_off) => Self {
                step: index.value(),
                completed: true,
                initials: Some(sign_off.initials().to_owned()),
                note: sign_off.note().map(str::to_owned),
                completed_at: Some(sign_off.completed_at()),
            },
        }
    }

    fn into_status(self) -> Result<StepStatus, RecordError> {
        let step = self.step;
        if !self.completed {
            if self.initials.is_some() || self.note.is_some() || self.completed_at.is_some() {
                return Err(RecordError::UnexpectedSignOff { step });
            }
            return Ok(StepStatus::Pending);
        }

        let (Some(initials), Some(completed_at)) = (self.initials, self.completed_at) else {
            return Err(RecordError::MissingSignOff { step });
        };
        let sign_off = SignOff::new(&initials, self.note.as_deref(), completed_at)?;
        Ok(StepStatus::Completed(sign_off))
    }
}

/// Persisted shape for a student.
///
/// Mirrors the domain `Student` so the codec can validate on the way back in
/// without leaking serde into the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: StudentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    pub created_at: DateTime<Utc>,
    pub steps: Vec<StepRecord>,
}

impl StudentRecord {
    #[must_use]
    pub fn from_student(student: &Student) -> Self {
        Self {
            id: student.id(),
            name: student.name().to_owned(),
            grade: student.grade().map(str::to_owned),
            created_at: student.created_at(),
            steps: student
                .steps()
                .map(|(index, status)| StepRecord::from_status(index, status))
                .collect(),
        }
    }

    /// Convert the record back into a domain `Student`.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if the step list is not exactly the seven catalog
    /// steps in order, a step's sign-off fields disagree with its completion
    /// flag, or the student fails domain validation.
    pub fn into_student(self) -> Result<Student, RecordError> {
        if self.steps.len() != StepIndex::COUNT {
            return Err(RecordError::StepCount {
                found: self.steps.len(),
            });
        }

        let mut statuses = Vec::with_capacity(StepIndex::COUNT);
        for (position, (index, record)) in StepIndex::all().zip(self.steps).enumerate() {
            if record.step != index.value() {
                return Err(RecordError::StepOrder {
                    position,
                    found: record.step,
                });
            }
            statuses.push(record.into_status()?);
        }
        let steps = statuses.try_into().map_err(|v: Vec<StepStatus>| {
            RecordError::StepCount { found: v.len() }
        })?;

        Ok(Student::from_persisted(
            self.id,
            self.name,
            self.grade,
            self.created_at,
            steps,
        )?)
    }
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Serialize a collection in compact form.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_students(students: &[Student]) -> Result<String, StorageError> {
    let records: Vec<StudentRecord> = students.iter().map(StudentRecord::from_student).collect();
    serde_json::to_string(&records).map_err(ser)
}

/// Serialize a collection as indented JSON, for files people may open.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_students_pretty(students: &[Student]) -> Result<String, StorageError> {
    let records: Vec<StudentRecord> = students.iter().map(StudentRecord::from_student).collect();
    serde_json::to_string_pretty(&records).map_err(ser)
}

/// Strictly decode a collection. Any bad record rejects the whole document.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed JSON, invariant
/// violations, or duplicate ids.
pub fn try_decode_students(raw: &str) -> Result<Vec<Student>, StorageError> {
    let records: Vec<StudentRecord> = serde_json::from_str(raw).map_err(ser)?;
    let mut seen = HashSet::with_capacity(records.len());
    let mut students = Vec::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id) {
            return Err(ser(RecordError::DuplicateId { id: record.id }));
        }
        students.push(record.into_student().map_err(ser)?);
    }
    Ok(students)
}

/// Decode a collection, treating anything malformed as an empty collection.
#[must_use]
pub fn decode_students_lenient(raw: &str) -> Vec<Student> {
    match try_decode_students(raw) {
        Ok(students) => students,
        Err(err) => {
            tracing::warn!(error = %err, bytes = raw.len(), "discarding malformed student collection");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_core::time::fixed_now;

    fn build_student(name: &str, signed: u8) -> Student {
        let mut student =
            Student::new(StudentId::generate(), name, Some("10".into()), fixed_now()).unwrap();
        for i in 1..=signed {
            student
                .sign_step(StepIndex::new(i).unwrap(), "rk", Some("ok"), fixed_now())
                .unwrap();
        }
        student
    }

    #[test]
    fn collection_round_trips() {
        let students = vec![build_student("Ana", 0), build_student("Ben", 4)];
        let raw = encode_students(&students).unwrap();
        let decoded = try_decode_students(&raw).unwrap();
        assert_eq!(decoded, students);
    }

    #[test]
    fn initials_cut_at_whitespace_survive_reload() {
        let mut student = build_student("Ana", 0);
        student
            .sign_step(StepIndex::FIRST, "a   b", None, fixed_now())
            .unwrap();

        let raw = encode_students(&[student.clone()]).unwrap();
        let decoded = try_decode_students(&raw).unwrap();
        assert_eq!(decoded, vec![student]);
        assert_eq!(
            decoded[0].step(StepIndex::FIRST).sign_off().map(SignOff::initials),
            Some("A")
        );
    }

    #[test]
    fn pending_steps_omit_sign_off_fields() {
        let raw = encode_students(&[build_student("Ana", 1)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let steps = value[0]["steps"].as_array().unwrap();
        assert_eq!(steps[0]["initials"], "RK");
        assert!(steps[0].get("completedAt").is_some());
        assert!(steps[1].get("initials").is_none());
        assert!(steps[1].get("completedAt").is_none());
    }

    #[test]
    fn malformed_json_decodes_to_empty() {
        assert!(decode_students_lenient("{not json").is_empty());
        assert!(decode_students_lenient("").is_empty());
        assert!(try_decode_students("{not json").is_err());
    }

    #[test]
    fn wrong_step_count_is_rejected() {
        let mut record = StudentRecord::from_student(&build_student("Ana", 0));
        record.steps.pop();
        assert_eq!(
            record.into_student().unwrap_err(),
            RecordError::StepCount { found: 6 }
        );
    }

    #[test]
    fn completed_step_without_initials_is_rejected() {
        let mut record = StudentRecord::from_student(&build_student("Ana", 1));
        record.steps[0].initials = None;
        assert_eq!(
            record.into_student().unwrap_err(),
            RecordError::MissingSignOff { step: 1 }
        );
    }

    #[test]
    fn pending_step_with_note_is_rejected() {
        let mut record = StudentRecord::from_student(&build_student("Ana", 0));
        record.steps[2].note = Some("stray".into());
        assert_eq!(
            record.into_student().unwrap_err(),
            RecordError::UnexpectedSignOff { step: 3 }
        );
    }

    #[test]
    fn duplicate_ids_reject_collection() {
        let student = build_student("Ana", 2);
        let raw = encode_students(&[student.clone(), student]).unwrap();
        assert!(try_decode_students(&raw).is_err());
        assert!(decode_students_lenient(&raw).is_empty());
    }
}
