use chrono::{DateTime, Utc};
use checklist_core::model::{StepIndex, Student, StudentId};

/// One line of a certificate: a checklist step and who signed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRow {
    pub index: StepIndex,
    pub title: &'static str,
    pub location: &'static str,
    pub initials: Option<String>,
    pub note: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub locked: bool,
}

/// Read-only summary of a student's checklist, ready to print.
///
/// A certificate for an unfinished student doubles as a progress report; check
/// [`Certificate::is_complete`] before presenting it as proof of registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub student_id: StudentId,
    pub student_name: String,
    pub grade: Option<String>,
    pub rows: Vec<CertificateRow>,
    pub percent_complete: u8,
    pub current_step: StepIndex,
    pub completed_at: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
}

impl Certificate {
    #[must_use]
    pub fn for_student(student: &Student, issued_at: DateTime<Utc>) -> Self {
        let rows = student
            .steps()
            .map(|(index, status)| {
                let entry = index.entry();
                let sign_off = status.sign_off();
                CertificateRow {
                    index,
                    title: entry.title,
                    location: entry.location,
                    initials: sign_off.map(|s| s.initials().to_owned()),
                    note: sign_off.and_then(|s| s.note()).map(str::to_owned),
                    completed_at: sign_off.map(|s| s.completed_at()),
                    locked: student.is_locked(index),
                }
            })
            .collect();

        Self {
            student_id: student.id(),
            student_name: student.name().to_owned(),
            grade: student.grade().map(str::to_owned),
            rows,
            percent_complete: student.percent_complete(),
            current_step: student.current_step_index(),
            completed_at: student.completed_at(),
            issued_at,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}
