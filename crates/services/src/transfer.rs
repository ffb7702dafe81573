use checklist_core::model::Student;
use storage::codec;

use crate::error::TransferError;
use crate::staff::StaffSession;
use crate::student_service::StudentService;

/// How imported students combine with the current roster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Discard the current roster.
    #[default]
    Replace,
    /// Overwrite students with matching ids and append the rest.
    Merge,
}

/// Outcome of an import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub added: usize,
    pub replaced: usize,
    pub total: usize,
}

impl StudentService {
    /// The roster as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Storage` if encoding fails.
    pub fn export_json(&self) -> Result<String, TransferError> {
        Ok(codec::encode_students_pretty(self.list())?)
    }

    /// Load students from exported JSON.
    ///
    /// Unlike loading from storage, import is strict: malformed input is
    /// rejected and the roster is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Malformed` for bad input and
    /// `TransferError::Students` if the new roster cannot be saved.
    pub async fn import_json(
        &mut self,
        _staff: &StaffSession,
        raw: &str,
        mode: ImportMode,
    ) -> Result<ImportReport, TransferError> {
        let incoming = codec::try_decode_students(raw).map_err(TransferError::Malformed)?;

        let (next, report) = match mode {
            ImportMode::Replace => {
                let report = ImportReport {
                    added: incoming.len(),
                    replaced: 0,
                    total: incoming.len(),
                };
                (incoming, report)
            }
            ImportMode::Merge => merge(self.list(), incoming),
        };

        self.replace_all(next).await?;
        tracing::info!(
            ?mode,
            added = report.added,
            replaced = report.replaced,
            total = report.total,
            "students imported"
        );
        Ok(report)
    }
}

fn merge(current: &[Student], incoming: Vec<Student>) -> (Vec<Student>, ImportReport) {
    let mut next = current.to_vec();
    let mut report = ImportReport::default();
    for student in incoming {
        match next.iter_mut().find(|s| s.id() == student.id()) {
            Some(slot) => {
                *slot = student;
                report.replaced += 1;
            }
            None => {
                next.push(student);
                report.added += 1;
            }
        }
    }
    report.total = next.len();
    (next, report)
}
