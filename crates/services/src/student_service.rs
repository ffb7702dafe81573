use std::sync::Arc;

use checklist_core::model::{StepIndex, Student, StudentId};
use storage::repository::StudentRepository;

use crate::Clock;
use crate::certificate::Certificate;
use crate::error::StudentServiceError;
use crate::staff::StaffSession;

/// Which students a search keeps, by progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StudentFilter {
    #[default]
    All,
    /// No step signed yet.
    NotStarted,
    /// At least one step signed, not all seven.
    InProgress,
    /// Every step signed.
    Completed,
}

impl StudentFilter {
    #[must_use]
    pub fn matches(self, student: &Student) -> bool {
        match self {
            StudentFilter::All => true,
            StudentFilter::NotStarted => !student.is_started(),
            StudentFilter::InProgress => student.is_started() && !student.is_complete(),
            StudentFilter::Completed => student.is_complete(),
        }
    }
}

/// Head counts across the roster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RosterSummary {
    pub total: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
}

/// Owns the in-memory student collection and keeps it in step with storage.
///
/// The collection is loaded once in [`StudentService::open`]. Every mutation
/// saves the whole collection before returning; when the save fails the
/// in-memory change is rolled back, so callers never observe unsaved state.
pub struct StudentService {
    clock: Clock,
    repo: Arc<dyn StudentRepository>,
    students: Vec<Student>,
}

impl StudentService {
    /// Load the collection from `repo`.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::Storage` if the backend fails. A malformed
    /// document is not an error and opens as an empty roster.
    pub async fn open(
        clock: Clock,
        repo: Arc<dyn StudentRepository>,
    ) -> Result<Self, StudentServiceError> {
        let students = repo.load_students().await?;
        tracing::debug!(count = students.len(), "student roster opened");
        Ok(Self {
            clock,
            repo,
            students,
        })
    }

    /// Students in creation order.
    #[must_use]
    pub fn list(&self) -> &[Student] {
        &self.students
    }

    #[must_use]
    pub fn get(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id() == id)
    }

    /// Resolve a full id or a unique leading fragment of one.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPrefix` when nothing matches and `AmbiguousPrefix`
    /// when more than one student does.
    pub fn resolve(&self, prefix: &str) -> Result<StudentId, StudentServiceError> {
        let needle = prefix.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(StudentServiceError::UnknownPrefix(prefix.to_owned()));
        }
        let matches: Vec<StudentId> = self
            .students
            .iter()
            .map(Student::id)
            .filter(|id| id.to_string().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [] => Err(StudentServiceError::UnknownPrefix(prefix.to_owned())),
            [id] => Ok(*id),
            _ => Err(StudentServiceError::AmbiguousPrefix {
                prefix: prefix.to_owned(),
                matches: matches.len(),
            }),
        }
    }

    /// Add a new student with every step pending.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::Student` for a blank name and
    /// `StudentServiceError::Storage` if the roster cannot be saved.
    pub async fn create_student(
        &mut self,
        name: &str,
        grade: Option<&str>,
    ) -> Result<StudentId, StudentServiceError> {
        let student = Student::new(
            StudentId::generate(),
            name,
            grade.map(str::to_owned),
            self.clock.now(),
        )?;
        let id = student.id();
        self.students.push(student);
        if let Err(err) = self.repo.save_students(&self.students).await {
            self.students.pop();
            return Err(err.into());
        }
        tracing::info!(student = %id, "student added");
        Ok(id)
    }

    /// Sign off `index` for a student.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::Progress` when the step is locked or the
    /// initials are blank, `NotFound` for an unknown id, and `Storage` if the
    /// roster cannot be saved. The roster is unchanged on any error.
    pub async fn sign_step(
        &mut self,
        _staff: &StaffSession,
        id: StudentId,
        index: StepIndex,
        initials: &str,
        note: Option<&str>,
    ) -> Result<&Student, StudentServiceError> {
        let now = self.clock.now();
        let student = self
            .update(id, |student| {
                student.sign_step(index, initials, note, now)?;
                Ok(())
            })
            .await?;
        tracing::info!(
            student = %id,
            step = index.value(),
            percent = student.percent_complete(),
            "step signed off"
        );
        Ok(student)
    }

    /// Return every step of a student to pending.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `Storage` if the roster cannot
    /// be saved.
    pub async fn reset_student(
        &mut self,
        _staff: &StaffSession,
        id: StudentId,
    ) -> Result<&Student, StudentServiceError> {
        let student = self
            .update(id, |student| {
                student.reset();
                Ok(())
            })
            .await?;
        tracing::info!(student = %id, "student progress reset");
        Ok(student)
    }

    /// Remove a student from the roster.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `Storage` if the roster cannot
    /// be saved.
    pub async fn delete_student(
        &mut self,
        _staff: &StaffSession,
        id: StudentId,
    ) -> Result<Student, StudentServiceError> {
        let pos = self.position(id)?;
        let removed = self.students.remove(pos);
        if let Err(err) = self.repo.save_students(&self.students).await {
            self.students.insert(pos, removed);
            return Err(err.into());
        }
        tracing::info!(student = %id, "student deleted");
        Ok(removed)
    }

    /// Case-insensitive match on name or grade, narrowed by `filter`.
    ///
    /// A blank query matches every student.
    #[must_use]
    pub fn search(&self, query: &str, filter: StudentFilter) -> Vec<&Student> {
        let needle = query.trim().to_lowercase();
        self.students
            .iter()
            .filter(|s| filter.matches(s))
            .filter(|s| {
                needle.is_empty()
                    || s.name().to_lowercase().contains(&needle)
                    || s.grade()
                        .is_some_and(|g| g.to_lowercase().contains(&needle))
            })
            .collect()
    }

    #[must_use]
    pub fn summary(&self) -> RosterSummary {
        self.students
            .iter()
            .fold(RosterSummary::default(), |mut acc, student| {
                acc.total += 1;
                if student.is_complete() {
                    acc.completed += 1;
                } else if student.is_started() {
                    acc.in_progress += 1;
                } else {
                    acc.not_started += 1;
                }
                acc
            })
    }

    /// Build the certificate view for a student, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn certificate(&self, id: StudentId) -> Result<Certificate, StudentServiceError> {
        let student = self.get(id).ok_or(StudentServiceError::NotFound(id))?;
        Ok(Certificate::for_student(student, self.clock.now()))
    }

    /// Swap in a whole new collection, saving it first.
    pub(crate) async fn replace_all(
        &mut self,
        students: Vec<Student>,
    ) -> Result<(), StudentServiceError> {
        self.repo.save_students(&students).await?;
        self.students = students;
        Ok(())
    }

    fn position(&self, id: StudentId) -> Result<usize, StudentServiceError> {
        self.students
            .iter()
            .position(|s| s.id() == id)
            .ok_or(StudentServiceError::NotFound(id))
    }

    async fn update<F>(&mut self, id: StudentId, apply: F) -> Result<&Student, StudentServiceError>
    where
        F: FnOnce(&mut Student) -> Result<(), StudentServiceError>,
    {
        let pos = self.position(id)?;
        let mut updated = self.students[pos].clone();
        apply(&mut updated)?;

        let previous = std::mem::replace(&mut self.students[pos], updated);
        if let Err(err) = self.repo.save_students(&self.students).await {
            self.students[pos] = previous;
            return Err(err.into());
        }
        Ok(&self.students[pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    async fn open_empty() -> StudentService {
        StudentService::open(fixed_clock(), Arc::new(InMemoryRepository::new()))
            .await
            .unwrap()
    }

    fn step(n: u8) -> StepIndex {
        StepIndex::new(n).unwrap()
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let mut service = open_empty().await;
        let err = service.create_student("   ", None).await.unwrap_err();
        assert!(matches!(err, StudentServiceError::Student(_)));
        assert!(service.list().is_empty());
    }

    #[tokio::test]
    async fn search_matches_name_and_grade() {
        let mut service = open_empty().await;
        service.create_student("Ana Lopez", Some("9")).await.unwrap();
        service.create_student("Ben Ortiz", Some("10")).await.unwrap();
        service.create_student("Cara Lind", None).await.unwrap();

        let names = |found: Vec<&Student>| found.iter().map(|s| s.name().to_owned()).collect::<Vec<_>>();
        assert_eq!(names(service.search("LO", StudentFilter::All)), ["Ana Lopez"]);
        assert_eq!(names(service.search("10", StudentFilter::All)), ["Ben Ortiz"]);
        assert_eq!(service.search("  ", StudentFilter::All).len(), 3);
        assert!(service.search("zzz", StudentFilter::All).is_empty());
    }

    #[tokio::test]
    async fn filter_and_summary_track_progress() {
        let mut service = open_empty().await;
        let staff = StaffSession::for_tests();
        let a = service.create_student("Ana", None).await.unwrap();
        let b = service.create_student("Ben", None).await.unwrap();
        service.create_student("Cy", None).await.unwrap();

        service
            .sign_step(&staff, a, step(1), "jd", None)
            .await
            .unwrap();
        for i in 1..=7 {
            service
                .sign_step(&staff, b, step(i), "jd", None)
                .await
                .unwrap();
        }

        assert_eq!(service.search("", StudentFilter::InProgress).len(), 1);
        assert_eq!(service.search("", StudentFilter::Completed)[0].id(), b);
        assert_eq!(
            service.summary(),
            RosterSummary {
                total: 3,
                not_started: 1,
                in_progress: 1,
                completed: 1,
            }
        );
    }

    #[tokio::test]
    async fn resolve_handles_prefixes() {
        let mut service = open_empty().await;
        let id = service.create_student("Ana", None).await.unwrap();
        assert_eq!(service.resolve(&id.short()).unwrap(), id);
        assert_eq!(service.resolve(&id.to_string().to_uppercase()).unwrap(), id);
        assert!(matches!(
            service.resolve("zz"),
            Err(StudentServiceError::UnknownPrefix(_))
        ));
    }

    #[tokio::test]
    async fn resolve_reports_ambiguous_prefix() {
        let mut service = open_empty().await;
        let roster = [
            "3f2a1c00-0000-4000-8000-000000000001",
            "3f2a1c00-0000-4000-8000-000000000002",
        ]
        .into_iter()
        .map(|raw| {
            let id: StudentId = raw.parse().unwrap();
            Student::new(id, "Twin", None, service.clock.now()).unwrap()
        })
        .collect();
        service.replace_all(roster).await.unwrap();

        assert!(matches!(
            service.resolve("3F2A"),
            Err(StudentServiceError::AmbiguousPrefix { matches: 2, .. })
        ));
        let second: StudentId = "3f2a1c00-0000-4000-8000-000000000002".parse().unwrap();
        assert!(matches!(
            service.resolve("3f2a1c00-0000-4000-8000-0000000000"),
            Err(StudentServiceError::AmbiguousPrefix { matches: 2, .. })
        ));
        assert_eq!(service.resolve("3f2a1c00-0000-4000-8000-000000000002").unwrap(), second);
    }

    #[tokio::test]
    async fn delete_removes_student() {
        let mut service = open_empty().await;
        let staff = StaffSession::for_tests();
        let id = service.create_student("Ana", None).await.unwrap();
        let removed = service.delete_student(&staff, id).await.unwrap();
        assert_eq!(removed.id(), id);
        assert!(service.get(id).is_none());
        assert!(matches!(
            service.delete_student(&staff, id).await,
            Err(StudentServiceError::NotFound(_))
        ));
    }
}
