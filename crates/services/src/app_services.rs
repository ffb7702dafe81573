use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::staff::StaffService;
use crate::student_service::StudentService;

/// Assembles app-facing services over one storage backend.
pub struct AppServices {
    clock: Clock,
    students: StudentService,
    staff: StaffService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the initial
    /// roster load fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock).await
    }

    /// Build services over a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Students` if the roster cannot be loaded.
    pub async fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), clock).await
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Students` if the roster cannot be loaded.
    pub async fn from_storage(storage: Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let students = StudentService::open(clock, Arc::clone(&storage.students)).await?;
        let staff = StaffService::new(clock, Arc::clone(&storage.settings));
        Ok(Self {
            clock,
            students,
            staff,
        })
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn students(&self) -> &StudentService {
        &self.students
    }

    pub fn students_mut(&mut self) -> &mut StudentService {
        &mut self.students
    }

    #[must_use]
    pub fn staff(&self) -> &StaffService {
        &self.staff
    }
}
