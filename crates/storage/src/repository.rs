use async_trait::async_trait;
use checklist_core::model::Student;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::codec;

/// Key holding the serialized student collection.
pub const STUDENTS_KEY: &str = "regcheck.students";

/// Key holding the staff PIN.
pub const STAFF_PIN_KEY: &str = "regcheck.staff_pin";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String key/value persistence, the same contract a browser's local storage offers.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backend cannot be reached.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backend cannot be reached.
    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError>;
}

/// Repository contract for the student collection.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Load every student.
    ///
    /// A missing or malformed document loads as an empty collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    async fn load_students(&self) -> Result<Vec<Student>, StorageError>;

    /// Replace the stored collection with `students`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be encoded or stored.
    async fn save_students(&self, students: &[Student]) -> Result<(), StorageError>;
}

/// Repository contract for staff settings.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn get_staff_pin(&self) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn save_staff_pin(&self, pin: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> StudentRepository for T {
    async fn load_students(&self) -> Result<Vec<Student>, StorageError> {
        let Some(raw) = self.get_item(STUDENTS_KEY).await? else {
            tracing::debug!("no stored student collection, starting empty");
            return Ok(Vec::new());
        };
        let students = codec::decode_students_lenient(&raw);
        tracing::debug!(count = students.len(), "loaded students");
        Ok(students)
    }

    async fn save_students(&self, students: &[Student]) -> Result<(), StorageError> {
        let raw = codec::encode_students(students)?;
        self.set_item(STUDENTS_KEY, raw).await?;
        tracing::debug!(count = students.len(), "saved students");
        Ok(())
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> SettingsRepository for T {
    async fn get_staff_pin(&self) -> Result<Option<String>, StorageError> {
        self.get_item(STAFF_PIN_KEY).await
    }

    async fn save_staff_pin(&self, pin: &str) -> Result<(), StorageError> {
        self.set_item(STAFF_PIN_KEY, pin.to_owned()).await
    }
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Seed a raw value, bypassing the codec.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn with_raw(self, key: &str, value: impl Into<String>) -> Result<Self, StorageError> {
        self.items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .insert(key.to_owned(), value.into());
        Ok(self)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub students: Arc<dyn StudentRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryRepository::new())
    }

    /// Wire both repositories to one key/value backend.
    #[must_use]
    pub fn from_store<S: KeyValueStore + Clone + 'static>(store: S) -> Self {
        let students: Arc<dyn StudentRepository> = Arc::new(store.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(store);
        Self { students, settings }
    }
}
