use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejections raised while signing a step.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("step {index} is outside the checklist (1..={})", StepIndex::COUNT)]
    StepOutOfRange { index: u8 },

    #[error("step {index} is locked until step {} is signed off", .index - 1)]
    StepLocked { index: u8 },

    #[error("staff initials are required")]
    EmptyInitials,
}

//
// ─── STEP INDEX ────────────────────────────────────────────────────────────────
//

/// 1-based position in the registration checklist.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepIndex(u8);

impl StepIndex {
    /// Number of steps every student walks through.
    pub const COUNT: usize = 7;
    pub const FIRST: StepIndex = StepIndex(1);
    pub const LAST: StepIndex = StepIndex(7);

    /// # Errors
    ///
    /// Returns `ProgressError::StepOutOfRange` unless `index` is in `1..=7`.
    pub fn new(index: u8) -> Result<Self, ProgressError> {
        if (1..=7).contains(&index) {
            Ok(Self(index))
        } else {
            Err(ProgressError::StepOutOfRange { index })
        }
    }

    /// All indexes in checklist order.
    pub fn all() -> impl DoubleEndedIterator<Item = StepIndex> + ExactSizeIterator {
        (1..=7).map(StepIndex)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Zero-based slot in a step array.
    #[must_use]
    pub fn slot(self) -> usize {
        usize::from(self.0 - 1)
    }

    #[must_use]
    pub fn previous(self) -> Option<StepIndex> {
        (self.0 > 1).then(|| StepIndex(self.0 - 1))
    }

    #[must_use]
    pub fn next(self) -> Option<StepIndex> {
        (self.0 < 7).then(|| StepIndex(self.0 + 1))
    }

    /// Catalog text for this step.
    #[must_use]
    pub fn entry(self) -> &'static CatalogEntry {
        &STEP_CATALOG[self.slot()]
    }
}

impl fmt::Debug for StepIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StepIndex({})", self.0)
    }
}

impl fmt::Display for StepIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for StepIndex {
    type Error = ProgressError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Display text for one checklist step. Shared by every student, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub index: u8,
    pub title: &'static str,
    pub location: &'static str,
    pub instructions: &'static str,
}

pub const STEP_CATALOG: [CatalogEntry; StepIndex::COUNT] = [
    CatalogEntry {
        index: 1,
        title: "Check-In",
        location: "Main Office",
        instructions: "Confirm the student's legal name and grade, and hand over the registration packet.",
    },
    CatalogEntry {
        index: 2,
        title: "Residency & Records",
        location: "Registrar's Window",
        instructions: "Collect proof of residency, birth certificate and prior school transcripts.",
    },
    CatalogEntry {
        index: 3,
        title: "Health Screening",
        location: "Nurse's Office",
        instructions: "Review immunization records and note any allergies or medication plans.",
    },
    CatalogEntry {
        index: 4,
        title: "Counselor Meeting",
        location: "Counseling Center",
        instructions: "Go over course placement and confirm the student's requested electives.",
    },
    CatalogEntry {
        index: 5,
        title: "Class Schedule",
        location: "Counseling Center",
        instructions: "Print the schedule and walk the student through their room numbers.",
    },
    CatalogEntry {
        index: 6,
        title: "ID Photo",
        location: "Library",
        instructions: "Take the student ID photo and issue a temporary ID card.",
    },
    CatalogEntry {
        index: 7,
        title: "Technology & Lockers",
        location: "Media Center",
        instructions: "Issue the device and locker assignment, then collect the signed use agreement.",
    },
];

//
// ─── SIGN-OFF ──────────────────────────────────────────────────────────────────
//

/// Maximum number of characters kept from staff initials.
pub const MAX_INITIALS_LEN: usize = 4;

/// Record of the staff member who completed a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOff {
    initials: String,
    note: Option<String>,
    completed_at: DateTime<Utc>,
}

impl SignOff {
    /// Normalizes initials (trimmed, upper-cased, capped) and drops a blank note.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::EmptyInitials` if the initials are blank.
    pub fn new(
        initials: &str,
        note: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        let capped: String = initials
            .trim()
            .chars()
            .flat_map(char::to_uppercase)
            .take(MAX_INITIALS_LEN)
            .collect();
        // The cap can stop on interior whitespace.
        let initials = capped.trim_end().to_owned();
        if initials.is_empty() {
            return Err(ProgressError::EmptyInitials);
        }

        let note = note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned);

        Ok(Self {
            initials,
            note,
            completed_at,
        })
    }

    #[must_use]
    pub fn initials(&self) -> &str {
        &self.initials
    }

    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

//
// ─── STEP STATUS ───────────────────────────────────────────────────────────────
//

/// Completion state of one step for one student.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Pending,
    Completed(SignOff),
}

impl StepStatus {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, StepStatus::Completed(_))
    }

    #[must_use]
    pub fn sign_off(&self) -> Option<&SignOff> {
        match self {
            StepStatus::Pending => None,
            StepStatus::Completed(sign_off) => Some(sign_off),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
