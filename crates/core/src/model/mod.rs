mod ids;
mod step;
mod student;

pub use ids::{ParseIdError, StudentId};

pub use step::{
    CatalogEntry, MAX_INITIALS_LEN, ProgressError, STEP_CATALOG, SignOff, StepIndex, StepStatus,
};
pub use student::{Student, StudentError};
