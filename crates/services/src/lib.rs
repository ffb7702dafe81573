#![forbid(unsafe_code)]

pub mod app_services;
pub mod certificate;
pub mod error;
pub mod staff;
pub mod student_service;
pub mod transfer;

pub use checklist_core::Clock;

pub use app_services::AppServices;
pub use certificate::{Certificate, CertificateRow};
pub use error::{AppServicesError, StaffError, StudentServiceError, TransferError};
pub use staff::{
    DEFAULT_STAFF_PIN, PinAuthenticator, StaffAuthenticator, StaffService, StaffSession,
};
pub use student_service::{RosterSummary, StudentFilter, StudentService};
pub use transfer::{ImportMode, ImportReport};
