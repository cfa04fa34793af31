mod service;

// Public API of the exam subsystem.
pub use crate::error::ExamServiceError;
pub use service::{ExamService, SubmissionResult};
