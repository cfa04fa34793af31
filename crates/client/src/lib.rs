#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod exam;
pub mod http;
pub mod quiz_api;

pub use remember_core::Clock;

pub use config::{ConfigError, QuizServiceConfig};
pub use error::{ApiError, ExamServiceError};
pub use exam::{ExamService, SubmissionResult};
pub use http::HttpQuizApi;
pub use quiz_api::{ExamHistoryItem, QuizApi, RetryOptions, StartedExam};
