//! Shared error types for the client crate.

use thiserror::Error;

use remember_core::model::{ExamSessionError, SelectionError};

use crate::config::ConfigError;

/// Errors emitted when talking to the quiz service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Non-2xx response; `detail` carries the service's message when the
    /// body was parseable, a generic fallback otherwise.
    #[error("{detail}")]
    Status {
        status: reqwest::StatusCode,
        detail: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(err) => err.status(),
        }
    }
}

/// Errors emitted by `ExamService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] ExamSessionError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
