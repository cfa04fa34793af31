use thiserror::Error;

use crate::model::{ExamSessionError, SelectionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Session(#[from] ExamSessionError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}
