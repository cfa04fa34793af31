use async_trait::async_trait;
use chrono::{DateTime, Utc};

use remember_core::model::{
    Direction, ExamSelection, Progress, Question, QuestionId, SessionId,
};

use crate::error::ApiError;

/// Session identity and question list issued by a start or retry call.
#[derive(Debug, Clone, PartialEq)]
pub struct StartedExam {
    pub session_id: SessionId,
    pub total: u32,
    pub direction: Direction,
    pub questions: Vec<Question>,
}

/// Optional overrides for a retry call.
///
/// With the defaults the service re-issues every incorrect question and
/// keeps the original shuffle setting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryOptions {
    pub question_ids: Vec<QuestionId>,
    pub random: Option<bool>,
}

/// Presentation-agnostic list item for a past attempt.
///
/// No pre-formatted strings and no localization assumptions; the UI may
/// format scores and timestamps as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamHistoryItem {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub folder_name: Option<String>,
    pub group_names: Vec<String>,
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub score: f64,
    pub passed: bool,
}

/// Seam to the remote quiz service.
///
/// One method per endpoint; implementations translate wire payloads into
/// domain types at this boundary. All methods speak JSON over HTTP in the
/// real implementation and are fully mockable in tests.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// POST `/quizzes/start`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or service rejection.
    async fn start(&self, selection: &ExamSelection) -> Result<StartedExam, ApiError>;

    /// POST `/quizzes/{session_id}/answer` with a self-reported grade.
    /// The returned progress is authoritative.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or service rejection.
    async fn answer(
        &self,
        session_id: SessionId,
        question_id: QuestionId,
        is_correct: bool,
    ) -> Result<Progress, ApiError>;

    /// POST `/quizzes/{session_id}/retry`, scoped server-side to the
    /// previously incorrect questions unless `options` narrows them.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or service rejection.
    async fn retry(
        &self,
        session_id: SessionId,
        options: &RetryOptions,
    ) -> Result<StartedExam, ApiError>;

    /// DELETE `/quizzes/{session_id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or service rejection.
    async fn stop(&self, session_id: SessionId) -> Result<(), ApiError>;

    /// GET `/quizzes/{session_id}/progress`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or service rejection.
    async fn progress(&self, session_id: SessionId) -> Result<Progress, ApiError>;

    /// GET `/quizzes/history?limit=N`, newest first. `limit` is clamped to
    /// the service's 1..=100 range.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or service rejection.
    async fn history(&self, limit: u32) -> Result<Vec<ExamHistoryItem>, ApiError>;
}
