use std::sync::Arc;

use remember_core::Clock;
use remember_core::model::{
    AnswerOutcome, ExamOutcome, ExamSelection, ExamSession, ExamSessionError, PassThreshold,
    Progress, Reconciliation,
};

use crate::error::ExamServiceError;
use crate::quiz_api::{ExamHistoryItem, QuizApi, RetryOptions};

/// Result of one answered question, after reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub reconciliation: Reconciliation,
    pub is_complete: bool,
    pub progress: Progress,
}

/// Drives one exam attempt end-to-end against the remote quiz service.
///
/// Owns the time source, the API seam, and the attempt-scoped pass
/// threshold. There is no idle/starting state object: before [`start`]
/// succeeds the caller simply holds no [`ExamSession`], and a failed start
/// leaves it that way.
///
/// [`start`]: ExamService::start
#[derive(Clone)]
pub struct ExamService {
    api: Arc<dyn QuizApi>,
    clock: Clock,
    pass_threshold: PassThreshold,
}

impl ExamService {
    #[must_use]
    pub fn new(api: Arc<dyn QuizApi>) -> Self {
        Self {
            api,
            clock: Clock::default(),
            pass_threshold: PassThreshold::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Fix the pass threshold for attempts driven by this service.
    ///
    /// The percent comes from the learner profile at session start; it is
    /// normalized once here and a later profile change only applies to a
    /// service built for the next attempt.
    #[must_use]
    pub fn with_pass_threshold_percent(mut self, percent: f64) -> Self {
        self.pass_threshold = PassThreshold::from_percent(percent);
        self
    }

    #[must_use]
    pub fn pass_threshold(&self) -> PassThreshold {
        self.pass_threshold
    }

    /// Start a new attempt for the given selection.
    ///
    /// # Errors
    ///
    /// Returns `ExamServiceError::Api` when the service rejects the start
    /// and `ExamServiceError::Session` when the response is unusable
    /// (empty question list, total mismatch). Either way the caller holds
    /// no session and stays idle.
    pub async fn start(&self, selection: &ExamSelection) -> Result<ExamSession, ExamServiceError> {
        let started = self.api.start(selection).await?;
        let session = ExamSession::new(
            started.session_id,
            started.questions,
            started.total,
            self.clock.now(),
        )?;
        Ok(session)
    }

    /// Submit a self-reported grade for the current question.
    ///
    /// The optimistic update and cursor advance happen before the request
    /// is dispatched; on failure the session is rolled back to its
    /// pre-submission state and the error is returned for the caller to
    /// surface. Callers that want several submissions in flight at once
    /// drive [`ExamSession::begin_answer`] and
    /// [`ExamSession::reconcile_answer`] directly instead.
    ///
    /// # Errors
    ///
    /// Returns `ExamServiceError::Session` when the session refuses the
    /// submission and `ExamServiceError::Api` when the request fails
    /// (after rollback).
    pub async fn submit_answer(
        &self,
        session: &mut ExamSession,
        is_correct: bool,
    ) -> Result<SubmissionResult, ExamServiceError> {
        let pending = session.begin_answer(is_correct, self.clock.now())?;
        let request = self
            .api
            .answer(pending.session_id(), pending.question_id(), is_correct)
            .await;

        match request {
            Ok(progress) => {
                let reconciliation =
                    session.reconcile_answer(pending, AnswerOutcome::Confirmed(progress));
                if reconciliation == Reconciliation::Stale {
                    tracing::warn!(
                        session_id = %session.session_id(),
                        "discarded answer response for a replaced session"
                    );
                }
                Ok(SubmissionResult {
                    reconciliation,
                    is_complete: session.is_complete(),
                    progress: session.progress().clone(),
                })
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %session.session_id(),
                    error = %err,
                    "answer submission failed, rolling back optimistic update"
                );
                let _ = session.reconcile_answer(pending, AnswerOutcome::Failed);
                Err(err.into())
            }
        }
    }

    /// Start a replacement attempt scoped to the incorrect questions.
    ///
    /// Rejected locally, without any network call, when the last known
    /// progress has nothing to retry.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::NothingToRetry` (wrapped) on an empty
    /// incorrect set, otherwise API/session errors as for [`start`].
    ///
    /// [`start`]: ExamService::start
    pub async fn retry(&self, session: &ExamSession) -> Result<ExamSession, ExamServiceError> {
        self.retry_with_options(session, &RetryOptions::default())
            .await
    }

    /// [`retry`] with an explicit question subset or shuffle override.
    ///
    /// # Errors
    ///
    /// Same as [`retry`].
    ///
    /// [`retry`]: ExamService::retry
    pub async fn retry_with_options(
        &self,
        session: &ExamSession,
        options: &RetryOptions,
    ) -> Result<ExamSession, ExamServiceError> {
        if !session.can_retry() {
            return Err(ExamSessionError::NothingToRetry.into());
        }
        let started = self.api.retry(session.session_id(), options).await?;
        let replacement = ExamSession::new(
            started.session_id,
            started.questions,
            started.total,
            self.clock.now(),
        )?;
        Ok(replacement)
    }

    /// Stop the attempt and delete its record on the service.
    ///
    /// On success the caller discards the session; on failure the session
    /// is left untouched and remains fully usable, so stopping can be
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns `ExamServiceError::Api` when the delete call fails.
    pub async fn stop(&self, session: &ExamSession) -> Result<(), ExamServiceError> {
        self.api.stop(session.session_id()).await?;
        Ok(())
    }

    /// Re-fetch authoritative progress outside the answer flow.
    ///
    /// # Errors
    ///
    /// Returns `ExamServiceError::Api` when the fetch fails; a response
    /// for a replaced session is discarded and reported as
    /// `Reconciliation::Stale`.
    pub async fn refresh_progress(
        &self,
        session: &mut ExamSession,
    ) -> Result<Reconciliation, ExamServiceError> {
        let progress = self.api.progress(session.session_id()).await?;
        let reconciliation = session.apply_progress(progress);
        if reconciliation == Reconciliation::Stale {
            tracing::warn!(
                session_id = %session.session_id(),
                "discarded progress response for a replaced session"
            );
        }
        Ok(reconciliation)
    }

    /// Final score and pass state for the attempt's current progress.
    #[must_use]
    pub fn outcome(&self, session: &ExamSession) -> ExamOutcome {
        ExamOutcome::from_progress(session.progress(), self.pass_threshold)
    }

    /// Recent attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ExamServiceError::Api` when the fetch fails.
    pub async fn history(&self, limit: u32) -> Result<Vec<ExamHistoryItem>, ExamServiceError> {
        Ok(self.api.history(limit).await?)
    }
}
