use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::model::ids::{QuestionId, SessionId};
use crate::model::progress::Progress;
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamSessionError {
    #[error("no questions available for this attempt")]
    Empty,

    #[error("question count {questions} does not match reported total {total}")]
    CountMismatch { total: u32, questions: usize },

    #[error("attempt already completed")]
    Completed,

    #[error("a submission is still being graded")]
    AwaitingResult,

    #[error("already at the first question")]
    AtFirstQuestion,

    #[error("no incorrect questions to retry")]
    NothingToRetry,
}

/// Local record of how a question was last graded in this attempt.
///
/// Kept so an optimistic update can be undone when the service rejects
/// the submission it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    pub is_correct: bool,
}

/// State captured before an optimistic update, sufficient to restore the
/// session if the submission fails.
#[derive(Debug, Clone, PartialEq)]
struct AnswerSnapshot {
    progress: Progress,
    index: usize,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    previous_record: Option<AnswerRecord>,
}

/// Token for one in-flight answer submission.
///
/// Returned by [`ExamSession::begin_answer`]; hand it back to
/// [`ExamSession::reconcile_answer`] together with the request outcome.
/// The embedded session id is what makes stale responses detectable after
/// the session has been replaced by a retry.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAnswer {
    session_id: SessionId,
    question_id: QuestionId,
    is_correct: bool,
    snapshot: AnswerSnapshot,
}

impl PendingAnswer {
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

/// What the quiz service said about one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Authoritative progress returned by the service.
    Confirmed(Progress),
    /// The request failed; the optimistic update must be undone.
    Failed,
}

/// Result of feeding a request outcome back into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Reconciliation {
    /// Server progress applied, local preview discarded.
    Confirmed,
    /// Optimistic update rolled back to the pre-submission snapshot.
    RolledBack,
    /// The response no longer matches the current session and was ignored.
    Stale,
}

/// One quiz attempt, from start to completion or termination.
///
/// Owns the full client-side state of the attempt: the ordered question
/// list, the cursor, optimistic progress, and the per-question answer
/// records needed for rollback. All mutation happens through `&mut self`
/// on one logical thread; correctness relies on the strict ordering of
/// snapshot, optimistic update, and later reconciliation — never on
/// locking.
///
/// Submissions are split into a synchronous [`begin_answer`] (snapshot,
/// optimistic progress, cursor advance) and an asynchronous-agnostic
/// [`reconcile_answer`] so callers can keep several requests in flight
/// while the learner moves on.
///
/// [`begin_answer`]: ExamSession::begin_answer
/// [`reconcile_answer`]: ExamSession::reconcile_answer
pub struct ExamSession {
    session_id: SessionId,
    questions: Vec<Question>,
    index: usize,
    progress: Progress,
    answers: HashMap<QuestionId, AnswerRecord>,
    pending_submissions: u32,
    awaiting_result: bool,
    completed: bool,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    /// Build a session from a start (or retry) response.
    ///
    /// `started_at` should come from the caller's clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Empty` when no questions were issued and
    /// `ExamSessionError::CountMismatch` when the reported total disagrees
    /// with the question list.
    pub fn new(
        session_id: SessionId,
        questions: Vec<Question>,
        total: u32,
        started_at: DateTime<Utc>,
    ) -> Result<Self, ExamSessionError> {
        if questions.is_empty() {
            return Err(ExamSessionError::Empty);
        }
        if questions.len() != total as usize {
            return Err(ExamSessionError::CountMismatch {
                total,
                questions: questions.len(),
            });
        }

        Ok(Self {
            session_id,
            questions,
            index: 0,
            progress: Progress::fresh(session_id, total),
            answers: HashMap::new(),
            pending_submissions: 0,
            awaiting_result: false,
            completed: false,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.progress.total
    }

    /// 0-based cursor into the question list.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.completed {
            None
        } else {
            self.questions.get(self.index)
        }
    }

    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<AnswerRecord> {
        self.answers.get(&question_id).copied()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// True while grading input should stay locked.
    ///
    /// Set when a submission starts and released when the next question is
    /// shown; after the optimistic completion it releases only once every
    /// in-flight submission has resolved.
    #[must_use]
    pub fn is_awaiting_result(&self) -> bool {
        self.awaiting_result
    }

    /// Number of submissions currently in flight.
    #[must_use]
    pub fn pending_submissions(&self) -> u32 {
        self.pending_submissions
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// True when the last known progress leaves something to retry.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        !self.progress.incorrect_question_ids.is_empty()
    }

    /// Record a self-reported grade for the current question and advance.
    ///
    /// Applies the optimistic progress update and moves the cursor (or,
    /// on the last question, takes the optimistic completion) before any
    /// network traffic happens, then hands back the token the caller must
    /// return through [`ExamSession::reconcile_answer`] once the request
    /// resolves.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Completed` after the attempt finished
    /// and `ExamSessionError::AwaitingResult` while the current question
    /// is still being graded.
    pub fn begin_answer(
        &mut self,
        is_correct: bool,
        answered_at: DateTime<Utc>,
    ) -> Result<PendingAnswer, ExamSessionError> {
        if self.completed {
            return Err(ExamSessionError::Completed);
        }
        if self.awaiting_result {
            return Err(ExamSessionError::AwaitingResult);
        }
        let question_id = self
            .questions
            .get(self.index)
            .ok_or(ExamSessionError::Completed)?
            .id;

        let previous_record = self.answers.get(&question_id).copied();
        let snapshot = AnswerSnapshot {
            progress: self.progress.clone(),
            index: self.index,
            completed: self.completed,
            completed_at: self.completed_at,
            previous_record,
        };

        self.progress.record_answer(
            question_id,
            is_correct,
            previous_record.map(|record| record.is_correct),
        );
        self.answers.insert(question_id, AnswerRecord { is_correct });

        self.awaiting_result = true;
        self.pending_submissions += 1;

        let was_last = self.index + 1 >= self.questions.len();
        if was_last {
            // Optimistic completion: the summary shows before the last
            // submission resolves and is undone if that submission fails.
            self.completed = true;
            self.completed_at = Some(answered_at);
        } else {
            self.index += 1;
            self.awaiting_result = false;
        }

        Ok(PendingAnswer {
            session_id: self.session_id,
            question_id,
            is_correct,
            snapshot,
        })
    }

    /// Feed a submission outcome back into the session.
    ///
    /// Confirmed outcomes replace the optimistic preview with the server's
    /// authoritative progress. Failed outcomes restore the snapshot taken
    /// by [`ExamSession::begin_answer`], including the per-question answer
    /// record and an optimistically taken completion. A token issued
    /// against another session id is ignored entirely.
    pub fn reconcile_answer(
        &mut self,
        pending: PendingAnswer,
        outcome: AnswerOutcome,
    ) -> Reconciliation {
        if pending.session_id != self.session_id {
            return Reconciliation::Stale;
        }

        self.pending_submissions = self.pending_submissions.saturating_sub(1);

        let result = match outcome {
            AnswerOutcome::Confirmed(server) => {
                if server.session_id == self.session_id {
                    self.progress = server;
                    Reconciliation::Confirmed
                } else {
                    Reconciliation::Stale
                }
            }
            AnswerOutcome::Failed => {
                let snapshot = pending.snapshot;
                self.progress = snapshot.progress;
                self.index = snapshot.index;
                self.completed = snapshot.completed;
                self.completed_at = snapshot.completed_at;
                match snapshot.previous_record {
                    Some(record) => {
                        self.answers.insert(pending.question_id, record);
                    }
                    None => {
                        self.answers.remove(&pending.question_id);
                    }
                }
                // The rolled-back question is shown again, input enabled.
                self.awaiting_result = false;
                Reconciliation::RolledBack
            }
        };

        if self.pending_submissions == 0 {
            self.awaiting_result = false;
        }

        result
    }

    /// Replace local progress with a freshly fetched authoritative one.
    ///
    /// Used by progress refreshes outside the answer flow; the same stale
    /// guard applies.
    pub fn apply_progress(&mut self, progress: Progress) -> Reconciliation {
        if progress.session_id != self.session_id {
            return Reconciliation::Stale;
        }
        self.progress = progress;
        Reconciliation::Confirmed
    }

    /// Step back to the previous question. Purely local, no network call.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Completed` after completion,
    /// `ExamSessionError::AwaitingResult` while grading is locked, and
    /// `ExamSessionError::AtFirstQuestion` at index 0.
    pub fn previous(&mut self) -> Result<(), ExamSessionError> {
        if self.completed {
            return Err(ExamSessionError::Completed);
        }
        if self.awaiting_result {
            return Err(ExamSessionError::AwaitingResult);
        }
        if self.index == 0 {
            return Err(ExamSessionError::AtFirstQuestion);
        }
        self.index -= 1;
        Ok(())
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("session_id", &self.session_id)
            .field("questions_len", &self.questions.len())
            .field("index", &self.index)
            .field("progress", &self.progress)
            .field("pending_submissions", &self.pending_submissions)
            .field("awaiting_result", &self.awaiting_result)
            .field("completed", &self.completed)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::WordId;
    use crate::model::score::{ExamOutcome, PassThreshold};
    use crate::time::fixed_now;

    fn build_question(id: i64, position: u32) -> Question {
        Question {
            id: QuestionId::new(id),
            word_id: WordId::new(id * 10),
            position,
            prompt: format!("Q{id}"),
            answer: format!("A{id}"),
            star: 0,
            reading: None,
        }
    }

    fn build_session(count: i64) -> ExamSession {
        let questions = (1..=count)
            .map(|id| build_question(id, u32::try_from(id).unwrap()))
            .collect::<Vec<_>>();
        ExamSession::new(
            SessionId::new(77),
            questions,
            u32::try_from(count).unwrap(),
            fixed_now(),
        )
        .unwrap()
    }

    fn server_progress(session: &ExamSession) -> Progress {
        session.progress().clone()
    }

    #[test]
    fn empty_or_mismatched_responses_are_rejected() {
        let err = ExamSession::new(SessionId::new(1), Vec::new(), 0, fixed_now()).unwrap_err();
        assert_eq!(err, ExamSessionError::Empty);

        let err = ExamSession::new(
            SessionId::new(1),
            vec![build_question(1, 1)],
            3,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ExamSessionError::CountMismatch {
                total: 3,
                questions: 1
            }
        );
    }

    #[test]
    fn three_question_attempt_previews_expected_progress() {
        let mut session = build_session(3);

        for (correct, expected_index) in [(true, 1), (false, 2)] {
            let pending = session.begin_answer(correct, fixed_now()).unwrap();
            assert_eq!(session.index(), expected_index);
            assert!(!session.is_awaiting_result());
            let outcome = AnswerOutcome::Confirmed(server_progress(&session));
            assert_eq!(
                session.reconcile_answer(pending, outcome),
                Reconciliation::Confirmed
            );
        }
        let pending = session.begin_answer(true, fixed_now()).unwrap();

        let progress = session.progress();
        assert_eq!(progress.answered, 3);
        assert_eq!(progress.correct, 2);
        assert_eq!(progress.remaining, 0);
        assert_eq!(progress.incorrect_question_ids, vec![QuestionId::new(2)]);
        assert!(session.is_complete());

        let outcome = ExamOutcome::from_progress(progress, PassThreshold::default());
        assert_eq!(outcome.score, 66.7);
        assert!(!outcome.passed);

        let _ = session.reconcile_answer(
            pending,
            AnswerOutcome::Confirmed(server_progress(&session)),
        );
    }

    #[test]
    fn last_question_failure_rolls_back_the_completion() {
        let mut session = build_session(2);
        let pending = session.begin_answer(true, fixed_now()).unwrap();
        let _ = session.reconcile_answer(
            pending,
            AnswerOutcome::Confirmed(server_progress(&session)),
        );

        let before = session.progress().clone();
        let index_before = session.index();
        let pending = session.begin_answer(false, fixed_now()).unwrap();
        assert!(session.is_complete());
        assert!(session.is_awaiting_result());

        let result = session.reconcile_answer(pending, AnswerOutcome::Failed);
        assert_eq!(result, Reconciliation::RolledBack);
        assert!(!session.is_complete());
        assert!(!session.is_awaiting_result());
        assert_eq!(session.index(), index_before);
        assert_eq!(session.progress(), &before);
        assert_eq!(session.completed_at(), None);
        assert!(session.answer_for(QuestionId::new(2)).is_none());
    }

    #[test]
    fn rollback_restores_a_previous_answer_record() {
        let mut session = build_session(2);
        let pending = session.begin_answer(true, fixed_now()).unwrap();
        let _ = session.reconcile_answer(
            pending,
            AnswerOutcome::Confirmed(server_progress(&session)),
        );

        // Go back and re-answer the first question; the resubmission fails.
        session.previous().unwrap();
        let pending = session.begin_answer(false, fixed_now()).unwrap();
        let result = session.reconcile_answer(pending, AnswerOutcome::Failed);
        assert_eq!(result, Reconciliation::RolledBack);
        assert_eq!(
            session.answer_for(QuestionId::new(1)),
            Some(AnswerRecord { is_correct: true })
        );
        assert_eq!(session.progress().correct, 1);
    }

    #[test]
    fn pending_count_holds_the_lock_until_the_last_resolution() {
        let mut session = build_session(3);
        let first = session.begin_answer(true, fixed_now()).unwrap();
        let second = session.begin_answer(true, fixed_now()).unwrap();
        let third = session.begin_answer(true, fixed_now()).unwrap();

        assert_eq!(session.pending_submissions(), 3);
        assert!(session.is_complete());
        assert!(session.is_awaiting_result());

        for pending in [first, second] {
            let outcome = AnswerOutcome::Confirmed(server_progress(&session));
            let _ = session.reconcile_answer(pending, outcome);
            assert!(session.is_awaiting_result());
        }

        let outcome = AnswerOutcome::Confirmed(server_progress(&session));
        let _ = session.reconcile_answer(third, outcome);
        assert_eq!(session.pending_submissions(), 0);
        assert!(!session.is_awaiting_result());
    }

    #[test]
    fn reanswering_through_previous_updates_the_preview() {
        let mut session = build_session(3);
        let pending = session.begin_answer(true, fixed_now()).unwrap();
        let _ = session.reconcile_answer(
            pending,
            AnswerOutcome::Confirmed(server_progress(&session)),
        );

        session.previous().unwrap();
        let pending = session.begin_answer(false, fixed_now()).unwrap();
        assert_eq!(session.progress().answered, 1);
        assert_eq!(session.progress().correct, 0);
        assert_eq!(
            session.progress().incorrect_question_ids,
            vec![QuestionId::new(1)]
        );
        assert_eq!(session.index(), 1);
        let _ = session.reconcile_answer(
            pending,
            AnswerOutcome::Confirmed(server_progress(&session)),
        );
    }

    #[test]
    fn previous_is_guarded() {
        let mut session = build_session(2);
        assert_eq!(
            session.previous().unwrap_err(),
            ExamSessionError::AtFirstQuestion
        );

        let first = session.begin_answer(true, fixed_now()).unwrap();
        let second = session.begin_answer(true, fixed_now()).unwrap();
        assert_eq!(session.previous().unwrap_err(), ExamSessionError::Completed);
        assert_eq!(
            session.begin_answer(true, fixed_now()).unwrap_err(),
            ExamSessionError::Completed
        );

        for pending in [first, second] {
            let outcome = AnswerOutcome::Confirmed(server_progress(&session));
            let _ = session.reconcile_answer(pending, outcome);
        }
    }

    #[test]
    fn stale_tokens_and_payloads_are_ignored() {
        let mut old_session = build_session(2);
        let stale = old_session.begin_answer(true, fixed_now()).unwrap();

        let mut replacement = ExamSession::new(
            SessionId::new(78),
            vec![build_question(9, 1)],
            1,
            fixed_now(),
        )
        .unwrap();
        let before = replacement.progress().clone();

        let result =
            replacement.reconcile_answer(stale, AnswerOutcome::Confirmed(before.clone()));
        assert_eq!(result, Reconciliation::Stale);
        assert_eq!(replacement.progress(), &before);
        assert_eq!(replacement.pending_submissions(), 0);

        let foreign = Progress::fresh(SessionId::new(99), 5);
        assert_eq!(replacement.apply_progress(foreign), Reconciliation::Stale);
        assert_eq!(replacement.progress(), &before);
    }

    #[test]
    fn confirmed_outcome_adopts_server_progress() {
        let mut session = build_session(2);
        let pending = session.begin_answer(false, fixed_now()).unwrap();

        let mut server = Progress::fresh(session.session_id(), 2);
        server.answered = 1;
        server.correct = 0;
        server.remaining = 1;
        server.incorrect_question_ids = vec![QuestionId::new(1)];

        let result = session.reconcile_answer(pending, AnswerOutcome::Confirmed(server.clone()));
        assert_eq!(result, Reconciliation::Confirmed);
        assert_eq!(session.progress(), &server);
    }
}
