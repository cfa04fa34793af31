use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, SessionId};

/// Progress of one quiz attempt.
///
/// The quiz service is the authority for these numbers after every round
/// trip; locally computed values (see [`Progress::record_answer`]) are a
/// best-effort preview and get overwritten by server data on arrival. In
/// particular `answered == correct + incorrect` is not guaranteed, since a
/// re-answer can drop an id from the incorrect set again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub session_id: SessionId,
    pub total: u32,
    pub answered: u32,
    pub correct: u32,
    pub remaining: u32,
    pub incorrect_question_ids: Vec<QuestionId>,
}

impl Progress {
    /// Progress of a just-started attempt: nothing answered yet.
    #[must_use]
    pub fn fresh(session_id: SessionId, total: u32) -> Self {
        Self {
            session_id,
            total,
            answered: 0,
            correct: 0,
            remaining: total,
            incorrect_question_ids: Vec::new(),
        }
    }

    /// Number of answered questions currently counted as wrong, floored at 0.
    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.answered.saturating_sub(self.correct)
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Apply one self-reported answer optimistically.
    ///
    /// `previous` is the grade this question got earlier in the same
    /// attempt, if any. `answered` only moves on a first answer; a
    /// re-answer (reachable through "previous" navigation) adjusts
    /// `correct` and the incorrect-id set when the grade flips and is a
    /// no-op otherwise.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        is_correct: bool,
        previous: Option<bool>,
    ) {
        match previous {
            None => {
                self.answered = self.total.min(self.answered + 1);
                if is_correct {
                    self.correct = self.total.min(self.correct + 1);
                }
            }
            Some(previous_correct) => {
                if previous_correct && !is_correct {
                    self.correct = self.correct.saturating_sub(1);
                } else if !previous_correct && is_correct {
                    self.correct = self.total.min(self.correct + 1);
                }
            }
        }

        if is_correct {
            self.incorrect_question_ids.retain(|id| *id != question_id);
        } else if !self.incorrect_question_ids.contains(&question_id) {
            self.incorrect_question_ids.push(question_id);
        }

        self.remaining = self.total.saturating_sub(self.answered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress() -> Progress {
        Progress::fresh(SessionId::new(1), 3)
    }

    #[test]
    fn first_answers_move_answered_and_correct() {
        let mut p = progress();
        p.record_answer(QuestionId::new(10), true, None);
        p.record_answer(QuestionId::new(11), false, None);

        assert_eq!(p.answered, 2);
        assert_eq!(p.correct, 1);
        assert_eq!(p.remaining, 1);
        assert_eq!(p.incorrect_question_ids, vec![QuestionId::new(11)]);
        assert_eq!(p.incorrect_count(), 1);
    }

    #[test]
    fn reanswer_flips_adjust_correct_but_never_answered() {
        let mut p = progress();
        let q = QuestionId::new(10);
        p.record_answer(q, true, None);
        assert_eq!((p.answered, p.correct), (1, 1));

        p.record_answer(q, false, Some(true));
        assert_eq!((p.answered, p.correct), (1, 0));
        assert_eq!(p.incorrect_question_ids, vec![q]);

        p.record_answer(q, true, Some(false));
        assert_eq!((p.answered, p.correct), (1, 1));
        assert!(p.incorrect_question_ids.is_empty());
    }

    #[test]
    fn reanswer_with_unchanged_grade_is_a_noop() {
        let mut p = progress();
        let q = QuestionId::new(10);
        p.record_answer(q, false, None);
        let before = p.clone();

        p.record_answer(q, false, Some(false));
        assert_eq!(p, before);
    }

    #[test]
    fn incorrect_count_is_floored_at_zero() {
        let mut p = progress();
        // Server-reconciled numbers can make correct exceed answered briefly.
        p.correct = 2;
        p.answered = 1;
        assert_eq!(p.incorrect_count(), 0);
    }
}
