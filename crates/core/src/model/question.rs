use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, WordId};

/// Highest star score a word can carry.
pub const MAX_STAR_RATING: u8 = 10;

/// One question of a quiz attempt, as issued by the quiz service.
///
/// The answer text is carried for on-demand reveal only; grading is
/// self-reported by the learner and never computed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub word_id: WordId,
    /// 1-based position within the attempt.
    pub position: u32,
    pub prompt: String,
    pub answer: String,
    pub star: u8,
    pub reading: Option<String>,
}

impl Question {
    /// True when the question carries a pronunciation hint.
    #[must_use]
    pub fn has_reading(&self) -> bool {
        self.reading.as_deref().is_some_and(|r| !r.is_empty())
    }
}
