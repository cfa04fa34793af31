mod ids;
mod progress;
mod question;
mod score;
pub mod selection;
mod session;

pub use ids::{FolderId, GroupId, ProfileId, QuestionId, SessionId, WordId};
pub use progress::Progress;
pub use question::{MAX_STAR_RATING, Question};
pub use score::{ExamOutcome, PassThreshold, compute_score};
pub use selection::{Direction, ExamSelection, ExamSelectionDraft, QuizMode, SelectionError};
pub use session::{
    AnswerOutcome, AnswerRecord, ExamSession, ExamSessionError, PendingAnswer, Reconciliation,
};
