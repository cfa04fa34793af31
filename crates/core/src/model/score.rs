use serde::{Deserialize, Serialize};

use crate::model::progress::Progress;

/// One-decimal percentage score, 0.0 when nothing was answered.
#[must_use]
pub fn compute_score(correct: u32, answered: u32) -> f64 {
    if answered == 0 {
        return 0.0;
    }
    let value = f64::from(correct) / f64::from(answered) * 100.0;
    (value * 10.0).round() / 10.0
}

/// Fraction of correct answers required to pass an attempt.
///
/// Derived once per attempt from the learner profile's percent setting
/// and immutable for the attempt's lifetime; a changed setting only
/// applies to the next attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassThreshold {
    percent: f64,
}

impl PassThreshold {
    pub const DEFAULT_PERCENT: f64 = 90.0;

    /// Build a threshold from a 0–100 percent value.
    ///
    /// Non-finite input falls back to the default, everything else is
    /// clamped into range.
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            Self::DEFAULT_PERCENT
        };
        Self { percent }
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        self.percent
    }

    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.percent / 100.0
    }

    /// Pass check: an empty attempt never passes.
    #[must_use]
    pub fn is_passed(&self, correct: u32, total: u32) -> bool {
        if total == 0 {
            return false;
        }
        f64::from(correct) / f64::from(total) >= self.ratio()
    }
}

impl Default for PassThreshold {
    fn default() -> Self {
        Self::from_percent(Self::DEFAULT_PERCENT)
    }
}

/// Final result of a completed attempt, computed from authoritative
/// progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamOutcome {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub score: f64,
    pub passed: bool,
}

impl ExamOutcome {
    /// Score and pass state against the full question count, the way the
    /// end-of-attempt summary reports them.
    #[must_use]
    pub fn from_progress(progress: &Progress, threshold: PassThreshold) -> Self {
        let total = progress.total;
        let correct = progress.correct.min(total);
        Self {
            total,
            correct,
            incorrect: total.saturating_sub(correct),
            score: compute_score(correct, total),
            passed: threshold.is_passed(correct, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::SessionId;

    #[test]
    fn score_is_bounded_and_stable() {
        for total in 1..=10_u32 {
            for correct in 0..=total {
                let score = compute_score(correct, total);
                assert!((0.0..=100.0).contains(&score), "{correct}/{total}");
                assert_eq!(score, compute_score(correct, total));
            }
        }
        assert_eq!(compute_score(0, 0), 0.0);
        assert_eq!(compute_score(2, 3), 66.7);
    }

    #[test]
    fn default_threshold_pass_vectors() {
        let threshold = PassThreshold::default();
        assert!(threshold.is_passed(9, 10));
        assert!(!threshold.is_passed(8, 10));
        assert!(!threshold.is_passed(0, 0));
    }

    #[test]
    fn threshold_input_is_normalized() {
        assert_eq!(PassThreshold::from_percent(150.0).percent(), 100.0);
        assert_eq!(PassThreshold::from_percent(-3.0).percent(), 0.0);
        assert_eq!(
            PassThreshold::from_percent(f64::NAN).percent(),
            PassThreshold::DEFAULT_PERCENT
        );
        assert!(PassThreshold::from_percent(0.0).is_passed(0, 5));
    }

    #[test]
    fn outcome_reports_against_total() {
        let mut progress = Progress::fresh(SessionId::new(1), 3);
        progress.answered = 3;
        progress.correct = 2;
        progress.remaining = 0;

        let outcome = ExamOutcome::from_progress(&progress, PassThreshold::default());
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.correct, 2);
        assert_eq!(outcome.incorrect, 1);
        assert_eq!(outcome.score, 66.7);
        assert!(!outcome.passed);
    }
}
