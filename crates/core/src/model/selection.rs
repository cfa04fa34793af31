use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{FolderId, GroupId, ProfileId};
use crate::model::question::MAX_STAR_RATING;

/// Which side of a word the prompt shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    TermToMeaning,
    MeaningToTerm,
}

/// Whether the attempt counts as a graded exam or a study run.
///
/// Exam mode is the only one where the service bumps a word's star score
/// on a first wrong answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    Study,
    #[default]
    Exam,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("at least one group must be selected")]
    NoGroups,

    #[error("question limit must be greater than zero")]
    InvalidLimit,

    #[error("star score {0} is out of range 0..={max}", max = MAX_STAR_RATING)]
    StarOutOfRange(u8),

    #[error("word number range must start at 1 or above")]
    NumberBelowOne,

    #[error("word number range start {start} is after end {end}")]
    NumberRangeReversed { start: u32, end: u32 },
}

/// Unvalidated selection input, as collected from the exam setup screen.
///
/// `group_id` is the legacy single-group field; `validate` merges it into
/// the front of a deduplicated `group_ids` list, matching what the quiz
/// service accepts.
#[derive(Debug, Clone, Default)]
pub struct ExamSelectionDraft {
    pub folder_id: Option<FolderId>,
    pub group_id: Option<GroupId>,
    pub group_ids: Vec<GroupId>,
    pub profile_id: Option<ProfileId>,
    pub limit: Option<u32>,
    pub random: Option<bool>,
    pub direction: Direction,
    pub mode: QuizMode,
    pub min_star: Option<u8>,
    pub star_values: Vec<u8>,
    pub number_start: Option<u32>,
    pub number_end: Option<u32>,
}

impl ExamSelectionDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft into a selection payload.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError` when no group survives merging, the limit
    /// or a star value is out of range, or the number range is malformed.
    pub fn validate(self) -> Result<ExamSelection, SelectionError> {
        let mut group_ids = Vec::new();
        if let Some(primary) = self.group_id {
            group_ids.push(primary);
        }
        for gid in self.group_ids {
            if !group_ids.contains(&gid) {
                group_ids.push(gid);
            }
        }
        if group_ids.is_empty() {
            return Err(SelectionError::NoGroups);
        }

        if self.limit == Some(0) {
            return Err(SelectionError::InvalidLimit);
        }

        if let Some(star) = self.min_star {
            if star > MAX_STAR_RATING {
                return Err(SelectionError::StarOutOfRange(star));
            }
        }
        let mut star_values: Vec<u8> = Vec::new();
        for star in self.star_values {
            if star > MAX_STAR_RATING {
                return Err(SelectionError::StarOutOfRange(star));
            }
            if !star_values.contains(&star) {
                star_values.push(star);
            }
        }
        star_values.sort_unstable();

        if matches!(self.number_start, Some(0)) || matches!(self.number_end, Some(0)) {
            return Err(SelectionError::NumberBelowOne);
        }
        if let (Some(start), Some(end)) = (self.number_start, self.number_end) {
            if start > end {
                return Err(SelectionError::NumberRangeReversed { start, end });
            }
        }

        Ok(ExamSelection {
            folder_id: self.folder_id,
            group_ids,
            profile_id: self.profile_id,
            limit: self.limit,
            random: self.random.unwrap_or(true),
            direction: self.direction,
            mode: self.mode,
            min_star: self.min_star,
            star_values,
            number_start: self.number_start,
            number_end: self.number_end,
        })
    }
}

/// Validated payload for starting a quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSelection {
    folder_id: Option<FolderId>,
    group_ids: Vec<GroupId>,
    profile_id: Option<ProfileId>,
    limit: Option<u32>,
    random: bool,
    direction: Direction,
    mode: QuizMode,
    min_star: Option<u8>,
    star_values: Vec<u8>,
    number_start: Option<u32>,
    number_end: Option<u32>,
}

impl ExamSelection {
    /// Convenience constructor for the common single-group exam.
    ///
    /// # Errors
    ///
    /// Never fails for a concrete group id; kept as `Result` so callers
    /// share one code path with `ExamSelectionDraft::validate`.
    pub fn for_group(group_id: GroupId) -> Result<Self, SelectionError> {
        ExamSelectionDraft {
            group_ids: vec![group_id],
            ..ExamSelectionDraft::new()
        }
        .validate()
    }

    #[must_use]
    pub fn folder_id(&self) -> Option<FolderId> {
        self.folder_id
    }

    /// Selected groups, primary group first, deduplicated.
    #[must_use]
    pub fn group_ids(&self) -> &[GroupId] {
        &self.group_ids
    }

    #[must_use]
    pub fn primary_group_id(&self) -> GroupId {
        self.group_ids[0]
    }

    #[must_use]
    pub fn profile_id(&self) -> Option<ProfileId> {
        self.profile_id
    }

    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    #[must_use]
    pub fn random(&self) -> bool {
        self.random
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn min_star(&self) -> Option<u8> {
        self.min_star
    }

    /// Selected star values, sorted and deduplicated. Empty means no filter.
    #[must_use]
    pub fn star_values(&self) -> &[u8] {
        &self.star_values
    }

    #[must_use]
    pub fn number_start(&self) -> Option<u32> {
        self.number_start
    }

    #[must_use]
    pub fn number_end(&self) -> Option<u32> {
        self.number_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_without_groups_is_rejected() {
        let err = ExamSelectionDraft::new().validate().unwrap_err();
        assert_eq!(err, SelectionError::NoGroups);
    }

    #[test]
    fn legacy_group_id_leads_and_duplicates_collapse() {
        let selection = ExamSelectionDraft {
            group_id: Some(GroupId::new(7)),
            group_ids: vec![GroupId::new(3), GroupId::new(7), GroupId::new(3)],
            ..ExamSelectionDraft::new()
        }
        .validate()
        .unwrap();

        assert_eq!(
            selection.group_ids(),
            &[GroupId::new(7), GroupId::new(3)]
        );
        assert_eq!(selection.primary_group_id(), GroupId::new(7));
        assert!(selection.random());
        assert_eq!(selection.direction(), Direction::TermToMeaning);
        assert_eq!(selection.mode(), QuizMode::Exam);
    }

    #[test]
    fn number_range_must_be_ordered_and_positive() {
        let reversed = ExamSelectionDraft {
            group_ids: vec![GroupId::new(1)],
            number_start: Some(5),
            number_end: Some(2),
            ..ExamSelectionDraft::new()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            reversed,
            SelectionError::NumberRangeReversed { start: 5, end: 2 }
        );

        let zero = ExamSelectionDraft {
            group_ids: vec![GroupId::new(1)],
            number_start: Some(0),
            ..ExamSelectionDraft::new()
        }
        .validate()
        .unwrap_err();
        assert_eq!(zero, SelectionError::NumberBelowOne);
    }

    #[test]
    fn star_values_are_sorted_and_bounded() {
        let selection = ExamSelectionDraft {
            group_ids: vec![GroupId::new(1)],
            star_values: vec![4, 1, 4, 0],
            ..ExamSelectionDraft::new()
        }
        .validate()
        .unwrap();
        assert_eq!(selection.star_values(), &[0, 1, 4]);

        let err = ExamSelectionDraft {
            group_ids: vec![GroupId::new(1)],
            min_star: Some(11),
            ..ExamSelectionDraft::new()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, SelectionError::StarOutOfRange(11));
    }
}
