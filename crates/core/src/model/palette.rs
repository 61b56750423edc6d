use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seconds under which the countdown is shown as urgent.
pub const LOW_TIME_THRESHOLD_SECS: u32 = 60;

/// Per-question flags shown in the question navigator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStatus {
    pub answered: bool,
    pub marked_for_review: bool,
}

/// Visual state of one navigator cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteCell {
    Unanswered,
    Answered,
    Marked,
    AnsweredAndMarked,
}

impl From<QuestionStatus> for PaletteCell {
    fn from(status: QuestionStatus) -> Self {
        match (status.answered, status.marked_for_review) {
            (true, true) => PaletteCell::AnsweredAndMarked,
            (true, false) => PaletteCell::Answered,
            (false, true) => PaletteCell::Marked,
            (false, false) => PaletteCell::Unanswered,
        }
    }
}

/// Counters under the navigator grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaletteSummary {
    pub answered: usize,
    pub not_answered: usize,
    pub marked: usize,
    /// Questions never answered nor flagged.
    pub not_visited: usize,
}

pub(crate) fn cells(total: usize, status: &BTreeMap<usize, QuestionStatus>) -> Vec<PaletteCell> {
    (0..total)
        .map(|index| PaletteCell::from(status.get(&index).copied().unwrap_or_default()))
        .collect()
}

pub(crate) fn summarize(total: usize, status: &BTreeMap<usize, QuestionStatus>) -> PaletteSummary {
    let answered = status.values().filter(|s| s.answered).count();
    let marked = status.values().filter(|s| s.marked_for_review).count();
    PaletteSummary {
        answered,
        not_answered: total.saturating_sub(answered),
        marked,
        not_visited: total.saturating_sub(status.len()),
    }
}

#[must_use]
pub fn is_low_time(remaining_seconds: u32) -> bool {
    remaining_seconds < LOW_TIME_THRESHOLD_SECS
}
