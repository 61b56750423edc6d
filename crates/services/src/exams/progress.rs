use exam_core::model::{ExamSession, is_low_time};

/// Snapshot of a running exam, for status lines and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamProgress {
    pub total: usize,
    pub answered: usize,
    pub marked: usize,
    /// 0-based index of the question on screen.
    pub current: usize,
    pub remaining_seconds: u32,
    pub low_time: bool,
    pub is_submitted: bool,
}

impl ExamProgress {
    #[must_use]
    pub fn of(session: &ExamSession) -> Self {
        let summary = session.palette_summary();
        Self {
            total: session.len(),
            answered: summary.answered,
            marked: summary.marked,
            current: session.current_index(),
            remaining_seconds: session.remaining_seconds(),
            low_time: is_low_time(session.remaining_seconds()),
            is_submitted: session.is_submitted(),
        }
    }
}
