use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::question::Question;

/// Whole-number percentage of `part / total`, rounding halves up.
///
/// Returns 0 for an empty total.
#[must_use]
pub fn percentage(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let part = u64::from(part);
    let total = u64::from(total);
    let rounded = (200 * part + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Final tally of a submitted exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamScore {
    pub correct: u32,
    pub incorrect: u32,
    pub unanswered: u32,
    pub total: u32,
    pub percentage: u32,
}

impl ExamScore {
    /// Everything that did not earn a point, answered or not.
    #[must_use]
    pub fn missed(&self) -> u32 {
        self.total - self.correct
    }
}

/// Per-subject slice of the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub subject: String,
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

pub(crate) fn score(questions: &[Question], answers: &BTreeMap<usize, usize>) -> ExamScore {
    let mut correct = 0_u32;
    let mut incorrect = 0_u32;
    let mut unanswered = 0_u32;

    for (index, question) in questions.iter().enumerate() {
        match answers.get(&index) {
            None => unanswered = unanswered.saturating_add(1),
            Some(&selected) if selected == question.correct_answer => {
                correct = correct.saturating_add(1);
            }
            Some(_) => incorrect = incorrect.saturating_add(1),
        }
    }

    let total = correct + incorrect + unanswered;
    ExamScore {
        correct,
        incorrect,
        unanswered,
        total,
        percentage: percentage(correct, total),
    }
}

/// Group by subject tag in first-appearance order; untagged questions land in
/// `default_subject`.
pub(crate) fn subject_breakdown(
    questions: &[Question],
    answers: &BTreeMap<usize, usize>,
    default_subject: &str,
) -> Vec<SubjectStats> {
    let mut buckets: Vec<SubjectStats> = Vec::new();

    for (index, question) in questions.iter().enumerate() {
        let subject = question.subject.as_deref().unwrap_or(default_subject);
        let position = match buckets.iter().position(|b| b.subject == subject) {
            Some(position) => position,
            None => {
                buckets.push(SubjectStats {
                    subject: subject.to_string(),
                    correct: 0,
                    total: 0,
                    percentage: 0,
                });
                buckets.len() - 1
            }
        };
        let bucket = &mut buckets[position];
        bucket.total += 1;
        if question.is_correct(answers.get(&index).copied()) {
            bucket.correct += 1;
        }
    }

    for bucket in &mut buckets {
        bucket.percentage = percentage(bucket.correct, bucket.total);
    }
    buckets
}
