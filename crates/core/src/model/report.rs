use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::exam::{Difficulty, ExamType};
use crate::model::scoring::{ExamScore, SubjectStats};

/// Everything a renderer needs to produce a results document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamReport {
    pub exam: ReportHeader,
    pub subjects: Vec<SubjectStats>,
    pub questions: Vec<ReviewItem>,
}

impl ExamReport {
    #[must_use]
    pub fn has_multiple_subjects(&self) -> bool {
        self.subjects.len() > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeader {
    pub exam_type: ExamType,
    pub subject: String,
    pub subject_label: String,
    pub difficulty: Difficulty,
    pub generated_at: DateTime<Utc>,
    pub score: ExamScore,
}

/// One question as shown on the results screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// 1-based position in the exam.
    pub number: usize,
    pub subject: Option<String>,
    pub text: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub correct: usize,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Correct,
    Incorrect,
    NotAnswered,
}

impl ReviewItem {
    #[must_use]
    pub fn outcome(&self) -> ReviewOutcome {
        match self.selected {
            None => ReviewOutcome::NotAnswered,
            Some(_) if self.is_correct => ReviewOutcome::Correct,
            Some(_) => ReviewOutcome::Incorrect,
        }
    }
}

/// Payload for the result-recording endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub username: String,
    pub subject: String,
    pub difficulty: Difficulty,
    pub score: u32,
    pub total_questions: u32,
}
