use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Minimum number of options for a multiple-choice item.
pub const MIN_OPTIONS: usize = 2;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice item as returned by the question generator.
///
/// Option order is meaningful: `correct_answer` indexes into `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            options,
            correct_answer,
            explanation: None,
            subject: None,
            difficulty: None,
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Re-tag the question with the subject it was requested for.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Check the structural invariants the session relies on.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for blank text, too few options, or an answer index
    /// outside the option list.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        let len = self.options.len();
        if len < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions { len });
        }
        if self.correct_answer >= len {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: self.correct_answer,
                len,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_correct(&self, selected: Option<usize>) -> bool {
        selected == Some(self.correct_answer)
    }
}

/// Letter label for an option position: 0 → `A`, 1 → `B`, ...
///
/// Positions past `Z` fall back to the 1-based number.
#[must_use]
pub fn option_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(offset) if offset < 26 => char::from(b'A' + offset).to_string(),
        _ => (index + 1).to_string(),
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("question needs at least {MIN_OPTIONS} options, got {len}")]
    TooFewOptions { len: usize },

    #[error("correct answer {index} is outside the {len} options")]
    CorrectAnswerOutOfRange { index: usize, len: usize },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Question {
        Question::new(
            QuestionId::new("1"),
            "What is 2 + 2?",
            vec!["3".into(), "4".into(), "5".into()],
            1,
        )
    }

    #[test]
    fn valid_question_passes() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn blank_text_is_rejected() {
        let mut q = sample();
        q.text = "  ".into();
        assert_eq!(q.validate(), Err(QuestionError::EmptyText));
    }

    #[test]
    fn single_option_is_rejected() {
        let mut q = sample();
        q.options.truncate(1);
        q.correct_answer = 0;
        assert_eq!(q.validate(), Err(QuestionError::TooFewOptions { len: 1 }));
    }

    #[test]
    fn answer_index_must_point_at_an_option() {
        let mut q = sample();
        q.correct_answer = 3;
        assert_eq!(
            q.validate(),
            Err(QuestionError::CorrectAnswerOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn deserializes_backend_shape() {
        let raw = r#"{
            "id": "17",
            "text": "Unit of force?",
            "options": ["Newton", "Joule", "Watt", "Pascal"],
            "correctAnswer": 0,
            "explanation": "F = ma"
        }"#;
        let q: Question = serde_json::from_str(raw).unwrap();
        assert_eq!(q.id, QuestionId::new("17"));
        assert_eq!(q.correct_answer, 0);
        assert_eq!(q.explanation.as_deref(), Some("F = ma"));
        assert_eq!(q.subject, None);
    }

    #[test]
    fn with_subject_retags() {
        let q = sample().with_subject("Physics");
        assert_eq!(q.subject.as_deref(), Some("Physics"));
    }

    #[test]
    fn option_labels() {
        assert_eq!(option_label(0), "A");
        assert_eq!(option_label(3), "D");
        assert_eq!(option_label(25), "Z");
        assert_eq!(option_label(26), "27");
    }
}
