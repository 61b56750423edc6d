use chrono::{DateTime, Utc};
use serde::Serialize;

use exam_core::model::{Difficulty, ExamReport, ExamType, SubjectStats};

use crate::error::ExportError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonResults<'a> {
    exam: JsonExam<'a>,
    subjects: &'a [SubjectStats],
    questions: Vec<JsonQuestion<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExam<'a> {
    exam_type: ExamType,
    subject: &'a str,
    difficulty: Difficulty,
    date: DateTime<Utc>,
    total_questions: u32,
    score: u32,
    percentage: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonQuestion<'a> {
    question_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    question: &'a str,
    options: &'a [String],
    user_answer: Option<usize>,
    correct_answer: usize,
    is_correct: bool,
    explanation: Option<&'a str>,
}

/// Pretty-printed JSON of the results, as offered for download.
///
/// # Errors
///
/// Returns `ExportError::Json` if serialization fails.
pub fn export_json(report: &ExamReport) -> Result<String, ExportError> {
    let header = &report.exam;
    let results = JsonResults {
        exam: JsonExam {
            exam_type: header.exam_type,
            subject: &header.subject,
            difficulty: header.difficulty,
            date: header.generated_at,
            total_questions: header.score.total,
            score: header.score.correct,
            percentage: header.score.percentage,
        },
        subjects: &report.subjects,
        questions: report
            .questions
            .iter()
            .map(|item| JsonQuestion {
                question_number: item.number,
                subject: item.subject.as_deref(),
                question: &item.text,
                options: &item.options,
                user_answer: item.selected,
                correct_answer: item.correct,
                is_correct: item.is_correct,
                explanation: item.explanation.as_deref(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&results)?)
}
