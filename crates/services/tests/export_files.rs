use std::time::{SystemTime, UNIX_EPOCH};

use exam_core::model::{
    Difficulty, ExamMeta, ExamReport, ExamSession, ExamSpec, ExamType, Question, QuestionId,
};
use exam_core::time::fixed_now;
use serde_json::Value;
use services::{Clock, ExportFormat, export_file_name, export_json, export_pdf, write_export};

fn question(id: &str, subject: &str, correct: usize) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("A fairly long {subject} question that needs to wrap across more than one line of the results document"),
        vec!["Alpha".into(), "Beta".into(), "Gamma".into(), "Delta".into()],
        correct,
    )
    .with_explanation("Worked solution.")
    .with_subject(subject)
}

fn neet_report() -> ExamReport {
    let spec = ExamSpec::new(ExamType::Neet, Difficulty::Hard);
    let meta = ExamMeta::new(&spec, fixed_now());
    let questions = vec![
        question("p1", "Physics", 0),
        question("p2", "Physics", 1),
        question("c1", "Chemistry", 2),
    ];
    let mut session = ExamSession::new(meta, questions, 600).unwrap();
    session.select_answer(0, 0).unwrap();
    session.select_answer(1, 3).unwrap();
    session.submit();
    session.report(fixed_now()).unwrap()
}

fn scratch_dir(name: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("exam-export-{name}-{nanos}"))
}

#[test]
fn json_export_carries_score_and_answers() {
    let json: Value = serde_json::from_str(&export_json(&neet_report()).unwrap()).unwrap();

    assert_eq!(json["exam"]["examType"], "NEET");
    assert_eq!(json["exam"]["difficulty"], "Hard");
    assert_eq!(json["exam"]["totalQuestions"], 3);
    assert_eq!(json["exam"]["score"], 1);
    assert_eq!(json["exam"]["percentage"], 33);

    let questions = json["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["questionNumber"], 1);
    assert_eq!(questions[0]["isCorrect"], true);
    assert_eq!(questions[1]["userAnswer"], 3);
    assert_eq!(questions[1]["isCorrect"], false);
    assert_eq!(questions[2]["userAnswer"], Value::Null);
    assert_eq!(questions[2]["subject"], "Chemistry");

    let subjects = json["subjects"].as_array().unwrap();
    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects[0]["subject"], "Physics");
}

#[test]
fn pdf_export_produces_a_pdf_document() {
    let bytes = export_pdf(&neet_report());
    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.len() > 500);
}

#[test]
fn file_names_use_exam_code_or_subject() {
    let report = neet_report();
    assert_eq!(
        export_file_name(&report, ExportFormat::Pdf, 1_700_000_000_000),
        "exam-results-NEET-1700000000000.pdf"
    );
    assert_eq!(
        export_file_name(&report, ExportFormat::Json, 1_700_000_000_000),
        "exam-results-General-1700000000000.json"
    );

    let mut custom = report;
    custom.exam.exam_type = ExamType::Custom;
    custom.exam.subject = "Organic Chemistry".into();
    assert_eq!(
        export_file_name(&custom, ExportFormat::Json, 42),
        "exam-results-Organic-Chemistry-42.json"
    );
}

#[test]
fn write_export_creates_the_file() {
    let dir = scratch_dir("json");
    let path = write_export(
        &neet_report(),
        ExportFormat::Json,
        &dir,
        Clock::fixed(fixed_now()),
    )
    .unwrap();

    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("exam-results-General-1700000000000.json")
    );
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"questionNumber\": 1"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn unknown_format_is_rejected() {
    assert!("docx".parse::<ExportFormat>().is_err());
    assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
}
