use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use exam_core::model::{Difficulty, ExamType, ResultRecord};
use services::{BackendConfig, BackendError, ExamBackend, HttpExamBackend, QuestionRequest};

type Received = Arc<Mutex<Vec<Value>>>;

async fn generate(State(received): State<Received>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    received.lock().unwrap().push(body.clone());
    match body["subject"].as_str() {
        Some("Physics") => (
            StatusCode::OK,
            Json(json!([
                {
                    "id": "p1",
                    "text": "What is the SI unit of force?",
                    "options": ["Joule", "Newton", "Watt", "Pascal"],
                    "correctAnswer": 1,
                    "explanation": "Force is measured in newtons."
                },
                {
                    "id": "p2",
                    "text": "Speed of light is closest to?",
                    "options": ["3e8 m/s", "3e6 m/s"],
                    "correctAnswer": 0
                }
            ])),
        ),
        Some("Empty") => (StatusCode::OK, Json(json!([]))),
        _ => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "Unknown subject" })),
        ),
    }
}

async fn submit(State(received): State<Received>, Json(body): Json<Value>) -> StatusCode {
    received.lock().unwrap().push(body);
    StatusCode::OK
}

/// Serve a stub backend on a random port and return its base url.
async fn spawn_stub(received: Received) -> String {
    let app = Router::new()
        .route("/api/generate-questions", post(generate))
        .route("/api/submit-exam", post(submit))
        .with_state(received);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{port}/api/")
}

fn backend(base_url: &str) -> HttpExamBackend {
    HttpExamBackend::new(BackendConfig::new(base_url).unwrap()).unwrap()
}

fn request(subject: &str) -> QuestionRequest {
    QuestionRequest {
        subject: subject.into(),
        difficulty: Difficulty::Medium,
        count: 2,
        exam_type: Some(ExamType::Neet),
    }
}

#[tokio::test]
async fn generates_questions_from_the_api() {
    let received = Received::default();
    let base_url = spawn_stub(Arc::clone(&received)).await;

    let questions = backend(&base_url)
        .generate_questions(&request("Physics"))
        .await
        .unwrap();

    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].id.as_str(), "p1");
    assert_eq!(questions[0].correct_answer, 1);
    assert_eq!(questions[0].explanation.as_deref(), Some("Force is measured in newtons."));
    assert!(questions[1].explanation.is_none());

    let bodies = received.lock().unwrap().clone();
    assert_eq!(
        bodies,
        [json!({
            "subject": "Physics",
            "difficulty": "Medium",
            "count": 2,
            "exam_type": "NEET"
        })]
    );
}

#[tokio::test]
async fn error_detail_is_surfaced() {
    let base_url = spawn_stub(Received::default()).await;

    let err = backend(&base_url)
        .generate_questions(&request("Astrology"))
        .await
        .unwrap_err();

    match err {
        BackendError::HttpStatus { status, detail } => {
            assert_eq!(status.as_u16(), 422);
            assert_eq!(detail, "Unknown subject");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_question_list_is_an_error() {
    let base_url = spawn_stub(Received::default()).await;

    let err = backend(&base_url)
        .generate_questions(&request("Empty"))
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::NoQuestions { subject } if subject == "Empty"));
}

#[tokio::test]
async fn submits_result_records() {
    let received = Received::default();
    let base_url = spawn_stub(Arc::clone(&received)).await;
    let record = ResultRecord {
        username: "asha".into(),
        subject: "Physics".into(),
        difficulty: Difficulty::Hard,
        score: 7,
        total_questions: 10,
    };

    backend(&base_url).submit_result(&record).await.unwrap();

    let bodies = received.lock().unwrap().clone();
    assert_eq!(
        bodies,
        [json!({
            "username": "asha",
            "subject": "Physics",
            "difficulty": "Hard",
            "score": 7,
            "total_questions": 10
        })]
    );
}

#[tokio::test]
async fn unreachable_backend_is_an_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = backend(&format!("http://127.0.0.1:{port}"))
        .generate_questions(&request("Physics"))
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Http(_)));
}
