#![forbid(unsafe_code)]

pub mod app_services;
pub mod backend;
pub mod config;
pub mod error;
pub mod exams;
pub mod export;
pub mod retry;

pub use exam_core::Clock;

pub use app_services::ExamServices;
pub use backend::{ExamBackend, FallbackQuestions, HttpExamBackend, InMemoryBackend, QuestionRequest};
pub use config::{AppConfig, BackendConfig};
pub use error::{BackendError, ConfigError, ExamServiceError, ExportError};
pub use exams::{
    CountdownTimer, EventOutcome, ExamDriver, ExamEvent, ExamLoader, ExamProgress, ResultSubmitter,
    SubmissionDelivery, TICK_PERIOD,
};
pub use export::{ExportFormat, export_file_name, export_json, export_pdf, write_export};
pub use retry::RetryPolicy;
