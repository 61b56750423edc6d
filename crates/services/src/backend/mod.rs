mod fallback;
mod http;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use exam_core::model::{Difficulty, ExamType, Question, ResultRecord};

use crate::error::BackendError;

pub use fallback::FallbackQuestions;
pub use http::HttpExamBackend;
pub use memory::InMemoryBackend;

/// Parameters of one question-generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub subject: String,
    pub difficulty: Difficulty,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_type: Option<ExamType>,
}

/// Remote collaborator that generates questions and records results.
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// Generate `request.count` questions for one subject.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the backend cannot be reached or rejects the call.
    async fn generate_questions(
        &self,
        request: &QuestionRequest,
    ) -> Result<Vec<Question>, BackendError>;

    /// Record the outcome of a submitted exam.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when delivery fails.
    async fn submit_result(&self, record: &ResultRecord) -> Result<(), BackendError>;
}
