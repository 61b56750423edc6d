use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, instrument};

use exam_core::model::{Question, ResultRecord};

use super::{ExamBackend, QuestionRequest};
use crate::config::BackendConfig;
use crate::error::BackendError;

const GENERATE_PATH: &str = "generate-questions";
const SUBMIT_PATH: &str = "submit-exam";

/// `ExamBackend` over the platform's REST API.
#[derive(Clone, Debug)]
pub struct HttpExamBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpExamBackend {
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ExamBackend for HttpExamBackend {
    #[instrument(skip(self), fields(subject = %request.subject, count = request.count))]
    async fn generate_questions(
        &self,
        request: &QuestionRequest,
    ) -> Result<Vec<Question>, BackendError> {
        let response = self
            .client
            .post(self.config.endpoint(GENERATE_PATH))
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let questions: Vec<Question> = response.json().await?;
        debug!(received = questions.len(), "questions generated");
        if questions.is_empty() {
            return Err(BackendError::NoQuestions {
                subject: request.subject.clone(),
            });
        }
        Ok(questions)
    }

    #[instrument(skip(self, record), fields(score = record.score, total = record.total_questions))]
    async fn submit_result(&self, record: &ResultRecord) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.config.endpoint(SUBMIT_PATH))
            .json(record)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.detail)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(BackendError::HttpStatus { status, detail })
}
