use std::sync::Arc;

use tracing::{info, warn};

use exam_core::model::{ExamSession, ResultRecord};

use crate::backend::ExamBackend;
use crate::error::{BackendError, ExamServiceError};
use crate::retry::{RetryPolicy, retry_with_policy};

/// What happened to the result record after submission.
#[derive(Debug)]
pub enum SubmissionDelivery {
    Delivered { attempts: usize },
    /// No user is signed in, so nothing was recorded.
    Skipped,
    /// Delivery gave up; the session and its score are untouched and the
    /// submission can be retried.
    Failed {
        record: ResultRecord,
        attempts: usize,
        error: BackendError,
    },
}

impl SubmissionDelivery {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, SubmissionDelivery::Delivered { .. })
    }
}

/// Posts a submitted session's result to the backend.
#[derive(Clone)]
pub struct ResultSubmitter {
    backend: Arc<dyn ExamBackend>,
    policy: RetryPolicy,
}

impl ResultSubmitter {
    #[must_use]
    pub fn new(backend: Arc<dyn ExamBackend>) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Record the result of `session` for `username`.
    ///
    /// Delivery problems are reported through `SubmissionDelivery::Failed`, never as
    /// an error, so callers keep showing the computed score.
    ///
    /// # Errors
    ///
    /// Returns `ExamServiceError::Session` if the session is not submitted yet.
    pub async fn submit(
        &self,
        session: &ExamSession,
        username: Option<&str>,
    ) -> Result<SubmissionDelivery, ExamServiceError> {
        let Some(username) = username else {
            // Unsubmitted sessions are rejected even without a user.
            session.score()?;
            info!(session_id = %session.meta().session_id, "no user configured, result not recorded");
            return Ok(SubmissionDelivery::Skipped);
        };

        let record = session.result_record(username)?;
        Ok(self.deliver(record).await)
    }

    /// Send an already built record, e.g. when retrying a failed delivery.
    pub async fn deliver(&self, record: ResultRecord) -> SubmissionDelivery {
        let backend = Arc::clone(&self.backend);
        let outcome = retry_with_policy(self.policy, |attempt| {
            let backend = Arc::clone(&backend);
            let record = record.clone();
            async move {
                let result = backend.submit_result(&record).await;
                if let Err(err) = &result {
                    warn!(attempt, error = %err, "result submission attempt failed");
                }
                result
            }
        })
        .await;

        match outcome {
            Ok(((), attempts)) => {
                info!(attempts, score = record.score, total = record.total_questions, "exam result recorded");
                SubmissionDelivery::Delivered { attempts }
            }
            Err((error, attempts)) => {
                warn!(attempts, error = %error, "giving up on result submission");
                SubmissionDelivery::Failed {
                    record,
                    attempts,
                    error,
                }
            }
        }
    }
}
