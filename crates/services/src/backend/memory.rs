use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use exam_core::model::{Question, ResultRecord};

use super::{ExamBackend, QuestionRequest};
use crate::error::BackendError;

#[derive(Default)]
struct State {
    questions: HashMap<String, Vec<Question>>,
    requests: Vec<QuestionRequest>,
    submissions: Vec<ResultRecord>,
    failing_submissions: usize,
}

/// Scripted backend for tests and offline runs.
///
/// Questions are served per subject; submissions are recorded and can be made
/// to fail a fixed number of times.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `questions` for `subject` (replacing any earlier set).
    #[must_use]
    pub fn with_questions(self, subject: impl Into<String>, questions: Vec<Question>) -> Self {
        if let Ok(mut guard) = self.state.lock() {
            guard.questions.insert(subject.into(), questions);
        }
        self
    }

    /// Make the next `count` submissions fail.
    pub fn fail_next_submissions(&self, count: usize) {
        if let Ok(mut guard) = self.state.lock() {
            guard.failing_submissions = count;
        }
    }

    #[must_use]
    pub fn requests(&self) -> Vec<QuestionRequest> {
        self.state
            .lock()
            .map(|guard| guard.requests.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn submissions(&self) -> Vec<ResultRecord> {
        self.state
            .lock()
            .map(|guard| guard.submissions.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExamBackend for InMemoryBackend {
    async fn generate_questions(
        &self,
        request: &QuestionRequest,
    ) -> Result<Vec<Question>, BackendError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        guard.requests.push(request.clone());

        let limit = usize::try_from(request.count).unwrap_or(usize::MAX);
        match guard.questions.get(&request.subject) {
            Some(questions) if !questions.is_empty() => {
                Ok(questions.iter().take(limit).cloned().collect())
            }
            _ => Err(BackendError::NoQuestions {
                subject: request.subject.clone(),
            }),
        }
    }

    async fn submit_result(&self, record: &ResultRecord) -> Result<(), BackendError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        if guard.failing_submissions > 0 {
            guard.failing_submissions -= 1;
            return Err(BackendError::Unavailable("scripted submission failure".into()));
        }
        guard.submissions.push(record.clone());
        Ok(())
    }
}
