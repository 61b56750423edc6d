use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use exam_core::model::{ExamMeta, ExamSession, ExamSpec, Question, QuestionId};

use crate::Clock;
use crate::backend::{ExamBackend, FallbackQuestions, QuestionRequest};
use crate::error::{BackendError, ExamServiceError};

/// Fetches questions for an exam request and builds the session.
#[derive(Clone)]
pub struct ExamLoader {
    clock: Clock,
    backend: Arc<dyn ExamBackend>,
    fallback: bool,
}

impl ExamLoader {
    #[must_use]
    pub fn new(clock: Clock, backend: Arc<dyn ExamBackend>) -> Self {
        Self {
            clock,
            backend,
            fallback: false,
        }
    }

    /// Serve placeholder questions for subjects the backend fails on.
    #[must_use]
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Fetch every subject of the exam concurrently and start a session.
    ///
    /// Questions keep the subject order of the blueprint and are tagged with
    /// the subject they were requested for.
    ///
    /// # Errors
    ///
    /// Returns `ExamServiceError::Backend` when a subject cannot be fetched and
    /// fallback is off, or `ExamServiceError::Session` when the questions do not
    /// form a valid session (including an empty one).
    pub async fn load(&self, spec: &ExamSpec) -> Result<ExamSession, ExamServiceError> {
        let blueprint = spec.blueprint();
        let exam_type = spec.exam_type.is_configured().then_some(spec.exam_type);

        let requests: Vec<QuestionRequest> = blueprint
            .subjects
            .iter()
            .map(|subject| QuestionRequest {
                subject: subject.clone(),
                difficulty: spec.difficulty,
                count: blueprint.questions_per_subject,
                exam_type,
            })
            .collect();

        let batches = join_all(requests.iter().map(|request| self.fetch_subject(request))).await;

        let mut questions = Vec::new();
        for batch in batches {
            questions.extend(batch?);
        }
        ensure_unique_ids(&mut questions);

        let meta = ExamMeta::new(spec, self.clock.now());
        let session = ExamSession::new(meta, questions, blueprint.duration_seconds)?;
        info!(
            session_id = %session.meta().session_id,
            exam_type = %spec.exam_type,
            questions = session.len(),
            duration_seconds = session.duration_seconds(),
            "exam session started"
        );
        Ok(session)
    }

    async fn fetch_subject(&self, request: &QuestionRequest) -> Result<Vec<Question>, BackendError> {
        match self.backend.generate_questions(request).await {
            Ok(questions) => Ok(questions
                .into_iter()
                .map(|q| q.with_subject(request.subject.clone()))
                .collect()),
            Err(err) if self.fallback => {
                warn!(subject = %request.subject, error = %err, "question generation failed, using fallback questions");
                Ok(FallbackQuestions::generate(request))
            }
            Err(err) => Err(err),
        }
    }
}

/// Subjects are generated independently, so ids may repeat across batches.
fn ensure_unique_ids(questions: &mut [Question]) {
    let mut seen: HashSet<QuestionId> = HashSet::with_capacity(questions.len());
    for (index, question) in questions.iter_mut().enumerate() {
        if seen.contains(&question.id) {
            let subject = question.subject.as_deref().unwrap_or("q");
            let mut candidate = QuestionId::new(format!("{subject}-{}", question.id));
            if seen.contains(&candidate) {
                candidate = QuestionId::new(format!("{subject}-{}-{index}", question.id));
            }
            question.id = candidate;
        }
        seen.insert(question.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, subject: &str) -> Question {
        Question::new(QuestionId::new(id), "Q", vec!["a".into(), "b".into()], 0)
            .with_subject(subject)
    }

    #[test]
    fn repeated_ids_are_namespaced_by_subject() {
        let mut questions = vec![
            question("0", "Physics"),
            question("1", "Physics"),
            question("0", "Chemistry"),
            question("1", "Chemistry"),
        ];
        ensure_unique_ids(&mut questions);
        let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "Chemistry-0", "Chemistry-1"]);
    }
}
