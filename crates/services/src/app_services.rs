use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::Clock;
use crate::backend::{ExamBackend, HttpExamBackend, InMemoryBackend};
use crate::config::AppConfig;
use crate::error::BackendError;
use crate::exams::{ExamLoader, ResultSubmitter};
use crate::retry::RetryPolicy;

/// Assembles the app-facing exam services from one `AppConfig`.
#[derive(Clone)]
pub struct ExamServices {
    clock: Clock,
    backend: Arc<dyn ExamBackend>,
    loader: Arc<ExamLoader>,
    submitter: Arc<ResultSubmitter>,
    username: Option<String>,
    export_dir: PathBuf,
}

impl ExamServices {
    /// Build services talking to the configured REST backend, or to an empty
    /// in-memory backend when `offline` is set.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig, clock: Clock, offline: bool) -> Result<Self, BackendError> {
        let backend: Arc<dyn ExamBackend> = if offline {
            info!("offline mode, serving placeholder questions");
            Arc::new(InMemoryBackend::new())
        } else {
            info!(base_url = %config.backend.base_url, "using exam backend");
            Arc::new(HttpExamBackend::new(config.backend.clone())?)
        };
        let policy = RetryPolicy::default().with_max_attempts(config.submit_attempts);
        let mut services = Self::with_backend(clock, backend, config.offline_fallback || offline)
            .with_retry_policy(policy);
        services.username.clone_from(&config.username);
        services.export_dir.clone_from(&config.export_dir);
        Ok(services)
    }

    /// Build services over an arbitrary backend.
    #[must_use]
    pub fn with_backend(clock: Clock, backend: Arc<dyn ExamBackend>, fallback: bool) -> Self {
        let loader = ExamLoader::new(clock, Arc::clone(&backend)).with_fallback(fallback);
        let submitter = ResultSubmitter::new(Arc::clone(&backend));
        Self {
            clock,
            backend,
            loader: Arc::new(loader),
            submitter: Arc::new(submitter),
            username: None,
            export_dir: PathBuf::from("."),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        let submitter = ResultSubmitter::new(Arc::clone(&self.backend)).with_policy(policy);
        self.submitter = Arc::new(submitter);
        self
    }

    #[must_use]
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn loader(&self) -> Arc<ExamLoader> {
        Arc::clone(&self.loader)
    }

    #[must_use]
    pub fn submitter(&self) -> Arc<ResultSubmitter> {
        Arc::clone(&self.submitter)
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }
}
