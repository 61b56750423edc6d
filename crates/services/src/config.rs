use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SUBMIT_ATTEMPTS: usize = 3;

/// Where and how to reach the exam backend.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl BackendConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` cannot be parsed.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Join an endpoint path onto the base url, keeping any base path prefix.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Process-level settings, read once at startup and passed down explicitly.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub username: Option<String>,
    pub submit_attempts: usize,
    pub offline_fallback: bool,
    pub export_dir: PathBuf,
}

impl AppConfig {
    /// Load `.env` (if present) and read `EXAM_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed values.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("EXAM_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let mut backend = BackendConfig::new(base_url.trim())?;

        if let Some(raw) = lookup("EXAM_HTTP_TIMEOUT_SECS") {
            let secs = parse_number::<u64>("EXAM_HTTP_TIMEOUT_SECS", &raw)?;
            backend.timeout = Duration::from_secs(secs);
        }

        let submit_attempts = match lookup("EXAM_SUBMIT_ATTEMPTS") {
            Some(raw) => parse_number::<usize>("EXAM_SUBMIT_ATTEMPTS", &raw)?.max(1),
            None => DEFAULT_SUBMIT_ATTEMPTS,
        };

        let offline_fallback = match lookup("EXAM_OFFLINE_FALLBACK") {
            Some(raw) => parse_flag("EXAM_OFFLINE_FALLBACK", &raw)?,
            None => true,
        };

        let username = lookup("EXAM_USERNAME")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let export_dir = lookup("EXAM_EXPORT_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);

        Ok(Self {
            backend,
            username,
            submit_attempts,
            offline_fallback,
            export_dir,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.backend.timeout, Duration::from_secs(30));
        assert_eq!(config.submit_attempts, 3);
        assert!(config.offline_fallback);
        assert!(config.username.is_none());
        assert_eq!(config.export_dir, PathBuf::from("."));
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("EXAM_API_BASE_URL", "https://exams.example.com/api/"),
            ("EXAM_HTTP_TIMEOUT_SECS", "5"),
            ("EXAM_SUBMIT_ATTEMPTS", "0"),
            ("EXAM_OFFLINE_FALLBACK", "off"),
            ("EXAM_USERNAME", "  asha  "),
            ("EXAM_EXPORT_DIR", "/tmp/results"),
        ]))
        .unwrap();
        assert_eq!(
            config.backend.endpoint("/submit-exam"),
            "https://exams.example.com/api/submit-exam"
        );
        assert_eq!(config.backend.timeout, Duration::from_secs(5));
        assert_eq!(config.submit_attempts, 1);
        assert!(!config.offline_fallback);
        assert_eq!(config.username.as_deref(), Some("asha"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/results"));
    }

    #[test]
    fn rejects_malformed_values() {
        let err = AppConfig::from_lookup(lookup(&[("EXAM_HTTP_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "EXAM_HTTP_TIMEOUT_SECS",
                ..
            }
        ));
        let err = AppConfig::from_lookup(lookup(&[("EXAM_API_BASE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_)));
    }
}
