use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ExamSessionId;

/// Subject used when the caller does not name one.
pub const DEFAULT_SUBJECT: &str = "General";

/// Question count for a custom exam when none is requested.
pub const DEFAULT_CUSTOM_COUNT: u32 = 10;

/// Exam length in minutes for configured exams and the default for custom ones.
pub const DEFAULT_EXAM_MINUTES: u32 = 180;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogueError {
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CatalogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(CatalogueError::UnknownDifficulty(s.to_string())),
        }
    }
}

//
// ─── EXAM TYPES ────────────────────────────────────────────────────────────────
//

/// Exam formats the platform knows how to assemble.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExamType {
    #[default]
    #[serde(rename = "IIT_JEE")]
    IitJee,
    #[serde(rename = "NEET")]
    Neet,
    #[serde(rename = "EAMCET")]
    Eamcet,
    #[serde(rename = "CUSTOM")]
    Custom,
}

impl ExamType {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            ExamType::IitJee => "IIT_JEE",
            ExamType::Neet => "NEET",
            ExamType::Eamcet => "EAMCET",
            ExamType::Custom => "CUSTOM",
        }
    }

    /// Human form of the code, e.g. `IIT/JEE`.
    #[must_use]
    pub fn display_name(self) -> String {
        self.code().replacen('_', "/", 1)
    }

    /// Fixed layout for the configured exam types; `None` for custom exams.
    #[must_use]
    pub fn blueprint(self) -> Option<ExamBlueprint> {
        let (subjects, per_subject, minutes): (&[&str], u32, u32) = match self {
            ExamType::IitJee => (
                &["Mathematics", "Physics", "Chemistry"],
                30,
                DEFAULT_EXAM_MINUTES,
            ),
            ExamType::Neet => (
                &["Physics", "Chemistry", "Biology"],
                45,
                DEFAULT_EXAM_MINUTES,
            ),
            ExamType::Eamcet => (
                &["Physics", "Chemistry", "Mathematics", "Biology"],
                40,
                DEFAULT_EXAM_MINUTES,
            ),
            ExamType::Custom => return None,
        };
        Some(ExamBlueprint {
            subjects: subjects.iter().map(|s| (*s).to_string()).collect(),
            questions_per_subject: per_subject,
            duration_seconds: minutes * 60,
        })
    }

    #[must_use]
    pub fn is_configured(self) -> bool {
        !matches!(self, ExamType::Custom)
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ExamType {
    type Err = std::convert::Infallible;

    /// Unknown codes select a custom single-subject exam.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase().replace(['/', '-'], "_");
        Ok(match code.as_str() {
            "IIT_JEE" | "JEE" => ExamType::IitJee,
            "NEET" => ExamType::Neet,
            "EAMCET" => ExamType::Eamcet,
            _ => ExamType::Custom,
        })
    }
}

/// Subjects, size and time limit of one exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamBlueprint {
    pub subjects: Vec<String>,
    pub questions_per_subject: u32,
    pub duration_seconds: u32,
}

impl ExamBlueprint {
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        let subjects = u32::try_from(self.subjects.len()).unwrap_or(u32::MAX);
        subjects.saturating_mul(self.questions_per_subject)
    }
}

//
// ─── EXAM REQUEST ──────────────────────────────────────────────────────────────
//

/// What the user picked on the selection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSpec {
    pub exam_type: ExamType,
    pub subject: String,
    pub difficulty: Difficulty,
    /// Per-subject count for configured exams, total count for custom ones.
    pub count: Option<u32>,
    pub duration_seconds: Option<u32>,
}

impl ExamSpec {
    #[must_use]
    pub fn new(exam_type: ExamType, difficulty: Difficulty) -> Self {
        Self {
            exam_type,
            subject: DEFAULT_SUBJECT.to_string(),
            difficulty,
            count: None,
            duration_seconds: None,
        }
    }

    /// A single-subject exam.
    #[must_use]
    pub fn custom(subject: impl Into<String>, difficulty: Difficulty, count: u32) -> Self {
        Self {
            exam_type: ExamType::Custom,
            subject: subject.into(),
            difficulty,
            count: Some(count),
            duration_seconds: None,
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn with_duration_seconds(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Resolve the layout, applying count and duration overrides.
    #[must_use]
    pub fn blueprint(&self) -> ExamBlueprint {
        let mut blueprint = self.exam_type.blueprint().unwrap_or_else(|| {
            let count = self.count.unwrap_or(DEFAULT_CUSTOM_COUNT);
            ExamBlueprint {
                subjects: vec![self.subject.clone()],
                questions_per_subject: count,
                duration_seconds: DEFAULT_EXAM_MINUTES * 60,
            }
        });
        if let Some(count) = self.count {
            blueprint.questions_per_subject = count;
        }
        if let Some(seconds) = self.duration_seconds {
            blueprint.duration_seconds = seconds;
        }
        blueprint
    }

    #[must_use]
    pub fn subject_label(&self) -> String {
        subject_label(self.exam_type, &self.subject)
    }
}

/// "All Subjects (A, B, C)" for configured exams, the plain subject otherwise.
#[must_use]
pub fn subject_label(exam_type: ExamType, subject: &str) -> String {
    match exam_type.blueprint() {
        Some(blueprint) => format!("All Subjects ({})", blueprint.subjects.join(", ")),
        None => subject.to_string(),
    }
}

/// Descriptive data carried by a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamMeta {
    pub session_id: ExamSessionId,
    pub exam_type: ExamType,
    pub subject: String,
    pub difficulty: Difficulty,
    pub started_at: DateTime<Utc>,
}

impl ExamMeta {
    #[must_use]
    pub fn new(spec: &ExamSpec, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id: ExamSessionId::generate(),
            exam_type: spec.exam_type,
            subject: spec.subject.clone(),
            difficulty: spec.difficulty,
            started_at,
        }
    }

    #[must_use]
    pub fn subject_label(&self) -> String {
        subject_label(self.exam_type, &self.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(" Easy ".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn exam_type_codes() {
        assert_eq!("IIT_JEE".parse::<ExamType>().unwrap(), ExamType::IitJee);
        assert_eq!("iit/jee".parse::<ExamType>().unwrap(), ExamType::IitJee);
        assert_eq!("neet".parse::<ExamType>().unwrap(), ExamType::Neet);
        assert_eq!("whatever".parse::<ExamType>().unwrap(), ExamType::Custom);
        assert_eq!(ExamType::IitJee.display_name(), "IIT/JEE");
    }

    #[test]
    fn exam_type_serializes_as_code() {
        let json = serde_json::to_string(&ExamType::Eamcet).unwrap();
        assert_eq!(json, "\"EAMCET\"");
    }

    #[test]
    fn configured_blueprints() {
        let jee = ExamType::IitJee.blueprint().unwrap();
        assert_eq!(jee.subjects, ["Mathematics", "Physics", "Chemistry"]);
        assert_eq!(jee.questions_per_subject, 30);
        assert_eq!(jee.duration_seconds, 180 * 60);
        assert_eq!(jee.total_questions(), 90);

        let eamcet = ExamType::Eamcet.blueprint().unwrap();
        assert_eq!(eamcet.total_questions(), 160);
        assert!(ExamType::Custom.blueprint().is_none());
    }

    #[test]
    fn custom_spec_uses_single_subject_and_default_duration() {
        let spec = ExamSpec::custom("Physics", Difficulty::Easy, 5);
        let blueprint = spec.blueprint();
        assert_eq!(blueprint.subjects, ["Physics"]);
        assert_eq!(blueprint.questions_per_subject, 5);
        assert_eq!(blueprint.duration_seconds, 180 * 60);

        let blueprint = ExamSpec::custom("Physics", Difficulty::Medium, 10)
            .with_duration_seconds(20 * 60)
            .blueprint();
        assert_eq!(blueprint.duration_seconds, 20 * 60);
        assert_eq!(spec.subject_label(), "Physics");
    }

    #[test]
    fn overrides_apply_to_configured_exams() {
        let spec = ExamSpec::new(ExamType::Neet, Difficulty::Medium)
            .with_count(2)
            .with_duration_seconds(90);
        let blueprint = spec.blueprint();
        assert_eq!(blueprint.questions_per_subject, 2);
        assert_eq!(blueprint.duration_seconds, 90);
        assert_eq!(
            spec.subject_label(),
            "All Subjects (Physics, Chemistry, Biology)"
        );
    }
}
