mod json;
mod pdf;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::info;

use exam_core::model::ExamReport;

use crate::Clock;
use crate::error::ExportError;

pub use json::export_json;
pub use pdf::{export_pdf, wrap_text};

/// Downloadable results formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Pdf,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

/// `exam-results-{label}-{millis}.{ext}`. PDFs of configured exams are labelled
/// by exam type; everything else by subject.
#[must_use]
pub fn export_file_name(report: &ExamReport, format: ExportFormat, millis: i64) -> String {
    let label = match format {
        ExportFormat::Pdf if report.exam.exam_type.is_configured() => {
            report.exam.exam_type.code().to_string()
        }
        ExportFormat::Pdf | ExportFormat::Json => report.exam.subject.clone(),
    };
    let label: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .collect();
    format!("exam-results-{label}-{millis}.{}", format.extension())
}

/// Render `report` and write it into `dir`, returning the file path.
///
/// # Errors
///
/// Returns `ExportError` if rendering or writing fails.
pub fn write_export(
    report: &ExamReport,
    format: ExportFormat,
    dir: &Path,
    clock: Clock,
) -> Result<PathBuf, ExportError> {
    let bytes = match format {
        ExportFormat::Json => export_json(report)?.into_bytes(),
        ExportFormat::Pdf => export_pdf(report),
    };
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(report, format, clock.now().timestamp_millis()));
    fs::write(&path, bytes)?;
    info!(path = %path.display(), %format, "exam results exported");
    Ok(path)
}
