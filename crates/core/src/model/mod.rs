mod exam;
mod ids;
mod palette;
mod question;
mod report;
mod scoring;
mod session;

pub use exam::{
    CatalogueError, DEFAULT_SUBJECT, Difficulty, ExamBlueprint, ExamMeta, ExamSpec, ExamType,
    subject_label,
};
pub use ids::{ExamSessionId, ParseIdError, QuestionId};
pub use palette::{LOW_TIME_THRESHOLD_SECS, PaletteCell, PaletteSummary, QuestionStatus, is_low_time};
pub use question::{MIN_OPTIONS, Question, QuestionError, option_label};
pub use report::{ExamReport, ReportHeader, ResultRecord, ReviewItem, ReviewOutcome};
pub use scoring::{ExamScore, SubjectStats, percentage};
pub use session::{ExamSession, SessionError, SessionState, SubmissionReason, TickOutcome};
