mod driver;
mod loader;
mod progress;
mod submit;
mod timer;

// Public API of the exam subsystem.
pub use driver::{EventOutcome, ExamDriver, ExamEvent};
pub use loader::ExamLoader;
pub use progress::ExamProgress;
pub use submit::{ResultSubmitter, SubmissionDelivery};
pub use timer::{CountdownTimer, TICK_PERIOD};
