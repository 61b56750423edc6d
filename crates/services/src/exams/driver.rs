use tokio::sync::mpsc;
use tracing::{debug, info};

use exam_core::model::{
    ExamScore, ExamSession, SessionError, SubmissionReason, TickOutcome,
};

use super::progress::ExamProgress;
use super::timer::CountdownTimer;

/// Something the user (or the countdown) did to a running exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamEvent {
    SelectAnswer { index: usize, option: usize },
    /// Select an option on the question currently on screen.
    SelectCurrent { option: usize },
    ToggleReview(usize),
    ToggleReviewCurrent,
    GoTo(usize),
    Next,
    Previous,
    Tick,
    Submit,
}

/// How the session reacted to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Updated,
    Rejected(SessionError),
    Ticked { remaining: u32 },
    Submitted {
        score: ExamScore,
        reason: SubmissionReason,
    },
    /// The exam was already over; the event changed nothing.
    Ignored,
}

/// Sole owner of an `ExamSession`; applies events strictly one at a time.
#[derive(Debug)]
pub struct ExamDriver {
    session: ExamSession,
    timer: Option<CountdownTimer>,
}

impl ExamDriver {
    #[must_use]
    pub fn new(session: ExamSession) -> Self {
        Self {
            session,
            timer: None,
        }
    }

    /// Attach the countdown feeding this driver; it is stopped on submission.
    #[must_use]
    pub fn with_timer(mut self, timer: CountdownTimer) -> Self {
        self.timer = Some(timer);
        self
    }

    #[must_use]
    pub fn session(&self) -> &ExamSession {
        &self.session
    }

    #[must_use]
    pub fn into_session(mut self) -> ExamSession {
        self.stop_timer();
        let Self { session, .. } = self;
        session
    }

    #[must_use]
    pub fn progress(&self) -> ExamProgress {
        ExamProgress::of(&self.session)
    }

    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Apply a single event.
    pub fn apply(&mut self, event: ExamEvent) -> EventOutcome {
        let current = self.session.current_index();
        let outcome = match event {
            ExamEvent::SelectAnswer { index, option } => {
                updated(self.session.select_answer(index, option))
            }
            ExamEvent::SelectCurrent { option } => {
                updated(self.session.select_answer(current, option))
            }
            ExamEvent::ToggleReview(index) => updated(self.session.toggle_review(index)),
            ExamEvent::ToggleReviewCurrent => updated(self.session.toggle_review(current)),
            ExamEvent::GoTo(index) => updated(self.session.go_to(index)),
            ExamEvent::Next => updated(self.session.next()),
            ExamEvent::Previous => updated(self.session.previous()),
            ExamEvent::Tick => match self.session.tick() {
                TickOutcome::Running { remaining } => EventOutcome::Ticked { remaining },
                TickOutcome::Expired(score) => {
                    info!(
                        session_id = %self.session.meta().session_id,
                        correct = score.correct,
                        total = score.total,
                        "time is up, exam submitted automatically"
                    );
                    EventOutcome::Submitted {
                        score,
                        reason: SubmissionReason::TimeExpired,
                    }
                }
                TickOutcome::Idle => EventOutcome::Ignored,
            },
            ExamEvent::Submit => {
                if self.session.is_submitted() {
                    EventOutcome::Ignored
                } else {
                    let score = self.session.submit();
                    info!(
                        session_id = %self.session.meta().session_id,
                        correct = score.correct,
                        total = score.total,
                        "exam submitted"
                    );
                    EventOutcome::Submitted {
                        score,
                        reason: SubmissionReason::Manual,
                    }
                }
            }
        };

        if let EventOutcome::Rejected(err) = &outcome {
            debug!(?event, error = %err, "event rejected");
        }
        if self.session.is_submitted() {
            self.stop_timer();
        }
        outcome
    }

    /// Drain `events` until the exam is submitted or every sender is gone.
    ///
    /// `observer` sees the session after each event. Returns the final score if
    /// the exam was submitted.
    pub async fn run<F>(
        &mut self,
        events: &mut mpsc::Receiver<ExamEvent>,
        mut observer: F,
    ) -> Option<ExamScore>
    where
        F: FnMut(&ExamSession, &EventOutcome),
    {
        while !self.session.is_submitted() {
            let Some(event) = events.recv().await else {
                break;
            };
            let outcome = self.apply(event);
            observer(&self.session, &outcome);
        }
        self.stop_timer();
        self.session.score().ok()
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }
    }
}

fn updated<T>(result: Result<T, SessionError>) -> EventOutcome {
    match result {
        Ok(_) => EventOutcome::Updated,
        Err(SessionError::AlreadySubmitted) => EventOutcome::Ignored,
        Err(err) => EventOutcome::Rejected(err),
    }
}
