use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::model::exam::ExamMeta;
use crate::model::ids::QuestionId;
use crate::model::palette::{self, PaletteCell, PaletteSummary, QuestionStatus};
use crate::model::question::{Question, QuestionError};
use crate::model::report::{ExamReport, ReportHeader, ResultRecord, ReviewItem};
use crate::model::scoring::{self, ExamScore, SubjectStats};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("exam session has no questions")]
    Empty,

    #[error("question {index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },

    #[error("question id {id} appears more than once")]
    DuplicateQuestionId { id: QuestionId },

    #[error("question index {index} is out of range (exam has {len} questions)")]
    OutOfRange { index: usize, len: usize },

    #[error("option {option} is out of range for question {index} ({len} options)")]
    OptionOutOfRange {
        index: usize,
        option: usize,
        len: usize,
    },

    #[error("exam already submitted")]
    AlreadySubmitted,

    #[error("exam has not been submitted yet")]
    NotSubmitted,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionReason {
    Manual,
    TimeExpired,
}

/// Result of one countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining: u32 },
    /// The countdown hit zero and the exam was submitted by this tick.
    Expired(ExamScore),
    /// The exam was already submitted; nothing changed.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Submission {
    score: ExamScore,
    reason: SubmissionReason,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed attempt at a fixed list of questions.
///
/// Mutations are only accepted while the session is in progress. Once submitted,
/// answers, flags and the current position are frozen and only the scoring and
/// report accessors remain useful.
pub struct ExamSession {
    meta: ExamMeta,
    questions: Vec<Question>,
    answers: BTreeMap<usize, usize>,
    status: BTreeMap<usize, QuestionStatus>,
    current: usize,
    duration_seconds: u32,
    remaining_seconds: u32,
    submission: Option<Submission>,
}

impl ExamSession {
    /// Start a session over `questions` with a countdown of `duration_seconds`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when no questions are given,
    /// `SessionError::InvalidQuestion` when one fails validation and
    /// `SessionError::DuplicateQuestionId` when ids repeat.
    pub fn new(
        meta: ExamMeta,
        questions: Vec<Question>,
        duration_seconds: u32,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        {
            let mut seen = HashSet::with_capacity(questions.len());
            for (index, question) in questions.iter().enumerate() {
                question
                    .validate()
                    .map_err(|source| SessionError::InvalidQuestion { index, source })?;
                if !seen.insert(&question.id) {
                    return Err(SessionError::DuplicateQuestionId {
                        id: question.id.clone(),
                    });
                }
            }
        }

        Ok(Self {
            meta,
            questions,
            answers: BTreeMap::new(),
            status: BTreeMap::new(),
            current: 0,
            duration_seconds,
            remaining_seconds: duration_seconds,
            submission: None,
        })
    }

    #[must_use]
    pub fn meta(&self) -> &ExamMeta {
        &self.meta
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false: construction rejects empty question lists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.submission.is_some() {
            SessionState::Submitted
        } else {
            SessionState::InProgress
        }
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submission.is_some()
    }

    #[must_use]
    pub fn submission_reason(&self) -> Option<SubmissionReason> {
        self.submission.map(|s| s.reason)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<usize> {
        self.answers.get(&index).copied()
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, usize> {
        &self.answers
    }

    /// Flags for `index`; questions never touched report the default.
    #[must_use]
    pub fn status(&self, index: usize) -> QuestionStatus {
        self.status.get(&index).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn palette(&self) -> Vec<PaletteCell> {
        palette::cells(self.questions.len(), &self.status)
    }

    #[must_use]
    pub fn palette_summary(&self) -> PaletteSummary {
        palette::summarize(self.questions.len(), &self.status)
    }

    // ─── Transitions ───────────────────────────────────────────────────────────

    /// Record `option` as the answer to question `index`.
    ///
    /// Keeps the review flag as it was.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted`, `SessionError::OutOfRange` or
    /// `SessionError::OptionOutOfRange`; state is unchanged on error.
    pub fn select_answer(&mut self, index: usize, option: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        let question = self.question_at(index)?;
        let len = question.option_count();
        if option >= len {
            return Err(SessionError::OptionOutOfRange { index, option, len });
        }

        self.answers.insert(index, option);
        self.status.entry(index).or_default().answered = true;
        Ok(())
    }

    /// Flip the review flag of question `index` and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` or `SessionError::OutOfRange`.
    pub fn toggle_review(&mut self, index: usize) -> Result<bool, SessionError> {
        self.ensure_in_progress()?;
        self.question_at(index)?;
        let status = self.status.entry(index).or_default();
        status.marked_for_review = !status.marked_for_review;
        Ok(status.marked_for_review)
    }

    /// Move to question `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` or `SessionError::OutOfRange`.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.question_at(index)?;
        self.current = index;
        Ok(())
    }

    /// Step forward; returns false when already on the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted`.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        self.ensure_in_progress()?;
        if self.current + 1 >= self.questions.len() {
            return Ok(false);
        }
        self.current += 1;
        Ok(true)
    }

    /// Step back; returns false when already on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted`.
    pub fn previous(&mut self) -> Result<bool, SessionError> {
        self.ensure_in_progress()?;
        if self.current == 0 {
            return Ok(false);
        }
        self.current -= 1;
        Ok(true)
    }

    /// Advance the countdown by one second, submitting when it reaches zero.
    pub fn tick(&mut self) -> TickOutcome {
        if self.is_submitted() {
            return TickOutcome::Idle;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TickOutcome::Running {
                remaining: self.remaining_seconds,
            };
        }
        TickOutcome::Expired(self.finish(SubmissionReason::TimeExpired))
    }

    /// Score and freeze the session.
    ///
    /// Calling this again returns the score computed the first time.
    pub fn submit(&mut self) -> ExamScore {
        self.finish(SubmissionReason::Manual)
    }

    fn finish(&mut self, reason: SubmissionReason) -> ExamScore {
        if let Some(submission) = self.submission {
            return submission.score;
        }
        let score = scoring::score(&self.questions, &self.answers);
        self.submission = Some(Submission { score, reason });
        score
    }

    // ─── Results ───────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitted` while the exam is running.
    pub fn score(&self) -> Result<ExamScore, SessionError> {
        self.submission
            .map(|s| s.score)
            .ok_or(SessionError::NotSubmitted)
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitted` while the exam is running.
    pub fn subject_breakdown(&self) -> Result<Vec<SubjectStats>, SessionError> {
        self.ensure_submitted()?;
        Ok(scoring::subject_breakdown(
            &self.questions,
            &self.answers,
            &self.meta.subject,
        ))
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitted` while the exam is running.
    pub fn detailed_review(&self) -> Result<Vec<ReviewItem>, SessionError> {
        self.ensure_submitted()?;
        Ok(self
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let selected = self.answer(index);
                ReviewItem {
                    number: index + 1,
                    subject: question.subject.clone(),
                    text: question.text.clone(),
                    options: question.options.clone(),
                    selected,
                    correct: question.correct_answer,
                    is_correct: question.is_correct(selected),
                    explanation: question.explanation.clone(),
                }
            })
            .collect())
    }

    /// Build the export structure for the results document.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitted` while the exam is running.
    pub fn report(&self, generated_at: DateTime<Utc>) -> Result<ExamReport, SessionError> {
        let score = self.score()?;
        Ok(ExamReport {
            exam: ReportHeader {
                exam_type: self.meta.exam_type,
                subject: self.meta.subject.clone(),
                subject_label: self.meta.subject_label(),
                difficulty: self.meta.difficulty,
                generated_at,
                score,
            },
            subjects: self.subject_breakdown()?,
            questions: self.detailed_review()?,
        })
    }

    /// Payload for the result-recording endpoint.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitted` while the exam is running.
    pub fn result_record(&self, username: &str) -> Result<ResultRecord, SessionError> {
        let score = self.score()?;
        Ok(ResultRecord {
            username: username.to_string(),
            subject: self.meta.subject.clone(),
            difficulty: self.meta.difficulty,
            score: score.correct,
            total_questions: score.total,
        })
    }

    fn question_at(&self, index: usize) -> Result<&Question, SessionError> {
        self.questions.get(index).ok_or(SessionError::OutOfRange {
            index,
            len: self.questions.len(),
        })
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        Ok(())
    }

    fn ensure_submitted(&self) -> Result<(), SessionError> {
        if !self.is_submitted() {
            return Err(SessionError::NotSubmitted);
        }
        Ok(())
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("session_id", &self.meta.session_id)
            .field("questions_len", &self.questions.len())
            .field("answers_len", &self.answers.len())
            .field("current", &self.current)
            .field("remaining_seconds", &self.remaining_seconds)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::exam::{Difficulty, ExamSpec, ExamType};
    use crate::time::fixed_now;

    fn question(id: usize, correct: usize, subject: Option<&str>) -> Question {
        let mut q = Question::new(
            QuestionId::new(id.to_string()),
            format!("Question {id}"),
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct,
        );
        q.subject = subject.map(str::to_string);
        q
    }

    fn meta() -> ExamMeta {
        ExamMeta::new(
            &ExamSpec::custom("Physics", Difficulty::Medium, 3),
            fixed_now(),
        )
    }

    fn session_with(correct: &[usize], duration: u32) -> ExamSession {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, c)| question(i, *c, None))
            .collect();
        ExamSession::new(meta(), questions, duration).unwrap()
    }

    #[test]
    fn starts_in_progress_at_first_question() {
        let session = session_with(&[1, 2, 0], 30);
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.remaining_seconds(), 30);
        assert!(session.answers().is_empty());
        assert_eq!(session.status(2), QuestionStatus::default());
        assert_eq!(session.score(), Err(SessionError::NotSubmitted));
    }

    #[test]
    fn empty_session_is_rejected() {
        let err = ExamSession::new(meta(), Vec::new(), 10).unwrap_err();
        assert_eq!(err, SessionError::Empty);
    }

    #[test]
    fn invalid_question_is_rejected_with_its_index() {
        let mut bad = question(1, 0, None);
        bad.options.truncate(1);
        let err = ExamSession::new(meta(), vec![question(0, 0, None), bad], 10).unwrap_err();
        assert!(matches!(err, SessionError::InvalidQuestion { index: 1, .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err =
            ExamSession::new(meta(), vec![question(0, 0, None), question(0, 1, None)], 10)
                .unwrap_err();
        assert!(matches!(err, SessionError::DuplicateQuestionId { .. }));
    }

    #[test]
    fn scenario_two_of_three() {
        let mut session = session_with(&[1, 2, 0], 60);
        session.select_answer(0, 1).unwrap();
        session.select_answer(2, 0).unwrap();

        let score = session.submit();
        assert_eq!(score.correct, 2);
        assert_eq!(score.percentage, 67);
        assert_eq!(score.unanswered, 1);
        assert_eq!(session.score().unwrap(), score);
    }

    #[test]
    fn empty_answers_score_zero() {
        let mut session = session_with(&[1, 2, 0], 60);
        let score = session.submit();
        assert_eq!(score.correct, 0);
        assert_eq!(score.percentage, 0);
        assert_eq!(score.unanswered, 3);
    }

    #[test]
    fn reselecting_overwrites_answer() {
        let mut session = session_with(&[1, 2], 60);
        session.select_answer(0, 3).unwrap();
        session.select_answer(0, 1).unwrap();
        assert_eq!(session.answer(0), Some(1));
        assert_eq!(session.submit().correct, 1);
    }

    #[test]
    fn navigation_keeps_answers() {
        let mut session = session_with(&[0, 0, 0, 0], 60);
        for index in 0..4 {
            session.select_answer(index, index).unwrap();
        }
        for from in 0..4 {
            for to in 0..4 {
                session.go_to(from).unwrap();
                session.go_to(to).unwrap();
                session.go_to(from).unwrap();
                assert_eq!(session.answer(from), Some(from));
            }
        }
    }

    #[test]
    fn go_to_out_of_range_leaves_position() {
        let mut session = session_with(&[0, 1, 2], 60);
        session.go_to(1).unwrap();
        let err = session.go_to(5).unwrap_err();
        assert_eq!(err, SessionError::OutOfRange { index: 5, len: 3 });
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn bad_option_is_rejected_without_side_effects() {
        let mut session = session_with(&[0, 1], 60);
        let err = session.select_answer(1, 4).unwrap_err();
        assert_eq!(
            err,
            SessionError::OptionOutOfRange {
                index: 1,
                option: 4,
                len: 4
            }
        );
        assert_eq!(session.answer(1), None);
        assert!(!session.status(1).answered);

        let err = session.select_answer(9, 0).unwrap_err();
        assert_eq!(err, SessionError::OutOfRange { index: 9, len: 2 });
    }

    #[test]
    fn index_equal_to_len_is_out_of_range() {
        let mut session = session_with(&[0, 1, 2], 60);

        let err = session.select_answer(3, 0).unwrap_err();
        assert_eq!(err, SessionError::OutOfRange { index: 3, len: 3 });
        assert!(session.answers().is_empty());

        let err = session.toggle_review(3).unwrap_err();
        assert_eq!(err, SessionError::OutOfRange { index: 3, len: 3 });
        let err = session.toggle_review(10).unwrap_err();
        assert_eq!(err, SessionError::OutOfRange { index: 10, len: 3 });
        assert_eq!(session.palette_summary().not_visited, 3);

        session.select_answer(2, 2).unwrap();
        assert!(session.toggle_review(2).unwrap());
    }

    #[test]
    fn toggle_review_twice_restores_flag_and_keeps_answered() {
        let mut session = session_with(&[0, 1], 60);
        session.select_answer(1, 0).unwrap();

        assert!(session.toggle_review(1).unwrap());
        assert!(session.status(1).answered);
        assert!(!session.toggle_review(1).unwrap());
        assert_eq!(
            session.status(1),
            QuestionStatus {
                answered: true,
                marked_for_review: false
            }
        );
    }

    #[test]
    fn answering_preserves_review_flag() {
        let mut session = session_with(&[0, 1], 60);
        session.toggle_review(0).unwrap();
        session.select_answer(0, 2).unwrap();
        assert_eq!(
            session.status(0),
            QuestionStatus {
                answered: true,
                marked_for_review: true
            }
        );
        assert_eq!(session.palette()[0], PaletteCell::AnsweredAndMarked);
    }

    #[test]
    fn next_and_previous_clamp_at_edges() {
        let mut session = session_with(&[0, 1], 60);
        assert!(!session.previous().unwrap());
        assert!(session.next().unwrap());
        assert!(!session.next().unwrap());
        assert_eq!(session.current_index(), 1);
        assert!(session.previous().unwrap());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn ticking_through_duration_submits_once() {
        let mut session = session_with(&[1, 0], 3);
        session.select_answer(0, 1).unwrap();

        assert_eq!(session.tick(), TickOutcome::Running { remaining: 2 });
        assert_eq!(session.tick(), TickOutcome::Running { remaining: 1 });
        let TickOutcome::Expired(score) = session.tick() else {
            panic!("third tick should expire the exam");
        };
        assert_eq!(score.correct, 1);
        assert_eq!(session.state(), SessionState::Submitted);
        assert_eq!(session.submission_reason(), Some(SubmissionReason::TimeExpired));
        assert_eq!(session.remaining_seconds(), 0);

        for _ in 0..5 {
            assert_eq!(session.tick(), TickOutcome::Idle);
        }
        assert_eq!(session.score().unwrap(), score);
    }

    #[test]
    fn zero_duration_expires_on_first_tick() {
        let mut session = session_with(&[0], 0);
        assert!(matches!(session.tick(), TickOutcome::Expired(_)));
    }

    #[test]
    fn submit_is_idempotent() {
        let mut session = session_with(&[1, 2, 0], 60);
        session.select_answer(1, 2).unwrap();
        let first = session.submit();
        let second = session.submit();
        assert_eq!(first, second);
        assert_eq!(session.submission_reason(), Some(SubmissionReason::Manual));
    }

    #[test]
    fn mutations_after_submit_are_rejected() {
        let mut session = session_with(&[1, 2, 0], 60);
        session.select_answer(0, 1).unwrap();
        session.go_to(2).unwrap();
        session.submit();

        assert_eq!(session.select_answer(1, 2), Err(SessionError::AlreadySubmitted));
        assert_eq!(session.toggle_review(1), Err(SessionError::AlreadySubmitted));
        assert_eq!(session.go_to(0), Err(SessionError::AlreadySubmitted));
        assert_eq!(session.next(), Err(SessionError::AlreadySubmitted));
        assert_eq!(session.answer(1), None);
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.score().unwrap().correct, 1);
    }

    #[test]
    fn breakdown_scenario() {
        let questions = vec![
            question(0, 0, Some("Physics")),
            question(1, 0, Some("Physics")),
            question(2, 0, Some("Chemistry")),
        ];
        let mut session = ExamSession::new(meta(), questions, 60).unwrap();
        session.select_answer(0, 0).unwrap();
        session.select_answer(1, 1).unwrap();
        session.select_answer(2, 0).unwrap();

        assert_eq!(session.subject_breakdown(), Err(SessionError::NotSubmitted));
        session.submit();

        let stats = session.subject_breakdown().unwrap();
        assert_eq!(
            stats,
            vec![
                SubjectStats {
                    subject: "Physics".into(),
                    correct: 1,
                    total: 2,
                    percentage: 50
                },
                SubjectStats {
                    subject: "Chemistry".into(),
                    correct: 1,
                    total: 1,
                    percentage: 100
                },
            ]
        );
    }

    #[test]
    fn report_and_record_reflect_submission() {
        let mut session = session_with(&[1, 2, 0], 60);
        session.select_answer(0, 1).unwrap();
        session.select_answer(1, 0).unwrap();
        assert!(session.report(fixed_now()).is_err());
        session.submit();

        let report = session.report(fixed_now()).unwrap();
        assert_eq!(report.exam.exam_type, ExamType::Custom);
        assert_eq!(report.exam.subject_label, "Physics");
        assert_eq!(report.exam.score.correct, 1);
        assert_eq!(report.questions.len(), 3);
        assert_eq!(report.questions[0].number, 1);
        assert!(report.questions[0].is_correct);
        assert_eq!(report.questions[1].selected, Some(0));
        assert!(!report.questions[1].is_correct);
        assert_eq!(report.questions[2].selected, None);
        assert!(!report.has_multiple_subjects());

        let record = session.result_record("asha").unwrap();
        assert_eq!(record.score, 1);
        assert_eq!(record.total_questions, 3);
        assert_eq!(record.subject, "Physics");
    }

    #[test]
    fn palette_summary_tracks_flags() {
        let mut session = session_with(&[0, 0, 0, 0], 60);
        session.select_answer(0, 1).unwrap();
        session.toggle_review(1).unwrap();
        session.go_to(3).unwrap();

        let summary = session.palette_summary();
        assert_eq!(summary.answered, 1);
        assert_eq!(summary.marked, 1);
        assert_eq!(summary.not_answered, 3);
        assert_eq!(summary.not_visited, 2);
    }
}
