//! Terminal rendering and command parsing for the exam screen.

use std::fmt;
use std::fmt::Write as _;

use exam_core::model::{
    ExamScore, ExamSession, PaletteCell, SubjectStats, SubmissionReason, is_low_time,
    option_label,
};
use exam_core::time::format_countdown;
use services::ExamEvent;
use services::export::wrap_text;

const TEXT_WIDTH: usize = 76;
const PALETTE_COLUMNS: usize = 10;

/// One parsed line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Event(ExamEvent),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Empty,
    Unknown(String),
    BadOption(String),
    BadQuestionNumber(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty => write!(f, "type a command (h for help)"),
            InputError::Unknown(raw) => write!(f, "unknown command: {raw}"),
            InputError::BadOption(raw) => write!(f, "not an option letter: {raw}"),
            InputError::BadQuestionNumber(raw) => write!(f, "not a question number: {raw}"),
        }
    }
}

impl std::error::Error for InputError {}

/// Parse a command line such as `a c`, `g 12`, `n` or `s`.
pub fn parse_input(line: &str) -> Result<Input, InputError> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Err(InputError::Empty);
    };
    let argument = parts.next();

    let event = match command.to_ascii_lowercase().as_str() {
        "n" | "next" => ExamEvent::Next,
        "p" | "prev" | "previous" => ExamEvent::Previous,
        "r" | "review" => ExamEvent::ToggleReviewCurrent,
        "s" | "submit" => ExamEvent::Submit,
        "h" | "help" | "?" => return Ok(Input::Help),
        "a" | "answer" => {
            let raw = argument.unwrap_or_default();
            ExamEvent::SelectCurrent {
                option: parse_option_letter(raw)?,
            }
        }
        "g" | "goto" => {
            let raw = argument.unwrap_or_default();
            let number: usize = raw
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| InputError::BadQuestionNumber(raw.to_string()))?;
            ExamEvent::GoTo(number - 1)
        }
        _ => return Err(InputError::Unknown(line.trim().to_string())),
    };
    Ok(Input::Event(event))
}

fn parse_option_letter(raw: &str) -> Result<usize, InputError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => {
            Ok(usize::from(letter.to_ascii_uppercase() as u8 - b'A'))
        }
        _ => Err(InputError::BadOption(raw.to_string())),
    }
}

/// `y` or `yes` in any case.
pub fn is_affirmative(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn help_text() -> &'static str {
    "Commands:\n  \
     a <letter>   select an option for this question\n  \
     n / p        next / previous question\n  \
     g <number>   jump to a question\n  \
     r            mark or unmark this question for review\n  \
     s            submit the exam\n  \
     h            show this help"
}

/// Countdown line, flagged when time is short.
pub fn render_countdown(remaining_seconds: u32) -> String {
    let clock = format_countdown(remaining_seconds);
    if is_low_time(remaining_seconds) {
        format!("Time left: {clock}  [LOW TIME]")
    } else {
        format!("Time left: {clock}")
    }
}

/// The question on screen with its options, palette and countdown.
pub fn render_question(session: &ExamSession) -> String {
    let index = session.current_index();
    let question = session.current_question();
    let selected = session.answer(index);
    let status = session.status(index);

    let mut out = String::new();
    let _ = write!(out, "\nQuestion {} of {}", index + 1, session.len());
    if let Some(subject) = &question.subject {
        let _ = write!(out, "  [{subject}]");
    }
    if status.marked_for_review {
        out.push_str("  (marked for review)");
    }
    let _ = writeln!(out, "\n{}", render_countdown(session.remaining_seconds()));
    out.push('\n');

    for line in wrap_text(&question.text, TEXT_WIDTH) {
        let _ = writeln!(out, "{line}");
    }
    out.push('\n');
    for (option, text) in question.options.iter().enumerate() {
        let marker = if selected == Some(option) { '>' } else { ' ' };
        let _ = writeln!(out, " {marker} {}. {text}", option_label(option));
    }
    out.push('\n');
    out.push_str(&render_palette(session));
    out
}

/// Question grid plus the answered / not answered / marked / not visited tally.
pub fn render_palette(session: &ExamSession) -> String {
    let current = session.current_index();
    let mut out = String::new();
    for (row, cells) in session.palette().chunks(PALETTE_COLUMNS).enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            let index = row * PALETTE_COLUMNS + col;
            let mark = match cell {
                PaletteCell::Unanswered => ' ',
                PaletteCell::Answered => '+',
                PaletteCell::Marked => '?',
                PaletteCell::AnsweredAndMarked => '*',
            };
            let (open, close) = if index == current { ('[', ']') } else { (' ', ' ') };
            let _ = write!(out, "{open}{:>3}{mark}{close}", index + 1);
        }
        out.push('\n');
    }
    let summary = session.palette_summary();
    let _ = writeln!(
        out,
        "Answered: {}  Not answered: {}  Marked: {}  Not visited: {}",
        summary.answered, summary.not_answered, summary.marked, summary.not_visited
    );
    out
}

/// Score and per-subject breakdown shown once the exam is over.
pub fn render_results(score: &ExamScore, reason: Option<SubmissionReason>, subjects: &[SubjectStats]) -> String {
    let mut out = String::new();
    if reason == Some(SubmissionReason::TimeExpired) {
        out.push_str("\nTime is up. Your exam was submitted automatically.\n");
    }
    let _ = writeln!(
        out,
        "\nScore: {}/{} ({}%)",
        score.correct, score.total, score.percentage
    );
    let _ = writeln!(
        out,
        "Correct: {}  Incorrect: {}  Not answered: {}",
        score.correct, score.incorrect, score.unanswered
    );
    if subjects.len() > 1 {
        out.push_str("\nSubject-wise performance:\n");
        for stats in subjects {
            let _ = writeln!(
                out,
                "  {:<12} {:>3}/{:<3} {:>3}%",
                stats.subject, stats.correct, stats.total, stats.percentage
            );
        }
    }
    out
}
