mod console;

use std::fmt;
use std::path::PathBuf;

use exam_core::model::{Difficulty, ExamSession, ExamSpec, ExamType, is_low_time};
use services::{
    AppConfig, Clock, CountdownTimer, EventOutcome, ExamDriver, ExamEvent, ExamServices,
    ExportFormat, SubmissionDelivery, write_export,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use console::{
    Input, help_text, is_affirmative, parse_input, render_countdown, render_question,
    render_results,
};

const EVENT_QUEUE: usize = 64;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDifficulty { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidExportFormat { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDifficulty { raw } => write!(f, "invalid --difficulty value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidExportFormat { raw } => write!(f, "invalid --export value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_number(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<u32, ArgsError> {
    let value = require_value(args, flag)?;
    value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw: value })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  exam [--exam-type <IIT_JEE|NEET|EAMCET|custom>] [--subject <name>]");
    eprintln!("       [--difficulty <easy|medium|hard>] [--count <n>] [--minutes <n>]");
    eprintln!("       [--username <name>] [--export <json|pdf>] [--out <dir>] [--offline]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --exam-type IIT_JEE --difficulty medium");
    eprintln!("  --subject names the subject of a custom exam (default General)");
    eprintln!("  --count per subject: 30 for IIT_JEE, 45 for NEET, 40 for EAMCET; 10 for custom");
    eprintln!("  --minutes 180");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_API_BASE_URL, EXAM_USERNAME, EXAM_HTTP_TIMEOUT_SECS,");
    eprintln!("  EXAM_SUBMIT_ATTEMPTS, EXAM_OFFLINE_FALLBACK, EXAM_EXPORT_DIR, RUST_LOG");
}

struct Args {
    spec: ExamSpec,
    username: Option<String>,
    export: Option<ExportFormat>,
    out_dir: Option<PathBuf>,
    offline: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut exam_type = ExamType::default();
        let mut subject: Option<String> = None;
        let mut difficulty = Difficulty::default();
        let mut count = None;
        let mut minutes = None;
        let mut username = None;
        let mut export = None;
        let mut out_dir = None;
        let mut offline = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--exam-type" => {
                    let value = require_value(args, "--exam-type")?;
                    exam_type = value.parse().unwrap_or_default();
                }
                "--subject" => subject = Some(require_value(args, "--subject")?),
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    difficulty = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value.clone() })?;
                }
                "--count" => count = Some(require_number(args, "--count")?),
                "--minutes" => minutes = Some(require_number(args, "--minutes")?),
                "--username" => username = Some(require_value(args, "--username")?),
                "--export" => {
                    let value = require_value(args, "--export")?;
                    let format = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidExportFormat { raw: value.clone() })?;
                    export = Some(format);
                }
                "--out" => out_dir = Some(PathBuf::from(require_value(args, "--out")?)),
                "--offline" => offline = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let mut spec = ExamSpec::new(exam_type, difficulty);
        if let Some(subject) = subject.filter(|s| !s.trim().is_empty()) {
            spec.subject = subject.trim().to_string();
        }
        if let Some(count) = count {
            spec = spec.with_count(count);
        }
        if let Some(minutes) = minutes {
            spec = spec.with_duration_seconds(minutes.saturating_mul(60));
        }

        Ok(Self {
            spec,
            username,
            export,
            out_dir,
            offline,
        })
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read stdin line by line on its own task.
fn spawn_line_reader(lines: mpsc::Sender<String>) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match reader.next_line().await {
                Ok(Some(line)) => {
                    if lines.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "failed to read input");
                    break;
                }
            }
        }
    });
}

/// Turn typed commands into exam events until the driver stops listening.
///
/// End of input submits the exam. The line queue is handed back so prompts
/// after the exam can keep reading from it.
fn spawn_command_pump(
    mut lines: mpsc::Receiver<String>,
    events: mpsc::Sender<ExamEvent>,
) -> JoinHandle<mpsc::Receiver<String>> {
    tokio::spawn(async move {
        loop {
            let line = tokio::select! {
                () = events.closed() => break,
                line = lines.recv() => line,
            };
            let Some(line) = line else {
                let _ = events.send(ExamEvent::Submit).await;
                break;
            };
            match parse_input(&line) {
                Ok(Input::Event(event)) => {
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(Input::Help) => println!("{}", help_text()),
                Err(err) => println!("{err}"),
            }
        }
        lines
    })
}

fn show(session: &ExamSession, outcome: &EventOutcome) {
    match outcome {
        EventOutcome::Updated => println!("{}", render_question(session)),
        EventOutcome::Rejected(err) => println!("{err}"),
        EventOutcome::Ticked { remaining } => {
            let low = is_low_time(*remaining);
            if remaining % 60 == 0 || (low && remaining % 10 == 0) {
                println!("{}", render_countdown(*remaining));
            }
        }
        EventOutcome::Submitted { .. } | EventOutcome::Ignored => {}
    }
}

/// Report the delivery outcome and offer one retry when it failed.
async fn record_result(
    services: &ExamServices,
    delivery: SubmissionDelivery,
    lines: &mut mpsc::Receiver<String>,
) {
    let (record, error) = match delivery {
        SubmissionDelivery::Delivered { .. } => {
            println!("Result recorded.");
            return;
        }
        SubmissionDelivery::Skipped => return,
        SubmissionDelivery::Failed { record, error, .. } => (record, error),
    };

    eprintln!("Could not record your result: {error}");
    println!("Your score above is kept and any exported report is still valid.");
    println!("Retry recording the result? [y/N]");
    let retry = lines.recv().await.is_some_and(|line| is_affirmative(&line));
    if !retry {
        return;
    }

    match services.submitter().deliver(record).await {
        SubmissionDelivery::Delivered { .. } => println!("Result recorded."),
        SubmissionDelivery::Skipped => {}
        SubmissionDelivery::Failed { error, .. } => {
            eprintln!("Still could not record your result: {error}");
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();
    let config = AppConfig::from_env()?;
    let services = ExamServices::from_config(&config, Clock::system(), parsed.offline)?
        .with_username(parsed.username.clone().or_else(|| config.username.clone()));

    let session = services.loader().load(&parsed.spec).await?;
    println!(
        "{} | {} | {} questions",
        session.meta().subject_label(),
        session.meta().difficulty,
        session.len()
    );
    println!("{}", help_text());
    println!("{}", render_question(&session));

    let (line_tx, line_rx) = mpsc::channel(EVENT_QUEUE);
    spawn_line_reader(line_tx);
    let (tx, mut rx) = mpsc::channel(EVENT_QUEUE);
    let timer = CountdownTimer::spawn(tx.clone());
    let pump = spawn_command_pump(line_rx, tx);

    let mut driver = ExamDriver::new(session).with_timer(timer);
    let score = driver.run(&mut rx, show).await;
    drop(rx);
    let Some(score) = score else {
        info!("exam ended before submission");
        return Ok(());
    };
    let session = driver.into_session();
    let mut lines = pump.await?;

    let subjects = session.subject_breakdown()?;
    println!(
        "{}",
        render_results(&score, session.submission_reason(), &subjects)
    );

    if let Some(format) = parsed.export {
        let dir = parsed
            .out_dir
            .unwrap_or_else(|| services.export_dir().to_path_buf());
        let clock = services.clock();
        let report = session.report(clock.now())?;
        let path = write_export(&report, format, &dir, clock)?;
        println!("Results saved to {}", path.display());
    }

    let delivery = services
        .submitter()
        .submit(&session, services.username())
        .await?;
    record_result(&services, delivery, &mut lines).await;

    Ok(())
}

fn main() {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    let result = runtime.block_on(run());
    // The stdin reader may still be parked on a blocking read.
    runtime.shutdown_background();
    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut args.iter().map(|a| (*a).to_string()))
    }

    #[test]
    fn no_flags_start_an_iit_jee_exam() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.spec.exam_type, ExamType::IitJee);
        assert_eq!(args.spec.difficulty, Difficulty::Medium);
        assert_eq!(args.spec.blueprint().subjects.len(), 3);
        assert!(args.export.is_none());
        assert!(!args.offline);
    }

    #[test]
    fn custom_exam_takes_subject_and_minutes() {
        let args = parse(&[
            "--exam-type", "custom", "--subject", " Botany ", "--count", "5", "--minutes", "20",
        ])
        .unwrap();
        let blueprint = args.spec.blueprint();
        assert_eq!(args.spec.exam_type, ExamType::Custom);
        assert_eq!(blueprint.subjects, vec!["Botany".to_string()]);
        assert_eq!(blueprint.questions_per_subject, 5);
        assert_eq!(blueprint.duration_seconds, 20 * 60);
    }

    #[test]
    fn bad_flags_are_rejected() {
        assert!(matches!(parse(&["--count"]), Err(ArgsError::MissingValue { .. })));
        assert!(matches!(
            parse(&["--difficulty", "brutal"]),
            Err(ArgsError::InvalidDifficulty { .. })
        ));
        assert!(matches!(parse(&["--verbose"]), Err(ArgsError::UnknownArg(_))));
    }

    #[tokio::test]
    async fn pump_forwards_commands_and_submits_at_end_of_input() {
        let (line_tx, line_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let pump = spawn_command_pump(line_rx, event_tx);

        for line in ["a b", "bogus", "n"] {
            line_tx.send(line.to_string()).await.unwrap();
        }
        drop(line_tx);

        assert_eq!(event_rx.recv().await, Some(ExamEvent::SelectCurrent { option: 1 }));
        assert_eq!(event_rx.recv().await, Some(ExamEvent::Next));
        assert_eq!(event_rx.recv().await, Some(ExamEvent::Submit));
        let mut lines = pump.await.unwrap();
        assert_eq!(lines.recv().await, None);
    }

    #[tokio::test]
    async fn pump_hands_lines_back_once_the_exam_stops_listening() {
        let (line_tx, line_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel::<ExamEvent>(8);
        let pump = spawn_command_pump(line_rx, event_tx);

        drop(event_rx);
        let mut lines = pump.await.unwrap();

        line_tx.send("y".to_string()).await.unwrap();
        assert_eq!(lines.recv().await.as_deref(), Some("y"));
    }
}
