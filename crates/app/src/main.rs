use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use exam_core::model::{Category, ExamSettingsDraft, QuestionBank};
use services::{HistoryService, QuizEngine, QuizRequest, SelectionStrategy};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod console;

const DEFAULT_BANK_PATH: &str = "quiz_data.csv";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCount { raw: String },
    InvalidFocus { raw: String },
    InvalidSeed { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidFocus { raw } => write!(f, "invalid --focus category: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
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

#[derive(Debug, PartialEq, Eq)]
struct Args {
    bank: PathBuf,
    count: Option<u32>,
    focus: Option<Category>,
    seed: Option<u64>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- quiz  [--bank <csv>] [--count <n>] [--focus <category>] [--seed <n>]"
    );
    eprintln!("  cargo run -p app -- check [--bank <csv>]");
    eprintln!();
    eprintln!("Defaults for quiz:");
    eprintln!("  --bank {DEFAULT_BANK_PATH}");
    eprintln!("  --count 50 (30 and 50 are the standard sets, 36 seconds per question)");
    eprintln!();
    eprintln!("Categories: rules, systems, operations, risk (or 規則, システム, 運航, リスク)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_BANK_PATH, EXAM_QUESTION_COUNT, EXAM_FOCUS, EXAM_SEED, EXAM_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Check,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "check" => Some(Self::Check),
            _ => None,
        }
    }
}

impl Args {
    /// Flags override the environment; malformed environment values are ignored.
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut bank = env("EXAM_BANK_PATH")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_BANK_PATH), PathBuf::from);
        let mut count = env("EXAM_QUESTION_COUNT").and_then(|value| value.trim().parse().ok());
        let mut focus = env("EXAM_FOCUS").and_then(|value| value.parse().ok());
        let mut seed = env("EXAM_SEED").and_then(|value| value.trim().parse().ok());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => {
                    bank = PathBuf::from(require_value(args, "--bank")?);
                }
                "--count" => {
                    let value = require_value(args, "--count")?;
                    let parsed: u32 = value
                        .trim()
                        .parse()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ArgsError::InvalidCount { raw: value.clone() })?;
                    count = Some(parsed);
                }
                "--focus" => {
                    let value = require_value(args, "--focus")?;
                    let parsed: Category = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidFocus { raw: value.clone() })?;
                    focus = Some(parsed);
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let parsed: u64 = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    seed = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bank,
            count,
            focus,
            seed,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EXAM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: start a quiz when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Quiz,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Quiz,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // A missing or malformed bank is fatal; there is no fallback question set.
    let bank = storage::load_bank(&parsed.bank).await?;

    match cmd {
        Command::Check => {
            print_supply(&parsed, &bank);
            Ok(())
        }
        Command::Quiz => {
            let settings = ExamSettingsDraft {
                question_count: parsed.count,
                ..ExamSettingsDraft::default()
            }
            .validate()?;
            let request = match parsed.focus {
                Some(category) => QuizRequest {
                    strategy: SelectionStrategy::Focused(category),
                    ..QuizRequest::from_settings(&settings)
                },
                None => QuizRequest::from_settings(&settings),
            };

            let history = HistoryService::from_storage(&Storage::in_memory());
            let mut engine = QuizEngine::new(Arc::new(bank), history, settings);
            if let Some(seed) = parsed.seed {
                info!(seed, "using fixed seeds");
                engine = engine.with_seeds(seed, seed.wrapping_add(1));
            }

            console::run(&mut engine, request).await
        }
    }
}

fn print_supply(args: &Args, bank: &QuestionBank) {
    println!("{}: {} questions", args.bank.display(), bank.len());
    for (category, count) in bank.count_by_category() {
        println!("  {:<11} {:<6} {count}", category.as_str(), category.local_name());
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
