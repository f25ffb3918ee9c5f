use std::fmt;
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::EnvFilter;

use services::{AnswerFeedback, Clock, QuizService, QuizSession};
use storage::lessons::load_catalog;
use storage::repository::Storage;
use vocab_core::answer::DiffToken;
use vocab_core::model::{LearnerId, Lesson, LessonCatalog, LessonId};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidStore { raw: String },
    InvalidDbUrl { raw: String },
    InvalidLearner { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidStore { raw } => {
                write!(f, "invalid --store value: {raw} (expected memory, json or sqlite)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLearner { raw } => write!(f, "invalid learner id: {raw:?}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--store <memory|json|sqlite>] [--data-dir <path>] [--db <sqlite_url>]"
    );
    eprintln!("                      [--lessons <path>] [--learner <id>] [--verbose]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --store json");
    eprintln!("  --data-dir .");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --lessons lessons.json");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_STORE, QUIZ_DATA_DIR, QUIZ_DB_URL, QUIZ_LESSONS, QUIZ_LEARNER, RUST_LOG");
}

fn print_commands() {
    println!("Commands:");
    println!("  :lessons        list lessons");
    println!("  :lesson <id>    start practising a lesson");
    println!("  :next           next question (skipping counts as a miss)");
    println!("  :stats          score, streak and badges");
    println!("  :reset          forget all progress except badges");
    println!("  :quit           leave");
    println!("Anything else is taken as your answer.");
}

//
// ─── ARGS ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreKind {
    Memory,
    Json,
    Sqlite,
}

impl StoreKind {
    fn parse(raw: &str) -> Result<Self, ArgsError> {
        match raw.trim() {
            "memory" => Ok(Self::Memory),
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(ArgsError::InvalidStore {
                raw: raw.to_owned(),
            }),
        }
    }
}

struct Args {
    store: StoreKind,
    data_dir: PathBuf,
    db_url: String,
    lessons: PathBuf,
    learner: Option<LearnerId>,
    verbose: bool,
}

impl Args {
    /// Parse flags, falling back to `env` for anything not given on the
    /// command line.
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut store = match env("QUIZ_STORE") {
            Some(raw) => StoreKind::parse(&raw)?,
            None => StoreKind::Json,
        };
        let mut data_dir = env("QUIZ_DATA_DIR").map_or_else(|| ".".into(), PathBuf::from);
        let mut db_url = env("QUIZ_DB_URL").unwrap_or_else(|| "sqlite:quiz.sqlite3".into());
        let mut lessons = env("QUIZ_LESSONS").map_or_else(|| "lessons.json".into(), PathBuf::from);
        let mut learner = env("QUIZ_LEARNER").map(parse_learner).transpose()?;
        let mut verbose = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--store" => store = StoreKind::parse(&require_value(args, "--store")?)?,
                "--data-dir" => data_dir = require_value(args, "--data-dir")?.into(),
                "--db" => db_url = require_value(args, "--db")?,
                "--lessons" => lessons = require_value(args, "--lessons")?.into(),
                "--learner" => learner = Some(parse_learner(require_value(args, "--learner")?)?),
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if db_url.trim().is_empty() {
            return Err(ArgsError::InvalidDbUrl { raw: db_url });
        }

        Ok(Self {
            store,
            data_dir,
            db_url: sqlite_url(&db_url),
            lessons,
            learner,
            verbose,
        })
    }
}

fn parse_learner(raw: String) -> Result<LearnerId, ArgsError> {
    LearnerId::new(&raw).map_err(|_| ArgsError::InvalidLearner { raw })
}

/// Ask SQLite to create the database file on first use.
fn sqlite_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains(":memory:") || raw.contains("mode=") {
        return raw.to_owned();
    }
    let separator = if raw.contains('?') { '&' } else { '?' };
    format!("{raw}{separator}mode=rwc")
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_storage(args: &Args) -> Result<Storage, Box<dyn std::error::Error>> {
    let storage = match args.store {
        StoreKind::Memory => Storage::in_memory(),
        StoreKind::Json => Storage::json_dir(&args.data_dir).await?,
        StoreKind::Sqlite => Storage::sqlite(&args.db_url).await?,
    };
    info!(store = ?args.store, "storage ready");
    Ok(storage)
}

//
// ─── TERMINAL LOOP ─────────────────────────────────────────────────────────────
//

type Input = Lines<BufReader<Stdin>>;

async fn prompt(input: &mut Input, label: &str) -> std::io::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    input.next_line().await
}

async fn ask_learner(input: &mut Input) -> Result<Option<LearnerId>, Box<dyn std::error::Error>> {
    loop {
        let Some(line) = prompt(input, "Learner name: ").await? else {
            return Ok(None);
        };
        match LearnerId::new(&line) {
            Ok(learner) => return Ok(Some(learner)),
            Err(err) => println!("{err}"),
        }
    }
}

fn render_diff(tokens: &[DiffToken]) -> String {
    tokens
        .iter()
        .map(|token| {
            if token.matches {
                token.text.clone()
            } else {
                format!("[{}]", token.text)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_feedback(feedback: &AnswerFeedback) {
    if feedback.evaluation.is_correct {
        println!("Correct! Score {}, streak {}.", feedback.score, feedback.streak);
        if let Some(explanation) = &feedback.explanation {
            println!("  {explanation}");
        }
    } else {
        println!("Not quite: {}", render_diff(&feedback.evaluation.diff));
        if let Some(hint) = &feedback.evaluation.hint {
            println!("  {hint}");
        }
    }
    for badge in &feedback.newly_unlocked {
        println!("Achievement unlocked: {badge} ({})", badge.description());
    }
    if feedback.lesson_completed {
        println!("Lesson complete!");
    }
}

fn announce_lesson(id: &LessonId, lesson: &Lesson) {
    match lesson.title() {
        Some(title) => println!("Lesson {id}: {title}"),
        None => println!("Lesson {id}"),
    }
    if let Some(description) = lesson.description() {
        println!("  {description}");
    }
    println!("{} questions. Type :next to begin.", lesson.len());
}

fn print_stats(session: &QuizSession) {
    let profile = session.profile();
    println!(
        "Score {}, streak {}, lessons completed {}.",
        profile.score(),
        profile.streak(),
        profile.lessons_completed()
    );
    if let Some((passed, total)) = session.pass_progress() {
        println!("This pass: {passed}/{total} answered.");
    }
    for badge in profile.achievements().iter() {
        println!("  {badge}: {}", badge.description());
    }
}

async fn run_loop(
    service: &QuizService,
    session: &mut QuizSession,
    catalog: &LessonCatalog,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand::rng();
    print_commands();

    while let Some(line) = prompt(input, "> ").await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let result = match command {
            ":quit" | ":q" => break,
            ":help" => {
                print_commands();
                Ok(())
            }
            ":lessons" => {
                for id in catalog.ids() {
                    let title = catalog.get(id).and_then(|lesson| lesson.title()).unwrap_or("");
                    println!("  {id}  {title}");
                }
                Ok(())
            }
            ":lesson" => match LessonId::new(rest.trim()) {
                Ok(id) => match catalog.get(&id) {
                    Some(lesson) => service
                        .select_lesson(session, id.clone(), lesson.clone())
                        .await
                        .map(|()| announce_lesson(&id, lesson)),
                    None => {
                        println!("No lesson named {id}.");
                        Ok(())
                    }
                },
                Err(err) => {
                    println!("{err}");
                    Ok(())
                }
            },
            ":next" | ":n" => service
                .on_next_requested(session, &mut rng)
                .await
                .map(|next| println!("{}", next.prompt)),
            ":stats" => {
                print_stats(session);
                Ok(())
            }
            ":reset" => service
                .on_reset_requested(session)
                .await
                .map(|()| println!("Progress reset.")),
            _ => service
                .on_answer_submitted(session, line)
                .await
                .map(|feedback| print_feedback(&feedback)),
        };

        if let Err(err) = result {
            if err.is_corrupt_state() {
                return Err(err.into());
            }
            println!("{err}");
        }
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing(args.verbose);

    let storage = open_storage(&args).await?;
    let catalog = load_catalog(&args.lessons).await?;
    let service = QuizService::new(Clock::system(), storage.progress);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let learner = match args.learner {
        Some(learner) => learner,
        None => match ask_learner(&mut input).await? {
            Some(learner) => learner,
            None => return Ok(()),
        },
    };

    let mut session = service.open_session(learner).await?;
    run_loop(&service, &mut session, &catalog, &mut input).await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        parse_with_env(args, &[])
    }

    fn parse_with_env(args: &[&str], env: &[(&str, &str)]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|arg| (*arg).to_owned());
        Args::parse(&mut iter, |key| {
            env.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_owned())
        })
    }

    #[test]
    fn defaults_without_flags_or_env() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.store, StoreKind::Json);
        assert_eq!(args.data_dir, PathBuf::from("."));
        assert_eq!(args.lessons, PathBuf::from("lessons.json"));
        assert_eq!(args.db_url, "sqlite:quiz.sqlite3?mode=rwc");
        assert!(args.learner.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn env_fills_in_and_flags_win() {
        let env = [("QUIZ_STORE", "sqlite"), ("QUIZ_LEARNER", "ben")];
        let args = parse_with_env(&[], &env).unwrap();
        assert_eq!(args.store, StoreKind::Sqlite);
        assert_eq!(args.learner.unwrap().as_str(), "ben");

        let args = parse_with_env(&["--store", "memory", "--learner", "anna"], &env).unwrap();
        assert_eq!(args.store, StoreKind::Memory);
        assert_eq!(args.learner.unwrap().as_str(), "anna");
    }

    #[test]
    fn bad_env_store_is_rejected() {
        assert!(matches!(
            parse_with_env(&[], &[("QUIZ_STORE", "cloud")]),
            Err(ArgsError::InvalidStore { .. })
        ));
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--store",
            "memory",
            "--lessons",
            "german.json",
            "--learner",
            "anna",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(args.store, StoreKind::Memory);
        assert_eq!(args.lessons, PathBuf::from("german.json"));
        assert_eq!(args.learner.unwrap().as_str(), "anna");
        assert!(args.verbose);
    }

    #[test]
    fn unknown_store_is_rejected() {
        assert!(matches!(
            parse(&["--store", "cloud"]),
            Err(ArgsError::InvalidStore { .. })
        ));
    }

    #[test]
    fn missing_value_is_reported() {
        let err = parse(&["--data-dir"]).err().unwrap();
        assert_eq!(err.to_string(), "--data-dir requires a value");
    }

    #[test]
    fn learner_with_path_separator_is_rejected() {
        assert!(matches!(
            parse(&["--learner", "../etc"]),
            Err(ArgsError::InvalidLearner { .. })
        ));
    }

    #[test]
    fn sqlite_url_creates_missing_file() {
        assert_eq!(sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(sqlite_url("sqlite:data/quiz.db"), "sqlite:data/quiz.db?mode=rwc");
        assert_eq!(
            sqlite_url("sqlite:quiz.db?cache=shared"),
            "sqlite:quiz.db?cache=shared&mode=rwc"
        );
        assert_eq!(sqlite_url("sqlite:quiz.db?mode=ro"), "sqlite:quiz.db?mode=ro");
    }

    #[test]
    fn blank_db_url_is_rejected() {
        assert!(matches!(
            parse(&["--db", "  "]),
            Err(ArgsError::InvalidDbUrl { .. })
        ));
    }

    #[test]
    fn diff_marks_mismatched_words() {
        let tokens = vec![
            DiffToken {
                text: "der".into(),
                matches: true,
            },
            DiffToken {
                text: "Katze".into(),
                matches: false,
            },
        ];
        assert_eq!(render_diff(&tokens), "der [Katze]");
    }
}
