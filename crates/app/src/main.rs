mod play;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use classroom_core::model::{Difficulty, Profile, Role, Topic, UserHandle};
use services::{ClassroomService, Clock, GameConfig};
use storage::{ExportSink, InMemoryRepository, JsonFileStore, ProfileLookup, ResultSink, Storage};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTopic { raw: String },
    InvalidDifficulty { raw: String },
    InvalidRole { raw: String },
    EmptyUser,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTopic { raw } => write!(f, "invalid --topic value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => write!(f, "invalid --difficulty value: {raw}"),
            ArgsError::InvalidRole { raw } => write!(f, "invalid --role value: {raw}"),
            ArgsError::EmptyUser => write!(f, "--user must not be blank"),
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
    eprintln!("  classroom quiz  [--topic planets|constellations] [--difficulty easy|normal|hard]");
    eprintln!("  classroom match [--topic <topic>] [--difficulty <level>] --team <name> [--team <name>...]");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --config <path>   game settings and content (JSON)");
    eprintln!("  --user <handle>   who publishes the result (default: teacher)");
    eprintln!("  --role <role>     teacher|admin|student|none (default: teacher)");
    eprintln!("  --out <dir>       where results and exports are written");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CLASSROOM_CONFIG, CLASSROOM_OUT_DIR, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Match,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "match" => Some(Self::Match),
            _ => None,
        }
    }
}

struct Args {
    config: Option<PathBuf>,
    topic: Topic,
    difficulty: Difficulty,
    teams: Vec<String>,
    user: UserHandle,
    role: Option<Role>,
    out_dir: PathBuf,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            config: std::env::var_os("CLASSROOM_CONFIG").map(PathBuf::from),
            topic: Topic::Planets,
            difficulty: Difficulty::Easy,
            teams: Vec::new(),
            user: UserHandle::new("teacher"),
            role: Some(Role::Teacher),
            out_dir: std::env::var_os("CLASSROOM_OUT_DIR")
                .map_or_else(|| PathBuf::from("classroom-results"), PathBuf::from),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => parsed.config = Some(require_value(args, "--config")?.into()),
                "--topic" => {
                    let value = require_value(args, "--topic")?;
                    parsed.topic = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidTopic { raw: value.clone() })?;
                }
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    parsed.difficulty = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value.clone() })?;
                }
                "--team" => parsed.teams.push(require_value(args, "--team")?),
                "--user" => {
                    let value = require_value(args, "--user")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::EmptyUser);
                    }
                    parsed.user = UserHandle::new(value.trim());
                }
                "--role" => parsed.role = parse_role(&require_value(args, "--role")?)?,
                "--out" => parsed.out_dir = require_value(args, "--out")?.into(),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn parse_role(raw: &str) -> Result<Option<Role>, ArgsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "teacher" => Ok(Some(Role::Teacher)),
        "admin" => Ok(Some(Role::Admin)),
        "student" => Ok(Some(Role::Student)),
        "none" => Ok(None),
        _ => Err(ArgsError::InvalidRole { raw: raw.to_owned() }),
    }
}

/// Results and exports go to disk; the profile comes from the command line.
async fn build_storage(args: &Args) -> Result<Storage, Box<dyn std::error::Error>> {
    let store = JsonFileStore::open(&args.out_dir).await?;
    let profiles = InMemoryRepository::new();
    profiles.upsert_profile(
        args.user.clone(),
        Profile::new(args.role, args.user.as_str(), ""),
    )?;

    let results: Arc<dyn ResultSink> = Arc::new(store.clone());
    let exports: Arc<dyn ExportSink> = Arc::new(store);
    let profiles: Arc<dyn ProfileLookup> = Arc::new(profiles);
    Ok(Storage {
        results,
        exports,
        profiles,
    })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = match &args.config {
        Some(path) => GameConfig::from_path(path)?,
        None => GameConfig::default(),
    };
    let storage = build_storage(&args).await?;
    log::info!("writing results under {}", args.out_dir.display());
    let service = ClassroomService::new(Clock::system(), config, storage);

    match cmd {
        Command::Quiz => {
            let mut quiz = service.start_quiz(args.topic, args.difficulty)?;
            play::run_quiz(&service, &mut quiz).await?;
            play::publish(&service, &args.user, &quiz).await;
        }
        Command::Match => {
            let mut game = service.start_matching(args.topic, args.difficulty, &args.teams)?;
            play::run_match(&service, &mut game).await?;
            play::publish(&service, &args.user, &game).await;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
