use std::fmt;
use std::path::PathBuf;

use quiz_core::model::QuizId;

pub const DEFAULT_DB_URL: &str = "sqlite:quiz.sqlite3";
const DEFAULT_LIST_LIMIT: u32 = 20;

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidQuizId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid quiz id: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn parse_number<T: std::str::FromStr>(value: String, flag: &'static str) -> Result<T, ArgsError> {
    value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw: value })
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz play <file>   [--db <sqlite_url>] [--user <name>] [--seed <n>] [--no-save]");
    eprintln!("  quiz import <file> [--db <sqlite_url>] [--user <name>]");
    eprintln!("  quiz list          [--db <sqlite_url>] [--limit <n>]");
    eprintln!("  quiz replay <id>   [--db <sqlite_url>] [--user <name>] [--seed <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --limit {DEFAULT_LIST_LIMIT}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_USER, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play { file: PathBuf, save: bool },
    Import { file: PathBuf },
    List { limit: u32 },
    Replay { quiz_id: QuizId },
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_url: String,
    pub user: Option<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub settings: Settings,
}

/// `None` means help was requested.
pub type Parsed = Option<Args>;

impl Args {
    /// Parse everything after the program name. Environment values are passed in
    /// so flags can override them.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env_db_url: Option<String>,
        env_user: Option<String>,
    ) -> Result<Parsed, ArgsError> {
        let mut args = argv.into_iter();
        let Some(name) = args.next() else {
            return Err(ArgsError::MissingArgument { what: "subcommand" });
        };
        if matches!(name.as_str(), "--help" | "-h" | "help") {
            return Ok(None);
        }

        let mut settings = Settings {
            db_url: normalize_sqlite_url(env_db_url.unwrap_or_else(|| DEFAULT_DB_URL.into())),
            user: env_user.filter(|u| !u.trim().is_empty()),
            seed: None,
        };
        let mut positional: Option<String> = None;
        let mut save = true;
        let mut limit = DEFAULT_LIST_LIMIT;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    settings.db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    settings.user = Some(value).filter(|u| !u.trim().is_empty());
                }
                "--seed" => {
                    let value = require_value(&mut args, "--seed")?;
                    settings.seed = Some(parse_number(value, "--seed")?);
                }
                "--limit" => {
                    let value = require_value(&mut args, "--limit")?;
                    limit = parse_number(value, "--limit")?;
                }
                "--no-save" => save = false,
                "--help" | "-h" => return Ok(None),
                _ if !arg.starts_with("--") && positional.is_none() => positional = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match name.as_str() {
            "play" => Command::Play {
                file: positional
                    .ok_or(ArgsError::MissingArgument { what: "quiz file" })?
                    .into(),
                save,
            },
            "import" => Command::Import {
                file: positional
                    .ok_or(ArgsError::MissingArgument { what: "quiz file" })?
                    .into(),
            },
            "list" => match positional {
                Some(extra) => return Err(ArgsError::UnknownArg(extra)),
                None => Command::List { limit },
            },
            "replay" => {
                let raw = positional.ok_or(ArgsError::MissingArgument { what: "quiz id" })?;
                let quiz_id = raw
                    .parse::<QuizId>()
                    .map_err(|_| ArgsError::InvalidQuizId { raw: raw.clone() })?;
                Command::Replay { quiz_id }
            }
            _ => return Err(ArgsError::UnknownCommand(name)),
        };

        Ok(Some(Self { command, settings }))
    }
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

// ─── TESTS ─────────────────────────────────────────────────────────────────────
