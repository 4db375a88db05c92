mod args;
mod play;

use std::io;
use std::path::Path;

use services::{
    Clock, QuizServices, QuizServicesError, QuizUpload, SessionKey, StartedQuiz, UploadError,
};
use storage::repository::QuizListItem;

use args::{Args, ArgsError, Command, Settings, print_usage};
use play::{PlayOutcome, ask_again, play_attempt};

const LOCAL_SESSION: &str = "local";

fn read_upload(file: &Path, settings: &Settings) -> io::Result<QuizUpload> {
    let bytes = std::fs::read(file)?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(QuizUpload::new(file_name, bytes).with_uploaded_by(settings.user.clone()))
}

fn session_key(settings: &Settings) -> SessionKey {
    SessionKey::new(settings.user.as_deref().unwrap_or(LOCAL_SESSION))
}

async fn open_services(settings: &Settings) -> Result<QuizServices, Box<dyn std::error::Error>> {
    // Open + migrate SQLite here so the services stay unaware of files on disk.
    let Settings { db_url, seed, .. } = settings;
    prepare_sqlite_file(db_url)?;
    Ok(QuizServices::new_sqlite(db_url, Clock::system(), *seed).await?)
}

fn print_listing(items: &[QuizListItem]) {
    if items.is_empty() {
        println!("No quizzes stored yet.");
        return;
    }
    for item in items {
        let by = item
            .uploaded_by
            .as_deref()
            .map(|user| format!(" by {user}"))
            .unwrap_or_default();
        println!(
            "{:>4}  {}  ({} questions, uploaded {}{by})",
            item.id.value(),
            item.title,
            item.question_count,
            item.uploaded_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn run_interactive(
    services: &QuizServices,
    key: &SessionKey,
    started: StartedQuiz,
) -> Result<(), Box<dyn std::error::Error>> {
    let sessions = services.sessions();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    println!(
        "Loaded {} questions. Answer with the choice number or its text, :q to quit.",
        started.parsed_questions
    );
    let mut first = started.first;
    loop {
        match play_attempt(&sessions, key, first, &mut input, &mut out)? {
            PlayOutcome::Quit => break,
            PlayOutcome::Finished(_) => {
                if !ask_again(&mut input, &mut out)? {
                    break;
                }
                first = sessions.restart(key)?;
            }
        }
    }
    services.end(key)?;
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv = std::env::args().skip(1);
    let parsed = Args::parse(
        argv,
        std::env::var("QUIZ_DB_URL").ok(),
        std::env::var("QUIZ_USER").ok(),
    )
    .map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let Some(Args { command, settings }) = parsed else {
        print_usage();
        return Ok(());
    };
    let key = session_key(&settings);

    match command {
        Command::Play { file, save } => {
            let upload = read_upload(&file, &settings)?;
            let services = if save {
                open_services(&settings).await?
            } else {
                QuizServices::in_memory(Clock::system(), settings.seed)
            };
            let started = services.upload_and_begin(&key, upload).await?;
            if save {
                log::info!("saved {} as quiz {}", file.display(), started.quiz_id);
            }
            run_interactive(&services, &key, started)
        }
        Command::Import { file } => {
            let upload = read_upload(&file, &settings)?;
            let services = open_services(&settings).await?;
            let outcome = services.upload().upload(upload).await?;
            println!(
                "Imported {} as quiz {} ({} questions).",
                file.display(),
                outcome.quiz_id,
                outcome.parsed_questions
            );
            Ok(())
        }
        Command::List { limit } => {
            let services = open_services(&settings).await?;
            print_listing(&services.list_quizzes(limit).await?);
            Ok(())
        }
        Command::Replay { quiz_id } => {
            let services = open_services(&settings).await?;
            let started = services.replay(&key, quiz_id).await?;
            run_interactive(&services, &key, started)
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// A rejected quiz file is the user's to fix; anything else is a backend failure.
fn report(err: &(dyn std::error::Error + 'static)) -> String {
    let rejected = err
        .downcast_ref::<QuizServicesError>()
        .is_some_and(QuizServicesError::is_user_error)
        || err
            .downcast_ref::<UploadError>()
            .is_some_and(UploadError::is_user_error);
    if rejected {
        format!("quiz file rejected: {err}")
    } else {
        err.to_string()
    }
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    if let Err(err) = run().await {
        // Binary glue: print once and exit.
        eprintln!("{}", report(&*err));
        std::process::exit(2);
    }
}
