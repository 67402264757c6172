use std::fmt;
use std::sync::Arc;

use services::{Clock, ProgressService};
use upskill_core::model::{BadgeId, LessonCatalog, LessonId, LessonState, Rating, Role};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingLessonId,
    UnknownArg(String),
    InvalidRating { raw: String },
    InvalidRole { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingLessonId => write!(f, "expected a lesson id"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidRating { raw } => {
                write!(f, "invalid --rating value (expected positive|negative): {raw}")
            }
            ArgsError::InvalidRole { raw } => write!(f, "invalid role: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- status                        # overview (default)");
    eprintln!("  cargo run -p app -- lessons [--role <role>]       # list lessons with state");
    eprintln!("  cargo run -p app -- complete <lesson-id> [--rating positive|negative]");
    eprintln!("  cargo run -p app -- uncomplete <lesson-id>");
    eprintln!("  cargo run -p app -- role <marketing|hr|ops|support|none>");
    eprintln!("  cargo run -p app -- badges");
    eprintln!("  cargo run -p app -- unlock <badge-id>");
    eprintln!("  cargo run -p app -- reset");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --db <sqlite_url>   (default sqlite:upskill.sqlite3)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  UPSKILL_DB_URL");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Status,
    Lessons { role: Option<Role> },
    Complete { lesson_id: LessonId, rating: Option<Rating> },
    Uncomplete { lesson_id: LessonId },
    SetRole { role: Option<Role> },
    Badges,
    Unlock { badge_id: BadgeId },
    Reset,
}

#[derive(Debug)]
struct Args {
    db_url: String,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("UPSKILL_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://upskill.sqlite3".into(), normalize_sqlite_url);

        let mut command_word: Option<String> = None;
        let mut positionals: Vec<String> = Vec::new();
        let mut role_flag: Option<Role> = None;
        let mut rating: Option<Rating> = None;

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--role" => {
                    let value = require_value(&mut args, "--role")?;
                    role_flag = Some(parse_role(&value)?);
                }
                "--rating" => {
                    let value = require_value(&mut args, "--rating")?;
                    rating = Some(match value.as_str() {
                        "positive" => Rating::Positive,
                        "negative" => Rating::Negative,
                        _ => return Err(ArgsError::InvalidRating { raw: value }),
                    });
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with("--") => {
                    return Err(ArgsError::UnknownArg(other.to_string()));
                }
                _ if command_word.is_none() => command_word = Some(arg),
                _ => positionals.push(arg),
            }
        }

        let command = match command_word.as_deref() {
            None | Some("status") => Command::Status,
            Some("lessons") => Command::Lessons { role: role_flag },
            Some("complete") => Command::Complete {
                lesson_id: take_lesson_id(&mut positionals)?,
                rating,
            },
            Some("uncomplete") => Command::Uncomplete {
                lesson_id: take_lesson_id(&mut positionals)?,
            },
            Some("role") => {
                let value = positionals
                    .pop()
                    .ok_or(ArgsError::MissingValue { flag: "role" })?;
                let role = if value == "none" {
                    None
                } else {
                    Some(parse_role(&value)?)
                };
                Command::SetRole { role }
            }
            Some("badges") => Command::Badges,
            Some("unlock") => {
                let value = positionals
                    .pop()
                    .ok_or(ArgsError::MissingValue { flag: "unlock" })?;
                Command::Unlock {
                    badge_id: BadgeId::new(value),
                }
            }
            Some("reset") => Command::Reset,
            Some(other) => return Err(ArgsError::UnknownArg(other.to_string())),
        };

        Ok(Self { db_url, command })
    }
}

fn take_lesson_id(positionals: &mut Vec<String>) -> Result<LessonId, ArgsError> {
    positionals
        .pop()
        .map(LessonId::new)
        .ok_or(ArgsError::MissingLessonId)
}

fn parse_role(raw: &str) -> Result<Role, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidRole {
        raw: raw.to_string(),
    })
}

fn normalize_sqlite_url(raw: String) -> String {
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

    let path = std::path::Path::new(path);
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

fn state_marker(state: LessonState) -> &'static str {
    match state {
        LessonState::Completed => "[x]",
        LessonState::Incomplete | LessonState::Absent => "[ ]",
    }
}

fn print_status(service: &ProgressService) {
    let overview = service.overview();
    println!(
        "Lessons: {}/{} completed ({:.0}%)",
        overview.completed_lessons,
        overview.total_lessons,
        overview.completion_percent
    );
    println!(
        "Badges:  {}/{} earned",
        overview.earned_badges, overview.total_badges
    );
    println!("Time:    {} minutes of content", overview.minutes_spent);
    println!("Streak:  {} day(s)", overview.active_day_streak);
    match overview.current_role {
        Some(role) => println!("Role:    {}", role.label()),
        None => println!("Role:    not selected"),
    }

    println!();
    for role in Role::ALL {
        let role_view = service.role_overview(role);
        println!(
            "  {:<10} {}/{} ({:.0}%)",
            role.label(),
            role_view.completed_lessons,
            role_view.total_lessons,
            role_view.completion_percent
        );
    }

    let recent = service.recent_activity(5);
    if !recent.is_empty() {
        println!();
        println!("Recent activity:");
        for entry in recent {
            println!("  {} at {}", entry.lesson_id, entry.completed_at.to_rfc3339());
        }
    }
}

fn print_lessons(service: &ProgressService, role: Option<Role>) {
    for lesson in service.catalog().lessons() {
        if role.is_some_and(|wanted| lesson.role != wanted) {
            continue;
        }
        let state = service.lesson_state(&lesson.id);
        println!(
            "{} {:<20} {:<10} {:>3} min  {}",
            state_marker(state),
            lesson.id,
            lesson.role.label(),
            lesson.duration_minutes,
            lesson.title
        );
    }
}

fn print_badges(service: &ProgressService) {
    for badge in service.badges() {
        let marker = if badge.earned { "earned" } else { "locked" };
        println!("{} {:<22} {:<8} {}", badge.icon, badge.id, marker, badge.label);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let catalog = Arc::new(LessonCatalog::builtin());
    let service =
        ProgressService::new_sqlite(&args.db_url, Clock::default_clock(), catalog).await?;

    match args.command {
        Command::Status => print_status(&service),
        Command::Lessons { role } => print_lessons(&service, role),
        Command::Complete { lesson_id, rating } => {
            let earned = service
                .record_lesson_outcome(lesson_id.clone(), true, rating)
                .await;
            println!("completed {lesson_id}");
            for badge_id in earned {
                println!("badge earned: {badge_id}");
            }
        }
        Command::Uncomplete { lesson_id } => {
            service
                .record_lesson_outcome(lesson_id.clone(), false, None)
                .await;
            println!("marked {lesson_id} as not completed");
        }
        Command::SetRole { role } => {
            service.set_current_role(role).await;
            match role {
                Some(role) => println!("active role: {}", role.label()),
                None => println!("active role cleared"),
            }
        }
        Command::Badges => print_badges(&service),
        Command::Unlock { badge_id } => {
            if service.unlock_badge(&badge_id).await {
                println!("badge earned: {badge_id}");
            } else {
                println!("no change for {badge_id}");
            }
        }
        Command::Reset => {
            service.reset().await?;
            println!("progress cleared");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
