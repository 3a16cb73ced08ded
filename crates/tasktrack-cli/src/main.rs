//! tasktrack - a command-line front end for the tasktrack task tracker.
//!
//! Signs in against the backend resolved from configuration and runs one
//! command per invocation, printing JSON results to stdout.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde_json::Value;
use tokio::sync::broadcast::Receiver;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tasktrack_core::auth::{open_store, FileSessionStore};
use tasktrack_core::{ApiClient, Attachment, Config, ProgressFn, SessionBackend, SessionEvent, TaskQuery};

// ============================================================================
// Constants
// ============================================================================

const USAGE: &str = "\
Usage: tasktrack <command> [args]

Session:
  login [email]            Sign in (prompts for the password)
  logout                   Sign out and forget the stored token
  whoami                   Show the signed-in user

Tasks:
  tasks [status]           List tasks, optionally filtered by status
  task <id>                Show one task
  history <id>             Show a task's history
  comment <id> <text>      Comment on a task
  accept <id>              Accept an assigned task
  reject <id>              Reject an assigned task
  upload <id> <file>...    Attach files to a task

Other:
  notifications            List notifications
  read-all                 Mark all notifications as read
  users                    List users (admin)
  resets                   List pending password reset requests (admin)";

/// Log file name inside the cache directory's `logs/` folder
const LOG_FILE: &str = "tasktrack.log";

/// Initialize the tracing subscriber for logging.
///
/// Console output honours `RUST_LOG` (default `warn`); a daily rolling log
/// file in the cache directory receives the same events.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?.with_env_overrides();
    let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    let _log_guard = init_tracing(&cache_dir.join("logs"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let store = open_store(config.session_store, cache_dir.clone());
    let client = ApiClient::new(&config, store)?;
    let mut events = client.subscribe();
    info!(base_url = client.base_url(), command = %command, "tasktrack starting");

    let result = run_command(&client, &config, &cache_dir, command, &args[1..]).await;
    report_session_events(&mut events);
    result
}

async fn run_command(
    client: &ApiClient,
    config: &Config,
    cache_dir: &Path,
    command: &str,
    args: &[String],
) -> Result<()> {
    match command {
        "login" => login(client, config, args.first().map(String::as_str)).await,
        "logout" => {
            client.logout().await?;
            eprintln!("Logged out.");
            Ok(())
        }
        "whoami" => whoami(client, config, cache_dir).await,
        "tasks" => {
            let query = TaskQuery {
                status: args.first().cloned(),
                ..TaskQuery::default()
            };
            print_json(&client.tasks().list(&query).await?)
        }
        "task" => print_json(&client.tasks().get(parse_id(args, 0)?).await?),
        "history" => print_json(&client.tasks().get_history(parse_id(args, 0)?).await?),
        "comment" => {
            let id = parse_id(args, 0)?;
            let text = args[1..].join(" ");
            if text.is_empty() {
                bail!("comment text is required");
            }
            print_json(&client.tasks().comment(id, &text).await?)
        }
        "accept" => print_json(&client.tasks().accept(parse_id(args, 0)?).await?),
        "reject" => print_json(&client.tasks().reject(parse_id(args, 0)?).await?),
        "upload" => upload(client, parse_id(args, 0)?, &args[1..]).await,
        "notifications" => print_json(&client.notifications().list().await?),
        "read-all" => print_json(&client.notifications().mark_all_as_read().await?),
        "users" => print_json(&client.get_users().await?),
        "resets" => print_json(&client.password_reset().get_reset_requests().await?),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }
}

async fn login(client: &ApiClient, config: &Config, email: Option<&str>) -> Result<()> {
    let email = match email.map(str::to_string).or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;

    let user = client.login(&email, &password).await?;
    if !client.has_token() {
        bail!("login did not return an access token");
    }

    // Persist only the email; env overrides stay out of the config file
    let mut saved = Config::load()?;
    saved.last_email = Some(email);
    saved.save()?;

    print_json(&user)
}

async fn whoami(client: &ApiClient, config: &Config, cache_dir: &Path) -> Result<()> {
    if !client.restore().await? {
        eprintln!("Not logged in. Run `tasktrack login`.");
        return Ok(());
    }

    if config.session_store == SessionBackend::File {
        if let Some(record) = FileSessionStore::new(cache_dir.to_path_buf()).load()? {
            let since = record.saved_at.with_timezone(&Local);
            eprintln!("Signed in since {}", since.format("%Y-%m-%d %H:%M"));
        }
    }
    print_json(&client.get_user().await?)
}

async fn upload(client: &ApiClient, task_id: i64, paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        bail!("at least one file is required");
    }
    let files = paths
        .iter()
        .map(|p| Attachment::from_path(Path::new(p)))
        .collect::<Result<Vec<_>, _>>()?;

    let on_progress: ProgressFn = Arc::new(|percent: Option<u8>| {
        if let Some(percent) = percent {
            eprint!("\rUploading... {:>3}%", percent);
            let _ = io::stderr().flush();
        }
    });
    let task = client
        .tasks()
        .upload_attachments(task_id, files, Some(on_progress))
        .await;
    eprintln!();
    print_json(&task?)
}

/// Tell the user when the backend rejected their session during the command.
fn report_session_events(events: &mut Receiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Invalidated { path } => {
                eprintln!("Session expired (rejected on {}). Run `tasktrack login` again.", path);
            }
        }
    }
}

fn parse_id(args: &[String], index: usize) -> Result<i64> {
    let raw = args
        .get(index)
        .ok_or_else(|| anyhow::anyhow!("missing id argument\n\n{}", USAGE))?;
    raw.parse()
        .with_context(|| format!("'{}' is not a valid id", raw))
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line).context("Failed to read input")?;
    Ok(line.trim().to_string())
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
