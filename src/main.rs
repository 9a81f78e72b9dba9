//! repomark command-line front end.
//!
//! Signs in as `--user`, runs one bookmark operation against the local store
//! and exits. Logs go to stderr; results go to stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use repomark::app::App;
use repomark::logging;
use repomark::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use repomark::types::bookmark::AddOutcome;
use repomark::types::errors::AppError;
use repomark::types::github::Suggestion;
use repomark::types::import::ImportEvent;

#[derive(Parser)]
#[command(
    name = "repomark",
    version,
    about = "Bookmark GitHub repositories and import bookmark lists"
)]
struct Cli {
    /// User whose bookmarks to operate on
    #[arg(long, global = true)]
    user: Option<String>,

    /// Settings file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List bookmarked repositories
    List,
    /// Bookmark a repository by owner/name
    Add { full_name: String },
    /// Remove a bookmark by repository id
    Remove { id: String },
    /// Remove every bookmark
    Clear,
    /// Import a newline-delimited .csv file of owner/name lines
    Import { file: PathBuf },
    /// Bookmarks per day
    Activity,
    /// Suggest GitHub users and repositories
    Search { query: String },
    /// List a user's public repositories
    Repos { username: String },
}

impl Command {
    fn needs_user(&self) -> bool {
        !matches!(self, Command::Search { .. } | Command::Repos { .. })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.command.needs_user() && cli.user.as_deref().map_or(true, |u| u.trim().is_empty()) {
        eprintln!("repomark: --user is required for this command");
        return ExitCode::FAILURE;
    }

    let config_path = cli.config.as_ref().map(|p| p.display().to_string());
    let mut settings_engine = SettingsEngine::new(config_path);
    if let Err(e) = settings_engine.load() {
        eprintln!("repomark: {}", e);
        return ExitCode::FAILURE;
    }
    let settings = settings_engine.effective_settings();
    logging::init(&settings.logging.level, settings.logging.json);

    match run(cli, settings_engine).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("repomark: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, settings_engine: SettingsEngine) -> Result<(), AppError> {
    let app = App::open(settings_engine)?;

    if let Some(user) = cli.user.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        app.sign_in(user).await?;
    }

    match cli.command {
        Command::List => {
            let bookmarks = app.store.bookmarks();
            if bookmarks.is_empty() {
                println!("No bookmarks yet.");
            }
            for b in bookmarks {
                println!(
                    "{:>12}  {:<40} {:<12} {}",
                    b.id,
                    b.full_name,
                    b.language.as_deref().unwrap_or("-"),
                    b.bookmarked_at.format("%Y-%m-%d")
                );
            }
        }
        Command::Add { full_name } => match app.add_by_name(&full_name).await? {
            AddOutcome::Added(record) => {
                println!("Bookmarked {} ({})", record.full_name, record.html_url)
            }
            AddOutcome::AlreadyBookmarked => println!("{} is already bookmarked", full_name),
            AddOutcome::Ignored => println!("Not signed in; nothing bookmarked"),
        },
        Command::Remove { id } => {
            app.store.remove_bookmark(&id).await?;
            println!("Removed {}", id);
        }
        Command::Clear => {
            let cleared = app.clear_bookmarks().await?;
            println!("Cleared {} bookmark(s)", cleared);
        }
        Command::Import { file } => {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            let progress = bar.clone();
            let summary = app
                .importer
                .import_file(&file, move |event| match event {
                    ImportEvent::Progress { processed, total, message, .. } => {
                        progress.set_length(total as u64);
                        progress.set_position(processed as u64);
                        progress.set_message(message);
                    }
                    ImportEvent::Finished { .. } => progress.finish_and_clear(),
                })
                .await;
            bar.finish_and_clear();
            println!("{}", summary?);
        }
        Command::Activity => {
            for point in app.activity() {
                println!("{}", point.label);
            }
        }
        Command::Search { query } => {
            for suggestion in app.search.suggest(&query).await? {
                match suggestion {
                    Suggestion::User { login, html_url, .. } => {
                        println!("user  {:<40} {}", login, html_url)
                    }
                    Suggestion::Repo { full_name, html_url, .. } => {
                        println!("repo  {:<40} {}", full_name, html_url)
                    }
                }
            }
        }
        Command::Repos { username } => {
            for repo in app.user_repos(&username).await? {
                println!(
                    "{:<40} {}",
                    repo.full_name,
                    repo.description.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}
