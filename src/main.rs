//! gamebk command-line client
//!
//! Runs one action against the backup API per invocation. Tables go to
//! stdout, feedback to stderr.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gamebk_client::config::Config;
use gamebk_client::coordinator::{BackupForm, GameForm, Page};
use gamebk_client::errors::ClientError;
use gamebk_client::messages::{Catalog, Locale};
use gamebk_client::render::TableView;
use gamebk_client::transport::HttpTransport;
use gamebk_client::{ActionCoordinator, Deletion, HealthStatus};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LangName {
    En,
    Zh,
}

impl From<LangName> for Locale {
    fn from(lang: LangName) -> Self {
        match lang {
            LangName::En => Locale::En,
            LangName::Zh => Locale::Zh,
        }
    }
}

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "gamebk", about = "Client for the gamebk save-game backup API")]
struct Args {
    /// API base URL (overrides GAMEBK_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Display language (overrides GAMEBK_LANG)
    #[arg(long, global = true, value_enum)]
    lang: Option<LangName>,

    /// Skip the delete confirmation
    #[arg(long, global = true, default_value_t = false)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probe the server
    Health,
    /// List registered games
    Games,
    /// Register a game
    CreateGame {
        #[arg(long)]
        name: String,
        #[arg(long)]
        game_path: String,
        #[arg(long)]
        backup_root: String,
    },
    /// Change some fields of a game
    UpdateGame {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        game_path: Option<String>,
        #[arg(long)]
        backup_root: Option<String>,
    },
    /// Back up a game now
    Backup {
        game_id: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// List a game's backups
    Backups { game_id: String },
    /// Restore a game's most recent backup
    RestoreLatest { game_id: String },
    /// Restore one backup
    Restore { game_id: String, backup_id: String },
    /// Delete one backup
    DeleteBackup { game_id: String, backup_id: String },
}

type Client = ActionCoordinator<HttpTransport>;

fn print_table(view: Option<TableView>, catalog: &Catalog) {
    if let Some(view) = view {
        println!("{}", view.to_text(catalog));
    }
}

fn confirm_on_stdin(prompt: &str) -> bool {
    eprint!("{} [y/N] ", prompt);
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

async fn run(client: &Client, command: Command, assume_yes: bool) -> Result<(), ClientError> {
    let catalog = *client.catalog();

    match command {
        Command::Health => {
            let status = client.health_check().await?;
            println!("{}", status.indicator(&catalog));
            match status {
                HealthStatus::Ok => {}
                HealthStatus::Failing(status) => {
                    return Err(ClientError::Application {
                        status,
                        message: None,
                    })
                }
                HealthStatus::Unknown | HealthStatus::Unreachable => {
                    return Err(ClientError::Transport("server unreachable".to_string()))
                }
            }
        }
        Command::Games => {
            client.list_games().await?;
            print_table(client.games_view(), &catalog);
        }
        Command::CreateGame {
            name,
            game_path,
            backup_root,
        } => {
            let mut form = GameForm {
                name,
                game_path,
                backup_root,
            };
            client.create_game(&mut form).await?;
            print_table(client.games_view(), &catalog);
        }
        Command::UpdateGame {
            id,
            name,
            game_path,
            backup_root,
        } => {
            let mut form = GameForm {
                name: name.unwrap_or_default(),
                game_path: game_path.unwrap_or_default(),
                backup_root: backup_root.unwrap_or_default(),
            };
            client.update_game(&id, &mut form).await?;
            print_table(client.games_view(), &catalog);
        }
        Command::Backup { game_id, name } => {
            client.open_game(&game_id).await?;
            let mut form = BackupForm::named(name.unwrap_or_default());
            client.run_backup(&mut form).await?;
            print_table(client.backups_view(), &catalog);
        }
        Command::Backups { game_id } => {
            // Opening a game already loads its backups.
            client.open_game(&game_id).await?;
            print_table(client.backups_view(), &catalog);
        }
        Command::RestoreLatest { game_id } => {
            client.open_game(&game_id).await?;
            let result = client.restore_latest().await?;
            println!("{}", result.to_pretty_json());
        }
        Command::Restore { game_id, backup_id } => {
            client.open_game(&game_id).await?;
            let result = client.restore_backup(&backup_id).await?;
            println!("{}", result.to_pretty_json());
        }
        Command::DeleteBackup { game_id, backup_id } => {
            client.open_game(&game_id).await?;
            let deletion = client
                .delete_backup(&backup_id, |prompt| assume_yes || confirm_on_stdin(prompt))
                .await?;
            if let Deletion::Deleted(_) = deletion {
                print_table(client.backups_view(), &catalog);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging first so configuration warnings are visible
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Config::log_level_from_env()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Load configuration
    let mut config = Config::from_env();
    if let Some(base_url) = args.base_url {
        config.base_url = Some(base_url);
    }
    if let Some(lang) = args.lang {
        config.locale = lang.into();
    }

    let transport = HttpTransport::from_config(&config);
    tracing::debug!("Using API at {}", transport.base_url());

    let client = ActionCoordinator::from_config(transport, Page::Full, &config);
    let outcome = run(&client, args.command, args.yes).await;

    let feedback = client.notifications().current();
    if let Some(notification) = &feedback {
        eprintln!("{}", notification.message);
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if feedback.is_none() {
                eprintln!("{}", e.message());
            }
            tracing::debug!("Command failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
