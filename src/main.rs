//! Bookshelf CLI - inspect and maintain the reading companion database

mod commands;

use bookshelf::config::{self, Settings};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "bookshelf")]
#[command(version)]
#[command(about = "Reading companion storage - books, chunks, conversations")]
#[command(long_about = r#"
Bookshelf manages the local SQLite database behind the reading companion:
  • Applies versioned schema migrations
  • Lists books with their ingestion status and chunk counts
  • Replays conversations held about a book

Example usage:
  bookshelf init
  bookshelf books
  bookshelf history --conversation conv-1
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file (defaults to ./bookshelf.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Directory holding the migration files (overrides the config file)
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Apply pending migrations
    Migrate,

    /// Show applied and pending migrations
    Status,

    /// List every book
    Books,

    /// Show one book in detail
    Show {
        /// Book id
        id: String,
    },

    /// List conversations about a book, newest first
    Conversations {
        /// Book id
        book: String,
    },

    /// Replay the messages of a conversation
    History {
        /// Conversation id
        #[arg(long)]
        conversation: String,
    },

    /// Delete a book together with its chunks, conversations and summaries
    Delete {
        /// Book id
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// Print a JSON envelope for a successful command
pub fn emit_success(
    output_mode: OutputMode,
    command: &str,
    data: serde_json::Value,
) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins when set
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let file_config = config::load_config(Some(&config_path))?;
    let settings = Settings::resolve(file_config.as_ref(), cli.database, cli.schema_dir);

    let result = match cli.command {
        Commands::Init { force } => commands::run_init(&config_path, &settings, force, output_mode),
        Commands::Migrate => commands::run_migrate(&settings, output_mode),
        Commands::Status => commands::run_status(&settings, output_mode),
        Commands::Books => commands::run_books(&settings, output_mode),
        Commands::Show { id } => commands::run_show(&settings, &id, output_mode),
        Commands::Conversations { book } => {
            commands::run_conversations(&settings, &book, output_mode)
        }
        Commands::History { conversation } => {
            commands::run_history(&settings, &conversation, output_mode)
        }
        Commands::Delete { id } => commands::run_delete(&settings, &id, output_mode),
    };

    if let Err(e) = result {
        match output_mode {
            OutputMode::Human => bookshelf::ui::error(&format!("{:#}", e)),
            OutputMode::Json => {
                let envelope = serde_json::json!({ "ok": false, "error": format!("{:#}", e) });
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            }
        }
        std::process::exit(1);
    }
    Ok(())
}
