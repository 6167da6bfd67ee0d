//! Docent CLI
//!
//! Main entry point for the docent command-line tool.
//! Ingests documents into a vector index and answers questions grounded in them.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, BotsCommand, ChatCommand, IngestCommand, StatsCommand};
use docent_core::config::{AppConfig, LogFormat};
use docent_core::{logging, AppError};
use std::path::PathBuf;
use std::process::ExitCode;

/// Docent - answers questions from your documents
#[derive(Parser, Debug)]
#[command(name = "docent")]
#[command(about = "Retrieval-augmented answers grounded in your documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCENT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.docent/config.yaml)
    #[arg(short, long, global = true, env = "DOCENT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest documents into a knowledge base (replaces its content)
    Ingest(IngestCommand),

    /// Answer one question from a knowledge base
    Ask(AskCommand),

    /// Interactive question loop with a bot
    Chat(ChatCommand),

    /// List configured bots
    Bots(BotsCommand),

    /// Show knowledge base statistics
    Stats(StatsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest(_) => "ingest",
            Commands::Ask(_) => "ask",
            Commands::Chat(_) => "chat",
            Commands::Bots(_) => "bots",
            Commands::Stats(_) => "stats",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = match AppConfig::load_from(cli.workspace.clone(), cli.config.clone()) {
        Ok(config) => config.with_overrides(cli.log_level.clone(), cli.verbose, cli.no_color),
        Err(e) => {
            // Logging is still needed to report the technical error
            let level = cli.log_level.as_deref().or(cli.verbose.then_some("debug"));
            if logging::init_logging(level, LogFormat::Text, cli.no_color).is_err() {
                eprintln!("{}", e);
            }
            return report_failure(&e);
        }
    };

    if let Err(e) = logging::init_logging(config.log_level.as_deref(), config.log_format, config.no_color) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Embedding: {} ({}), generation: {}, vector store: {}",
        config.embedding.provider,
        config.embedding.model,
        config.generation.provider,
        config.vector_store.backend
    );

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Bots(cmd) => cmd.execute(&config),
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match result {
        Ok(()) => {
            tracing::debug!("Command completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => report_failure(&e),
    }
}

/// Log the technical error and show the user a friendly one.
fn report_failure(error: &AppError) -> ExitCode {
    tracing::error!("Command failed: {}", error);
    eprintln!("{}", error.user_message());
    ExitCode::FAILURE
}
