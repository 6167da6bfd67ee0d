//! Command handlers for the Docent CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod bots;
pub mod chat;
pub mod ingest;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use bots::BotsCommand;
pub use chat::ChatCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;

use clap::Args;
use docent_core::{AppConfig, AppResult, BotConfig};

/// Selects the knowledge base a command works on.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Bot whose knowledge base to use (default: the configured default bot)
    #[arg(short, long)]
    pub bot: Option<String>,

    /// Index name, overriding the bot's index
    #[arg(short, long)]
    pub index: Option<String>,
}

/// A resolved bot and the index it should read or write.
pub struct Target<'a> {
    pub bot_key: &'a str,
    pub bot: &'a BotConfig,
    pub index_name: String,
}

impl TargetArgs {
    pub fn resolve<'a>(&self, config: &'a AppConfig) -> AppResult<Target<'a>> {
        let (bot_key, bot) = config.bot(self.bot.as_deref())?;
        let index_name = self.index.clone().unwrap_or_else(|| bot.index_name.clone());
        tracing::debug!("Using bot '{}' with index '{}'", bot_key, index_name);
        Ok(Target {
            bot_key,
            bot,
            index_name,
        })
    }
}
