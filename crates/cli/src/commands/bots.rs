//! Bots command handler.

use clap::Args;
use docent_core::{config::AppConfig, AppResult};

/// List configured bots
#[derive(Args, Debug)]
pub struct BotsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BotsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        if self.json {
            let output = serde_json::json!({
                "defaultBot": config.default_bot,
                "bots": config.bots,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        for (key, bot) in &config.bots {
            let marker = if *key == config.default_bot { "*" } else { " " };
            println!("{} {} - {} (index: {})", marker, key, bot.display.display_name, bot.index_name);
            if let Some(ref subtitle) = bot.display.subtitle {
                println!("    {}", subtitle);
            }
        }

        Ok(())
    }
}
