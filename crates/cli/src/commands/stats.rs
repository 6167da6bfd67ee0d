//! Stats command handler.
//!
//! Shows the document count of a knowledge base.

use super::TargetArgs;
use clap::Args;
use docent_core::{config::AppConfig, AppResult};
use docent_knowledge::create_index;

/// Show knowledge base statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let target = self.target.resolve(config)?;
        tracing::info!("Executing stats command for index '{}'", target.index_name);

        let index = create_index(config)?;
        let documents = index.count(&target.index_name).await?;

        if self.json {
            let output = serde_json::json!({
                "index": target.index_name,
                "bot": target.bot_key,
                "backend": index.backend_name(),
                "documents": documents,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Knowledge base: {}", target.index_name);
            println!("  Bot: {}", target.bot_key);
            println!("  Backend: {}", index.backend_name());
            println!("  Documents: {}", documents);
        }

        Ok(())
    }
}
