//! Ask command handler.
//!
//! Answers a single question from a knowledge base.

use super::TargetArgs;
use clap::Args;
use docent_core::{config::AppConfig, AppResult};
use docent_knowledge::{create_answerer, Answer};

/// Answer one question from a knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Number of chunks to retrieve (default: retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Print the retrieved context after the answer
    #[arg(long)]
    pub show_context: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// The question to ask
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let target = self.target.resolve(config)?;
        let question = self.question.join(" ");
        tracing::info!("Executing ask command against index '{}'", target.index_name);

        let answer = create_answerer(config, self.top_k)?
            .answer(&question, &target.index_name, &target.bot.persona_prompt)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            println!("{}", answer.text);
            if self.show_context {
                print_context(&answer);
            }
        }

        Ok(())
    }
}

pub(crate) fn print_context(answer: &Answer) {
    println!();
    if answer.retrieved.is_empty() {
        println!("Context: (nothing retrieved)");
        return;
    }
    println!("Context:");
    for (rank, hit) in answer.retrieved.iter().enumerate() {
        println!("[{}] score {:.3}", rank + 1, hit.score);
        println!("{}", hit.chunk_text);
    }
}
