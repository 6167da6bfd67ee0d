//! Chat command handler.
//!
//! A line-oriented question loop. Each question is answered independently;
//! the transcript is kept only for `/history`.

use super::ask::print_context;
use super::TargetArgs;
use clap::Args;
use docent_core::{config::AppConfig, AppResult};
use docent_knowledge::{create_answerer, ConversationLog};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive question loop with a bot
#[derive(Args, Debug)]
pub struct ChatCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Number of chunks to retrieve (default: retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Print the retrieved context after each answer
    #[arg(long)]
    pub show_context: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let target = self.target.resolve(config)?;
        let answerer = create_answerer(config, self.top_k)?;
        tracing::info!("Starting chat with bot '{}' on index '{}'", target.bot_key, target.index_name);

        let display = &target.bot.display;
        println!("{}", display.display_name);
        if let Some(ref subtitle) = display.subtitle {
            println!("{}", subtitle);
        }
        println!("(/history shows the conversation, /quit exits)");
        println!();
        println!("{}", target.bot.initial_message);

        let mut log = ConversationLog::with_greeting(target.bot.initial_message.clone());
        let placeholder = display.input_placeholder.as_deref().unwrap_or("");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("\n{}> ", placeholder);
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();

            match question {
                "" => continue,
                "/quit" | "/exit" => break,
                "/history" => {
                    for turn in log.turns() {
                        println!("{}", turn);
                    }
                    continue;
                }
                _ => {}
            }

            log.push_user(question);
            match answerer
                .answer(question, &target.index_name, &target.bot.persona_prompt)
                .await
            {
                Ok(answer) => {
                    println!("{}", answer.text);
                    if self.show_context {
                        print_context(&answer);
                    }
                    log.push_assistant(answer.text);
                }
                Err(e) => {
                    // A failed question never ends the session
                    tracing::error!("Question failed: {}", e);
                    println!("{}", e.user_message());
                    log.push_assistant(e.user_message());
                }
            }
        }

        tracing::debug!("Chat ended after {} turns", log.len());
        Ok(())
    }
}
