//! Prompt system for Docent.
//!
//! This crate provides the grounding instruction block sent to the generation
//! model:
//! - A built-in `answer.grounded` definition
//! - YAML overrides under `.docent/prompts/`
//! - Handlebars rendering of persona, context, and question

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_grounded_prompt;
pub use loader::{builtin_prompt, load_prompt, GROUNDED_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
