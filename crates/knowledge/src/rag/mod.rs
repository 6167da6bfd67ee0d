//! Retrieval-augmented answering.
//!
//! Embeds a question, retrieves the nearest chunks, and asks the generation
//! gateway to answer strictly from them.

pub mod answer;
pub mod generate;
pub mod types;

pub use answer::{assemble_context, AnswerOptions, Answerer, QueryStage};
pub use generate::{GenerationGateway, LlmGenerationGateway};
pub use types::{Answer, ConversationLog, Outcome, Role, Turn};
