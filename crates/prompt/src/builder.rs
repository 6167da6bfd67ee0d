//! Prompt builder for rendering the grounding instruction block.

use crate::types::{BuiltPrompt, PromptDefinition};
use docent_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build the grounded prompt for one question.
///
/// The persona, the retrieved context, and the question are bound into the
/// definition's template; nothing else is added.
///
/// # Arguments
/// * `definition` - Prompt definition (built in or loaded from YAML)
/// * `persona` - Bot persona prompt
/// * `context` - Retrieved chunk texts, already joined with the separator
/// * `question` - The user's question
///
/// # Example
/// ```no_run
/// use docent_prompt::{build_grounded_prompt, builtin_prompt, GROUNDED_PROMPT_ID};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(GROUNDED_PROMPT_ID).expect("built-in prompt");
/// let built = build_grounded_prompt(&def, "You are a helpful assistant.", "Bags: 23kg.", "Baggage limit?")?;
/// println!("{}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_grounded_prompt(
    definition: &PromptDefinition,
    persona: &str,
    context: &str,
    question: &str,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut variables = HashMap::new();
    variables.insert("persona", persona.trim());
    variables.insert("context", context);
    variables.insert("question", question.trim());

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        rendered,
        definition.id.clone(),
        context.chars().count(),
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<&str, &str>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    // Register template
    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    // Render
    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
