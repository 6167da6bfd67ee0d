//! Prompt loader for built-in and workspace prompt definitions.

use crate::types::PromptDefinition;
use docent_core::config::STATE_DIR;
use docent_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Identifier of the built-in grounded answering prompt.
pub const GROUNDED_PROMPT_ID: &str = "answer.grounded";

const GROUNDED_TEMPLATE: &str = "\n\nHuman: {{persona}}
Your primary goal is to answer the user's question accurately and concisely based **only** on the information available in the provided 'Context' below.
Do not use any external knowledge or make assumptions beyond what is stated in the context.
If the answer to the question cannot be found within the provided context, clearly state that you don't have enough information from the documents to answer.
Avoid speculation. Be direct and helpful.

Context:
{{context}}

Question: {{question}}

Assistant:";

/// Get a built-in prompt definition by ID.
pub fn builtin_prompt(prompt_id: &str) -> Option<PromptDefinition> {
    match prompt_id {
        GROUNDED_PROMPT_ID => Some(PromptDefinition {
            id: GROUNDED_PROMPT_ID.to_string(),
            title: "Grounded answer".to_string(),
            api_version: "1.0".to_string(),
            created_by: "docent".to_string(),
            template: GROUNDED_TEMPLATE.to_string(),
        }),
        _ => None,
    }
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(STATE_DIR).join("prompts")
}

/// Load a prompt definition by ID.
///
/// A file named `<id>.yml` in `.docent/prompts/` takes precedence over the
/// built-in definition of the same ID.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.docent/`
/// * `prompt_id` - Prompt identifier (e.g., "answer.grounded")
///
/// # Returns
/// A validated `PromptDefinition` or an error if not found/invalid.
///
/// # Example
/// ```no_run
/// use docent_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "answer.grounded")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return builtin_prompt(prompt_id).ok_or_else(|| {
            AppError::Prompt(format!(
                "Prompt '{}' is not built in and {:?} does not exist",
                prompt_id, prompt_file
            ))
        });
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    // A grounded prompt without either variable cannot bind the answer to the context
    for variable in ["context", "question"] {
        if !def.template.contains(&format!("{{{{{}}}}}", variable)) {
            return Err(AppError::Prompt(format!(
                "Prompt {} must reference {{{{{}}}}}",
                def.id, variable
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, template: &str) -> PathBuf {
        let prompts_dir = prompts_dir(dir);
        fs::create_dir_all(&prompts_dir).unwrap();

        let content = format!(
            "id: {}\ntitle: \"Test Prompt\"\napiVersion: \"1.0\"\ncreatedBy: test\ntemplate: \"{}\"\n",
            id, template
        );

        let file_path = prompts_dir.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_builtin_is_valid() {
        let def = builtin_prompt(GROUNDED_PROMPT_ID).unwrap();
        assert!(validate_prompt(&def).is_ok());
        assert!(builtin_prompt("nonexistent").is_none());
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), GROUNDED_PROMPT_ID).unwrap();
        assert_eq!(prompt.created_by, "docent");
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            GROUNDED_PROMPT_ID,
            "{{persona}} Context: {{context}} Q: {{question}}",
        );

        let prompt = load_prompt(temp_dir.path(), GROUNDED_PROMPT_ID).unwrap();
        assert_eq!(prompt.created_by, "test");
        assert!(prompt.template.starts_with("{{persona}}"));
    }

    #[test]
    fn test_template_must_reference_context_and_question() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "answer.loose", "Just answer: {{question}}");

        let result = load_prompt(temp_dir.path(), "answer.loose");
        match result {
            Err(AppError::Prompt(msg)) => assert!(msg.contains("{{context}}")),
            other => panic!("Expected prompt error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let prompts_dir = prompts_dir(temp_dir.path());
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join("invalid.yml"), "invalid: yaml: content:").unwrap();

        let result = load_prompt(temp_dir.path(), "invalid");
        assert!(result.is_err());
    }
}
