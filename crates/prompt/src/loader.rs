//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use docchat_core::{AppError, AppResult};
use std::path::Path;

/// Load a prompt definition from a YAML file.
///
/// # Example
/// ```no_run
/// use docchat_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("prompts/answer.yaml"))?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(path: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            path
        )));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load the configured prompt file, or fall back to the built-in definition.
pub fn resolve_prompt(prompt_file: Option<&Path>) -> AppResult<PromptDefinition> {
    match prompt_file {
        Some(path) => load_prompt(path),
        None => Ok(PromptDefinition::default()),
    }
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if def.not_found.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt notFound sentence cannot be empty".to_string(),
        ));
    }

    // Without the context variable the model would never see the passages
    let compact: String = def.template.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact.contains("{{context}}") {
        return Err(AppError::Prompt(format!(
            "Prompt template of '{}' must reference {{{{context}}}}",
            def.id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NOT_FOUND_ANSWER;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, name: &str, content: &str) -> PathBuf {
        let file_path = dir.join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(
            temp_dir.path(),
            "answer.yaml",
            r#"
id: answer.en
title: "English answer"
template: |
  Answer only from the text below.
  If it is not there, reply "{{notFound}}".

  {{ context }}
notFound: "Not in the document."
separator: "\n\n"
"#,
        );

        let prompt = load_prompt(&path).unwrap();
        assert_eq!(prompt.id, "answer.en");
        assert_eq!(prompt.not_found, "Not in the document.");
        assert_eq!(prompt.separator, "\n\n");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(&temp_dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(temp_dir.path(), "invalid.yaml", "invalid: yaml: content:");

        assert!(load_prompt(&path).is_err());
    }

    #[test]
    fn test_template_without_context_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(
            temp_dir.path(),
            "no_context.yaml",
            "id: broken\ntemplate: \"Answer politely.\"\n",
        );

        let err = load_prompt(&path).unwrap_err();
        assert!(err.to_string().contains("{{context}}"));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_prompt(
            temp_dir.path(),
            "minimal.yaml",
            "id: minimal\ntemplate: \"{{context}}\"\n",
        );

        let prompt = load_prompt(&path).unwrap();
        assert_eq!(prompt.not_found, NOT_FOUND_ANSWER);
        assert_eq!(prompt.separator, "\n---\n");
    }

    #[test]
    fn test_resolve_without_file_uses_default() {
        let prompt = resolve_prompt(None).unwrap();
        assert_eq!(prompt, PromptDefinition::default());
    }
}
