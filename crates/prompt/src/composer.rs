//! Prompt composer: renders retrieved passages into a system instruction.

use crate::types::{Composition, PromptDefinition};
use docchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde_json::json;

const TEMPLATE_NAME: &str = "answer";

/// Renders the grounded system instruction for a set of ranked passages.
///
/// Holds no per-request state and can be shared between requests.
///
/// # Example
/// ```
/// use docchat_prompt::{Composition, PromptComposer};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let composer = PromptComposer::new()?;
/// let composition = composer.compose(["O artigo trata de\nvetores."])?;
/// assert!(matches!(composition, Composition::Instruction(_)));
/// # Ok(())
/// # }
/// ```
pub struct PromptComposer {
    registry: Handlebars<'static>,
    definition: PromptDefinition,
}

impl std::fmt::Debug for PromptComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptComposer")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl PromptComposer {
    /// Create a composer with the built-in definition.
    pub fn new() -> AppResult<Self> {
        Self::from_definition(PromptDefinition::default())
    }

    /// Create a composer from a prompt definition.
    ///
    /// # Errors
    /// Returns `AppError::Prompt` when the template does not parse.
    pub fn from_definition(definition: PromptDefinition) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Plain text, not HTML
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        registry
            .register_template_string(TEMPLATE_NAME, &definition.template)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        tracing::debug!("Prompt composer ready: {}", definition.id);

        Ok(Self {
            registry,
            definition,
        })
    }

    /// The sentence used when nothing relevant was retrieved.
    pub fn not_found_answer(&self) -> &str {
        &self.definition.not_found
    }

    pub fn definition(&self) -> &PromptDefinition {
        &self.definition
    }

    /// Compose the system instruction for passages in ranked order.
    ///
    /// An empty input yields `Composition::NotFound` and the model must not
    /// be called.
    pub fn compose<I, S>(&self, passages: I) -> AppResult<Composition>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized: Vec<String> = passages
            .into_iter()
            .map(|p| collapse_whitespace(p.as_ref()))
            .collect();

        if normalized.is_empty() {
            return Ok(Composition::NotFound(self.definition.not_found.clone()));
        }

        let context = normalized.join(&self.definition.separator);
        let data = json!({
            "context": context,
            "notFound": self.definition.not_found,
        });

        let rendered = self
            .registry
            .render(TEMPLATE_NAME, &data)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        tracing::debug!(
            "Composed instruction from {} passage(s), {} bytes",
            normalized.len(),
            rendered.len()
        );

        Ok(Composition::Instruction(rendered))
    }
}

/// Replace every run of whitespace (newlines included) with a single space.
///
/// Leading and trailing runs become one space as well; nothing is trimmed.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DEFAULT_SEPARATOR, NOT_FOUND_ANSWER};

    #[test]
    fn test_empty_passages_yield_not_found() {
        let composer = PromptComposer::new().unwrap();
        let composition = composer.compose(Vec::<String>::new()).unwrap();
        assert_eq!(
            composition,
            Composition::NotFound(NOT_FOUND_ANSWER.to_string())
        );
    }

    #[test]
    fn test_newlines_collapse_to_single_space() {
        let composer = PromptComposer::new().unwrap();
        let composition = composer.compose(["a\nb"]).unwrap();

        let Composition::Instruction(text) = composition else {
            panic!("expected an instruction");
        };
        assert!(text.contains("a b"));
        assert!(!text.contains("a\nb"));
    }

    #[test]
    fn test_passages_joined_in_order_with_separator() {
        let composer = PromptComposer::new().unwrap();
        let composition = composer.compose(["primeiro", "segundo"]).unwrap();

        let text = composition.text();
        let expected = format!("primeiro{}segundo", DEFAULT_SEPARATOR);
        assert!(text.ends_with(&expected));
    }

    #[test]
    fn test_default_instruction_content() {
        let composer = PromptComposer::new().unwrap();
        let text = composer.compose(["trecho"]).unwrap().text().to_string();

        assert!(text.starts_with("Você é um assistente útil e preciso."));
        assert!(text.contains("responda apenas: \"Não consta no documento.\""));
        assert!(text.contains("TEXTO DE REFERÊNCIA:\ntrecho"));
    }

    #[test]
    fn test_no_html_escaping() {
        let composer = PromptComposer::new().unwrap();
        let text = composer.compose(["<b>x & y</b>"]).unwrap().text().to_string();
        assert!(text.contains("<b>x & y</b>"));
    }

    #[test]
    fn test_custom_definition() {
        let definition = PromptDefinition {
            id: "custom".to_string(),
            title: "Custom".to_string(),
            template: "Context: {{context}} | Fallback: {{notFound}}".to_string(),
            not_found: "Nothing found.".to_string(),
            separator: " || ".to_string(),
        };
        let composer = PromptComposer::from_definition(definition).unwrap();

        assert_eq!(
            composer.compose(["a", "b"]).unwrap(),
            Composition::Instruction("Context: a || b | Fallback: Nothing found.".to_string())
        );
        assert_eq!(
            composer.compose(Vec::<&str>::new()).unwrap(),
            Composition::NotFound("Nothing found.".to_string())
        );
    }

    #[test]
    fn test_unknown_variable_fails_to_render() {
        let definition = PromptDefinition {
            template: "{{context}} {{missing}}".to_string(),
            ..Default::default()
        };
        let composer = PromptComposer::from_definition(definition).unwrap();
        assert!(matches!(composer.compose(["x"]), Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_invalid_template_rejected() {
        let definition = PromptDefinition {
            template: "{{#if context}}unclosed".to_string(),
            ..Default::default()
        };
        assert!(PromptComposer::from_definition(definition).is_err());
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \t\n\n b"), "a b");
        assert_eq!(collapse_whitespace("\n lead"), " lead");
        assert_eq!(collapse_whitespace("plain"), "plain");
        assert_eq!(collapse_whitespace(""), "");
    }
}
