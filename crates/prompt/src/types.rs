//! Prompt types for docchat.

use serde::{Deserialize, Serialize};

/// Canonical answer when the document holds nothing relevant.
pub const NOT_FOUND_ANSWER: &str = "Não consta no documento.";

/// Separator placed between passages in the reference block.
pub const DEFAULT_SEPARATOR: &str = "\n---\n";

const DEFAULT_TEMPLATE: &str = "Você é um assistente útil e preciso.

INSTRUÇÕES:
1. Use as informações do texto abaixo para responder à pergunta do usuário.
2. Se a resposta NÃO estiver no texto, responda apenas: \"{{notFound}}\"

TEXTO DE REFERÊNCIA:
{{context}}";

/// A prompt definition, built in or loaded from YAML.
///
/// The template is rendered with two variables: `context` (the joined
/// passages) and `notFound` (the canonical not-found sentence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    #[serde(default)]
    pub title: String,

    /// Template string with Handlebars syntax
    pub template: String,

    /// Sentence returned verbatim when no passage is relevant
    #[serde(default = "default_not_found")]
    pub not_found: String,

    /// Text placed between passages
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_not_found() -> String {
    NOT_FOUND_ANSWER.to_string()
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl Default for PromptDefinition {
    fn default() -> Self {
        Self {
            id: "docchat.answer.default".to_string(),
            title: "Grounded document answer".to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            not_found: default_not_found(),
            separator: default_separator(),
        }
    }
}

/// Result of composing a prompt from retrieved passages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// No passages: answer directly with this sentence, skip the model.
    NotFound(String),

    /// System instruction to send ahead of the conversation.
    Instruction(String),
}

impl Composition {
    /// The text carried by either variant.
    pub fn text(&self) -> &str {
        match self {
            Composition::NotFound(text) | Composition::Instruction(text) => text,
        }
    }
}
