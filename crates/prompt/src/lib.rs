//! Prompt system for docchat.
//!
//! This crate turns retrieved passages into the grounded system instruction
//! sent ahead of the conversation:
//! - Built-in Portuguese answer template
//! - YAML prompt definitions overriding template, not-found sentence and separator
//! - Handlebars template rendering

pub mod composer;
pub mod loader;
pub mod types;

// Re-export main types
pub use composer::{collapse_whitespace, PromptComposer};
pub use loader::{load_prompt, resolve_prompt};
pub use types::{Composition, PromptDefinition, DEFAULT_SEPARATOR, NOT_FOUND_ANSWER};
