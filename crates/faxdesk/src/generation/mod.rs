//! Text generation collaborator.
//!
//! The categorization engine and the summarizer only see the
//! [`TextGenerator`] trait; [`OllamaGenerator`] talks to a local Ollama
//! server and [`DisabledGenerator`] stands in when generation is off.

mod ollama;

pub use ollama::OllamaGenerator;

use crate::error::GenerationError;

/// Produces text for a prompt, bounded to `max_tokens` output tokens.
///
/// Calls are synchronous; no retry or streaming happens at this layer.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError>;
}

/// Generator used when text generation is turned off in the config.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

impl TextGenerator for DisabledGenerator {
    fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled)
    }
}
