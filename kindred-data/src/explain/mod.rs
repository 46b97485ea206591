//! Explanation sentences from an OpenAI-compatible chat completions API.

mod generator;
mod prompt;

pub use generator::{DEFAULT_MODEL, HttpExplanationGenerator, HttpExplanationGeneratorConfig};
pub use prompt::render_prompt;
