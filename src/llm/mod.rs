pub mod embeddings;
pub mod openai;
pub mod parser;
pub mod transcribe;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("OpenAI API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A chat model constrained to JSON output.
///
/// Implementations carry their model name and temperature; callers supply a
/// system prompt describing the expected JSON shape plus the user content,
/// and deserialize the returned value into their own schema.
pub trait ChatModel {
    fn complete_json(&self, system: &str, user: &str) -> Result<serde_json::Value, LlmError>;
}

/// Allow `Box<dyn ChatModel>` where `&impl ChatModel` is expected.
impl ChatModel for Box<dyn ChatModel> {
    fn complete_json(&self, system: &str, user: &str) -> Result<serde_json::Value, LlmError> {
        (**self).complete_json(system, user)
    }
}
