use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("generation service not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode generation response: {0}")]
    Decode(String),

    #[error("generation call timed out after {0} ms")]
    Timeout(u128),

    #[error("duplicate tool declaration: {0}")]
    DuplicateTool(String),
}
