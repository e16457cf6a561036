//! The seam between the orchestrator and a concrete generation service.

use crate::error::LlmError;
use async_trait::async_trait;
use vocero_types::{RawGeneration, ToolDeclaration, Turn};

/// Everything a generation service needs for one call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Conversation so far, oldest first.
    pub turns: &'a [Turn],
    /// Standing instructions for the model.
    pub system_instructions: &'a str,
    /// Functions the model may ask for.
    pub tools: &'a [ToolDeclaration],
}

/// A language-generation backend with tool calling.
///
/// Implementations must be stateless across calls: anything the model should
/// remember has to be in `request.turns`.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<RawGeneration, LlmError>;
}
