//! Turns a raw generation result into a [`GenerationTurn`].

use vocero_types::{BlockReason, GenerationTurn, RawGeneration};

/// Classifies a raw result. First match wins:
///
/// 1. a function call, even when text is also present;
/// 2. non-blank text;
/// 3. a block reason given by the service;
/// 4. nothing at all.
///
/// The same procedure applies to both phases of a conversation.
pub fn classify(raw: RawGeneration) -> GenerationTurn {
    if let Some(call) = raw.function_call {
        return GenerationTurn::FunctionRequest {
            tool_name: call.name,
            arguments: call.args,
            prior_turn: call.model_turn,
        };
    }

    if let Some(text) = raw.text.filter(|t| !t.trim().is_empty()) {
        return GenerationTurn::DirectAnswer { text };
    }

    match raw.block_reason.filter(|r| !r.trim().is_empty()) {
        Some(reason) => GenerationTurn::blocked(BlockReason::Content(reason)),
        None => GenerationTurn::blocked(BlockReason::EmptyUnexplained),
    }
}
