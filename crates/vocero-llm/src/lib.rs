//! Grounded question answering for the Vocero assistant.
//!
//! A question is answered by a language model that may only use a fixed
//! knowledge base. The model can also ask for one of a small set of declared
//! local functions; when it does, the function runs here and its result is
//! sent back in a reconstructed conversation so the model can phrase the
//! final answer.
//!
//! ```text
//! question ─► Orchestrator::ask ─► classify ─┬─► DirectAnswer / Blocked
//!                                            └─► FunctionRequest
//!                                                   │
//!                          ToolRegistry::dispatch ◄─┘
//!                                   │
//!                 Orchestrator::resume ─► classify ─► DirectAnswer / Blocked
//! ```
//!
//! The orchestrator never returns an error: every failure ends up as a
//! [`GenerationTurn::Blocked`] carrying a machine-readable reason.

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod gemini;
pub mod knowledge;
pub mod orchestrator;
pub mod prompt;
pub mod tools;

pub use classify::classify;
pub use client::{GenerationClient, GenerationRequest};
pub use config::GeminiConfig;
pub use error::LlmError;
pub use gemini::GeminiClient;
pub use knowledge::KnowledgeContext;
pub use orchestrator::{
    ConversationOutcome, ConversationRequest, Orchestrator, OrchestratorConfig, ToolResult,
    DEFAULT_CALL_TIMEOUT,
};
pub use prompt::DEFAULT_SYSTEM_INSTRUCTIONS;
pub use tools::{ToolRegistry, OFFICIAL_WEBSITE_TOOL};

pub use vocero_types::{BlockReason, GenerationTurn, PriorTurn, RawGeneration, RequestedCall};
