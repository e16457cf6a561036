//! Shared types for the Vocero voice assistant.
//!
//! This crate holds the vocabulary every other crate speaks: conversation
//! turns exchanged with the generation service, the tagged result of one
//! generation exchange, tool declarations advertised to the model, and the
//! voice settings shared by speech synthesis and the avatar renderer.
//!
//! Nothing here performs I/O. Keeping these definitions in one place lets
//! `vocero-llm` and `vocero-voice` evolve independently while the server
//! composes them.

pub mod conversation;
pub mod tool;
pub mod voice;

pub use conversation::{
    BlockReason, GenerationTurn, PriorTurn, RawGeneration, RequestedCall, Role, Turn,
};
pub use tool::{ParamType, ToolDeclaration};
pub use voice::VoiceProfile;
