//! Gemini `generateContent` over HTTP.

mod client;
pub mod types;

pub use client::{parse_generation, GeminiClient};
