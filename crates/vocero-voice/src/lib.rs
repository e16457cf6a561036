//! Voice services for the Vocero assistant.
//!
//! Questions arrive as recorded audio and answers leave as speech, and
//! optionally as a talking-avatar video:
//!
//! - [`SttService`] transcribes uploads with Gemini's audio input;
//! - [`TtsService`] synthesizes the answer with ElevenLabs;
//! - [`AvatarService`] renders the answer as a D-ID talk.
//!
//! Generated files are written into a directory that the HTTP server
//! publishes, each under a fresh `response-<uuid>` name.

mod artifact;
pub mod avatar;
pub mod config;
pub mod error;
pub mod stt;
pub mod tts;

pub use artifact::artifact_file_name;
pub use avatar::{AvatarService, TalkState, TalkStatus};
pub use config::{AvatarConfig, ElevenLabsConfig};
pub use error::VoiceError;
pub use stt::{resolve_audio_mime, SttService, TranscriptionError, MAX_STT_INPUT_BYTES};
pub use tts::{TtsService, MAX_TTS_INPUT_BYTES};
pub use vocero_types::VoiceProfile;
