//! Speech-to-text through Gemini's inline audio input.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use thiserror::Error;
use vocero_llm::gemini::parse_generation;
use vocero_llm::gemini::types::GenerateContentRequest;
use vocero_llm::{GeminiClient, LlmError};

/// Maximum audio input size for STT (10 MiB). Inline audio travels base64
/// encoded inside the request body.
pub const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

const TRANSCRIPTION_PROMPT: &str = "Por favor, transcribe el siguiente audio.";

/// Fallback when neither the file name nor the content type says anything.
/// Browser recorders default to WebM/Opus.
const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// Why an upload produced no transcript. `Display` is the Spanish message
/// that is read back to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("Error: El modelo de transcripción no está disponible.")]
    Unavailable,

    #[error("Error: El audio supera el tamaño máximo permitido ({size} bytes, límite {limit} bytes).")]
    TooLarge { size: usize, limit: usize },

    #[error("Transcripción bloqueada. Razón: {reason}. Revisa el contenido del audio.")]
    Blocked { reason: String },

    #[error("No se pudo obtener la transcripción del audio (respuesta inesperada o vacía).")]
    Empty,

    #[error("Error durante la transcripción: {0}")]
    Request(String),
}

impl TranscriptionError {
    /// Machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable => "transcription_unavailable",
            Self::TooLarge { .. } => "audio_too_large",
            Self::Blocked { .. } => "transcription_blocked",
            Self::Empty => "transcription_empty",
            Self::Request(_) => "transcription_failed",
        }
    }
}

impl From<LlmError> for TranscriptionError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured(_) => Self::Unavailable,
            other => Self::Request(other.to_string()),
        }
    }
}

/// Picks the MIME type sent along with the audio.
///
/// The file extension wins; then the declared content type unless it is the
/// generic `application/octet-stream`; then `audio/webm`.
pub fn resolve_audio_mime(file_name: Option<&str>, content_type: Option<&str>) -> String {
    let lower = file_name.unwrap_or_default().to_ascii_lowercase();
    let by_extension = [
        (".mp3", "audio/mpeg"),
        (".wav", "audio/wav"),
        (".webm", "audio/webm"),
        (".ogg", "audio/ogg"),
    ]
    .iter()
    .find(|(ext, _)| lower.ends_with(ext))
    .map(|(_, mime)| *mime);

    if let Some(mime) = by_extension {
        return mime.to_string();
    }
    match content_type.map(str::trim) {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct.to_string(),
        _ => DEFAULT_AUDIO_MIME.to_string(),
    }
}

/// Transcribes recorded questions.
#[derive(Debug, Clone)]
pub struct SttService {
    client: GeminiClient,
}

impl SttService {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    pub fn is_available(&self) -> bool {
        self.client.config().is_configured()
    }

    pub async fn transcribe(
        &self,
        audio_data: &[u8],
        mime_type: &str,
    ) -> Result<String, TranscriptionError> {
        if audio_data.len() > MAX_STT_INPUT_BYTES {
            return Err(TranscriptionError::TooLarge {
                size: audio_data.len(),
                limit: MAX_STT_INPUT_BYTES,
            });
        }
        if !self.is_available() {
            return Err(TranscriptionError::Unavailable);
        }

        tracing::debug!(bytes = audio_data.len(), mime_type, "transcribing audio");
        let body = GenerateContentRequest::from_contents(vec![json!({
            "role": "user",
            "parts": [
                { "text": TRANSCRIPTION_PROMPT },
                { "inlineData": { "mimeType": mime_type, "data": STANDARD.encode(audio_data) } }
            ]
        })]);

        let model = &self.client.config().transcription_model;
        let response = self.client.generate_content(model, &body).await?;
        let raw = parse_generation(response)?;

        match raw.text.map(|t| t.trim().to_string()) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => match raw.block_reason {
                Some(reason) => Err(TranscriptionError::Blocked { reason }),
                None => Err(TranscriptionError::Empty),
            },
        }
    }
}
