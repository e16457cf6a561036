//! The voice question pipeline behind `POST /audio`.
//!
//! upload → transcription → grounded answer (with at most one tool call)
//! → speech, and optionally an avatar video. Only a malformed upload fails
//! the request; every later failure is reported inside the response body.

use crate::{api::ApiError, AppState};
use axum::{
    extract::{multipart::MultipartError, Extension, Multipart},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use vocero_voice::resolve_audio_mime;

/// Multipart field carrying the recording.
pub const AUDIO_FIELD: &str = "audio";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioResult {
    Ok,
    Error,
}

/// Response body for `POST /audio`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioResponse {
    pub result: AudioResult,
    /// The answer, or the message explaining why there is none.
    pub text: String,
    /// Synthesized speech, relative to `/static`.
    pub file: Option<String>,
    /// Avatar video, relative to `/static`.
    pub video: Option<String>,
    /// Machine-readable reason when `result` is `error`.
    pub reason: Option<String>,
}

/// The uploaded recording.
#[derive(Debug)]
struct AudioUpload {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("multipart error: {}", e))
    }
}

/// Reads the `audio` field, skipping any other field.
async fn read_audio_field(multipart: &mut Multipart) -> Result<AudioUpload, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(AudioUpload {
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }
    Err(ApiError::BadRequest(format!(
        "no '{}' field provided",
        AUDIO_FIELD
    )))
}

/// Handler for `POST /audio`.
pub async fn audio_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AudioResponse>, ApiError> {
    let upload = read_audio_field(&mut multipart).await?;
    let request_id = Uuid::new_v4();
    let mime_type = resolve_audio_mime(upload.file_name.as_deref(), upload.content_type.as_deref());
    tracing::info!(
        %request_id,
        bytes = upload.data.len(),
        mime_type = %mime_type,
        "received audio question"
    );

    let (result, text, reason) = match state.stt.transcribe(&upload.data, &mime_type).await {
        Err(e) => {
            tracing::warn!(%request_id, reason = e.code(), "transcription failed: {}", e);
            (AudioResult::Error, e.to_string(), Some(e.code().to_string()))
        }
        Ok(question) => {
            tracing::info!(%request_id, question = %question, "transcribed question");
            let outcome = state.orchestrator.answer(&question).await;
            match outcome.block_reason() {
                Some(reason) => {
                    tracing::warn!(%request_id, reason = %reason, "no answer produced");
                    (
                        AudioResult::Error,
                        outcome.text(),
                        Some(reason.code().to_string()),
                    )
                }
                None => (AudioResult::Ok, outcome.text(), None),
            }
        }
    };

    let (file, video) = tokio::join!(speak(&state, &text), render_avatar(&state, &text));

    Ok(Json(AudioResponse {
        result,
        text,
        file,
        video,
        reason,
    }))
}

async fn speak(state: &AppState, text: &str) -> Option<String> {
    match state.tts.synthesize(text).await {
        Ok(file) => Some(file),
        Err(e) => {
            tracing::error!("speech synthesis failed: {}", e);
            None
        }
    }
}

async fn render_avatar(state: &AppState, text: &str) -> Option<String> {
    let avatar = state.avatar.as_ref()?;
    match avatar.render(text).await {
        Ok(file) => Some(file),
        Err(e) => {
            tracing::error!("avatar rendering failed: {}", e);
            None
        }
    }
}
