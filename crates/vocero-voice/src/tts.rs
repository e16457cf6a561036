use crate::artifact::{artifact_file_name, save_body};
use crate::config::ElevenLabsConfig;
use crate::error::VoiceError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vocero_types::VoiceProfile;

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
pub const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

/// Renders answers to MP3 files with ElevenLabs.
#[derive(Debug, Clone)]
pub struct TtsService {
    client: reqwest::Client,
    config: ElevenLabsConfig,
    output_dir: PathBuf,
}

impl TtsService {
    /// Creates a service writing its files into `output_dir`.
    pub fn new(config: ElevenLabsConfig, output_dir: impl AsRef<Path>) -> Result<Self, VoiceError> {
        if !config.voice.is_valid() {
            return Err(VoiceError::Config(
                "stability and similarity_boost must be between 0.0 and 1.0".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()?;
        Ok(Self {
            client,
            config,
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }

    pub fn voice(&self) -> &VoiceProfile {
        &self.config.voice
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Synthesizes `text` and returns the name of the written MP3 file,
    /// relative to the output directory.
    pub async fn synthesize(&self, text: &str) -> Result<String, VoiceError> {
        if text.trim().is_empty() {
            return Err(VoiceError::Tts("text is empty".to_string()));
        }
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Tts(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }
        if !self.config.is_configured() {
            return Err(VoiceError::Config("missing ElevenLabs API key".to_string()));
        }

        let voice = &self.config.voice;
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice.voice_id
        );
        let body = SynthesisRequest {
            text,
            model_id: &voice.model_id,
            voice_settings: VoiceSettings {
                stability: voice.stability,
                similarity_boost: voice.similarity_boost,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VoiceError::from_response(response).await);
        }

        let file_name = artifact_file_name("mp3");
        let bytes = save_body(response, &self.output_dir, &file_name).await?;
        tracing::info!(file = %file_name, bytes, "speech synthesized");
        Ok(file_name)
    }
}
