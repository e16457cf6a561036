//! Talking-avatar video rendering with D-ID.
//!
//! A talk is created from the answer text, then its status is polled until
//! the video is ready, the job fails, or the attempt budget runs out:
//!
//! ```text
//! Created ─► Started ─► Done ─► download
//!    │          │
//!    └──────────┴──────► Failed | TimedOut
//! ```

use crate::artifact::{artifact_file_name, save_body};
use crate::config::AvatarConfig;
use crate::error::VoiceError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vocero_types::VoiceProfile;

/// Where a talk stands after a status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TalkState {
    Created,
    Started,
    Done { result_url: String },
    Failed { reason: String },
    TimedOut { attempts: u32 },
}

impl TalkState {
    /// Maps a status document onto a state. `done` without a result URL
    /// counts as a failure.
    pub fn from_status(status: &TalkStatus) -> Self {
        match status.status.as_str() {
            "created" => Self::Created,
            "started" => Self::Started,
            "done" => match status.result_url.as_deref() {
                Some(url) if !url.is_empty() => Self::Done {
                    result_url: url.to_string(),
                },
                _ => Self::Failed {
                    reason: "talk finished without result_url".to_string(),
                },
            },
            other => Self::Failed {
                reason: format!("unexpected talk status '{}'", other),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Created | Self::Started)
    }
}

/// Status document returned by `GET /talks/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TalkStatus {
    #[serde(default)]
    pub status: String,
    pub result_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedTalk {
    id: String,
}

/// Renders answers as avatar videos.
#[derive(Debug, Clone)]
pub struct AvatarService {
    client: reqwest::Client,
    config: AvatarConfig,
    voice: VoiceProfile,
    external_voice_key: Option<String>,
    poll_interval: Duration,
    output_dir: PathBuf,
}

impl AvatarService {
    pub fn new(
        config: AvatarConfig,
        voice: VoiceProfile,
        output_dir: impl AsRef<Path>,
    ) -> Result<Self, VoiceError> {
        if !config.is_configured() {
            return Err(VoiceError::Config("missing D-ID API key".to_string()));
        }
        if config.max_attempts == 0 {
            return Err(VoiceError::Config(
                "avatar max_attempts must be at least 1".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()?;
        Ok(Self {
            client,
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
            config,
            voice,
            external_voice_key: None,
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }

    /// ElevenLabs key forwarded to D-ID so the avatar speaks with the same voice.
    pub fn with_external_voice_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.external_voice_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorization(&self) -> String {
        format!("Basic {}", self.config.api_key)
    }

    fn talk_payload(&self, text: &str) -> Value {
        json!({
            "source_url": self.config.source_url,
            "script": {
                "type": "text",
                "provider": {
                    "type": "elevenlabs",
                    "voice_id": self.voice.voice_id,
                    "voice_config": {
                        "stability": self.voice.stability,
                        "similarity_boost": self.voice.similarity_boost,
                        "model_id": self.voice.model_id
                    }
                },
                "input": text,
                "ssml": "false"
            },
            "config": {
                "fluent": "false",
                "driver_expressions": {
                    "expressions": [
                        { "expression": "happy", "start_frame": 0, "intensity": 0.5 }
                    ]
                },
                "stitch": false,
                "result_format": "mp4"
            }
        })
    }

    /// Submits a talk and returns its id.
    pub async fn create_talk(&self, text: &str) -> Result<String, VoiceError> {
        let mut request = self
            .client
            .post(self.url("/talks"))
            .header("accept", "application/json")
            .header("Authorization", self.authorization())
            .json(&self.talk_payload(text));
        if let Some(key) = &self.external_voice_key {
            request = request.header("x-api-key-external", json!({ "elevenlabs": key }).to_string());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(VoiceError::from_response(response).await);
        }
        let created: CreatedTalk = response
            .json()
            .await
            .map_err(|e| VoiceError::Avatar(format!("invalid create response: {}", e)))?;
        tracing::debug!(talk_id = %created.id, "talk created");
        Ok(created.id)
    }

    /// Fetches the current state of a talk.
    pub async fn talk_state(&self, talk_id: &str) -> Result<TalkState, VoiceError> {
        let response = self
            .client
            .get(self.url(&format!("/talks/{}", talk_id)))
            .header("accept", "application/json")
            .header("Authorization", self.authorization())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VoiceError::from_response(response).await);
        }
        let status: TalkStatus = response
            .json()
            .await
            .map_err(|e| VoiceError::Avatar(format!("invalid status response: {}", e)))?;
        Ok(TalkState::from_status(&status))
    }

    /// Polls until the talk reaches a terminal state.
    ///
    /// At most `max_attempts` status checks are made, with `poll_interval`
    /// between them; running out yields [`TalkState::TimedOut`].
    pub async fn wait_for_talk(&self, talk_id: &str) -> Result<TalkState, VoiceError> {
        let attempts = self.config.max_attempts;
        for attempt in 1..=attempts {
            let state = self.talk_state(talk_id).await?;
            if state.is_terminal() {
                return Ok(state);
            }
            tracing::debug!(talk_id, attempt, ?state, "talk not ready");
            if attempt < attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        Ok(TalkState::TimedOut { attempts })
    }

    /// Renders `text` and returns the name of the written MP4 file.
    pub async fn render(&self, text: &str) -> Result<String, VoiceError> {
        let talk_id = self.create_talk(text).await?;
        let result_url = match self.wait_for_talk(&talk_id).await? {
            TalkState::Done { result_url } => result_url,
            TalkState::Failed { reason } => return Err(VoiceError::Avatar(reason)),
            TalkState::TimedOut { attempts } => {
                return Err(VoiceError::Avatar(format!(
                    "video not ready after {} attempts",
                    attempts
                )))
            }
            state => {
                return Err(VoiceError::Avatar(format!(
                    "talk left in non-terminal state {:?}",
                    state
                )))
            }
        };

        let response = self.client.get(&result_url).send().await?;
        if !response.status().is_success() {
            return Err(VoiceError::from_response(response).await);
        }
        let file_name = artifact_file_name("mp4");
        let bytes = save_body(response, &self.output_dir, &file_name).await?;
        tracing::info!(talk_id = %talk_id, file = %file_name, bytes, "avatar video saved");
        Ok(file_name)
    }
}
