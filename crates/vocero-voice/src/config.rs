use serde::{Deserialize, Serialize};
use std::fmt;
use vocero_types::VoiceProfile;

fn default_elevenlabs_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_did_url() -> String {
    "https://api.d-id.com".to_string()
}

fn default_source_url() -> String {
    "https://i.postimg.cc/CKFnRbJ8/Chat-GPT-Image-May-8-2025-11-30-44-PM.png".to_string()
}

fn default_tts_timeout_seconds() -> u64 {
    60
}

fn default_avatar_timeout_seconds() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    10
}

fn default_poll_interval_seconds() -> u64 {
    5
}

/// ElevenLabs speech synthesis settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_elevenlabs_url")]
    pub base_url: String,
    #[serde(default)]
    pub voice: VoiceProfile,
    /// Upper bound for one synthesis request. Default: 60 seconds.
    #[serde(default = "default_tts_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_elevenlabs_url(),
            voice: VoiceProfile::default(),
            timeout_seconds: default_tts_timeout_seconds(),
        }
    }
}

impl fmt::Debug for ElevenLabsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevenLabsConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("voice", &self.voice)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ElevenLabsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// D-ID talking-avatar settings. Disabled unless turned on explicitly.
#[derive(Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Sent as `Authorization: Basic <api_key>`; D-ID hands out the key
    /// already encoded.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_did_url")]
    pub base_url: String,
    /// Portrait the avatar is animated from.
    #[serde(default = "default_source_url")]
    pub source_url: String,
    /// Status checks before giving up on a talk. Default: 10.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Pause between status checks. Default: 5 seconds.
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_avatar_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            base_url: default_did_url(),
            source_url: default_source_url(),
            max_attempts: default_max_attempts(),
            poll_interval_seconds: default_poll_interval_seconds(),
            timeout_seconds: default_avatar_timeout_seconds(),
        }
    }
}

impl fmt::Debug for AvatarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvatarConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("source_url", &self.source_url)
            .field("max_attempts", &self.max_attempts)
            .field("poll_interval_seconds", &self.poll_interval_seconds)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl AvatarConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            enabled: true,
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
