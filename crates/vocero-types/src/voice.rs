//! Voice settings shared by speech synthesis and the avatar renderer.
//!
//! Both the audio reply and the avatar video speak with the same hosted
//! voice, so the settings live here rather than in either service.

use serde::{Deserialize, Serialize};

fn default_voice_id() -> String {
    "x5IDPSl4ZUbhosMmVFTk".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_stability() -> f32 {
    0.55
}

fn default_similarity_boost() -> f32 {
    0.55
}

/// A hosted voice and its rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Identifier of the voice at the speech provider.
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    /// Synthesis model used for the voice.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Voice stability (0.0 to 1.0).
    #[serde(default = "default_stability")]
    pub stability: f32,
    /// How closely synthesis tracks the original voice (0.0 to 1.0).
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            voice_id: default_voice_id(),
            model_id: default_model_id(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
        }
    }
}

impl VoiceProfile {
    /// Returns `true` if both tuning parameters are within `0.0..=1.0`.
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.stability) && (0.0..=1.0).contains(&self.similarity_boost)
    }
}
