//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;
use vocero_llm::GeminiConfig;
use vocero_voice::{AvatarConfig, ElevenLabsConfig};

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Knowledge base and published directories.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Question answering and transcription.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Speech synthesis.
    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,

    /// Talking-avatar video. Off by default.
    #[serde(default)]
    pub avatar: AvatarConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body, multipart overhead included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "vocero_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// File system locations.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Plain-text knowledge base loaded once at start-up.
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: PathBuf,

    /// Directory for generated audio and video, published under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Built recorder front end, served at `/` when it exists.
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: PathBuf,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    12 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("informacion_eci.txt")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_frontend_dir() -> PathBuf {
    PathBuf::from("frontend/build")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            knowledge_path: default_knowledge_path(),
            static_dir: default_static_dir(),
            frontend_dir: default_frontend_dir(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `VOCERO_HOST` overrides `server.host`
/// - `VOCERO_PORT` overrides `server.port`
/// - `VOCERO_LOG_LEVEL` overrides `logging.level`
/// - `VOCERO_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `VOCERO_KNOWLEDGE_PATH`, `VOCERO_STATIC_DIR`, `VOCERO_FRONTEND_DIR`
///   override the `paths` entries
/// - `GEMINI_API_KEY`, `ELEVENLABS_API_KEY`, `D_ID_API_KEY` set the API keys
/// - `VOCERO_AVATAR_ENABLED` overrides `avatar.enabled`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// Applies overrides from `lookup`, normally the process environment.
pub fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(host) = lookup("VOCERO_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("VOCERO_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = lookup("VOCERO_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("VOCERO_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(path) = lookup("VOCERO_KNOWLEDGE_PATH") {
        config.paths.knowledge_path = PathBuf::from(path);
    }
    if let Some(dir) = lookup("VOCERO_STATIC_DIR") {
        config.paths.static_dir = PathBuf::from(dir);
    }
    if let Some(dir) = lookup("VOCERO_FRONTEND_DIR") {
        config.paths.frontend_dir = PathBuf::from(dir);
    }
    if let Some(key) = lookup("GEMINI_API_KEY") {
        config.gemini.api_key = key;
    }
    if let Some(key) = lookup("ELEVENLABS_API_KEY") {
        config.elevenlabs.api_key = key;
    }
    if let Some(key) = lookup("D_ID_API_KEY") {
        config.avatar.api_key = key;
    }
    if let Some(enabled) = lookup("VOCERO_AVATAR_ENABLED") {
        config.avatar.enabled = enabled == "true" || enabled == "1";
    }
    config
}
