//! Vocero server library logic.

pub mod api;
pub mod api_audio;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use vocero_llm::{
    GeminiClient, KnowledgeContext, LlmError, Orchestrator, OrchestratorConfig,
};
use vocero_voice::{AvatarService, SttService, TtsService, VoiceError};

/// Application state shared across all request handlers.
#[derive(Debug)]
pub struct AppState {
    /// Grounded question answering.
    pub orchestrator: Arc<Orchestrator>,
    /// Transcription of uploaded questions.
    pub stt: SttService,
    /// Speech synthesis of answers.
    pub tts: TtsService,
    /// Avatar video rendering, when enabled.
    pub avatar: Option<AvatarService>,
    /// Directory of generated artifacts, served under `/static`.
    pub static_dir: PathBuf,
    /// Recorder front end, served at `/` when present.
    pub frontend_dir: PathBuf,
    /// Request body ceiling for uploads.
    pub max_upload_bytes: usize,
}

/// Errors that prevent the services from being built.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("generation client: {0}")]
    Llm(#[from] LlmError),
    #[error("voice service: {0}")]
    Voice(#[from] VoiceError),
}

impl AppState {
    /// Builds every service from configuration.
    ///
    /// Missing API keys do not stop the server: the affected stage reports
    /// its failure per request instead. The avatar is only built when
    /// enabled and keyed.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let knowledge = KnowledgeContext::load(&config.paths.knowledge_path);
        if !config.gemini.is_configured() {
            tracing::warn!("GEMINI_API_KEY is not set; questions cannot be transcribed or answered");
        }

        let gemini = GeminiClient::new(config.gemini.clone())?;
        let orchestrator = Orchestrator::new(
            OrchestratorConfig::new(knowledge, Arc::new(gemini.clone()))
                .with_call_timeout(Duration::from_secs(config.gemini.timeout_seconds.max(1))),
        );

        let tts = TtsService::new(config.elevenlabs.clone(), &config.paths.static_dir)?;
        if !config.elevenlabs.is_configured() {
            tracing::warn!("ELEVENLABS_API_KEY is not set; answers will not be spoken");
        }

        let avatar = match (config.avatar.enabled, config.avatar.is_configured()) {
            (true, true) => Some(
                AvatarService::new(
                    config.avatar.clone(),
                    config.elevenlabs.voice.clone(),
                    &config.paths.static_dir,
                )?
                .with_external_voice_key(config.elevenlabs.api_key.clone()),
            ),
            (true, false) => {
                tracing::warn!("avatar enabled but D_ID_API_KEY is not set; avatar disabled");
                None
            }
            (false, _) => None,
        };

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            stt: SttService::new(gemini),
            tts,
            avatar,
            static_dir: config.paths.static_dir.clone(),
            frontend_dir: config.paths.frontend_dir.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    if let Err(e) = std::fs::create_dir_all(&state.static_dir) {
        tracing::warn!(path = %state.static_dir.display(), "failed to create static directory: {}", e);
    }

    let router = Router::new()
        .route("/health", get(api::health_handler))
        .route("/audio", post(api_audio::audio_handler))
        .nest_service("/static", ServeDir::new(&state.static_dir));

    // Serve the recorder front end if it has been built.
    let frontend_dir = &state.frontend_dir;
    let router = if frontend_dir.join("index.html").exists() {
        tracing::info!(path = %frontend_dir.display(), "serving front end");
        let index = frontend_dir.join("index.html");
        router.fallback_service(ServeDir::new(frontend_dir).fallback(ServeFile::new(index)))
    } else {
        tracing::info!(path = %frontend_dir.display(), "front end not built, skipping");
        router
    };

    let body_limit = state.max_upload_bytes;
    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
