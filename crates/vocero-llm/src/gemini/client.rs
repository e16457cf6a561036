//! Gemini HTTP client

use super::types::{
    ApiError, ContentView, GenerateContentRequest, GenerateContentResponse,
};
use crate::client::{GenerationClient, GenerationRequest};
use crate::config::GeminiConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use vocero_types::{PriorTurn, RawGeneration, RequestedCall};

/// Finish reasons that mean the model stopped normally.
const NORMAL_FINISH_REASONS: &[&str] = &["STOP", "MAX_TOKENS", "FINISH_REASON_UNSPECIFIED"];

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Creates a client.
    ///
    /// A missing API key is not an error here; calls fail with
    /// [`LlmError::NotConfigured`] instead so the server can still start.
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Posts a `generateContent` request for `model`.
    pub async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        if !self.config.is_configured() {
            return Err(LlmError::NotConfigured("missing Gemini API key".to_string()));
        }

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| LlmError::Decode(e.to_string()));
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = match serde_json::from_str::<ApiError>(&error_text) {
            Ok(api_error) => api_error.error.message,
            Err(_) => error_text,
        };
        Err(LlmError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<RawGeneration, LlmError> {
        let body = GenerateContentRequest::from_turns(
            request.turns,
            request.system_instructions,
            request.tools,
        );
        tracing::debug!(
            model = %self.config.model,
            turns = body.contents.len(),
            "sending generateContent request"
        );
        let response = self.generate_content(&self.config.model, &body).await?;
        parse_generation(response)
    }
}

/// Extracts text, the first function call and any block reason.
///
/// The first candidate's content is kept verbatim as the model turn so a
/// follow-up call can replay it.
pub fn parse_generation(response: GenerateContentResponse) -> Result<RawGeneration, LlmError> {
    let prompt_block = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(RawGeneration {
            block_reason: prompt_block,
            ..Default::default()
        });
    };

    let finish_block = candidate
        .finish_reason
        .filter(|reason| !NORMAL_FINISH_REASONS.contains(&reason.as_str()));
    let block_reason = prompt_block.or(finish_block);

    let Some(content) = candidate.content else {
        return Ok(RawGeneration {
            block_reason,
            ..Default::default()
        });
    };

    let view: ContentView = serde_json::from_value(content.clone())
        .map_err(|e| LlmError::Decode(format!("unexpected candidate content: {}", e)))?;

    let text: String = view
        .parts
        .iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text.as_deref())
        .collect();

    let function_call = view
        .parts
        .into_iter()
        .find_map(|part| part.function_call)
        .map(|call| RequestedCall {
            name: call.name,
            args: call.args,
            model_turn: PriorTurn::new(content),
        });

    Ok(RawGeneration {
        text: (!text.is_empty()).then_some(text),
        function_call,
        block_reason,
    })
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .finish()
    }
}
