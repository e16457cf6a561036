//! The two-phase tool-calling conversation.
//!
//! Phase one sends the grounded question and gets either an answer or a
//! function-call request. Phase two, only when a function was requested,
//! replays the question, the model's own turn and the function result, and
//! gets the final answer. The service keeps no memory between the calls, so
//! the model turn from phase one is carried over untouched.

use crate::classify::classify;
use crate::client::{GenerationClient, GenerationRequest};
use crate::error::LlmError;
use crate::knowledge::KnowledgeContext;
use crate::prompt::{grounded_prompt, DEFAULT_SYSTEM_INSTRUCTIONS};
use crate::tools::ToolRegistry;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use vocero_types::{BlockReason, GenerationTurn, PriorTurn, ToolDeclaration, Turn};

/// Upper bound for a single generation call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the orchestrator is built from.
pub struct OrchestratorConfig {
    pub grounding_context: KnowledgeContext,
    pub tools: ToolRegistry,
    pub system_instructions: String,
    pub generation_client: Arc<dyn GenerationClient>,
    pub call_timeout: Duration,
}

impl OrchestratorConfig {
    /// Configuration with the institutional tool set, the default
    /// instructions and the default timeout.
    pub fn new(
        grounding_context: KnowledgeContext,
        generation_client: Arc<dyn GenerationClient>,
    ) -> Self {
        Self {
            grounding_context,
            tools: ToolRegistry::institutional(),
            system_instructions: DEFAULT_SYSTEM_INSTRUCTIONS.to_string(),
            generation_client,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_system_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.system_instructions = instructions.into();
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// A function result ready to be fed back to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_name: String,
    pub payload: Value,
}

/// The input of one call to the generation service.
///
/// Built per phase and consumed by [`ConversationRequest::into_turns`].
#[derive(Debug)]
pub struct ConversationRequest<'a> {
    pub original_question: &'a str,
    pub knowledge_context: &'a KnowledgeContext,
    pub prior_turn: Option<PriorTurn>,
    pub tool_result: Option<ToolResult>,
}

impl<'a> ConversationRequest<'a> {
    /// Phase one: the grounded question alone.
    pub fn question(original_question: &'a str, knowledge_context: &'a KnowledgeContext) -> Self {
        Self {
            original_question,
            knowledge_context,
            prior_turn: None,
            tool_result: None,
        }
    }

    /// Phase two: the question, the model's function-call turn and the result.
    pub fn follow_up(
        original_question: &'a str,
        knowledge_context: &'a KnowledgeContext,
        prior_turn: PriorTurn,
        tool_result: ToolResult,
    ) -> Self {
        Self {
            original_question,
            knowledge_context,
            prior_turn: Some(prior_turn),
            tool_result: Some(tool_result),
        }
    }

    /// Lays the request out as role-tagged turns, oldest first.
    pub fn into_turns(self, tools: &[ToolDeclaration]) -> Vec<Turn> {
        let mut turns = vec![Turn::User {
            text: grounded_prompt(self.knowledge_context, self.original_question, tools),
        }];
        if let Some(prior) = self.prior_turn {
            turns.push(Turn::Model(prior));
        }
        if let Some(result) = self.tool_result {
            turns.push(Turn::FunctionResult {
                name: result.tool_name,
                response: result.payload,
            });
        }
        turns
    }
}

/// Final result of [`Orchestrator::answer`]. Never a function request.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationOutcome {
    pub turn: GenerationTurn,
    /// The tool executed between the two phases, if any.
    pub tool_invoked: Option<String>,
}

impl ConversationOutcome {
    /// Text to show or speak: the answer, or the message for the block.
    pub fn text(&self) -> String {
        match &self.turn {
            GenerationTurn::DirectAnswer { text } => text.clone(),
            GenerationTurn::Blocked { reason } => reason.user_message(),
            GenerationTurn::FunctionRequest { .. } => BlockReason::ToolLoop.user_message(),
        }
    }

    pub fn block_reason(&self) -> Option<&BlockReason> {
        match &self.turn {
            GenerationTurn::Blocked { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self.turn, GenerationTurn::DirectAnswer { .. })
    }
}

/// Drives grounded question answering with at most one tool call.
pub struct Orchestrator {
    context: KnowledgeContext,
    tools: ToolRegistry,
    system_instructions: String,
    client: Arc<dyn GenerationClient>,
    call_timeout: Duration,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            context: config.grounding_context,
            tools: config.tools,
            system_instructions: config.system_instructions,
            client: config.generation_client,
            call_timeout: config.call_timeout,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeContext {
        &self.context
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Phase one: asks the grounded question.
    ///
    /// Exactly one outbound call. Failures come back as
    /// [`BlockReason::TechnicalError`].
    pub async fn ask(&self, question: &str) -> GenerationTurn {
        tracing::info!(question_len = question.len(), "asking grounded question");
        let request = ConversationRequest::question(question, &self.context);
        self.submit(request, "ask").await
    }

    /// Phase two: feeds a function result back and asks for the final answer.
    ///
    /// `prior_turn` must be the handle returned by the [`Orchestrator::ask`]
    /// call being resumed. A `tool_result_json` that is not valid JSON yields
    /// [`BlockReason::InvalidToolResult`] without any outbound call.
    pub async fn resume(
        &self,
        original_question: &str,
        prior_turn: PriorTurn,
        tool_name: &str,
        tool_result_json: &str,
    ) -> GenerationTurn {
        let payload: Value = match serde_json::from_str(tool_result_json) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(tool = tool_name, "tool result is not valid JSON: {}", e);
                return GenerationTurn::blocked(BlockReason::InvalidToolResult);
            }
        };

        tracing::info!(tool = tool_name, "resuming conversation with tool result");
        let request = ConversationRequest::follow_up(
            original_question,
            &self.context,
            prior_turn,
            ToolResult {
                tool_name: tool_name.to_string(),
                payload,
            },
        );
        self.submit(request, "resume").await
    }

    /// Executes a requested tool through the registry.
    pub fn dispatch(&self, tool_name: &str, args: &Map<String, Value>) -> String {
        self.tools.dispatch(tool_name, args)
    }

    /// Runs the whole conversation: ask, then dispatch and resume if needed.
    ///
    /// A second function request in phase two is not executed; it ends the
    /// conversation as [`BlockReason::ToolLoop`].
    pub async fn answer(&self, question: &str) -> ConversationOutcome {
        let (tool_name, arguments, prior_turn) = match self.ask(question).await {
            GenerationTurn::FunctionRequest {
                tool_name,
                arguments,
                prior_turn,
            } => (tool_name, arguments, prior_turn),
            turn => {
                return ConversationOutcome {
                    turn,
                    tool_invoked: None,
                }
            }
        };

        tracing::info!(tool = %tool_name, "model requested a tool");
        let result = self.dispatch(&tool_name, &arguments);
        let turn = match self.resume(question, prior_turn, &tool_name, &result).await {
            GenerationTurn::FunctionRequest {
                tool_name: again, ..
            } => {
                tracing::warn!(
                    first = %tool_name,
                    second = %again,
                    "model requested another tool after a tool result"
                );
                GenerationTurn::blocked(BlockReason::ToolLoop)
            }
            turn => turn,
        };

        ConversationOutcome {
            turn,
            tool_invoked: Some(tool_name),
        }
    }

    async fn submit(&self, request: ConversationRequest<'_>, phase: &'static str) -> GenerationTurn {
        let tools = self.tools.declared_tools();
        let turns = request.into_turns(tools);
        let generation = GenerationRequest {
            turns: &turns,
            system_instructions: &self.system_instructions,
            tools,
        };

        let result = match tokio::time::timeout(self.call_timeout, self.client.generate(generation))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.call_timeout.as_millis())),
        };

        match result {
            Ok(raw) => {
                let turn = classify(raw);
                tracing::info!(phase, kind = turn.kind(), "generation classified");
                turn
            }
            Err(e) => {
                tracing::error!(phase, "generation call failed: {}", e);
                GenerationTurn::blocked(BlockReason::TechnicalError)
            }
        }
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("context", &self.context)
            .field("tools", &self.tools)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
