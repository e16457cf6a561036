//! Conversation turns and generation results.
//!
//! The generation service is stateless: a follow-up call only makes sense if
//! the caller resends every earlier turn. [`PriorTurn`] is the handle that
//! carries the model's own turn from the first call into the second one
//! without any interpretation in between.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Role tag attached to every turn sent to the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (or the prompt built on their behalf).
    User,
    /// The language model.
    Model,
    /// A local function result fed back to the model.
    Function,
}

impl Role {
    /// Returns the wire spelling of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
            Self::Function => "function",
        }
    }
}

/// The model's content object from a previous call, kept verbatim.
///
/// The inner value is exactly what the generation service returned. It may
/// hold framing beyond the function call itself (signatures, extra parts), so
/// it is only ever replayed, never rebuilt.
#[derive(Clone, PartialEq)]
pub struct PriorTurn(Value);

impl PriorTurn {
    /// Wraps a model content object as returned by the generation service.
    pub fn new(content: Value) -> Self {
        Self(content)
    }

    /// Borrows the content for replay.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the handle, yielding the content for replay.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl fmt::Debug for PriorTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The content embeds the full model reply; keep logs short.
        f.debug_tuple("PriorTurn").field(&"..").finish()
    }
}

/// One role-tagged unit of conversation content.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    /// Free text from the user side.
    User { text: String },
    /// A model turn replayed from an earlier call.
    Model(PriorTurn),
    /// The result of executing a function the model asked for.
    FunctionResult { name: String, response: Value },
}

impl Turn {
    pub fn role(&self) -> Role {
        match self {
            Self::User { .. } => Role::User,
            Self::Model(_) => Role::Model,
            Self::FunctionResult { .. } => Role::Function,
        }
    }
}

/// A function call requested by the model, together with the turn carrying it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedCall {
    pub name: String,
    pub args: Map<String, Value>,
    /// The model turn that contained the call. Required for the follow-up call.
    pub model_turn: PriorTurn,
}

/// What a generation client hands back before classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGeneration {
    /// Generated text, if any part carried text.
    pub text: Option<String>,
    /// The first function call found in the reply.
    pub function_call: Option<RequestedCall>,
    /// Safety or policy reason given by the service when it produced nothing.
    pub block_reason: Option<String>,
}

/// Why an exchange produced no usable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Transport failure, timeout, or an unparseable upstream reply.
    TechnicalError,
    /// The tool result handed to the follow-up call was not valid JSON.
    InvalidToolResult,
    /// The service returned nothing and gave no reason.
    EmptyUnexplained,
    /// The follow-up call asked for yet another function.
    ToolLoop,
    /// Upstream safety or policy block, reason kept verbatim.
    Content(String),
}

impl BlockReason {
    /// Machine-readable reason code.
    pub fn code(&self) -> &str {
        match self {
            Self::TechnicalError => "technical_error",
            Self::InvalidToolResult => "invalid_tool_result",
            Self::EmptyUnexplained => "empty_unexplained",
            Self::ToolLoop => "tool_loop",
            Self::Content(reason) => reason,
        }
    }

    /// Message suitable for reading back to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::TechnicalError => {
                "Lo siento, ocurrió un error técnico al procesar tu pregunta.".to_string()
            }
            Self::InvalidToolResult => {
                "Error interno: el resultado de la función no era un JSON válido.".to_string()
            }
            Self::EmptyUnexplained => "Lo siento, no pude generar una respuesta basada en la \
                 información proporcionada (respuesta vacía o bloqueada sin detalle)."
                .to_string(),
            Self::ToolLoop => "Lo siento, no pude formular una respuesta final después de \
                 ejecutar la acción solicitada."
                .to_string(),
            Self::Content(reason) => format!(
                "No se pudo generar una respuesta. Razón: {reason}. Por favor, reformula tu \
                 pregunta o revisa el contenido."
            ),
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The classified outcome of one exchange with the generation service.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationTurn {
    DirectAnswer {
        text: String,
    },
    FunctionRequest {
        tool_name: String,
        arguments: Map<String, Value>,
        prior_turn: PriorTurn,
    },
    Blocked {
        reason: BlockReason,
    },
}

impl GenerationTurn {
    /// Shorthand for a blocked turn.
    pub fn blocked(reason: BlockReason) -> Self {
        Self::Blocked { reason }
    }

    /// Variant name, for logs and assertions that ignore payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DirectAnswer { .. } => "direct_answer",
            Self::FunctionRequest { .. } => "function_request",
            Self::Blocked { .. } => "blocked",
        }
    }
}
