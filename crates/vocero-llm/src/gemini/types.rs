//! Gemini API request and response types

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use vocero_types::{ToolDeclaration, Turn};

// ============================================================================
// REQUEST TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns in wire form. Kept as raw JSON so replayed model
    /// turns reach the service byte-for-byte as they were received.
    pub contents: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

impl GenerateContentRequest {
    /// A request carrying only the given contents.
    pub fn from_contents(contents: Vec<Value>) -> Self {
        Self {
            contents,
            system_instruction: None,
            tools: Vec::new(),
        }
    }

    pub fn from_turns(turns: &[Turn], system_instruction: &str, tools: &[ToolDeclaration]) -> Self {
        let system_instruction = if system_instruction.trim().is_empty() {
            None
        } else {
            Some(SystemInstruction {
                parts: vec![TextPart {
                    text: system_instruction.to_string(),
                }],
            })
        };
        let tools = if tools.is_empty() {
            Vec::new()
        } else {
            vec![Tool {
                function_declarations: tools.iter().map(FunctionDeclaration::from).collect(),
            }]
        };
        Self {
            contents: turns.iter().map(turn_to_content).collect(),
            system_instruction,
            tools,
        }
    }
}

/// Wire form of one turn.
pub fn turn_to_content(turn: &Turn) -> Value {
    match turn {
        Turn::User { text } => json!({
            "role": turn.role().as_str(),
            "parts": [{ "text": text }]
        }),
        Turn::Model(prior) => prior.as_value().clone(),
        Turn::FunctionResult { name, response } => {
            // The service only accepts an object as function response.
            let response = match response {
                Value::Object(_) => response.clone(),
                other => json!({ "content": other }),
            };
            json!({
                "role": turn.role().as_str(),
                "parts": [{ "functionResponse": { "name": name, "response": response } }]
            })
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// Omitted for argument-less functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Schema>,
}

impl From<&ToolDeclaration> for FunctionDeclaration {
    fn from(decl: &ToolDeclaration) -> Self {
        let parameters = if decl.parameters.is_empty() {
            None
        } else {
            Some(Schema {
                kind: "OBJECT".to_string(),
                properties: decl
                    .parameters
                    .iter()
                    .map(|(name, ty)| {
                        (
                            name.clone(),
                            PropertySchema {
                                kind: ty.as_str().to_string(),
                            },
                        )
                    })
                    .collect(),
            })
        };
        Self {
            name: decl.name.clone(),
            description: decl.description.clone(),
            parameters,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: BTreeMap<String, PropertySchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Kept raw: this is what gets replayed as the model turn.
    pub content: Option<Value>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// Read-only view over the parts of a candidate's content.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentView {
    #[serde(default)]
    pub parts: Vec<PartView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartView {
    pub text: Option<String>,
    /// Set on reasoning summaries, which are not part of the answer.
    #[serde(default)]
    pub thought: bool,
    pub function_call: Option<FunctionCallView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCallView {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

// ============================================================================
// SHARED TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub status: Option<String>,
}
