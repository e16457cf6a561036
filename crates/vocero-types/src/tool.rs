//! Tool declarations advertised to the generation service.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Argument types a declared tool can accept.
///
/// Serialized in the upper-case spelling used by the generation service's
/// schema format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    /// Returns the schema spelling of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Array => "ARRAY",
            Self::Object => "OBJECT",
        }
    }

    /// Returns `true` if `value` is an instance of this type.
    ///
    /// Integers are accepted where a number is expected; a float is not
    /// accepted where an integer is expected.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// A function the model may ask the server to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Unique name within a registry.
    pub name: String,
    /// What the tool does, phrased for the model.
    pub description: String,
    /// Argument names mapped to their types. Empty for argument-less tools.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamType>,
}

impl ToolDeclaration {
    /// Declares a tool that takes no arguments.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Adds a typed argument to the declaration.
    pub fn with_param(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.parameters.insert(name.into(), ty);
        self
    }
}
