//! Declared local functions the model may ask for.
//!
//! The registry is fixed once the orchestrator is built. Dispatch never
//! fails the request: unknown names, bad arguments and handler errors all
//! become a JSON object with an `"error"` key, which is sent back to the
//! model so it can explain the problem in its own words.

use crate::error::LlmError;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use vocero_types::ToolDeclaration;

/// Name of the built-in tool that returns the institution's website.
pub const OFFICIAL_WEBSITE_TOOL: &str = "get_official_website";

const OFFICIAL_WEBSITE: &str = "www.escuelaing.edu.co";

/// A local handler: arguments in, serializable result (or error message) out.
///
/// Handlers must return promptly; the whole request waits on them.
pub type ToolHandler = Arc<dyn Fn(&Map<String, Value>) -> Result<Value, String> + Send + Sync>;

/// Ordered set of tool declarations, each bound to exactly one handler.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    declarations: Vec<ToolDeclaration>,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry used by the assistant: the official-website lookup.
    pub fn institutional() -> Self {
        let mut registry = Self::new();
        registry.insert(
            ToolDeclaration::new(
                OFFICIAL_WEBSITE_TOOL,
                "Proporciona el enlace al sitio web oficial de la Escuela Colombiana de \
                 Ingeniería Julio Garavito.",
            ),
            Arc::new(official_website),
        );
        registry
    }

    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::DuplicateTool`] if the name is already taken.
    pub fn register<F>(&mut self, declaration: ToolDeclaration, handler: F) -> Result<(), LlmError>
    where
        F: Fn(&Map<String, Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        if self.handlers.contains_key(&declaration.name) {
            return Err(LlmError::DuplicateTool(declaration.name));
        }
        self.insert(declaration, Arc::new(handler));
        Ok(())
    }

    fn insert(&mut self, declaration: ToolDeclaration, handler: ToolHandler) {
        self.handlers.insert(declaration.name.clone(), handler);
        self.declarations.push(declaration);
    }

    /// Declarations in registration order, as advertised to the model.
    pub fn declared_tools(&self) -> &[ToolDeclaration] {
        &self.declarations
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Runs the named tool and returns its result as JSON text.
    pub fn dispatch(&self, name: &str, args: &Map<String, Value>) -> String {
        let Some(handler) = self.handlers.get(name) else {
            tracing::warn!(tool = name, "model requested an unknown tool");
            return error_payload(format!("unknown tool {}", name));
        };
        let Some(declaration) = self.declarations.iter().find(|d| d.name == name) else {
            return error_payload(format!("unknown tool {}", name));
        };

        let args = match checked_arguments(declaration, args) {
            Ok(args) => args,
            Err(message) => {
                tracing::warn!(tool = name, "rejected tool arguments: {}", message);
                return error_payload(message);
            }
        };

        match handler(&args) {
            Ok(result) => {
                tracing::debug!(tool = name, "tool executed");
                result.to_string()
            }
            Err(message) => {
                tracing::warn!(tool = name, "tool failed: {}", message);
                error_payload(message)
            }
        }
    }
}

fn official_website(_args: &Map<String, Value>) -> Result<Value, String> {
    Ok(json!({
        "website": format!("El sitio web oficial es {}", OFFICIAL_WEBSITE)
    }))
}

/// Keeps declared arguments of the right type and drops undeclared ones.
fn checked_arguments(
    declaration: &ToolDeclaration,
    args: &Map<String, Value>,
) -> Result<Map<String, Value>, String> {
    let mut checked = Map::new();
    for (key, value) in args {
        match declaration.parameters.get(key) {
            Some(ty) if ty.matches(value) => {
                checked.insert(key.clone(), value.clone());
            }
            Some(ty) => {
                return Err(format!("invalid argument {}: expected {}", key, ty.as_str()));
            }
            None => {
                tracing::debug!(tool = %declaration.name, argument = %key, "dropping undeclared argument");
            }
        }
    }
    Ok(checked)
}

fn error_payload(message: String) -> String {
    json!({ "error": message }).to_string()
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.declarations.iter().map(|d| &d.name))
            .finish()
    }
}
