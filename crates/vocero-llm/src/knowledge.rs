//! The grounding corpus handed to every generation call.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Substituted when the corpus file is missing or holds only whitespace.
pub const MISSING_CONTEXT_PLACEHOLDER: &str =
    "No se ha cargado información específica de la Escuela Colombiana de Ingeniería.";

/// Substituted when the corpus file exists but cannot be read.
pub const LOAD_ERROR_PLACEHOLDER: &str =
    "Error al cargar la información de la Escuela Colombiana de Ingeniería.";

/// Read-only grounding text, shared by all requests for the process lifetime.
///
/// Never empty: a failed load yields a placeholder sentence instead.
#[derive(Clone)]
pub struct KnowledgeContext {
    text: Arc<str>,
    placeholder: bool,
}

impl KnowledgeContext {
    /// Loads the corpus from `path`.
    ///
    /// Load failures are logged and replaced by a placeholder; start-up never
    /// stops because of the corpus.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => {
                tracing::warn!(path = %path.display(), "knowledge file is empty, using placeholder context");
                Self::placeholder(MISSING_CONTEXT_PLACEHOLDER)
            }
            Ok(contents) => {
                tracing::info!(path = %path.display(), bytes = contents.len(), "loaded knowledge context");
                Self {
                    text: Arc::from(contents),
                    placeholder: false,
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "knowledge file not found, using placeholder context");
                Self::placeholder(MISSING_CONTEXT_PLACEHOLDER)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), "failed to read knowledge file: {}", e);
                Self::placeholder(LOAD_ERROR_PLACEHOLDER)
            }
        }
    }

    /// Builds a context from in-memory text. Blank text yields the placeholder.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            return Self::placeholder(MISSING_CONTEXT_PLACEHOLDER);
        }
        Self {
            text: Arc::from(text),
            placeholder: false,
        }
    }

    fn placeholder(text: &str) -> Self {
        Self {
            text: Arc::from(text),
            placeholder: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns `true` if the real corpus could not be loaded.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

impl fmt::Debug for KnowledgeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeContext")
            .field("bytes", &self.text.len())
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.txt");
        std::fs::write(&path, "La escuela fue fundada en 1972.").unwrap();

        let ctx = KnowledgeContext::load(&path);
        assert!(!ctx.is_placeholder());
        assert_eq!(ctx.as_str(), "La escuela fue fundada en 1972.");
    }

    #[test]
    fn missing_file_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = KnowledgeContext::load(dir.path().join("absent.txt"));
        assert!(ctx.is_placeholder());
        assert_eq!(ctx.as_str(), MISSING_CONTEXT_PLACEHOLDER);
    }

    #[test]
    fn blank_file_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, "  \n\t").unwrap();

        let ctx = KnowledgeContext::load(&path);
        assert!(ctx.is_placeholder());
        assert!(!ctx.as_str().is_empty());
    }

    #[test]
    fn unreadable_path_yields_error_placeholder() {
        // A directory cannot be read as a string.
        let dir = tempfile::tempdir().unwrap();
        let ctx = KnowledgeContext::load(dir.path());
        assert!(ctx.is_placeholder());
        assert_eq!(ctx.as_str(), LOAD_ERROR_PLACEHOLDER);
    }

    #[test]
    fn clones_share_the_same_text() {
        let ctx = KnowledgeContext::from_text("corpus");
        let other = ctx.clone();
        assert!(std::ptr::eq(ctx.as_str(), other.as_str()));
    }
}
