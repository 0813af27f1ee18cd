//! Error types for the Reverie protocol layer.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Encode-side and setup errors are raised synchronously at the call site.
//! Decode-side errors are *captured* into the decode session instead of
//! thrown, because a streaming session must keep consuming the rest of the
//! stream regardless of one bad tag.

use thiserror::Error;

/// The top-level error type for all Reverie operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Prompt template errors ---
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    // --- Decode errors ---
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    // --- Parser setup errors ---
    #[error("Parser setup error: {0}")]
    Setup(#[from] SetupError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A compiled prompt template did not line up with its projection.
///
/// Always a programming defect in the caller, never recoverable at
/// render time — the template and its projection are authored together.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error("no value provided for placeholder {{{{{name}}}}}")]
    MissingPlaceholder { name: String },
}

/// A recognized tag's buffered content could not be turned into its
/// declared shape. Scoped to a single tag occurrence; the decode session
/// records it and continues.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// The content was not even well-formed JSON.
    #[error("malformed payload in <{tag}>: {detail}")]
    Malformed { tag: String, detail: String },

    /// The content parsed, but did not match the declared shape.
    #[error("schema validation failed in <{tag}>: {detail}")]
    Validation { tag: String, detail: String },
}

impl DecodeError {
    /// The tag name this error is attributed to.
    pub fn tag(&self) -> &str {
        match self {
            Self::Malformed { tag, .. } | Self::Validation { tag, .. } => tag,
        }
    }
}

/// Parser misconfiguration, detected before any input is consumed.
#[derive(Debug, Clone, Error)]
pub enum SetupError {
    #[error("a parser needs at least one declared tag")]
    NoTagsDeclared,

    #[error("handler registered for undeclared tag <{tag}>")]
    UnknownTag { tag: String },

    #[error("duplicate handler for tag <{tag}>")]
    DuplicateHandler { tag: String },

    #[error("declared tag <{tag}> has no handler")]
    MissingHandler { tag: String },
}
