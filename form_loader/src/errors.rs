use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the loader crate.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors produced while loading schema files and resolving messages.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Reading a schema file failed.
    #[error("failed to read schema file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A YAML schema file is malformed.
    #[error("failed to parse schema file '{}': {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    /// A JSON schema file is malformed.
    #[error("failed to parse schema file '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An import could not be located.
    #[error(
        "import '{import}' not found relative to '{}' or in include directories",
        base.display()
    )]
    ImportNotFound { import: String, base: PathBuf },

    /// Two files or two definitions declare the same message.
    #[error("message '{0}' is defined more than once")]
    DuplicateMessage(String),

    /// A message declares two fields with the same name.
    #[error("message '{message}' declares field '{field}' more than once")]
    DuplicateField { message: String, field: String },

    /// A message-typed field has no `message` reference.
    #[error("field '{field}' of message '{message}' is a message field without a message reference")]
    MissingMessageRef { message: String, field: String },

    /// A non-message field carries a `message` reference.
    #[error("field '{field}' of message '{message}' is not a message field but references '{target}'")]
    UnexpectedMessageRef {
        message: String,
        field: String,
        target: String,
    },

    /// A message reference names no known message.
    #[error("field '{field}' of message '{message}' references unknown message '{target}'")]
    UnknownMessage {
        message: String,
        field: String,
        target: String,
    },

    /// A simple-name reference matches several messages.
    #[error("reference '{target}' is ambiguous: {}", candidates.join(", "))]
    AmbiguousReference {
        target: String,
        candidates: Vec<String>,
    },

    /// A message contains itself through its fields.
    #[error("message '{message}' contains itself: {}", cycle.join(" -> "))]
    RecursiveMessage { message: String, cycle: Vec<String> },

    /// A requested message is not part of the loaded schemas.
    #[error("message '{0}' not found")]
    NotFound(String),
}
