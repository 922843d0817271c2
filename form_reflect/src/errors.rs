use form_types::FieldKind;
use thiserror::Error;

/// Result alias used across the binding crate.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that abort a bind.
///
/// A bind surfaces at most one of these; no partially bound record is
/// returned alongside it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A raw token could not be parsed as the declared field kind.
    #[error("malformed {kind} value {token:?} for '{path}': {reason}")]
    MalformedScalar {
        path: String,
        token: String,
        kind: FieldKind,
        reason: String,
    },

    /// A path disagrees with the schema or record it is applied to.
    #[error("schema inconsistency at '{path}': {reason}")]
    SchemaInconsistency { path: String, reason: String },
}

impl DecodeError {
    pub(crate) fn malformed(
        path: &str,
        kind: FieldKind,
        token: &str,
        reason: impl ToString,
    ) -> Self {
        DecodeError::MalformedScalar {
            path: path.to_string(),
            token: token.to_string(),
            kind,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn inconsistency(path: &str, reason: impl Into<String>) -> Self {
        DecodeError::SchemaInconsistency {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Dotted path the error refers to.
    pub fn path(&self) -> &str {
        match self {
            DecodeError::MalformedScalar { path, .. } => path,
            DecodeError::SchemaInconsistency { path, .. } => path,
        }
    }

    /// Offending raw token, if the error came from a token.
    pub fn token(&self) -> Option<&str> {
        match self {
            DecodeError::MalformedScalar { token, .. } => Some(token),
            DecodeError::SchemaInconsistency { .. } => None,
        }
    }
}
