//! Schema File Loading and Message Resolution
//!
//! This crate loads form schema files from disk, resolves imports between
//! them, and turns their message definitions into shared `MessageSchema`
//! trees ready for binding.

pub mod errors;
pub mod file;
pub mod resolver;
pub mod schema_set;

// Re-export commonly used types at the crate root
pub use errors::{SchemaError, SchemaResult};
pub use file::{SchemaFile, SchemaFormat};
pub use resolver::ImportResolver;
pub use schema_set::{load_schemas, LoaderOptions, SchemaSet, DEFAULT_DYNAMIC_VALUE_TYPES};

// Re-export form_types for convenience
pub use form_types;
