//! Form Schema Type Definitions
//!
//! This crate contains the data structures describing message schemas for
//! form binding. `types` is the serializable definition model that schema
//! files are written in; `schema` is the resolved tree the binder walks.
//! Neither module performs file I/O.

pub mod schema;
pub mod types;

// Re-export commonly used types at the crate root
pub use schema::*;
pub use types::*;
