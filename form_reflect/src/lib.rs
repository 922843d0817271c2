/* Form Binding Library
 *
 * This library binds flat, multi-valued form parameters (decoded URL query
 * strings or form bodies) into nested records, guided by a message schema.
 * Message schemas are flattened into dotted paths once, cached, and reused
 * for every bind against the same schema.
 */

pub mod binder;
pub mod cache;
pub mod decode;
pub mod errors;
pub mod flatten;
pub mod params;
pub mod record;

pub use binder::{BinderConfig, FormBinder};
pub use cache::{PathCache, PathTable};
pub use decode::{decode, decode_dynamic, decode_field, decode_scalar, Decoded};
pub use errors::{DecodeError, DecodeResult};
pub use flatten::{flatten, PathSummary, QueryPath};
pub use params::ParamMap;
pub use record::{FieldValue, Record, ScalarValue};
