/* High-level binding API */

use crate::cache::{PathCache, PathTable};
use crate::decode::{decode_field, Decoded};
use crate::errors::{DecodeError, DecodeResult};
use crate::flatten::QueryPath;
use crate::params::ParamMap;
use crate::record::{FieldValue, Record};
use form_types::{FieldKind, MessageSchema};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, trace};

/* Configuration toggles for the binder */
#[derive(Clone, Debug, Default)]
pub struct BinderConfig {
    /* Prepended to every incoming key before path lookup */
    pub key_prefix: String,
    /* Log keys that match no path */
    pub trace_ignored_keys: bool,
}

/* Binds form parameters into records, caching path tables per schema */
#[derive(Debug, Default)]
pub struct FormBinder {
    config: BinderConfig,
    cache: PathCache,
}

impl FormBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BinderConfig) -> Self {
        Self {
            config,
            cache: PathCache::new(),
        }
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    /* Path table of a schema, built on first use */
    pub fn paths(&self, schema: &Arc<MessageSchema>) -> Arc<PathTable> {
        self.cache.get_or_build(schema)
    }

    /// Bind parameters into a fresh record of `schema`.
    ///
    /// Keys without a matching path are ignored. The first malformed value
    /// aborts the bind and no record is returned.
    pub fn bind(&self, schema: &Arc<MessageSchema>, params: &ParamMap) -> DecodeResult<Record> {
        self.bind_prefixed(schema, &self.config.key_prefix, params)
    }

    /* Bind with an explicit key prefix instead of the configured one */
    pub fn bind_prefixed(
        &self,
        schema: &Arc<MessageSchema>,
        prefix: &str,
        params: &ParamMap,
    ) -> DecodeResult<Record> {
        let mut record = Record::empty(schema);
        self.bind_with(schema, prefix, params, &mut record)?;
        Ok(record)
    }

    /// Bind parameters into an existing record of `schema`.
    ///
    /// On error the record may already hold values bound from earlier keys.
    pub fn bind_into(
        &self,
        schema: &Arc<MessageSchema>,
        params: &ParamMap,
        record: &mut Record,
    ) -> DecodeResult<()> {
        self.bind_with(schema, &self.config.key_prefix, params, record)
    }

    fn bind_with(
        &self,
        schema: &Arc<MessageSchema>,
        prefix: &str,
        params: &ParamMap,
        record: &mut Record,
    ) -> DecodeResult<()> {
        let table = self.cache.get_or_build(schema);

        for (key, values) in params.iter() {
            let lookup: Cow<'_, str> = if prefix.is_empty() {
                Cow::Borrowed(key)
            } else {
                Cow::Owned(format!("{prefix}{key}"))
            };
            let Some(path) = table.lookup(&lookup) else {
                if self.config.trace_ignored_keys {
                    debug!(key = %lookup, message = %schema.name, "ignoring unmatched form key");
                }
                continue;
            };

            trace!(path = %path.dotted_name, values = values.len(), "binding form key");
            match decode_field(&path.dotted_name, &path.terminal_field, values)? {
                Decoded::Value(value) => {
                    *locate_field(schema, record, path)? = value;
                }
                Decoded::EnsureMessage => {
                    let slot = locate_field(schema, record, path)?;
                    ensure_message(slot, path)?;
                }
                Decoded::Absent => {}
            }
        }
        Ok(())
    }
}

/// Walk a path's prefix from the record root, materializing missing nested
/// records, and return the terminal field slot.
fn locate_field<'r>(
    schema: &MessageSchema,
    record: &'r mut Record,
    path: &QueryPath,
) -> DecodeResult<&'r mut FieldValue> {
    let segments: Vec<&str> = path.segments().collect();
    let Some((terminal, parents)) = segments.split_last() else {
        return Err(DecodeError::inconsistency(&path.dotted_name, "empty path"));
    };

    let mut node_schema = schema;
    let mut node = record;
    for name in parents {
        let field = node_schema.field(name).ok_or_else(|| {
            DecodeError::inconsistency(
                &path.dotted_name,
                format!("field '{name}' not found in message '{}'", node_schema.name),
            )
        })?;
        let sub_schema = match (field.kind, field.message_schema()) {
            (FieldKind::Message, Some(sub_schema)) => sub_schema,
            _ => {
                return Err(DecodeError::inconsistency(
                    &path.dotted_name,
                    format!("field '{name}' is not a nested message"),
                ))
            }
        };
        let slot = node.get_mut(name).ok_or_else(|| {
            DecodeError::inconsistency(
                &path.dotted_name,
                format!("record has no field '{name}'"),
            )
        })?;
        let FieldValue::Message(child) = slot else {
            return Err(DecodeError::inconsistency(
                &path.dotted_name,
                format!("record field '{name}' is not a singular message"),
            ));
        };
        node = child
            .get_or_insert_with(|| Box::new(Record::empty(sub_schema)))
            .as_mut();
        node_schema = sub_schema.as_ref();
    }

    node.get_mut(terminal).ok_or_else(|| {
        DecodeError::inconsistency(
            &path.dotted_name,
            format!("record has no field '{terminal}'"),
        )
    })
}

fn ensure_message(slot: &mut FieldValue, path: &QueryPath) -> DecodeResult<()> {
    let (FieldValue::Message(child), Some(sub_schema)) =
        (slot, path.terminal_field.message_schema())
    else {
        return Err(DecodeError::inconsistency(
            &path.dotted_name,
            "terminal field is not a singular message",
        ));
    };
    child.get_or_insert_with(|| Box::new(Record::empty(sub_schema)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ScalarValue;
    use form_types::FieldSchema;

    fn address() -> Arc<MessageSchema> {
        Arc::new(MessageSchema::new(
            "demo.Address",
            vec![
                FieldSchema::scalar("city", FieldKind::String),
                FieldSchema::scalar("zip", FieldKind::UInt32),
            ],
        ))
    }

    fn user() -> Arc<MessageSchema> {
        Arc::new(MessageSchema::new(
            "demo.User",
            vec![
                FieldSchema::scalar("id", FieldKind::Int32).optional(),
                FieldSchema::message("addr", address()),
            ],
        ))
    }

    fn params(pairs: &[(&str, &str)]) -> ParamMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn sibling_paths_share_one_materialized_record() {
        let binder = FormBinder::new();
        let record = binder
            .bind(&user(), &params(&[("addr.city", "NYC"), ("addr.zip", "10001")]))
            .expect("bind");
        let addr = record.get("addr").and_then(FieldValue::as_message).expect("addr");
        assert_eq!(
            addr.get("city"),
            Some(&FieldValue::Scalar(ScalarValue::String("NYC".into())))
        );
        assert_eq!(
            addr.get("zip"),
            Some(&FieldValue::Scalar(ScalarValue::UInt32(10001)))
        );
    }

    #[test]
    fn bare_message_key_materializes_empty_record() {
        let binder = FormBinder::new();
        let record = binder.bind(&user(), &params(&[("addr", "")])).expect("bind");
        let addr = record.get("addr").and_then(FieldValue::as_message).expect("addr");
        assert_eq!(addr, &Record::empty(&address()));
    }

    #[test]
    fn configured_prefix_is_prepended_to_keys() {
        let outer = Arc::new(MessageSchema::new(
            "demo.Outer",
            vec![FieldSchema::message("user", user())],
        ));
        let binder = FormBinder::with_config(BinderConfig {
            key_prefix: "user.".into(),
            trace_ignored_keys: true,
        });
        let record = binder
            .bind(&outer, &params(&[("id", "5"), ("user.id", "6")]))
            .expect("bind");
        assert_eq!(
            record.get_path("user.id"),
            Some(&FieldValue::Optional(Some(ScalarValue::Int32(5))))
        );
    }

    #[test]
    fn record_of_another_schema_is_inconsistent() {
        let binder = FormBinder::new();
        let mut foreign = Record::empty(&address());
        let err = binder
            .bind_into(&user(), &params(&[("id", "1")]), &mut foreign)
            .unwrap_err();
        assert!(matches!(err, DecodeError::SchemaInconsistency { .. }));
        assert_eq!(err.path(), "id");
    }

    #[test]
    fn repeated_binds_reuse_cached_table() {
        let binder = FormBinder::new();
        let schema = user();
        binder.bind(&schema, &params(&[("id", "1")])).expect("first bind");
        binder.bind(&schema, &params(&[("id", "2")])).expect("second bind");
        assert_eq!(binder.cache().len(), 1);
        assert_eq!(binder.paths(&schema).len(), 4);
    }
}
