/* Resolved schema tree consumed by the flattener and the binder */

use crate::types::FieldType;
use std::fmt;
use std::sync::{Arc, OnceLock};

/* Closed set of field kinds after alias collapsing */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Bytes,
    Message,
    DynamicValue,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::UInt32 => "uint32",
            FieldKind::UInt64 => "uint64",
            FieldKind::Float32 => "float32",
            FieldKind::Float64 => "float64",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Message => "message",
            FieldKind::DynamicValue => "dynamic-value",
        }
    }

    /* True for kinds decoded token-by-token into a scalar */
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldKind::Message | FieldKind::DynamicValue)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FieldType> for FieldKind {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Bool => FieldKind::Bool,
            FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32 => FieldKind::Int32,
            FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64 => FieldKind::Int64,
            FieldType::Uint32 | FieldType::Fixed32 => FieldKind::UInt32,
            FieldType::Uint64 | FieldType::Fixed64 => FieldKind::UInt64,
            FieldType::Float => FieldKind::Float32,
            FieldType::Double => FieldKind::Float64,
            FieldType::String => FieldKind::String,
            FieldType::Bytes => FieldKind::Bytes,
            FieldType::Message => FieldKind::Message,
            FieldType::Value => FieldKind::DynamicValue,
        }
    }
}

/* One node of the schema tree */
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    pub repeated: bool,
    pub optional: bool,
    pub is_map: bool,
    pub is_extension: bool,
    /* Weak or placeholder field; never addressable through a dotted path */
    pub is_weak: bool,
    /* Present iff kind == Message */
    pub sub_schema: Option<MessageRef>,
}

/// Shared handle to the schema of a message field.
///
/// Most handles are created already resolved. A handle to a message that is
/// still being resolved starts out pending and is filled once that message
/// is published, which lets a message reach itself through repeated, map,
/// extension or weak fields. Two handles are equal when they name the same
/// message; neither `PartialEq` nor `Debug` descends into the schema, so
/// self-referencing trees stay comparable and printable.
#[derive(Clone, Default)]
pub struct MessageRef {
    cell: Arc<OnceLock<Arc<MessageSchema>>>,
}

impl MessageRef {
    pub fn resolved(schema: Arc<MessageSchema>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(schema);
        Self {
            cell: Arc::new(cell),
        }
    }

    /* A handle to be filled later with `fill` */
    pub fn pending() -> Self {
        Self::default()
    }

    /* Set the schema of a pending handle; false if it was already set */
    pub fn fill(&self, schema: Arc<MessageSchema>) -> bool {
        self.cell.set(schema).is_ok()
    }

    pub fn get(&self) -> Option<&Arc<MessageSchema>> {
        self.cell.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl From<Arc<MessageSchema>> for MessageRef {
    fn from(schema: Arc<MessageSchema>) -> Self {
        Self::resolved(schema)
    }
}

impl PartialEq for MessageRef {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.cell, &other.cell) {
            return true;
        }
        match (self.get(), other.get()) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Debug for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(schema) => write!(f, "MessageRef({})", schema.name),
            None => f.write_str("MessageRef(<pending>)"),
        }
    }
}

impl FieldSchema {
    /* Create a singular field of a non-message kind */
    pub fn scalar(name: impl Into<String>, kind: FieldKind) -> Self {
        debug_assert!(
            kind != FieldKind::Message,
            "message fields must be built with FieldSchema::message"
        );
        Self {
            name: name.into(),
            kind,
            repeated: false,
            optional: false,
            is_map: false,
            is_extension: false,
            is_weak: false,
            sub_schema: None,
        }
    }

    /* Create a singular message field owning a reference to its sub-schema */
    pub fn message(name: impl Into<String>, sub_schema: impl Into<MessageRef>) -> Self {
        Self {
            kind: FieldKind::Message,
            sub_schema: Some(sub_schema.into()),
            ..Self::scalar(name, FieldKind::Bool)
        }
    }

    pub fn dynamic(name: impl Into<String>) -> Self {
        Self::scalar(name, FieldKind::DynamicValue)
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn map(mut self) -> Self {
        self.is_map = true;
        self
    }

    pub fn extension(mut self) -> Self {
        self.is_extension = true;
        self
    }

    pub fn weak(mut self) -> Self {
        self.is_weak = true;
        self
    }

    /* Check the kind/sub-schema pairing invariant */
    pub fn is_well_formed(&self) -> bool {
        (self.kind == FieldKind::Message) == self.sub_schema.is_some()
    }

    /* Resolved sub-schema of a message field */
    pub fn message_schema(&self) -> Option<&Arc<MessageSchema>> {
        self.sub_schema.as_ref().and_then(MessageRef::get)
    }

    /// True for fields that are part of the dotted path space.
    ///
    /// Scalars and dynamic values qualify unless they are map, extension or
    /// weak fields; dynamic values qualify whatever their flags. Message
    /// fields qualify only when singular and free of those flags, and are
    /// then the only fields whose children are addressable.
    pub fn is_addressable(&self) -> bool {
        match self.kind {
            FieldKind::Message => {
                !self.repeated && !self.is_map && !self.is_extension && !self.is_weak
            }
            kind if kind.is_scalar() => !self.is_map && !self.is_extension && !self.is_weak,
            _ => true,
        }
    }
}

/* A message type: ordered, uniquely named fields */
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    /* Fully-qualified message name */
    pub name: String,
    pub fields: Vec<FieldSchema>,
    /* Message opted out of form binding */
    pub skip_form: bool,
}

impl MessageSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            fields,
            skip_form: false,
        }
    }

    /* Look up a direct child field by name */
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_collapse_onto_kinds() {
        assert_eq!(FieldKind::from(FieldType::Sint32), FieldKind::Int32);
        assert_eq!(FieldKind::from(FieldType::Sfixed64), FieldKind::Int64);
        assert_eq!(FieldKind::from(FieldType::Fixed32), FieldKind::UInt32);
        assert_eq!(FieldKind::from(FieldType::Float), FieldKind::Float32);
        assert_eq!(FieldKind::from(FieldType::Value), FieldKind::DynamicValue);
    }

    #[test]
    fn builders_keep_sub_schema_invariant() {
        let address = MessageSchema::new(
            "demo.Address",
            vec![FieldSchema::scalar("city", FieldKind::String)],
        )
        .into_shared();
        let field = FieldSchema::message("addr", address.clone()).repeated();
        assert!(field.is_well_formed());
        assert!(field.repeated);
        assert_eq!(field.kind, FieldKind::Message);

        let id = FieldSchema::scalar("id", FieldKind::Int32).optional();
        assert!(id.is_well_formed());
        assert!(id.optional);

        let user = MessageSchema::new("demo.User", vec![id, field]);
        assert_eq!(user.field("addr").map(|f| f.kind), Some(FieldKind::Message));
        assert!(user.field("missing").is_none());
    }

    #[test]
    fn pending_refs_fill_once() {
        let handle = MessageRef::pending();
        let field = FieldSchema::message("children", handle.clone()).repeated();
        assert!(field.is_well_formed());
        assert!(field.message_schema().is_none());
        assert_eq!(format!("{handle:?}"), "MessageRef(<pending>)");

        let tree = MessageSchema::new("demo.Tree", vec![field]).into_shared();
        assert!(handle.fill(tree.clone()));
        assert!(!handle.fill(tree.clone()));
        assert!(handle.is_resolved());

        let children = &tree.fields[0];
        assert!(Arc::ptr_eq(children.message_schema().expect("filled"), &tree));
        assert_eq!(format!("{handle:?}"), "MessageRef(demo.Tree)");
        assert_eq!(handle, MessageRef::resolved(tree));
    }

    #[test]
    fn addressable_fields() {
        let geo = MessageSchema::new("demo.Geo", Vec::new()).into_shared();
        assert!(FieldSchema::message("geo", geo.clone()).is_addressable());
        assert!(!FieldSchema::message("geos", geo.clone()).repeated().is_addressable());
        assert!(!FieldSchema::message("by_id", geo).map().is_addressable());

        assert!(FieldSchema::scalar("tags", FieldKind::String).repeated().is_addressable());
        assert!(!FieldSchema::scalar("labels", FieldKind::String).map().is_addressable());
        assert!(!FieldSchema::scalar("ext", FieldKind::Int32).extension().is_addressable());
        assert!(!FieldSchema::scalar("old", FieldKind::Bool).weak().is_addressable());
        assert!(FieldSchema::dynamic("m").map().is_addressable());
        assert!(FieldKind::Bytes.is_scalar());
        assert!(!FieldKind::DynamicValue.is_scalar());
    }
}
