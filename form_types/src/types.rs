use serde_derive::{Deserialize, Serialize};

/// Field type as spelled in a schema file.
///
/// The signed and fixed-width aliases (`sint32`, `sfixed32`, `fixed64`, ...)
/// exist so message definitions can be transcribed verbatim; they collapse
/// onto the resolved [`FieldKind`](crate::schema::FieldKind) variants.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Bool,
    Int32,
    Sint32,
    Sfixed32,
    Int64,
    Sint64,
    Sfixed64,
    Uint32,
    Fixed32,
    Uint64,
    Fixed64,
    Float,
    Double,
    String,
    Bytes,
    Message,
    /// Untyped value inferred from its text at bind time
    Value,
}

impl FieldType {
    pub fn is_message(&self) -> bool {
        matches!(self, FieldType::Message)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Referenced message name; required iff `field_type` is `message`
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub map: bool,
    #[serde(default)]
    pub extension: bool,
    #[serde(default)]
    pub weak: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            message: None,
            repeated: false,
            optional: false,
            map: false,
            extension: false,
            weak: false,
            comment: None,
        }
    }

    pub fn message(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(name, FieldType::Message)
        }
    }

    /* A singular message field whose children get dotted paths */
    pub fn is_expandable(&self) -> bool {
        self.field_type.is_message() && !self.repeated && !self.map && !self.extension && !self.weak
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct MessageDef {
    pub name: String,
    /// Opt this message out of form binding
    #[serde(default)]
    pub skip_form: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}
