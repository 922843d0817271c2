/* Bound records - nested values shaped like their message schema */

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use form_types::{FieldKind, FieldSchema, MessageSchema};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value as JsonValue};

/* A single decoded scalar */
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
}

/* Contents of one record field */
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /* Singular scalar; holds the zero value until bound */
    Scalar(ScalarValue),

    /* Optional scalar; None means "not provided" */
    Optional(Option<ScalarValue>),

    /* Repeated scalar in input order */
    Repeated(Vec<ScalarValue>),

    /* Singular nested message; None until a descendant is bound */
    Message(Option<Box<Record>>),

    /* Dynamic value inferred from its text */
    Dynamic(Option<JsonValue>),

    /* Repeated messages and maps; not addressable by form keys */
    Entries(Vec<Record>),
}

/* A record: the fields of one message instance in declaration order */
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    message: String,
    fields: Vec<(String, FieldValue)>,
}

impl ScalarValue {
    /* The zero value of a scalar kind; None for message and dynamic kinds */
    pub fn zero(kind: FieldKind) -> Option<Self> {
        let value = match kind {
            FieldKind::Bool => ScalarValue::Bool(false),
            FieldKind::Int32 => ScalarValue::Int32(0),
            FieldKind::Int64 => ScalarValue::Int64(0),
            FieldKind::UInt32 => ScalarValue::UInt32(0),
            FieldKind::UInt64 => ScalarValue::UInt64(0),
            FieldKind::Float32 => ScalarValue::Float32(0.0),
            FieldKind::Float64 => ScalarValue::Float64(0.0),
            FieldKind::String => ScalarValue::String(String::new()),
            FieldKind::Bytes => ScalarValue::Bytes(Vec::new()),
            FieldKind::Message | FieldKind::DynamicValue => return None,
        };
        Some(value)
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            ScalarValue::Bool(_) => FieldKind::Bool,
            ScalarValue::Int32(_) => FieldKind::Int32,
            ScalarValue::Int64(_) => FieldKind::Int64,
            ScalarValue::UInt32(_) => FieldKind::UInt32,
            ScalarValue::UInt64(_) => FieldKind::UInt64,
            ScalarValue::Float32(_) => FieldKind::Float32,
            ScalarValue::Float64(_) => FieldKind::Float64,
            ScalarValue::String(_) => FieldKind::String,
            ScalarValue::Bytes(_) => FieldKind::Bytes,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    /* JSON form: bytes as standard base64, non-finite floats as strings */
    pub fn to_json(&self) -> JsonValue {
        match self {
            ScalarValue::Bool(v) => JsonValue::Bool(*v),
            ScalarValue::Int32(v) => JsonValue::from(*v),
            ScalarValue::Int64(v) => JsonValue::from(*v),
            ScalarValue::UInt32(v) => JsonValue::from(*v),
            ScalarValue::UInt64(v) => JsonValue::from(*v),
            ScalarValue::Float32(v) => float_to_json(f64::from(*v)),
            ScalarValue::Float64(v) => float_to_json(*v),
            ScalarValue::String(v) => JsonValue::String(v.clone()),
            ScalarValue::Bytes(v) => JsonValue::String(STANDARD.encode(v)),
        }
    }
}

fn float_to_json(value: f64) -> JsonValue {
    match Number::from_f64(value) {
        Some(number) => JsonValue::Number(number),
        None if value.is_nan() => JsonValue::String("NaN".into()),
        None if value > 0.0 => JsonValue::String("Infinity".into()),
        None => JsonValue::String("-Infinity".into()),
    }
}

impl FieldValue {
    /* The unbound state of a field */
    pub fn empty_for(field: &FieldSchema) -> Self {
        match field.kind {
            FieldKind::DynamicValue => FieldValue::Dynamic(None),
            FieldKind::Message if field.repeated || field.is_map => FieldValue::Entries(Vec::new()),
            FieldKind::Message => FieldValue::Message(None),
            _ if field.is_map => FieldValue::Entries(Vec::new()),
            _ if field.repeated => FieldValue::Repeated(Vec::new()),
            _ if field.optional => FieldValue::Optional(None),
            kind => match ScalarValue::zero(kind) {
                Some(zero) => FieldValue::Scalar(zero),
                None => FieldValue::Optional(None),
            },
        }
    }

    /* Singular or present optional scalar */
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            FieldValue::Scalar(v) => Some(v),
            FieldValue::Optional(v) => v.as_ref(),
            _ => None,
        }
    }

    pub fn as_repeated(&self) -> Option<&[ScalarValue]> {
        match self {
            FieldValue::Repeated(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Record> {
        match self {
            FieldValue::Message(Some(record)) => Some(record),
            _ => None,
        }
    }

    pub fn as_dynamic(&self) -> Option<&JsonValue> {
        match self {
            FieldValue::Dynamic(value) => value.as_ref(),
            _ => None,
        }
    }

    /* False for unset optionals, unset messages and unset dynamic values */
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Optional(v) => v.is_some(),
            FieldValue::Message(v) => v.is_some(),
            FieldValue::Dynamic(v) => v.is_some(),
            FieldValue::Scalar(_) | FieldValue::Repeated(_) | FieldValue::Entries(_) => true,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Scalar(v) => v.to_json(),
            FieldValue::Optional(v) => v.as_ref().map_or(JsonValue::Null, ScalarValue::to_json),
            FieldValue::Repeated(values) => {
                JsonValue::Array(values.iter().map(ScalarValue::to_json).collect())
            }
            FieldValue::Message(record) => record.as_ref().map_or(JsonValue::Null, |r| r.to_json()),
            FieldValue::Dynamic(value) => value.clone().unwrap_or(JsonValue::Null),
            FieldValue::Entries(records) => {
                JsonValue::Array(records.iter().map(Record::to_json).collect())
            }
        }
    }
}

impl Record {
    /* Create the unbound record for a message schema */
    pub fn empty(schema: &MessageSchema) -> Self {
        Self {
            message: schema.name.clone(),
            fields: schema
                .fields
                .iter()
                .map(|field| (field.name.clone(), FieldValue::empty_for(field)))
                .collect(),
        }
    }

    /* Fully-qualified name of the message this record instantiates */
    pub fn message_name(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /* Get a direct field by name */
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields
            .iter_mut()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, value)| value)
    }

    /* Follow a dotted path through materialized nested messages */
    pub fn get_path(&self, dotted: &str) -> Option<&FieldValue> {
        let mut segments = dotted.split('.');
        let mut value = self.get(segments.next()?)?;
        for segment in segments {
            value = value.as_message()?.get(segment)?;
        }
        Some(value)
    }

    /* Render as a JSON object in field declaration order */
    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::new();
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(object)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
