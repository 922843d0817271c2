/* Value decoding - raw form tokens to typed field values */

use crate::errors::{DecodeError, DecodeResult};
use crate::record::{FieldValue, ScalarValue};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use form_types::{FieldKind, FieldSchema};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/* Outcome of decoding the raw values of one key */
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /* Value to store in the terminal field */
    Value(FieldValue),
    /* Bare message key: only make sure the nested record exists */
    EnsureMessage,
    /* No raw values; the field stays untouched */
    Absent,
}

/* Decode the raw values of a key for the field it addresses */
pub fn decode_field(path: &str, field: &FieldSchema, raw: &[String]) -> DecodeResult<Decoded> {
    decode(path, field.kind, field.repeated, field.optional, raw)
}

/// Decode raw tokens according to a field's kind and container flags.
///
/// Singular fields use the first token. Repeated scalar fields decode every
/// token in order and fail on the first malformed one. Dynamic values never
/// fail.
pub fn decode(
    path: &str,
    kind: FieldKind,
    repeated: bool,
    optional: bool,
    raw: &[String],
) -> DecodeResult<Decoded> {
    let Some(first) = raw.first() else {
        return Ok(Decoded::Absent);
    };

    let value = match kind {
        FieldKind::Message => return Ok(Decoded::EnsureMessage),
        FieldKind::DynamicValue => FieldValue::Dynamic(Some(decode_dynamic(raw, repeated))),
        _ if repeated => FieldValue::Repeated(
            raw.iter()
                .map(|token| decode_scalar(path, kind, token))
                .collect::<DecodeResult<Vec<_>>>()?,
        ),
        _ if optional => FieldValue::Optional(Some(decode_scalar(path, kind, first)?)),
        _ => FieldValue::Scalar(decode_scalar(path, kind, first)?),
    };
    Ok(Decoded::Value(value))
}

/// Decode one token as a scalar of the given kind.
pub fn decode_scalar(path: &str, kind: FieldKind, token: &str) -> DecodeResult<ScalarValue> {
    match kind {
        FieldKind::Bool => parse_bool(token)
            .map(ScalarValue::Bool)
            .ok_or_else(|| DecodeError::malformed(path, kind, token, "invalid boolean text")),
        FieldKind::Int32 => parse_signed(path, kind, token).map(ScalarValue::Int32),
        FieldKind::Int64 => parse_signed(path, kind, token).map(ScalarValue::Int64),
        FieldKind::UInt32 => parse_unsigned(path, kind, token).map(ScalarValue::UInt32),
        FieldKind::UInt64 => parse_unsigned(path, kind, token).map(ScalarValue::UInt64),
        FieldKind::Float32 => {
            parse_float::<f32>(path, kind, token, f32::is_infinite).map(ScalarValue::Float32)
        }
        FieldKind::Float64 => {
            parse_float::<f64>(path, kind, token, f64::is_infinite).map(ScalarValue::Float64)
        }
        FieldKind::String => Ok(ScalarValue::String(token.to_string())),
        FieldKind::Bytes => STANDARD
            .decode(token)
            .map(ScalarValue::Bytes)
            .map_err(|e| DecodeError::malformed(path, kind, token, e)),
        FieldKind::Message | FieldKind::DynamicValue => Err(DecodeError::inconsistency(
            path,
            format!("{kind} fields have no scalar form"),
        )),
    }
}

/// Infer a dynamic value from raw tokens.
///
/// Several tokens, or a repeated field, produce a list; a single token
/// produces one value. Each token is read as a JSON document when it is
/// one and kept as a plain string otherwise.
pub fn decode_dynamic(raw: &[String], repeated: bool) -> JsonValue {
    match raw {
        [single] if !repeated => sniff_json(single),
        tokens => JsonValue::Array(tokens.iter().map(|token| sniff_json(token)).collect()),
    }
}

/* The whole token must be one JSON document */
fn sniff_json(token: &str) -> JsonValue {
    serde_json::from_str(token).unwrap_or_else(|_| JsonValue::String(token.to_string()))
}

fn parse_bool(token: &str) -> Option<bool> {
    match token {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_signed<T>(path: &str, kind: FieldKind, token: &str) -> DecodeResult<T>
where
    T: FromStr,
    T::Err: ToString,
{
    token
        .parse::<T>()
        .map_err(|e| DecodeError::malformed(path, kind, token, e))
}

/* Base-10 digits only; any sign is rejected */
fn parse_unsigned<T>(path: &str, kind: FieldKind, token: &str) -> DecodeResult<T>
where
    T: FromStr,
    T::Err: ToString,
{
    if token.starts_with('-') {
        return Err(DecodeError::malformed(path, kind, token, "negative value"));
    }
    if token.starts_with('+') {
        return Err(DecodeError::malformed(path, kind, token, "unexpected sign"));
    }
    token
        .parse::<T>()
        .map_err(|e| DecodeError::malformed(path, kind, token, e))
}

/* Finite text that rounds to infinity at the target width is out of range */
fn parse_float<T>(
    path: &str,
    kind: FieldKind,
    token: &str,
    is_infinite: fn(T) -> bool,
) -> DecodeResult<T>
where
    T: FromStr + Copy,
    T::Err: ToString,
{
    let value = token
        .parse::<T>()
        .map_err(|e| DecodeError::malformed(path, kind, token, e))?;
    if is_infinite(value) && !names_infinity(token) {
        return Err(DecodeError::malformed(path, kind, token, "value out of range"));
    }
    Ok(value)
}

fn names_infinity(token: &str) -> bool {
    let unsigned = token
        .strip_prefix(['+', '-'])
        .unwrap_or(token)
        .to_ascii_lowercase();
    unsigned == "inf" || unsigned == "infinity"
}
