//! Title decoding and the wire-title projection.
//!
//! A structured title is a JSON text component: either a bare JSON
//! string, or an object with a `text` field and optional nested `extra`
//! parts, flattened depth-first into one display string. The wire form
//! is the display string truncated to the 32-code-unit title field.

use serde_json::Value;
use thiserror::Error;

/// Maximum length of the wire title field, in code units.
pub const WIRE_TITLE_MAX: usize = 32;

/// Structured title text that does not decode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TitleDecodeError {
    #[error("title is not valid structured text: {reason}")]
    Malformed { reason: String },

    #[error("structured title must be a string or an object, got {got}")]
    UnsupportedShape { got: &'static str },
}

/// Decodes a structured (JSON) title into a flat display string.
pub fn decode_structured(text: &str) -> Result<String, TitleDecodeError> {
    let value: Value = serde_json::from_str(text).map_err(|err| TitleDecodeError::Malformed {
        reason: err.to_string(),
    })?;
    let mut display = String::new();
    flatten(&value, &mut display)?;
    Ok(display)
}

fn flatten(value: &Value, out: &mut String) -> Result<(), TitleDecodeError> {
    match value {
        Value::String(text) => {
            out.push_str(text);
            Ok(())
        }
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(Value::Array(parts)) = map.get("extra") {
                for part in parts {
                    flatten(part, out)?;
                }
            }
            Ok(())
        }
        other => Err(TitleDecodeError::UnsupportedShape {
            got: value_kind(other),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Projects a display string onto the wire title field: at most
/// `WIRE_TITLE_MAX` code units, boundary-safe.
pub fn wire_title(display: &str) -> String {
    match display.char_indices().nth(WIRE_TITLE_MAX) {
        Some((byte_index, _)) => display[..byte_index].to_string(),
        None => display.to_string(),
    }
}
