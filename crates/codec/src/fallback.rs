//! JSON fallback and the smart-encode policy.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::encode::encode;
use crate::options::EncodeOptions;
use crate::tabular::is_tabular;

/// Encoded text and whether it is the JSON fallback rather than compact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub text: String,
    pub fallback: bool,
}

/// Encode compactly, degrading to pretty JSON when the compact form fails.
///
/// Never fails. The fallback is logged at `warn` and flagged on the result.
pub fn encode_or_fallback(value: &Value, options: &EncodeOptions) -> Encoded {
    match encode(value, options) {
        Ok(text) => Encoded {
            text,
            fallback: false,
        },
        Err(e) => {
            warn!(error = %e, "Compact encoding failed, falling back to JSON");
            Encoded {
                text: to_json(value),
                fallback: true,
            }
        }
    }
}

/// Pretty-printed JSON with two-space indentation.
pub fn to_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Convert any serializable value into the codec's value model.
pub fn normalize<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

/// Compact form for tabular data, plain JSON for everything else.
///
/// A value serde cannot express as JSON (e.g. a map with non-string keys)
/// renders as `null`.
pub fn smart_encode<T: Serialize + ?Sized>(value: &T, options: &EncodeOptions) -> String {
    let value = match normalize(value) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Value could not be normalized for encoding");
            Value::Null
        }
    };
    if is_tabular(&value) {
        encode_or_fallback(&value, options).text
    } else {
        to_json(&value)
    }
}
