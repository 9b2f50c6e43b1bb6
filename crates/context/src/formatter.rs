//! Labelled context sections for LLM prompts.
//!
//! Wraps the codec with the caps a prompt needs: long lists are truncated
//! with a note saying how much was left out, long strings are shortened,
//! and every section carries a `## label` heading.

use serde::Serialize;
use serde_json::Value;
use toonctx_codec::{EncodeOptions, encode_or_fallback};

use crate::token::estimate_tokens;

/// A formatted context section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormattedContext {
    /// Empty when there was nothing to format.
    pub text: String,

    /// Items in the input, counted before truncation.
    pub item_count: usize,

    /// Rough token cost of `text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_estimate: Option<usize>,

    /// Set when compact encoding failed and `text` holds JSON instead.
    pub fallback: bool,
}

impl FormattedContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn section(label: &str, body: &str, item_count: usize, fallback: bool) -> Self {
        let text = format!("## {label}\n{body}");
        Self {
            token_estimate: Some(estimate_tokens(&text)),
            text,
            item_count,
            fallback,
        }
    }
}

/// Format `data` as a labelled section.
///
/// Nothing, `null` and empty lists produce an empty result. Lists longer
/// than the array cap are cut down before encoding and followed by a
/// `(N more items...)` note; `item_count` always reports the full length.
pub fn format_for_llm(label: &str, data: Option<&Value>, options: &EncodeOptions) -> FormattedContext {
    let Some(data) = data else {
        return FormattedContext::default();
    };

    match data {
        Value::Null => FormattedContext::default(),
        Value::Array(items) if items.is_empty() => FormattedContext::default(),
        Value::Array(items) => {
            let cap = options.array_cap();
            let kept: Vec<Value> = items
                .iter()
                .take(cap)
                .map(|item| shorten_strings(item, options.max_string_length))
                .collect();
            let encoded = encode_or_fallback(&Value::Array(kept), options);

            let mut body = encoded.text;
            if items.len() > cap {
                body.push_str(&format!("\n({} more items...)", items.len() - cap));
            }
            FormattedContext::section(label, &body, items.len(), encoded.fallback)
        }
        Value::Object(_) => {
            let shortened = shorten_strings(data, options.max_string_length);
            let encoded = encode_or_fallback(&shortened, options);
            FormattedContext::section(label, &encoded.text, 1, encoded.fallback)
        }
        Value::String(s) => {
            let body = match options.max_string_length {
                Some(max) => truncate_chars(s, max),
                None => s.clone(),
            };
            FormattedContext::section(label, &body, 1, false)
        }
        scalar => FormattedContext::section(label, &scalar.to_string(), 1, false),
    }
}

/// Format any serializable value. Values serde cannot represent format as
/// an empty section.
pub fn format_serializable<T: Serialize + ?Sized>(
    label: &str,
    data: &T,
    options: &EncodeOptions,
) -> FormattedContext {
    match toonctx_codec::normalize(data) {
        Ok(value) => format_for_llm(label, Some(&value), options),
        Err(e) => {
            tracing::warn!(label, error = %e, "Context value could not be normalized");
            FormattedContext::default()
        }
    }
}

/// Prefix `body` with a `# Section` heading. An empty body yields an empty
/// string so that callers can drop the section entirely.
pub fn add_header(header: &str, body: &str) -> String {
    if body.is_empty() {
        return String::new();
    }
    if header.is_empty() {
        return format!("{body}\n");
    }
    format!("{header}\n{body}\n")
}

/// The first `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn shorten_strings(value: &Value, max: Option<usize>) -> Value {
    let Some(max) = max else {
        return value.clone();
    };
    match value {
        Value::String(s) => Value::String(truncate_chars(s, max)),
        Value::Array(items) => Value::Array(items.iter().map(|v| shorten_strings(v, Some(max))).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), shorten_strings(v, Some(max))))
                .collect(),
        ),
        other => other.clone(),
    }
}
