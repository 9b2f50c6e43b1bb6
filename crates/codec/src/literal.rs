//! Scalar tokens: quoting, escaping, literal recognition and splitting.
//!
//! The encoder and decoder share these helpers so a string is quoted
//! exactly when the decoder would otherwise read it as something else.

use serde_json::{Number, Value};
use std::fmt::Write;

use crate::error::{DecodeErrorKind, EncodeError};

// ── Literals ──────────────────────────────────────────────────────────────

/// Parse a JSON number literal. `None` for anything else.
pub(crate) fn parse_number(token: &str) -> Option<Number> {
    let first = token.chars().next()?;
    if !(first == '-' || first.is_ascii_digit()) || token.ends_with(char::is_whitespace) {
        return None;
    }
    let number = serde_json::from_str::<Number>(token).ok()?;
    if number.is_f64() {
        // The JSON reader's float path can land one ULP off; std parsing
        // is correctly rounded, so shortest-form output reads back exactly.
        return token.parse::<f64>().ok().and_then(Number::from_f64);
    }
    Some(number)
}

/// Interpret an unquoted token: `null`, booleans, numbers, otherwise a string.
pub(crate) fn parse_unquoted(token: &str) -> Value {
    match token {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match parse_number(token) {
            Some(n) => Value::Number(n),
            None => Value::String(token.to_string()),
        },
    }
}

// ── Keys ──────────────────────────────────────────────────────────────────

fn is_key_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn is_safe_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(is_key_start) && chars.all(is_key_char)
}

/// A key as written in a field line or header field list.
pub(crate) fn encode_key(key: &str, delimiter: char) -> String {
    if is_safe_key(key) && !key.contains(delimiter) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Split `key:` / `key[` off the front of a line.
///
/// Returns the key and the remainder starting at `:` or `[`, or `None` when
/// the line does not open with a key.
pub(crate) fn split_key(content: &str) -> Option<(String, &str)> {
    let (key, rest) = if content.starts_with('"') {
        parse_quoted(content).ok()?
    } else {
        if !content.chars().next().is_some_and(is_key_start) {
            return None;
        }
        let end = content
            .find(|c: char| !is_key_char(c))
            .unwrap_or(content.len());
        (content[..end].to_string(), &content[end..])
    };
    (rest.starts_with(':') || rest.starts_with('[')).then_some((key, rest))
}

// ── Strings ───────────────────────────────────────────────────────────────

/// Whether `s` must be quoted to survive decoding unchanged.
pub(crate) fn needs_quotes(s: &str, delimiter: char) -> bool {
    s.is_empty()
        || s.starts_with(char::is_whitespace)
        || s.ends_with(char::is_whitespace)
        || matches!(s, "true" | "false" | "null")
        || s.starts_with('-')
        || parse_number(s).is_some()
        || s.contains(delimiter)
        || s.chars()
            .any(|c| matches!(c, ':' | '"' | '\\' | '[' | ']' | '{' | '}') || c.is_control())
}

/// Quote and escape a string.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Parse a quoted string at the start of `s`, returning it and the remainder.
pub(crate) fn parse_quoted(s: &str) -> Result<(String, &str), DecodeErrorKind> {
    let mut chars = s.char_indices();
    if !matches!(chars.next(), Some((_, '"'))) {
        return Err(DecodeErrorKind::UnterminatedString);
    }

    let mut out = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((out, &s[i + 1..])),
            '\\' => {
                let Some((_, escape)) = chars.next() else {
                    return Err(DecodeErrorKind::UnterminatedString);
                };
                match escape {
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'u' => {
                        let hex: String = chars.by_ref().take(4).map(|(_, c)| c).collect();
                        let decoded = (hex.chars().count() == 4)
                            .then(|| u32::from_str_radix(&hex, 16).ok())
                            .flatten()
                            .and_then(char::from_u32);
                        match decoded {
                            Some(ch) => out.push(ch),
                            None => return Err(DecodeErrorKind::InvalidEscape(format!("u{hex}"))),
                        }
                    }
                    other => return Err(DecodeErrorKind::InvalidEscape(other.to_string())),
                }
            }
            c => out.push(c),
        }
    }
    Err(DecodeErrorKind::UnterminatedString)
}

// ── Primitives ────────────────────────────────────────────────────────────

/// Encode a primitive value.
///
/// `delimited` is set for rows and inline arrays, where an unquotable
/// literal containing the delimiter cannot be represented.
pub(crate) fn encode_primitive(
    value: &Value,
    delimiter: char,
    delimited: bool,
) -> Result<String, EncodeError> {
    let literal = match value {
        Value::String(s) if needs_quotes(s, delimiter) => return Ok(quote(s)),
        Value::String(s) => return Ok(s.clone()),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => {
            unreachable!("containers are written by the encoder, not as literals")
        }
    };
    if delimited && literal.contains(delimiter) {
        return Err(EncodeError::DelimiterConflict { literal, delimiter });
    }
    Ok(literal)
}

/// Parse a standalone primitive occupying the whole of `s`.
pub(crate) fn parse_token(s: &str) -> Result<Value, DecodeErrorKind> {
    if s.starts_with('"') {
        let (value, rest) = parse_quoted(s)?;
        if !rest.is_empty() {
            return Err(DecodeErrorKind::TrailingCharacters(rest.to_string()));
        }
        return Ok(Value::String(value));
    }
    if s.is_empty() {
        return Err(DecodeErrorKind::EmptyToken);
    }
    Ok(parse_unquoted(s))
}

/// Split a delimited row or inline array into primitive values.
pub(crate) fn split_values(s: &str, delimiter: char) -> Result<Vec<Value>, DecodeErrorKind> {
    let mut values = Vec::new();
    let mut rest = s;
    loop {
        if rest.starts_with('"') {
            let (value, after) = parse_quoted(rest)?;
            values.push(Value::String(value));
            rest = after;
        } else {
            let end = rest.find(delimiter).unwrap_or(rest.len());
            let token = &rest[..end];
            if token.is_empty() {
                return Err(DecodeErrorKind::EmptyToken);
            }
            values.push(parse_unquoted(token));
            rest = &rest[end..];
        }

        if rest.is_empty() {
            return Ok(values);
        }
        match rest.strip_prefix(delimiter) {
            Some(after) => rest = after,
            None => return Err(DecodeErrorKind::TrailingCharacters(rest.to_string())),
        }
    }
}

/// Parse a header field list. `s` starts just after `{`; returns the field
/// names and the remainder after the closing `}`.
pub(crate) fn parse_field_list(
    s: &str,
    delimiter: char,
) -> Result<(Vec<String>, &str), DecodeErrorKind> {
    let unterminated = || DecodeErrorKind::MalformedHeader("unterminated field list".into());
    let mut fields = Vec::new();
    let mut rest = s;
    loop {
        if rest.starts_with('"') {
            let (field, after) = parse_quoted(rest)?;
            fields.push(field);
            rest = after;
        } else {
            let end = rest
                .find(|c: char| c == delimiter || c == '}')
                .ok_or_else(unterminated)?;
            if end == 0 {
                return Err(DecodeErrorKind::EmptyToken);
            }
            fields.push(rest[..end].to_string());
            rest = &rest[end..];
        }

        // With `}` as the delimiter, only a `}` followed by `:` closes the list.
        match rest.chars().next() {
            Some('}') if delimiter != '}' || rest[1..].starts_with(':') => {
                return Ok((fields, &rest[1..]));
            }
            Some(c) if c == delimiter => rest = &rest[c.len_utf8()..],
            _ => return Err(unterminated()),
        }
    }
}
