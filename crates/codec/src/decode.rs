//! Compact decoder, the exact left inverse of [`crate::encode`].

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{DecodeError, DecodeErrorKind};
use crate::literal::{parse_field_list, parse_token, split_key, split_values};
use crate::options::MAX_SUPPORTED_DEPTH;

/// Decode compact text back into a value.
///
/// Empty input decodes to an empty object, mirroring how an empty object
/// encodes.
pub fn decode(text: &str) -> Result<Value, DecodeError> {
    let lines = split_lines(text)?;
    let Some(&first) = lines.first() else {
        return Ok(Value::Object(Map::new()));
    };
    if first.level != 0 {
        return Err(DecodeError::new(first.number, DecodeErrorKind::Indentation));
    }

    let mut parser = Parser { lines, pos: 0 };
    let value = if first.content.starts_with('[') {
        parser.pos = 1;
        let header = parse_header(first.content).map_err(at(first.number))?;
        parser.array_body(header, 1, first.number, 1)?
    } else if split_key(first.content).is_some() {
        Value::Object(parser.object(0, 1)?)
    } else {
        parser.pos = 1;
        parse_token(first.content).map_err(at(first.number))?
    };

    if let Some(extra) = parser.lines.get(parser.pos) {
        return Err(DecodeError::new(
            extra.number,
            DecodeErrorKind::UnexpectedLine(extra.content.to_string()),
        ));
    }
    Ok(value)
}

/// Decode compact text straight into a typed value.
pub fn decode_into<T: DeserializeOwned>(text: &str) -> Result<T, DecodeError> {
    let value = decode(text)?;
    serde_json::from_value(value)
        .map_err(|e| DecodeError::new(0, DecodeErrorKind::Deserialize(e.to_string())))
}

fn at(line: usize) -> impl Fn(DecodeErrorKind) -> DecodeError {
    move |kind| DecodeError::new(line, kind)
}

// ── Lines ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// 1-based source line.
    number: usize,
    level: usize,
    content: &'a str,
}

fn split_lines(text: &str) -> Result<Vec<Line<'_>>, DecodeError> {
    let mut lines = Vec::new();
    for (index, raw) in text.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.trim().is_empty() {
            continue;
        }
        let content = raw.trim_start_matches(' ');
        let indent = raw.len() - content.len();
        if indent % 2 != 0 {
            return Err(DecodeError::new(index + 1, DecodeErrorKind::Indentation));
        }
        lines.push(Line {
            number: index + 1,
            level: indent / 2,
            content,
        });
    }
    Ok(lines)
}

// ── Array headers ─────────────────────────────────────────────────────────

/// `[<marker><len><delimiter?>]{fields}?:` followed by the inline tail.
/// A digit delimiter is declared quoted, as in `[3"5"]`.
#[derive(Debug)]
struct Header<'a> {
    len: usize,
    delimiter: char,
    fields: Option<Vec<String>>,
    tail: &'a str,
}

fn parse_header(s: &str) -> Result<Header<'_>, DecodeErrorKind> {
    let malformed = |reason: &str| DecodeErrorKind::MalformedHeader(reason.to_string());

    let body = s.strip_prefix('[').ok_or_else(|| malformed("expected `[`"))?;
    let start = body
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| malformed("missing length"))?;
    let digits = &body[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let len: usize = digits[..end]
        .parse()
        .map_err(|_| malformed("length out of range"))?;

    let rest = &digits[end..];
    // `"5"` declares a digit delimiter that the length scan cannot absorb.
    let quoted_digit = rest
        .strip_prefix('"')
        .and_then(|r| r.chars().next().filter(char::is_ascii_digit).map(|d| (d, &r[1..])))
        .and_then(|(d, r)| r.strip_prefix("\"]").map(|after| (d, after)));
    let (delimiter, rest) = match (quoted_digit, rest.chars().next()) {
        (Some(declared), _) => declared,
        // `]]` declares `]` itself as the delimiter.
        (None, Some(']')) if rest[1..].starts_with(']') => (']', &rest[2..]),
        (None, Some(']')) => (',', &rest[1..]),
        (None, Some(d)) => {
            let after = rest[d.len_utf8()..]
                .strip_prefix(']')
                .ok_or_else(|| malformed("expected `]`"))?;
            (d, after)
        }
        (None, None) => return Err(malformed("expected `]`")),
    };

    let (fields, rest) = match rest.strip_prefix('{') {
        Some(list) => {
            let (fields, after) = parse_field_list(list, delimiter)?;
            (Some(fields), after)
        }
        None => (None, rest),
    };
    let tail = rest.strip_prefix(':').ok_or_else(|| malformed("expected `:`"))?;

    Ok(Header {
        len,
        delimiter,
        fields,
        tail,
    })
}

// ── Parser ────────────────────────────────────────────────────────────────

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn guard(depth: usize, line: usize) -> Result<(), DecodeError> {
        if depth > MAX_SUPPORTED_DEPTH {
            return Err(DecodeError::new(
                line,
                DecodeErrorKind::TooDeep(MAX_SUPPORTED_DEPTH),
            ));
        }
        Ok(())
    }

    /// Consume the next line when it sits exactly at `level`.
    fn take_at(&mut self, level: usize) -> Result<Option<Line<'a>>, DecodeError> {
        let Some(&line) = self.lines.get(self.pos) else {
            return Ok(None);
        };
        if line.level == level {
            self.pos += 1;
            return Ok(Some(line));
        }
        if line.level > level {
            return Err(DecodeError::new(
                line.number,
                DecodeErrorKind::UnexpectedLine(line.content.to_string()),
            ));
        }
        Ok(None)
    }

    /// After `expected` children, nothing more may sit at `level`.
    fn expect_end(&self, level: usize, expected: usize) -> Result<(), DecodeError> {
        let Some(next) = self.lines.get(self.pos) else {
            return Ok(());
        };
        if next.level > level {
            return Err(DecodeError::new(
                next.number,
                DecodeErrorKind::UnexpectedLine(next.content.to_string()),
            ));
        }
        if next.level == level {
            let extra = self.lines[self.pos..]
                .iter()
                .take_while(|line| line.level >= level)
                .filter(|line| line.level == level)
                .count();
            return Err(DecodeError::new(
                next.number,
                DecodeErrorKind::LengthMismatch {
                    expected,
                    found: expected + extra,
                },
            ));
        }
        Ok(())
    }

    fn object(&mut self, level: usize, depth: usize) -> Result<Map<String, Value>, DecodeError> {
        let mut map = Map::new();
        while let Some(line) = self.take_at(level)? {
            Self::guard(depth, line.number)?;
            let (key, value) = self.field(line, line.content, level + 1, depth)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Parse a `key: ...` entry found in `content` on `line`. Nested content
    /// is read from `child_level`.
    fn field(
        &mut self,
        line: Line<'a>,
        content: &'a str,
        child_level: usize,
        depth: usize,
    ) -> Result<(String, Value), DecodeError> {
        let (key, rest) = split_key(content).ok_or_else(|| {
            DecodeError::new(
                line.number,
                DecodeErrorKind::UnexpectedLine(content.to_string()),
            )
        })?;

        if rest.starts_with('[') {
            let header = parse_header(rest).map_err(at(line.number))?;
            let value = self.array_body(header, child_level, line.number, depth + 1)?;
            return Ok((key, value));
        }

        let tail = &rest[1..];
        if tail.is_empty() {
            Self::guard(depth + 1, line.number)?;
            let map = self.object(child_level, depth + 1)?;
            return Ok((key, Value::Object(map)));
        }
        let token = tail.strip_prefix(' ').ok_or_else(|| {
            DecodeError::new(
                line.number,
                DecodeErrorKind::TrailingCharacters(tail.to_string()),
            )
        })?;
        let value = parse_token(token).map_err(at(line.number))?;
        Ok((key, value))
    }

    fn array_body(
        &mut self,
        header: Header<'a>,
        child_level: usize,
        line: usize,
        depth: usize,
    ) -> Result<Value, DecodeError> {
        Self::guard(depth, line)?;
        let Header {
            len,
            delimiter,
            fields,
            tail,
        } = header;

        if let Some(fields) = fields {
            if !tail.is_empty() {
                return Err(DecodeError::new(
                    line,
                    DecodeErrorKind::TrailingCharacters(tail.to_string()),
                ));
            }
            let mut rows = Vec::with_capacity(len.min(1024));
            for found in 0..len {
                let row = self.take_at(child_level)?.ok_or_else(|| {
                    DecodeError::new(line, DecodeErrorKind::LengthMismatch { expected: len, found })
                })?;
                let values = split_values(row.content, delimiter).map_err(at(row.number))?;
                if values.len() != fields.len() {
                    return Err(DecodeError::new(
                        row.number,
                        DecodeErrorKind::FieldCountMismatch {
                            expected: fields.len(),
                            found: values.len(),
                        },
                    ));
                }
                rows.push(Value::Object(fields.iter().cloned().zip(values).collect()));
            }
            self.expect_end(child_level, len)?;
            return Ok(Value::Array(rows));
        }

        if tail.is_empty() {
            let mut items = Vec::with_capacity(len.min(1024));
            for found in 0..len {
                let item = self.take_at(child_level)?.ok_or_else(|| {
                    DecodeError::new(line, DecodeErrorKind::LengthMismatch { expected: len, found })
                })?;
                items.push(self.list_item(item, child_level, depth)?);
            }
            self.expect_end(child_level, len)?;
            return Ok(Value::Array(items));
        }

        let inline = tail.strip_prefix(' ').ok_or_else(|| {
            DecodeError::new(line, DecodeErrorKind::TrailingCharacters(tail.to_string()))
        })?;
        let values = split_values(inline, delimiter).map_err(at(line))?;
        if values.len() != len {
            return Err(DecodeError::new(
                line,
                DecodeErrorKind::LengthMismatch {
                    expected: len,
                    found: values.len(),
                },
            ));
        }
        Ok(Value::Array(values))
    }

    /// Parse one `- ` item at `level` of an array whose depth is `depth`.
    fn list_item(&mut self, line: Line<'a>, level: usize, depth: usize) -> Result<Value, DecodeError> {
        if line.content == "-" {
            Self::guard(depth + 1, line.number)?;
            return Ok(Value::Object(Map::new()));
        }
        let rest = line.content.strip_prefix("- ").ok_or_else(|| {
            DecodeError::new(
                line.number,
                DecodeErrorKind::UnexpectedLine(line.content.to_string()),
            )
        })?;

        if rest.starts_with('[') {
            let header = parse_header(rest).map_err(at(line.number))?;
            return self.array_body(header, level + 1, line.number, depth + 1);
        }

        if split_key(rest).is_some() {
            Self::guard(depth + 1, line.number)?;
            let mut map = Map::new();
            let (key, value) = self.field(line, rest, level + 2, depth + 1)?;
            map.insert(key, value);
            while let Some(next) = self.take_at(level + 1)? {
                let (key, value) = self.field(next, next.content, level + 2, depth + 1)?;
                map.insert(key, value);
            }
            return Ok(Value::Object(map));
        }

        parse_token(rest).map_err(at(line.number))
    }
}
