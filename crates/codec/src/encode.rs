//! Compact encoder.
//!
//! Output is line oriented with two spaces of indentation per level:
//!
//! ```text
//! name: Alice
//! tags[2]: admin,ops
//! users[2]{id,name}:
//!   1,Alice
//!   2,Bob
//! mixed[2]:
//!   - 1
//!   - kind: nested
//!     depth: 2
//! ```
//!
//! Non-comma delimiters are declared inside the header (`[2|]`, or `[2"5"]`
//! for a digit), so the decoder never needs the options that produced the
//! text.

use serde_json::{Map, Value};

use crate::error::EncodeError;
use crate::literal::{encode_key, encode_primitive};
use crate::options::EncodeOptions;
use crate::tabular::{is_primitive, is_tabular_items};

/// Encode `value` into compact text.
///
/// Deterministic: the same value and options always produce the same text.
/// An empty root object encodes as the empty string.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<String, EncodeError> {
    options.check()?;

    let mut writer = Writer {
        options,
        lines: Vec::new(),
    };
    match value {
        Value::Object(map) => writer.object(map, 0, 1)?,
        Value::Array(items) => writer.array(0, String::new(), items, 1, 1)?,
        primitive => return encode_primitive(primitive, options.delimiter, false),
    }
    Ok(writer.lines.join("\n"))
}

struct Writer<'a> {
    options: &'a EncodeOptions,
    lines: Vec<String>,
}

impl Writer<'_> {
    fn enter(&self, depth: usize) -> Result<(), EncodeError> {
        if depth > self.options.max_depth {
            return Err(EncodeError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }

    fn push(&mut self, level: usize, text: String) {
        self.lines.push(format!("{}{text}", "  ".repeat(level)));
    }

    fn object(
        &mut self,
        map: &Map<String, Value>,
        level: usize,
        depth: usize,
    ) -> Result<(), EncodeError> {
        self.enter(depth)?;
        for (key, value) in map {
            self.field(level, "", key, value, level + 1, depth)?;
        }
        Ok(())
    }

    /// Write one `key: ...` entry. `prefix` is `"- "` when the field shares
    /// a list item's hyphen line; nested content goes to `child_level`.
    fn field(
        &mut self,
        level: usize,
        prefix: &str,
        key: &str,
        value: &Value,
        child_level: usize,
        depth: usize,
    ) -> Result<(), EncodeError> {
        let key = encode_key(key, self.options.delimiter);
        match value {
            Value::Object(map) => {
                self.push(level, format!("{prefix}{key}:"));
                self.object(map, child_level, depth + 1)
            }
            Value::Array(items) => {
                self.array(level, format!("{prefix}{key}"), items, child_level, depth + 1)
            }
            primitive => {
                let text = encode_primitive(primitive, self.options.delimiter, false)?;
                self.push(level, format!("{prefix}{key}: {text}"));
                Ok(())
            }
        }
    }

    fn header(&self, head: &str, len: usize) -> String {
        let delimiter = self.options.delimiter;
        let declared = match delimiter {
            ',' => String::new(),
            d if d.is_ascii_digit() => format!("\"{d}\""),
            d => d.to_string(),
        };
        format!("{head}[{}{len}{declared}]", self.options.marker())
    }

    fn array(
        &mut self,
        level: usize,
        head: String,
        items: &[Value],
        child_level: usize,
        depth: usize,
    ) -> Result<(), EncodeError> {
        self.enter(depth)?;
        let delimiter = self.options.delimiter;
        let header = self.header(&head, items.len());

        if items.is_empty() {
            self.push(level, format!("{header}:"));
            return Ok(());
        }

        if items.iter().all(is_primitive) {
            let values = items
                .iter()
                .map(|item| encode_primitive(item, delimiter, true))
                .collect::<Result<Vec<_>, _>>()?;
            let joined = values.join(&delimiter.to_string());
            self.push(level, format!("{header}: {joined}"));
            return Ok(());
        }

        if is_tabular_items(items) {
            self.enter(depth + 1)?;
            let Some(Value::Object(first)) = items.first() else {
                return Ok(());
            };
            let fields: Vec<&String> = first.keys().collect();
            let names = fields
                .iter()
                .map(|field| encode_key(field, delimiter))
                .collect::<Vec<_>>()
                .join(&delimiter.to_string());
            self.push(level, format!("{header}{{{names}}}:"));

            for item in items {
                let row = fields
                    .iter()
                    .map(|field| {
                        let cell = item.get(field.as_str()).unwrap_or(&Value::Null);
                        encode_primitive(cell, delimiter, true)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.push(child_level, row.join(&delimiter.to_string()));
            }
            return Ok(());
        }

        self.push(level, format!("{header}:"));
        for item in items {
            self.list_item(child_level, item, depth)?;
        }
        Ok(())
    }

    /// Write one `- ` item of a list-form array whose own depth is `depth`.
    fn list_item(&mut self, level: usize, item: &Value, depth: usize) -> Result<(), EncodeError> {
        match item {
            Value::Array(items) => {
                self.array(level, "- ".to_string(), items, level + 1, depth + 1)
            }
            Value::Object(map) => {
                self.enter(depth + 1)?;
                let mut fields = map.iter();
                let Some((key, value)) = fields.next() else {
                    self.push(level, "-".to_string());
                    return Ok(());
                };
                self.field(level, "- ", key, value, level + 2, depth + 1)?;
                for (key, value) in fields {
                    self.field(level + 1, "", key, value, level + 2, depth + 1)?;
                }
                Ok(())
            }
            primitive => {
                let text = encode_primitive(primitive, self.options.delimiter, false)?;
                self.push(level, format!("- {text}"));
                Ok(())
            }
        }
    }
}
