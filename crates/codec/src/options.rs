//! Encoding options.

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;

/// Items rendered by the formatter when no cap is configured.
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 100;

/// Default nesting limit enforced by the encoder.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Deepest nesting the decoder accepts. `max_depth` may not exceed it, so
/// everything [`crate::encode`] writes can be decoded.
pub const MAX_SUPPORTED_DEPTH: usize = 256;

/// Per-call encoding configuration. Never retained by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Separator for tabular rows, inline arrays and header field lists.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Prefix written before array lengths, e.g. `#` gives `[#3]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_marker: Option<String>,

    /// Cap on items rendered by the formatter. `None` means the default (100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_array_length: Option<usize>,

    /// Cap on string length applied by the formatter before encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_string_length: Option<usize>,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_delimiter() -> char {
    ','
}
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            length_marker: None,
            max_array_length: None,
            max_string_length: None,
            max_depth: default_max_depth(),
        }
    }
}

impl EncodeOptions {
    /// Tab-delimited options, the form used for LLM context sections.
    pub fn tab() -> Self {
        Self::default().with_delimiter('\t')
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_length_marker(mut self, marker: impl Into<String>) -> Self {
        self.length_marker = Some(marker.into());
        self
    }

    pub fn with_max_array_length(mut self, max: usize) -> Self {
        self.max_array_length = Some(max);
        self
    }

    pub fn with_max_string_length(mut self, max: usize) -> Self {
        self.max_string_length = Some(max);
        self
    }

    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// The effective array cap used by the formatter.
    pub fn array_cap(&self) -> usize {
        self.max_array_length.unwrap_or(DEFAULT_MAX_ARRAY_LENGTH)
    }

    /// The marker as written into headers; an empty marker counts as none.
    pub(crate) fn marker(&self) -> &str {
        self.length_marker.as_deref().unwrap_or("")
    }

    /// Reject options the line-oriented format cannot express.
    pub(crate) fn check(&self) -> Result<(), EncodeError> {
        if matches!(self.delimiter, '\n' | '\r') {
            return Err(EncodeError::InvalidDelimiter(self.delimiter));
        }
        if self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(EncodeError::DepthLimitTooLarge {
                requested: self.max_depth,
                supported: MAX_SUPPORTED_DEPTH,
            });
        }
        let marker = self.marker();
        if marker
            .chars()
            .any(|c| c.is_ascii_digit() || c.is_control())
        {
            return Err(EncodeError::InvalidLengthMarker(marker.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = EncodeOptions::default();
        assert_eq!(opts.delimiter, ',');
        assert_eq!(opts.array_cap(), 100);
        assert_eq!(opts.max_depth, 64);
        assert!(opts.check().is_ok());
    }

    #[test]
    fn newline_delimiter_rejected() {
        let opts = EncodeOptions::default().with_delimiter('\n');
        assert_eq!(opts.check(), Err(EncodeError::InvalidDelimiter('\n')));
    }

    #[test]
    fn any_printable_delimiter_accepted() {
        for d in [',', '\t', '|', ';', ' ', ':', '"', ']', '}', 'x', '0', '7'] {
            assert!(EncodeOptions::default().with_delimiter(d).check().is_ok(), "{d:?}");
        }
    }

    #[test]
    fn depth_above_decoder_limit_rejected() {
        let at_limit = EncodeOptions::default().with_max_depth(MAX_SUPPORTED_DEPTH);
        assert!(at_limit.check().is_ok());

        let over = EncodeOptions::default().with_max_depth(MAX_SUPPORTED_DEPTH + 1);
        assert_eq!(
            over.check(),
            Err(EncodeError::DepthLimitTooLarge {
                requested: 257,
                supported: 256
            })
        );
    }

    #[test]
    fn marker_with_digits_rejected() {
        let opts = EncodeOptions::default().with_length_marker("v2");
        assert!(matches!(opts.check(), Err(EncodeError::InvalidLengthMarker(_))));
        assert!(EncodeOptions::default().with_length_marker("#").check().is_ok());
    }

    #[test]
    fn deserializes_with_defaults() {
        let opts: EncodeOptions = serde_json::from_str(r#"{"delimiter":"|"}"#).unwrap();
        assert_eq!(opts.delimiter, '|');
        assert_eq!(opts.max_depth, DEFAULT_MAX_DEPTH);
    }
}
