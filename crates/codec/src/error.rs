//! Codec error types.

use thiserror::Error;

/// The compact form cannot represent a value with the given options.
///
/// Never surfaced past the formatter: callers go through
/// [`crate::encode_or_fallback`], which substitutes JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("nesting depth exceeds limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("max depth {requested} exceeds the supported {supported}")]
    DepthLimitTooLarge { requested: usize, supported: usize },

    #[error("delimiter {0:?} cannot be declared in an array header")]
    InvalidDelimiter(char),

    #[error("length marker {0:?} must not contain digits or control characters")]
    InvalidLengthMarker(String),

    #[error("literal `{literal}` contains the active delimiter {delimiter:?}")]
    DelimiterConflict { literal: String, delimiter: char },
}

/// Malformed compact text, with the 1-based line it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct DecodeError {
    pub line: usize,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(line: usize, kind: DecodeErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    #[error("unterminated quoted string")]
    UnterminatedString,

    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(String),

    #[error("unexpected characters after value: `{0}`")]
    TrailingCharacters(String),

    #[error("empty value")]
    EmptyToken,

    #[error("row has {found} fields, header declares {expected}")]
    FieldCountMismatch { expected: usize, found: usize },

    #[error("array declares {expected} items, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("malformed array header: {0}")]
    MalformedHeader(String),

    #[error("unexpected line `{0}`")]
    UnexpectedLine(String),

    #[error("indentation must be a multiple of two spaces")]
    Indentation,

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("value does not match the requested type: {0}")]
    Deserialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_reports_line() {
        let err = DecodeError::new(
            4,
            DecodeErrorKind::FieldCountMismatch {
                expected: 3,
                found: 2,
            },
        );
        let msg = err.to_string();
        assert!(msg.starts_with("line 4:"));
        assert!(msg.contains("2 fields"));
    }

    #[test]
    fn encode_error_names_delimiter() {
        let err = EncodeError::DelimiterConflict {
            literal: "1e5".into(),
            delimiter: 'e',
        };
        assert!(err.to_string().contains("1e5"));
    }
}
