//! Compact tabular encoding for LLM context.
//!
//! Arrays of uniform flat records are written as a header naming the fields
//! once, followed by one delimited row per record. Everything else uses an
//! indented `key: value` form. The format exists to save tokens; whenever a
//! value cannot be expressed, callers degrade to JSON via
//! [`encode_or_fallback`].
//!
//! ```
//! use serde_json::json;
//! use toonctx_codec::{decode, encode, EncodeOptions};
//!
//! let users = json!([{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]);
//! let text = encode(&users, &EncodeOptions::default()).unwrap();
//! assert_eq!(text, "[2]{id,name}:\n  1,Alice\n  2,Bob");
//! assert_eq!(decode(&text).unwrap(), users);
//! ```

pub mod decode;
pub mod encode;
pub mod error;
pub mod fallback;
mod literal;
pub mod options;
pub mod tabular;

pub use decode::{decode, decode_into};
pub use encode::encode;
pub use error::{DecodeError, DecodeErrorKind, EncodeError};
pub use fallback::{Encoded, encode_or_fallback, normalize, smart_encode, to_json};
pub use options::{DEFAULT_MAX_ARRAY_LENGTH, DEFAULT_MAX_DEPTH, EncodeOptions, MAX_SUPPORTED_DEPTH};
pub use tabular::{is_primitive, is_tabular};
