//! `toonctx encode`: JSON in, compact text out.

use serde_json::Value;
use std::path::Path;
use toonctx_codec::{EncodeOptions, encode, smart_encode};

use super::{CodecArgs, load_config, parse_json, read_input};

pub async fn run(
    config: Option<&Path>,
    input: Option<&Path>,
    codec: &CodecArgs,
    smart: bool,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let options = codec.apply(config.codec.encode_options())?;
    let value = parse_json(&read_input(input).await?)?;
    println!("{}", render(&value, &options, smart)?);
    Ok(())
}

/// Strict mode surfaces encode errors; smart mode never fails.
pub fn render(value: &Value, options: &EncodeOptions, smart: bool) -> anyhow::Result<String> {
    if smart {
        return Ok(smart_encode(value, options));
    }
    Ok(encode(value, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_encoding() {
        let value = json!({"users": [{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]});
        let text = render(&value, &EncodeOptions::default(), false).unwrap();
        assert_eq!(text, "users[2]{id,name}:\n  1,Alice\n  2,Bob");
    }

    #[test]
    fn strict_encoding_reports_depth_errors() {
        let value = json!({"a": {"b": {"c": 1}}});
        let options = EncodeOptions::default().with_max_depth(1);
        assert!(render(&value, &options, false).is_err());
    }

    #[test]
    fn smart_mode_keeps_json_for_irregular_data() {
        let value = json!({"name": "Ada", "tags": ["x"]});
        let text = render(&value, &EncodeOptions::default(), true).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), value);

        let table = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(render(&table, &EncodeOptions::default(), true).unwrap(), "[2]{id}:\n  1\n  2");
    }
}
