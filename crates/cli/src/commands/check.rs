//! `toonctx check`: Is this document worth encoding?

use serde_json::Value;
use std::fmt;
use std::path::Path;
use toonctx_codec::{EncodeOptions, encode_or_fallback, is_tabular};
use toonctx_context::estimate_tokens;

use super::{CodecArgs, load_config, parse_json, read_input};

pub async fn run(config: Option<&Path>, input: Option<&Path>, codec: &CodecArgs) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let options = codec.apply(config.codec.encode_options())?;
    let value = parse_json(&read_input(input).await?)?;
    print!("{}", analyze(&value, &options));
    Ok(())
}

/// Size comparison between minified JSON and the compact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub tabular: bool,
    pub json_bytes: usize,
    pub json_tokens: usize,
    pub compact_bytes: usize,
    pub compact_tokens: usize,
    /// The compact form could not be produced and JSON was measured instead.
    pub fallback: bool,
}

impl Report {
    /// Token savings of the compact form, in percent of the JSON cost.
    pub fn savings_percent(&self) -> f64 {
        if self.json_tokens == 0 {
            return 0.0;
        }
        (1.0 - self.compact_tokens as f64 / self.json_tokens as f64) * 100.0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tabular:  {}", if self.tabular { "yes" } else { "no" })?;
        writeln!(f, "JSON:     {} bytes (~{} tokens)", self.json_bytes, self.json_tokens)?;
        writeln!(f, "Compact:  {} bytes (~{} tokens)", self.compact_bytes, self.compact_tokens)?;
        if self.fallback {
            writeln!(f, "Note:     compact encoding failed, JSON fallback measured")?;
        }
        writeln!(f, "Savings:  {:.1}%", self.savings_percent())
    }
}

pub fn analyze(value: &Value, options: &EncodeOptions) -> Report {
    let json = value.to_string();
    let compact = encode_or_fallback(value, options);
    Report {
        tabular: is_tabular(value),
        json_bytes: json.len(),
        json_tokens: estimate_tokens(&json),
        compact_bytes: compact.text.len(),
        compact_tokens: estimate_tokens(&compact.text),
        fallback: compact.fallback,
    }
}
