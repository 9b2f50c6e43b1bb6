//! `toonctx format`: Render a document as a labelled prompt section.

use std::path::Path;
use toonctx_context::format_for_llm;
use tracing::debug;

use super::{CodecArgs, load_config, parse_json, read_input};

pub async fn run(
    config: Option<&Path>,
    input: Option<&Path>,
    label: &str,
    codec: &CodecArgs,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let options = codec.apply(config.codec.context_options())?;
    let value = parse_json(&read_input(input).await?)?;

    let formatted = format_for_llm(label, Some(&value), &options);
    debug!(
        items = formatted.item_count,
        tokens = formatted.token_estimate.unwrap_or(0),
        fallback = formatted.fallback,
        "Formatted context"
    );
    if !formatted.is_empty() {
        println!("{}", formatted.text);
    }
    Ok(())
}
