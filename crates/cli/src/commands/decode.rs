//! `toonctx decode`: compact text in, JSON out.

use serde_json::Value;
use std::path::Path;
use toonctx_codec::decode;

use super::read_input;

pub async fn run(input: Option<&Path>, pretty: bool) -> anyhow::Result<()> {
    let text = read_input(input).await?;
    println!("{}", render(&text, pretty)?);
    Ok(())
}

pub fn render(text: &str, pretty: bool) -> anyhow::Result<String> {
    let value: Value = decode(text)?;
    let json = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(json)
}
