//! Subcommand implementations and the helpers they share.

pub mod check;
pub mod config_cmd;
pub mod decode;
pub mod encode;
pub mod format;

use anyhow::Context;
use clap::{Args, Subcommand};
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncReadExt;
use toonctx_codec::EncodeOptions;
use toonctx_config::{AppConfig, parse_delimiter};

/// Encoding flags shared by `encode`, `check` and `format`. Anything left
/// unset comes from the configuration file.
#[derive(Args, Debug, Default, Clone)]
pub struct CodecArgs {
    /// Delimiter: a single character, or `tab`, `comma`, `pipe`
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Marker written before array lengths, e.g. `#`
    #[arg(long)]
    pub length_marker: Option<String>,

    /// Items kept by `format` before truncating
    #[arg(long)]
    pub max_array_length: Option<usize>,

    /// Characters kept per string by `format`
    #[arg(long)]
    pub max_string_length: Option<usize>,

    /// Maximum nesting depth before falling back to JSON
    #[arg(long)]
    pub max_depth: Option<usize>,
}

impl CodecArgs {
    /// Overlay the flags onto `base`.
    pub fn apply(&self, mut base: EncodeOptions) -> anyhow::Result<EncodeOptions> {
        if let Some(raw) = &self.delimiter {
            base.delimiter = parse_delimiter(raw)?;
        }
        if let Some(marker) = &self.length_marker {
            base.length_marker = Some(marker.clone());
        }
        if let Some(max) = self.max_array_length {
            base.max_array_length = Some(max);
        }
        if let Some(max) = self.max_string_length {
            base.max_string_length = Some(max);
        }
        if let Some(max) = self.max_depth {
            base.max_depth = max;
        }
        Ok(base)
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Load and validate the configuration
    Validate,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_overrides(|name| std::env::var(name).ok())?;
            config
        }
        None => AppConfig::load()?,
    };
    Ok(config)
}

/// Read a file, or stdin when no path (or `-`) is given.
pub async fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

pub fn parse_json(input: &str) -> anyhow::Result<Value> {
    serde_json::from_str(input).context("Input is not valid JSON")
}
