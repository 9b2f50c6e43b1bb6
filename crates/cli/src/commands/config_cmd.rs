//! `toonctx config`: Configuration management commands.

use anyhow::bail;
use std::path::{Path, PathBuf};
use toonctx_config::AppConfig;

use super::{ConfigAction, load_config};

pub async fn run(config: Option<&Path>, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => show(config),
        ConfigAction::Path => {
            println!("{}", config_path(config).display());
            Ok(())
        }
        ConfigAction::Validate => validate(config),
        ConfigAction::Init { force } => init(config, force).await,
    }
}

fn config_path(config: Option<&Path>) -> PathBuf {
    config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

fn show(config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn validate(path: Option<&Path>) -> anyhow::Result<()> {
    match load_config(path) {
        Ok(config) => {
            println!("Config OK: {}", config_path(path).display());
            println!("  Delimiter:          {:?}", config.codec.delimiter);
            println!("  Context delimiter:  {:?}", config.codec.context_delimiter);
            println!("  Max array length:   {}", config.codec.max_array_length);
            println!("  Conversation:       {} messages", config.conversation.conversation_length);
            println!(
                "  Context embedding:  {}",
                if config.embedding.enabled { "enabled" } else { "disabled" }
            );
            Ok(())
        }
        Err(e) => {
            println!("Config error: {e}");
            Err(e)
        }
    }
}

async fn init(config: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = config_path(config);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, AppConfig::default_toml()).await?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
