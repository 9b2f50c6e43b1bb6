//! toonctx CLI: the main entry point.
//!
//! Commands:
//! - `encode`: JSON in, compact text out
//! - `decode`: compact text in, JSON out
//! - `check`: Compare JSON and compact sizes for a document
//! - `format`: Render a document as a labelled prompt section
//! - `config`: Show, locate, validate or initialise configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{CodecArgs, ConfigAction};

#[derive(Parser)]
#[command(
    name = "toonctx",
    about = "toonctx: compact tabular context for LLM prompts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.toonctx/config.toml
    #[arg(short = 'c', long = "config", global = true, env = "TOONCTX_CONFIG")]
    config_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON document
    Encode {
        /// Input file; stdin when omitted or `-`
        input: Option<PathBuf>,

        #[command(flatten)]
        codec: CodecArgs,

        /// Only use the compact form for tabular data, JSON otherwise
        #[arg(long)]
        smart: bool,
    },

    /// Decode compact text back into JSON
    Decode {
        /// Input file; stdin when omitted or `-`
        input: Option<PathBuf>,

        /// Print indented JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Report whether a JSON document is tabular and what encoding saves
    Check {
        /// Input file; stdin when omitted or `-`
        input: Option<PathBuf>,

        #[command(flatten)]
        codec: CodecArgs,
    },

    /// Format a JSON document as a labelled context section
    Format {
        /// Input file; stdin when omitted or `-`
        input: Option<PathBuf>,

        /// Section label
        #[arg(short, long, default_value = "Context")]
        label: String,

        #[command(flatten)]
        codec: CodecArgs,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so that stdout stays pipeable
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config_path.as_deref();
    match cli.command {
        Commands::Encode { input, codec, smart } => {
            commands::encode::run(config, input.as_deref(), &codec, smart).await?
        }
        Commands::Decode { input, pretty } => commands::decode::run(input.as_deref(), pretty).await?,
        Commands::Check { input, codec } => commands::check::run(config, input.as_deref(), &codec).await?,
        Commands::Format { input, label, codec } => {
            commands::format::run(config, input.as_deref(), &label, &codec).await?
        }
        Commands::Config { action } => commands::config_cmd::run(config, action).await?,
    }

    Ok(())
}
