//! Configuration loading, validation, and management for toonctx.
//!
//! Loads configuration from `~/.toonctx/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toonctx_codec::EncodeOptions;
use toonctx_core::EmbeddingPriority;

/// The root configuration structure.
///
/// Maps directly to `~/.toonctx/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Codec defaults
    #[serde(default)]
    pub codec: CodecConfig,

    /// Conversation assembler limits
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Facts assembler limits
    #[serde(default)]
    pub facts: FactsConfig,

    /// Entities assembler settings
    #[serde(default)]
    pub entities: EntitiesConfig,

    /// Actions assembler settings
    #[serde(default)]
    pub actions: ActionsConfig,

    /// Context embedding on run end
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Delimiter for standalone encoding (CLI, embedding records)
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_marker: Option<String>,

    /// Items rendered per formatted section before truncation
    #[serde(default = "default_max_array_length")]
    pub max_array_length: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_string_length: Option<usize>,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Delimiter for context sections handed to the model
    #[serde(default = "default_context_delimiter")]
    pub context_delimiter: char,
}

fn default_delimiter() -> char {
    ','
}
fn default_max_array_length() -> usize {
    toonctx_codec::DEFAULT_MAX_ARRAY_LENGTH
}
fn default_max_depth() -> usize {
    toonctx_codec::DEFAULT_MAX_DEPTH
}
fn default_context_delimiter() -> char {
    '\t'
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            length_marker: None,
            max_array_length: default_max_array_length(),
            max_string_length: None,
            max_depth: default_max_depth(),
            context_delimiter: default_context_delimiter(),
        }
    }
}

impl CodecConfig {
    /// Options for standalone encoding.
    pub fn encode_options(&self) -> EncodeOptions {
        self.options_with(self.delimiter)
    }

    /// Options for context sections.
    pub fn context_options(&self) -> EncodeOptions {
        self.options_with(self.context_delimiter)
    }

    fn options_with(&self, delimiter: char) -> EncodeOptions {
        EncodeOptions {
            delimiter,
            length_marker: self.length_marker.clone(),
            max_array_length: Some(self.max_array_length),
            max_string_length: self.max_string_length,
            max_depth: self.max_depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Recent messages fetched for the current room
    #[serde(default = "default_conversation_length")]
    pub conversation_length: usize,

    /// Records pulled from rooms shared with the sender
    #[serde(default = "default_cross_room_limit")]
    pub cross_room_limit: usize,

    #[serde(default = "default_max_action_runs")]
    pub max_action_runs: usize,

    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    #[serde(default = "default_id_chars")]
    pub run_id_chars: usize,
}

fn default_conversation_length() -> usize {
    32
}
fn default_cross_room_limit() -> usize {
    20
}
fn default_max_action_runs() -> usize {
    3
}
fn default_max_message_chars() -> usize {
    500
}
fn default_id_chars() -> usize {
    8
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            conversation_length: default_conversation_length(),
            cross_room_limit: default_cross_room_limit(),
            max_action_runs: default_max_action_runs(),
            max_message_chars: default_max_message_chars(),
            run_id_chars: default_id_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactsConfig {
    #[serde(default = "default_recent_message_count")]
    pub recent_message_count: usize,

    /// Trailing messages whose text is embedded as the search query
    #[serde(default = "default_embedding_turns")]
    pub embedding_turns: usize,

    /// Results requested from each similarity search
    #[serde(default = "default_search_count")]
    pub search_count: usize,
}

fn default_recent_message_count() -> usize {
    10
}
fn default_embedding_turns() -> usize {
    5
}
fn default_search_count() -> usize {
    6
}

impl Default for FactsConfig {
    fn default() -> Self {
        Self {
            recent_message_count: default_recent_message_count(),
            embedding_turns: default_embedding_turns(),
            search_count: default_search_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitiesConfig {
    #[serde(default = "default_id_chars")]
    pub id_chars: usize,

    #[serde(default = "default_role")]
    pub default_role: String,
}

fn default_role() -> String {
    "user".into()
}

impl Default for EntitiesConfig {
    fn default() -> Self {
        Self {
            id_chars: default_id_chars(),
            default_role: default_role(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsConfig {
    #[serde(default = "default_description_chars")]
    pub description_chars: usize,

    /// Conversation examples sampled into the examples section
    #[serde(default = "default_example_count")]
    pub example_count: usize,
}

fn default_description_chars() -> usize {
    60
}
fn default_example_count() -> usize {
    10
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            description_chars: default_description_chars(),
            example_count: default_example_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Messages shorter than this are not worth embedding
    #[serde(default = "default_min_message_length")]
    pub min_message_length: usize,

    /// Recent messages folded into one context record
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,

    #[serde(default)]
    pub priority: EmbeddingPriority,
}

fn default_min_message_length() -> usize {
    10
}
fn default_max_context_messages() -> usize {
    5
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_message_length: default_min_message_length(),
            max_context_messages: default_max_context_messages(),
            priority: EmbeddingPriority::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.toonctx/config.toml).
    ///
    /// Environment variables take priority over the file:
    /// - `TOONCTX_DELIMITER`
    /// - `TOONCTX_MAX_ARRAY_LENGTH`
    /// - `TOONCTX_EMBEDDING_ENABLED`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `TOONCTX_*` overrides read through `var`, then re-validate.
    pub fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = var("TOONCTX_DELIMITER") {
            self.codec.delimiter = parse_delimiter(&raw)?;
        }

        if let Some(raw) = var("TOONCTX_MAX_ARRAY_LENGTH") {
            self.codec.max_array_length = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "TOONCTX_MAX_ARRAY_LENGTH must be a positive integer, got {raw:?}"
                ))
            })?;
        }

        if let Some(raw) = var("TOONCTX_EMBEDDING_ENABLED") {
            self.embedding.enabled = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::ValidationError(format!(
                        "TOONCTX_EMBEDDING_ENABLED must be a boolean, got {raw:?}"
                    )));
                }
            };
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".toonctx")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, delimiter) in [
            ("codec.delimiter", self.codec.delimiter),
            ("codec.context_delimiter", self.codec.context_delimiter),
        ] {
            if delimiter == '\n' || delimiter == '\r' {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must not be a newline"
                )));
            }
        }

        if let Some(marker) = &self.codec.length_marker {
            if marker.chars().any(|c| c.is_ascii_digit() || c.is_control()) {
                return Err(ConfigError::ValidationError(
                    "codec.length_marker must not contain digits or control characters".into(),
                ));
            }
        }

        if self.codec.max_array_length == 0 {
            return Err(ConfigError::ValidationError(
                "codec.max_array_length must be > 0".into(),
            ));
        }

        if self.codec.max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "codec.max_depth must be > 0".into(),
            ));
        }

        if self.codec.max_depth > toonctx_codec::MAX_SUPPORTED_DEPTH {
            return Err(ConfigError::ValidationError(format!(
                "codec.max_depth must not exceed {}",
                toonctx_codec::MAX_SUPPORTED_DEPTH
            )));
        }

        if self.conversation.conversation_length == 0 {
            return Err(ConfigError::ValidationError(
                "conversation.conversation_length must be > 0".into(),
            ));
        }

        if self.facts.embedding_turns > self.facts.recent_message_count {
            return Err(ConfigError::ValidationError(
                "facts.embedding_turns must not exceed facts.recent_message_count".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `config --init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Accept a literal single character, or the names `tab`, `comma`, `pipe`.
pub fn parse_delimiter(raw: &str) -> Result<char, ConfigError> {
    match raw {
        "tab" | "\\t" => return Ok('\t'),
        "comma" => return Ok(','),
        "pipe" => return Ok('|'),
        _ => {}
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::ValidationError(format!(
            "delimiter must be a single character, got {raw:?}"
        ))),
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for toonctx_core::Error {
    fn from(e: ConfigError) -> Self {
        toonctx_core::Error::Config {
            message: e.to_string(),
        }
    }
}
