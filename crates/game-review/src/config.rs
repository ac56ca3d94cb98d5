//! Configuration file loading for game review.
//!
//! Settings live in `review.toml` in the current directory. Every field is
//! optional; command-line flags override whatever the file says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Search depth must be at least one ply.
    #[error("Invalid search depth: {0}")]
    InvalidDepth(u32),
}

/// Review settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReviewConfig {
    /// Path to the UCI engine.
    /// Defaults to "stockfish" (assumes it's in PATH).
    #[serde(default = "default_engine_path")]
    pub engine_path: String,
    /// Search depth per position. Defaults to 18.
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// Opening book, polyglot `.bin` or JSON lines. The builtin book is used
    /// when absent.
    #[serde(default)]
    pub book_path: Option<PathBuf>,
    /// Directory for annotated output. Defaults to next to the input.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_engine_path() -> String {
    "stockfish".to_string()
}

fn default_depth() -> u32 {
    18
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            engine_path: default_engine_path(),
            depth: default_depth(),
            book_path: None,
            output_dir: None,
        }
    }
}

impl ReviewConfig {
    /// Loads the configuration from [`Self::config_path()`].
    ///
    /// Returns the defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// [`ConfigError::ParseError`] if the file contains invalid TOML, or
    /// [`ConfigError::InvalidDepth`] for a zero depth.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    /// Loads the configuration from a specific file, or the defaults if it
    /// does not exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the path to the configuration file.
    ///
    /// Currently returns `review.toml` in the current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("review.toml")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.depth == 0 {
            return Err(ConfigError::InvalidDepth(self.depth));
        }
        Ok(())
    }

    /// Where the annotated transcript for `input` is written:
    /// `<stem>_analyzed.pgn`, in `output_dir` if set, else beside the input.
    pub fn annotated_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "game".to_string());
        let name = format!("{}_analyzed.pgn", stem);
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => input.with_file_name(name),
        }
    }
}
