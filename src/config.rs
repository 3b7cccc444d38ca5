//! Shell configuration.
//!
//! Compile-time defaults are collected here as constants; [`ShellConfig`]
//! carries the runtime values, optionally loaded from a TOML file.

use std::path::Path;

use serde::Deserialize;

use crate::core::error::ConfigError;

// =============================================================================
// Application Metadata
// =============================================================================

/// Application name shown in the banner.
pub const APP_NAME: &str = "flashsh";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Buffer Limits
// =============================================================================

/// Size of the input line buffer. A line that fills it is rejected.
pub const LINE_BUFFER_LENGTH: usize = 256;

/// Chunk size used for copying and rewriting file content.
pub const FILE_BUFFER_LENGTH: usize = 64;

/// `cat` display defaults.
pub mod cat {
    /// Column limit for the text view.
    pub const TEXT_WIDTH: usize = 128;
    /// Column limit (bytes per row) for the hex view.
    pub const HEX_WIDTH: usize = 16;
    /// Largest `-c` value accepted, in either view.
    pub const MAX_WIDTH: usize = u16::MAX as usize;
}

/// `ls` column minimum widths.
pub mod listing {
    /// Width of the size column.
    pub const SIZE_WIDTH: usize = 6;
    /// Width of the creation time column.
    pub const CREATED_WIDTH: usize = 10;
}

// =============================================================================
// Filesystem Conventions
// =============================================================================

/// Suffix of the temporary file used by the staged line editor.
pub const STAGING_SUFFIX: &str = ".lfse";

// =============================================================================
// Runtime Configuration
// =============================================================================

/// How line ranges are removed from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditStrategy {
    /// Stream survivors into a sibling file, then rename it over the original.
    #[default]
    Staged,
    /// Compact the file over itself with a read-ahead/write-behind cursor pair.
    InPlace,
}

/// Runtime settings for a shell session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    pub line_buffer_len: usize,
    pub file_buffer_len: usize,
    pub cat_text_width: usize,
    pub cat_hex_width: usize,
    pub line_edit: EditStrategy,
    /// Echo `<cwd>$ <command>` before executing each line.
    pub echo_commands: bool,
    /// Print a prompt before reading each line.
    pub prompt: bool,
    pub log_level: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            line_buffer_len: LINE_BUFFER_LENGTH,
            file_buffer_len: FILE_BUFFER_LENGTH,
            cat_text_width: cat::TEXT_WIDTH,
            cat_hex_width: cat::HEX_WIDTH,
            line_edit: EditStrategy::default(),
            echo_commands: true,
            prompt: true,
            log_level: "warn".to_string(),
        }
    }
}

impl ShellConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("line_buffer_len", self.line_buffer_len),
            ("file_buffer_len", self.file_buffer_len),
            ("cat_text_width", self.cat_text_width),
            ("cat_hex_width", self.cat_hex_width),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ConfigError::Zero(field));
            }
        }
        for (field, value) in [
            ("cat_text_width", self.cat_text_width),
            ("cat_hex_width", self.cat_hex_width),
        ] {
            if value > cat::MAX_WIDTH {
                return Err(ConfigError::TooLarge {
                    field,
                    max: cat::MAX_WIDTH,
                });
            }
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::LogLevel(self.log_level.clone()));
        }
        Ok(())
    }

    /// The configured level as a [`log::LevelFilter`].
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Warn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = ShellConfig::from_toml("").unwrap();
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.line_buffer_len, 256);
        assert_eq!(config.line_edit, EditStrategy::Staged);
    }

    #[test]
    fn test_partial_override() {
        let config = ShellConfig::from_toml(
            r#"
            file_buffer_len = 8
            line_edit = "in-place"
            echo_commands = false
            "#,
        )
        .unwrap();
        assert_eq!(config.file_buffer_len, 8);
        assert_eq!(config.line_edit, EditStrategy::InPlace);
        assert!(!config.echo_commands);
        assert_eq!(config.cat_text_width, cat::TEXT_WIDTH);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let err = ShellConfig::from_toml("line_buffer_len = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Zero("line_buffer_len")));
    }

    #[test]
    fn test_wide_cat_rejected() {
        let err = ShellConfig::from_toml("cat_hex_width = 70000").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TooLarge {
                field: "cat_hex_width",
                max: cat::MAX_WIDTH
            }
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            ShellConfig::from_toml("colour = true"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_bad_log_level() {
        assert!(matches!(
            ShellConfig::from_toml("log_level = \"loud\""),
            Err(ConfigError::LogLevel(_))
        ));
        let config = ShellConfig::from_toml("log_level = \"debug\"").unwrap();
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);
    }
}
