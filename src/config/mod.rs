//! Process-wide response settings.
//!
//! A [`Config`] is read once at startup (usually from a TOML file) and frozen
//! inside an [`App`](crate::app::App). Nothing here changes per request.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors produced while loading a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Response pipeline settings.
///
/// Every field has a default, so an empty document is a valid configuration.
///
/// # Examples
///
/// ```
/// use outflow::config::Config;
///
/// let config = Config::from_toml_str("pretty = true\nminify = true\n").unwrap();
/// assert!(config.pretty);
/// assert!(config.minify);
/// assert!(config.gzip);
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Indent JSON and XML bodies with one tab per level.
    pub pretty: bool,

    /// Run minifiable bodies through the configured minifier.
    pub minify: bool,

    /// Compress bodies for clients that accept `gzip`.
    pub gzip: bool,

    /// Bodies shorter than this many bytes are never compressed.
    pub gzip_min_length: u64,

    /// Directory template names are resolved against by [`FileRenderer`](crate::render::FileRenderer).
    pub template_root: PathBuf,

    /// Guess a `Content-Type` from the leading bytes when none was set.
    pub sniff_content_type: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pretty: false,
            minify: false,
            gzip: true,
            gzip_min_length: 0,
            template_root: PathBuf::from("templates"),
            sniff_content_type: true,
        }
    }
}

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or mistyped fields.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn overrides_selected_fields() {
        let config = Config::from_toml_str(
            r#"
            gzip = false
            gzip_min_length = 1024
            template_root = "/srv/views"
            "#,
        )
        .unwrap();
        assert!(!config.gzip);
        assert_eq!(config.gzip_min_length, 1024);
        assert_eq!(config.template_root, PathBuf::from("/srv/views"));
        assert!(config.sniff_content_type);
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = Config::from_toml_str("pretty = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
