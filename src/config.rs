// Configuration
// Optional TOML file in the platform config directory:
//
//   [sanitizer]
//   spoiler_classes = ["spoiler", "tg-spoiler"]
//   spoiler_style_keywords = ["spoiler"]
//
//   [export]
//   default_format = "markdown"

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::export::ExportFormat;
use crate::richtext::sanitizer::{Sanitizer, SanitizerOptions};

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "tgformat";
const APPLICATION: &str = "tgformat";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub default_format: ExportFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sanitizer: SanitizerOptions,
    pub export: ExportConfig,
}

impl Config {
    /// Load from the default location. Problems are logged and the
    /// defaults used instead.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            debug!("no config directory on this platform");
            return Config::default();
        };
        match Config::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!("{err}; using defaults");
                Config::default()
            }
        }
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found");
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn build_sanitizer(&self) -> Sanitizer {
        Sanitizer::new(self.sanitizer.clone())
    }
}

pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.export.default_format, ExportFormat::Html);
        assert_eq!(
            config.sanitizer.spoiler_classes,
            vec!["spoiler".to_string(), "tg-spoiler".to_string()]
        );
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[export]\ndefault_format = \"markdown\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.export.default_format, ExportFormat::MarkdownV2);
        assert_eq!(config.sanitizer, SanitizerOptions::default());
    }

    #[test]
    fn test_sanitizer_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[sanitizer]\nspoiler_classes = [\"hidden\"]\nspoiler_style_keywords = []\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.sanitizer.spoiler_classes, vec!["hidden".to_string()]);
        assert!(config.sanitizer.spoiler_style_keywords.is_empty());
        assert_eq!(config.build_sanitizer().options(), &config.sanitizer);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[export]\ndefault_format = \"rtf\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
