//! Application configuration.
//!
//! Resolution order, lowest to highest: built-in defaults, the TOML file,
//! environment variables, command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, discovery::DEFAULT_MAX_PAGES};

pub const ENV_OUTPUT_ROOT: &str = "BILI_ARCHIVER_ROOT";
pub const ENV_COOKIES: &str = "BILI_COOKIES";
pub const ENV_FFMPEG_PATH: &str = "FFMPEG_PATH";

const CONFIG_DIR_NAME: &str = "bili-archiver";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root under which each author gets a directory.
    pub output_root: PathBuf,
    pub ffmpeg_path: String,
    /// Raw cookie string, e.g. `SESSDATA=...; bili_jct=...`.
    pub cookies: Option<String>,
    /// File holding the cookie string. Used when `cookies` is unset.
    pub cookies_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub max_search_pages: u32,
    pub resolve_on_discovery: bool,
    /// Enables a daily rolling log file in this directory.
    pub log_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("videos"),
            ffmpeg_path: "ffmpeg".to_string(),
            cookies: None,
            cookies_file: None,
            request_timeout_secs: 30,
            max_search_pages: DEFAULT_MAX_PAGES,
            resolve_on_discovery: true,
            log_dir: None,
            log_filter: None,
        }
    }
}

impl AppConfig {
    /// Default config location: `<config dir>/bili-archiver/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or from the default location when it exists.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io_path("reading config", path, e))?;
        let config = Self::from_toml(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup(ENV_OUTPUT_ROOT).filter(|v| !v.is_empty()) {
            self.output_root = PathBuf::from(root);
        }
        if let Some(cookies) = lookup(ENV_COOKIES).filter(|v| !v.is_empty()) {
            self.cookies = Some(cookies);
        }
        if let Some(ffmpeg) = lookup(ENV_FFMPEG_PATH).filter(|v| !v.is_empty()) {
            self.ffmpeg_path = ffmpeg;
        }
    }

    /// The session cookie string, reading `cookies_file` if needed.
    pub fn resolve_cookies(&self) -> Result<Option<String>> {
        if let Some(cookies) = &self.cookies {
            return Ok(Some(cookies.trim().to_string()));
        }
        match &self.cookies_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| Error::io_path("reading cookies file", path, e))?;
                let content = content.trim();
                Ok((!content.is_empty()).then(|| content.to_string()))
            }
            None => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_search_pages == 0 {
            return Err(Error::config("max_search_pages must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be at least 1"));
        }
        if self.ffmpeg_path.trim().is_empty() {
            return Err(Error::config("ffmpeg_path must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.output_root, PathBuf::from("videos"));
        assert_eq!(config.max_search_pages, 20);
        assert!(config.resolve_on_discovery);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            output_root = "/data/bili"
            max_search_pages = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.output_root, PathBuf::from("/data/bili"));
        assert_eq!(config.max_search_pages, 5);
        assert_eq!(config.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            ENV_OUTPUT_ROOT => Some("/srv/videos".to_string()),
            ENV_COOKIES => Some("SESSDATA=abc".to_string()),
            ENV_FFMPEG_PATH => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.output_root, PathBuf::from("/srv/videos"));
        assert_eq!(config.cookies.as_deref(), Some("SESSDATA=abc"));
        assert_eq!(config.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_cookies_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "SESSDATA=from-file\n").unwrap();

        let config = AppConfig {
            cookies_file: Some(path),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_cookies().unwrap().as_deref(),
            Some("SESSDATA=from-file")
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = AppConfig::load(Some(Path::new("/definitely/missing/config.toml"))).unwrap_err();
        assert!(matches!(err, Error::IoPath { .. }));
    }

    #[test]
    fn test_validate_rejects_zero_pages() {
        let config = AppConfig {
            max_search_pages: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}
