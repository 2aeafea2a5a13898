//! Halo configuration file handling

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "halo.toml";

/// Top-level Halo configuration (halo.toml)
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct HaloConfig {
    #[serde(default)]
    pub i18n: I18nConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Translation resources
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct I18nConfig {
    /// Directory holding one `<tag>/` directory of `.ftl` files per locale
    #[serde(default = "default_locales_dir")]
    pub locales_dir: PathBuf,
    /// Locale used when the selected one lacks a message
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

fn default_locales_dir() -> PathBuf {
    PathBuf::from("locales")
}

fn default_locale() -> String {
    "en-US".to_string()
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            locales_dir: default_locales_dir(),
            default_locale: default_locale(),
        }
    }
}

/// Client-local storage
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("halo-storage.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Stylesheet output
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThemeConfig {
    /// File the generated stylesheet is written to
    #[serde(default = "default_stylesheet")]
    pub stylesheet: PathBuf,
    /// System dark preference used for the `Auto` theme mode
    #[serde(default)]
    pub system_dark: bool,
}

fn default_stylesheet() -> PathBuf {
    PathBuf::from("halo-theme.css")
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            stylesheet: default_stylesheet(),
            system_dark: false,
        }
    }
}

/// Logging
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogConfig {
    /// `tracing_subscriber` filter directive; `RUST_LOG` wins when set
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl HaloConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Make relative paths relative to `base` (the config file's directory).
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        for path in [
            &mut self.i18n.locales_dir,
            &mut self.storage.path,
            &mut self.theme.stylesheet,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}
