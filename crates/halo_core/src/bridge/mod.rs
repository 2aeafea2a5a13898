//! Backend bridge
//!
//! The native host owns config, settings and theme state. The shell reaches
//! it through [`Backend`]: one async method per host command, plus a
//! broadcast subscription for host-originated update events.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryBackend`]: in-process host used by tests, demos and headless runs
//! - [`JsonLineBridge`]: request/response framing over any byte stream, one
//!   JSON object per line

mod json_line;
mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::BridgeError;
use crate::events::BackendEvent;
use crate::model::ThemeConfig;

pub use json_line::JsonLineBridge;
pub use memory::{MemoryBackend, RecordedCall};

/// Host command names as they appear on the wire.
pub mod commands {
    pub const GET_CONFIG_VALUES_JSON: &str = "get_config_values_json";
    pub const SET_CONFIG: &str = "set_config";
    pub const GET_SETTINGS_VALUES_JSON: &str = "get_settings_values_json";
    pub const SET_SETTINGS: &str = "set_settings";
    pub const GET_SETTINGS_SCHEMAS: &str = "get_settings_schemas";
    pub const LOAD_THEME_CONFIG: &str = "load_theme_config";
    /// Older hosts expose the theme loader under this name.
    pub const GET_THEME_CONFIG: &str = "get_theme_config";
    pub const SET_THEME_CONFIG: &str = "set_theme_config";
    pub const GET_WALLPAPER: &str = "get_wallpaper";
    pub const REFRESH_WINDOW_THEME: &str = "refresh_window_theme";
}

/// Command surface of the native host.
///
/// Values cross the bridge as JSON strings keyed by stable identifiers.
#[async_trait]
pub trait Backend: Send + Sync {
    /// All config values, each encoded as a JSON string.
    async fn get_config_values_json(&self) -> Result<HashMap<String, String>, BridgeError>;

    async fn set_config(&self, key: &str, value: &str) -> Result<(), BridgeError>;

    /// All settings values, each encoded as a JSON string.
    async fn get_settings_values_json(&self) -> Result<HashMap<String, String>, BridgeError>;

    async fn set_settings(&self, key: &str, value: &str) -> Result<(), BridgeError>;

    /// JSON schema per settings group.
    async fn get_settings_schemas(&self) -> Result<HashMap<String, Value>, BridgeError>;

    async fn load_theme_config(&self) -> Result<ThemeConfig, BridgeError>;

    async fn set_theme_config(&self, config: &ThemeConfig) -> Result<(), BridgeError>;

    /// Desktop wallpaper as a base64 data URL. Empty when unavailable.
    async fn get_wallpaper(&self) -> Result<String, BridgeError>;

    /// Ask the host to re-apply the window effect for the current theme.
    async fn refresh_window_theme(&self) -> Result<(), BridgeError>;

    /// Subscribe to host-originated update events.
    ///
    /// Events sent before the call are not replayed.
    fn subscribe(&self) -> broadcast::Receiver<BackendEvent>;
}
