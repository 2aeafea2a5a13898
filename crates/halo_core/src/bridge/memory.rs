use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use rustc_hash::FxHashSet;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use super::{commands, Backend};
use crate::error::BridgeError;
use crate::events::{BackendEvent, EventKind};
use crate::model::ThemeConfig;

const EVENT_CAPACITY: usize = 256;

/// A command received by [`MemoryBackend`], kept for assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub command: &'static str,
    pub args: Vec<String>,
}

#[derive(Default)]
struct HostState {
    config: BTreeMap<String, Value>,
    settings: BTreeMap<String, Value>,
    schemas: HashMap<String, Value>,
    theme: ThemeConfig,
    wallpaper: String,
    failing: FxHashSet<&'static str>,
}

/// In-process stand-in for the native host.
///
/// Behaves like the real host where the shell can observe it: every accepted
/// `set_config`/`set_settings` is stored and then broadcast back as an update
/// event carrying the canonical JSON form of the stored value.
pub struct MemoryBackend {
    state: Mutex<HostState>,
    calls: Mutex<Vec<RecordedCall>>,
    events: broadcast::Sender<BackendEvent>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(HostState::default()),
            calls: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn with_config(self, key: impl Into<String>, value: Value) -> Self {
        self.state.lock().unwrap().config.insert(key.into(), value);
        self
    }

    pub fn with_settings(self, key: impl Into<String>, value: Value) -> Self {
        self.state.lock().unwrap().settings.insert(key.into(), value);
        self
    }

    pub fn with_schema(self, group: impl Into<String>, schema: Value) -> Self {
        self.state.lock().unwrap().schemas.insert(group.into(), schema);
        self
    }

    pub fn with_theme(self, theme: ThemeConfig) -> Self {
        self.state.lock().unwrap().theme = theme;
        self
    }

    pub fn with_wallpaper(self, base64: impl Into<String>) -> Self {
        self.state.lock().unwrap().wallpaper = base64.into();
        self
    }

    /// Make every later call of `command` fail.
    pub fn fail(&self, command: &'static str) {
        self.state.lock().unwrap().failing.insert(command);
    }

    pub fn config_value(&self, key: &str) -> Option<Value> {
        self.state.lock().unwrap().config.get(key).cloned()
    }

    pub fn settings_value(&self, key: &str) -> Option<Value> {
        self.state.lock().unwrap().settings.get(key).cloned()
    }

    pub fn theme_config(&self) -> ThemeConfig {
        self.state.lock().unwrap().theme.clone()
    }

    /// Change a value on the host side and broadcast it, as if another
    /// window or the host itself had edited it.
    pub fn emit(&self, kind: EventKind, key: &str, value: Value) {
        let json = value.to_string();
        {
            let mut state = self.state.lock().unwrap();
            let target = match kind {
                EventKind::ConfigUpdate => &mut state.config,
                EventKind::SettingsUpdate => &mut state.settings,
            };
            target.insert(key.to_string(), value);
        }
        self.broadcast(BackendEvent::new(kind, key, json));
    }

    /// Broadcast a raw event without touching host state.
    pub fn broadcast(&self, event: BackendEvent) {
        debug!(event = event.kind.name(), key = %event.payload.key, "MemoryBackend: emit");
        // No subscribers is not an error for the host.
        let _ = self.events.send(event);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.command == command)
            .count()
    }

    fn record(&self, command: &'static str, args: Vec<String>) -> Result<(), BridgeError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall { command, args });
        if self.state.lock().unwrap().failing.contains(command) {
            return Err(BridgeError::command(command, "injected failure"));
        }
        Ok(())
    }

    fn store(
        &self,
        command: &'static str,
        kind: EventKind,
        key: &str,
        value: &str,
    ) -> Result<(), BridgeError> {
        self.record(command, vec![key.to_string(), value.to_string()])?;
        let parsed: Value = serde_json::from_str(value)
            .map_err(|e| BridgeError::command(command, format!("invalid value json: {e}")))?;
        self.emit(kind, key, parsed);
        Ok(())
    }
}

fn encode_all(values: &BTreeMap<String, Value>) -> HashMap<String, String> {
    values
        .iter()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_config_values_json(&self) -> Result<HashMap<String, String>, BridgeError> {
        self.record(commands::GET_CONFIG_VALUES_JSON, Vec::new())?;
        Ok(encode_all(&self.state.lock().unwrap().config))
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        self.store(commands::SET_CONFIG, EventKind::ConfigUpdate, key, value)
    }

    async fn get_settings_values_json(&self) -> Result<HashMap<String, String>, BridgeError> {
        self.record(commands::GET_SETTINGS_VALUES_JSON, Vec::new())?;
        Ok(encode_all(&self.state.lock().unwrap().settings))
    }

    async fn set_settings(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        self.store(commands::SET_SETTINGS, EventKind::SettingsUpdate, key, value)
    }

    async fn get_settings_schemas(&self) -> Result<HashMap<String, Value>, BridgeError> {
        self.record(commands::GET_SETTINGS_SCHEMAS, Vec::new())?;
        Ok(self.state.lock().unwrap().schemas.clone())
    }

    async fn load_theme_config(&self) -> Result<ThemeConfig, BridgeError> {
        self.record(commands::LOAD_THEME_CONFIG, Vec::new())?;
        Ok(self.state.lock().unwrap().theme.clone())
    }

    async fn set_theme_config(&self, config: &ThemeConfig) -> Result<(), BridgeError> {
        self.record(
            commands::SET_THEME_CONFIG,
            vec![serde_json::to_string(config)?],
        )?;
        self.state.lock().unwrap().theme = config.clone();
        Ok(())
    }

    async fn get_wallpaper(&self) -> Result<String, BridgeError> {
        self.record(commands::GET_WALLPAPER, Vec::new())?;
        Ok(self.state.lock().unwrap().wallpaper.clone())
    }

    async fn refresh_window_theme(&self) -> Result<(), BridgeError> {
        self.record(commands::REFRESH_WINDOW_THEME, Vec::new())
    }

    fn subscribe(&self) -> broadcast::Receiver<BackendEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn set_settings_stores_and_echoes_canonical_json() {
        let backend = MemoryBackend::new();
        let mut events = backend.subscribe();

        backend
            .set_settings("general", r#"{ "lang":  "de-DE" }"#)
            .await
            .unwrap();

        assert_eq!(backend.settings_value("general"), Some(json!({ "lang": "de-DE" })));
        let event = events.recv().await.unwrap();
        assert_eq!(event, BackendEvent::settings("general", r#"{"lang":"de-DE"}"#));
    }

    #[tokio::test]
    async fn values_are_served_as_json_strings() {
        let backend = MemoryBackend::new().with_config("window", json!({ "width": 800 }));
        let values = backend.get_config_values_json().await.unwrap();
        assert_eq!(values["window"], r#"{"width":800}"#);
    }

    #[tokio::test]
    async fn injected_failures_are_recorded() {
        let backend = MemoryBackend::new();
        backend.fail(commands::SET_CONFIG);

        let err = backend.set_config("k", "1").await.unwrap_err();
        assert!(matches!(err, BridgeError::Command { .. }));
        assert_eq!(backend.call_count(commands::SET_CONFIG), 1);
        assert_eq!(backend.config_value("k"), None);
    }

    #[tokio::test]
    async fn invalid_json_is_rejected() {
        let backend = MemoryBackend::new();
        assert!(backend.set_settings("k", "{nope").await.is_err());
        assert_eq!(backend.settings_value("k"), None);
    }
}
