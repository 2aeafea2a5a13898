//! Backend-originated events
//!
//! The host pushes one event per changed key. The value travels as a JSON
//! string so both sides agree on the exact serialized form.

use serde::{Deserialize, Serialize};

/// Wire name of the config update event.
pub const CONFIG_UPDATE_EVENT: &str = "config_update_event";
/// Wire name of the settings update event.
pub const SETTINGS_UPDATE_EVENT: &str = "settings_update_event";

/// Which mirror an update event targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    ConfigUpdate,
    SettingsUpdate,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::ConfigUpdate => CONFIG_UPDATE_EVENT,
            Self::SettingsUpdate => SETTINGS_UPDATE_EVENT,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            CONFIG_UPDATE_EVENT => Some(Self::ConfigUpdate),
            SETTINGS_UPDATE_EVENT => Some(Self::SettingsUpdate),
            _ => None,
        }
    }
}

/// `{ key, value }` payload shared by both update events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub key: String,
    /// JSON-encoded value.
    pub value: String,
}

/// An update event as delivered to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendEvent {
    pub kind: EventKind,
    pub payload: UpdatePayload,
}

impl BackendEvent {
    pub fn new(kind: EventKind, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            payload: UpdatePayload {
                key: key.into(),
                value: value.into(),
            },
        }
    }

    pub fn config(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(EventKind::ConfigUpdate, key, value)
    }

    pub fn settings(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(EventKind::SettingsUpdate, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_round_trip() {
        for kind in [EventKind::ConfigUpdate, EventKind::SettingsUpdate] {
            assert_eq!(EventKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EventKind::from_name("theme_changed"), None);
    }
}
