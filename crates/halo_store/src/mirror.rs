//! Config and settings mirrors
//!
//! A [`MirrorStore`] is the shell's copy of one backend-owned key/value
//! module. Reads are served from memory. Local writes land in the mirror at
//! once and are queued for the backend; backend update events are applied
//! to the mirror without ever being queued back.
//!
//! One sync task per mirror consumes both the outbound queue and the
//! backend's event stream. It remembers, per key, the JSON text it last
//! pushed or received (`last_applied`):
//!
//! - an outbound value equal to `last_applied` is not pushed again
//! - an inbound value equal to the mirror's current value is only recorded
//!
//! Since inbound events never enqueue outbound messages, a backend echo of a
//! local write can't bounce back, no matter how many keys change at once.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use halo_core::{Backend, BackendEvent, EventKind, UpdatePayload};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::StoreError;

const CHANGE_CAPACITY: usize = 256;

/// Which backend module a mirror tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MirrorKind {
    Config,
    Settings,
}

impl MirrorKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Settings => "settings",
        }
    }

    fn event_kind(self) -> EventKind {
        match self {
            Self::Config => EventKind::ConfigUpdate,
            Self::Settings => EventKind::SettingsUpdate,
        }
    }
}

impl fmt::Display for MirrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a mirror change came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// [`MirrorStore::set`] on this side.
    Local,
    /// A backend update event.
    Remote,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MirrorChange {
    pub key: String,
    pub value: Value,
    pub origin: ChangeOrigin,
}

enum SyncMessage {
    Update { key: String, json: String },
    Flush(oneshot::Sender<()>),
    Shutdown,
}

struct Shared {
    kind: MirrorKind,
    values: RwLock<BTreeMap<String, Value>>,
    changes: broadcast::Sender<MirrorChange>,
}

impl Shared {
    fn notify(&self, key: &str, value: Value, origin: ChangeOrigin) {
        // Nobody listening is fine.
        let _ = self.changes.send(MirrorChange {
            key: key.to_string(),
            value,
            origin,
        });
    }
}

/// Handle to a mirror. Cheap to clone; all clones share one mirror.
///
/// The sync task ends on [`MirrorStore::shutdown`] or once every handle is
/// dropped.
#[derive(Clone)]
pub struct MirrorStore {
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<SyncMessage>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MirrorStore {
    /// Fetch the module from the backend and start syncing it.
    ///
    /// Entries whose JSON doesn't parse are logged and left out.
    pub async fn connect(kind: MirrorKind, backend: Arc<dyn Backend>) -> Result<Self, StoreError> {
        // Subscribe first so no event between fetch and spawn is lost.
        let events = backend.subscribe();
        let raw = fetch_values(kind, backend.as_ref()).await?;

        let mut values = BTreeMap::new();
        let mut last_applied = HashMap::with_capacity(raw.len());
        for (key, json) in raw {
            match serde_json::from_str::<Value>(&json) {
                Ok(value) => {
                    last_applied.insert(key.clone(), value.to_string());
                    values.insert(key, value);
                }
                Err(e) => warn!(mirror = %kind, key = %key, "Dropping unparsable value: {e}"),
            }
        }
        debug!(mirror = %kind, keys = values.len(), "MirrorStore: connected");

        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        let shared = Arc::new(Shared {
            kind,
            values: RwLock::new(values),
            changes,
        });
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let sync = SyncLoop {
            shared: shared.clone(),
            backend,
            last_applied,
            events,
            outbound: outbound_rx,
        };
        let task = tokio::spawn(sync.run());

        Ok(Self {
            shared,
            outbound,
            task: Arc::new(Mutex::new(Some(task))),
        })
    }

    pub fn kind(&self) -> MirrorKind {
        self.shared.kind
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.shared.values.read().unwrap().get(key).cloned()
    }

    /// Typed read. `None` when the key is missing or has another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!(mirror = %self.shared.kind, key, "get_as: {e}");
                None
            }
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.shared.values.read().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.shared.values.read().unwrap().keys().cloned().collect()
    }

    /// Write `value` under `key`.
    ///
    /// The mirror and subscribers see the new value before this returns; the
    /// backend push happens on the sync task. Writing the current value
    /// again is a no-op.
    pub fn set(&self, key: &str, value: impl Serialize) -> Result<(), StoreError> {
        if self.outbound.is_closed() {
            return Err(StoreError::SyncStopped(self.shared.kind));
        }
        let value = serde_json::to_value(value)?;
        {
            let mut values = self.shared.values.write().unwrap();
            if values.get(key) == Some(&value) {
                return Ok(());
            }
            values.insert(key.to_string(), value.clone());
        }

        let json = value.to_string();
        self.shared.notify(key, value, ChangeOrigin::Local);
        self.outbound
            .send(SyncMessage::Update {
                key: key.to_string(),
                json,
            })
            .map_err(|_| StoreError::SyncStopped(self.shared.kind))
    }

    /// Read-modify-write of a typed value. A missing key starts from
    /// `T::default()`.
    pub fn update<T, F>(&self, key: &str, f: F) -> Result<(), StoreError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T),
    {
        let mut current: T = match self.get(key) {
            Some(value) => serde_json::from_value(value)?,
            None => T::default(),
        };
        f(&mut current);
        self.set(key, current)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MirrorChange> {
        self.shared.changes.subscribe()
    }

    /// Wait until the sync task has handled every update queued before this
    /// call, and every backend event already delivered to it.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let (tx, rx) = oneshot::channel();
        self.outbound
            .send(SyncMessage::Flush(tx))
            .map_err(|_| StoreError::SyncStopped(self.shared.kind))?;
        rx.await
            .map_err(|_| StoreError::SyncStopped(self.shared.kind))
    }

    /// Stop the sync task and wait for it. Queued updates ahead of the stop
    /// request are still pushed.
    pub async fn shutdown(&self) {
        let _ = self.outbound.send(SyncMessage::Shutdown);
        let task = self.task.lock().unwrap().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(mirror = %self.shared.kind, "Sync task failed: {e}");
            }
        }
    }
}

/// The single consumer of a mirror's outbound queue and event stream.
struct SyncLoop {
    shared: Arc<Shared>,
    backend: Arc<dyn Backend>,
    last_applied: HashMap<String, String>,
    events: broadcast::Receiver<BackendEvent>,
    outbound: mpsc::UnboundedReceiver<SyncMessage>,
}

impl SyncLoop {
    async fn run(mut self) {
        let kind = self.shared.kind;
        let mut events_open = true;

        loop {
            tokio::select! {
                // Events first: anything the backend already said is applied
                // before a later flush completes.
                biased;

                event = self.events.recv(), if events_open => match event {
                    Ok(event) if event.kind == kind.event_kind() => self.apply_remote(event.payload),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(mirror = %kind, missed, "Backend events lagged, refetching");
                        self.resync().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(mirror = %kind, "Backend event stream closed");
                        events_open = false;
                    }
                },

                message = self.outbound.recv() => match message {
                    Some(SyncMessage::Update { key, json }) => self.push(key, json).await,
                    Some(SyncMessage::Flush(done)) => {
                        let _ = done.send(());
                    }
                    Some(SyncMessage::Shutdown) | None => break,
                },
            }
        }
        debug!(mirror = %kind, "Sync loop stopped");
    }

    async fn push(&mut self, key: String, json: String) {
        if self.last_applied.get(&key) == Some(&json) {
            debug!(mirror = %self.shared.kind, key = %key, "Skipping push of already applied value");
            return;
        }

        let result = match self.shared.kind {
            MirrorKind::Config => self.backend.set_config(&key, &json).await,
            MirrorKind::Settings => self.backend.set_settings(&key, &json).await,
        };
        match result {
            Ok(()) => {
                debug!(mirror = %self.shared.kind, key = %key, "Pushed");
                self.last_applied.insert(key, json);
            }
            Err(e) => error!(mirror = %self.shared.kind, key = %key, "Push failed: {e}"),
        }
    }

    /// Re-read the whole module after missed events. Keys the backend still
    /// has are applied like update events.
    async fn resync(&mut self) {
        match fetch_values(self.shared.kind, self.backend.as_ref()).await {
            Ok(raw) => {
                for (key, value) in raw {
                    self.apply_remote(UpdatePayload { key, value });
                }
            }
            Err(e) => error!(mirror = %self.shared.kind, "Resync failed: {e}"),
        }
    }

    fn apply_remote(&mut self, payload: UpdatePayload) {
        let UpdatePayload { key, value } = payload;
        let incoming: Value = match serde_json::from_str(&value) {
            Ok(incoming) => incoming,
            Err(e) => {
                warn!(mirror = %self.shared.kind, key = %key, "Dropping unparsable event: {e}");
                return;
            }
        };
        self.last_applied.insert(key.clone(), incoming.to_string());

        {
            let mut values = self.shared.values.write().unwrap();
            if values.get(&key) == Some(&incoming) {
                return;
            }
            values.insert(key.clone(), incoming.clone());
        }
        debug!(mirror = %self.shared.kind, key = %key, "Applied backend update");
        self.shared.notify(&key, incoming, ChangeOrigin::Remote);
    }
}

async fn fetch_values(
    kind: MirrorKind,
    backend: &dyn Backend,
) -> Result<HashMap<String, String>, StoreError> {
    let raw = match kind {
        MirrorKind::Config => backend.get_config_values_json().await?,
        MirrorKind::Settings => backend.get_settings_values_json().await?,
    };
    Ok(raw)
}
