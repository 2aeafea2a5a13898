//! Line-delimited JSON transport to the native host
//!
//! Frames, one per line:
//!
//! - request:  `{"id": 7, "cmd": "set_config", "args": {"key": "...", "value": "..."}}`
//! - response: `{"id": 7, "ok": <value>}` or `{"id": 7, "err": "message"}`
//! - event:    `{"event": "config_update_event", "payload": {"key": "...", "value": "..."}}`
//!
//! Responses are matched to requests by id. A request whose response never
//! arrives stays pending until the stream closes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, warn};

use super::{commands, Backend};
use crate::error::BridgeError;
use crate::events::{BackendEvent, EventKind, UpdatePayload};
use crate::model::ThemeConfig;

const EVENT_CAPACITY: usize = 256;

/// Waiters by request id; `None` once the read side has closed.
type Pending = Arc<Mutex<Option<HashMap<u64, oneshot::Sender<Result<Value, String>>>>>>;

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    cmd: &'a str,
    args: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Incoming {
    Response {
        id: u64,
        #[serde(default)]
        ok: Option<Value>,
        #[serde(default)]
        err: Option<String>,
    },
    Event {
        event: String,
        payload: UpdatePayload,
    },
}

/// [`Backend`] speaking line-delimited JSON over a byte stream.
pub struct JsonLineBridge {
    next_id: AtomicU64,
    pending: Pending,
    outbound: mpsc::UnboundedSender<String>,
    events: broadcast::Sender<BackendEvent>,
}

impl JsonLineBridge {
    /// Start the reader and writer tasks on the current tokio runtime.
    pub fn spawn<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let pending: Pending = Arc::new(Mutex::new(Some(HashMap::new())));

        tokio::spawn(write_loop(writer, outbound_rx));
        tokio::spawn(read_loop(reader, pending.clone(), events.clone()));

        Self {
            next_id: AtomicU64::new(1),
            pending,
            outbound,
            events,
        }
    }

    /// Send a command and wait for its response value.
    pub async fn invoke(&self, cmd: &str, args: Value) -> Result<Value, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = serde_json::to_string(&Request { id, cmd, args })?;

        let (tx, rx) = oneshot::channel();
        match self.pending.lock().unwrap().as_mut() {
            Some(waiters) => waiters.insert(id, tx),
            None => return Err(BridgeError::Closed),
        };

        if self.outbound.send(line).is_err() {
            if let Some(waiters) = self.pending.lock().unwrap().as_mut() {
                waiters.remove(&id);
            }
            return Err(BridgeError::Closed);
        }
        debug!(id, cmd, "JsonLineBridge: request sent");

        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(BridgeError::command(cmd, message)),
            Err(_) => Err(BridgeError::Closed),
        }
    }

    pub async fn invoke_as<T: DeserializeOwned>(
        &self,
        cmd: &str,
        args: Value,
    ) -> Result<T, BridgeError> {
        let value = self.invoke(cmd, args).await?;
        Ok(serde_json::from_value(value)?)
    }
}

async fn write_loop<W>(mut writer: W, mut lines: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut line) = lines.recv().await {
        line.push('\n');
        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = written {
            error!("JsonLineBridge: write failed, closing: {e}");
            break;
        }
    }
}

async fn read_loop<R>(reader: R, pending: Pending, events: broadcast::Sender<BackendEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("JsonLineBridge: read failed, closing: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Incoming>(&line) {
            Ok(Incoming::Response { id, ok, err }) => {
                let waiter = pending
                    .lock()
                    .unwrap()
                    .as_mut()
                    .and_then(|waiters| waiters.remove(&id));
                let Some(tx) = waiter else {
                    warn!(id, "JsonLineBridge: response for unknown request");
                    continue;
                };
                let result = match err {
                    Some(message) => Err(message),
                    None => Ok(ok.unwrap_or(Value::Null)),
                };
                let _ = tx.send(result);
            }
            Ok(Incoming::Event { event, payload }) => match EventKind::from_name(&event) {
                Some(kind) => {
                    let _ = events.send(BackendEvent { kind, payload });
                }
                None => debug!(event = %event, "JsonLineBridge: ignoring unknown event"),
            },
            Err(e) => warn!("JsonLineBridge: dropping malformed frame: {e}"),
        }
    }

    // Dropping the senders wakes every waiter with `Closed`.
    pending.lock().unwrap().take();
}

#[async_trait]
impl Backend for JsonLineBridge {
    async fn get_config_values_json(&self) -> Result<HashMap<String, String>, BridgeError> {
        self.invoke_as(commands::GET_CONFIG_VALUES_JSON, json!({}))
            .await
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        self.invoke(commands::SET_CONFIG, json!({ "key": key, "value": value }))
            .await
            .map(|_| ())
    }

    async fn get_settings_values_json(&self) -> Result<HashMap<String, String>, BridgeError> {
        self.invoke_as(commands::GET_SETTINGS_VALUES_JSON, json!({}))
            .await
    }

    async fn set_settings(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        self.invoke(commands::SET_SETTINGS, json!({ "key": key, "value": value }))
            .await
            .map(|_| ())
    }

    async fn get_settings_schemas(&self) -> Result<HashMap<String, Value>, BridgeError> {
        self.invoke_as(commands::GET_SETTINGS_SCHEMAS, json!({}))
            .await
    }

    async fn load_theme_config(&self) -> Result<ThemeConfig, BridgeError> {
        self.invoke_as(commands::LOAD_THEME_CONFIG, json!({})).await
    }

    async fn set_theme_config(&self, config: &ThemeConfig) -> Result<(), BridgeError> {
        self.invoke(commands::SET_THEME_CONFIG, json!({ "config": config }))
            .await
            .map(|_| ())
    }

    async fn get_wallpaper(&self) -> Result<String, BridgeError> {
        self.invoke_as(commands::GET_WALLPAPER, json!({})).await
    }

    async fn refresh_window_theme(&self) -> Result<(), BridgeError> {
        self.invoke(commands::REFRESH_WINDOW_THEME, json!({}))
            .await
            .map(|_| ())
    }

    fn subscribe(&self) -> broadcast::Receiver<BackendEvent> {
        self.events.subscribe()
    }
}
