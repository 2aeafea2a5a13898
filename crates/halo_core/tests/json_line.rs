//! JsonLineBridge against a scripted host on an in-memory duplex stream.

use halo_core::{commands, Backend, BackendEvent, BridgeError, JsonLineBridge};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::io::{
    duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf,
    WriteHalf,
};

struct FakeHost {
    requests: Lines<BufReader<ReadHalf<DuplexStream>>>,
    replies: WriteHalf<DuplexStream>,
}

impl FakeHost {
    async fn next_request(&mut self) -> Value {
        let line = self.requests.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    async fn send(&mut self, frame: Value) {
        let mut line = frame.to_string();
        line.push('\n');
        self.replies.write_all(line.as_bytes()).await.unwrap();
        self.replies.flush().await.unwrap();
    }
}

fn connect() -> (JsonLineBridge, FakeHost) {
    let (shell_side, host_side) = duplex(16 * 1024);
    let (shell_read, shell_write) = split(shell_side);
    let (host_read, host_write) = split(host_side);
    let bridge = JsonLineBridge::spawn(shell_read, shell_write);
    let host = FakeHost {
        requests: BufReader::new(host_read).lines(),
        replies: host_write,
    };
    (bridge, host)
}

#[tokio::test]
async fn request_carries_command_and_args() {
    let (bridge, mut host) = connect();

    let call =
        tokio::spawn(async move { bridge.set_settings("general", r#"{"lang":"de"}"#).await });

    let request = host.next_request().await;
    assert_eq!(request["cmd"], commands::SET_SETTINGS);
    assert_eq!(
        request["args"],
        json!({ "key": "general", "value": r#"{"lang":"de"}"# })
    );

    host.send(json!({ "id": request["id"], "ok": null })).await;
    call.await.unwrap().unwrap();
}

#[tokio::test]
async fn responses_are_matched_by_id() {
    let (bridge, mut host) = connect();
    let bridge = std::sync::Arc::new(bridge);

    let config = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.get_config_values_json().await }
    });
    let first = host.next_request().await;

    let wallpaper = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.get_wallpaper().await }
    });
    let second = host.next_request().await;

    // Answer in reverse order.
    host.send(json!({ "id": second["id"], "ok": "data:image/png;base64,AAAA" }))
        .await;
    host.send(json!({ "id": first["id"], "ok": { "window": "{\"width\":800}" } }))
        .await;

    assert_eq!(wallpaper.await.unwrap().unwrap(), "data:image/png;base64,AAAA");
    let values = config.await.unwrap().unwrap();
    assert_eq!(values["window"], r#"{"width":800}"#);
}

#[tokio::test]
async fn error_response_becomes_command_error() {
    let (bridge, mut host) = connect();

    let call = tokio::spawn(async move { bridge.refresh_window_theme().await });
    let request = host.next_request().await;
    host.send(json!({ "id": request["id"], "err": "no window" })).await;

    match call.await.unwrap() {
        Err(BridgeError::Command { command, message }) => {
            assert_eq!(command, commands::REFRESH_WINDOW_THEME);
            assert_eq!(message, "no window");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn events_are_forwarded_and_junk_is_skipped() {
    let (bridge, mut host) = connect();
    let mut events = bridge.subscribe();

    host.send(json!({ "nonsense": true })).await;
    host.send(json!({ "event": "window_moved", "payload": { "key": "x", "value": "1" } }))
        .await;
    host.send(json!({
        "event": "config_update_event",
        "payload": { "key": "sidebar", "value": "{\"open\":true}" }
    }))
    .await;

    let event = events.recv().await.unwrap();
    assert_eq!(event, BackendEvent::config("sidebar", r#"{"open":true}"#));
}

#[tokio::test]
async fn closed_stream_fails_pending_and_later_requests() {
    let (bridge, mut host) = connect();
    let bridge = std::sync::Arc::new(bridge);

    let pending = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.load_theme_config().await }
    });
    host.next_request().await;
    drop(host);

    assert!(matches!(pending.await.unwrap(), Err(BridgeError::Closed)));
    assert!(matches!(
        bridge.get_settings_schemas().await,
        Err(BridgeError::Closed)
    ));
}
