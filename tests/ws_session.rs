mod common;

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;

use common::{MockWsServer, recv_event};
use edgex_api_client::EdgexError;
use edgex_api_client::auth::stark::{StarkSignature, message_hash, public_key, verify};
use edgex_api_client::auth::{
    ACCOUNT_ID_HEADER, FixedClock, RequestAuthenticator, SIGNATURE_HEADER, StaticCredentials,
    TIMESTAMP_HEADER, signing_string,
};
use edgex_api_client::ws::{ChannelSession, SessionState, WsConfig};

const PRIVATE_KEY: &str = "0x2f8c9e4b1a7d3c5e6f0a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f6";

fn quiet_config() -> WsConfig {
    WsConfig::builder()
        .ping_interval(Duration::from_secs(60))
        .build()
}

fn subscribe_frame(channel: &str) -> serde_json::Value {
    json!({"type": "subscribe", "channel": channel})
}

/// Forward every raw message to a channel.
fn capture_messages(session: &ChannelSession) -> mpsc::UnboundedReceiver<serde_json::Value> {
    let (tx, rx) = mpsc::unbounded_channel();
    session.on_raw_message(move |msg| {
        let _ = tx.send(msg.value.clone());
    });
    rx
}

/// Forward the close code (or 0 for other errors) of every disconnect.
fn capture_disconnects(session: &ChannelSession) -> mpsc::UnboundedReceiver<u16> {
    let (tx, rx) = mpsc::unbounded_channel();
    session.on_disconnect(move |err| {
        let code = match err {
            EdgexError::ConnectionClosed { code, .. } => *code,
            _ => 0,
        };
        let _ = tx.send(code);
    });
    rx
}

#[tokio::test]
async fn test_subscriptions_replayed_before_data() {
    let mut server = MockWsServer::start().await;
    let session = ChannelSession::public(&server.base_url, quiet_config());
    let mut messages = capture_messages(&session);

    let mut depth_params = serde_json::Map::new();
    depth_params.insert("depth".to_string(), json!(15));
    session.subscribe("ticker.10000001", None).await.unwrap();
    session
        .subscribe("depth.10000001", Some(depth_params))
        .await
        .unwrap();
    session.subscribe("trade.10000001", None).await.unwrap();

    session.connect().await.unwrap();
    assert_eq!(session.state(), SessionState::Open);

    let mut conn = server.accept().await;
    assert_eq!(conn.path_and_query, "/api/v1/public/ws");
    let frames = conn.recv_many(3).await;
    assert_eq!(
        frames,
        vec![
            subscribe_frame("ticker.10000001"),
            json!({"type": "subscribe", "channel": "depth.10000001", "depth": 15}),
            subscribe_frame("trade.10000001"),
        ]
    );
    conn.expect_silence(Duration::from_millis(200)).await;

    conn.send_json(json!({"type": "quote-event", "channel": "ticker.10000001"}))
        .await;
    let message = recv_event(&mut messages).await;
    assert_eq!(message["channel"], "ticker.10000001");
}

#[tokio::test]
async fn test_subscribe_while_open_sends_one_frame() {
    let mut server = MockWsServer::start().await;
    let session = ChannelSession::public(&server.base_url, quiet_config());
    session.connect().await.unwrap();
    let mut conn = server.accept().await;

    session.subscribe("ticker.1", None).await.unwrap();
    assert_eq!(conn.recv_json().await, subscribe_frame("ticker.1"));
    conn.expect_silence(Duration::from_millis(200)).await;

    session.unsubscribe("ticker.1").await.unwrap();
    assert_eq!(
        conn.recv_json().await,
        json!({"type": "unsubscribe", "channel": "ticker.1"})
    );
    assert!(session.subscriptions().is_empty());
}

#[tokio::test]
async fn test_reconnect_replays_current_set() {
    let mut server = MockWsServer::start().await;
    let config = WsConfig::builder()
        .ping_interval(Duration::from_secs(60))
        .auto_reconnect(true)
        .reconnect_backoff(Duration::from_millis(10), Duration::from_millis(50))
        .build();
    let session = ChannelSession::public(&server.base_url, config);
    let mut disconnects = capture_disconnects(&session);
    let (open_tx, mut opens) = mpsc::unbounded_channel();
    session.on_open(move || {
        let _ = open_tx.send(());
    });

    session.subscribe("A", None).await.unwrap();
    session.subscribe("B", None).await.unwrap();
    session.subscribe("C", None).await.unwrap();
    session.connect().await.unwrap();
    recv_event(&mut opens).await;

    let mut first = server.accept().await;
    assert_eq!(first.recv_many(3).await.len(), 3);

    session.unsubscribe("C").await.unwrap();
    assert_eq!(first.recv_json().await["type"], "unsubscribe");
    session.subscribe("A", None).await.unwrap();
    assert_eq!(first.recv_json().await, subscribe_frame("A"));
    assert_eq!(session.subscriptions(), vec!["A", "B"]);

    first.close().await;
    assert_eq!(recv_event(&mut disconnects).await, 1005);

    let mut second = server.accept().await;
    let replay = second.recv_many(2).await;
    assert_eq!(replay, vec![subscribe_frame("A"), subscribe_frame("B")]);
    second.expect_silence(Duration::from_millis(200)).await;

    recv_event(&mut opens).await;
    assert_eq!(session.state(), SessionState::Open);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_failed_reconnects_reach_disconnect_hooks() {
    // Serve a single connection, then stop listening so reconnects are refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("ws://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(listener);
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = ws.close(None).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    let config = WsConfig::builder()
        .ping_interval(Duration::from_secs(60))
        .auto_reconnect(true)
        .reconnect_backoff(Duration::from_millis(10), Duration::from_millis(20))
        .max_reconnect_attempts(2)
        .build();
    let session = ChannelSession::public(&base_url, config);
    let mut disconnects = capture_disconnects(&session);
    session.subscribe("ticker.1", None).await.unwrap();
    session.connect().await.unwrap();

    assert_eq!(recv_event(&mut disconnects).await, 1005);
    assert_eq!(recv_event(&mut disconnects).await, 0);
    assert_eq!(recv_event(&mut disconnects).await, 0);
    assert!(
        tokio::time::timeout(Duration::from_millis(200), disconnects.recv())
            .await
            .is_err()
    );
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.subscriptions(), vec!["ticker.1"]);
}

#[tokio::test]
async fn test_server_close_without_reconnect() {
    let mut server = MockWsServer::start().await;
    let session = ChannelSession::public(&server.base_url, quiet_config());
    let mut disconnects = capture_disconnects(&session);
    session.subscribe("ticker.1", None).await.unwrap();
    session.connect().await.unwrap();

    let mut conn = server.accept().await;
    conn.recv_json().await;
    conn.close().await;

    assert_eq!(recv_event(&mut disconnects).await, 1005);
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.subscriptions(), vec!["ticker.1"]);
    server.expect_no_connection(Duration::from_millis(200)).await;

    // A manual connect replays the kept subscription.
    session.connect().await.unwrap();
    let mut conn = server.accept().await;
    assert_eq!(conn.recv_json().await, subscribe_frame("ticker.1"));
}

#[tokio::test]
async fn test_close_fires_normal_closure_once() {
    let mut server = MockWsServer::start().await;
    let session = ChannelSession::public(&server.base_url, quiet_config());
    let mut disconnects = capture_disconnects(&session);
    session.connect().await.unwrap();
    let _conn = server.accept().await;

    session.close().await.unwrap();
    assert_eq!(recv_event(&mut disconnects).await, 1000);
    assert_eq!(session.state(), SessionState::Disconnected);

    session.close().await.unwrap();
    assert!(
        tokio::time::timeout(Duration::from_millis(200), disconnects.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let mut server = MockWsServer::start().await;
    let session = ChannelSession::public(&server.base_url, quiet_config());
    session.connect().await.unwrap();
    session.connect().await.unwrap();

    let _conn = server.accept().await;
    server.expect_no_connection(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_heartbeat_and_pong() {
    let mut server = MockWsServer::start().await;
    let config = WsConfig::builder()
        .ping_interval(Duration::from_millis(100))
        .build();
    let session = ChannelSession::public(&server.base_url, config);
    let mut messages = capture_messages(&session);
    session.connect().await.unwrap();

    let mut conn = server.accept().await;
    assert_eq!(conn.recv_json().await, json!({"type": "ping"}));

    conn.send_json(json!({"type": "pong"})).await;
    conn.send_json(json!({"type": "trade-event", "channel": "trade.1"}))
        .await;
    assert_eq!(recv_event(&mut messages).await["type"], "trade-event");
    assert!(messages.try_recv().is_err());
}

#[tokio::test]
async fn test_server_ping_is_answered() {
    let mut server = MockWsServer::start().await;
    let session = ChannelSession::public(&server.base_url, quiet_config());
    let mut messages = capture_messages(&session);
    session.connect().await.unwrap();

    let mut conn = server.accept().await;
    conn.send_json(json!({"type": "ping", "time": "1700000000000"}))
        .await;
    assert_eq!(
        conn.recv_json().await,
        json!({"type": "pong", "time": "1700000000000"})
    );
    assert!(messages.try_recv().is_err());
}

#[tokio::test]
async fn test_invalid_frame_is_skipped() {
    let mut server = MockWsServer::start().await;
    let session = ChannelSession::public(&server.base_url, quiet_config());
    let mut messages = capture_messages(&session);
    session.connect().await.unwrap();

    let mut conn = server.accept().await;
    conn.send_text("not json").await;
    conn.send_json(json!({"type": "ticker"})).await;
    assert_eq!(recv_event(&mut messages).await["type"], "ticker");
    assert!(session.is_open());
}

#[tokio::test]
async fn test_handler_dispatch_order() {
    let mut server = MockWsServer::start().await;
    let session = ChannelSession::public(&server.base_url, quiet_config());
    let (tx, mut events) = mpsc::unbounded_channel();

    let hook_tx = tx.clone();
    session.on_raw_message(move |_| {
        let _ = hook_tx.send("hook");
    });
    let first_tx = tx.clone();
    session.on_message("ticker", move |_| {
        let _ = first_tx.send("first");
    });
    session.on_message("ticker", move |_| {
        let _ = tx.send("second");
    });
    session.connect().await.unwrap();

    let mut conn = server.accept().await;
    conn.send_json(json!({"type": "ticker"})).await;
    assert_eq!(recv_event(&mut events).await, "hook");
    assert_eq!(recv_event(&mut events).await, "second");
    assert!(
        tokio::time::timeout(Duration::from_millis(200), events.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_private_session_is_signed() {
    let mut server = MockWsServer::start().await;
    let authenticator = RequestAuthenticator::with_clock(
        Some(Arc::new(StaticCredentials::new(42, PRIVATE_KEY))),
        Arc::new(FixedClock(1_700_000_000_000)),
    );
    let session = ChannelSession::private(&server.base_url, authenticator, quiet_config()).unwrap();
    session.connect().await.unwrap();

    let conn = server.accept().await;
    let signed_path = "/api/v1/private/ws?accountId=42";
    assert_eq!(conn.path_and_query, signed_path);
    assert_eq!(conn.headers.get(TIMESTAMP_HEADER).unwrap(), "1700000000000");
    assert_eq!(conn.headers.get(ACCOUNT_ID_HEADER).unwrap(), "42");

    let signature = conn.headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap();
    let signature = StarkSignature::from_header_value(signature).unwrap();
    let hash = message_hash(&signing_string(1_700_000_000_000, "GET", signed_path));
    assert!(verify(&public_key(PRIVATE_KEY).unwrap(), &hash, &signature).unwrap());
}
