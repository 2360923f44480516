//! A single edgeX WebSocket connection with subscription replay.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::auth::RequestAuthenticator;
use crate::error::EdgexError;
use crate::rest::endpoints::ws as ws_paths;
use crate::ws::config::WsConfig;
use crate::ws::handlers::{Callbacks, MessageHandler};
use crate::ws::messages::{
    InboundMessage, PingRequest, PongReply, SubscribeRequest, UnsubscribeRequest,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;
type WsReceiver = SplitStream<WsStream>;

/// Close code reported when no close frame was received.
const CLOSE_NO_STATUS: u16 = 1005;
/// Close code reported when the stream ended without a close frame.
const CLOSE_ABNORMAL: u16 = 1006;
/// Close code for a client-initiated close.
const CLOSE_NORMAL: u16 = 1000;

/// Lifecycle state of a [`ChannelSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport.
    Disconnected,
    /// Transport is being opened (or re-opened after a loss).
    Connecting,
    /// Transport is open and frames are flowing.
    Open,
    /// [`ChannelSession::close`] is tearing the transport down.
    Closing,
}

/// One recorded subscription.
#[derive(Debug, Clone)]
struct Subscription {
    channel: String,
    params: Map<String, Value>,
}

/// State that must change together.
struct Shared {
    state: SessionState,
    /// Insertion ordered, unique by channel.
    subscriptions: Vec<Subscription>,
}

/// Signing details of a private session.
struct PrivateAuth {
    authenticator: RequestAuthenticator,
    path_and_query: String,
}

struct Inner {
    url: String,
    private: Option<PrivateAuth>,
    config: WsConfig,
    shared: Mutex<Shared>,
    callbacks: Mutex<Callbacks>,
    sink: tokio::sync::Mutex<Option<WsSink>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// A single WebSocket connection to one edgeX endpoint.
///
/// The session records every channel passed to [`subscribe`], whether or not
/// it is connected, and replays the whole set each time the transport opens.
/// Inbound frames are dispatched on one background task in the order they
/// arrive: first to every raw message hook, then to at most one handler
/// (matched by message `type`, falling back to the channel topic).
///
/// Cloning is cheap and every clone controls the same connection.
///
/// # Example
///
/// ```rust,no_run
/// use edgex_api_client::ws::{ChannelSession, WsConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = ChannelSession::public("wss://quote.edgex.exchange", WsConfig::default());
///     session.on_message("ticker", |msg| println!("ticker: {}", msg.raw));
///     session.subscribe("ticker.10000001", None).await?;
///     session.connect().await?;
///     Ok(())
/// }
/// ```
///
/// [`subscribe`]: ChannelSession::subscribe
#[derive(Clone)]
pub struct ChannelSession {
    inner: Arc<Inner>,
}

impl ChannelSession {
    /// Create a session for the public market data stream.
    pub fn public(base_url: &str, config: WsConfig) -> Self {
        let url = format!("{}{}", base_url.trim_end_matches('/'), ws_paths::PUBLIC_PATH);
        Self::with_parts(url, None, config)
    }

    /// Create a session for the private account stream.
    ///
    /// Fails with [`EdgexError::AuthConfiguration`] when the authenticator
    /// has no credentials.
    pub fn private(
        base_url: &str,
        authenticator: RequestAuthenticator,
        config: WsConfig,
    ) -> Result<Self, EdgexError> {
        let account_id = authenticator.account_id().ok_or_else(|| {
            EdgexError::AuthConfiguration(
                "account id and Stark private key are required for the private stream".to_string(),
            )
        })?;
        let path_and_query = ws_paths::private_path_and_query(account_id);
        let url = format!("{}{}", base_url.trim_end_matches('/'), path_and_query);
        Ok(Self::with_parts(
            url,
            Some(PrivateAuth {
                authenticator,
                path_and_query,
            }),
            config,
        ))
    }

    fn with_parts(url: String, private: Option<PrivateAuth>, config: WsConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                url,
                private,
                config,
                shared: Mutex::new(Shared {
                    state: SessionState::Disconnected,
                    subscriptions: Vec::new(),
                }),
                callbacks: Mutex::new(Callbacks::default()),
                sink: tokio::sync::Mutex::new(None),
                task: Mutex::new(None),
            }),
        }
    }

    /// Open the transport, replay subscriptions, and start the event loop.
    ///
    /// A no-op when the session is already open or connecting. On failure the
    /// session stays disconnected, keeps its subscriptions, and passes the
    /// error to the disconnect hooks before returning it.
    pub async fn connect(&self) -> Result<(), EdgexError> {
        {
            let mut shared = lock(&self.inner.shared);
            match shared.state {
                SessionState::Open | SessionState::Connecting => return Ok(()),
                SessionState::Closing => {
                    return Err(EdgexError::Transport("session is closing".to_string()));
                }
                SessionState::Disconnected => shared.state = SessionState::Connecting,
            }
        }

        match open_transport(&self.inner).await {
            Ok(receiver) => {
                let handle = tokio::spawn(drive(self.inner.clone(), receiver));
                if let Some(previous) = lock(&self.inner.task).replace(handle) {
                    previous.abort();
                }
                Ok(())
            }
            Err(err) => {
                mark_disconnected(&self.inner, &err).await;
                Err(err)
            }
        }
    }

    /// Record `channel` and, if open, send a subscribe frame.
    ///
    /// `params` are sent next to `type` and `channel` and kept for replay;
    /// params named `type` or `channel` are not sent.
    /// Subscribing to a channel that is already recorded replaces its
    /// parameters; the set keeps a single entry.
    pub async fn subscribe(
        &self,
        channel: impl Into<String>,
        params: Option<Map<String, Value>>,
    ) -> Result<(), EdgexError> {
        let channel = channel.into();
        let params = params.unwrap_or_default();

        let open = {
            let mut shared = lock(&self.inner.shared);
            match shared
                .subscriptions
                .iter_mut()
                .find(|sub| sub.channel == channel)
            {
                Some(existing) => existing.params = params.clone(),
                None => shared.subscriptions.push(Subscription {
                    channel: channel.clone(),
                    params: params.clone(),
                }),
            }
            shared.state == SessionState::Open
        };

        tracing::debug!(channel = %channel, open, "subscribe");
        if open {
            send_json(&self.inner, &SubscribeRequest::new(&channel, &params)).await?;
        }
        Ok(())
    }

    /// Forget `channel` and, if open, send an unsubscribe frame.
    pub async fn unsubscribe(&self, channel: &str) -> Result<(), EdgexError> {
        let open = {
            let mut shared = lock(&self.inner.shared);
            shared.subscriptions.retain(|sub| sub.channel != channel);
            shared.state == SessionState::Open
        };

        tracing::debug!(channel, open, "unsubscribe");
        if open {
            send_json(&self.inner, &UnsubscribeRequest::new(channel)).await?;
        }
        Ok(())
    }

    /// Register the handler for a message type or channel topic.
    ///
    /// A later registration for the same key replaces this one.
    pub fn on_message<F>(&self, message_type: impl Into<String>, handler: F)
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.set_handler(message_type, Arc::new(handler));
    }

    pub(crate) fn set_handler(&self, message_type: impl Into<String>, handler: MessageHandler) {
        lock(&self.inner.callbacks).set_handler(message_type, handler);
    }

    /// Remove the handler for a message type. Returns whether one existed.
    pub fn remove_handler(&self, message_type: &str) -> bool {
        lock(&self.inner.callbacks).remove_handler(message_type)
    }

    /// Run `hook` after every successful open, once subscriptions are replayed.
    pub fn on_open<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        lock(&self.inner.callbacks).push_open_hook(Arc::new(hook));
    }

    /// Run `hook` for every parsed application frame, before the handler.
    pub fn on_raw_message<F>(&self, hook: F)
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        lock(&self.inner.callbacks).push_message_hook(Arc::new(hook));
    }

    /// Run `hook` when the transport closes or fails.
    pub fn on_disconnect<F>(&self, hook: F)
    where
        F: Fn(&EdgexError) + Send + Sync + 'static,
    {
        lock(&self.inner.callbacks).push_disconnect_hook(Arc::new(hook));
    }

    /// Stop the event loop and close the transport.
    ///
    /// Disconnect hooks receive a normal-closure error when a transport was
    /// open. Calling `close` again does nothing. Subscriptions are kept, so a
    /// later [`connect`](ChannelSession::connect) replays them.
    pub async fn close(&self) -> Result<(), EdgexError> {
        let was_open = {
            let mut shared = lock(&self.inner.shared);
            let was_open = shared.state == SessionState::Open;
            shared.state = SessionState::Closing;
            was_open
        };

        if let Some(task) = lock(&self.inner.task).take() {
            task.abort();
        }

        if let Some(mut sink) = self.inner.sink.lock().await.take() {
            let _ = sink.send(WsMessage::Close(None)).await;
            let _ = sink.close().await;
        }

        lock(&self.inner.shared).state = SessionState::Disconnected;

        if was_open {
            tracing::info!(url = %self.inner.url, "WebSocket closed");
            notify_disconnect(
                &self.inner,
                &EdgexError::ConnectionClosed {
                    code: CLOSE_NORMAL,
                    reason: "normal closure".to_string(),
                },
            );
        }
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        lock(&self.inner.shared).state
    }

    /// Check if the transport is open.
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Recorded channels, in subscription order.
    pub fn subscriptions(&self) -> Vec<String> {
        lock(&self.inner.shared)
            .subscriptions
            .iter()
            .map(|sub| sub.channel.clone())
            .collect()
    }

    /// The WebSocket URL, including the account query for private sessions.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Check if this is a private (signed) session.
    pub fn is_private(&self) -> bool {
        self.inner.private.is_some()
    }

    /// Check if both handles control the same connection.
    pub(crate) fn same_session(&self, other: &ChannelSession) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ChannelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = lock(&self.inner.shared);
        f.debug_struct("ChannelSession")
            .field("url", &self.inner.url)
            .field("private", &self.inner.private.is_some())
            .field("state", &shared.state)
            .field("subscriptions", &shared.subscriptions.len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connect, replay subscriptions, and run open hooks.
///
/// Expects the state to be `Connecting`; leaves it `Open` on success.
async fn open_transport(inner: &Inner) -> Result<WsReceiver, EdgexError> {
    let mut request = inner.url.as_str().into_client_request()?;
    if let Some(private) = &inner.private {
        let auth = private.authenticator.sign("GET", &private.path_and_query)?;
        for (name, value) in auth.to_pairs() {
            let name = HeaderName::try_from(name)
                .map_err(|e| EdgexError::Format(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| EdgexError::Format(format!("invalid header value: {e}")))?;
            request.headers_mut().insert(name, value);
        }
    }

    tracing::info!(url = %inner.url, private = inner.private.is_some(), "connecting WebSocket");
    let (stream, _) = connect_async(request)
        .await
        .map_err(|e| EdgexError::Transport(format!("failed to connect to {}: {}", inner.url, e)))?;
    let (mut sink, receiver) = stream.split();

    // Hold the sink until the replay is written so nothing overtakes it.
    let mut guard = inner.sink.lock().await;
    let replay = {
        let mut shared = lock(&inner.shared);
        if shared.state == SessionState::Connecting {
            shared.state = SessionState::Open;
            Some(shared.subscriptions.clone())
        } else {
            None
        }
    };
    let Some(replay) = replay else {
        let _ = sink.close().await;
        return Err(EdgexError::Transport(
            "connection attempt was cancelled".to_string(),
        ));
    };

    for sub in &replay {
        if let Err(err) = send_on(&mut sink, &SubscribeRequest::new(&sub.channel, &sub.params)).await
        {
            lock(&inner.shared).state = SessionState::Connecting;
            return Err(err);
        }
    }
    *guard = Some(sink);
    drop(guard);

    tracing::info!(url = %inner.url, replayed = replay.len(), "WebSocket connected");

    let hooks = lock(&inner.callbacks).open_hooks();
    for hook in hooks {
        hook();
    }
    Ok(receiver)
}

/// Event loop: read frames, send heartbeats, reconnect when configured.
async fn drive(inner: Arc<Inner>, mut receiver: WsReceiver) {
    let mut attempts: u32 = 0;
    loop {
        let error = read_loop(&inner, &mut receiver).await;
        if !connection_lost(&inner, &error).await {
            return;
        }

        loop {
            if !inner.config.should_reconnect(attempts) {
                return;
            }
            {
                let mut shared = lock(&inner.shared);
                if shared.state != SessionState::Disconnected {
                    // A caller connected or closed in the meantime.
                    return;
                }
                shared.state = SessionState::Connecting;
            }

            let delay = inner.config.backoff_with_jitter(attempts);
            attempts += 1;
            tracing::info!(attempt = attempts, ?delay, "reconnecting WebSocket");
            tokio::time::sleep(delay).await;

            match open_transport(&inner).await {
                Ok(next) => {
                    receiver = next;
                    attempts = 0;
                    break;
                }
                Err(err) => {
                    tracing::warn!(attempt = attempts, error = %err, "reconnect failed");
                    mark_disconnected(&inner, &err).await;
                }
            }
        }
    }
}

/// Process frames until the connection ends; returns why it ended.
async fn read_loop(inner: &Inner, receiver: &mut WsReceiver) -> EdgexError {
    let period = inner.config.ping_interval;
    let mut heartbeat = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if let Err(err) = send_json(inner, &PingRequest::default()).await {
                    return err;
                }
                tracing::trace!("sent heartbeat");
            }
            frame = receiver.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => handle_text(inner, text.as_str()).await,
                Some(Ok(WsMessage::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => handle_text(inner, text).await,
                    Err(e) => tracing::warn!("Dropping non UTF-8 binary frame: {}", e),
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                        .unwrap_or((CLOSE_NO_STATUS, String::new()));
                    return EdgexError::ConnectionClosed { code, reason };
                }
                // Protocol ping/pong is answered by tungstenite.
                Some(Ok(_)) => {}
                Some(Err(e)) => return EdgexError::Transport(e.to_string()),
                None => {
                    return EdgexError::ConnectionClosed {
                        code: CLOSE_ABNORMAL,
                        reason: "stream ended".to_string(),
                    };
                }
            }
        }
    }
}

async fn handle_text(inner: &Inner, text: &str) {
    let message = match InboundMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Failed to parse WebSocket message: {}", e);
            return;
        }
    };

    if message.is_pong() {
        tracing::trace!("received heartbeat reply");
        return;
    }
    if message.is_ping() {
        if let Err(err) = send_json(inner, &PongReply::to_ping(&message.value)).await {
            tracing::warn!(error = %err, "failed to answer server ping");
        }
        return;
    }

    let (hooks, handler) = lock(&inner.callbacks).route(&message);
    for hook in &hooks {
        hook(&message);
    }
    match handler {
        Some(handler) => handler(&message),
        None => tracing::debug!(
            message_type = message.message_type(),
            channel = message.channel(),
            "no handler for message"
        ),
    }
}

/// Tear down after an unexpected loss. Returns false if the session was
/// already being closed by the caller.
async fn connection_lost(inner: &Inner, error: &EdgexError) -> bool {
    inner.sink.lock().await.take();
    {
        let mut shared = lock(&inner.shared);
        if shared.state != SessionState::Open {
            return false;
        }
        shared.state = SessionState::Disconnected;
    }
    tracing::warn!(url = %inner.url, error = %error, "WebSocket connection lost");
    notify_disconnect(inner, error);
    true
}

/// Undo a failed `Connecting` attempt and report `error` to the disconnect
/// hooks. Does nothing if the caller closed the session meanwhile.
async fn mark_disconnected(inner: &Inner, error: &EdgexError) {
    inner.sink.lock().await.take();
    {
        let mut shared = lock(&inner.shared);
        if shared.state != SessionState::Connecting {
            return;
        }
        shared.state = SessionState::Disconnected;
    }
    notify_disconnect(inner, error);
}

fn notify_disconnect(inner: &Inner, error: &EdgexError) {
    let hooks = lock(&inner.callbacks).disconnect_hooks();
    for hook in hooks {
        hook(error);
    }
}

async fn send_json<T: Serialize>(inner: &Inner, msg: &T) -> Result<(), EdgexError> {
    let mut guard = inner.sink.lock().await;
    let sink = guard
        .as_mut()
        .ok_or_else(|| EdgexError::Transport("WebSocket is not open".to_string()))?;
    send_on(sink, msg).await
}

async fn send_on<T: Serialize>(sink: &mut WsSink, msg: &T) -> Result<(), EdgexError> {
    let json = serde_json::to_string(msg)?;
    tracing::debug!(frame = %json, "sending WebSocket frame");
    sink.send(WsMessage::Text(json.into()))
        .await
        .map_err(|e| EdgexError::Transport(format!("Failed to send message: {}", e)))
}
