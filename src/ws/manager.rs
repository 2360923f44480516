//! Topic-level API over one public and one private session.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::auth::RequestAuthenticator;
use crate::error::EdgexError;
use crate::ws::config::WsConfig;
use crate::ws::messages::{InboundMessage, channels};
use crate::ws::session::ChannelSession;

/// Owns the public and private [`ChannelSession`]s and maps topic
/// subscriptions onto them.
///
/// Sessions are created by [`connect_public`] and [`connect_private`]. Topic
/// operations fail with [`EdgexError::NotConnected`] until the matching
/// connect call has been made.
///
/// # Example
///
/// ```rust,no_run
/// use edgex_api_client::EdgexClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = EdgexClient::builder().build()?;
///     let ws = client.ws();
///
///     ws.connect_public().await?;
///     ws.subscribe_market_ticker("10000001", |msg| {
///         println!("ticker: {}", msg.raw);
///     })
///     .await?;
///     Ok(())
/// }
/// ```
///
/// [`connect_public`]: StreamManager::connect_public
/// [`connect_private`]: StreamManager::connect_private
pub struct StreamManager {
    ws_base_url: String,
    authenticator: RequestAuthenticator,
    config: WsConfig,
    public: Mutex<Option<ChannelSession>>,
    private: Mutex<Option<ChannelSession>>,
}

impl StreamManager {
    /// Create a manager; no connection is made until a connect call.
    pub fn new(
        ws_base_url: impl Into<String>,
        authenticator: RequestAuthenticator,
        config: WsConfig,
    ) -> Self {
        Self {
            ws_base_url: ws_base_url.into(),
            authenticator,
            config,
            public: Mutex::new(None),
            private: Mutex::new(None),
        }
    }

    /// Open the public market data session.
    ///
    /// Does nothing when the session is already open. A session that lost its
    /// transport is reconnected and replays its subscriptions.
    pub async fn connect_public(&self) -> Result<(), EdgexError> {
        let (session, created) = {
            let mut slot = lock(&self.public);
            match slot.as_ref() {
                Some(session) => (session.clone(), false),
                None => {
                    let session = ChannelSession::public(&self.ws_base_url, self.config.clone());
                    *slot = Some(session.clone());
                    (session, true)
                }
            }
        };
        connect_or_discard(&self.public, session, created).await
    }

    /// Open the private account session.
    ///
    /// Fails with [`EdgexError::AuthConfiguration`] when no credentials are
    /// configured.
    pub async fn connect_private(&self) -> Result<(), EdgexError> {
        let (session, created) = {
            let mut slot = lock(&self.private);
            match slot.as_ref() {
                Some(session) => (session.clone(), false),
                None => {
                    let session = ChannelSession::private(
                        &self.ws_base_url,
                        self.authenticator.clone(),
                        self.config.clone(),
                    )?;
                    *slot = Some(session.clone());
                    (session, true)
                }
            }
        };
        connect_or_discard(&self.private, session, created).await
    }

    /// Subscribe to `ticker.<contract_id>`; `handler` receives `ticker` messages.
    pub async fn subscribe_market_ticker<F>(
        &self,
        contract_id: &str,
        handler: F,
    ) -> Result<(), EdgexError>
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let session = self.require_public()?;
        session.on_message(channels::TICKER, handler);
        session.subscribe(channels::ticker(contract_id), None).await
    }

    /// Subscribe to last-price K-lines of `contract_id` at `interval`.
    pub async fn subscribe_kline<F>(
        &self,
        contract_id: &str,
        interval: &str,
        handler: F,
    ) -> Result<(), EdgexError>
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let session = self.require_public()?;
        session.on_message(channels::KLINE, handler);
        session
            .subscribe(channels::kline(contract_id, interval), None)
            .await
    }

    /// Subscribe to order book depth of `contract_id`.
    pub async fn subscribe_depth<F>(&self, contract_id: &str, handler: F) -> Result<(), EdgexError>
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let session = self.require_public()?;
        session.on_message(channels::DEPTH, handler);
        session.subscribe(channels::depth(contract_id), None).await
    }

    /// Subscribe to public trades of `contract_id`.
    pub async fn subscribe_trade<F>(&self, contract_id: &str, handler: F) -> Result<(), EdgexError>
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let session = self.require_public()?;
        session.on_message(channels::TRADE, handler);
        session.subscribe(channels::trade(contract_id), None).await
    }

    /// Subscribe to account updates.
    pub async fn subscribe_account<F>(&self, handler: F) -> Result<(), EdgexError>
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.subscribe_private_topic(channels::ACCOUNT, handler)
            .await
    }

    /// Subscribe to position updates.
    pub async fn subscribe_position<F>(&self, handler: F) -> Result<(), EdgexError>
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.subscribe_private_topic(channels::POSITION, handler)
            .await
    }

    /// Subscribe to order updates.
    pub async fn subscribe_order<F>(&self, handler: F) -> Result<(), EdgexError>
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.subscribe_private_topic(channels::ORDER, handler)
            .await
    }

    async fn subscribe_private_topic<F>(&self, topic: &str, handler: F) -> Result<(), EdgexError>
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let session = self.require_private()?;
        session.on_message(topic, handler);
        session.subscribe(topic, None).await
    }

    /// Stop receiving `ticker.<contract_id>`.
    pub async fn unsubscribe_market_ticker(&self, contract_id: &str) -> Result<(), EdgexError> {
        self.require_public()?
            .unsubscribe(&channels::ticker(contract_id))
            .await
    }

    /// Stop receiving K-lines of `contract_id` at `interval`.
    pub async fn unsubscribe_kline(&self, contract_id: &str, interval: &str) -> Result<(), EdgexError> {
        self.require_public()?
            .unsubscribe(&channels::kline(contract_id, interval))
            .await
    }

    /// Stop receiving depth of `contract_id`.
    pub async fn unsubscribe_depth(&self, contract_id: &str) -> Result<(), EdgexError> {
        self.require_public()?
            .unsubscribe(&channels::depth(contract_id))
            .await
    }

    /// Stop receiving trades of `contract_id`.
    pub async fn unsubscribe_trade(&self, contract_id: &str) -> Result<(), EdgexError> {
        self.require_public()?
            .unsubscribe(&channels::trade(contract_id))
            .await
    }

    /// Stop receiving account updates.
    pub async fn unsubscribe_account(&self) -> Result<(), EdgexError> {
        self.require_private()?.unsubscribe(channels::ACCOUNT).await
    }

    /// Stop receiving position updates.
    pub async fn unsubscribe_position(&self) -> Result<(), EdgexError> {
        self.require_private()?.unsubscribe(channels::POSITION).await
    }

    /// Stop receiving order updates.
    pub async fn unsubscribe_order(&self) -> Result<(), EdgexError> {
        self.require_private()?.unsubscribe(channels::ORDER).await
    }

    /// The public session, if [`connect_public`](Self::connect_public) was called.
    pub fn public_session(&self) -> Option<ChannelSession> {
        lock(&self.public).clone()
    }

    /// The private session, if [`connect_private`](Self::connect_private) was called.
    pub fn private_session(&self) -> Option<ChannelSession> {
        lock(&self.private).clone()
    }

    /// Close and discard both sessions.
    ///
    /// Later connect calls start fresh sessions with no subscriptions.
    pub async fn close(&self) -> Result<(), EdgexError> {
        let public = lock(&self.public).take();
        let private = lock(&self.private).take();
        for session in [public, private].into_iter().flatten() {
            session.close().await?;
        }
        Ok(())
    }

    fn require_public(&self) -> Result<ChannelSession, EdgexError> {
        lock(&self.public).clone().ok_or(EdgexError::NotConnected {
            connect_call: "connect_public",
        })
    }

    fn require_private(&self) -> Result<ChannelSession, EdgexError> {
        lock(&self.private).clone().ok_or(EdgexError::NotConnected {
            connect_call: "connect_private",
        })
    }
}

impl std::fmt::Debug for StreamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamManager")
            .field("ws_base_url", &self.ws_base_url)
            .field("public", &lock(&self.public).is_some())
            .field("private", &lock(&self.private).is_some())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connect `session`; a freshly created session that fails is dropped again.
async fn connect_or_discard(
    slot: &Mutex<Option<ChannelSession>>,
    session: ChannelSession,
    created: bool,
) -> Result<(), EdgexError> {
    if let Err(err) = session.connect().await {
        if created {
            let mut slot = lock(slot);
            if slot.as_ref().is_some_and(|current| current.same_session(&session)) {
                *slot = None;
            }
        }
        return Err(err);
    }
    Ok(())
}
