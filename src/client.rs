//! Top-level edgeX client combining REST and WebSocket access.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{CredentialsProvider, StaticCredentials, TimestampProvider};
use crate::error::EdgexError;
use crate::rest::endpoints::{EDGEX_BASE_URL, ws::EDGEX_WS_URL};
use crate::rest::{EdgexRestClient, EdgexRestClientBuilder};
use crate::ws::{StreamManager, WsConfig};

/// The edgeX client.
///
/// Owns the credentials once and shares them between the REST client and the
/// stream manager.
///
/// # Example
///
/// ```rust,no_run
/// use edgex_api_client::EdgexClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = EdgexClient::builder()
///         .account_id(12345)
///         .stark_private_key("0x0123abcd")
///         .build()?;
///
///     let asset = client.rest().get_account_asset().await?;
///     println!("Asset: {}", asset);
///
///     client.ws().connect_private().await?;
///     client
///         .ws()
///         .subscribe_order(|msg| println!("order: {}", msg.raw))
///         .await?;
///     Ok(())
/// }
/// ```
pub struct EdgexClient {
    rest: EdgexRestClient,
    ws: StreamManager,
}

impl EdgexClient {
    /// Create a client without credentials (public endpoints only).
    pub fn new() -> Self {
        Self::with_parts(EdgexRestClient::new(), EDGEX_WS_URL, WsConfig::default())
    }

    /// Create a new builder.
    pub fn builder() -> EdgexClientBuilder {
        EdgexClientBuilder::new()
    }

    fn with_parts(rest: EdgexRestClient, ws_base_url: &str, ws_config: WsConfig) -> Self {
        let ws = StreamManager::new(ws_base_url, rest.authenticator().clone(), ws_config);
        Self { rest, ws }
    }

    /// The REST client.
    pub fn rest(&self) -> &EdgexRestClient {
        &self.rest
    }

    /// The stream manager.
    pub fn ws(&self) -> &StreamManager {
        &self.ws
    }

    /// The configured account id, if any.
    pub fn account_id(&self) -> Option<u64> {
        self.rest.authenticator().account_id()
    }
}

impl Default for EdgexClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EdgexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgexClient")
            .field("rest", &self.rest)
            .field("ws", &self.ws)
            .finish()
    }
}

/// Builder for [`EdgexClient`].
#[derive(Default)]
pub struct EdgexClientBuilder {
    base_url: Option<String>,
    ws_base_url: Option<String>,
    account_id: Option<u64>,
    stark_private_key: Option<String>,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    ws_config: Option<WsConfig>,
    timestamp_provider: Option<Arc<dyn TimestampProvider>>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl EdgexClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the REST base URL.
    ///
    /// Unless [`ws_base_url`](Self::ws_base_url) is also set, the stream URL
    /// is derived from it (`https` becomes `wss`, `http` becomes `ws`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the WebSocket base URL.
    pub fn ws_base_url(mut self, url: impl Into<String>) -> Self {
        self.ws_base_url = Some(url.into());
        self
    }

    /// Set the account id. Requires [`stark_private_key`](Self::stark_private_key).
    pub fn account_id(mut self, account_id: u64) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Set the hex encoded Stark private key. Requires [`account_id`](Self::account_id).
    pub fn stark_private_key(mut self, key: impl Into<String>) -> Self {
        self.stark_private_key = Some(key.into());
        self
    }

    /// Use a credentials provider instead of an account id and key.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the WebSocket session configuration.
    pub fn ws_config(mut self, config: WsConfig) -> Self {
        self.ws_config = Some(config);
        self
    }

    /// Set a custom timestamp provider.
    pub fn timestamp_provider(mut self, provider: Arc<dyn TimestampProvider>) -> Self {
        self.timestamp_provider = Some(provider);
        self
    }

    /// Set a custom user agent for REST requests.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the REST request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// Fails with [`EdgexError::AuthConfiguration`] when only one of account
    /// id and private key is given, or when both they and a provider are.
    pub fn build(self) -> Result<EdgexClient, EdgexError> {
        let credentials = self.resolve_credentials()?;
        let ws_base_url = match (&self.ws_base_url, &self.base_url) {
            (Some(ws), _) => ws.clone(),
            (None, Some(rest)) => derive_ws_url(rest),
            (None, None) => EDGEX_WS_URL.to_string(),
        };

        let mut rest = EdgexRestClientBuilder::new()
            .base_url(self.base_url.unwrap_or_else(|| EDGEX_BASE_URL.to_string()));
        if let Some(credentials) = credentials {
            rest = rest.credentials(credentials);
        }
        if let Some(provider) = self.timestamp_provider {
            rest = rest.timestamp_provider(provider);
        }
        if let Some(user_agent) = self.user_agent {
            rest = rest.user_agent(user_agent);
        }
        if let Some(timeout) = self.timeout {
            rest = rest.timeout(timeout);
        }

        Ok(EdgexClient::with_parts(
            rest.build(),
            &ws_base_url,
            self.ws_config.unwrap_or_default(),
        ))
    }

    fn resolve_credentials(&self) -> Result<Option<Arc<dyn CredentialsProvider>>, EdgexError> {
        match (self.account_id, &self.stark_private_key, &self.credentials) {
            (None, None, provider) => Ok(provider.clone()),
            (Some(account_id), Some(key), None) => {
                Ok(Some(Arc::new(StaticCredentials::new(account_id, key.clone()))))
            }
            (Some(_), Some(_), Some(_)) => Err(EdgexError::AuthConfiguration(
                "set either account id and private key or a credentials provider, not both"
                    .to_string(),
            )),
            (Some(_), None, _) => Err(EdgexError::AuthConfiguration(
                "account id was set without a Stark private key".to_string(),
            )),
            (None, Some(_), _) => Err(EdgexError::AuthConfiguration(
                "Stark private key was set without an account id".to_string(),
            )),
        }
    }
}

/// Swap an HTTP scheme for the matching WebSocket scheme.
fn derive_ws_url(rest_url: &str) -> String {
    let rest_url = rest_url.trim_end_matches('/');
    if let Some(rest) = rest_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = rest_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        rest_url.to_string()
    }
}
