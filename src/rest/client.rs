//! edgeX REST API client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::{CredentialsProvider, RequestAuthenticator, SystemClock, TimestampProvider};
use crate::error::{ApiError, EdgexError, error_codes};
use crate::rest::endpoints::EDGEX_BASE_URL;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The edgeX REST API client.
///
/// Every request goes through a [`RequestAuthenticator`]: all requests get a
/// timestamp header, and requests to `/api/v1/private/` paths are signed with
/// the account's Stark key.
///
/// # Example
///
/// ```rust,no_run
/// use edgex_api_client::rest::EdgexRestClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = EdgexRestClient::new();
///     let time = client.get_server_time().await?;
///     println!("Server time: {}", time);
///     Ok(())
/// }
/// ```
///
/// For private endpoints, provide credentials:
///
/// ```rust,no_run
/// use edgex_api_client::rest::EdgexRestClient;
/// use edgex_api_client::auth::StaticCredentials;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let credentials = Arc::new(StaticCredentials::new(12345, "0x0123abcd"));
///     let client = EdgexRestClient::builder()
///         .credentials(credentials)
///         .build();
///
///     let positions = client.get_positions().await?;
///     println!("Positions: {}", positions);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct EdgexRestClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    authenticator: RequestAuthenticator,
}

/// Serializes to an empty query string.
#[derive(Serialize)]
struct NoParams {}

impl EdgexRestClient {
    /// Create a new client with default settings.
    ///
    /// This client can only access public endpoints.
    /// Use [`EdgexRestClient::builder()`] to configure credentials for private endpoints.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> EdgexRestClientBuilder {
        EdgexRestClientBuilder::new()
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The authenticator applied to every request.
    pub fn authenticator(&self) -> &RequestAuthenticator {
        &self.authenticator
    }

    /// Account id from the configured credentials.
    ///
    /// Fails with [`EdgexError::AuthConfiguration`] when no credentials are set.
    pub(crate) fn require_account_id(&self, operation: &str) -> Result<u64, EdgexError> {
        self.authenticator.account_id().ok_or_else(|| {
            EdgexError::AuthConfiguration(format!("account id is required to {operation}"))
        })
    }

    /// Send a request and unwrap the response envelope.
    ///
    /// `operation` names the call in errors (e.g. "get positions"). The query
    /// is URL-encoded, the body (if any) is sent as JSON, and the request is
    /// authenticated against the final URL path.
    pub async fn request<T, Q, B>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        query: &Q,
        body: Option<&B>,
    ) -> Result<T, EdgexError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let query_string = serde_urlencoded::to_string(query)
            .map_err(|e| EdgexError::Format(format!("invalid query for {operation}: {e}")))?;

        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query_string.is_empty() {
            url.set_query(Some(&query_string));
        }

        let auth = self.authenticator.authenticate(method.as_str(), url.path())?;

        tracing::debug!(
            operation,
            method = %method,
            path = url.path(),
            signed = auth.is_signed(),
            "sending edgeX request"
        );

        let mut request = self.http_client.request(method, url);
        for (name, value) in auth.to_pairs() {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            let json = serde_json::to_string(body)?;
            request = request.header(CONTENT_TYPE, "application/json").body(json);
        }

        let response = request.send().await?;
        self.parse_response(operation, response).await
    }

    /// Make a GET request without parameters.
    pub async fn get<T>(&self, operation: &str, path: &str) -> Result<T, EdgexError>
    where
        T: DeserializeOwned,
    {
        self.request(operation, Method::GET, path, &NoParams {}, None::<&NoParams>)
            .await
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_params<T, Q>(
        &self,
        operation: &str,
        path: &str,
        params: &Q,
    ) -> Result<T, EdgexError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.request(operation, Method::GET, path, params, None::<&NoParams>)
            .await
    }

    /// Make a POST request with a JSON body.
    pub async fn post<T, B>(&self, operation: &str, path: &str, body: &B) -> Result<T, EdgexError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(operation, Method::POST, path, &NoParams {}, Some(body))
            .await
    }

    /// Make a DELETE request.
    pub async fn delete<T>(&self, operation: &str, path: &str) -> Result<T, EdgexError>
    where
        T: DeserializeOwned,
    {
        self.request(operation, Method::DELETE, path, &NoParams {}, None::<&NoParams>)
            .await
    }

    /// Parse a response envelope from the edgeX API.
    async fn parse_response<T>(
        &self,
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T, EdgexError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(EdgexError::InvalidResponse(format!(
                    "Failed to parse response: {}. Body: {}",
                    e, body
                )));
            }
            Err(_) => {
                return Err(EdgexError::InvalidResponse(format!("HTTP {}: {}", status, body)));
            }
        };

        if envelope.code != error_codes::SUCCESS {
            tracing::warn!(
                operation,
                code = %envelope.code,
                error_param = ?envelope.error_param,
                "edgeX request failed"
            );
            return Err(EdgexError::Api(ApiError::new(
                envelope.code,
                envelope.msg.unwrap_or_default(),
                operation,
            )));
        }

        if !status.is_success() {
            return Err(EdgexError::InvalidResponse(format!("HTTP {}: {}", status, body)));
        }

        serde_json::from_value(envelope.data.unwrap_or(serde_json::Value::Null)).map_err(|e| {
            EdgexError::InvalidResponse(format!("Unexpected data for {}: {}", operation, e))
        })
    }
}

impl Default for EdgexRestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EdgexRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgexRestClient")
            .field("base_url", &self.base_url)
            .field("has_credentials", &self.authenticator.has_credentials())
            .finish()
    }
}

/// Builder for [`EdgexRestClient`].
pub struct EdgexRestClientBuilder {
    base_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    timestamp_provider: Option<Arc<dyn TimestampProvider>>,
    user_agent: Option<String>,
    timeout: Duration,
}

impl EdgexRestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: EDGEX_BASE_URL.to_string(),
            credentials: None,
            timestamp_provider: None,
            user_agent: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the credentials provider for authenticated requests.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom timestamp provider.
    pub fn timestamp_provider(mut self, provider: Arc<dyn TimestampProvider>) -> Self {
        self.timestamp_provider = Some(provider);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> EdgexRestClient {
        // Build default headers.
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("edgex-api-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("edgex-api-client"));
        headers.insert(USER_AGENT, header_value);

        // Build the HTTP client with middleware.
        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        let clock = self
            .timestamp_provider
            .unwrap_or_else(|| Arc::new(SystemClock::new()));

        EdgexRestClient {
            http_client: client,
            base_url: self.base_url,
            authenticator: RequestAuthenticator::with_clock(self.credentials, clock),
        }
    }
}

impl Default for EdgexRestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Response envelope shared by every edgeX endpoint.
#[derive(Debug, serde::Deserialize)]
struct Envelope {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default, rename = "errorParam")]
    error_param: Option<serde_json::Value>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}
