//! Request authentication for edgeX REST and WebSocket calls.
//!
//! Every request carries a timestamp header. Requests to private paths are
//! also signed:
//!
//! ```text
//! content   = timestamp + METHOD + path        (no query, no body)
//! hash      = Keccak-256(content)
//! signature = StarkECDSA(private_key, hash)
//! ```
//!
//! ## Headers
//!
//! - `X-edgeX-Api-Timestamp`: milliseconds since the UNIX epoch (always)
//! - `X-edgeX-Api-Signature`: `r` followed by `s`, hex (private only)
//! - `X-edgeX-Api-AccountId`: decimal account id (private only)

use std::sync::Arc;

use crate::auth::stark;
use crate::auth::{CredentialsProvider, SystemClock, TimestampProvider};
use crate::error::EdgexError;

/// Header carrying the request timestamp.
pub const TIMESTAMP_HEADER: &str = "X-edgeX-Api-Timestamp";
/// Header carrying the Stark signature.
pub const SIGNATURE_HEADER: &str = "X-edgeX-Api-Signature";
/// Header carrying the account id.
pub const ACCOUNT_ID_HEADER: &str = "X-edgeX-Api-AccountId";

/// Path fragment that marks an endpoint as private.
pub const PRIVATE_PATH_PREFIX: &str = "/api/v1/private/";

/// Check if a path belongs to a private endpoint.
pub fn is_private_path(path: &str) -> bool {
    path.contains(PRIVATE_PATH_PREFIX)
}

/// Build the content that gets hashed and signed.
///
/// The method is uppercased; the path is used verbatim.
pub fn signing_string(timestamp_ms: u64, method: &str, path: &str) -> String {
    format!("{}{}{}", timestamp_ms, method.to_ascii_uppercase(), path)
}

/// Authentication headers for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    /// Timestamp used for the request, in milliseconds.
    pub timestamp_ms: u64,
    /// `r || s` signature, present for signed requests.
    pub signature: Option<String>,
    /// Account id, present for signed requests.
    pub account_id: Option<u64>,
}

impl AuthHeaders {
    /// Check if the headers include a signature.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Header name/value pairs, timestamp first.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(TIMESTAMP_HEADER, self.timestamp_ms.to_string())];
        if let Some(signature) = &self.signature {
            pairs.push((SIGNATURE_HEADER, signature.clone()));
        }
        if let Some(account_id) = self.account_id {
            pairs.push((ACCOUNT_ID_HEADER, account_id.to_string()));
        }
        pairs
    }
}

/// Computes authentication headers for outbound requests.
///
/// Holds the shared credentials (if any) and the timestamp source. Cloning
/// is cheap; both are reference counted.
#[derive(Clone)]
pub struct RequestAuthenticator {
    credentials: Option<Arc<dyn CredentialsProvider>>,
    clock: Arc<dyn TimestampProvider>,
}

impl RequestAuthenticator {
    /// Create an authenticator using the system clock.
    pub fn new(credentials: Option<Arc<dyn CredentialsProvider>>) -> Self {
        Self::with_clock(credentials, Arc::new(SystemClock::new()))
    }

    /// Create an authenticator with a custom timestamp source.
    pub fn with_clock(
        credentials: Option<Arc<dyn CredentialsProvider>>,
        clock: Arc<dyn TimestampProvider>,
    ) -> Self {
        Self { credentials, clock }
    }

    /// Check if credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// The configured account id, if any.
    pub fn account_id(&self) -> Option<u64> {
        self.credentials
            .as_ref()
            .map(|c| c.get_credentials().account_id)
    }

    /// Headers for a request to `path`.
    ///
    /// Public paths get only a timestamp. Private paths are signed and fail
    /// with [`EdgexError::AuthConfiguration`] when no credentials are set.
    pub fn authenticate(&self, method: &str, path: &str) -> Result<AuthHeaders, EdgexError> {
        if is_private_path(path) {
            self.sign(method, path)
        } else {
            Ok(AuthHeaders {
                timestamp_ms: self.clock.now_millis(),
                signature: None,
                account_id: None,
            })
        }
    }

    /// Sign `method` + `path` unconditionally.
    ///
    /// `path` is signed as given, so callers that need a query string in the
    /// signed content (the private WebSocket upgrade) pass it here.
    pub fn sign(&self, method: &str, path: &str) -> Result<AuthHeaders, EdgexError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| {
                EdgexError::AuthConfiguration(format!(
                    "account id and Stark private key are required for {path}"
                ))
            })?
            .get_credentials();

        let timestamp_ms = self.clock.now_millis();
        let content = signing_string(timestamp_ms, method, path);
        let hash = stark::message_hash(&content);
        let signature = stark::sign(credentials.expose_secret(), &hash)?;

        tracing::trace!(%content, "signed request");

        Ok(AuthHeaders {
            timestamp_ms,
            signature: Some(signature.to_header_value()),
            account_id: Some(credentials.account_id),
        })
    }
}

impl std::fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}
