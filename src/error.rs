//! Error types for the edgeX client library.

use thiserror::Error;

/// The main error type for all edgeX client operations.
#[derive(Error, Debug)]
pub enum EdgexError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// The remote API answered with a non-success envelope code.
    #[error("edgeX API error: {0}")]
    Api(ApiError),

    /// Malformed signing input (bad hex, out-of-range scalar, ...).
    #[error("Format error: {0}")]
    Format(String),

    /// A private call was attempted without an account id or private key.
    #[error("Authentication not configured: {0}")]
    AuthConfiguration(String),

    /// A stream operation was issued before the matching connect call.
    #[error("Not connected: call {connect_call}() first")]
    NotConnected {
        /// Name of the connect call that is missing.
        connect_call: &'static str,
    },

    /// Socket or connection failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// WebSocket connection closed.
    #[error("WebSocket connection closed: {code} {reason}")]
    ConnectionClosed {
        /// Close code sent by the peer (1005 when none was given).
        code: u16,
        /// Close reason sent by the peer.
        reason: String,
    },

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl EdgexError {
    /// Returns the API error if this is a domain-level failure.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Check if this error came from the transport rather than the API.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::ConnectionClosed { .. }
                | Self::WebSocket(_)
                | Self::Http(_)
                | Self::HttpMiddleware(_)
        )
    }
}

/// Envelope code reported by edgeX for a failed request.
///
/// Carries the name of the client operation that produced it so callers get
/// an actionable message without extra wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The envelope `code` (anything other than `SUCCESS`).
    pub code: String,
    /// The envelope `msg`, or an empty string when the API sent none.
    pub message: String,
    /// Client operation that issued the request (e.g. "get positions").
    pub operation: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "failed to {}: {}", self.operation, self.code)
        } else {
            write!(f, "failed to {}: {}: {}", self.operation, self.code, self.message)
        }
    }
}

impl ApiError {
    /// Create a new API error.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            operation: operation.into(),
        }
    }

    /// Check if the failure was a signature rejection.
    pub fn is_invalid_signature(&self) -> bool {
        self.code == error_codes::INVALID_SIGNATURE
    }

    /// Check if the request timestamp was rejected as stale.
    pub fn is_invalid_timestamp(&self) -> bool {
        self.code == error_codes::INVALID_TIMESTAMP
    }
}

/// Envelope codes that are useful for pattern matching.
pub mod error_codes {
    /// Successful response.
    pub const SUCCESS: &str = "SUCCESS";
    /// Signature did not verify.
    pub const INVALID_SIGNATURE: &str = "INVALID_SIGNATURE";
    /// Timestamp outside the accepted window.
    pub const INVALID_TIMESTAMP: &str = "INVALID_TIMESTAMP";
    /// Caller is not allowed to access the account.
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
}
