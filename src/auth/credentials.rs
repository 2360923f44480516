//! Credential management for edgeX API authentication.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Default environment variable holding the account id.
pub const ACCOUNT_ID_VAR: &str = "EDGEX_ACCOUNT_ID";
/// Default environment variable holding the Stark private key.
pub const PRIVATE_KEY_VAR: &str = "EDGEX_STARK_PRIVATE_KEY";

/// Account credentials: the numeric account id and its Stark private key.
#[derive(Clone)]
pub struct Credentials {
    /// The edgeX account id (public identifier)
    pub account_id: u64,
    /// Hex encoded Stark private key, used for signing
    stark_private_key: SecretString,
}

impl Credentials {
    /// Create new credentials from an account id and hex private key.
    pub fn new(account_id: u64, stark_private_key: impl Into<String>) -> Self {
        Self {
            account_id,
            stark_private_key: SecretString::from(stark_private_key.into()),
        }
    }

    /// Get the Stark private key for signing.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_secret(&self) -> &str {
        self.stark_private_key.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("stark_private_key", &"[REDACTED]")
            .finish()
    }
}

/// Trait for providing account credentials.
///
/// Implement this trait to customize how credentials are retrieved,
/// for example from a secrets manager or environment variables.
pub trait CredentialsProvider: Send + Sync {
    /// Get the credentials.
    fn get_credentials(&self) -> &Credentials;
}

/// Static credentials provider that holds credentials directly.
#[derive(Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Create a new static credentials provider.
    pub fn new(account_id: u64, stark_private_key: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(account_id, stark_private_key),
        }
    }
}

impl From<Credentials> for StaticCredentials {
    fn from(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl CredentialsProvider for Arc<StaticCredentials> {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Credentials provider that reads from environment variables.
///
/// By default, reads from `EDGEX_ACCOUNT_ID` and `EDGEX_STARK_PRIVATE_KEY`.
pub struct EnvCredentials {
    credentials: Credentials,
}

impl EnvCredentials {
    /// Try to create credentials from default environment variables.
    ///
    /// Returns `None` if either variable is missing or the account id is not
    /// a decimal integer.
    pub fn try_from_env() -> Option<Self> {
        Self::try_from_env_vars(ACCOUNT_ID_VAR, PRIVATE_KEY_VAR)
    }

    /// Try to create credentials from custom environment variable names.
    pub fn try_from_env_vars(account_var: &str, key_var: &str) -> Option<Self> {
        let account_id = std::env::var(account_var).ok()?.trim().parse().ok()?;
        let private_key = std::env::var(key_var).ok()?;

        Some(Self {
            credentials: Credentials::new(account_id, private_key),
        })
    }
}

impl CredentialsProvider for EnvCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}
