//! Authentication module for the edgeX API.
//!
//! This module provides:
//! - Credential management with secure secret storage
//! - Timestamp sources for signed requests
//! - Stark-curve ECDSA signatures
//! - Request authentication headers shared by REST and WebSocket calls

mod authenticator;
mod clock;
mod credentials;
pub mod stark;

pub use authenticator::{
    ACCOUNT_ID_HEADER, AuthHeaders, PRIVATE_PATH_PREFIX, RequestAuthenticator, SIGNATURE_HEADER,
    TIMESTAMP_HEADER, is_private_path, signing_string,
};
pub use clock::{FixedClock, SystemClock, TimestampProvider};
pub use credentials::{Credentials, CredentialsProvider, EnvCredentials, StaticCredentials};
pub use stark::StarkSignature;
