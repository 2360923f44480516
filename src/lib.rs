//! # edgeX Client
//!
//! An async Rust client library for the edgeX perpetual exchange REST and
//! WebSocket APIs.
//!
//! ## Features
//!
//! - Public and private REST endpoints with Stark-curve request signing
//! - WebSocket market data and account streams with subscription replay
//! - Optional automatic reconnection with exponential backoff
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgex_api_client::EdgexClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EdgexClient::new();
//!     let time = client.rest().get_server_time().await?;
//!     println!("Server time: {}", time);
//!     Ok(())
//! }
//! ```

pub mod auth;
mod client;
pub mod error;
pub mod rest;
pub mod types;
pub mod ws;

// Re-export commonly used types at crate root
pub use client::{EdgexClient, EdgexClientBuilder};
pub use error::{ApiError, EdgexError};
pub use types::common::{OrderSide, OrderType, TimeInForce};

/// Result type alias using EdgexError
pub type Result<T> = std::result::Result<T, EdgexError>;
