//! edgeX WebSocket streams.
//!
//! A [`ChannelSession`] owns one connection (public market data or private
//! account updates), remembers its subscriptions and replays them whenever
//! the transport opens. [`StreamManager`] holds one session of each kind and
//! offers per-topic subscribe calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use edgex_api_client::ws::{StreamManager, WsConfig};
//! use edgex_api_client::auth::RequestAuthenticator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = StreamManager::new(
//!         "wss://quote.edgex.exchange",
//!         RequestAuthenticator::new(None),
//!         WsConfig::default(),
//!     );
//!
//!     manager.connect_public().await?;
//!     manager
//!         .subscribe_depth("10000001", |msg| println!("depth: {}", msg.raw))
//!         .await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     manager.close().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod handlers;
mod manager;
pub mod messages;
mod session;

pub use config::{WsConfig, WsConfigBuilder};
pub use handlers::{DisconnectHook, MessageHandler, OpenHook, RawMessageHook};
pub use manager::StreamManager;
pub use messages::{InboundMessage, channels};
pub use session::{ChannelSession, SessionState};
