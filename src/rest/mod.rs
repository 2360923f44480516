//! edgeX REST API client.
//!
//! [`EdgexRestClient`] exposes one method per endpoint, grouped into
//! [`public`] (metadata, quotes, funding rates) and [`private`] (account,
//! assets, orders, transfers). The generic [`EdgexRestClient::request`]
//! primitive is available for endpoints without a dedicated wrapper.
//!
//! ```rust,no_run
//! use edgex_api_client::rest::EdgexRestClient;
//! use edgex_api_client::rest::public::DepthRequest;
//!
//! # async fn run() -> Result<(), edgex_api_client::error::EdgexError> {
//! let client = EdgexRestClient::new();
//! let depth = client.get_depth(&DepthRequest::new("10000001").limit(15)).await?;
//! println!("{}", depth);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod endpoints;
pub mod private;
pub mod public;

pub use client::{EdgexRestClient, EdgexRestClientBuilder};
pub use endpoints::EDGEX_BASE_URL;
