//! Public REST API endpoints (no authentication required).
//!
//! Covers exchange metadata, market quotes, and funding rates. Responses are
//! returned as the envelope's `data` value.

mod types;

pub use types::*;

use serde_json::Value;

use crate::error::EdgexError;
use crate::rest::EdgexRestClient;
use crate::rest::endpoints::public;

impl EdgexRestClient {
    /// Get the server time.
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
    ///     println!("Server time: {}", time["timeMillis"]);
    ///     Ok(())
    /// }
    /// ```
    pub async fn get_server_time(&self) -> Result<Value, EdgexError> {
        self.get("get server time", public::TIME).await
    }

    /// Get exchange metadata: global config, coins, and contracts.
    pub async fn get_metadata(&self) -> Result<Value, EdgexError> {
        self.get("get metadata", public::METADATA).await
    }

    /// Get every contract listed in the metadata.
    pub async fn get_contracts(&self) -> Result<Vec<Value>, EdgexError> {
        let metadata = self.get_metadata().await?;
        contract_list(&metadata).map(|contracts| contracts.to_vec())
    }

    /// Get one contract from the metadata.
    ///
    /// Fails with [`EdgexError::InvalidResponse`] when the contract is not listed.
    pub async fn get_contract(&self, contract_id: &str) -> Result<Value, EdgexError> {
        let metadata = self.get_metadata().await?;
        find_contract(&metadata, contract_id).cloned()
    }

    /// Get K-line (candlestick) data.
    pub async fn get_kline(&self, request: &KlineRequest) -> Result<Value, EdgexError> {
        self.get_with_params("get kline", public::KLINE, request)
            .await
    }

    /// Get order book depth for a contract.
    pub async fn get_depth(&self, request: &DepthRequest) -> Result<Value, EdgexError> {
        self.get_with_params("get depth", public::DEPTH, request)
            .await
    }

    /// Get 24h ticker data, for one contract or all of them.
    pub async fn get_ticker(&self, request: &TickerRequest) -> Result<Value, EdgexError> {
        self.get_with_params("get ticker", public::TICKER, request)
            .await
    }

    /// Get recent trades for a contract.
    pub async fn get_trades(&self, request: &TradesRequest) -> Result<Value, EdgexError> {
        self.get_with_params("get trades", public::TRADES, request)
            .await
    }

    /// Get settled funding rate history for a contract.
    pub async fn get_funding_rate(&self, request: &FundingRateRequest) -> Result<Value, EdgexError> {
        self.get_with_params("get funding rate", public::FUNDING_RATE, request)
            .await
    }

    /// Get the latest funding rate for a contract.
    pub async fn get_latest_funding_rate(&self, contract_id: &str) -> Result<Value, EdgexError> {
        self.get_with_params(
            "get latest funding rate",
            public::LATEST_FUNDING_RATE,
            &LatestFundingRateRequest { contract_id },
        )
        .await
    }
}

/// The `contractList` array of a metadata value.
pub(crate) fn contract_list(metadata: &Value) -> Result<&[Value], EdgexError> {
    metadata
        .get("contractList")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            EdgexError::InvalidResponse("contract list not found in metadata".to_string())
        })
}

/// Look up a contract by id in a metadata value.
pub(crate) fn find_contract<'a>(
    metadata: &'a Value,
    contract_id: &str,
) -> Result<&'a Value, EdgexError> {
    contract_list(metadata)?
        .iter()
        .find(|contract| contract.get("contractId").and_then(Value::as_str) == Some(contract_id))
        .ok_or_else(|| EdgexError::InvalidResponse(format!("contract not found: {contract_id}")))
}
