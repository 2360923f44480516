//! Request types for public REST endpoints.

use serde::Serialize;
use serde_with::skip_serializing_none;

/// Request parameters for K-line data.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KlineRequest {
    /// Contract to query.
    pub contract_id: String,
    /// Candle interval (e.g. "1m", "5m", "1h").
    pub interval: String,
    /// Start time in milliseconds.
    pub start_time: Option<u64>,
    /// End time in milliseconds.
    pub end_time: Option<u64>,
    /// Maximum number of candles.
    pub limit: Option<u32>,
}

impl KlineRequest {
    /// Create a request for a contract and interval.
    pub fn new(contract_id: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            interval: interval.into(),
            start_time: None,
            end_time: None,
            limit: None,
        }
    }

    /// Restrict to a time range in milliseconds.
    pub fn range(mut self, start_time: u64, end_time: u64) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    /// Set the maximum number of candles.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Request parameters for order book depth.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthRequest {
    /// Contract to query.
    pub contract_id: String,
    /// Number of levels per side.
    pub limit: Option<u32>,
}

impl DepthRequest {
    /// Create a request for a contract.
    pub fn new(contract_id: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            limit: None,
        }
    }

    /// Set the number of levels per side.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Request parameters for the ticker.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerRequest {
    /// Contract to query; all contracts when absent.
    pub contract_id: Option<String>,
}

impl TickerRequest {
    /// Create a request for one contract.
    pub fn for_contract(contract_id: impl Into<String>) -> Self {
        Self {
            contract_id: Some(contract_id.into()),
        }
    }
}

/// Request parameters for recent trades.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesRequest {
    /// Contract to query.
    pub contract_id: String,
    /// Maximum number of trades.
    pub limit: Option<u32>,
}

impl TradesRequest {
    /// Create a request for a contract.
    pub fn new(contract_id: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            limit: None,
        }
    }

    /// Set the maximum number of trades.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Request parameters for funding rate history.
///
/// Only settlement funding rates are returned.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateRequest {
    /// Contract to query.
    pub contract_id: String,
    /// Always `true`; the API mixes in forecast rates otherwise.
    filter_settlement_funding_rate: bool,
    /// Page size.
    pub size: Option<u32>,
    /// Pagination cursor from a previous page.
    #[serde(rename = "offsetData")]
    pub offset: Option<String>,
    /// Inclusive start time in milliseconds.
    #[serde(rename = "filterBeginTimeInclusive")]
    pub from: Option<u64>,
    /// Exclusive end time in milliseconds.
    #[serde(rename = "filterEndTimeExclusive")]
    pub to: Option<u64>,
}

impl FundingRateRequest {
    /// Create a request for a contract.
    pub fn new(contract_id: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            filter_settlement_funding_rate: true,
            size: None,
            offset: None,
            from: None,
            to: None,
        }
    }

    /// Restrict to `[from, to)` in milliseconds.
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Set the page size.
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Continue from a pagination cursor.
    pub fn offset(mut self, offset: impl Into<String>) -> Self {
        self.offset = Some(offset.into());
        self
    }
}

/// Request parameters for the latest funding rate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LatestFundingRateRequest<'a> {
    pub contract_id: &'a str,
}
