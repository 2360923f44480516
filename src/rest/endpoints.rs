//! edgeX REST API endpoint constants.
//!
//! Private paths that embed the account id are built with the helper
//! functions in [`private`].

/// Base URL for the edgeX REST API.
pub const EDGEX_BASE_URL: &str = "https://pro.edgex.exchange";

/// Public endpoints (no authentication required).
pub mod public {
    /// Get server time.
    pub const TIME: &str = "/api/v1/public/time";
    /// Get exchange metadata (contracts, coins, global config).
    pub const METADATA: &str = "/api/v1/public/metadata";
    /// Get K-line data.
    pub const KLINE: &str = "/api/v1/public/kline";
    /// Get order book depth.
    pub const DEPTH: &str = "/api/v1/public/depth";
    /// Get 24h ticker.
    pub const TICKER: &str = "/api/v1/public/ticker";
    /// Get recent trades.
    pub const TRADES: &str = "/api/v1/public/trades";
    /// Get funding rate history.
    pub const FUNDING_RATE: &str = "/api/v1/public/funding-rate";
    /// Get the latest funding rate.
    pub const LATEST_FUNDING_RATE: &str = "/api/v1/public/funding/getLatestFundingRate";
}

/// Private endpoints (authentication required).
pub mod private {
    /// Create an order.
    pub const ORDERS: &str = "/api/v1/private/orders";
    /// Coin exchange rate.
    pub const COIN_RATE: &str = "/api/v1/private/assets/coin-rate";
    /// Amount available for a normal withdrawal.
    pub const WITHDRAWABLE_AMOUNT: &str = "/api/v1/private/assets/withdraw/normal/available-amount";

    /// Open positions of an account.
    pub fn positions(account_id: u64) -> String {
        format!("/api/v1/private/accounts/{account_id}/positions")
    }

    /// Position of an account in one contract.
    pub fn position(account_id: u64, contract_id: &str) -> String {
        format!("/api/v1/private/accounts/{account_id}/positions/{contract_id}")
    }

    /// Position transaction history.
    pub fn position_transactions(account_id: u64) -> String {
        format!("/api/v1/private/accounts/{account_id}/position-transactions")
    }

    /// Collateral transaction history.
    pub fn collateral_transactions(account_id: u64) -> String {
        format!("/api/v1/private/accounts/{account_id}/collateral-transactions")
    }

    /// Funding fee history.
    pub fn funding_transactions(account_id: u64) -> String {
        format!("/api/v1/private/accounts/{account_id}/funding-transactions")
    }

    /// Account asset summary.
    pub fn account_asset(account_id: u64) -> String {
        format!("/api/v1/private/assets/{account_id}")
    }

    /// Deposit/withdraw/transfer orders of an account.
    pub fn asset_orders(account_id: u64) -> String {
        format!("/api/v1/private/assets/orders/{account_id}")
    }

    /// Cancel an order by exchange id.
    pub fn order(order_id: &str) -> String {
        format!("/api/v1/private/orders/{order_id}")
    }

    /// Cancel an order by client order id.
    pub fn order_by_client_order_id(client_order_id: &str) -> String {
        format!("/api/v1/private/orders/client-order-id/{client_order_id}")
    }

    /// Active orders of an account.
    pub fn active_orders(account_id: u64) -> String {
        format!("/api/v1/private/orders/active/{account_id}")
    }

    /// Fill history of an account.
    pub fn order_fills(account_id: u64) -> String {
        format!("/api/v1/private/orders/fills/{account_id}")
    }

    /// Outbound transfers (create, look up, list).
    pub fn transfers_out(account_id: u64) -> String {
        format!("/api/v1/private/transfers/{account_id}/out")
    }

    /// Inbound transfer records.
    pub fn transfers_in(account_id: u64) -> String {
        format!("/api/v1/private/transfers/{account_id}/in")
    }

    /// Amount available for transfer.
    pub fn transfer_available_amount(account_id: u64) -> String {
        format!("/api/v1/private/transfers/{account_id}/available-amount")
    }
}

/// WebSocket endpoints.
pub mod ws {
    /// Base URL for the edgeX WebSocket API.
    pub const EDGEX_WS_URL: &str = "wss://quote.edgex.exchange";
    /// Public market data stream.
    pub const PUBLIC_PATH: &str = "/api/v1/public/ws";
    /// Private account stream (without the `accountId` query).
    pub const PRIVATE_PATH: &str = "/api/v1/private/ws";

    /// Private stream path including the account query, as signed.
    pub fn private_path_and_query(account_id: u64) -> String {
        format!("{PRIVATE_PATH}?accountId={account_id}")
    }
}
