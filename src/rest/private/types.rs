//! Request types for private REST endpoints.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::types::{OrderSide, OrderType, TimeInForce};

/// Decimal places of the fee sent with an order.
const FEE_DECIMALS: u32 = 6;

/// Time-ranged, paginated history query shared by most list endpoints.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    /// Start time in milliseconds.
    pub start_time: Option<u64>,
    /// End time in milliseconds.
    pub end_time: Option<u64>,
    /// Page size.
    pub size: Option<u32>,
    /// Pagination cursor from a previous page.
    pub offset_data: Option<String>,
}

impl HistoryRequest {
    /// Create an unfiltered request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a time range in milliseconds.
    pub fn range(mut self, start_time: u64, end_time: u64) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    /// Set the page size.
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Continue from a pagination cursor.
    pub fn offset_data(mut self, offset_data: impl Into<String>) -> Self {
        self.offset_data = Some(offset_data.into());
        self
    }
}

/// History query that can be narrowed to one contract.
///
/// Used for position transactions and order fills.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractHistoryRequest {
    /// Only include this contract.
    pub contract_id: Option<String>,
    /// Start time in milliseconds.
    pub start_time: Option<u64>,
    /// End time in milliseconds.
    pub end_time: Option<u64>,
    /// Page size.
    pub size: Option<u32>,
    /// Pagination cursor from a previous page.
    pub offset_data: Option<String>,
}

impl ContractHistoryRequest {
    /// Create a request for one contract.
    pub fn for_contract(contract_id: impl Into<String>) -> Self {
        Self {
            contract_id: Some(contract_id.into()),
            ..Self::default()
        }
    }

    /// Restrict to a time range in milliseconds.
    pub fn range(mut self, start_time: u64, end_time: u64) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    /// Set the page size.
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
}

/// Request parameters for deposit/withdraw/transfer orders.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOrdersRequest {
    /// Start time in milliseconds.
    pub start_time: Option<u64>,
    /// End time in milliseconds.
    pub end_time: Option<u64>,
    /// Chain filter.
    pub chain_id: Option<String>,
    /// Comma-separated order types.
    pub type_list: Option<String>,
    /// Page size.
    pub size: Option<u32>,
    /// Pagination cursor from a previous page.
    pub offset_data: Option<String>,
}

/// Request parameters for coin rates.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinRateRequest {
    /// Chain filter.
    pub chain_id: Option<String>,
    /// Coin filter.
    pub coin: Option<String>,
}

/// Request parameters for the normal withdrawable amount.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawableAmountRequest {
    /// Chain to withdraw to.
    pub chain_id: String,
    /// Coin to withdraw.
    pub coin: String,
}

impl WithdrawableAmountRequest {
    /// Create a request.
    pub fn new(chain_id: impl Into<String>, coin: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            coin: coin.into(),
        }
    }
}

/// Request parameters for active orders.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveOrdersRequest {
    /// Only include this contract.
    pub contract_id: Option<String>,
    /// Only include this side.
    pub side: Option<OrderSide>,
    /// Page size.
    pub size: Option<u32>,
    /// Pagination cursor from a previous page.
    pub offset_data: Option<String>,
}

/// Request to create an order.
///
/// # Example
///
/// ```rust
/// use edgex_api_client::rest::private::CreateOrderRequest;
/// use edgex_api_client::types::{OrderSide, TimeInForce};
/// use rust_decimal::Decimal;
///
/// let request = CreateOrderRequest::limit("10000001", OrderSide::Buy, Decimal::new(1, 2), Decimal::new(50000, 0))
///     .time_in_force(TimeInForce::FillOrKill)
///     .reduce_only(true);
/// assert!(request.reduce_only);
/// ```
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    /// Contract to trade.
    pub contract_id: String,
    /// Buy or sell.
    pub side: OrderSide,
    /// Limit or market.
    pub order_type: OrderType,
    /// Order size in contract units.
    pub size: Decimal,
    /// Limit price, or worst acceptable price for market orders.
    pub price: Decimal,
    /// Time in force; derived from the order type when absent.
    pub time_in_force: Option<TimeInForce>,
    /// Client order id; generated when absent.
    pub client_order_id: Option<String>,
    /// Only reduce an existing position.
    pub reduce_only: bool,
}

impl CreateOrderRequest {
    /// Create a limit order.
    pub fn limit(contract_id: impl Into<String>, side: OrderSide, size: Decimal, price: Decimal) -> Self {
        Self::new(contract_id, side, OrderType::Limit, size, price)
    }

    /// Create a market order with a protective price.
    pub fn market(contract_id: impl Into<String>, side: OrderSide, size: Decimal, price: Decimal) -> Self {
        Self::new(contract_id, side, OrderType::Market, size, price)
    }

    fn new(
        contract_id: impl Into<String>,
        side: OrderSide,
        order_type: OrderType,
        size: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            contract_id: contract_id.into(),
            side,
            order_type,
            size,
            price,
            time_in_force: None,
            client_order_id: None,
            reduce_only: false,
        }
    }

    /// Set the time in force.
    pub fn time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = Some(tif);
        self
    }

    /// Set the client order id.
    pub fn client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Set the reduce-only flag.
    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    /// Time in force that will be sent.
    pub fn effective_time_in_force(&self) -> TimeInForce {
        self.time_in_force
            .unwrap_or_else(|| self.order_type.default_time_in_force())
    }
}

/// Fee for an order of `size` at `price` with the given fee rate.
///
/// Rounded half away from zero to six decimal places, trailing zeros removed.
pub fn order_fee(price: Decimal, size: Decimal, fee_rate: Decimal) -> Decimal {
    (price * size * fee_rate)
        .round_dp_with_strategy(FEE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Body of `POST /api/v1/private/orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateOrderBody {
    pub account_id: u64,
    pub contract_id: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub size: Decimal,
    pub price: Decimal,
    pub time_in_force: TimeInForce,
    pub client_order_id: String,
    pub reduce_only: bool,
    pub fee: Decimal,
}

/// Request to transfer collateral to another account.
#[derive(Debug, Clone)]
pub struct TransferOutRequest {
    /// Coin to transfer.
    pub coin_id: String,
    /// Amount to transfer.
    pub amount: Decimal,
    /// Receiving account.
    pub to_account_id: String,
    /// Client transfer id; generated when absent.
    pub client_transfer_id: Option<String>,
}

impl TransferOutRequest {
    /// Create a transfer request.
    pub fn new(coin_id: impl Into<String>, amount: Decimal, to_account_id: impl Into<String>) -> Self {
        Self {
            coin_id: coin_id.into(),
            amount,
            to_account_id: to_account_id.into(),
            client_transfer_id: None,
        }
    }

    /// Set the client transfer id.
    pub fn client_transfer_id(mut self, id: impl Into<String>) -> Self {
        self.client_transfer_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransferOutBody {
    pub coin_id: String,
    pub amount: Decimal,
    pub to_account_id: String,
    pub client_transfer_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransferOutIdQuery<'a> {
    pub transfer_out_id_list: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CoinIdQuery<'a> {
    pub coin_id: &'a str,
}

/// Random version 4 UUID for client order and transfer ids.
pub fn generate_client_id() -> String {
    Uuid::new_v4().to_string()
}
