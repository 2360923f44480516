//! Private REST API endpoints (authentication required).
//!
//! These endpoints require credentials to be configured on the client. The
//! account id in each path comes from those credentials; without them every
//! call fails with [`EdgexError::AuthConfiguration`] before any network I/O.

mod types;

pub use types::*;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::EdgexError;
use crate::rest::EdgexRestClient;
use crate::rest::endpoints::private;
use crate::rest::public::find_contract;

impl EdgexRestClient {
    // ========== Account ==========

    /// Get all open positions.
    pub async fn get_positions(&self) -> Result<Value, EdgexError> {
        let operation = "get positions";
        let account_id = self.require_account_id(operation)?;
        self.get(operation, &private::positions(account_id)).await
    }

    /// Get the position in one contract.
    pub async fn get_position_by_contract_id(&self, contract_id: &str) -> Result<Value, EdgexError> {
        let operation = "get position by contract id";
        let account_id = self.require_account_id(operation)?;
        self.get(operation, &private::position(account_id, contract_id))
            .await
    }

    /// Get position transaction history.
    pub async fn get_position_transactions(
        &self,
        request: &ContractHistoryRequest,
    ) -> Result<Value, EdgexError> {
        let operation = "get position transactions";
        let account_id = self.require_account_id(operation)?;
        self.get_with_params(operation, &private::position_transactions(account_id), request)
            .await
    }

    /// Get collateral transaction history.
    pub async fn get_collateral_transactions(
        &self,
        request: &HistoryRequest,
    ) -> Result<Value, EdgexError> {
        let operation = "get collateral transactions";
        let account_id = self.require_account_id(operation)?;
        self.get_with_params(operation, &private::collateral_transactions(account_id), request)
            .await
    }

    /// Get funding fee history.
    pub async fn get_funding_transactions(
        &self,
        request: &HistoryRequest,
    ) -> Result<Value, EdgexError> {
        let operation = "get funding transactions";
        let account_id = self.require_account_id(operation)?;
        self.get_with_params(operation, &private::funding_transactions(account_id), request)
            .await
    }

    // ========== Assets ==========

    /// Get the account's asset summary.
    pub async fn get_account_asset(&self) -> Result<Value, EdgexError> {
        let operation = "get account asset";
        let account_id = self.require_account_id(operation)?;
        self.get(operation, &private::account_asset(account_id)).await
    }

    /// Get one page of deposit, withdrawal, and transfer orders.
    pub async fn get_asset_orders(&self, request: &AssetOrdersRequest) -> Result<Value, EdgexError> {
        let operation = "get asset orders";
        let account_id = self.require_account_id(operation)?;
        self.get_with_params(operation, &private::asset_orders(account_id), request)
            .await
    }

    /// Get coin exchange rates.
    pub async fn get_coin_rate(&self, request: &CoinRateRequest) -> Result<Value, EdgexError> {
        let operation = "get coin rate";
        self.require_account_id(operation)?;
        self.get_with_params(operation, private::COIN_RATE, request)
            .await
    }

    /// Get the amount available for a normal withdrawal.
    pub async fn get_withdrawable_amount(
        &self,
        request: &WithdrawableAmountRequest,
    ) -> Result<Value, EdgexError> {
        let operation = "get withdrawable amount";
        self.require_account_id(operation)?;
        self.get_with_params(operation, private::WITHDRAWABLE_AMOUNT, request)
            .await
    }

    // ========== Orders ==========

    /// Create an order.
    ///
    /// Fetches the exchange metadata to price the fee from the contract's
    /// default taker fee rate. Use [`create_order_with_metadata`] to reuse
    /// metadata that is already at hand.
    ///
    /// [`create_order_with_metadata`]: EdgexRestClient::create_order_with_metadata
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use edgex_api_client::rest::EdgexRestClient;
    /// use edgex_api_client::rest::private::CreateOrderRequest;
    /// use edgex_api_client::auth::StaticCredentials;
    /// use edgex_api_client::types::OrderSide;
    /// use rust_decimal::Decimal;
    /// use std::sync::Arc;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let credentials = Arc::new(StaticCredentials::new(12345, "0x0123abcd"));
    ///     let client = EdgexRestClient::builder().credentials(credentials).build();
    ///
    ///     let order = CreateOrderRequest::limit(
    ///         "10000001",
    ///         OrderSide::Buy,
    ///         Decimal::new(1, 3),
    ///         Decimal::new(50000, 0),
    ///     );
    ///     let result = client.create_order(&order).await?;
    ///     println!("Order: {}", result);
    ///     Ok(())
    /// }
    /// ```
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Value, EdgexError> {
        self.require_account_id("create order")?;
        let metadata = self.get_metadata().await?;
        self.create_order_with_metadata(request, &metadata).await
    }

    /// Create an order using previously fetched metadata.
    pub async fn create_order_with_metadata(
        &self,
        request: &CreateOrderRequest,
        metadata: &Value,
    ) -> Result<Value, EdgexError> {
        let operation = "create order";
        let account_id = self.require_account_id(operation)?;

        let contract = find_contract(metadata, &request.contract_id)?;
        let fee_rate = match contract.get("defaultTakerFeeRate").and_then(Value::as_str) {
            Some(rate) => rate.parse::<Decimal>().map_err(|e| {
                EdgexError::InvalidResponse(format!("invalid taker fee rate {rate:?}: {e}"))
            })?,
            None => Decimal::ZERO,
        };

        let body = CreateOrderBody {
            account_id,
            contract_id: request.contract_id.clone(),
            side: request.side,
            order_type: request.order_type,
            size: request.size,
            price: request.price,
            time_in_force: request.effective_time_in_force(),
            client_order_id: request
                .client_order_id
                .clone()
                .unwrap_or_else(generate_client_id),
            reduce_only: request.reduce_only,
            fee: order_fee(request.price, request.size, fee_rate),
        };

        tracing::debug!(
            contract_id = %body.contract_id,
            client_order_id = %body.client_order_id,
            "creating order"
        );

        self.post(operation, private::ORDERS, &body).await
    }

    /// Cancel an order by its exchange id.
    pub async fn cancel_order(&self, order_id: &str) -> Result<Value, EdgexError> {
        let operation = "cancel order";
        self.require_account_id(operation)?;
        self.delete(operation, &private::order(order_id)).await
    }

    /// Cancel an order by its client order id.
    pub async fn cancel_order_by_client_order_id(
        &self,
        client_order_id: &str,
    ) -> Result<Value, EdgexError> {
        let operation = "cancel order by client order id";
        self.require_account_id(operation)?;
        self.delete(operation, &private::order_by_client_order_id(client_order_id))
            .await
    }

    /// Get active (open) orders.
    pub async fn get_active_orders(&self, request: &ActiveOrdersRequest) -> Result<Value, EdgexError> {
        let operation = "get active orders";
        let account_id = self.require_account_id(operation)?;
        self.get_with_params(operation, &private::active_orders(account_id), request)
            .await
    }

    /// Get order fill history.
    pub async fn get_order_fill_transactions(
        &self,
        request: &ContractHistoryRequest,
    ) -> Result<Value, EdgexError> {
        let operation = "get order fill transactions";
        let account_id = self.require_account_id(operation)?;
        self.get_with_params(operation, &private::order_fills(account_id), request)
            .await
    }

    // ========== Transfers ==========

    /// Look up outbound transfers by id (comma-separated for several).
    pub async fn get_transfer_out_by_id(&self, transfer_id: &str) -> Result<Value, EdgexError> {
        let operation = "get transfer out by id";
        let account_id = self.require_account_id(operation)?;
        self.get_with_params(
            operation,
            &private::transfers_out(account_id),
            &TransferOutIdQuery {
                transfer_out_id_list: transfer_id,
            },
        )
        .await
    }

    /// Transfer collateral to another account.
    pub async fn create_transfer_out(&self, request: &TransferOutRequest) -> Result<Value, EdgexError> {
        let operation = "create transfer out";
        let account_id = self.require_account_id(operation)?;
        let body = TransferOutBody {
            coin_id: request.coin_id.clone(),
            amount: request.amount,
            to_account_id: request.to_account_id.clone(),
            client_transfer_id: request
                .client_transfer_id
                .clone()
                .unwrap_or_else(generate_client_id),
        };
        self.post(operation, &private::transfers_out(account_id), &body)
            .await
    }

    /// Get inbound transfer records.
    pub async fn get_transfer_in_records(&self, request: &HistoryRequest) -> Result<Value, EdgexError> {
        let operation = "get transfer in records";
        let account_id = self.require_account_id(operation)?;
        self.get_with_params(operation, &private::transfers_in(account_id), request)
            .await
    }

    /// Get outbound transfer records.
    pub async fn get_transfer_out_records(&self, request: &HistoryRequest) -> Result<Value, EdgexError> {
        let operation = "get transfer out records";
        let account_id = self.require_account_id(operation)?;
        self.get_with_params(operation, &private::transfers_out(account_id), request)
            .await
    }

    /// Get the amount of a coin available for transfer.
    pub async fn get_available_transfer_amount(&self, coin_id: &str) -> Result<Value, EdgexError> {
        let operation = "get available transfer amount";
        let account_id = self.require_account_id(operation)?;
        self.get_with_params(
            operation,
            &private::transfer_available_amount(account_id),
            &CoinIdQuery { coin_id },
        )
        .await
    }
}
