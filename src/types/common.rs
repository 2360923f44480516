//! Common domain types for the edgeX API.

use serde::{Deserialize, Serialize};

/// Buy or sell side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type for trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Limit order - execute at specified price or better
    Limit,
    /// Market order - execute immediately at best available price
    Market,
}

impl OrderType {
    /// Time in force used when an order does not specify one.
    pub fn default_time_in_force(&self) -> TimeInForce {
        match self {
            OrderType::Market => TimeInForce::ImmediateOrCancel,
            OrderType::Limit => TimeInForce::GoodTilCancel,
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
        }
    }
}

/// Time in force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Good til canceled
    GoodTilCancel,
    /// Immediate or cancel - fill what's possible immediately, cancel rest
    ImmediateOrCancel,
    /// Fill the whole order immediately or cancel it
    FillOrKill,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_serde() {
        assert_eq!(serde_json::to_string(&OrderSide::Buy).unwrap(), r#""BUY""#);
        assert_eq!(
            serde_json::from_str::<OrderSide>(r#""SELL""#).unwrap(),
            OrderSide::Sell
        );
    }

    #[test]
    fn test_time_in_force_serde() {
        assert_eq!(
            serde_json::to_string(&TimeInForce::GoodTilCancel).unwrap(),
            r#""GOOD_TIL_CANCEL""#
        );
        assert_eq!(
            serde_json::from_str::<TimeInForce>(r#""FILL_OR_KILL""#).unwrap(),
            TimeInForce::FillOrKill
        );
    }

    #[test]
    fn test_default_time_in_force() {
        assert_eq!(
            OrderType::Market.default_time_in_force(),
            TimeInForce::ImmediateOrCancel
        );
        assert_eq!(
            OrderType::Limit.default_time_in_force(),
            TimeInForce::GoodTilCancel
        );
    }
}
