//! Account, order, and position types for the exchange boundary.

use opus_models::{OrderStatus, OrderType, PositionSide, Price, Quantity, Side, Symbol, TimeInForce};
use serde::{Deserialize, Serialize};

/// Futures account summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub total_wallet_balance: f64,
    pub available_balance: f64,
    pub total_unrealized_profit: f64,
    pub total_margin_balance: f64,
}

/// An open position as reported by the exchange. The sign of the
/// quantity encodes the side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionInfo {
    pub symbol: Symbol,
    pub position_side: PositionSide,
    /// Positive long, negative short.
    pub signed_qty: f64,
    pub entry_price: f64,
    pub unrealized_pnl: f64,
    pub leverage: f64,
}

/// One fill from the account trade history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTrade {
    pub symbol: Symbol,
    pub order_id: i64,
    pub price: Price,
    pub quantity: Quantity,
    pub realized_pnl: f64,
    pub commission: f64,
    pub time_ms: i64,
}

/// A new-order request. Conditional types carry `stop_price`; the client
/// routes them to the venue's algo-order endpoint with a trigger price.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub position_side: PositionSide,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub quantity: Quantity,
    pub price: Option<Price>,
    pub stop_price: Option<Price>,
    pub client_order_id: Option<String>,
    pub reduce_only: bool,
    pub close_position: bool,
}

impl OrderRequest {
    /// Market order with the fields every request needs.
    pub fn market(symbol: Symbol, side: Side, quantity: Quantity) -> Self {
        Self {
            symbol,
            side,
            position_side: PositionSide::Both,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Gtc,
            quantity,
            price: None,
            stop_price: None,
            client_order_id: None,
            reduce_only: false,
            close_position: false,
        }
    }

    /// Reduce-only conditional order closing `quantity` when `stop_price`
    /// trades.
    pub fn conditional_close(
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        quantity: Quantity,
        stop_price: Price,
    ) -> Self {
        Self {
            order_type,
            stop_price: Some(stop_price),
            reduce_only: true,
            ..Self::market(symbol, side, quantity)
        }
    }

    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }
}

/// An acknowledged order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInfo {
    pub order_id: i64,
    pub client_order_id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub price: Price,
    pub quantity: Quantity,
    pub executed_qty: Quantity,
    pub update_time_ms: i64,
}
