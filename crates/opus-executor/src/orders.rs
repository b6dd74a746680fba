//! Bracket-order protocol.
//!
//! Entry first, protective legs second: a market entry, then a
//! reduce-only stop-market and take-profit-market on the opposite side
//! closing the full quantity. If the entry fails nothing else is placed;
//! if a protective leg fails the caller must emergency-close, because a
//! naked position is worse than a missed trade.

use crate::notify::Notifier;
use opus_connectors_binance::{ExchangeClient, OrderInfo, OrderRequest};
use opus_models::{OrderType, Price, Quantity, Side, Symbol};
use thiserror::Error;

/// Minimum venue notional per order, USD.
pub const MIN_NOTIONAL_USD: f64 = 100.0;

/// Hard ceiling on a single order's notional, USD. A breach means the
/// sizing inputs are corrupt (bad price feed), not that the strategy got
/// ambitious.
pub const MAX_NOTIONAL_USD: f64 = 600.0;

#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    #[error("order notional ${notional_usd:.2} exceeds safety cap ${MAX_NOTIONAL_USD:.0}")]
    SafetyLimitExceeded { notional_usd: f64 },
    #[error("quantity rounds to zero at price {price}")]
    DegenerateQuantity { price: f64 },
}

/// Outcome of one bracket attempt. Missing legs are the caller's problem
/// to repair.
#[derive(Debug, Default)]
pub struct BracketResult {
    pub entry: Option<OrderInfo>,
    pub stop_loss: Option<OrderInfo>,
    pub take_profit: Option<OrderInfo>,
}

impl BracketResult {
    /// Entry filled and both protective legs acknowledged.
    pub fn is_complete(&self) -> bool {
        self.entry.is_some() && self.stop_loss.is_some() && self.take_profit.is_some()
    }

    /// Entry filled but a protective leg is missing.
    pub fn is_naked(&self) -> bool {
        self.entry.is_some() && (self.stop_loss.is_none() || self.take_profit.is_none())
    }
}

/// Quantity step for the venue's tiered lot rules, by price magnitude.
fn qty_step(price: f64) -> f64 {
    if price >= 10_000.0 {
        0.001
    } else if price >= 1_000.0 {
        0.01
    } else if price >= 100.0 {
        0.1
    } else if price >= 10.0 {
        1.0
    } else {
        10.0
    }
}

/// Floor to the instrument step, bumping up to the venue minimum notional
/// when the floored amount is too small to trade.
pub fn round_quantity(raw_qty: f64, price: f64) -> f64 {
    let step = qty_step(price);
    let mut qty = ((raw_qty / step) + 1e-9).floor() * step;
    if qty * price < MIN_NOTIONAL_USD {
        qty = (MIN_NOTIONAL_USD / price / step).ceil() * step;
    }
    qty
}

/// SL/TP trigger prices round to one decimal.
pub fn round_trigger_price(price: f64) -> f64 {
    (price * 10.0).round() / 10.0
}

/// Places brackets and hands out monotonically increasing client ids.
/// The counter survives across calls but not restarts.
#[derive(Debug, Default)]
pub struct OrderManager {
    order_counter: u64,
}

impl OrderManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_client_id(&mut self) -> String {
        self.order_counter += 1;
        format!("opus_{}", self.order_counter)
    }

    /// Place a plain market order.
    pub fn place_market_order(
        &mut self,
        client: &mut dyn ExchangeClient,
        symbol: Symbol,
        side: Side,
        quantity: Quantity,
    ) -> Option<OrderInfo> {
        let request =
            OrderRequest::market(symbol, side, quantity).with_client_id(self.next_client_id());
        client.place_order(&request)
    }

    /// Place entry + SL + TP. `raw_qty` is the un-rounded base quantity;
    /// `entry_price` is the reference price used for rounding tiers and
    /// the notional safety check.
    pub fn place_bracket(
        &mut self,
        client: &mut dyn ExchangeClient,
        notifier: &mut dyn Notifier,
        symbol: Symbol,
        side: Side,
        raw_qty: f64,
        entry_price: f64,
        sl_price: f64,
        tp_price: f64,
    ) -> Result<BracketResult, OrderError> {
        let qty = round_quantity(raw_qty, entry_price);
        if qty <= 0.0 {
            return Err(OrderError::DegenerateQuantity { price: entry_price });
        }

        let notional = qty * entry_price;
        if notional > MAX_NOTIONAL_USD {
            let err = OrderError::SafetyLimitExceeded {
                notional_usd: notional,
            };
            tracing::error!(%symbol, qty, entry_price, notional, "refusing oversized order");
            notifier.notify("SAFETY LIMIT", &err.to_string());
            return Err(err);
        }

        let quantity = Quantity::from_f64(qty);
        let mut result = BracketResult::default();

        tracing::info!(%symbol, side = side.as_str(), qty, entry_price, "placing bracket entry");
        result.entry = self.place_market_order(client, symbol, side, quantity);
        let Some(ref entry) = result.entry else {
            tracing::error!(%symbol, "bracket entry rejected, aborting");
            return Ok(result);
        };
        tracing::info!(order_id = entry.order_id, fill = entry.price.to_f64(), "entry placed");

        let close_side = side.opposite();

        let sl = Price::from_f64(round_trigger_price(sl_price));
        let sl_request = OrderRequest::conditional_close(
            symbol,
            close_side,
            OrderType::StopMarket,
            quantity,
            sl,
        )
        .with_client_id(format!("{}_SL", self.next_client_id()));
        result.stop_loss = client.place_order(&sl_request);
        if result.stop_loss.is_none() {
            tracing::error!(%symbol, stop = sl.to_f64(), "stop-loss placement failed");
        }

        let tp = Price::from_f64(round_trigger_price(tp_price));
        let tp_request = OrderRequest::conditional_close(
            symbol,
            close_side,
            OrderType::TakeProfitMarket,
            quantity,
            tp,
        )
        .with_client_id(format!("{}_TP", self.next_client_id()));
        result.take_profit = client.place_order(&tp_request);
        if result.take_profit.is_none() {
            tracing::error!(%symbol, target = tp.to_f64(), "take-profit placement failed");
        }

        Ok(result)
    }

    /// Flatten a position at market and sweep resting orders. Used when a
    /// protective leg could not be placed.
    pub fn emergency_close(
        &mut self,
        client: &mut dyn ExchangeClient,
        notifier: &mut dyn Notifier,
        symbol: Symbol,
        entry_side: Side,
        quantity: Quantity,
    ) -> bool {
        notifier.notify(
            "EMERGENCY CLOSE",
            &format!("flattening {symbol} after incomplete bracket"),
        );
        let mut request = OrderRequest::market(symbol, entry_side.opposite(), quantity)
            .with_client_id(self.next_client_id());
        request.reduce_only = true;
        let closed = client.place_order(&request).is_some();
        let swept = client.cancel_all_orders(symbol);
        if !closed {
            tracing::error!(%symbol, "emergency close order rejected");
        }
        closed && swept
    }
}
