//! Scriptable in-memory exchange.
//!
//! Stands in for the live venue in unit tests, integration tests, and
//! replay mode. Shares its state behind an `Arc` so a test can keep a
//! handle for scripting and inspection after the engine takes ownership
//! of the client.

use crate::client::{DepthCallback, ErrorCallback, ExchangeClient, ReconnectCallback};
use crate::types::{AccountInfo, AccountTrade, OrderInfo, OrderRequest, PositionInfo};
use opus_models::{DepthUpdate, OrderStatus, Price, Symbol};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    connected: bool,
    account: AccountInfo,
    positions: Vec<PositionInfo>,
    trades: HashMap<Symbol, Vec<AccountTrade>>,
    placed: Vec<OrderRequest>,
    cancelled_all: Vec<Symbol>,
    next_order_id: i64,
    /// Client-order-id substrings whose orders must fail.
    fail_matching: Vec<String>,
    /// Fill price stamped on accepted orders.
    fill_price: Price,
}

/// Shared-state mock implementing [`ExchangeClient`].
#[derive(Clone)]
pub struct MockExchangeClient {
    state: Arc<Mutex<MockState>>,
    depth_callback: Arc<Mutex<Option<DepthCallback>>>,
}

impl Default for MockExchangeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchangeClient {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                next_order_id: 1,
                fill_price: Price::from_f64(50_000.0),
                ..MockState::default()
            })),
            depth_callback: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle sharing the same state, for scripting and inspection.
    pub fn handle(&self) -> Self {
        self.clone()
    }

    pub fn set_account(&self, account: AccountInfo) {
        self.state.lock().unwrap().account = account;
    }

    pub fn set_positions(&self, positions: Vec<PositionInfo>) {
        self.state.lock().unwrap().positions = positions;
    }

    pub fn set_trades(&self, symbol: Symbol, trades: Vec<AccountTrade>) {
        self.state.lock().unwrap().trades.insert(symbol, trades);
    }

    pub fn set_fill_price(&self, price: Price) {
        self.state.lock().unwrap().fill_price = price;
    }

    /// Fail any order whose client id contains `pattern`.
    pub fn fail_orders_matching(&self, pattern: impl Into<String>) {
        self.state.lock().unwrap().fail_matching.push(pattern.into());
    }

    /// Every request accepted so far, in placement order.
    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.state.lock().unwrap().placed.clone()
    }

    pub fn cancelled_all_for(&self) -> Vec<Symbol> {
        self.state.lock().unwrap().cancelled_all.clone()
    }

    /// Drive the registered depth callback, as the ingest thread would.
    pub fn push_depth(&self, update: DepthUpdate) {
        if let Some(cb) = self.depth_callback.lock().unwrap().as_mut() {
            cb(update);
        }
    }
}

impl ExchangeClient for MockExchangeClient {
    fn get_account_info(&mut self) -> Option<AccountInfo> {
        Some(self.state.lock().unwrap().account.clone())
    }

    fn get_positions(&mut self) -> Vec<PositionInfo> {
        self.state.lock().unwrap().positions.clone()
    }

    fn get_account_trades(&mut self, symbol: Symbol, limit: usize) -> Vec<AccountTrade> {
        let state = self.state.lock().unwrap();
        let trades = state.trades.get(&symbol).cloned().unwrap_or_default();
        let skip = trades.len().saturating_sub(limit);
        trades[skip..].to_vec()
    }

    fn place_order(&mut self, request: &OrderRequest) -> Option<OrderInfo> {
        let mut state = self.state.lock().unwrap();

        let client_id = request.client_order_id.clone().unwrap_or_default();
        if state.fail_matching.iter().any(|p| client_id.contains(p)) {
            return None;
        }

        let order_id = state.next_order_id;
        state.next_order_id += 1;
        state.placed.push(request.clone());
        tracing::debug!(
            order_id,
            client_id = %client_id,
            order_type = ?request.order_type,
            "mock exchange accepted order"
        );

        let price = request
            .stop_price
            .filter(|p| p.is_valid())
            .unwrap_or(state.fill_price);

        Some(OrderInfo {
            order_id,
            client_order_id: client_id,
            symbol: request.symbol,
            side: request.side,
            order_type: request.order_type,
            status: OrderStatus::New,
            price,
            quantity: request.quantity,
            executed_qty: request.quantity,
            update_time_ms: 0,
        })
    }

    fn cancel_order(&mut self, _symbol: Symbol, _order_id: i64) -> bool {
        true
    }

    fn cancel_all_orders(&mut self, symbol: Symbol) -> bool {
        self.state.lock().unwrap().cancelled_all.push(symbol);
        true
    }

    fn set_leverage(&mut self, _symbol: Symbol, _leverage: u32) -> bool {
        true
    }

    fn subscribe_depth(&mut self, _symbol: Symbol, callback: DepthCallback) {
        *self.depth_callback.lock().unwrap() = Some(callback);
    }

    fn start(&mut self) {
        self.state.lock().unwrap().connected = true;
    }

    fn stop(&mut self) {
        self.state.lock().unwrap().connected = false;
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    fn on_reconnect(&mut self, _callback: ReconnectCallback) {}

    fn on_ws_connect(&mut self, _callback: ReconnectCallback) {}

    fn on_error(&mut self, _callback: ErrorCallback) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use opus_models::{PriceLevel, Quantity, Side};

    #[test]
    fn records_placed_orders_and_assigns_ids() {
        let mut client = MockExchangeClient::new();
        let req = OrderRequest::market(
            Symbol::new("BTCUSDT"),
            Side::Buy,
            Quantity::from_f64(0.002),
        )
        .with_client_id("opus_1");

        let first = client.place_order(&req).expect("accepted");
        let second = client.place_order(&req).expect("accepted");
        assert_eq!(first.order_id, 1);
        assert_eq!(second.order_id, 2);
        assert_eq!(client.placed_orders().len(), 2);
    }

    #[test]
    fn scripted_failures_by_client_id() {
        let mut client = MockExchangeClient::new();
        client.fail_orders_matching("_SL");

        let entry = OrderRequest::market(
            Symbol::new("BTCUSDT"),
            Side::Buy,
            Quantity::from_f64(0.002),
        )
        .with_client_id("opus_1");
        let sl = entry.clone().with_client_id("opus_1_SL");

        assert!(client.place_order(&entry).is_some());
        assert!(client.place_order(&sl).is_none());
        assert_eq!(client.placed_orders().len(), 1);
    }

    #[test]
    fn trade_history_respects_limit() {
        let client = MockExchangeClient::new();
        let symbol = Symbol::new("BTCUSDT");
        let trades: Vec<AccountTrade> = (0..10)
            .map(|i| AccountTrade {
                symbol,
                order_id: i,
                price: Price::from_f64(50_000.0),
                quantity: Quantity::from_f64(0.001),
                realized_pnl: i as f64,
                commission: 0.01,
                time_ms: 1_000 * i,
            })
            .collect();
        client.set_trades(symbol, trades);

        let mut c = client.handle();
        let last3 = c.get_account_trades(symbol, 3);
        assert_eq!(last3.len(), 3);
        assert_eq!(last3[0].order_id, 7);
        assert_eq!(last3[2].order_id, 9);
    }

    #[test]
    fn depth_callback_round_trip() {
        let mut client = MockExchangeClient::new();
        let handle = client.handle();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        client.subscribe_depth(
            Symbol::new("BTCUSDT"),
            Box::new(move |update| sink.lock().unwrap().push(update.last_update_id)),
        );

        handle.push_depth(DepthUpdate {
            symbol: Symbol::new("BTCUSDT"),
            last_update_id: 5,
            bids: vec![PriceLevel::new(
                Price::from_f64(50_000.0),
                Quantity::from_f64(1.0),
            )],
            asks: vec![],
            event_time_ms: 0,
        });

        assert_eq!(*received.lock().unwrap(), vec![5]);
    }
}
