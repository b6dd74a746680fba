//! The exchange client contract consumed by the engine.

use crate::types::{AccountInfo, AccountTrade, OrderInfo, OrderRequest, PositionInfo};
use opus_models::{DepthUpdate, Symbol};

/// Fired on the ingest thread for every depth update.
pub type DepthCallback = Box<dyn FnMut(DepthUpdate) + Send>;

/// Fired on transport errors.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Fired after the stream (re)connects.
pub type ReconnectCallback = Box<dyn FnMut() + Send>;

/// Synchronous exchange operations plus stream subscription.
///
/// REST calls block the calling thread; the reactor accepts that inside
/// handlers. `place_order` returns `None` on rejection — transport detail
/// goes to the error callback, the caller only decides what to do without
/// the order.
pub trait ExchangeClient: Send {
    fn get_account_info(&mut self) -> Option<AccountInfo>;

    fn get_positions(&mut self) -> Vec<PositionInfo>;

    /// Most recent account trades for `symbol`, newest last.
    fn get_account_trades(&mut self, symbol: Symbol, limit: usize) -> Vec<AccountTrade>;

    fn place_order(&mut self, request: &OrderRequest) -> Option<OrderInfo>;

    fn cancel_order(&mut self, symbol: Symbol, order_id: i64) -> bool;

    fn cancel_all_orders(&mut self, symbol: Symbol) -> bool;

    fn set_leverage(&mut self, symbol: Symbol, leverage: u32) -> bool;

    /// Register the depth stream for `symbol`. The callback fires on the
    /// ingest thread; it must stay wait-free.
    fn subscribe_depth(&mut self, symbol: Symbol, callback: DepthCallback);

    fn start(&mut self);

    fn stop(&mut self);

    fn is_connected(&self) -> bool;

    fn on_reconnect(&mut self, callback: ReconnectCallback);

    fn on_ws_connect(&mut self, callback: ReconnectCallback);

    fn on_error(&mut self, callback: ErrorCallback);
}
