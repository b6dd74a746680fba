//! # Opus Binance Connector
//!
//! The exchange boundary. The engine binds against the [`ExchangeClient`]
//! trait; the live transport (REST signing, websocket reconnect, JSON
//! decoding) sits behind it and is not part of the strategy core. What
//! lives here:
//!
//! - the trait and its account/order/position types,
//! - the wire encoding of an [`OrderRequest`] into signed query
//!   parameters, including the algo-order routing for conditional types,
//! - HMAC-SHA256 request signing,
//! - a scriptable [`MockExchangeClient`] used by tests and replay mode.

pub mod auth;
pub mod client;
pub mod mock;
pub mod types;
pub mod wire;

pub use client::{DepthCallback, ErrorCallback, ExchangeClient, ReconnectCallback};
pub use mock::MockExchangeClient;
pub use types::{AccountInfo, AccountTrade, OrderInfo, OrderRequest, PositionInfo};
