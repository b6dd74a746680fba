//! # Opus Models
//!
//! Core type definitions shared by every crate in the engine.
//!
//! All prices and quantities use a fixed-point representation (`i64` raw
//! value with 8 implied decimal places) so that no floating-point
//! arithmetic touches the hot path after ingestion. Conversion to `f64`
//! exists only for display and for the exchange wire boundary.

pub mod clock;
pub mod fixed;
pub mod symbol;
pub mod types;

pub use clock::{epoch_day, now_ms, to_datetime};
pub use fixed::{parse_decimal_8, ParseDecimalError, Price, Quantity, SCALE};
pub use symbol::{Symbol, MAX_SYMBOL_LEN};
pub use types::{
    DepthUpdate, MarketTick, OrderStatus, OrderType, PositionSide, PriceLevel, Side, TimeInForce,
    MARKET_TICK_SIZE,
};
