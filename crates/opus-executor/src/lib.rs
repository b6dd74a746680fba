//! # Opus Executor
//!
//! Order execution against the exchange boundary: the bracket-order
//! protocol (market entry plus reduce-only stop-loss and take-profit),
//! instrument-aware quantity rounding with a hard notional safety cap,
//! and the reconciliation loop that detects positions the exchange closed
//! for us.

pub mod notify;
pub mod orders;
pub mod reconcile;

pub use notify::{LogNotifier, Notifier};
pub use orders::{BracketResult, OrderError, OrderManager, MAX_NOTIONAL_USD, MIN_NOTIONAL_USD};
pub use reconcile::{PositionReconciler, TrackedPosition, DUST_QTY};
