//! # Opus Strategy
//!
//! Short-horizon pressure signals from L2 depth: a weighted order-book
//! imbalance smoothed with an EMA, and a hysteresis/cooldown filter that
//! turns the raw signal stream into a handful of high-conviction trade
//! intents.

pub mod filter;
pub mod obi;

pub use filter::{FilterStats, QualifiedSignal, SignalFilter, SignalFilterConfig};
pub use obi::{micro_price, weighted_imbalance, ObiConfig, ObiGenerator};
