//! Order-book imbalance.
//!
//! The imbalance is a scalar in [-1, +1]; +1 means overwhelming bid
//! pressure. Levels closer to the touch weigh more: level `i` of `n`
//! carries weight `1 - i/n`.

use opus_models::PriceLevel;
use serde::Deserialize;

/// Weighted imbalance over the top `levels` of both sides.
///
/// Returns 0 when either side is empty or total weighted volume is zero.
pub fn weighted_imbalance(bids: &[PriceLevel], asks: &[PriceLevel], levels: usize) -> f64 {
    if bids.is_empty() || asks.is_empty() || levels == 0 {
        return 0.0;
    }
    let n = levels.min(bids.len()).min(asks.len());

    let mut bid_volume = 0.0;
    let mut ask_volume = 0.0;
    for i in 0..n {
        let weight = 1.0 - (i as f64 / levels as f64);
        bid_volume += bids[i].quantity.to_f64() * weight;
        ask_volume += asks[i].quantity.to_f64() * weight;
    }

    let total = bid_volume + ask_volume;
    if total == 0.0 {
        return 0.0;
    }
    (bid_volume - ask_volume) / total
}

/// Volume-weighted mid of the touch. Price leans toward the thinner side.
pub fn micro_price(best_bid: &PriceLevel, best_ask: &PriceLevel) -> f64 {
    let bid_qty = best_bid.quantity.to_f64();
    let ask_qty = best_ask.quantity.to_f64();
    let bid = best_bid.price.to_f64();
    let ask = best_ask.price.to_f64();

    let total = bid_qty + ask_qty;
    if total == 0.0 {
        return (bid + ask) / 2.0;
    }
    (bid * ask_qty + ask * bid_qty) / total
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObiConfig {
    /// Book levels to weigh.
    pub depth_levels: usize,
    /// EMA period; `alpha = 2 / (period + 1)`.
    pub smoothing_period: u64,
}

impl Default for ObiConfig {
    fn default() -> Self {
        Self {
            depth_levels: 10,
            smoothing_period: 10,
        }
    }
}

/// EMA-smoothed imbalance tracker.
#[derive(Debug)]
pub struct ObiGenerator {
    config: ObiConfig,
    smoothed: f64,
    raw: f64,
    sample_count: u64,
}

impl ObiGenerator {
    pub fn new(config: ObiConfig) -> Self {
        Self {
            config,
            smoothed: 0.0,
            raw: 0.0,
            sample_count: 0,
        }
    }

    /// Fold one depth observation into the EMA. The first sample seeds the
    /// smoothed value.
    pub fn update(&mut self, bids: &[PriceLevel], asks: &[PriceLevel]) {
        let raw = weighted_imbalance(bids, asks, self.config.depth_levels);
        if self.sample_count == 0 {
            self.smoothed = raw;
        } else {
            let alpha = 2.0 / (self.config.smoothing_period as f64 + 1.0);
            self.smoothed = alpha * raw + (1.0 - alpha) * self.smoothed;
        }
        self.raw = raw;
        self.sample_count += 1;
    }

    pub fn raw(&self) -> f64 {
        self.raw
    }

    pub fn smoothed(&self) -> f64 {
        self.smoothed
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Enough samples for the EMA to mean something.
    pub fn is_ready(&self) -> bool {
        self.sample_count >= self.config.smoothing_period
    }

    pub fn reset(&mut self) {
        self.smoothed = 0.0;
        self.raw = 0.0;
        self.sample_count = 0;
    }
}
