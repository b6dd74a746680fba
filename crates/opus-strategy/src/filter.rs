//! Hysteresis and cooldown qualification of raw imbalance signals.
//!
//! A raw signal fires on nearly every depth tick in a trending book; the
//! filter requires N consecutive confirming ticks (one tick at high
//! conviction), a sane spread, and a per-direction cooldown before a
//! signal qualifies.

use opus_models::Side;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalFilterConfig {
    /// Minimum |imbalance| worth considering.
    pub imbalance_threshold: f64,
    /// |imbalance| at or above this qualifies after a single tick.
    pub high_conviction_threshold: f64,
    /// Confirming ticks required below high conviction.
    pub confirmation_ticks: u32,
    /// Confirming ticks required at high conviction.
    pub high_conviction_ticks: u32,
    /// Minimum interval between same-direction signals.
    pub cooldown_ms: i64,
    /// Maximum acceptable spread, percent of mid.
    pub max_spread_pct: f64,
}

impl Default for SignalFilterConfig {
    fn default() -> Self {
        Self {
            imbalance_threshold: 0.6,
            high_conviction_threshold: 0.7,
            confirmation_ticks: 3,
            high_conviction_ticks: 1,
            cooldown_ms: 30_000,
            max_spread_pct: 0.05,
        }
    }
}

/// A signal that survived every gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualifiedSignal {
    pub side: Side,
    pub imbalance: f64,
    /// In [0.5, 1.0], scaled from how far past the threshold the
    /// imbalance sits.
    pub confidence: f64,
    pub high_conviction: bool,
}

/// Where each rejected tick died.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub raw_signals: u64,
    pub spread_filtered: u64,
    pub threshold_filtered: u64,
    pub confirmation_filtered: u64,
    pub cooldown_filtered: u64,
    pub qualified_signals: u64,
}

#[derive(Debug)]
pub struct SignalFilter {
    config: SignalFilterConfig,
    last_direction: Option<Side>,
    consecutive_ticks: u32,
    last_buy_ms: Option<i64>,
    last_sell_ms: Option<i64>,
    stats: FilterStats,
}

impl SignalFilter {
    pub fn new(config: SignalFilterConfig) -> Self {
        Self {
            config,
            last_direction: None,
            consecutive_ticks: 0,
            last_buy_ms: None,
            last_sell_ms: None,
            stats: FilterStats::default(),
        }
    }

    /// Run one tick through the gates. Gates short-circuit in order:
    /// spread, threshold, direction streak, confirmation, cooldown.
    /// Confirmation and cooldown failures keep the streak alive.
    pub fn apply(&mut self, imbalance: f64, spread_pct: f64, now_ms: i64) -> Option<QualifiedSignal> {
        self.stats.raw_signals += 1;

        if spread_pct > self.config.max_spread_pct {
            self.stats.spread_filtered += 1;
            self.consecutive_ticks = 0;
            return None;
        }

        let abs_imb = imbalance.abs();
        if abs_imb < self.config.imbalance_threshold {
            self.stats.threshold_filtered += 1;
            self.consecutive_ticks = 0;
            return None;
        }

        let direction = if imbalance > 0.0 { Side::Buy } else { Side::Sell };
        if self.last_direction != Some(direction) {
            self.consecutive_ticks = 0;
            self.last_direction = Some(direction);
        }
        self.consecutive_ticks += 1;

        let high_conviction = abs_imb >= self.config.high_conviction_threshold;
        let required = if high_conviction {
            self.config.high_conviction_ticks
        } else {
            self.config.confirmation_ticks
        };
        if self.consecutive_ticks < required {
            self.stats.confirmation_filtered += 1;
            return None;
        }

        let last_fire = match direction {
            Side::Buy => self.last_buy_ms,
            Side::Sell => self.last_sell_ms,
        };
        if let Some(t) = last_fire {
            if now_ms - t < self.config.cooldown_ms {
                self.stats.cooldown_filtered += 1;
                return None;
            }
        }

        match direction {
            Side::Buy => self.last_buy_ms = Some(now_ms),
            Side::Sell => self.last_sell_ms = Some(now_ms),
        }
        self.consecutive_ticks = 0;
        self.stats.qualified_signals += 1;

        Some(QualifiedSignal {
            side: direction,
            imbalance,
            confidence: self.confidence(abs_imb),
            high_conviction,
        })
    }

    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = FilterStats::default();
    }

    fn confidence(&self, abs_imb: f64) -> f64 {
        let threshold = self.config.imbalance_threshold;
        let normalized = (abs_imb - threshold) / (1.0 - threshold);
        (0.5 + 0.5 * normalized).clamp(0.5, 1.0)
    }
}
