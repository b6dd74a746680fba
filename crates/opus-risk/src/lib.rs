//! # Opus Risk
//!
//! Pre-trade checks with hard limits. Whatever the configuration file
//! says, the constructor clamps it into the bounds in [`limits`]; a typo
//! in a YAML file must never be able to widen the stop or the position
//! size past them.

use serde::Deserialize;

/// Hard bounds applied over any configuration.
pub mod limits {
    /// Stop-loss can never be tighter than fees plus slippage allow.
    pub const MIN_STOP_LOSS_PCT: f64 = 0.20;
    /// Absolute cap on position size.
    pub const MAX_POSITION_USD: f64 = 500.0;
    /// Orders can never be closer together than this.
    pub const MIN_ORDER_INTERVAL_MS: i64 = 10_000;
    /// Absolute cap on trades per day.
    pub const MAX_DAILY_TRADES: u32 = 20;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub max_position_usd: f64,
    pub max_open_positions: u32,
    pub min_order_interval_ms: i64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub max_daily_loss_usd: f64,
    pub max_daily_trades: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_usd: 100.0,
            max_open_positions: 1,
            min_order_interval_ms: 30_000,
            // Covers round-trip taker fees with buffer.
            stop_loss_pct: 0.25,
            // 2:1 reward-to-risk.
            take_profit_pct: 0.50,
            max_daily_loss_usd: 50.0,
            max_daily_trades: limits::MAX_DAILY_TRADES,
        }
    }
}

impl RiskConfig {
    fn clamped(mut self) -> Self {
        self.stop_loss_pct = self.stop_loss_pct.max(limits::MIN_STOP_LOSS_PCT);
        self.max_position_usd = self.max_position_usd.min(limits::MAX_POSITION_USD);
        self.min_order_interval_ms = self
            .min_order_interval_ms
            .max(limits::MIN_ORDER_INTERVAL_MS);
        self.max_daily_trades = self.max_daily_trades.min(limits::MAX_DAILY_TRADES);
        self
    }
}

/// Why a trade was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    DailyLoss,
    MaxTrades,
    PositionLimit,
    Cooldown,
}

/// Outcome of a pre-trade evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeDecision {
    Approved {
        size_usd: f64,
        stop_loss: f64,
        take_profit: f64,
    },
    Rejected {
        kind: RejectKind,
        reason: String,
    },
}

impl TradeDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, TradeDecision::Approved { .. })
    }
}

/// Stateful risk gate. Lives on the reactor thread; all mutation flows
/// through the order-placed / position-closed callbacks.
#[derive(Debug)]
pub struct RiskGate {
    config: RiskConfig,
    open_positions: u32,
    daily_trades: u32,
    daily_pnl: f64,
    last_order_ms: Option<i64>,
}

impl RiskGate {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config: config.clamped(),
            open_positions: 0,
            daily_trades: 0,
            daily_pnl: 0.0,
            last_order_ms: None,
        }
    }

    /// Checks run in order: daily loss, daily trades, open positions,
    /// cooldown. On approval the position is sized at the configured
    /// maximum and SL/TP are derived from the entry price.
    pub fn evaluate(&self, entry_price: f64, is_long: bool, now_ms: i64) -> TradeDecision {
        if self.daily_pnl <= -self.config.max_daily_loss_usd {
            return TradeDecision::Rejected {
                kind: RejectKind::DailyLoss,
                reason: format!("daily loss limit reached: ${:.2}", -self.daily_pnl),
            };
        }

        if self.daily_trades >= self.config.max_daily_trades {
            return TradeDecision::Rejected {
                kind: RejectKind::MaxTrades,
                reason: format!("max daily trades reached: {}", self.daily_trades),
            };
        }

        if self.open_positions >= self.config.max_open_positions {
            return TradeDecision::Rejected {
                kind: RejectKind::PositionLimit,
                reason: format!("max open positions: {}", self.open_positions),
            };
        }

        if let Some(last) = self.last_order_ms {
            let elapsed = now_ms - last;
            if elapsed < self.config.min_order_interval_ms {
                let remaining_s = (self.config.min_order_interval_ms - elapsed) / 1000;
                return TradeDecision::Rejected {
                    kind: RejectKind::Cooldown,
                    reason: format!("cooldown active: {remaining_s}s remaining"),
                };
            }
        }

        let sl_offset = entry_price * (self.config.stop_loss_pct / 100.0);
        let tp_offset = entry_price * (self.config.take_profit_pct / 100.0);
        let (stop_loss, take_profit) = if is_long {
            (entry_price - sl_offset, entry_price + tp_offset)
        } else {
            (entry_price + sl_offset, entry_price - tp_offset)
        };

        TradeDecision::Approved {
            size_usd: self.config.max_position_usd,
            stop_loss,
            take_profit,
        }
    }

    pub fn on_order_placed(&mut self, now_ms: i64) {
        self.last_order_ms = Some(now_ms);
        self.open_positions += 1;
        self.daily_trades += 1;
    }

    pub fn on_position_closed(&mut self, pnl: f64) {
        self.open_positions = self.open_positions.saturating_sub(1);
        self.daily_pnl += pnl;
    }

    pub fn reset_daily(&mut self) {
        self.daily_pnl = 0.0;
        self.daily_trades = 0;
    }

    pub fn daily_pnl(&self) -> f64 {
        self.daily_pnl
    }

    pub fn daily_trades(&self) -> u32 {
        self.daily_trades
    }

    pub fn open_positions(&self) -> u32 {
        self.open_positions
    }

    /// Effective configuration after clamping.
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn hard_floors_survive_hostile_config() {
        let gate = RiskGate::new(RiskConfig {
            max_position_usd: 100_000.0,
            stop_loss_pct: 0.01,
            min_order_interval_ms: 0,
            max_daily_trades: 10_000,
            ..RiskConfig::default()
        });
        let cfg = gate.config();
        assert_eq!(cfg.stop_loss_pct, limits::MIN_STOP_LOSS_PCT);
        assert_eq!(cfg.max_position_usd, limits::MAX_POSITION_USD);
        assert_eq!(cfg.min_order_interval_ms, limits::MIN_ORDER_INTERVAL_MS);
        assert_eq!(cfg.max_daily_trades, limits::MAX_DAILY_TRADES);
    }

    #[test]
    fn defaults_pass_untouched() {
        let gate = RiskGate::new(RiskConfig::default());
        let cfg = gate.config();
        assert_eq!(cfg.max_position_usd, 100.0);
        assert_eq!(cfg.stop_loss_pct, 0.25);
        assert_eq!(cfg.take_profit_pct, 0.50);
        assert_eq!(cfg.min_order_interval_ms, 30_000);
    }

    #[test]
    fn approval_computes_bracket_prices_long() {
        let gate = RiskGate::new(RiskConfig::default());
        match gate.evaluate(50_000.0, true, NOW) {
            TradeDecision::Approved {
                size_usd,
                stop_loss,
                take_profit,
            } => {
                assert_eq!(size_usd, 100.0);
                assert!((stop_loss - 49_875.0).abs() < 1e-9);
                assert!((take_profit - 50_250.0).abs() < 1e-9);
            }
            other => panic!("expected approval, got {other:?}"),
        }
    }

    #[test]
    fn approval_inverts_bracket_for_short() {
        let gate = RiskGate::new(RiskConfig::default());
        match gate.evaluate(50_000.0, false, NOW) {
            TradeDecision::Approved {
                stop_loss,
                take_profit,
                ..
            } => {
                assert!((stop_loss - 50_125.0).abs() < 1e-9);
                assert!((take_profit - 49_750.0).abs() < 1e-9);
            }
            other => panic!("expected approval, got {other:?}"),
        }
    }

    #[test]
    fn daily_loss_blocks_until_reset() {
        let mut gate = RiskGate::new(RiskConfig::default());
        gate.on_order_placed(NOW);
        gate.on_position_closed(-55.0);

        for i in 0..5 {
            match gate.evaluate(50_000.0, true, NOW + 60_000 * (i + 1)) {
                TradeDecision::Rejected { kind, reason } => {
                    assert_eq!(kind, RejectKind::DailyLoss);
                    assert!(reason.contains("55.00"), "reason: {reason}");
                }
                other => panic!("expected daily-loss rejection, got {other:?}"),
            }
        }

        gate.reset_daily();
        assert!(gate.evaluate(50_000.0, true, NOW + 600_000).is_approved());
    }

    #[test]
    fn max_daily_trades_blocks() {
        let mut gate = RiskGate::new(RiskConfig::default());
        for _ in 0..limits::MAX_DAILY_TRADES {
            gate.on_order_placed(NOW);
            gate.on_position_closed(0.0);
        }
        match gate.evaluate(50_000.0, true, NOW + 3_600_000) {
            TradeDecision::Rejected { kind, .. } => assert_eq!(kind, RejectKind::MaxTrades),
            other => panic!("expected max-trades rejection, got {other:?}"),
        }
    }

    #[test]
    fn position_limit_blocks_while_open() {
        let mut gate = RiskGate::new(RiskConfig::default());
        gate.on_order_placed(NOW);
        match gate.evaluate(50_000.0, true, NOW + 60_000) {
            TradeDecision::Rejected { kind, .. } => assert_eq!(kind, RejectKind::PositionLimit),
            other => panic!("expected position-limit rejection, got {other:?}"),
        }
        gate.on_position_closed(1.0);
        assert!(gate.evaluate(50_000.0, true, NOW + 60_000).is_approved());
    }

    #[test]
    fn cooldown_blocks_within_interval() {
        let mut gate = RiskGate::new(RiskConfig::default());
        gate.on_order_placed(NOW);
        gate.on_position_closed(1.0);

        match gate.evaluate(50_000.0, true, NOW + 10_000) {
            TradeDecision::Rejected { kind, reason } => {
                assert_eq!(kind, RejectKind::Cooldown);
                assert!(reason.contains("20s"), "reason: {reason}");
            }
            other => panic!("expected cooldown rejection, got {other:?}"),
        }
        assert!(gate.evaluate(50_000.0, true, NOW + 30_000).is_approved());
    }

    #[test]
    fn close_saturates_at_zero_positions() {
        let mut gate = RiskGate::new(RiskConfig::default());
        gate.on_position_closed(-1.0);
        gate.on_position_closed(-1.0);
        assert_eq!(gate.open_positions(), 0);
        assert_eq!(gate.daily_pnl(), -2.0);
    }

    #[test]
    fn evaluation_order_daily_loss_first() {
        // Both daily-loss and position-limit are violated; daily loss is
        // reported because it is checked first.
        let mut gate = RiskGate::new(RiskConfig::default());
        gate.on_order_placed(NOW);
        gate.on_position_closed(-100.0);
        gate.on_order_placed(NOW);
        match gate.evaluate(50_000.0, true, NOW + 1) {
            TradeDecision::Rejected { kind, .. } => assert_eq!(kind, RejectKind::DailyLoss),
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
