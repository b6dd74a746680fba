//! Exchange-driven position closure detection.
//!
//! Protective legs fill on the exchange without telling us. The
//! reconciler polls the position list on a timer and treats a symbol that
//! was open last sync but is gone now as a closure: it pulls the recent
//! account trades, sums the realized PnL of the fills from the last 30
//! seconds, and releases the risk-gate slot exactly once.
//!
//! Runs synchronously on the reactor thread; the blocking REST calls
//! delay depth handling the same way any other handler would.

use opus_connectors_binance::ExchangeClient;
use opus_models::Symbol;
use opus_risk::RiskGate;

/// Quantities below this are exchange dust, not a position.
pub const DUST_QTY: f64 = 1e-7;

/// Window over which closure fills are attributed, ms.
const PNL_LOOKBACK_MS: i64 = 30_000;

/// Account trades fetched per closure.
const TRADE_FETCH_LIMIT: usize = 20;

/// A position we believe is open, from the last sync.
#[derive(Debug, Clone)]
pub struct TrackedPosition {
    pub symbol: Symbol,
    /// Positive long, negative short.
    pub signed_qty: f64,
    pub entry_price: f64,
    pub unrealized_pnl: f64,
}

#[derive(Debug, Default)]
pub struct PositionReconciler {
    tracked: Vec<TrackedPosition>,
    last_realized_pnl: f64,
}

impl PositionReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll the exchange and reconcile. Returns how many closures were
    /// detected this pass.
    pub fn sync(
        &mut self,
        client: &mut dyn ExchangeClient,
        risk: &mut RiskGate,
        now_ms: i64,
    ) -> usize {
        let remote: Vec<TrackedPosition> = client
            .get_positions()
            .into_iter()
            .filter(|p| p.signed_qty.abs() >= DUST_QTY)
            .map(|p| TrackedPosition {
                symbol: p.symbol,
                signed_qty: p.signed_qty,
                entry_price: p.entry_price,
                unrealized_pnl: p.unrealized_pnl,
            })
            .collect();

        let mut closures = 0;
        for prev in &self.tracked {
            let still_open = remote.iter().any(|p| p.symbol == prev.symbol);
            if still_open {
                continue;
            }

            let pnl = self.realized_pnl_since(client, prev.symbol, now_ms - PNL_LOOKBACK_MS);
            self.last_realized_pnl = pnl;
            tracing::info!(
                symbol = %prev.symbol,
                pnl,
                "position closed by exchange, releasing risk slot"
            );
            risk.on_position_closed(pnl);
            closures += 1;
        }

        self.tracked = remote;
        closures
    }

    /// Adopt a position we just opened ourselves, so the next sync does
    /// not treat its appearance as news and its disappearance is caught.
    pub fn track(&mut self, position: TrackedPosition) {
        self.tracked.retain(|p| p.symbol != position.symbol);
        self.tracked.push(position);
    }

    pub fn has_open_position(&self) -> bool {
        !self.tracked.is_empty()
    }

    pub fn position(&self, symbol: Symbol) -> Option<&TrackedPosition> {
        self.tracked.iter().find(|p| p.symbol == symbol)
    }

    pub fn last_realized_pnl(&self) -> f64 {
        self.last_realized_pnl
    }

    fn realized_pnl_since(
        &self,
        client: &mut dyn ExchangeClient,
        symbol: Symbol,
        cutoff_ms: i64,
    ) -> f64 {
        client
            .get_account_trades(symbol, TRADE_FETCH_LIMIT)
            .iter()
            .filter(|t| t.time_ms >= cutoff_ms)
            .map(|t| t.realized_pnl)
            .sum()
    }
}
