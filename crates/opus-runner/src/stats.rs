//! Engine statistics.

use std::fmt::Write as _;

/// Counters the engine keeps per session. Raw/qualified/approved form a
/// funnel: thousands of raw signals should reduce to a handful of placed
/// brackets.
#[derive(Debug, Default, Clone)]
pub struct EngineStats {
    pub total_updates: u64,
    pub invalid_depth: u64,
    pub buy_signals: u64,
    pub sell_signals: u64,
    pub qualified_buys: u64,
    pub qualified_sells: u64,
    pub approved_trades: u64,
    pub rejected_trades: u64,
    pub last_latency_us: i64,
    pub avg_latency_us: f64,
}

impl EngineStats {
    pub fn record_latency(&mut self, micros: i64) {
        self.last_latency_us = micros;
        self.avg_latency_us = self.avg_latency_us * 0.99 + micros as f64 * 0.01;
    }

    pub fn raw_total(&self) -> u64 {
        self.buy_signals + self.sell_signals
    }

    pub fn qualified_total(&self) -> u64 {
        self.qualified_buys + self.qualified_sells
    }

    /// Fraction of raw signals the filter removed.
    pub fn filter_rate(&self) -> f64 {
        let raw = self.raw_total();
        if raw == 0 {
            return 0.0;
        }
        1.0 - self.qualified_total() as f64 / raw as f64
    }

    /// Final report block, printed once at shutdown.
    pub fn render_report(&self, events_processed: u64, events_dropped: u64) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Final Statistics ===");
        let _ = writeln!(out, "Events processed:  {events_processed}");
        let _ = writeln!(out, "Depth updates:     {}", self.total_updates);
        let _ = writeln!(out, "Invalid depth:     {}", self.invalid_depth);
        let _ = writeln!(out, "Dropped (ring):    {events_dropped}");
        let _ = writeln!(out, "------- Raw Signals -------");
        let _ = writeln!(out, "Buy signals:       {}", self.buy_signals);
        let _ = writeln!(out, "Sell signals:      {}", self.sell_signals);
        let _ = writeln!(out, "--- Qualified (Filtered) ---");
        let _ = writeln!(out, "Qualified buys:    {}", self.qualified_buys);
        let _ = writeln!(out, "Qualified sells:   {}", self.qualified_sells);
        let _ = writeln!(out, "--- Risk Managed Trades ---");
        let _ = writeln!(out, "Approved trades:   {}", self.approved_trades);
        let _ = writeln!(out, "Rejected trades:   {}", self.rejected_trades);
        let _ = writeln!(out, "---------------------------");
        let _ = writeln!(out, "Filter rate:       {:.1}% filtered out", self.filter_rate() * 100.0);
        let _ = writeln!(out, "Avg latency:       {:.0} us", self.avg_latency_us);
        out
    }
}
