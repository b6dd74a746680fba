//! Engine wiring.
//!
//! The engine owns every piece of strategy state and is the only code
//! that mutates it; the reactor hands it events one at a time. The
//! pipeline per depth event: rebuild book, fold imbalance, qualify
//! through the filter, gate through risk, place the bracket.

use crate::config::AppConfig;
use crate::event_loop::EventHandler;
use crate::recorder::TickRecorder;
use crate::stats::EngineStats;
use anyhow::{bail, Context, Result};
use opus_book::OrderBook;
use opus_connectors_binance::ExchangeClient;
use opus_events::{BusStats, DepthEvent, MessageBus, TimerEvent, TimerId};
use opus_executor::{Notifier, OrderManager, PositionReconciler, TrackedPosition};
use opus_models::{epoch_day, MarketTick, Side, Symbol};
use opus_risk::{RiskGate, TradeDecision};
use opus_strategy::{ObiConfig, ObiGenerator, SignalFilter};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Connecting,
    Running,
    Stopped,
}

pub struct Engine {
    config: AppConfig,
    symbol: Symbol,
    client: Box<dyn ExchangeClient>,
    notifier: Box<dyn Notifier>,
    book: OrderBook,
    obi: ObiGenerator,
    filter: SignalFilter,
    risk: RiskGate,
    orders: OrderManager,
    reconciler: PositionReconciler,
    recorder: Option<TickRecorder>,
    stats: EngineStats,
    bus_stats: Option<Arc<BusStats>>,
    state: EngineState,
    current_day: Option<i64>,
}

impl Engine {
    pub fn new(
        config: AppConfig,
        client: Box<dyn ExchangeClient>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let symbol = config.primary_symbol();
        let obi = ObiGenerator::new(ObiConfig {
            depth_levels: config.strategy.obi.depth_levels,
            smoothing_period: config.strategy.obi.smoothing_period,
        });
        let filter = SignalFilter::new(config.strategy.filter.clone());
        let risk = RiskGate::new(config.risk.clone());

        Self {
            config,
            symbol,
            client,
            notifier,
            book: OrderBook::new(),
            obi,
            filter,
            risk,
            orders: OrderManager::new(),
            reconciler: PositionReconciler::new(),
            recorder: None,
            stats: EngineStats::default(),
            bus_stats: None,
            state: EngineState::Uninitialized,
            current_day: None,
        }
    }

    /// Connect, verify the account, and subscribe the depth stream. The
    /// bus moves into the subscription callback; its counters stay
    /// readable through [`BusStats`].
    pub fn start(&mut self, bus: MessageBus) -> Result<()> {
        self.state = EngineState::Connecting;

        if self.config.recording.enabled {
            let recorder = TickRecorder::open(Path::new(&self.config.recording.path))
                .with_context(|| {
                    format!("could not open tick recording {}", self.config.recording.path)
                })?;
            self.recorder = Some(recorder);
        }

        let Some(account) = self.client.get_account_info() else {
            self.state = EngineState::Stopped;
            bail!("could not reach the exchange account endpoint");
        };
        tracing::info!(
            balance = account.available_balance,
            environment = %self.config.exchange.environment,
            "exchange account reachable"
        );

        self.client
            .on_error(Box::new(|error| tracing::error!(error, "exchange transport error")));
        self.client
            .on_ws_connect(Box::new(|| tracing::info!("stream connected")));
        self.client.on_reconnect(Box::new(|| {
            tracing::warn!("stream reconnected, depth resumes from next snapshot");
        }));

        self.client.start();
        for _ in 0..50 {
            if self.client.is_connected() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        if !self.client.is_connected() {
            self.state = EngineState::Stopped;
            bail!("stream connection not established within 5s");
        }

        self.bus_stats = Some(bus.stats());
        let mut bus = bus;
        self.client.subscribe_depth(
            self.symbol,
            Box::new(move |update| {
                // Ingest thread: pack and push only.
                bus.publish_depth(&update);
            }),
        );

        tracing::info!(symbol = %self.symbol, trading = self.config.trading.enabled, "engine running");
        self.state = EngineState::Running;
        Ok(())
    }

    /// Disconnect and flush. Returns the final report.
    pub fn stop(&mut self, events_processed: u64) -> String {
        self.client.stop();
        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(error) = recorder.flush() {
                tracing::warn!(%error, "tick recording flush failed");
            }
        }
        self.state = EngineState::Stopped;

        let dropped = self
            .bus_stats
            .as_ref()
            .map(|s| s.events_dropped())
            .unwrap_or(0);
        self.stats.render_report(events_processed, dropped)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn filter(&self) -> &SignalFilter {
        &self.filter
    }

    pub fn risk(&self) -> &RiskGate {
        &self.risk
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    fn note_day(&mut self, ts_ms: i64) {
        let day = epoch_day(ts_ms);
        match self.current_day {
            None => self.current_day = Some(day),
            Some(previous) if day > previous => {
                tracing::info!("UTC day rollover, resetting daily risk counters");
                self.risk.reset_daily();
                self.current_day = Some(day);
            }
            _ => {}
        }
    }

    fn record_tick(&mut self, ts_ms: i64) {
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };
        let (Some(bid), Some(ask)) = (self.book.best_bid(), self.book.best_ask()) else {
            return;
        };
        let tick = MarketTick {
            timestamp_ns: ts_ms.max(0) as u64 * 1_000_000,
            bid_price: bid.price.to_f64(),
            ask_price: ask.price.to_f64(),
            bid_qty: bid.quantity.to_f64(),
            ask_qty: ask.quantity.to_f64(),
        };
        if let Err(error) = recorder.write_tick(&tick) {
            tracing::warn!(%error, "tick recording write failed");
        }
    }

    fn execute_signal(&mut self, side: Side, entry_price: f64, now_ms: i64) {
        let decision = self.risk.evaluate(entry_price, side == Side::Buy, now_ms);
        let (size_usd, stop_loss, take_profit) = match decision {
            TradeDecision::Rejected { kind, reason } => {
                self.stats.rejected_trades += 1;
                tracing::info!(?kind, reason = %reason, "trade rejected by risk gate");
                return;
            }
            TradeDecision::Approved {
                size_usd,
                stop_loss,
                take_profit,
            } => (size_usd, stop_loss, take_profit),
        };
        self.stats.approved_trades += 1;

        if !self.config.trading.enabled {
            tracing::info!(
                side = side.as_str(),
                entry_price,
                size_usd,
                stop_loss,
                take_profit,
                "dry run: trading disabled, not placing bracket"
            );
            return;
        }

        let raw_qty = size_usd / entry_price;
        let result = match self.orders.place_bracket(
            self.client.as_mut(),
            self.notifier.as_mut(),
            self.symbol,
            side,
            raw_qty,
            entry_price,
            stop_loss,
            take_profit,
        ) {
            Ok(result) => result,
            Err(error) => {
                tracing::error!(%error, "bracket refused");
                return;
            }
        };

        let Some(entry) = result.entry.as_ref() else {
            return;
        };
        self.risk.on_order_placed(now_ms);

        let fill_price = if entry.price.is_valid() {
            entry.price.to_f64()
        } else {
            entry_price
        };
        let qty = entry.quantity.to_f64();

        if result.is_naked() {
            // A position without both protective legs does not stay open.
            self.orders.emergency_close(
                self.client.as_mut(),
                self.notifier.as_mut(),
                self.symbol,
                side,
                entry.quantity,
            );
            self.risk.on_position_closed(0.0);
            return;
        }

        self.reconciler.track(TrackedPosition {
            symbol: self.symbol,
            signed_qty: if side == Side::Buy { qty } else { -qty },
            entry_price: fill_price,
            unrealized_pnl: 0.0,
        });
    }
}

impl EventHandler for Engine {
    fn on_depth(&mut self, event: &DepthEvent) {
        let started = Instant::now();
        self.stats.total_updates += 1;
        self.note_day(event.ts_ms);

        if !event.is_well_formed() {
            self.stats.invalid_depth += 1;
            return;
        }

        // Each event is a snapshot of the top levels: rebuild, don't
        // patch.
        self.book.clear();
        for level in event.bid_levels() {
            self.book.update_bid(level.price, level.quantity);
        }
        for level in event.ask_levels() {
            self.book.update_ask(level.price, level.quantity);
        }
        self.book.set_last_update(event.sequence as u64, event.ts_ms);

        let depth_levels = self.config.strategy.obi.depth_levels;
        self.obi
            .update(self.book.bids(depth_levels), self.book.asks(depth_levels));

        self.record_tick(event.ts_ms);

        if self.obi.is_ready() {
            let imbalance = self.obi.smoothed();
            if imbalance.abs() > self.config.strategy.obi.imbalance_threshold {
                if imbalance > 0.0 {
                    self.stats.buy_signals += 1;
                } else {
                    self.stats.sell_signals += 1;
                }
            }

            let spread_pct = self.book.spread_pct();
            if let Some(signal) = self.filter.apply(imbalance, spread_pct, event.ts_ms) {
                let entry_price = match signal.side {
                    Side::Buy => self.book.best_ask().map(|l| l.price.to_f64()),
                    Side::Sell => self.book.best_bid().map(|l| l.price.to_f64()),
                };
                match signal.side {
                    Side::Buy => self.stats.qualified_buys += 1,
                    Side::Sell => self.stats.qualified_sells += 1,
                }
                tracing::info!(
                    side = signal.side.as_str(),
                    imbalance = signal.imbalance,
                    confidence = signal.confidence,
                    high_conviction = signal.high_conviction,
                    "qualified signal"
                );
                if let Some(price) = entry_price.filter(|p| *p > 0.0) {
                    self.execute_signal(signal.side, price, event.ts_ms);
                }
            }
        }

        self.stats
            .record_latency(started.elapsed().as_micros() as i64);
    }

    fn on_timer(&mut self, event: TimerEvent) {
        self.note_day(event.fire_time_ms);
        match event.id {
            TimerId::Stats => {
                let drop_rate = self
                    .bus_stats
                    .as_ref()
                    .map(|s| s.drop_rate())
                    .unwrap_or(0.0);
                match (self.book.best_bid(), self.book.best_ask()) {
                    (Some(bid), Some(ask)) => tracing::info!(
                        symbol = %self.symbol,
                        bid = bid.price.to_f64(),
                        ask = ask.price.to_f64(),
                        imbalance = self.obi.smoothed(),
                        updates = self.stats.total_updates,
                        avg_latency_us = self.stats.avg_latency_us,
                        drop_rate,
                        "live"
                    ),
                    _ => tracing::info!(symbol = %self.symbol, "waiting for depth data"),
                }
            }
            TimerId::PositionSync => {
                if self.risk.open_positions() > 0 || self.reconciler.has_open_position() {
                    let closures = self.reconciler.sync(
                        self.client.as_mut(),
                        &mut self.risk,
                        event.fire_time_ms,
                    );
                    if closures > 0 {
                        tracing::info!(
                            closures,
                            realized_pnl = self.reconciler.last_realized_pnl(),
                            "positions reconciled"
                        );
                    }
                }
            }
            TimerId::Heartbeat => {
                tracing::info!(
                    updates = self.stats.total_updates,
                    qualified = self.stats.qualified_total(),
                    approved = self.stats.approved_trades,
                    "heartbeat"
                );
            }
            TimerId::Reconnect => {
                if !self.client.is_connected() {
                    tracing::warn!("stream disconnected, client is reconnecting");
                }
            }
        }
    }
}
