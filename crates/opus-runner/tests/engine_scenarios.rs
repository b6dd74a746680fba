//! End-to-end pipeline scenarios: depth events in, orders out.

use opus_connectors_binance::{AccountTrade, MockExchangeClient, PositionInfo};
use opus_events::{spsc_ring, DepthEvent, Event, MessageBus, TimerEvent, TimerId};
use opus_executor::LogNotifier;
use opus_models::{
    DepthUpdate, OrderType, PositionSide, Price, PriceLevel, Quantity, Side, Symbol,
};
use opus_runner::{AppConfig, Engine, EventHandler};

const BASE_MS: i64 = 1_700_000_000_000;

fn trading_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.trading.enabled = true;
    config
}

fn started_engine(config: AppConfig, client: MockExchangeClient) -> Engine {
    let mut engine = Engine::new(config, Box::new(client), Box::new(LogNotifier));
    let (tx, _rx) = spsc_ring::<Event>(64);
    engine.start(MessageBus::new(tx)).expect("engine starts");
    engine
}

/// Ten levels a side with uniform quantities.
fn depth_event(best_bid: f64, best_ask: f64, bid_qty: f64, ask_qty: f64, ts_ms: i64) -> DepthEvent {
    let bids = (0..10)
        .map(|i| {
            PriceLevel::new(
                Price::from_f64(best_bid - i as f64),
                Quantity::from_f64(bid_qty),
            )
        })
        .collect();
    let asks = (0..10)
        .map(|i| {
            PriceLevel::new(
                Price::from_f64(best_ask + i as f64),
                Quantity::from_f64(ask_qty),
            )
        })
        .collect();
    DepthEvent::pack(&DepthUpdate {
        symbol: Symbol::new("BTCUSDT"),
        last_update_id: ts_ms as u64,
        bids,
        asks,
        event_time_ms: ts_ms,
    })
}

#[test]
fn single_qualified_buy_places_exact_bracket() {
    let client = MockExchangeClient::new();
    let handle = client.handle();
    let mut engine = started_engine(trading_config(), client);

    // Steady bid pressure: top-10 bid depth 100 vs ask depth 20,
    // spread 1 at a 50k mid.
    for i in 0..30 {
        let ev = depth_event(49_999.0, 50_000.0, 10.0, 2.0, BASE_MS + i * 1_000);
        engine.on_depth(&ev);
    }

    assert_eq!(engine.stats().qualified_buys, 1, "exactly one qualified buy");
    assert_eq!(engine.stats().qualified_sells, 0);
    assert_eq!(engine.stats().approved_trades, 1);
    assert_eq!(engine.risk().open_positions(), 1);

    let placed = handle.placed_orders();
    assert_eq!(placed.len(), 3, "entry + SL + TP");
    assert_eq!(placed[0].order_type, OrderType::Market);
    assert_eq!(placed[0].side, Side::Buy);
    assert_eq!(placed[0].quantity, Quantity::from_f64(0.002));

    assert_eq!(placed[1].order_type, OrderType::StopMarket);
    assert_eq!(placed[1].stop_price, Some(Price::from_f64(49_875.0)));
    assert!(placed[1].reduce_only);

    assert_eq!(placed[2].order_type, OrderType::TakeProfitMarket);
    assert_eq!(placed[2].stop_price, Some(Price::from_f64(50_250.0)));
    assert!(placed[2].reduce_only);
}

#[test]
fn cooldown_suppresses_follow_up_signals() {
    let client = MockExchangeClient::new();
    let handle = client.handle();
    let mut engine = started_engine(trading_config(), client);

    for i in 0..30 {
        engine.on_depth(&depth_event(49_999.0, 50_000.0, 10.0, 2.0, BASE_MS + i * 1_000));
    }
    assert_eq!(engine.stats().qualified_buys, 1);

    // Ten more identical events, still inside the 30 s cooldown.
    for i in 30..40 {
        engine.on_depth(&depth_event(49_999.0, 50_000.0, 10.0, 2.0, BASE_MS + i * 1_000));
    }
    assert_eq!(engine.stats().qualified_buys, 1, "no additional signals");
    assert!(engine.filter().stats().cooldown_filtered > 0);
    assert_eq!(handle.placed_orders().len(), 3, "no additional orders");
}

#[test]
fn wide_spread_gates_everything() {
    let client = MockExchangeClient::new();
    let handle = client.handle();
    let mut engine = started_engine(trading_config(), client);

    // 0.12% spread against the 0.05% gate, heavy bid pressure anyway.
    for i in 0..20 {
        engine.on_depth(&depth_event(50_000.0, 50_060.0, 10.0, 2.0, BASE_MS + i * 1_000));
    }

    assert_eq!(engine.stats().qualified_total(), 0);
    assert!(engine.filter().stats().spread_filtered > 0);
    assert!(handle.placed_orders().is_empty());
}

#[test]
fn crossed_depth_events_are_discarded() {
    let client = MockExchangeClient::new();
    let mut engine = started_engine(trading_config(), client);

    let crossed = depth_event(50_010.0, 50_000.0, 10.0, 2.0, BASE_MS);
    engine.on_depth(&crossed);
    engine.on_depth(&crossed);

    assert_eq!(engine.stats().invalid_depth, 2);
    assert_eq!(engine.book().bid_count(), 0, "book untouched by corrupt events");
}

#[test]
fn failed_protective_leg_triggers_emergency_close() {
    let client = MockExchangeClient::new();
    client.fail_orders_matching("_SL");
    let handle = client.handle();
    let mut engine = started_engine(trading_config(), client);

    for i in 0..30 {
        engine.on_depth(&depth_event(49_999.0, 50_000.0, 10.0, 2.0, BASE_MS + i * 1_000));
    }

    // Entry and TP were accepted, the SL was not: the engine flattened.
    let placed = handle.placed_orders();
    assert_eq!(placed.len(), 3, "entry, TP, emergency close");
    let close = placed.last().unwrap();
    assert_eq!(close.order_type, OrderType::Market);
    assert_eq!(close.side, Side::Sell);
    assert!(close.reduce_only);
    assert_eq!(handle.cancelled_all_for(), vec![Symbol::new("BTCUSDT")]);
    assert_eq!(engine.risk().open_positions(), 0, "slot released");
}

#[test]
fn position_sync_releases_slot_after_exchange_close() {
    let client = MockExchangeClient::new();
    let handle = client.handle();
    let mut engine = started_engine(trading_config(), client);

    for i in 0..30 {
        engine.on_depth(&depth_event(49_999.0, 50_000.0, 10.0, 2.0, BASE_MS + i * 1_000));
    }
    assert_eq!(engine.risk().open_positions(), 1);
    let signal_ts = BASE_MS + 30_000;

    // First sync: the exchange still shows the position.
    handle.set_positions(vec![PositionInfo {
        symbol: Symbol::new("BTCUSDT"),
        position_side: PositionSide::Both,
        signed_qty: 0.002,
        entry_price: 50_000.0,
        unrealized_pnl: 0.0,
        leverage: 5.0,
    }]);
    engine.on_timer(TimerEvent {
        id: TimerId::PositionSync,
        fire_time_ms: signal_ts + 2_000,
    });
    assert_eq!(engine.risk().open_positions(), 1);

    // The stop filled on the exchange: position gone, loss in the trade
    // history.
    handle.set_positions(vec![]);
    handle.set_trades(
        Symbol::new("BTCUSDT"),
        vec![AccountTrade {
            symbol: Symbol::new("BTCUSDT"),
            order_id: 2,
            price: Price::from_f64(49_875.0),
            quantity: Quantity::from_f64(0.002),
            realized_pnl: -0.25,
            commission: 0.01,
            time_ms: signal_ts + 3_000,
        }],
    );
    engine.on_timer(TimerEvent {
        id: TimerId::PositionSync,
        fire_time_ms: signal_ts + 4_000,
    });

    assert_eq!(engine.risk().open_positions(), 0);
    assert_eq!(engine.risk().daily_pnl(), -0.25);
}

#[test]
fn dry_run_counts_but_places_nothing() {
    let client = MockExchangeClient::new();
    let handle = client.handle();
    let mut config = AppConfig::default();
    config.trading.enabled = false;
    let mut engine = started_engine(config, client);

    for i in 0..30 {
        engine.on_depth(&depth_event(49_999.0, 50_000.0, 10.0, 2.0, BASE_MS + i * 1_000));
    }

    assert_eq!(engine.stats().qualified_buys, 1);
    assert_eq!(engine.stats().approved_trades, 1);
    assert!(handle.placed_orders().is_empty());
    assert_eq!(engine.risk().open_positions(), 0);
}

#[test]
fn daily_rollover_resets_risk_counters() {
    let client = MockExchangeClient::new();
    let mut engine = started_engine(trading_config(), client);

    for i in 0..30 {
        engine.on_depth(&depth_event(49_999.0, 50_000.0, 10.0, 2.0, BASE_MS + i * 1_000));
    }
    assert_eq!(engine.risk().daily_trades(), 1);

    // A stats tick on the next UTC day clears the daily counters.
    engine.on_timer(TimerEvent {
        id: TimerId::Stats,
        fire_time_ms: BASE_MS + 86_400_000,
    });
    assert_eq!(engine.risk().daily_trades(), 0);
}

#[test]
fn full_loop_through_ring_and_reactor() {
    use opus_events::Consumer;
    use opus_runner::EventLoop;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    let client = MockExchangeClient::new();
    let feed = client.handle();
    let handle = client.handle();

    let mut engine = Engine::new(trading_config(), Box::new(client), Box::new(LogNotifier));
    let (tx, rx): (_, Consumer<Event>) = spsc_ring::<Event>(256);
    engine.start(MessageBus::new(tx)).expect("engine starts");

    // Push depth through the subscription callback, exactly as the
    // ingest thread would.
    for i in 0..30 {
        let bids = (0..10)
            .map(|j| {
                PriceLevel::new(
                    Price::from_f64(49_999.0 - j as f64),
                    Quantity::from_f64(10.0),
                )
            })
            .collect();
        let asks = (0..10)
            .map(|j| {
                PriceLevel::new(
                    Price::from_f64(50_000.0 + j as f64),
                    Quantity::from_f64(2.0),
                )
            })
            .collect();
        feed.push_depth(DepthUpdate {
            symbol: Symbol::new("BTCUSDT"),
            last_update_id: i,
            bids,
            asks,
            event_time_ms: BASE_MS + i as i64 * 1_000,
        });
    }

    let stop = Arc::new(AtomicBool::new(true));
    let mut event_loop = EventLoop::without_timers(rx, stop);
    event_loop.run(&mut engine);

    assert_eq!(event_loop.events_processed(), 30);
    assert_eq!(engine.stats().total_updates, 30);
    assert_eq!(engine.stats().qualified_buys, 1);
    assert_eq!(handle.placed_orders().len(), 3);

    let report = engine.stop(event_loop.events_processed());
    assert!(report.contains("Approved trades:   1"));
}
