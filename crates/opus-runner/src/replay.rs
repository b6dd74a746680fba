//! Replay recorded ticks through the live pipeline.
//!
//! Reads the binary tick stream in timestamp order, synthesizes one-level
//! depth updates, and pushes them through the same callback → bus → ring
//! → reactor path the live feed uses, against the paper exchange. A speed
//! multiplier of 0 replays as fast as the reactor drains.

use crate::config::AppConfig;
use crate::engine::Engine;
use crate::event_loop::EventLoop;
use crate::recorder::TickReader;
use anyhow::{Context, Result};
use opus_connectors_binance::MockExchangeClient;
use opus_events::{spsc_ring, Event, MessageBus};
use opus_executor::LogNotifier;
use opus_models::{DepthUpdate, Price, PriceLevel, Quantity, Symbol};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Ring sized for a replay burst.
const RING_CAPACITY: usize = 8_192;

pub struct ReplaySummary {
    pub ticks_replayed: u64,
    pub report: String,
}

pub fn run_replay(config: AppConfig, file: &Path, speed: f64) -> Result<ReplaySummary> {
    let reader = TickReader::open(file)
        .with_context(|| format!("could not open replay input {}", file.display()))?;

    let client = MockExchangeClient::new();
    let feed = client.handle();
    let symbol = config.primary_symbol();

    let mut engine = Engine::new(config, Box::new(client), Box::new(LogNotifier));
    let (tx, rx) = spsc_ring::<Event>(RING_CAPACITY);
    engine.start(MessageBus::new(tx))?;

    let stop = Arc::new(AtomicBool::new(false));
    let feeder_stop = Arc::clone(&stop);
    let feeder = std::thread::spawn(move || feed_ticks(reader, feed, symbol, speed, feeder_stop));

    let mut event_loop = EventLoop::new(rx, Arc::clone(&stop));
    event_loop.run(&mut engine);

    let ticks_replayed = feeder.join().unwrap_or(Ok(0))?;
    let report = engine.stop(event_loop.events_processed());
    Ok(ReplaySummary {
        ticks_replayed,
        report,
    })
}

fn feed_ticks(
    mut reader: TickReader,
    feed: MockExchangeClient,
    symbol: Symbol,
    speed: f64,
    stop: Arc<AtomicBool>,
) -> Result<u64> {
    let mut count = 0u64;
    let mut previous_ns: Option<u64> = None;
    let mut sequence = 0u64;

    while let Some(tick) = reader.next_tick().context("replay input corrupt")? {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        if speed > 0.0 {
            if let Some(prev) = previous_ns {
                let gap_ns = tick.timestamp_ns.saturating_sub(prev) as f64 / speed;
                let gap = std::time::Duration::from_nanos(gap_ns as u64);
                // Cap so a recording gap cannot stall the replay.
                std::thread::sleep(gap.min(std::time::Duration::from_secs(1)));
            }
        }
        previous_ns = Some(tick.timestamp_ns);
        sequence += 1;

        feed.push_depth(DepthUpdate {
            symbol,
            last_update_id: sequence,
            bids: vec![PriceLevel::new(
                Price::from_f64(tick.bid_price),
                Quantity::from_f64(tick.bid_qty),
            )],
            asks: vec![PriceLevel::new(
                Price::from_f64(tick.ask_price),
                Quantity::from_f64(tick.ask_qty),
            )],
            event_time_ms: (tick.timestamp_ns / 1_000_000) as i64,
        });
        count += 1;
    }

    // Let the reactor drain, then end the session.
    std::thread::sleep(std::time::Duration::from_millis(50));
    stop.store(true, Ordering::Relaxed);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::TickRecorder;
    use opus_models::MarketTick;

    #[test]
    fn replays_recorded_file_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.bin");

        let mut recorder = TickRecorder::open(&path).unwrap();
        for i in 0..50u64 {
            recorder
                .write_tick(&MarketTick {
                    timestamp_ns: 1_700_000_000_000_000_000 + i * 100_000_000,
                    bid_price: 49_999.0,
                    ask_price: 50_000.0,
                    bid_qty: 10.0,
                    ask_qty: 2.0,
                    })
                .unwrap();
        }
        recorder.flush().unwrap();

        let summary = run_replay(AppConfig::default(), &path, 0.0).unwrap();
        assert_eq!(summary.ticks_replayed, 50);
        assert!(summary.report.contains("Depth updates:"));
    }
}
