//! Engine entry point.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use opus_connectors_binance::{ExchangeClient, MockExchangeClient};
use opus_events::{spsc_ring, Event, MessageBus};
use opus_executor::LogNotifier;
use opus_runner::replay::run_replay;
use opus_runner::{AppConfig, Engine, EventLoop};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Event ring between the ingest thread and the reactor.
const RING_CAPACITY: usize = 8_192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Live,
    Replay,
    ArbBacktest,
}

#[derive(Debug, Parser)]
#[command(name = "opus", about = "Order-book-imbalance trading engine")]
struct Cli {
    /// Configuration file.
    #[arg(default_value = "config/config.yaml")]
    config: PathBuf,

    /// Execution mode.
    #[arg(long, value_enum, default_value = "live")]
    mode: Mode,

    /// Replay input file.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Replay speed multiplier; 0 replays at full speed.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    if let Err(error) = run(Cli::parse()) {
        tracing::error!("fatal: {error:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    tracing::info!(config = %cli.config.display(), "loading configuration");
    let config = AppConfig::load(&cli.config)?;

    match cli.mode {
        Mode::Live => run_live(config),
        Mode::Replay => {
            let file = cli
                .file
                .context("--mode replay requires --file <path>")?;
            let summary = run_replay(config, &file, cli.speed)?;
            tracing::info!(ticks = summary.ticks_replayed, "replay complete");
            print!("{}", summary.report);
            Ok(())
        }
        Mode::ArbBacktest => {
            bail!("arb-backtest mode is handled by the statistical-arb engine, not this binary")
        }
    }
}

fn make_client(config: &AppConfig) -> Result<Box<dyn ExchangeClient>> {
    if config.exchange.is_paper() {
        return Ok(Box::new(MockExchangeClient::new()));
    }
    // The live REST/websocket transport ships as a separate deployment
    // component; this binary carries the paper venue and replay only.
    bail!(
        "exchange.environment '{}' needs the live transport; use 'paper' or --mode replay",
        config.exchange.environment
    )
}

fn run_live(config: AppConfig) -> Result<()> {
    let client = make_client(&config)?;
    let mut engine = Engine::new(config, client, Box::new(LogNotifier));

    let (tx, rx) = spsc_ring::<Event>(RING_CAPACITY);
    engine.start(MessageBus::new(tx))?;

    let stop = Arc::new(AtomicBool::new(false));
    let signal_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        signal_stop.store(true, Ordering::Relaxed);
    })
    .context("could not install signal handler")?;

    let mut event_loop = EventLoop::new(rx, stop);
    event_loop.run(&mut engine);

    let report = engine.stop(event_loop.events_processed());
    print!("{report}");
    Ok(())
}
