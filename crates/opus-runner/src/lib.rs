//! # Opus Runner
//!
//! Everything that turns the strategy crates into a running engine: the
//! single-threaded reactor event loop, the engine that owns all strategy
//! state, YAML configuration, the binary tick recorder and its replay
//! driver, and the CLI entry point.

pub mod config;
pub mod engine;
pub mod event_loop;
pub mod recorder;
pub mod replay;
pub mod stats;

pub use config::AppConfig;
pub use engine::{Engine, EngineState};
pub use event_loop::{EventHandler, EventLoop};
pub use recorder::{TickReader, TickRecorder};
pub use stats::EngineStats;
