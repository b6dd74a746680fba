//! # Opus Events
//!
//! The transport layer between the network-ingest thread and the strategy
//! thread: fixed-size event records, a wait-free single-producer
//! single-consumer ring, and the publisher-side bus that packs heap-owning
//! depth updates into ring slots.
//!
//! Events are `Copy` by construction. A slot never owns heap memory, so a
//! slow consumer can only ever cost dropped events, never leaks or torn
//! frees.

pub mod bus;
pub mod event;
pub mod ring;

pub use bus::{BusStats, MessageBus};
pub use event::{DepthEvent, Event, TimerEvent, TimerId, DEPTH_EVENT_LEVELS};
pub use ring::{spsc_ring, Consumer, Producer};
