//! Publisher-side message bus.
//!
//! Owned by the ingest thread. Its only job inside the depth callback is
//! to pack and push; strategy logic never runs here, so the callback stays
//! wait-free. A full ring costs a dropped event, which the next snapshot
//! for the same symbol supersedes.

use crate::event::{DepthEvent, Event, TimerEvent};
use crate::ring::Producer;
use opus_models::DepthUpdate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared publish/drop counters, readable from the reactor side.
#[derive(Debug, Default)]
pub struct BusStats {
    events_published: AtomicU64,
    events_dropped: AtomicU64,
}

impl BusStats {
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    /// Fraction of offered events that were dropped.
    pub fn drop_rate(&self) -> f64 {
        let published = self.events_published() as f64;
        let dropped = self.events_dropped() as f64;
        let total = published + dropped;
        if total == 0.0 {
            0.0
        } else {
            dropped / total
        }
    }
}

/// Thin wrapper over the producer half of the ring.
pub struct MessageBus {
    tx: Producer<Event>,
    stats: Arc<BusStats>,
}

impl MessageBus {
    pub fn new(tx: Producer<Event>) -> Self {
        Self {
            tx,
            stats: Arc::new(BusStats::default()),
        }
    }

    /// Counter handle to keep on the reactor side.
    pub fn stats(&self) -> Arc<BusStats> {
        Arc::clone(&self.stats)
    }

    /// Pack and enqueue a depth update. Returns whether the event made it
    /// onto the ring.
    pub fn publish_depth(&mut self, update: &DepthUpdate) -> bool {
        self.publish(Event::Depth(DepthEvent::pack(update)))
    }

    pub fn publish_timer(&mut self, timer: TimerEvent) -> bool {
        self.publish(Event::Timer(timer))
    }

    pub fn publish_shutdown(&mut self) -> bool {
        self.publish(Event::Shutdown)
    }

    fn publish(&mut self, event: Event) -> bool {
        if self.tx.try_push(event) {
            self.stats.events_published.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            self.stats.events_dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }
}
