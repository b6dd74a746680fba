//! Single-threaded reactor.
//!
//! Drains the ring, dispatches each event to the handler, and keeps the
//! periodic timers honest. The loop never blocks indefinitely: an idle
//! pass parks for a bounded interval so timer expiry and the stop flag
//! are always observed promptly.

use opus_events::{Consumer, Event, TimerEvent, TimerId};
use opus_models::now_ms;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Bounded idle park.
const IDLE_PARK: Duration = Duration::from_millis(1);

/// Strategy-side event sink. All methods run on the reactor thread.
pub trait EventHandler {
    fn on_depth(&mut self, event: &opus_events::DepthEvent);
    fn on_timer(&mut self, event: TimerEvent);
}

struct PeriodicTimer {
    id: TimerId,
    period_ms: i64,
    next_fire_ms: i64,
}

impl PeriodicTimer {
    fn new(id: TimerId, period_ms: i64, now: i64) -> Self {
        Self {
            id,
            period_ms,
            next_fire_ms: now + period_ms,
        }
    }

    fn poll(&mut self, now: i64) -> Option<TimerEvent> {
        if now < self.next_fire_ms {
            return None;
        }
        let event = TimerEvent {
            id: self.id,
            fire_time_ms: self.next_fire_ms,
        };
        // Re-arm from now, not from the scheduled time: after a stall we
        // want one catch-up firing, not a burst.
        self.next_fire_ms = now + self.period_ms;
        Some(event)
    }
}

pub struct EventLoop {
    rx: Consumer<Event>,
    stop: Arc<AtomicBool>,
    timers: Vec<PeriodicTimer>,
    events_processed: u64,
}

impl EventLoop {
    /// Build with the standard timer set: stats 5 s, position sync 2 s,
    /// heartbeat 5 min.
    pub fn new(rx: Consumer<Event>, stop: Arc<AtomicBool>) -> Self {
        let now = now_ms();
        Self {
            rx,
            stop,
            timers: vec![
                PeriodicTimer::new(TimerId::PositionSync, 2_000, now),
                PeriodicTimer::new(TimerId::Stats, 5_000, now),
                PeriodicTimer::new(TimerId::Heartbeat, 300_000, now),
            ],
            events_processed: 0,
        }
    }

    /// Without periodic timers; timer events still dispatch when injected
    /// through the ring. Used by replay and tests.
    pub fn without_timers(rx: Consumer<Event>, stop: Arc<AtomicBool>) -> Self {
        Self {
            rx,
            stop,
            timers: Vec::new(),
            events_processed: 0,
        }
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Run until a shutdown event arrives or the stop flag is raised.
    /// Events already on the ring are drained before returning.
    pub fn run(&mut self, handler: &mut dyn EventHandler) {
        let mut running = true;
        loop {
            let mut worked = false;

            while let Some(event) = self.rx.try_pop() {
                worked = true;
                self.events_processed += 1;
                match event {
                    Event::Depth(depth) => handler.on_depth(&depth),
                    Event::Timer(timer) => handler.on_timer(timer),
                    Event::Shutdown => running = false,
                }
            }

            if self.stop.load(Ordering::Relaxed) {
                running = false;
            }

            let now = now_ms();
            for timer in &mut self.timers {
                if let Some(event) = timer.poll(now) {
                    worked = true;
                    handler.on_timer(event);
                }
            }

            if !running {
                return;
            }
            if !worked {
                std::thread::sleep(IDLE_PARK);
            }
        }
    }
}
