//! Packed event records for the ring.

use opus_models::{DepthUpdate, PriceLevel, Price, Quantity, Symbol};

/// Levels per side carried by a packed depth event. Deeper levels are
/// truncated at the bus; the strategy only reads the top ten.
pub const DEPTH_EVENT_LEVELS: usize = 20;

/// Packed market-depth record. Fixed-size and `Copy` so it can live in a
/// ring slot; each event is a snapshot of the top levels, not a delta, so
/// a dropped predecessor never corrupts the book.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct DepthEvent {
    /// Zero-padded symbol bytes.
    pub symbol: [u8; 16],
    /// Exchange event time, epoch milliseconds.
    pub ts_ms: i64,
    /// Low 32 bits of the venue's update id.
    pub sequence: u32,
    pub bid_count: u8,
    pub ask_count: u8,
    _pad: [u8; 2],
    /// Raw (price, quantity) mantissa pairs, best first.
    pub bids: [[i64; 2]; DEPTH_EVENT_LEVELS],
    pub asks: [[i64; 2]; DEPTH_EVENT_LEVELS],
}

impl Default for DepthEvent {
    fn default() -> Self {
        Self {
            symbol: [0; 16],
            ts_ms: 0,
            sequence: 0,
            bid_count: 0,
            ask_count: 0,
            _pad: [0; 2],
            bids: [[0; 2]; DEPTH_EVENT_LEVELS],
            asks: [[0; 2]; DEPTH_EVENT_LEVELS],
        }
    }
}

impl DepthEvent {
    /// Pack a heap-owning update, truncating to [`DEPTH_EVENT_LEVELS`] a
    /// side.
    pub fn pack(update: &DepthUpdate) -> Self {
        let mut ev = Self {
            symbol: update.symbol.to_bytes(),
            ts_ms: update.event_time_ms,
            sequence: update.last_update_id as u32,
            ..Self::default()
        };
        for (i, level) in update.bids.iter().take(DEPTH_EVENT_LEVELS).enumerate() {
            ev.bids[i] = [level.price.raw(), level.quantity.raw()];
            ev.bid_count = (i + 1) as u8;
        }
        for (i, level) in update.asks.iter().take(DEPTH_EVENT_LEVELS).enumerate() {
            ev.asks[i] = [level.price.raw(), level.quantity.raw()];
            ev.ask_count = (i + 1) as u8;
        }
        ev
    }

    #[inline]
    pub fn symbol(&self) -> Symbol {
        Symbol::from_bytes(&self.symbol)
    }

    /// Bid levels as typed pairs, best first.
    pub fn bid_levels(&self) -> impl Iterator<Item = PriceLevel> + '_ {
        self.bids[..self.bid_count as usize]
            .iter()
            .map(|&[p, q]| PriceLevel::new(Price::from_raw(p), Quantity::from_raw(q)))
    }

    /// Ask levels as typed pairs, best first.
    pub fn ask_levels(&self) -> impl Iterator<Item = PriceLevel> + '_ {
        self.asks[..self.ask_count as usize]
            .iter()
            .map(|&[p, q]| PriceLevel::new(Price::from_raw(p), Quantity::from_raw(q)))
    }

    /// Best bid must be strictly below best ask and both sides non-empty,
    /// otherwise the snapshot is corrupt and must be discarded.
    pub fn is_well_formed(&self) -> bool {
        if self.bid_count == 0 || self.ask_count == 0 {
            return false;
        }
        if self.bid_count as usize > DEPTH_EVENT_LEVELS
            || self.ask_count as usize > DEPTH_EVENT_LEVELS
        {
            return false;
        }
        self.bids[0][0] < self.asks[0][0]
    }
}

/// Periodic timer identifiers handled by the reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Statistics snapshot, every 5 s.
    Stats,
    /// Exchange position reconciliation, every 2 s.
    PositionSync,
    /// Liveness log line, every 5 min.
    Heartbeat,
    /// Stream re-subscription after a transport reconnect.
    Reconnect,
}

/// A timer firing, delivered through the same queue as market data so the
/// reactor serializes all state mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub id: TimerId,
    pub fire_time_ms: i64,
}

/// Tagged union over everything the reactor consumes.
#[derive(Debug, Clone, Copy)]
pub enum Event {
    Depth(DepthEvent),
    Timer(TimerEvent),
    Shutdown,
}

impl Default for Event {
    fn default() -> Self {
        Event::Shutdown
    }
}
