//! # Opus Book
//!
//! In-memory L2 order book. Both sides are bounded sorted sequences (bids
//! descending, asks ascending) capped at [`MAX_LEVELS`]; a quantity of
//! zero removes a level.
//!
//! The book does not validate crossed markets. The caller must discard a
//! depth event whose best bid is at or above its best ask before applying
//! it; a corrupt update is skipped and the next snapshot repairs the view.
//!
//! Hazard note: the engine treats the venue's depth stream as a snapshot
//! and clears the book before each apply. Should the venue ever switch to
//! delta semantics, the update path here is already correct but the clear
//! before apply must go.

use opus_models::{Price, PriceLevel, Quantity};

/// Maximum levels retained per side.
pub const MAX_LEVELS: usize = 1000;

/// Sorted L2 order book for a single symbol.
#[derive(Debug, Default)]
pub struct OrderBook {
    /// Strictly decreasing by price.
    bids: Vec<PriceLevel>,
    /// Strictly increasing by price.
    asks: Vec<PriceLevel>,
    last_update_id: u64,
    last_update_time_ms: i64,
    initialized: bool,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: Vec::with_capacity(64),
            asks: Vec::with_capacity(64),
            ..Self::default()
        }
    }

    /// Replace contents from a snapshot. Inputs must be pre-sorted (bids
    /// descending, asks ascending); anything past [`MAX_LEVELS`] is
    /// truncated.
    pub fn initialize(
        &mut self,
        bids: &[PriceLevel],
        asks: &[PriceLevel],
        last_update_id: u64,
        now_ms: i64,
    ) {
        self.clear();
        self.bids.extend_from_slice(&bids[..bids.len().min(MAX_LEVELS)]);
        self.asks.extend_from_slice(&asks[..asks.len().min(MAX_LEVELS)]);
        self.last_update_id = last_update_id;
        self.last_update_time_ms = now_ms;
        self.initialized = true;
    }

    /// Empty both sides and drop the initialized flag.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.last_update_id = 0;
        self.initialized = false;
    }

    /// Upsert or remove (qty 0) a bid level.
    pub fn update_bid(&mut self, price: Price, qty: Quantity) {
        Self::update_side(&mut self.bids, price, qty, SideOrder::Descending);
    }

    /// Upsert or remove (qty 0) an ask level.
    pub fn update_ask(&mut self, price: Price, qty: Quantity) {
        Self::update_side(&mut self.asks, price, qty, SideOrder::Ascending);
    }

    /// Stamp synchronization metadata after a batch of updates.
    pub fn set_last_update(&mut self, update_id: u64, now_ms: i64) {
        self.last_update_id = update_id;
        self.last_update_time_ms = now_ms;
        self.initialized = true;
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Midpoint of the touch, zero when either side is empty.
    pub fn mid_price(&self) -> Price {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => Price::from_raw((b.price.raw() + a.price.raw()) / 2),
            _ => Price::ZERO,
        }
    }

    /// Ask minus bid at the touch, zero when either side is empty.
    pub fn spread(&self) -> Price {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => Price::from_raw(a.price.raw() - b.price.raw()),
            _ => Price::ZERO,
        }
    }

    /// Spread as a percentage of the mid price.
    pub fn spread_pct(&self) -> f64 {
        let mid = self.mid_price();
        if mid.raw() == 0 {
            return 0.0;
        }
        self.spread().to_f64() / mid.to_f64() * 100.0
    }

    /// Top `n` bid levels, best first.
    pub fn bids(&self, n: usize) -> &[PriceLevel] {
        &self.bids[..n.min(self.bids.len())]
    }

    /// Top `n` ask levels, best first.
    pub fn asks(&self, n: usize) -> &[PriceLevel] {
        &self.asks[..n.min(self.asks.len())]
    }

    /// Total bid quantity over the top `levels`.
    pub fn bid_depth(&self, levels: usize) -> Quantity {
        Self::depth(&self.bids, levels)
    }

    /// Total ask quantity over the top `levels`.
    pub fn ask_depth(&self, levels: usize) -> Quantity {
        Self::depth(&self.asks, levels)
    }

    pub fn bid_count(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_count(&self) -> usize {
        self.asks.len()
    }

    pub fn last_update_id(&self) -> u64 {
        self.last_update_id
    }

    pub fn last_update_time_ms(&self) -> i64 {
        self.last_update_time_ms
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn depth(side: &[PriceLevel], levels: usize) -> Quantity {
        side.iter()
            .take(levels)
            .fold(Quantity::ZERO, |acc, l| acc + l.quantity)
    }

    fn update_side(side: &mut Vec<PriceLevel>, price: Price, qty: Quantity, order: SideOrder) {
        let search = side.binary_search_by(|level| match order {
            SideOrder::Descending => level.price.cmp(&price).reverse(),
            SideOrder::Ascending => level.price.cmp(&price),
        });

        if qty.is_zero() {
            if let Ok(idx) = search {
                side.remove(idx);
            }
            return;
        }

        match search {
            Ok(idx) => side[idx].quantity = qty,
            Err(idx) => {
                if side.len() < MAX_LEVELS {
                    side.insert(idx, PriceLevel::new(price, qty));
                } else if idx < MAX_LEVELS {
                    // Side is full: evict the worst-priced level.
                    side.pop();
                    side.insert(idx, PriceLevel::new(price, qty));
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum SideOrder {
    Descending,
    Ascending,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: f64) -> Price {
        Price::from_f64(v)
    }

    fn q(v: f64) -> Quantity {
        Quantity::from_f64(v)
    }

    fn assert_sorted(book: &OrderBook) {
        let bids = book.bids(MAX_LEVELS);
        for w in bids.windows(2) {
            assert!(w[0].price > w[1].price, "bids must strictly decrease");
        }
        let asks = book.asks(MAX_LEVELS);
        for w in asks.windows(2) {
            assert!(w[0].price < w[1].price, "asks must strictly increase");
        }
        for l in bids.iter().chain(asks) {
            assert!(!l.quantity.is_zero(), "no level may hold zero quantity");
        }
    }

    #[test]
    fn insert_keeps_sides_sorted() {
        let mut book = OrderBook::new();
        for v in [50_000.0, 49_998.0, 50_001.5, 49_999.0, 50_000.5] {
            book.update_bid(p(v), q(1.0));
            assert_sorted(&book);
        }
        for v in [50_010.0, 50_012.0, 50_011.0, 50_009.5] {
            book.update_ask(p(v), q(1.0));
            assert_sorted(&book);
        }
        assert_eq!(book.best_bid().unwrap().price, p(50_001.5));
        assert_eq!(book.best_ask().unwrap().price, p(50_009.5));
    }

    #[test]
    fn zero_quantity_removes_level() {
        let mut book = OrderBook::new();
        book.update_bid(p(50_000.0), q(1.0));
        book.update_bid(p(49_999.0), q(2.0));
        book.update_bid(p(50_000.0), Quantity::ZERO);
        assert_eq!(book.bid_count(), 1);
        assert_eq!(book.best_bid().unwrap().price, p(49_999.0));

        // Removing an absent level is a no-op.
        book.update_bid(p(42.0), Quantity::ZERO);
        assert_eq!(book.bid_count(), 1);
    }

    #[test]
    fn upsert_replaces_quantity_in_place() {
        let mut book = OrderBook::new();
        book.update_ask(p(50_010.0), q(1.0));
        book.update_ask(p(50_010.0), q(3.5));
        assert_eq!(book.ask_count(), 1);
        assert_eq!(book.best_ask().unwrap().quantity, q(3.5));
    }

    #[test]
    fn full_side_evicts_worst_level() {
        let mut book = OrderBook::new();
        for i in 0..MAX_LEVELS {
            book.update_bid(p(50_000.0 - i as f64), q(1.0));
        }
        assert_eq!(book.bid_count(), MAX_LEVELS);

        // A better price pushes out the worst.
        book.update_bid(p(50_001.0), q(1.0));
        assert_eq!(book.bid_count(), MAX_LEVELS);
        assert_eq!(book.best_bid().unwrap().price, p(50_001.0));
        let worst = book.bids(MAX_LEVELS).last().unwrap().price;
        assert_eq!(worst, p(50_000.0 - (MAX_LEVELS - 2) as f64));

        // A worse-than-worst price is ignored.
        book.update_bid(p(1.0), q(1.0));
        assert_eq!(book.bid_count(), MAX_LEVELS);
        assert_sorted(&book);
    }

    #[test]
    fn mixed_update_sequence_preserves_invariants() {
        // Deterministic pseudo-random walk over both sides.
        let mut book = OrderBook::new();
        let mut seed = 0x2545F4914F6CDD1Du64;
        for _ in 0..5000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let price = p(40_000.0 + (seed % 2000) as f64);
            let qty = if seed % 7 == 0 { Quantity::ZERO } else { q(((seed >> 8) % 100 + 1) as f64 * 0.01) };
            if seed % 2 == 0 {
                book.update_bid(price, qty);
            } else {
                book.update_ask(price, qty);
            }
            assert!(book.bid_count() <= MAX_LEVELS);
            assert!(book.ask_count() <= MAX_LEVELS);
        }
        assert_sorted(&book);
    }

    #[test]
    fn mid_spread_and_depth() {
        let mut book = OrderBook::new();
        book.update_bid(p(50_000.0), q(2.0));
        book.update_bid(p(49_999.0), q(3.0));
        book.update_ask(p(50_001.0), q(1.0));
        book.update_ask(p(50_002.0), q(4.0));

        assert_eq!(book.mid_price(), p(50_000.5));
        assert_eq!(book.spread(), p(1.0));
        let expected_pct = 1.0 / 50_000.5 * 100.0;
        assert!((book.spread_pct() - expected_pct).abs() < 1e-9);
        assert_eq!(book.bid_depth(10), q(5.0));
        assert_eq!(book.ask_depth(1), q(1.0));
    }

    #[test]
    fn empty_book_queries_are_zero() {
        let book = OrderBook::new();
        assert!(book.best_bid().is_none());
        assert_eq!(book.mid_price(), Price::ZERO);
        assert_eq!(book.spread(), Price::ZERO);
        assert_eq!(book.spread_pct(), 0.0);
        assert_eq!(book.bid_depth(10), Quantity::ZERO);
    }

    #[test]
    fn initialize_truncates_and_stamps() {
        let bids: Vec<PriceLevel> = (0..1200)
            .map(|i| PriceLevel::new(p(50_000.0 - i as f64), q(1.0)))
            .collect();
        let asks: Vec<PriceLevel> = (0..3)
            .map(|i| PriceLevel::new(p(50_001.0 + i as f64), q(1.0)))
            .collect();

        let mut book = OrderBook::new();
        book.initialize(&bids, &asks, 99, 1_700_000_000_000);
        assert_eq!(book.bid_count(), MAX_LEVELS);
        assert_eq!(book.ask_count(), 3);
        assert_eq!(book.last_update_id(), 99);
        assert_eq!(book.last_update_time_ms(), 1_700_000_000_000);
        assert!(book.is_initialized());

        book.clear();
        assert!(!book.is_initialized());
        assert_eq!(book.bid_count(), 0);
    }
}
