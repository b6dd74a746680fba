//! Wait-free single-producer single-consumer ring buffer.
//!
//! One slot is reserved to distinguish full from empty, so a ring built
//! with `capacity` slots holds `capacity - 1` items. Head (producer write
//! index) and tail (consumer read index) live on separate cache lines.
//!
//! Ordering discipline: the producer reads the tail with `Acquire` (sees
//! consumer progress) and publishes its write with a `Release` store of
//! the head; the consumer mirrors this. Slot contents are plain `Copy`
//! writes ordered by those fences.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 64-byte padding wrapper to keep the two indices off each other's cache
/// line.
#[repr(align(64))]
struct CacheAligned(AtomicUsize);

struct Inner<T> {
    head: CacheAligned,
    tail: CacheAligned,
    mask: usize,
    slots: Box<[UnsafeCell<T>]>,
}

// The producer and consumer handles hand out disjoint slot access; the
// index protocol above makes that access data-race free.
unsafe impl<T: Send + Copy> Send for Inner<T> {}
unsafe impl<T: Send + Copy> Sync for Inner<T> {}

impl<T: Copy + Default> Inner<T> {
    fn with_capacity(capacity: usize) -> Self {
        assert!(capacity >= 2, "ring capacity must be at least 2");
        assert!(
            capacity.is_power_of_two(),
            "ring capacity must be a power of two"
        );
        let slots: Vec<UnsafeCell<T>> = (0..capacity).map(|_| UnsafeCell::new(T::default())).collect();
        Self {
            head: CacheAligned(AtomicUsize::new(0)),
            tail: CacheAligned(AtomicUsize::new(0)),
            mask: capacity - 1,
            slots: slots.into_boxed_slice(),
        }
    }

    fn len(&self) -> usize {
        let head = self.head.0.load(Ordering::Acquire);
        let tail = self.tail.0.load(Ordering::Acquire);
        head.wrapping_sub(tail) & self.mask
    }
}

/// Producer half. Owned by exactly one thread.
pub struct Producer<T> {
    inner: Arc<Inner<T>>,
}

/// Consumer half. Owned by exactly one thread.
pub struct Consumer<T> {
    inner: Arc<Inner<T>>,
}

/// Build a ring with `capacity` slots (power of two, >= 2). Usable
/// capacity is `capacity - 1`.
pub fn spsc_ring<T: Copy + Default>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let inner = Arc::new(Inner::with_capacity(capacity));
    (
        Producer {
            inner: Arc::clone(&inner),
        },
        Consumer { inner },
    )
}

impl<T: Copy + Default> Producer<T> {
    /// Try to enqueue. Returns `false` when the ring is full; the caller
    /// decides whether a drop matters.
    #[inline]
    pub fn try_push(&mut self, item: T) -> bool {
        let inner = &*self.inner;
        let head = inner.head.0.load(Ordering::Relaxed);
        let next = head.wrapping_add(1) & inner.mask;
        if next == inner.tail.0.load(Ordering::Acquire) {
            return false;
        }
        // Safety: `head` is owned by this producer until the release store
        // below publishes it; the full check above proves the consumer is
        // not reading this slot.
        unsafe {
            *inner.slots[head].get() = item;
        }
        inner.head.0.store(next, Ordering::Release);
        true
    }

    /// May be stale, but monotonically consistent for the calling thread.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.inner.mask
    }

    /// Usable capacity (slots minus the reserved one).
    pub fn capacity(&self) -> usize {
        self.inner.mask
    }
}

impl<T: Copy + Default> Consumer<T> {
    /// Try to dequeue. Returns `None` when the ring is empty.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        let inner = &*self.inner;
        let tail = inner.tail.0.load(Ordering::Relaxed);
        if tail == inner.head.0.load(Ordering::Acquire) {
            return None;
        }
        // Safety: head != tail proves the producer has published this slot
        // and will not rewrite it until tail advances past it.
        let item = unsafe { *inner.slots[tail].get() };
        inner
            .tail
            .0
            .store(tail.wrapping_add(1) & inner.mask, Ordering::Release);
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.inner.mask
    }

    pub fn capacity(&self) -> usize {
        self.inner.mask
    }
}
