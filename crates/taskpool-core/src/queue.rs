//! A bounded, lock-free, multi-producer/multi-consumer ring queue.
//!
//! Vyukov-style: each cell carries its own sequence counter, so producers
//! and consumers coordinate without a lock, synchronizing only through
//! the cell they are actually touching.

use crate::constants::CACHE_LINE_SIZE;
use crate::error::QueueError;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

#[repr(align(64))]
struct CachePadded<T>(T);

struct Cell<T> {
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

const _: () = assert!(CACHE_LINE_SIZE == 64, "padding assumes 64-byte cache lines");

/// A bounded MPMC queue of power-of-two capacity.
///
/// `push` and `pop` never block; each returns immediately whether or not
/// it succeeded. A failed `push` hands the value back rather than
/// dropping it, so callers can retry elsewhere. Safe to share across any
/// number of producer and consumer threads via `&RingQueue<T>`.
pub struct RingQueue<T> {
    buffer: Box<[Cell<T>]>,
    mask: usize,
    enqueue_pos: CachePadded<AtomicUsize>,
    dequeue_pos: CachePadded<AtomicUsize>,
}

impl<T> RingQueue<T> {
    /// Build a queue holding up to `capacity` items.
    ///
    /// `capacity` must be a power of two and at least 2.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(QueueError::invalid_capacity(capacity));
        }

        let buffer = (0..capacity)
            .map(|i| Cell {
                sequence: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            buffer,
            mask: capacity - 1,
            enqueue_pos: CachePadded(AtomicUsize::new(0)),
            dequeue_pos: CachePadded(AtomicUsize::new(0)),
        })
    }

    /// The queue's fixed capacity.
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Attempt to enqueue `value`.
    ///
    /// On success the value has been moved into the queue. On failure
    /// (the queue is full) `value` is handed back to the caller rather
    /// than dropped, so a caller can retry elsewhere.
    pub fn push(&self, value: T) -> Result<(), T> {
        let mut pos = self.enqueue_pos.0.load(Ordering::Relaxed);
        loop {
            let cell = &self.buffer[pos & self.mask];
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;

            if diff == 0 {
                match self.enqueue_pos.0.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe { (*cell.value.get()).write(value) };
                        cell.sequence.store(pos + 1, Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return Err(value);
            } else {
                pos = self.enqueue_pos.0.load(Ordering::Relaxed);
            }
        }
    }

    /// Attempt to dequeue the oldest value. Returns `None` if empty.
    pub fn pop(&self) -> Option<T> {
        let mut pos = self.dequeue_pos.0.load(Ordering::Relaxed);
        loop {
            let cell = &self.buffer[pos & self.mask];
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = seq as isize - (pos + 1) as isize;

            if diff == 0 {
                match self.dequeue_pos.0.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = unsafe { (*cell.value.get()).assume_init_read() };
                        cell.sequence
                            .store(pos + self.capacity(), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return None;
            } else {
                pos = self.dequeue_pos.0.load(Ordering::Relaxed);
            }
        }
    }

    /// `true` if the queue currently holds no items.
    ///
    /// Racy under concurrent use; intended for diagnostics only.
    pub fn is_empty(&self) -> bool {
        self.dequeue_pos.0.load(Ordering::Relaxed) == self.enqueue_pos.0.load(Ordering::Relaxed)
    }
}

impl<T> Drop for RingQueue<T> {
    fn drop(&mut self) {
        let dequeue = *self.dequeue_pos.0.get_mut();
        let enqueue = *self.enqueue_pos.0.get_mut();
        for pos in dequeue..enqueue {
            let cell = &mut self.buffer[pos & self.mask];
            unsafe { cell.value.get_mut().assume_init_drop() };
        }
    }
}

// Safety: every cell access is gated by the sequence-counter protocol
// above, which hands each element to exactly one thread at a time.
unsafe impl<T: Send> Send for RingQueue<T> {}
unsafe impl<T: Send> Sync for RingQueue<T> {}
