//! A header-only-style work-stealing task pool, ported to a single
//! programmatic Rust API.
//!
//! A fixed set of worker threads, each owning a bounded lock-free
//! [`RingQueue`], steal from one another cooperatively and park when
//! idle. Submission prefers the caller's own worker queue when the
//! caller is itself a pool thread, and falls back to round-robin
//! dispatch otherwise.
//!
//! ```
//! use taskpool::{Pool, PoolOptions};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pool = Pool::new(PoolOptions::new().thread_count(2).worker_queue_capacity(8)).unwrap();
//! let counter = Arc::new(AtomicUsize::new(0));
//! for _ in 0..10 {
//!     let c = counter.clone();
//!     pool.post(taskpool::task(move || {
//!         c.fetch_add(1, Ordering::SeqCst);
//!     }));
//! }
//! drop(pool);
//! assert_eq!(counter.load(Ordering::SeqCst), 10);
//! ```
//!
//! This crate is a facade: the platform-agnostic data structures live in
//! `taskpool-core` and the thread/parking runtime lives in
//! `taskpool-runtime`. Depend on this crate alone for the combined
//! public surface of both.

pub use taskpool_core::constants::{DEFAULT_TASK_SIZE, WORKER_ID_NONE};
pub use taskpool_core::{EmptyCallable, FixedTask, QueueError, RingQueue};

pub use taskpool_runtime::{
    current_worker_id, process, ConfigError, JoinHandle, Pool, PoolError, PoolOptions, QueueFull,
    Trace, TraceEvent, DEFAULT_QUEUE_CAPACITY,
};

/// Wrap `f` as a [`FixedTask`] with the default inline storage budget.
///
/// A small convenience so callers don't need to name `FixedTask`
/// directly for the common case; equivalent to `FixedTask::new(f)`.
pub fn task<F>(f: F) -> FixedTask
where
    F: FnOnce() + Send + 'static,
{
    FixedTask::new(f)
}
