//! Pool construction options.
//!
//! A plain builder with chainable setters and a `Default`. Options are
//! never read from the environment or a CLI — a caller configures a
//! pool entirely through this surface.

use crate::error::ConfigError;
use crate::trace::Trace;

/// Default per-worker queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Construction options for a [`crate::pool::Pool`].
#[derive(Clone)]
pub struct PoolOptions {
    thread_count: usize,
    worker_queue_capacity: usize,
    trace: Option<Trace>,
}

impl PoolOptions {
    /// Start from the defaults: auto-detected thread count, 1024-entry
    /// per-worker queues, no trace sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of worker threads. `0` auto-detects the host's hardware
    /// concurrency at [`crate::pool::Pool::new`] time, falling back to 1
    /// if the host reports 0.
    pub fn thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    /// Capacity of each worker's ring queue. Must be a power of two >= 2;
    /// checked by [`PoolOptions::validate`], not here, so the builder
    /// itself never panics.
    pub fn worker_queue_capacity(mut self, capacity: usize) -> Self {
        self.worker_queue_capacity = capacity;
        self
    }

    /// Install a diagnostic trace sink. `None` (the default) costs
    /// nothing on the hot path.
    pub fn trace(mut self, trace: Trace) -> Self {
        self.trace = Some(trace);
        self
    }

    pub(crate) fn resolved_thread_count(&self) -> usize {
        if self.thread_count != 0 {
            return self.thread_count;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .max(1)
    }

    pub(crate) fn queue_capacity(&self) -> usize {
        self.worker_queue_capacity
    }

    pub(crate) fn trace_sink(&self) -> Option<Trace> {
        self.trace.clone()
    }

    /// Reject an unusable `worker_queue_capacity`. `thread_count == 0` is
    /// a valid auto-detect sentinel, never an error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_queue_capacity < 2 || !self.worker_queue_capacity.is_power_of_two() {
            return Err(ConfigError::InvalidQueueCapacity(
                self.worker_queue_capacity,
            ));
        }
        Ok(())
    }
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            thread_count: 0,
            worker_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            trace: None,
        }
    }
}
