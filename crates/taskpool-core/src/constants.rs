//! Shared sizes and sentinels.

/// Default inline storage budget for a [`crate::FixedTask`], in bytes.
pub const DEFAULT_TASK_SIZE: usize = 128;

/// Size of a cache line on the architectures this crate targets.
///
/// Used to pad the ring queue's producer and consumer position counters
/// apart so they never share a cache line.
pub const CACHE_LINE_SIZE: usize = 64;

/// Sentinel value of the thread-local "current worker id" when the
/// calling thread is not one of a pool's workers.
pub const WORKER_ID_NONE: usize = usize::MAX;
