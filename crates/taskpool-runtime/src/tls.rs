//! Thread-local "current worker id".
//!
//! A `Cell` in a `thread_local!` block, written once by a worker thread
//! on entry and read by [`crate::pool::Pool::post`] to bias dispatch
//! toward the caller's own queue. Reads from any non-worker thread
//! return [`taskpool_core::constants::WORKER_ID_NONE`].

use std::cell::Cell;
use taskpool_core::constants::WORKER_ID_NONE;

thread_local! {
    static CURRENT_WORKER_ID: Cell<usize> = const { Cell::new(WORKER_ID_NONE) };
}

/// Bind this OS thread to `id`. Called exactly once, by the worker
/// thread itself, on entry to its execution loop.
pub(crate) fn set_current_worker_id(id: usize) {
    CURRENT_WORKER_ID.with(|cell| cell.set(id));
}

/// The calling thread's worker id, or [`WORKER_ID_NONE`] if it is not
/// one of a pool's worker threads.
///
/// [`WORKER_ID_NONE`]: taskpool_core::constants::WORKER_ID_NONE
pub fn current_worker_id() -> usize {
    CURRENT_WORKER_ID.with(|cell| cell.get())
}
