//! `process`: a thin facade wrapping a result-returning callable in a
//! one-shot handle, built entirely atop `try_post`/`post`. Adds no
//! scheduling logic of its own and owns no thread. The one-shot result
//! slot is a `Mutex<Option<T>>` plus a `Condvar` — the same primitive
//! [`crate::parker::Parker`] uses for a single worker's wake predicate.

use crate::error::QueueFull;
use crate::pool::Pool;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Condvar, Mutex};
use taskpool_core::FixedTask;

enum Outcome<R> {
    Value(R),
    Panicked(Box<dyn std::any::Any + Send + 'static>),
}

struct Slot<R> {
    outcome: Mutex<Option<Outcome<R>>>,
    condvar: Condvar,
}

/// A handle to the eventual result of a [`process`]-submitted callable.
pub struct JoinHandle<R> {
    slot: Arc<Slot<R>>,
}

impl<R> JoinHandle<R> {
    /// Block until the callable has run, returning its value.
    ///
    /// Re-raises the callable's panic (via [`std::panic::resume_unwind`])
    /// rather than swallowing it, since a caller using this facade has
    /// opted into observing the outcome — unlike a plain posted task,
    /// whose failures the worker loop suppresses.
    pub fn join(self) -> R {
        let mut outcome = self.slot.outcome.lock().unwrap();
        while outcome.is_none() {
            outcome = self.slot.condvar.wait(outcome).unwrap();
        }
        match outcome.take().unwrap() {
            Outcome::Value(v) => v,
            Outcome::Panicked(payload) => std::panic::resume_unwind(payload),
        }
    }
}

/// Submit `f` to `pool`, returning a handle to its eventual result.
///
/// Fails with [`QueueFull`] if the initial, non-blocking submission
/// attempt finds every worker queue full. Unlike [`Pool::post`], this
/// does not fall back to blocking: a caller reaching for a
/// result-bearing handle has opted into observing backpressure rather
/// than being silently stalled.
pub fn process<F, R>(pool: &Pool, f: F) -> Result<JoinHandle<R>, QueueFull>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let slot = Arc::new(Slot {
        outcome: Mutex::new(None),
        condvar: Condvar::new(),
    });
    let fulfilling = slot.clone();

    let task = FixedTask::new(move || {
        let outcome = match std::panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(v) => Outcome::Value(v),
            Err(payload) => Outcome::Panicked(payload),
        };
        *fulfilling.outcome.lock().unwrap() = Some(outcome);
        fulfilling.condvar.notify_all();
    });

    if pool.try_post(task) {
        Ok(JoinHandle { slot })
    } else {
        Err(QueueFull)
    }
}
