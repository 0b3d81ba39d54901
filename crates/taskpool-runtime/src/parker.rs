//! Per-worker parking primitive: a mutex-guarded boolean predicate plus
//! a condvar, with no platform-specific futex path.
//!
//! The predicate is reset by the waking side's read in [`Parker::park`],
//! never by the poster, so a `wake` that lands before `park` is called
//! is not lost: the next `park` observes `ready = true` and returns
//! immediately without ever touching the condvar.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

pub(crate) struct Parker {
    ready: Mutex<bool>,
    condvar: Condvar,
}

impl Parker {
    pub(crate) fn new() -> Self {
        Self {
            ready: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Set the wake predicate and notify one waiter. Idempotent: calling
    /// this repeatedly before anyone parks just leaves `ready = true`.
    pub(crate) fn wake(&self) {
        let mut ready = self.ready.lock().unwrap();
        *ready = true;
        self.condvar.notify_one();
    }

    /// Block until woken, clearing the predicate on the way out.
    pub(crate) fn park(&self) {
        let mut ready = self.ready.lock().unwrap();
        while !*ready {
            ready = self.condvar.wait(ready).unwrap();
        }
        *ready = false;
    }

    /// Block until woken or `timeout` elapses, clearing the predicate if
    /// it was set. Used by the pool's "all queues full" backoff, which
    /// never expects to actually be woken — liveness there comes from
    /// consumption at any worker, not from a notify — so a timeout that
    /// elapses is the ordinary case, not a failure.
    pub(crate) fn park_timeout(&self, timeout: Duration) {
        let ready = self.ready.lock().unwrap();
        if *ready {
            drop(ready);
            *self.ready.lock().unwrap() = false;
            return;
        }
        let (mut ready, _) = self.condvar.wait_timeout(ready, timeout).unwrap();
        *ready = false;
    }
}
