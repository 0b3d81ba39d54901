//! Optional, programmatic debug tracing.
//!
//! A callback a caller opts into through [`crate::config::PoolOptions`]
//! — the hot path pays nothing when it is `None`, and nothing here reads
//! the environment.

use std::sync::Arc;

/// A diagnostic event emitted by a worker or the pool.
///
/// Carries no payload from the task itself: tracing is an observability
/// hook, not a result channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// A worker found no local or stealable work and parked.
    WorkerParked { worker: usize },
    /// A parked worker was woken.
    WorkerWoken { worker: usize },
    /// `worker` popped a task out of `victim`'s queue.
    TaskStolen { thief: usize, victim: usize },
    /// A `try_post` onto `worker`'s queue found it full.
    QueueFull { worker: usize },
    /// A task's invocation unwound; the worker suppressed it and continued.
    TaskPanicked { worker: usize },
}

/// A sink for [`TraceEvent`]s, shared by every worker and the pool.
pub type Trace = Arc<dyn Fn(TraceEvent) + Send + Sync>;

/// Invoke `trace` with `event` if a sink is configured.
#[inline]
pub(crate) fn emit(trace: &Option<Trace>, event: TraceEvent) {
    if let Some(sink) = trace {
        sink(event);
    }
}
