//! OS-thread runtime for the task pool scheduler: workers, the pool,
//! thread-local worker affinity, and per-worker parking.
//!
//! Layered on [`taskpool_core`], which contributes the platform-agnostic
//! [`taskpool_core::FixedTask`] queue element and
//! [`taskpool_core::RingQueue`]. This crate adds everything that needs
//! an OS thread: [`worker::Worker`], [`pool::Pool`], the thread-local
//! "current worker id" in [`tls`], and the [`process`] facade built atop
//! both.

mod config;
mod error;
mod parker;
mod pool;
mod process;
mod tls;
mod trace;
mod worker;

pub use config::{PoolOptions, DEFAULT_QUEUE_CAPACITY};
pub use error::{ConfigError, PoolError, QueueFull};
pub use pool::Pool;
pub use process::{process, JoinHandle};
pub use tls::current_worker_id;
pub use trace::{Trace, TraceEvent};
