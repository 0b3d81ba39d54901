//! Platform-agnostic building blocks for the task pool scheduler.
//!
//! This crate has no threads and makes no OS calls. It contains only the
//! data structures shared by every runtime on top of it:
//!
//! - [`task`]: a fixed-size, type-erased, move-only nullary callable.
//! - [`queue`]: a bounded lock-free MPMC ring buffer of such callables.
//! - [`error`]: the error taxonomy for both.
//! - [`constants`]: sizes and sentinels shared across the crate family.

pub mod constants;
pub mod error;
pub mod queue;
pub mod task;

pub use error::{EmptyCallable, QueueError};
pub use queue::RingQueue;
pub use task::FixedTask;
