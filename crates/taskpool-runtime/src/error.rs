//! Error types for pool construction and submission.
//!
//! Plain enums with hand-written `Display`, matching the style of
//! [`taskpool_core::error`] rather than a macro-derived error crate.

use std::fmt;

/// A [`crate::config::PoolOptions`] failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `worker_queue_capacity` was zero or not a power of two.
    InvalidQueueCapacity(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidQueueCapacity(cap) => write!(
                f,
                "invalid worker queue capacity {cap}: must be a power of two >= 2"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A [`crate::pool::Pool`] failed to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The supplied options did not validate.
    Config(ConfigError),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Config(e) => write!(f, "pool configuration error: {e}"),
        }
    }
}

impl std::error::Error for PoolError {}

impl From<ConfigError> for PoolError {
    fn from(e: ConfigError) -> Self {
        PoolError::Config(e)
    }
}

/// A task could not be submitted because every worker queue was full.
///
/// Only ever returned by [`crate::pool::Pool::try_post`] and the
/// `process` facade's initial submission attempt. [`crate::pool::Pool::post`]
/// never returns this: it blocks instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl fmt::Display for QueueFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every worker queue was full")
    }
}

impl std::error::Error for QueueFull {}
