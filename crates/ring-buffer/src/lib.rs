//! Bounded Ring Buffer
//!
//! Keeps the most recent observations of a monitoring session in capture
//! order and answers time-window queries over them.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};

use thiserror::Error;

/// Anything stored in the buffer carries a capture timestamp.
///
/// Timestamps are milliseconds on a clock that is comparable for the whole
/// lifetime of the owning session.
pub trait Timestamped {
    fn timestamp_ms(&self) -> u64;
}

/// Ring buffer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("Entry at {timestamp_ms}ms is older than newest entry at {newest_ms}ms")]
    OutOfOrder { timestamp_ms: u64, newest_ms: u64 },
}
