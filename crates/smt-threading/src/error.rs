use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThreadingError {
    /// The inclusive 1D range needs `high > low`.
    #[error("invalid range: low {low} is not below high {high}")]
    InvalidRange1D { low: i64, high: i64 },

    /// Both half-open 2D axes need `high > low`.
    #[error("invalid bounds: rows [{low1}, {high1}) or cols [{low2}, {high2}) is empty")]
    InvalidRange2D {
        low1: i64,
        high1: i64,
        low2: i64,
        high2: i64,
    },

    #[error("thread count must be >= 1, got {0}")]
    InvalidThreadCount(usize),

    #[error("range holds {count} indices, which does not fit in usize")]
    RangeTooLarge { count: u128 },

    /// Too many slots to hold a join handle for each spawned thread.
    #[error("cannot track {requested} worker threads: {source}")]
    ThreadCapacity {
        requested: usize,
        #[source]
        source: std::collections::TryReserveError,
    },

    #[error("failed to spawn worker for slot {slot}: {source}")]
    Spawn {
        slot: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("callback panicked in slot {slot}: {message}")]
    WorkerPanicked { slot: usize, message: String },
}

impl ThreadingError {
    pub fn is_invalid_range(&self) -> bool {
        matches!(
            self,
            Self::InvalidRange1D { .. } | Self::InvalidRange2D { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ThreadingError>;
