//! Loop bounds and their validation.
//!
//! A rejected range never reaches the partitioner: the caller gets an
//! `InvalidRange*` error and the callback is never invoked.

use crate::error::{Result, ThreadingError};
use smt_util::basics::Extents2D;

/// Inclusive interval `[low, high]`.
///
/// Only `high > low` is accepted, so the single-element call `low == high`
/// is rejected even though the interval itself would be non-empty.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Range1D {
    low: i64,
    high: i64,
}

impl Range1D {
    pub fn new(low: i64, high: i64) -> Result<Self> {
        if high <= low {
            tracing::error!(
                low,
                high,
                "cannot process range: low {low} is not below high {high}"
            );
            return Err(ThreadingError::InvalidRange1D { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }

    /// Number of indices in `[low, high]`.
    pub fn count(&self) -> Result<usize> {
        let count = (self.high as i128 - self.low as i128 + 1) as u128;
        usize::try_from(count).map_err(|_| ThreadingError::RangeTooLarge { count })
    }
}

/// Rows `[low1, high1)` by columns `[low2, high2)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Range2D {
    low1: i64,
    high1: i64,
    low2: i64,
    high2: i64,
}

impl Range2D {
    pub fn new(low1: i64, high1: i64, low2: i64, high2: i64) -> Result<Self> {
        if high1 <= low1 || high2 <= low2 {
            tracing::error!(
                low1,
                high1,
                low2,
                high2,
                "invalid bounds: low1 >= high1 or low2 >= high2"
            );
            return Err(ThreadingError::InvalidRange2D {
                low1,
                high1,
                low2,
                high2,
            });
        }
        Ok(Self {
            low1,
            high1,
            low2,
            high2,
        })
    }

    pub fn low1(&self) -> i64 {
        self.low1
    }

    pub fn high1(&self) -> i64 {
        self.high1
    }

    pub fn low2(&self) -> i64 {
        self.low2
    }

    pub fn high2(&self) -> i64 {
        self.high2
    }

    pub fn extents(&self) -> Result<Extents2D> {
        let rows = axis_len(self.low1, self.high1)?;
        let cols = axis_len(self.low2, self.high2)?;
        Ok(Extents2D::new(rows, cols))
    }

    /// Number of `(row, col)` pairs in the rectangle.
    pub fn count(&self) -> Result<usize> {
        let extents = self.extents()?;
        extents.checked_area().ok_or(ThreadingError::RangeTooLarge {
            count: extents.rows as u128 * extents.cols as u128,
        })
    }
}

fn axis_len(low: i64, high: i64) -> Result<usize> {
    let count = (high as i128 - low as i128) as u128;
    usize::try_from(count).map_err(|_| ThreadingError::RangeTooLarge { count })
}
