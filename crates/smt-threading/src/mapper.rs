//! Flat index to `(row, col)` within a queried rectangle, row-major.

use crate::range::Range2D;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IndexMapper2D {
    low1: i64,
    high1: i64,
    low2: i64,
    high2: i64,
    /// `high2 - low2`, the rectangle's own width.
    width: u128,
}

impl IndexMapper2D {
    pub fn new(range: &Range2D) -> Self {
        Self {
            low1: range.low1(),
            high1: range.high1(),
            low2: range.low2(),
            high2: range.high2(),
            width: (range.high2() as i128 - range.low2() as i128) as u128,
        }
    }

    /// Coordinates of `flat`, or `None` if they fall outside the rectangle.
    #[inline]
    pub fn map(&self, flat: usize) -> Option<(i64, i64)> {
        let flat = flat as u128;
        let row = self.low1 as i128 + (flat / self.width) as i128;
        let col = self.low2 as i128 + (flat % self.width) as i128;
        if row < self.high1 as i128 && col < self.high2 as i128 {
            Some((row as i64, col as i64))
        } else {
            None
        }
    }
}
