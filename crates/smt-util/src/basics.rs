//! Core index types and helpers.

/// Row and column counts of a rectangular iteration space.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Extents2D {
    pub rows: usize,
    pub cols: usize,
}

impl Extents2D {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// `None` when `rows * cols` does not fit in `usize`.
    pub fn checked_area(self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }
}

/// Half-open range of flat indices `[begin, end)`. May be empty.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexRange {
    pub begin: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn new(begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end);
        Self { begin, end }
    }

    pub fn num(self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(self) -> bool {
        self.begin == self.end
    }

    pub fn overlaps(self, other: IndexRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.begin < other.end && other.begin < self.end
    }

    pub fn iter(self) -> IndexRangeIter {
        IndexRangeIter {
            cur: self.begin,
            end: self.end,
        }
    }
}

impl IntoIterator for IndexRange {
    type Item = usize;
    type IntoIter = IndexRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct IndexRangeIter {
    cur: usize,
    end: usize,
}

impl Iterator for IndexRangeIter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur >= self.end {
            None
        } else {
            let out = self.cur;
            self.cur += 1;
            Some(out)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.cur);
        (n, Some(n))
    }
}

impl ExactSizeIterator for IndexRangeIter {}

/// Range starting at `begin` holding at most `max_size` indices, clamped to `end`.
///
/// A `begin` at or past `end` yields the empty range `[end, end)`.
pub fn make_index_range(begin: usize, end: usize, max_size: usize) -> IndexRange {
    let begin = begin.min(end);
    IndexRange::new(begin, begin.saturating_add(max_size).min(end))
}

/// `ceil(num / den)` for `den > 0`.
pub const fn div_ceil(num: usize, den: usize) -> usize {
    num / den + (num % den != 0) as usize
}
