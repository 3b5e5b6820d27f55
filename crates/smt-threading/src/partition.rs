//! Static chunking of a flat iteration space across thread slots.

use crate::error::{Result, ThreadingError};
use smt_util::basics::{div_ceil, make_index_range, IndexRange};

/// Equal-sized contiguous chunks, rounded up.
///
/// Slot `s` owns `[s * chunk_size, min((s + 1) * chunk_size, total_count))`.
/// Trailing slots are empty when there are more slots than chunks of work.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PartitionPlan {
    total_count: usize,
    chunk_size: usize,
    slot_count: usize,
}

impl PartitionPlan {
    pub fn new(total_count: usize, slot_count: usize) -> Result<Self> {
        if slot_count == 0 {
            tracing::error!("thread count must be at least 1");
            return Err(ThreadingError::InvalidThreadCount(slot_count));
        }
        Ok(Self {
            total_count,
            chunk_size: div_ceil(total_count, slot_count),
            slot_count,
        })
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn slot_range(&self, slot: usize) -> IndexRange {
        debug_assert!(slot < self.slot_count);
        let begin = slot.saturating_mul(self.chunk_size);
        make_index_range(begin, self.total_count, self.chunk_size)
    }

    /// `(slot, range)` for every slot, empty ones included.
    pub fn slots(&self) -> impl Iterator<Item = (usize, IndexRange)> + '_ {
        (0..self.slot_count).map(move |slot| (slot, self.slot_range(slot)))
    }

    /// Slots that receive at least one index.
    pub fn busy_slots(&self) -> usize {
        if self.chunk_size == 0 {
            0
        } else {
            div_ceil(self.total_count, self.chunk_size)
        }
    }
}
