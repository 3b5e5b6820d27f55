//! Per-slot execution: one assignment runs its flat range sequentially.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::mapper::IndexMapper2D;
use smt_util::basics::IndexRange;

/// Loop body addressed by flat index.
///
/// `Sync` because every slot calls the same body concurrently.
pub trait LoopBody: Sync {
    fn call_flat(&self, flat: usize);
}

/// `callback(low + flat)` over an inclusive 1D range.
pub struct OneDBody<'f, F> {
    low: i64,
    callback: &'f F,
}

impl<'f, F> OneDBody<'f, F> {
    pub fn new(low: i64, callback: &'f F) -> Self {
        Self { low, callback }
    }
}

impl<F> LoopBody for OneDBody<'_, F>
where
    F: Fn(i64) + Sync,
{
    #[inline]
    fn call_flat(&self, flat: usize) {
        // low + flat never leaves [low, high], so the wrapped sum is exact.
        (self.callback)(self.low.wrapping_add(flat as i64));
    }
}

/// `callback(row, col)` over a row-major rectangle.
pub struct TwoDBody<'f, F> {
    mapper: IndexMapper2D,
    callback: &'f F,
}

impl<'f, F> TwoDBody<'f, F> {
    pub fn new(mapper: IndexMapper2D, callback: &'f F) -> Self {
        Self { mapper, callback }
    }
}

impl<F> LoopBody for TwoDBody<'_, F>
where
    F: Fn(i64, i64) + Sync,
{
    #[inline]
    fn call_flat(&self, flat: usize) {
        if let Some((row, col)) = self.mapper.map(flat) {
            (self.callback)(row, col);
        }
    }
}

/// A panic caught while running one slot.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SlotFault {
    pub slot: usize,
    pub message: String,
}

impl SlotFault {
    pub(crate) fn from_payload(slot: usize, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { slot, message }
    }
}

/// One slot's share of the loop. Never mutated after creation.
pub struct WorkAssignment<'a, B: ?Sized> {
    slot: usize,
    range: IndexRange,
    body: &'a B,
}

impl<'a, B: LoopBody + ?Sized> WorkAssignment<'a, B> {
    pub fn new(slot: usize, range: IndexRange, body: &'a B) -> Self {
        Self { slot, range, body }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn range(&self) -> IndexRange {
        self.range
    }

    /// Runs every flat index in order, catching a panic from the body.
    pub fn execute(&self) -> Result<(), SlotFault> {
        let body = self.body;
        let range = self.range;
        panic::catch_unwind(AssertUnwindSafe(|| {
            for flat in range {
                body.call_flat(flat);
            }
        }))
        .map_err(|payload| SlotFault::from_payload(self.slot, payload))
    }
}
