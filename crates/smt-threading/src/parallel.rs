//! Validate, partition, dispatch, join, report.
//!
//! Slot 0 always runs on the calling thread before anything is spawned, then
//! one scoped thread per remaining slot runs its assignment. Threads are
//! created fresh for every call and joined before it returns.

use std::thread;
use std::time::Duration;

use crate::error::{Result, ThreadingError};
use crate::mapper::IndexMapper2D;
use crate::partition::PartitionPlan;
use crate::range::{Range1D, Range2D};
use crate::worker::{LoopBody, OneDBody, SlotFault, TwoDBody, WorkAssignment};
use smt_util::timing::{micros, Timer};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ParallelismStrategy {
    /// Every slot runs inline on the caller, in slot order.
    None,
    /// Slot 0 inline, one spawned thread per remaining slot.
    #[default]
    Flat,
}

impl ParallelismStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ParallelismStrategy::None => "none",
            ParallelismStrategy::Flat => "flat",
        }
    }
}

/// What a completed call did.
#[derive(Copy, Clone, Debug)]
pub struct ExecutionReport {
    pub plan: PartitionPlan,
    pub strategy: ParallelismStrategy,
    /// Threads spawned besides the caller.
    pub spawned: usize,
    /// Dispatch through join.
    pub elapsed: Duration,
}

/// Calls `callback(i)` once for every `i` in the inclusive range `[low, high]`.
///
/// Requires `high > low`; `low == high` is rejected like an inverted range.
/// The range is split into `thread_count` equal chunks: the first runs on the
/// calling thread, each other chunk on its own freshly spawned thread.
/// Indices within a chunk are visited in increasing order; order across
/// chunks is unspecified.
///
/// ```
/// use std::sync::atomic::{AtomicI64, Ordering};
///
/// let sum = AtomicI64::new(0);
/// smt_threading::parallel_for_1d(1, 100, |i| {
///     sum.fetch_add(i, Ordering::Relaxed);
/// }, 4)
/// .unwrap();
/// assert_eq!(sum.into_inner(), 5050);
/// ```
pub fn parallel_for_1d<F>(
    low: i64,
    high: i64,
    callback: F,
    thread_count: usize,
) -> Result<ExecutionReport>
where
    F: Fn(i64) + Sync,
{
    run_1d(low, high, &callback, thread_count, ParallelismStrategy::Flat, true)
}

/// Calls `callback(row, col)` once for every pair in `[low1, high1) x [low2, high2)`.
///
/// The rectangle is enumerated row-major and split into `thread_count` equal
/// chunks of that enumeration, scheduled like [`parallel_for_1d`].
pub fn parallel_for_2d<F>(
    low1: i64,
    high1: i64,
    low2: i64,
    high2: i64,
    callback: F,
    thread_count: usize,
) -> Result<ExecutionReport>
where
    F: Fn(i64, i64) + Sync,
{
    run_2d(
        Bounds2D {
            low1,
            high1,
            low2,
            high2,
        },
        &callback,
        thread_count,
        ParallelismStrategy::Flat,
        true,
    )
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Bounds2D {
    pub low1: i64,
    pub high1: i64,
    pub low2: i64,
    pub high2: i64,
}

pub(crate) fn run_1d<F>(
    low: i64,
    high: i64,
    callback: &F,
    thread_count: usize,
    strategy: ParallelismStrategy,
    report_timing: bool,
) -> Result<ExecutionReport>
where
    F: Fn(i64) + Sync,
{
    let range = Range1D::new(low, high)?;
    let plan = PartitionPlan::new(range.count()?, thread_count)?;
    let body = OneDBody::new(range.low(), callback);
    let report = execute(&body, plan, strategy)?;
    if report_timing {
        report_completion("1D loop execution completed", &report);
    }
    Ok(report)
}

pub(crate) fn run_2d<F>(
    bounds: Bounds2D,
    callback: &F,
    thread_count: usize,
    strategy: ParallelismStrategy,
    report_timing: bool,
) -> Result<ExecutionReport>
where
    F: Fn(i64, i64) + Sync,
{
    let range = Range2D::new(bounds.low1, bounds.high1, bounds.low2, bounds.high2)?;
    let plan = PartitionPlan::new(range.count()?, thread_count)?;
    let body = TwoDBody::new(IndexMapper2D::new(&range), callback);
    let report = execute(&body, plan, strategy)?;
    if report_timing {
        report_completion("2D loop execution completed", &report);
    }
    Ok(report)
}

fn report_completion(message: &str, report: &ExecutionReport) {
    tracing::info!("{message}");
    tracing::info!(
        "duration of this execution is {} microseconds",
        micros(report.elapsed)
    );
}

/// Dispatches every slot of `plan` and waits for all of them.
///
/// A panicking slot does not stop the others; the lowest faulted slot is
/// reported once everything has been joined.
fn execute<B: LoopBody>(
    body: &B,
    plan: PartitionPlan,
    strategy: ParallelismStrategy,
) -> Result<ExecutionReport> {
    tracing::debug!(
        total = plan.total_count(),
        chunk_size = plan.chunk_size(),
        slots = plan.slot_count(),
        strategy = strategy.as_str(),
        "partitioned loop"
    );

    let timer = Timer::start();
    let mut faults = Vec::new();

    let spawned = match strategy {
        ParallelismStrategy::None => {
            // Trailing empty slots have nothing to run inline.
            let busy = plan.busy_slots().max(1);
            for (slot, range) in plan.slots().take(busy) {
                if let Err(fault) = WorkAssignment::new(slot, range, body).execute() {
                    faults.push(fault);
                }
            }
            0
        }
        ParallelismStrategy::Flat => match dispatch_flat(body, &plan, &mut faults) {
            Ok(spawned) => spawned,
            Err(err) => {
                for fault in &faults {
                    tracing::error!(
                        slot = fault.slot,
                        "callback panic superseded by dispatch failure: {}",
                        fault.message
                    );
                }
                return Err(err);
            }
        },
    };
    let elapsed = timer.elapsed();

    if let Some(fault) = faults.into_iter().min_by_key(|f| f.slot) {
        tracing::error!(slot = fault.slot, "callback panicked: {}", fault.message);
        return Err(ThreadingError::WorkerPanicked {
            slot: fault.slot,
            message: fault.message,
        });
    }

    Ok(ExecutionReport {
        plan,
        strategy,
        spawned,
        elapsed,
    })
}

/// Runs slot 0 inline, then spawns one thread per remaining slot and joins them all.
///
/// Returns the number of threads spawned. Room for every handle is reserved
/// before any slot runs, so a slot count too large to track fails with
/// `ThreadCapacity` and zero work done. If the OS refuses a thread, the
/// remaining slots are never run, the threads already running are joined,
/// and the spawn error is returned; panics collected so far are logged by
/// the caller and superseded by that error.
fn dispatch_flat<B: LoopBody>(
    body: &B,
    plan: &PartitionPlan,
    faults: &mut Vec<SlotFault>,
) -> Result<usize> {
    let mut assignments = plan
        .slots()
        .map(|(slot, range)| WorkAssignment::new(slot, range, body));

    thread::scope(|scope| {
        let requested = plan.slot_count() - 1;
        let mut handles = Vec::new();
        if let Err(source) = handles.try_reserve_exact(requested) {
            tracing::error!(requested, "cannot track worker threads: {source}");
            return Err(ThreadingError::ThreadCapacity { requested, source });
        }

        if let Some(first) = assignments.next() {
            if let Err(fault) = first.execute() {
                faults.push(fault);
            }
        }

        let mut spawn_error = None;
        for assignment in assignments {
            let slot = assignment.slot();
            let range = assignment.range();
            let spawned = thread::Builder::new()
                .name(format!("smt-worker-{slot}"))
                .spawn_scoped(scope, move || assignment.execute());
            match spawned {
                Ok(handle) => {
                    tracing::debug!(slot, begin = range.begin, end = range.end, "spawned worker");
                    handles.push((slot, handle));
                }
                Err(source) => {
                    tracing::error!(slot, "failed to spawn worker: {source}");
                    spawn_error = Some(ThreadingError::Spawn { slot, source });
                    break;
                }
            }
        }

        let spawned = handles.len();
        for (slot, handle) in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(fault)) => faults.push(fault),
                Err(payload) => faults.push(SlotFault::from_payload(slot, payload)),
            }
        }

        match spawn_error {
            Some(err) => Err(err),
            None => Ok(spawned),
        }
    })
}
