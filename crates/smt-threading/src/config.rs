//! Reusable loop settings: thread count, strategy, timing output.

use crate::error::Result;
use crate::parallel::{run_1d, run_2d, Bounds2D, ExecutionReport, ParallelismStrategy};

#[derive(Clone, Debug)]
pub struct ThreadingArgs {
    /// Slots per loop; 0 means one per logical CPU.
    pub max_threads: usize,
    pub strategy: ParallelismStrategy,
    /// Emit the completion and duration lines after each loop.
    pub report_timing: bool,
}

impl Default for ThreadingArgs {
    fn default() -> Self {
        Self {
            max_threads: 0,
            strategy: ParallelismStrategy::Flat,
            report_timing: true,
        }
    }
}

impl ThreadingArgs {
    pub fn validate(&self) -> Option<&'static str> {
        if self.strategy == ParallelismStrategy::None && self.max_threads > 1 {
            return Some("max_threads has no effect on spawning with strategy none");
        }
        None
    }

    pub fn resolved_threads(&self) -> usize {
        if self.max_threads != 0 {
            self.max_threads
        } else {
            num_cpus::get().max(1)
        }
    }
}

/// Resolved settings applied to every loop run through it.
///
/// Holds no threads; each call still spawns and joins its own.
#[derive(Clone, Debug)]
pub struct ThreadingContext {
    num_threads: usize,
    strategy: ParallelismStrategy,
    report_timing: bool,
}

impl ThreadingContext {
    pub fn new(args: &ThreadingArgs) -> Self {
        if let Some(warning) = args.validate() {
            tracing::warn!("{warning}");
        }
        Self {
            num_threads: args.resolved_threads(),
            strategy: args.strategy,
            report_timing: args.report_timing,
        }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn strategy(&self) -> ParallelismStrategy {
        self.strategy
    }

    pub fn parallel_for_1d<F>(&self, low: i64, high: i64, callback: F) -> Result<ExecutionReport>
    where
        F: Fn(i64) + Sync,
    {
        run_1d(
            low,
            high,
            &callback,
            self.num_threads,
            self.strategy,
            self.report_timing,
        )
    }

    pub fn parallel_for_2d<F>(
        &self,
        low1: i64,
        high1: i64,
        low2: i64,
        high2: i64,
        callback: F,
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
            self.num_threads,
            self.strategy,
            self.report_timing,
        )
    }
}
