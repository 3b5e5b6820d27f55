//! Static-chunk parallel `for` over 1D and 2D integer ranges.
//!
//! Each call validates its bounds, splits the flat iteration space into
//! `thread_count` equal chunks (rounded up), runs the first chunk on the
//! calling thread and every other chunk on a freshly spawned thread, then
//! joins them all. No threads or buffers survive the call.
//!
//! The callback must be `Sync`: it is invoked concurrently from every slot
//! and the crate adds no locking around it.

pub mod config;
pub mod error;
pub mod mapper;
pub mod parallel;
pub mod partition;
pub mod range;
pub mod worker;

pub use config::{ThreadingArgs, ThreadingContext};
pub use error::{Result, ThreadingError};
pub use parallel::{parallel_for_1d, parallel_for_2d, ExecutionReport, ParallelismStrategy};
pub use partition::PartitionPlan;
