//! Wall-clock timing for loop instrumentation and the demo binary.

use std::time::{Duration, Instant};

pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

pub fn micros(elapsed: Duration) -> u128 {
    elapsed.as_micros()
}

pub fn ns_per_iter(elapsed: Duration, iters: usize) -> f64 {
    if iters == 0 {
        return 0.0;
    }
    elapsed.as_nanos() as f64 / iters as f64
}
