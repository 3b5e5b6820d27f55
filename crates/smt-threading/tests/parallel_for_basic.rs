use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use smt_threading::{
    parallel_for_1d, parallel_for_2d, ParallelismStrategy, ThreadingArgs, ThreadingContext,
    ThreadingError,
};

/// Indices grouped by the thread that visited them, in visit order.
fn group_by_thread<T: Clone>(visits: &[(ThreadId, T)]) -> BTreeMap<String, Vec<T>> {
    let mut out: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for (id, v) in visits {
        out.entry(format!("{id:?}")).or_default().push(v.clone());
    }
    out
}

#[test]
fn test_1d_ten_over_four_threads() {
    let caller = thread::current().id();
    let visits = Mutex::new(Vec::new());
    let report = parallel_for_1d(
        0,
        9,
        |i| visits.lock().unwrap().push((thread::current().id(), i)),
        4,
    )
    .unwrap();

    assert_eq!(report.plan.chunk_size(), 3);
    assert_eq!(report.spawned, 3);

    let visits = visits.into_inner().unwrap();
    let inline: Vec<i64> = visits
        .iter()
        .filter(|(id, _)| *id == caller)
        .map(|(_, i)| *i)
        .collect();
    assert_eq!(inline, vec![0, 1, 2]);

    let mut chunks: Vec<Vec<i64>> = group_by_thread(&visits).into_values().collect();
    chunks.sort();
    assert_eq!(
        chunks,
        vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8], vec![9]]
    );
}

#[test]
fn test_2d_two_by_three_over_two_threads() {
    let caller = thread::current().id();
    let visits = Mutex::new(Vec::new());
    let report = parallel_for_2d(
        0,
        2,
        0,
        3,
        |r, c| visits.lock().unwrap().push((thread::current().id(), (r, c))),
        2,
    )
    .unwrap();

    assert_eq!(report.plan.total_count(), 6);
    assert_eq!(report.plan.chunk_size(), 3);
    assert_eq!(report.spawned, 1);

    let visits = visits.into_inner().unwrap();
    let inline: Vec<(i64, i64)> = visits
        .iter()
        .filter(|(id, _)| *id == caller)
        .map(|(_, rc)| *rc)
        .collect();
    assert_eq!(inline, vec![(0, 0), (0, 1), (0, 2)]);
    let spawned: Vec<(i64, i64)> = visits
        .iter()
        .filter(|(id, _)| *id != caller)
        .map(|(_, rc)| *rc)
        .collect();
    assert_eq!(spawned, vec![(1, 0), (1, 1), (1, 2)]);
}

#[test]
fn test_1d_single_element_range_rejected() {
    let calls = AtomicUsize::new(0);
    let err = parallel_for_1d(
        5,
        5,
        |_| {
            calls.fetch_add(1, Ordering::Relaxed);
        },
        3,
    )
    .unwrap_err();
    assert!(err.is_invalid_range());
    assert!(matches!(
        err,
        ThreadingError::InvalidRange1D { low: 5, high: 5 }
    ));
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn test_2d_empty_axis_rejected() {
    let calls = AtomicUsize::new(0);
    for (l1, h1, l2, h2) in [(0, 0, 0, 3), (0, 2, 3, 1), (4, 2, 0, 3)] {
        let err = parallel_for_2d(
            l1,
            h1,
            l2,
            h2,
            |_, _| {
                calls.fetch_add(1, Ordering::Relaxed);
            },
            2,
        )
        .unwrap_err();
        assert!(err.is_invalid_range());
    }
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn test_zero_threads_rejected() {
    let calls = AtomicUsize::new(0);
    let err = parallel_for_1d(
        0,
        10,
        |_| {
            calls.fetch_add(1, Ordering::Relaxed);
        },
        0,
    )
    .unwrap_err();
    assert!(matches!(err, ThreadingError::InvalidThreadCount(0)));
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn test_single_thread_never_spawns() {
    let caller = thread::current().id();
    let foreign = AtomicUsize::new(0);
    let report = parallel_for_1d(
        -20,
        20,
        |_| {
            if thread::current().id() != caller {
                foreign.fetch_add(1, Ordering::Relaxed);
            }
        },
        1,
    )
    .unwrap();
    assert_eq!(report.spawned, 0);
    assert_eq!(foreign.load(Ordering::Relaxed), 0);
}

#[test]
fn test_spawned_workers_are_named() {
    let names = Mutex::new(BTreeSet::new());
    parallel_for_1d(
        0,
        7,
        |_| {
            if let Some(name) = thread::current().name() {
                if name.starts_with("smt-worker-") {
                    names.lock().unwrap().insert(name.to_string());
                }
            }
        },
        4,
    )
    .unwrap();
    let names = names.into_inner().unwrap();
    let expected: BTreeSet<String> = (1..4).map(|s| format!("smt-worker-{s}")).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_visited_set_independent_of_thread_count() {
    let (low, high) = (-7i64, 23i64);
    let total = (high - low + 1) as usize;
    let reference: BTreeSet<i64> = (low..=high).collect();
    for threads in [1, 2, 7, total, total + 5] {
        let seen = Mutex::new(Vec::new());
        parallel_for_1d(low, high, |i| seen.lock().unwrap().push(i), threads).unwrap();
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen.len(), total, "threads={threads}");
        assert_eq!(seen.into_iter().collect::<BTreeSet<_>>(), reference);
    }
}

#[test]
fn test_2d_visited_set_independent_of_thread_count() {
    let reference: BTreeSet<(i64, i64)> = (3..7)
        .flat_map(|r| (-2..3).map(move |c| (r, c)))
        .collect();
    let total = reference.len();
    for threads in [1, 2, 7, total, total + 5] {
        let seen = Mutex::new(Vec::new());
        parallel_for_2d(3, 7, -2, 3, |r, c| seen.lock().unwrap().push((r, c)), threads).unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), total, "threads={threads}");
        assert_eq!(seen.into_iter().collect::<BTreeSet<_>>(), reference);
    }
}

#[test]
fn test_panic_reported_after_all_slots_finish() {
    let seen = Mutex::new(BTreeSet::new());
    let err = parallel_for_1d(
        0,
        9,
        |i| {
            if i == 5 {
                panic!("bad index {i}");
            }
            seen.lock().unwrap().insert(i);
        },
        4,
    )
    .unwrap_err();

    match err {
        ThreadingError::WorkerPanicked { slot, message } => {
            assert_eq!(slot, 1);
            assert_eq!(message, "bad index 5");
        }
        other => panic!("unexpected error: {other}"),
    }
    let expected: BTreeSet<i64> = (0..=9).filter(|&i| i != 5).collect();
    assert_eq!(seen.into_inner().unwrap(), expected);
}

#[test]
fn test_inline_panic_still_runs_other_slots() {
    let calls = AtomicUsize::new(0);
    let err = parallel_for_1d(
        0,
        9,
        |i| {
            if i == 0 {
                panic!("first");
            }
            calls.fetch_add(1, Ordering::Relaxed);
        },
        2,
    )
    .unwrap_err();
    assert!(matches!(err, ThreadingError::WorkerPanicked { slot: 0, .. }));
    // Slot 0 stops at index 0; slot 1 covers 5..=9.
    assert_eq!(calls.load(Ordering::Relaxed), 5);
}

#[test]
fn test_sequential_strategy_stays_on_caller() {
    let caller = thread::current().id();
    let ctx = ThreadingContext::new(&ThreadingArgs {
        max_threads: 1,
        strategy: ParallelismStrategy::None,
        report_timing: false,
    });
    let order = Mutex::new(Vec::new());
    let report = ctx
        .parallel_for_2d(0, 3, 0, 2, |r, c| {
            assert_eq!(thread::current().id(), caller);
            order.lock().unwrap().push((r, c));
        })
        .unwrap();
    assert_eq!(report.spawned, 0);
    assert_eq!(
        order.into_inner().unwrap(),
        vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]
    );
}

#[test]
fn test_sequential_strategy_keeps_partitioning() {
    let ctx = ThreadingContext::new(&ThreadingArgs {
        max_threads: 4,
        strategy: ParallelismStrategy::None,
        report_timing: false,
    });
    let order = Mutex::new(Vec::new());
    let report = ctx
        .parallel_for_1d(0, 9, |i| order.lock().unwrap().push(i))
        .unwrap();
    assert_eq!(report.plan.slot_count(), 4);
    assert_eq!(report.spawned, 0);
    assert_eq!(order.into_inner().unwrap(), (0..=9).collect::<Vec<_>>());
}

#[test]
fn test_context_uses_configured_threads() {
    let ctx = ThreadingContext::new(&ThreadingArgs {
        max_threads: 3,
        strategy: ParallelismStrategy::Flat,
        report_timing: false,
    });
    let calls = AtomicUsize::new(0);
    let report = ctx
        .parallel_for_1d(1, 30, |_| {
            calls.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
    assert_eq!(report.plan.slot_count(), 3);
    assert_eq!(report.spawned, 2);
    assert_eq!(calls.load(Ordering::Relaxed), 30);
}

#[test]
fn test_untrackable_thread_count_is_an_error() {
    let calls = AtomicUsize::new(0);
    let err = parallel_for_1d(
        0,
        9,
        |_| {
            calls.fetch_add(1, Ordering::Relaxed);
        },
        usize::MAX,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ThreadingError::ThreadCapacity {
            requested,
            ..
        } if requested == usize::MAX - 1
    ));
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn test_sequential_strategy_handles_huge_slot_count() {
    let ctx = ThreadingContext::new(&ThreadingArgs {
        max_threads: usize::MAX,
        strategy: ParallelismStrategy::None,
        report_timing: false,
    });
    let seen = Mutex::new(Vec::new());
    let report = ctx
        .parallel_for_1d(0, 9, |i| seen.lock().unwrap().push(i))
        .unwrap();
    assert_eq!(report.plan.chunk_size(), 1);
    assert_eq!(report.spawned, 0);
    assert_eq!(seen.into_inner().unwrap(), (0..=9).collect::<Vec<_>>());
}
