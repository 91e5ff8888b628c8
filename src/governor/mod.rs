//! Scheduler core: configuration, in-flight bookkeeping, and the wait/reap
//! loop shared by both governing cycles.
//!
//! # Model
//!
//! The governor is one cooperative loop. "Concurrency" is host-level parallel
//! work tracked purely as predicted-completion bookkeeping; the loop itself
//! takes one decision at a time. Its only suspension point is a timed sleep
//! until the soonest predicted completion, followed by a short poll loop that
//! absorbs host scheduling jitter.
//!
//! # Ownership
//!
//! A cycle exclusively owns its job book and target list for the duration of
//! a run. The one piece of shared state, host RAM, is re-sampled through the
//! ledger before every decision instead of being locked.
//!
//! # Failure semantics
//!
//! - No credits / no candidates: idle, never an error.
//! - Refused dispatch handle: fatal; the run stops with [`GovernorError`].

pub mod hgw;
pub mod weaken;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::error::Error;
use std::fmt;

use ahash::AHashMap;

use crate::dispatch::{DispatchError, LaunchedJob};
use crate::env::{ActionKind, Environment};
use crate::metrics::GovernorMetrics;

pub use hgw::{HgwFarm, HgwReport};
pub use weaken::{WeakenSweep, WeakenReport};

// ============================================================================
// Configuration
// ============================================================================

/// Tunables for a governing run.
///
/// All rate knobs are fractions of capacity; thread knobs are absolute.
#[derive(Clone, Debug)]
pub struct GovernorConfig {
    /// Host whose RAM carries every dispatched job.
    pub home: String,
    /// Fraction of free RAM withheld from every capacity sample.
    pub reservation: f64,
    /// Fraction of a target's capacity one extraction cycle aims to take.
    pub hackable_ratio: f64,
    /// Money fraction above which a target is hacked again.
    pub grow_threshold: f64,
    /// Floor for weaken allocations in the mixed cycle.
    pub min_weaken_threads: usize,
    /// Poll cadence while confirming a completion past its predicted end.
    pub poll_interval_ms: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            home: "home".to_owned(),
            reservation: 0.10,
            hackable_ratio: 0.25,
            grow_threshold: 0.90,
            min_weaken_threads: 5,
            poll_interval_ms: 10,
        }
    }
}

impl GovernorConfig {
    /// Checks internal consistency.
    ///
    /// # Panics
    /// Panics on an unusable configuration; these are construction-time
    /// operator errors, not runtime conditions.
    pub fn validate(&self) {
        assert!(!self.home.is_empty(), "home host must be named");
        assert!(
            (0.0..1.0).contains(&self.reservation),
            "reservation must be in [0, 1)"
        );
        assert!(
            0.0 < self.hackable_ratio && self.hackable_ratio < 1.0,
            "hackable_ratio must be in (0, 1)"
        );
        assert!(
            self.grow_threshold <= 1.0 && 1.0 - self.hackable_ratio < self.grow_threshold,
            "grow_threshold must sit above the grow trigger for hysteresis to hold"
        );
        assert!(0 < self.min_weaken_threads, "min_weaken_threads must be > 0");
        assert!(0 < self.poll_interval_ms, "poll_interval_ms must be > 0");
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Unrecoverable governor failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GovernorError {
    /// The dispatch layer got a refused handle back from the host.
    Dispatch(DispatchError),
}

impl fmt::Display for GovernorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GovernorError::Dispatch(e) => write!(f, "dispatch failed: {e}"),
        }
    }
}

impl Error for GovernorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GovernorError::Dispatch(e) => Some(e),
        }
    }
}

impl From<DispatchError> for GovernorError {
    fn from(e: DispatchError) -> Self {
        GovernorError::Dispatch(e)
    }
}

// ============================================================================
// Job book
// ============================================================================

/// Min-heap entry; `BinaryHeap` is a max-heap, so the ordering is reversed to
/// pop the soonest completion first.
#[derive(Debug)]
struct SoonestFirst(LaunchedJob);

impl PartialEq for SoonestFirst {
    fn eq(&self, other: &Self) -> bool {
        (self.0.ends_at_ms, self.0.pid) == (other.0.ends_at_ms, other.0.pid)
    }
}

impl Eq for SoonestFirst {}

impl PartialOrd for SoonestFirst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SoonestFirst {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.0.ends_at_ms, self.0.pid.0)
            .cmp(&(other.0.ends_at_ms, other.0.pid.0))
            .reverse()
    }
}

/// All in-flight jobs plus per-target committed thread counts.
///
/// Committed counts let demand math subtract work that is already on the wire
/// without waiting for it to land; they are split by kind because weaken
/// demand must not be offset by hack or grow threads.
#[derive(Debug, Default)]
pub struct JobBook {
    heap: BinaryHeap<SoonestFirst>,
    committed: AHashMap<String, [usize; 3]>,
}

impl JobBook {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Threads currently committed against `target`, all kinds.
    pub fn committed(&self, target: &str) -> usize {
        self.committed
            .get(target)
            .map(|c| c.iter().sum())
            .unwrap_or(0)
    }

    /// Threads of one kind currently committed against `target`.
    pub fn committed_kind(&self, target: &str, kind: ActionKind) -> usize {
        self.committed
            .get(target)
            .map(|c| c[kind.index()])
            .unwrap_or(0)
    }

    /// Records a freshly dispatched job.
    pub fn push(&mut self, job: LaunchedJob) {
        let slot = self.committed.entry(job.target.clone()).or_insert([0; 3]);
        slot[job.kind.index()] += job.threads;
        self.heap.push(SoonestFirst(job));
    }

    /// Predicted end of the soonest-completing job.
    pub fn soonest_end(&self) -> Option<u64> {
        self.heap.peek().map(|j| j.0.ends_at_ms)
    }

    /// Removes and returns the soonest-completing job.
    ///
    /// The committed count is released here; callers must only pop when they
    /// are about to confirm the completion.
    pub fn pop_soonest(&mut self) -> Option<LaunchedJob> {
        let job = self.heap.pop()?.0;
        let slot = self
            .committed
            .get_mut(&job.target)
            .expect("popped job has a committed entry");
        debug_assert!(job.threads <= slot[job.kind.index()]);
        slot[job.kind.index()] -= job.threads;
        if slot.iter().all(|&n| n == 0) {
            self.committed.remove(&job.target);
        }
        Some(job)
    }
}

// ============================================================================
// Wait / reap
// ============================================================================

/// Blocks until the soonest in-flight job is confirmed gone, then returns it.
///
/// Sleeps to the predicted end first, then polls the handle at the configured
/// interval; the prediction is a lower bound, not a contract. Returns `None`
/// when nothing is in flight.
pub(crate) fn await_soonest<E: Environment + ?Sized>(
    env: &mut E,
    jobs: &mut JobBook,
    poll_interval_ms: u64,
    metrics: &mut GovernorMetrics,
) -> Option<LaunchedJob> {
    let job = jobs.pop_soonest()?;
    metrics.waits += 1;

    let now = env.now_ms();
    if now < job.ends_at_ms {
        let wait = job.ends_at_ms - now;
        env.sleep_ms(wait);
        metrics.record_sleep(wait);
    }

    while env.is_running(job.pid) {
        env.sleep_ms(poll_interval_ms);
        metrics.record_sleep(poll_interval_ms);
        metrics.grace_polls += 1;
    }

    metrics.record_reap();
    Some(job)
}
