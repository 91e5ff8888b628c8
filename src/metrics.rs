//! Run counters for end-of-run reporting.
//!
//! The governor is a single cooperative loop, so these are plain integers:
//! no atomics, no sampling windows. A [`GovernorMetrics`] is owned by one
//! cycle, updated inline, and rendered once as a `key=value` stats line.

use crate::env::ActionKind;

/// Counters accumulated over one governing run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GovernorMetrics {
    /// Jobs dispatched, by action kind (ledger index order).
    pub jobs: [u64; 3],
    /// Threads dispatched, by action kind.
    pub threads: [u64; 3],
    /// Jobs confirmed complete and released.
    pub reaps: u64,
    /// Blocking waits for a predicted completion.
    pub waits: u64,
    /// Total simulated/host milliseconds spent asleep.
    pub slept_ms: u64,
    /// Completion-confirm polls after the predicted end time passed.
    pub grace_polls: u64,
    /// Passes that found no credits and nothing in flight.
    pub idle_passes: u64,
}

impl GovernorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_dispatch(&mut self, kind: ActionKind, threads: usize) {
        self.jobs[kind.index()] += 1;
        self.threads[kind.index()] += threads as u64;
    }

    #[inline]
    pub fn record_reap(&mut self) {
        self.reaps += 1;
    }

    #[inline]
    pub fn record_sleep(&mut self, ms: u64) {
        self.slept_ms += ms;
    }

    /// Total jobs dispatched across all kinds.
    pub fn jobs_total(&self) -> u64 {
        self.jobs.iter().sum()
    }

    /// Machine-grepable one-line summary, the shape emitted on stderr.
    pub fn stats_line(&self) -> String {
        format!(
            "jobs={} weaken={}/{}t hack={}/{}t grow={}/{}t reaps={} waits={} slept_ms={} grace_polls={} idle={}",
            self.jobs_total(),
            self.jobs[ActionKind::Weaken.index()],
            self.threads[ActionKind::Weaken.index()],
            self.jobs[ActionKind::Hack.index()],
            self.threads[ActionKind::Hack.index()],
            self.jobs[ActionKind::Grow.index()],
            self.threads[ActionKind::Grow.index()],
            self.reaps,
            self.waits,
            self.slept_ms,
            self.grace_polls,
            self.idle_passes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_counts_split_by_kind() {
        let mut m = GovernorMetrics::new();
        m.record_dispatch(ActionKind::Weaken, 40);
        m.record_dispatch(ActionKind::Hack, 7);
        m.record_dispatch(ActionKind::Weaken, 2);
        assert_eq!(m.jobs_total(), 3);
        assert_eq!(m.jobs[ActionKind::Weaken.index()], 2);
        assert_eq!(m.threads[ActionKind::Weaken.index()], 42);
        assert_eq!(m.threads[ActionKind::Hack.index()], 7);
    }

    #[test]
    fn stats_line_is_stable() {
        let mut m = GovernorMetrics::new();
        m.record_dispatch(ActionKind::Grow, 3);
        m.record_reap();
        assert_eq!(
            m.stats_line(),
            "jobs=1 weaken=0/0t hack=0/0t grow=1/3t reaps=1 waits=0 slept_ms=0 grace_polls=0 idle=0"
        );
    }
}
