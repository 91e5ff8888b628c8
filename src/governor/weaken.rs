//! Weaken-only cycle: drive every eligible target down to its security floor.
//!
//! Allocation policy: when credits are scarce, the target with the **longest**
//! weaken duration is served first. Short jobs would otherwise monopolize the
//! pool and the long ones would still be outstanding when the sweep could have
//! finished; starting the long tail early keeps the pool draining.
//!
//! Demand accounting: each target's outstanding demand is its fresh
//! security-derived thread count minus the threads already committed in
//! flight, so a reap can re-derive demand from live stats without
//! double-counting work on the wire.

use crate::dispatch;
use crate::env::{ActionKind, Environment};
use crate::ledger::{CreditBasis, CreditLedger};
use crate::metrics::GovernorMetrics;
use crate::target::{eligible_targets, Target};
use crate::topology;

use super::{await_soonest, GovernorConfig, GovernorError, JobBook};

/// Outcome of a completed sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeakenReport {
    /// Targets that reached their security floor.
    pub targets_levelled: usize,
    /// Counters for the whole run.
    pub metrics: GovernorMetrics,
}

struct SweepEntry {
    target: Target,
    /// Demand not yet covered by in-flight work.
    remaining: usize,
}

/// One-shot governor that weakens the whole network to its floor.
pub struct WeakenSweep {
    cfg: GovernorConfig,
    ledger: CreditLedger,
    entries: Vec<SweepEntry>,
    jobs: JobBook,
    metrics: GovernorMetrics,
}

impl WeakenSweep {
    /// Discovers the network and selects every target with weaken demand.
    pub fn new<E: Environment + ?Sized>(env: &E, cfg: GovernorConfig) -> Self {
        cfg.validate();

        let records = topology::discover(env, &cfg.home);
        let effect = env.weaken_effect(1);
        let entries = eligible_targets(env, &records)
            .into_iter()
            .map(|target| {
                let remaining = target.weaken_demand(effect);
                SweepEntry { target, remaining }
            })
            .filter(|e| 0 < e.remaining)
            .collect();

        let ledger = CreditLedger::new(cfg.home.clone(), cfg.reservation, CreditBasis::from_env(env));

        Self {
            cfg,
            ledger,
            entries,
            jobs: JobBook::new(),
            metrics: GovernorMetrics::new(),
        }
    }

    /// Runs to completion: every selected target at its floor, nothing in
    /// flight.
    pub fn run<E: Environment + ?Sized>(&mut self, env: &mut E) -> Result<WeakenReport, GovernorError> {
        loop {
            self.dispatch_while_possible(env)?;

            if self.jobs.is_empty() {
                if self.entries.iter().all(|e| e.remaining == 0) {
                    break;
                }
                // Demand left but no credits and nothing to wait on: someone
                // else holds the pool. Idle and re-sample.
                self.metrics.idle_passes += 1;
                env.sleep_ms(self.cfg.poll_interval_ms);
                self.metrics.record_sleep(self.cfg.poll_interval_ms);
                continue;
            }

            self.reap_one(env);
        }

        Ok(WeakenReport {
            targets_levelled: self.entries.len(),
            metrics: self.metrics,
        })
    }

    /// Greedily dispatches until credits or demand run out.
    fn dispatch_while_possible<E: Environment + ?Sized>(
        &mut self,
        env: &mut E,
    ) -> Result<(), GovernorError> {
        loop {
            let available = self.ledger.available_threads(env, ActionKind::Weaken);
            if available == 0 {
                return Ok(());
            }

            let Some(idx) = self.pick_longest_outstanding() else {
                return Ok(());
            };

            let entry = &mut self.entries[idx];
            let threads = available.min(entry.remaining);
            let job = dispatch::launch(
                env,
                ActionKind::Weaken,
                &self.cfg.home,
                threads,
                entry.target.hostname(),
            )?;

            entry.remaining -= threads;
            self.metrics.record_dispatch(ActionKind::Weaken, threads);
            self.jobs.push(job);
        }
    }

    /// Index of the unmet target with the longest weaken duration.
    fn pick_longest_outstanding(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| 0 < e.remaining)
            .max_by_key(|(_, e)| e.target.action_time_ms(ActionKind::Weaken))
            .map(|(idx, _)| idx)
    }

    /// Waits out the soonest job, confirms it, and re-derives that target's
    /// demand from fresh stats.
    fn reap_one<E: Environment + ?Sized>(&mut self, env: &mut E) {
        let Some(done) = await_soonest(env, &mut self.jobs, self.cfg.poll_interval_ms, &mut self.metrics)
        else {
            return;
        };

        let effect = env.weaken_effect(1);
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.target.hostname() == done.target)
        {
            entry.target.refresh(env);
            entry.target.record_completed(done.kind);
            let live_demand = entry.target.weaken_demand(effect);
            entry.remaining = live_demand.saturating_sub(self.jobs.committed(done.target.as_str()));
        }
    }

    /// Counters so far; final values come back in the [`WeakenReport`].
    pub fn metrics(&self) -> &GovernorMetrics {
        &self.metrics
    }

    /// Targets still carrying unmet demand.
    pub fn outstanding(&self) -> usize {
        self.entries.iter().filter(|e| 0 < e.remaining).count()
    }
}
