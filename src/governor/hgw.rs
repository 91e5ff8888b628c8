//! Mixed hack-grow-weaken cycle.
//!
//! Targets are served in descending historical-yield order. Per target the
//! decision is layered:
//!
//! 1. Security drifted above the floor? Weaken, with at least the configured
//!    minimum allocation so drift is knocked back in few jobs.
//! 2. Otherwise pick between hack and grow on money fraction, with
//!    hysteresis: grow below `1 - hackable_ratio`, hack above
//!    `grow_threshold`, and in between keep whatever the target was last
//!    doing. The dead band is what stops a target from flapping between the
//!    two on every completed job.
//!
//! Each target also carries a concurrency cap: the thread count that would
//! extract `hackable_ratio` of its capacity in one volley. Without the cap the
//! top-yield target absorbs the entire pool and every other target starves.
//!
//! The cycle runs until a deadline; in-flight work is drained before
//! returning so the pool comes back whole.

use crate::dispatch;
use crate::env::{ActionKind, Environment};
use crate::ledger::{CreditBasis, CreditLedger};
use crate::metrics::GovernorMetrics;
use crate::target::{clamp_threads, eligible_targets, Posture, Target};
use crate::topology;

use super::{await_soonest, GovernorConfig, GovernorError, JobBook};

/// Outcome of a farming run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HgwReport {
    /// Targets under management when the run ended.
    pub targets: usize,
    /// Counters for the whole run.
    pub metrics: GovernorMetrics,
}

/// Continuous governor interleaving weaken, hack, and grow across targets.
pub struct HgwFarm {
    cfg: GovernorConfig,
    ledger: CreditLedger,
    targets: Vec<Target>,
    jobs: JobBook,
    metrics: GovernorMetrics,
}

impl HgwFarm {
    /// Discovers the network and takes every eligible target under
    /// management.
    pub fn new<E: Environment + ?Sized>(env: &E, cfg: GovernorConfig) -> Self {
        cfg.validate();

        let records = topology::discover(env, &cfg.home);
        let targets = eligible_targets(env, &records);
        let ledger = CreditLedger::new(cfg.home.clone(), cfg.reservation, CreditBasis::from_env(env));

        Self {
            cfg,
            ledger,
            targets,
            jobs: JobBook::new(),
            metrics: GovernorMetrics::new(),
        }
    }

    /// Governs until `deadline_ms`, then drains in-flight work.
    pub fn run_until<E: Environment + ?Sized>(
        &mut self,
        env: &mut E,
        deadline_ms: u64,
    ) -> Result<HgwReport, GovernorError> {
        while env.now_ms() < deadline_ms {
            let dispatched = self.dispatch_pass(env)?;

            if dispatched {
                continue;
            }

            if self.jobs.is_empty() {
                // Nothing running and nothing worth starting: idle briefly.
                self.metrics.idle_passes += 1;
                env.sleep_ms(self.cfg.poll_interval_ms);
                self.metrics.record_sleep(self.cfg.poll_interval_ms);
            } else {
                self.reap_one(env);
            }
        }

        while !self.jobs.is_empty() {
            self.reap_one(env);
        }

        Ok(HgwReport {
            targets: self.targets.len(),
            metrics: self.metrics,
        })
    }

    /// One pass over all targets in yield order. Returns whether any job was
    /// dispatched.
    fn dispatch_pass<E: Environment + ?Sized>(&mut self, env: &mut E) -> Result<bool, GovernorError> {
        let mut dispatched = false;

        for idx in self.yield_order() {
            let Some((kind, threads)) = self.decide(env, idx) else {
                continue;
            };

            let hostname = self.targets[idx].hostname().to_owned();
            let job = dispatch::launch(env, kind, &self.cfg.home, threads, &hostname)?;

            self.metrics.record_dispatch(kind, threads);
            self.jobs.push(job);
            match kind {
                ActionKind::Hack => self.targets[idx].set_posture(Posture::Hacking),
                ActionKind::Grow => self.targets[idx].set_posture(Posture::Growing),
                ActionKind::Weaken => {}
            }
            dispatched = true;
        }

        Ok(dispatched)
    }

    /// Target indices in descending historical-yield order.
    fn yield_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.targets.len()).collect();
        order.sort_by(|&a, &b| {
            self.targets[b]
                .total_corrected_yield()
                .partial_cmp(&self.targets[a].total_corrected_yield())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order
    }

    /// Picks an action and a clamped thread count for one target, or `None`
    /// when the target deserves nothing this pass.
    fn decide<E: Environment + ?Sized>(&self, env: &E, idx: usize) -> Option<(ActionKind, usize)> {
        let target = &self.targets[idx];
        let committed = self.jobs.committed(target.hostname());

        let cap = target.extraction_threads(self.cfg.hackable_ratio);
        let headroom = cap.saturating_sub(committed);
        if headroom == 0 {
            return None;
        }

        let (kind, wanted) = self.pick_action(env, target)?;

        let available = self.ledger.available_threads(env, kind);
        let threads = wanted.min(headroom).min(available);
        if threads == 0 {
            return None;
        }
        Some((kind, threads))
    }

    /// The raw (kind, wanted-threads) decision before clamping.
    fn pick_action<E: Environment + ?Sized>(
        &self,
        env: &E,
        target: &Target,
    ) -> Option<(ActionKind, usize)> {
        // Security first: drift makes every other action slower and weaker.
        // In-flight weaken threads already cover part of the demand; stats
        // only reflect them once the jobs land.
        let in_flight = self
            .jobs
            .committed_kind(target.hostname(), ActionKind::Weaken);
        let demand = target
            .weaken_demand(env.weaken_effect(1))
            .saturating_sub(in_flight);
        if 0 < demand {
            return Some((ActionKind::Weaken, demand.max(self.cfg.min_weaken_threads)));
        }

        match self.pick_posture(target) {
            Posture::Growing => {
                let factor = target.max_money() / target.money();
                let wanted = clamp_threads(env.growth_threads(target.hostname(), factor))
                    .saturating_sub(self.jobs.committed_kind(target.hostname(), ActionKind::Grow));
                if wanted == 0 {
                    return None;
                }
                Some((ActionKind::Grow, wanted))
            }
            Posture::Hacking => {
                let wanted = target.extraction_threads(self.cfg.hackable_ratio).max(1);
                Some((ActionKind::Hack, wanted))
            }
        }
    }

    /// Money-fraction hysteresis between hacking and growing.
    fn pick_posture(&self, target: &Target) -> Posture {
        let fraction = target.money_fraction();
        let grow_below = 1.0 - self.cfg.hackable_ratio;

        if fraction < grow_below {
            Posture::Growing
        } else if self.cfg.grow_threshold < fraction {
            Posture::Hacking
        } else {
            // Dead band: keep doing whatever was last done. A fresh target
            // with no history starts by replenishing.
            target.posture().unwrap_or(Posture::Growing)
        }
    }

    /// Waits out the soonest job across all targets and kinds, confirms it,
    /// and refreshes the touched target.
    fn reap_one<E: Environment + ?Sized>(&mut self, env: &mut E) {
        let Some(done) = await_soonest(env, &mut self.jobs, self.cfg.poll_interval_ms, &mut self.metrics)
        else {
            return;
        };

        if let Some(target) = self
            .targets
            .iter_mut()
            .find(|t| t.hostname() == done.target)
        {
            target.refresh(env);
            target.record_completed(done.kind);
        }
    }

    /// Targets under management, for inspection.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Counters so far; final values come back in the [`HgwReport`].
    pub fn metrics(&self) -> &GovernorMetrics {
        &self.metrics
    }
}
