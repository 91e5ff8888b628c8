//! Target model: per-node economics.
//!
//! A [`Target`] is a flat value type holding one node's identity, the raw
//! stats last sampled from the environment, and the action history the
//! governor accumulates. Derived metrics are pure functions of those fields,
//! so re-ranking targets never touches the host.
//!
//! Refresh is deliberate, not timed: every stat read costs a host query, so
//! stats are re-sampled only after a completed action touched the target or
//! after the operator's skill level moved.

use crate::env::{ActionKind, Environment, NodeStats};
use crate::topology::NodeRecord;

/// Which money-moving action the target last received.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Posture {
    Hacking,
    Growing,
}

/// One hackable node plus its sampled economics and history.
#[derive(Clone, Debug)]
pub struct Target {
    hostname: String,
    path: String,
    depth: u32,

    // raw stats, refreshed on demand
    max_money: f64,
    money: f64,
    min_security: f64,
    security: f64,
    required_skill: u32,
    rooted: bool,
    player_owned: bool,

    // action economics, refreshed with the stats
    hack_yield: f64,
    hack_chance: f64,
    hack_time_ms: u64,
    grow_time_ms: u64,
    weaken_time_ms: u64,

    // history owned by the governor
    hacks_done: u64,
    grows_done: u64,
    posture: Option<Posture>,
}

impl Target {
    /// Samples a fresh target from a discovery record.
    pub fn probe<E: Environment + ?Sized>(env: &E, record: &NodeRecord) -> Self {
        let stats = env.node_stats(&record.hostname);
        let mut target = Self {
            hostname: record.hostname.clone(),
            path: record.path.clone(),
            depth: record.depth,
            max_money: 0.0,
            money: 0.0,
            min_security: 0.0,
            security: 0.0,
            required_skill: 0,
            rooted: false,
            player_owned: false,
            hack_yield: 0.0,
            hack_chance: 0.0,
            hack_time_ms: 0,
            grow_time_ms: 0,
            weaken_time_ms: 0,
            hacks_done: 0,
            grows_done: 0,
            posture: None,
        };
        target.apply_stats(env, stats);
        target
    }

    /// Re-samples stats and economics. History is preserved.
    pub fn refresh<E: Environment + ?Sized>(&mut self, env: &E) {
        let stats = env.node_stats(&self.hostname);
        self.apply_stats(env, stats);
    }

    fn apply_stats<E: Environment + ?Sized>(&mut self, env: &E, stats: NodeStats) {
        self.max_money = stats.max_money;
        self.money = stats.money;
        self.min_security = stats.min_security;
        self.security = stats.security;
        self.required_skill = stats.required_skill;
        self.rooted = stats.rooted;
        self.player_owned = stats.player_owned;

        self.hack_yield = env.hack_yield(&self.hostname);
        self.hack_chance = env.hack_chance(&self.hostname);
        self.hack_time_ms = env.action_time_ms(&self.hostname, ActionKind::Hack);
        self.grow_time_ms = env.action_time_ms(&self.hostname, ActionKind::Grow);
        self.weaken_time_ms = env.action_time_ms(&self.hostname, ActionKind::Weaken);
    }

    // ---- identity ----

    #[inline]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    // ---- raw stats ----

    #[inline]
    pub fn max_money(&self) -> f64 {
        self.max_money
    }

    #[inline]
    pub fn money(&self) -> f64 {
        self.money
    }

    #[inline]
    pub fn security(&self) -> f64 {
        self.security
    }

    #[inline]
    pub fn min_security(&self) -> f64 {
        self.min_security
    }

    #[inline]
    pub fn is_rooted(&self) -> bool {
        self.rooted
    }

    #[inline]
    pub fn action_time_ms(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Weaken => self.weaken_time_ms,
            ActionKind::Hack => self.hack_time_ms,
            ActionKind::Grow => self.grow_time_ms,
        }
    }

    // ---- eligibility ----

    /// Whether this node is worth governing at the given skill level.
    ///
    /// Excludes unrooted nodes, nodes that can never hold money, the
    /// operator's own machines, and nodes gated behind a higher skill.
    pub fn is_eligible(&self, hacking_level: u32) -> bool {
        self.rooted
            && self.max_money > 0.0
            && !self.player_owned
            && self.required_skill <= hacking_level
    }

    // ---- derived economics ----

    /// Money per millisecond from one hack thread, ignoring contention and
    /// failure.
    pub fn base_yield(&self) -> f64 {
        if self.hack_time_ms == 0 {
            return 0.0;
        }
        self.hack_yield / self.hack_time_ms as f64
    }

    /// `base_yield` discounted by the success probability.
    pub fn chance_corrected_yield(&self) -> f64 {
        self.base_yield() * self.hack_chance
    }

    /// Historical yield: discounts targets whose cycle keeps demanding grows.
    ///
    /// The `(hacks + 1) / ((grows + 1) * grow_ratio)` weighting is a tuned
    /// policy knob; `grow_ratio` is the observed grow/hack duration ratio, so
    /// slow-growing targets sink faster.
    pub fn total_corrected_yield(&self) -> f64 {
        let grow_ratio = if self.hack_time_ms == 0 {
            1.0
        } else {
            self.grow_time_ms as f64 / self.hack_time_ms as f64
        };
        self.chance_corrected_yield() * (self.hacks_done + 1) as f64
            / ((self.grows_done + 1) as f64 * grow_ratio)
    }

    /// Fraction of capacity currently present, in `[0, 1]` for sane hosts.
    pub fn money_fraction(&self) -> f64 {
        self.money / self.max_money
    }

    /// Weaken threads needed to bring security down to its floor.
    ///
    /// `effect_per_thread` comes from the environment so core counts and
    /// level scaling stay out of this crate.
    pub fn weaken_demand(&self, effect_per_thread: f64) -> usize {
        debug_assert!(effect_per_thread > 0.0);
        let deficit = self.security - self.min_security;
        if deficit <= 0.0 {
            return 0;
        }
        (deficit / effect_per_thread).ceil() as usize
    }

    /// Hack threads that would extract `ratio` of capacity at current yield.
    ///
    /// Returns `usize::MAX` when the yield degenerates to zero; callers clamp
    /// against credits and per-target caps.
    pub fn extraction_threads(&self, ratio: f64) -> usize {
        clamp_threads(ratio * self.max_money / self.hack_yield)
    }

    // ---- history ----

    #[inline]
    pub fn posture(&self) -> Option<Posture> {
        self.posture
    }

    #[inline]
    pub fn set_posture(&mut self, posture: Posture) {
        self.posture = Some(posture);
    }

    #[inline]
    pub fn hacks_done(&self) -> u64 {
        self.hacks_done
    }

    #[inline]
    pub fn grows_done(&self) -> u64 {
        self.grows_done
    }

    /// Records a completed action of `kind` against this target.
    pub fn record_completed(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Hack => self.hacks_done += 1,
            ActionKind::Grow => self.grows_done += 1,
            ActionKind::Weaken => {}
        }
    }
}

/// Collapses a possibly-degenerate thread requirement into a usable count.
///
/// Division by a zero yield or zero capital produces NaN/inf; those mean "no
/// finite thread count reaches the goal", so the requirement saturates and the
/// caller's other limits take over.
pub fn clamp_threads(raw: f64) -> usize {
    if !raw.is_finite() {
        return usize::MAX;
    }
    if raw <= 0.0 {
        return 0;
    }
    let ceiled = raw.ceil();
    if ceiled >= usize::MAX as f64 {
        usize::MAX
    } else {
        ceiled as usize
    }
}

/// Probes every discovered node and keeps the eligible ones.
pub fn eligible_targets<E: Environment + ?Sized>(env: &E, records: &[NodeRecord]) -> Vec<Target> {
    let level = env.hacking_level();
    records
        .iter()
        .map(|rec| Target::probe(env, rec))
        .filter(|t| t.is_eligible(level))
        .collect()
}
