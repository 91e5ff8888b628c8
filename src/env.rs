//! Host environment contract.
//!
//! Everything the governor knows about the world arrives through the
//! [`Environment`] trait: topology edges, per-node stats, action economics,
//! shared RAM capacity, and the dispatch/poll/sleep primitives. The production
//! binding talks to the game host; tests substitute the deterministic
//! [`crate::sim::SimNet`].
//!
//! Invariants callers may rely on:
//! - Queries are side-effect free from the caller's perspective.
//! - `now_ms` is monotonic and only advances across `sleep_ms` calls.
//! - A [`Pid`] of zero is never a live job; `exec` returns it to signal refusal.

/// The three actions a node can be subjected to.
///
/// `Weaken` lowers a node's security toward its floor, `Hack` extracts money,
/// `Grow` replenishes it. Each has a fixed per-thread RAM cost on the host
/// that runs it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ActionKind {
    Weaken,
    Hack,
    Grow,
}

impl ActionKind {
    /// All kinds, in ledger index order.
    pub const ALL: [ActionKind; 3] = [ActionKind::Weaken, ActionKind::Hack, ActionKind::Grow];

    /// Dense index for per-kind arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ActionKind::Weaken => 0,
            ActionKind::Hack => 1,
            ActionKind::Grow => 2,
        }
    }

    /// Lowercase name for reports and stats lines.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Weaken => "weaken",
            ActionKind::Hack => "hack",
            ActionKind::Grow => "grow",
        }
    }
}

/// Opaque handle to one detached unit of host work.
///
/// The host assigns these on `exec`; zero is reserved for "refused".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Pid(pub u32);

impl Pid {
    /// The sentinel the host returns when it refuses to start work.
    pub const INVALID: Pid = Pid(0);

    /// Returns `true` for any handle that refers to real work.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Point-in-time snapshot of one node's raw stats.
///
/// Sampled fresh from the host on request; nothing here is cached by the
/// environment itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStats {
    /// Whether the operator has root on this node.
    pub rooted: bool,
    /// Money capacity of the node.
    pub max_money: f64,
    /// Money currently available on the node.
    pub money: f64,
    /// Skill level required before the node can be acted on.
    pub required_skill: u32,
    /// Ports that must be opened before a nuke can succeed.
    pub required_ports: u32,
    /// Security floor the node cannot be weakened below.
    pub min_security: f64,
    /// Current security level.
    pub security: f64,
    /// Nodes the operator purchased are never hacked.
    pub player_owned: bool,
}

/// The host API surface the core consumes.
///
/// Methods that start work or advance time take `&mut self`; pure queries take
/// `&self`. The split matters for the simulated implementation, which settles
/// due jobs whenever time moves or a handle is polled.
pub trait Environment {
    // ---- topology ----

    /// Nodes directly reachable from `host`.
    fn scan(&self, host: &str) -> Vec<String>;

    // ---- node state ----

    /// Fresh raw stats for `host`.
    fn node_stats(&self, host: &str) -> NodeStats;

    // ---- action economics ----

    /// Money extracted by a single hack thread against `host`.
    fn hack_yield(&self, host: &str) -> f64;

    /// Probability that a hack against `host` succeeds, in `[0, 1]`.
    fn hack_chance(&self, host: &str) -> f64;

    /// Duration of one `kind` action against `host`, in milliseconds.
    fn action_time_ms(&self, host: &str, kind: ActionKind) -> u64;

    /// Security removed by `threads` concurrent weaken threads.
    fn weaken_effect(&self, threads: usize) -> f64;

    /// Threads needed to multiply `host`'s money by `factor`.
    ///
    /// May be non-finite when `factor` is; callers clamp.
    fn growth_threads(&self, host: &str, factor: f64) -> f64;

    /// The operator's current skill level.
    fn hacking_level(&self) -> u32;

    // ---- capacity ----

    /// Unused RAM on `host`, in GB. Changes under the caller's feet as other
    /// consumers start and finish work; sample fresh before every decision.
    fn free_ram_gb(&self, host: &str) -> f64;

    /// Per-thread RAM cost of running `kind`, in GB.
    fn action_cost_gb(&self, kind: ActionKind) -> f64;

    // ---- actions ----

    /// Start `threads` units of `kind` on `host` against `target`.
    ///
    /// Returns [`Pid::INVALID`] when the host refuses (missing access,
    /// insufficient RAM). Consumes host RAM for the duration of the action.
    fn exec(&mut self, kind: ActionKind, host: &str, threads: usize, target: &str) -> Pid;

    /// Whether the job behind `pid` is still running.
    fn is_running(&mut self, pid: Pid) -> bool;

    // ---- rooting ----

    /// Number of distinct port-opening tools available to the operator.
    fn port_crackers(&self) -> u32;

    /// Open as many of `host`'s ports as the available tools allow.
    /// Failures are silent; progress is visible via `node_stats`.
    fn open_ports(&mut self, host: &str);

    /// Attempt to take root on `host`. Returns the resulting rooted state.
    fn nuke(&mut self, host: &str) -> bool;

    // ---- time ----

    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;

    /// Cooperative sleep; the only suspension point in the system.
    fn sleep_ms(&mut self, ms: u64);
}
