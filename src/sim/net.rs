//! Simulated network implementing [`Environment`].
//!
//! # Model
//!
//! Nodes carry money, security, and RAM; jobs are settled lazily whenever
//! time advances or a handle is polled, strictly in `(end_time, pid)` order.
//! Because the clock only moves through `sleep_ms`, the same scenario and
//! seed always produce the same trace.
//!
//! # Invariants
//!
//! - RAM consumed by a job is returned exactly once, when the job settles.
//! - Security never drops below a node's floor and money never exceeds its
//!   capacity.
//! - `exec` either consumes RAM and returns a live handle, or consumes
//!   nothing and returns [`Pid::INVALID`].

use ahash::AHashMap;

use crate::env::{ActionKind, Environment, NodeStats, Pid};

use super::clock::SimClock;
use super::rng::SimRng;
use super::spec::{SimNetSpec, SimPhysics};

/// Live state of one simulated node.
#[derive(Clone, Debug)]
pub struct SimNode {
    pub hostname: String,
    pub links: Vec<String>,
    pub max_money: f64,
    pub money: f64,
    pub min_security: f64,
    pub security: f64,
    pub required_skill: u32,
    pub required_ports: u32,
    pub open_ports: u32,
    pub rooted: bool,
    pub player_owned: bool,
    pub max_ram_gb: f64,
    /// RAM in use, in hundredths of a GB. Integer so that every job's
    /// release cancels its acquisition exactly, with no float residue.
    pub used_ram_hundredths: u64,
    pub hack_time_ms: u64,
    pub hack_fraction: f64,
    pub grow_base: f64,
}

impl SimNode {
    /// RAM capacity in hundredths of a GB.
    fn max_ram_hundredths(&self) -> u64 {
        (self.max_ram_gb * 100.0).round() as u64
    }

    /// Sets the in-use RAM from a GB value, for scenario adjustments.
    pub fn set_used_ram_gb(&mut self, gb: f64) {
        self.used_ram_hundredths = (gb * 100.0).round() as u64;
    }

    /// RAM currently free, in GB.
    pub fn free_ram_gb(&self) -> f64 {
        (self.max_ram_hundredths() - self.used_ram_hundredths) as f64 / 100.0
    }
}

/// One in-flight simulated job.
#[derive(Clone, Debug)]
struct SimJob {
    pid: u32,
    kind: ActionKind,
    host: String,
    target: String,
    threads: usize,
    ram_hundredths: u64,
    ends_at_ms: u64,
}

/// Record of one accepted `exec`, for assertions about dispatch order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchRecord {
    pub at_ms: u64,
    pub kind: ActionKind,
    pub host: String,
    pub target: String,
    pub threads: usize,
    pub pid: Pid,
}

/// Deterministic in-memory network.
pub struct SimNet {
    nodes: Vec<SimNode>,
    index: AHashMap<String, usize>,
    physics: SimPhysics,
    clock: SimClock,
    rng: SimRng,
    player_skill: u32,
    crackers: u32,
    jobs: Vec<SimJob>,
    next_pid: u32,
    refuse_exec: bool,
    log: Vec<DispatchRecord>,
    stolen_total: f64,
    peak_committed: AHashMap<String, usize>,
}

impl SimNet {
    /// Builds a network from a scenario.
    ///
    /// # Panics
    /// Panics on malformed scenarios: duplicate hostnames, links to unknown
    /// nodes, or a grow base at or below 1.
    pub fn from_spec(spec: &SimNetSpec) -> Self {
        let mut nodes: Vec<SimNode> = Vec::with_capacity(spec.nodes.len());
        let mut index: AHashMap<String, usize> = AHashMap::with_capacity(spec.nodes.len());

        for node in &spec.nodes {
            assert!(!node.hostname.is_empty(), "node without a hostname");
            assert!(
                1.0 < node.grow_base,
                "grow_base must exceed 1, got {} on {}",
                node.grow_base,
                node.hostname
            );
            let prev = index.insert(node.hostname.clone(), nodes.len());
            assert!(prev.is_none(), "duplicate hostname {}", node.hostname);

            nodes.push(SimNode {
                hostname: node.hostname.clone(),
                links: node.links.clone(),
                max_money: node.max_money,
                money: node.money,
                min_security: node.min_security,
                security: node.security,
                required_skill: node.required_skill,
                required_ports: node.required_ports,
                open_ports: 0,
                rooted: node.rooted,
                player_owned: node.player_owned,
                max_ram_gb: node.max_ram_gb,
                used_ram_hundredths: 0,
                hack_time_ms: node.hack_time_ms,
                hack_fraction: node.hack_fraction,
                grow_base: node.grow_base,
            });
        }

        // Links may be declared on either endpoint; make them symmetric.
        let declared: Vec<(usize, String)> = nodes
            .iter()
            .enumerate()
            .flat_map(|(i, n)| n.links.iter().cloned().map(move |l| (i, l)))
            .collect();
        for (i, link) in declared {
            let j = *index
                .get(&link)
                .unwrap_or_else(|| panic!("link to unknown node {link}"));
            let back = nodes[i].hostname.clone();
            if !nodes[j].links.contains(&back) {
                nodes[j].links.push(back);
            }
        }

        Self {
            nodes,
            index,
            physics: spec.physics,
            clock: SimClock::new(),
            rng: SimRng::new(spec.seed),
            player_skill: spec.player_skill,
            crackers: spec.crackers,
            jobs: Vec::new(),
            next_pid: 1,
            refuse_exec: false,
            log: Vec::new(),
            stolen_total: 0.0,
            peak_committed: AHashMap::new(),
        }
    }

    // ---- inspection for tests and reporting ----

    /// Borrow a node by hostname.
    ///
    /// # Panics
    /// Panics on unknown hostnames; the caller names nodes it created.
    pub fn node(&self, host: &str) -> &SimNode {
        &self.nodes[self.idx(host).expect("known node")]
    }

    /// Mutable borrow, for scenario adjustments between runs.
    pub fn node_mut(&mut self, host: &str) -> &mut SimNode {
        let i = self.idx(host).expect("known node");
        &mut self.nodes[i]
    }

    /// Every accepted dispatch, in order.
    pub fn dispatch_log(&self) -> &[DispatchRecord] {
        &self.log
    }

    /// Total money extracted by completed hacks.
    pub fn stolen_total(&self) -> f64 {
        self.stolen_total
    }

    /// Highest concurrent thread count ever committed against `target`.
    pub fn max_committed(&self, target: &str) -> usize {
        self.peak_committed.get(target).copied().unwrap_or(0)
    }

    /// Jobs not yet settled.
    pub fn jobs_in_flight(&self) -> usize {
        self.jobs.len()
    }

    /// When `true`, every `exec` is refused with an invalid handle.
    pub fn refuse_exec(&mut self, refuse: bool) {
        self.refuse_exec = refuse;
    }

    // ---- internals ----

    fn idx(&self, host: &str) -> Option<usize> {
        self.index.get(host).copied()
    }

    fn duration_ms(&self, node: &SimNode, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Hack => node.hack_time_ms,
            ActionKind::Grow => (node.hack_time_ms as f64 * self.physics.grow_time_mul) as u64,
            ActionKind::Weaken => (node.hack_time_ms as f64 * self.physics.weaken_time_mul) as u64,
        }
    }

    fn cost_gb(&self, kind: ActionKind) -> f64 {
        match kind {
            ActionKind::Weaken => self.physics.weaken_cost_gb,
            ActionKind::Hack => self.physics.hack_cost_gb,
            ActionKind::Grow => self.physics.grow_cost_gb,
        }
    }

    fn chance_for(&self, node: &SimNode) -> f64 {
        let drift = node.security - node.min_security;
        (self.physics.chance_base - self.physics.chance_decay * drift).clamp(0.05, 0.95)
    }

    /// Settles every job whose predicted end has passed, in `(end, pid)`
    /// order so traces are stable.
    fn settle_due(&mut self) {
        let now = self.clock.now_ms();
        let mut due: Vec<SimJob> = Vec::new();
        self.jobs.retain(|job| {
            if job.ends_at_ms <= now {
                due.push(job.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|j| (j.ends_at_ms, j.pid));

        for job in due {
            self.apply(&job);
        }
    }

    fn apply(&mut self, job: &SimJob) {
        // Release the host RAM first; effects never depend on it.
        {
            let host = self.node_mut(&job.host);
            debug_assert!(job.ram_hundredths <= host.used_ram_hundredths);
            host.used_ram_hundredths -= job.ram_hundredths;
        }

        let physics = self.physics;
        let threads = job.threads as f64;

        match job.kind {
            ActionKind::Weaken => {
                let target = self.node_mut(&job.target);
                target.security = (target.security - physics.weaken_per_thread * threads)
                    .max(target.min_security);
            }
            ActionKind::Hack => {
                let chance = self.chance_for(self.node(&job.target));
                let success = self.rng.chance(chance);
                let mut loot = 0.0;
                let target = self.node_mut(&job.target);
                if success {
                    loot = (target.hack_fraction * threads * target.money).min(target.money);
                    target.money -= loot;
                }
                target.security += physics.hack_sec_per_thread * threads;
                self.stolen_total += loot;
            }
            ActionKind::Grow => {
                let target = self.node_mut(&job.target);
                let grown = target.money.max(1.0) * target.grow_base.powf(threads);
                target.money = grown.min(target.max_money);
                target.security += physics.grow_sec_per_thread * threads;
            }
        }
    }

    fn committed_now(&self, target: &str) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.target == target)
            .map(|j| j.threads)
            .sum()
    }
}

impl Environment for SimNet {
    fn scan(&self, host: &str) -> Vec<String> {
        match self.idx(host) {
            Some(i) => self.nodes[i].links.clone(),
            None => Vec::new(),
        }
    }

    fn node_stats(&self, host: &str) -> NodeStats {
        let node = self.node(host);
        NodeStats {
            rooted: node.rooted,
            max_money: node.max_money,
            money: node.money,
            required_skill: node.required_skill,
            required_ports: node.required_ports,
            min_security: node.min_security,
            security: node.security,
            player_owned: node.player_owned,
        }
    }

    fn hack_yield(&self, host: &str) -> f64 {
        let node = self.node(host);
        node.hack_fraction * node.max_money
    }

    fn hack_chance(&self, host: &str) -> f64 {
        self.chance_for(self.node(host))
    }

    fn action_time_ms(&self, host: &str, kind: ActionKind) -> u64 {
        self.duration_ms(self.node(host), kind)
    }

    fn weaken_effect(&self, threads: usize) -> f64 {
        self.physics.weaken_per_thread * threads as f64
    }

    fn growth_threads(&self, host: &str, factor: f64) -> f64 {
        if factor <= 1.0 {
            return 0.0;
        }
        factor.ln() / self.node(host).grow_base.ln()
    }

    fn hacking_level(&self) -> u32 {
        self.player_skill
    }

    fn free_ram_gb(&self, host: &str) -> f64 {
        self.node(host).free_ram_gb()
    }

    fn action_cost_gb(&self, kind: ActionKind) -> f64 {
        self.cost_gb(kind)
    }

    fn exec(&mut self, kind: ActionKind, host: &str, threads: usize, target: &str) -> Pid {
        self.settle_due();

        if self.refuse_exec || threads == 0 {
            return Pid::INVALID;
        }
        let (Some(host_idx), Some(target_idx)) = (self.idx(host), self.idx(target)) else {
            return Pid::INVALID;
        };
        if !self.nodes[host_idx].rooted || !self.nodes[target_idx].rooted {
            return Pid::INVALID;
        }

        let ram_hundredths = (self.cost_gb(kind) * 100.0).round() as u64 * threads as u64;
        let host_node = &self.nodes[host_idx];
        let free_hundredths = host_node.max_ram_hundredths() - host_node.used_ram_hundredths;
        if free_hundredths < ram_hundredths {
            return Pid::INVALID;
        }

        self.nodes[host_idx].used_ram_hundredths += ram_hundredths;
        let pid = self.next_pid;
        self.next_pid += 1;

        let ends_at_ms = self.clock.now_ms() + self.duration_ms(&self.nodes[target_idx], kind);
        self.jobs.push(SimJob {
            pid,
            kind,
            host: host.to_owned(),
            target: target.to_owned(),
            threads,
            ram_hundredths,
            ends_at_ms,
        });

        let committed = self.committed_now(target);
        let peak = self.peak_committed.entry(target.to_owned()).or_insert(0);
        *peak = (*peak).max(committed);

        self.log.push(DispatchRecord {
            at_ms: self.clock.now_ms(),
            kind,
            host: host.to_owned(),
            target: target.to_owned(),
            threads,
            pid: Pid(pid),
        });

        Pid(pid)
    }

    fn is_running(&mut self, pid: Pid) -> bool {
        self.settle_due();
        self.jobs.iter().any(|j| j.pid == pid.0)
    }

    fn port_crackers(&self) -> u32 {
        self.crackers
    }

    fn open_ports(&mut self, host: &str) {
        let crackers = self.crackers;
        let node = self.node_mut(host);
        node.open_ports = node.open_ports.max(crackers.min(node.required_ports));
    }

    fn nuke(&mut self, host: &str) -> bool {
        let node = self.node_mut(host);
        if node.required_ports <= node.open_ports {
            node.rooted = true;
        }
        node.rooted
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.clock.advance_by(ms);
        self.settle_due();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimNodeSpec;

    fn basic_net() -> SimNet {
        let mut spec = SimNetSpec::default();
        spec.nodes.push(SimNodeSpec {
            hostname: "home".into(),
            rooted: true,
            player_owned: true,
            max_ram_gb: 32.0,
            ..SimNodeSpec::default()
        });
        spec.nodes.push(SimNodeSpec {
            hostname: "mark".into(),
            links: vec!["home".into()],
            rooted: true,
            max_money: 1000.0,
            money: 1000.0,
            min_security: 1.0,
            security: 1.5,
            hack_time_ms: 1_000,
            ..SimNodeSpec::default()
        });
        SimNet::from_spec(&spec)
    }

    #[test]
    fn links_are_symmetric() {
        let net = basic_net();
        assert_eq!(net.scan("home"), vec!["mark".to_owned()]);
        assert_eq!(net.scan("mark"), vec!["home".to_owned()]);
        assert!(net.scan("no-such-node").is_empty());
    }

    #[test]
    fn weaken_job_settles_at_predicted_time() {
        let mut net = basic_net();
        let pid = net.exec(ActionKind::Weaken, "home", 4, "mark");
        assert!(pid.is_valid());
        assert!(net.is_running(pid));

        net.sleep_ms(3_999);
        assert!(net.is_running(pid), "weaken runs 4x hack time");
        net.sleep_ms(1);
        assert!(!net.is_running(pid));

        // 1.5 - 4 * 0.05 clamps at the 1.3 mark, above the floor.
        assert!((net.node("mark").security - 1.3).abs() < 1e-9);
        assert_eq!(net.free_ram_gb("home"), 32.0, "RAM returns on settle");
    }

    #[test]
    fn weaken_clamps_at_the_floor() {
        let mut net = basic_net();
        // 16 threads would remove 0.8, well past the 0.5 of drift present.
        let pid = net.exec(ActionKind::Weaken, "home", 16, "mark");
        assert!(pid.is_valid());
        net.sleep_ms(10_000);
        assert_eq!(net.node("mark").security, 1.0);
    }

    #[test]
    fn grow_caps_at_capacity_and_raises_security() {
        let mut net = basic_net();
        net.node_mut("mark").money = 990.0;
        net.exec(ActionKind::Grow, "home", 10, "mark");
        net.sleep_ms(10_000);
        let node = net.node("mark");
        assert_eq!(node.money, 1000.0);
        assert!((node.security - 1.54).abs() < 1e-9);
    }

    #[test]
    fn exec_refuses_without_ram_or_root() {
        let mut net = basic_net();
        net.node_mut("mark").rooted = false;
        assert_eq!(net.exec(ActionKind::Hack, "home", 1, "mark"), Pid::INVALID);

        net.node_mut("mark").rooted = true;
        net.node_mut("home").set_used_ram_gb(30.0);
        assert_eq!(net.exec(ActionKind::Hack, "home", 1, "mark"), Pid(1));
        assert_eq!(
            net.exec(ActionKind::Hack, "home", 1, "mark"),
            Pid::INVALID,
            "second job exceeds the remaining 0.4 GB"
        );
    }

    #[test]
    fn same_seed_same_trace() {
        let run = |seed: u64| {
            let mut spec = SimNetSpec::default();
            spec.seed = seed;
            spec.nodes.push(SimNodeSpec {
                hostname: "home".into(),
                rooted: true,
                player_owned: true,
                max_ram_gb: 32.0,
                ..SimNodeSpec::default()
            });
            spec.nodes.push(SimNodeSpec {
                hostname: "mark".into(),
                links: vec!["home".into()],
                rooted: true,
                max_money: 1000.0,
                money: 1000.0,
                security: 3.0,
                hack_time_ms: 500,
                ..SimNodeSpec::default()
            });
            let mut net = SimNet::from_spec(&spec);
            for _ in 0..16 {
                net.exec(ActionKind::Hack, "home", 2, "mark");
                net.sleep_ms(750);
            }
            (net.stolen_total(), net.node("mark").money)
        };

        assert_eq!(run(11), run(11));
        assert!(0.0 < run(11).0, "some of sixteen hacks must land");
    }
}
