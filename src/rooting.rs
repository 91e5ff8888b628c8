//! Rooting sweep: take admin rights everywhere the tools allow.
//!
//! For each discovered node the sweep opens what ports it can with the
//! operator's cracking tools and then attempts a nuke. Cracking failures are
//! deliberately swallowed; a node that stays locked today may fall after the
//! next tool is acquired, and the sweep is rerun cheaply.

use crate::env::Environment;
use crate::topology::{self, NodeRecord};

/// What the sweep concluded about one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootStatus {
    /// The nuke landed during this sweep.
    NewlyRooted,
    /// Root was already held before the sweep.
    AlreadyRooted,
    /// Not enough ports could be opened.
    StillLocked,
}

/// Per-node sweep outcome.
#[derive(Clone, Debug)]
pub struct RootOutcome {
    pub record: NodeRecord,
    pub status: RootStatus,
}

/// Summary counts over a whole sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RootReport {
    pub newly_rooted: usize,
    pub already_rooted: usize,
    pub still_locked: usize,
}

impl RootReport {
    /// Nodes the operator holds root on after the sweep.
    pub fn rooted_total(&self) -> usize {
        self.newly_rooted + self.already_rooted
    }
}

/// Sweeps every node reachable from `root`.
///
/// Outcomes come back in traversal order so callers can render them as a
/// stable report.
pub fn sweep<E: Environment + ?Sized>(env: &mut E, root: &str) -> (Vec<RootOutcome>, RootReport) {
    let records = topology::discover(env, root);
    let mut outcomes = Vec::with_capacity(records.len());
    let mut report = RootReport::default();

    for record in records {
        let status = root_one(env, &record.hostname);
        match status {
            RootStatus::NewlyRooted => report.newly_rooted += 1,
            RootStatus::AlreadyRooted => report.already_rooted += 1,
            RootStatus::StillLocked => report.still_locked += 1,
        }
        outcomes.push(RootOutcome { record, status });
    }

    (outcomes, report)
}

/// Cracks and nukes a single node.
fn root_one<E: Environment + ?Sized>(env: &mut E, hostname: &str) -> RootStatus {
    // No point nuking a node already held.
    if env.node_stats(hostname).rooted {
        return RootStatus::AlreadyRooted;
    }

    env.open_ports(hostname);
    if env.nuke(hostname) {
        RootStatus::NewlyRooted
    } else {
        RootStatus::StillLocked
    }
}
