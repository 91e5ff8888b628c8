//! Canned demo network.
//!
//! A small scenario with enough variety to exercise every governing path:
//! locked nodes for the rooting sweep, drifted security for the weaken cycle,
//! drained and full pools for the mixed cycle, and one node gated behind a
//! skill level the demo operator does not have.

use crate::sim::{SimNet, SimNetSpec, SimNodeSpec};

/// Builds the demo scenario with the given RNG seed.
pub fn demo_spec(seed: u64) -> SimNetSpec {
    let mut spec = SimNetSpec::default();
    spec.seed = seed;
    spec.player_skill = 120;
    spec.crackers = 2;

    let node = |hostname: &str, links: &[&str]| SimNodeSpec {
        hostname: hostname.to_owned(),
        links: links.iter().map(|l| (*l).to_owned()).collect(),
        ..SimNodeSpec::default()
    };

    spec.nodes.push(SimNodeSpec {
        rooted: true,
        player_owned: true,
        max_ram_gb: 128.0,
        ..node("home", &[])
    });

    spec.nodes.push(SimNodeSpec {
        rooted: true,
        max_money: 17_500.0,
        money: 17_500.0,
        min_security: 1.0,
        security: 3.4,
        hack_time_ms: 2_500,
        hack_fraction: 0.02,
        ..node("corner-cafe", &["home"])
    });

    spec.nodes.push(SimNodeSpec {
        max_money: 40_000.0,
        money: 9_000.0,
        min_security: 5.0,
        security: 8.1,
        required_ports: 1,
        required_skill: 60,
        hack_time_ms: 6_000,
        hack_fraction: 0.015,
        ..node("mail-hub", &["home"])
    });

    spec.nodes.push(SimNodeSpec {
        max_money: 250_000.0,
        money: 75_000.0,
        min_security: 10.0,
        security: 14.0,
        required_ports: 2,
        required_skill: 110,
        hack_time_ms: 20_000,
        hack_fraction: 0.01,
        grow_base: 1.02,
        ..node("ad-exchange", &["mail-hub"])
    });

    // Three ports is one more than the demo operator can open.
    spec.nodes.push(SimNodeSpec {
        max_money: 1_200_000.0,
        money: 1_200_000.0,
        min_security: 20.0,
        security: 20.0,
        required_ports: 3,
        required_skill: 90,
        hack_time_ms: 45_000,
        ..node("vault-gw", &["ad-exchange"])
    });

    // Within reach of the tools but above the operator's skill.
    spec.nodes.push(SimNodeSpec {
        max_money: 90_000.0,
        money: 90_000.0,
        min_security: 12.0,
        security: 12.0,
        required_skill: 400,
        hack_time_ms: 30_000,
        ..node("research-lan", &["mail-hub"])
    });

    // Moneyless utility box; discoverable, never governed.
    spec.nodes.push(node("print-relay", &["corner-cafe"]));

    spec
}

/// Builds the demo network directly.
pub fn demo_net(seed: u64) -> SimNet {
    SimNet::from_spec(&demo_spec(seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology;

    #[test]
    fn demo_is_fully_discoverable() {
        let net = demo_net(1);
        let records = topology::discover(&net, "home");
        assert_eq!(records.len(), 7);
        let vault = records.iter().find(|r| r.hostname == "vault-gw").unwrap();
        assert_eq!(vault.depth, 3);
        assert_eq!(vault.path, "/home/mail-hub/ad-exchange/vault-gw");
    }
}
