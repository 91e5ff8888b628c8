//! Serializable scenario descriptions for the simulated network.
//!
//! A [`SimNetSpec`] is the replay input: node roster, physics constants, and
//! the RNG seed. Every field defaults, so JSON scenarios only spell out what
//! they care about, and two runs from the same spec produce the same trace.

use serde::{Deserialize, Serialize};

/// Physics constants governing action effects, durations, and costs.
///
/// Defaults reproduce the numbers the governor was tuned against: 0.05
/// security per weaken thread, grow/weaken running at 3.2x/4.0x the hack
/// duration, and per-thread script costs of 1.75 / 1.6 / 1.75 GB.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimPhysics {
    /// Security removed per weaken thread.
    pub weaken_per_thread: f64,
    /// Security added per hack thread on completion.
    pub hack_sec_per_thread: f64,
    /// Security added per grow thread on completion.
    pub grow_sec_per_thread: f64,
    /// Grow duration as a multiple of hack duration.
    pub grow_time_mul: f64,
    /// Weaken duration as a multiple of hack duration.
    pub weaken_time_mul: f64,
    /// Per-thread RAM cost of a weaken script, GB.
    pub weaken_cost_gb: f64,
    /// Per-thread RAM cost of a hack script, GB.
    pub hack_cost_gb: f64,
    /// Per-thread RAM cost of a grow script, GB.
    pub grow_cost_gb: f64,
    /// Hack success probability at the security floor.
    pub chance_base: f64,
    /// Success probability lost per point of security above the floor.
    pub chance_decay: f64,
}

impl Default for SimPhysics {
    fn default() -> Self {
        Self {
            weaken_per_thread: 0.05,
            hack_sec_per_thread: 0.002,
            grow_sec_per_thread: 0.004,
            grow_time_mul: 3.2,
            weaken_time_mul: 4.0,
            weaken_cost_gb: 1.75,
            hack_cost_gb: 1.6,
            grow_cost_gb: 1.75,
            chance_base: 0.95,
            chance_decay: 0.02,
        }
    }
}

/// One node in a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimNodeSpec {
    pub hostname: String,
    /// Adjacent nodes; links may be declared on either endpoint.
    pub links: Vec<String>,
    pub max_money: f64,
    pub money: f64,
    pub min_security: f64,
    pub security: f64,
    pub required_skill: u32,
    pub required_ports: u32,
    pub rooted: bool,
    pub player_owned: bool,
    pub max_ram_gb: f64,
    /// Duration of one hack action, ms; grow/weaken scale from this.
    pub hack_time_ms: u64,
    /// Fraction of current money one hack thread extracts.
    pub hack_fraction: f64,
    /// Per-thread multiplicative money growth; must exceed 1.
    pub grow_base: f64,
}

impl Default for SimNodeSpec {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            links: Vec::new(),
            max_money: 0.0,
            money: 0.0,
            min_security: 1.0,
            security: 1.0,
            required_skill: 1,
            required_ports: 0,
            rooted: false,
            player_owned: false,
            max_ram_gb: 0.0,
            hack_time_ms: 1_000,
            hack_fraction: 0.01,
            grow_base: 1.03,
        }
    }
}

/// A complete simulated-network scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimNetSpec {
    /// RNG seed; zero is remapped by the generator.
    pub seed: u64,
    /// The operator's skill level.
    pub player_skill: u32,
    /// Port-opening tools available.
    pub crackers: u32,
    pub physics: SimPhysics,
    pub nodes: Vec<SimNodeSpec>,
}

impl Default for SimNetSpec {
    fn default() -> Self {
        Self {
            seed: 1,
            player_skill: 100,
            crackers: 0,
            physics: SimPhysics::default(),
            nodes: Vec::new(),
        }
    }
}

impl SimNetSpec {
    /// Parses a scenario from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Renders the scenario as pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("spec serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_json_fills_defaults() {
        let spec = SimNetSpec::from_json(
            r#"{
                "seed": 9,
                "nodes": [
                    { "hostname": "home", "rooted": true, "max_ram_gb": 32.0 },
                    { "hostname": "mark", "links": ["home"], "max_money": 500.0 }
                ]
            }"#,
        )
        .expect("parse");

        assert_eq!(spec.seed, 9);
        assert_eq!(spec.player_skill, 100);
        assert_eq!(spec.nodes.len(), 2);
        assert_eq!(spec.nodes[1].hack_time_ms, 1_000);
        assert!((spec.physics.weaken_per_thread - 0.05).abs() < 1e-12);
    }

    #[test]
    fn json_round_trip_preserves_the_spec() {
        let mut spec = SimNetSpec::default();
        spec.nodes.push(SimNodeSpec {
            hostname: "home".into(),
            rooted: true,
            ..SimNodeSpec::default()
        });
        let parsed = SimNetSpec::from_json(&spec.to_json()).expect("parse");
        assert_eq!(parsed, spec);
    }
}
