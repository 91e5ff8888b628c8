//! Breadth-first network discovery.
//!
//! Walks the host-exposed machine graph from a root node and produces one
//! record per reachable node with its parent link, hop count, and a
//! `/root/child/...` path string.
//!
//! Invariants:
//! - Depth is the minimal hop count from the root (the walk is BFS, not DFS).
//! - No node appears twice, keyed by hostname.
//! - A non-root node's path is exactly its parent's path plus `/hostname`.

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};

use crate::env::Environment;

/// One discovered node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    pub hostname: String,
    /// Hostname of the node one hop closer to the root; empty for the root.
    pub parent: String,
    /// Minimal hop count from the root.
    pub depth: u32,
    /// Top-down path, `/root` for the root and `parent_path + "/" + hostname`
    /// below it.
    pub path: String,
}

/// Discovers every node reachable from `root`.
///
/// Records come back in traversal order, so depths are non-decreasing and a
/// parent always precedes its children. Paths are filled in a second pass once
/// every parent chain is known.
pub fn discover<E: Environment + ?Sized>(env: &E, root: &str) -> Vec<NodeRecord> {
    let mut traversed: Vec<NodeRecord> = Vec::new();
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut pending: VecDeque<NodeRecord> = VecDeque::new();

    seen.insert(root.to_owned());
    pending.push_back(NodeRecord {
        hostname: root.to_owned(),
        parent: String::new(),
        depth: 0,
        path: String::new(),
    });

    while let Some(node) = pending.pop_front() {
        for child in env.scan(&node.hostname) {
            if !seen.insert(child.clone()) {
                continue;
            }

            pending.push_back(NodeRecord {
                hostname: child,
                parent: node.hostname.clone(),
                depth: node.depth + 1,
                path: String::new(),
            });
        }

        traversed.push(node);
    }

    assign_paths(&mut traversed);
    traversed
}

/// Fills in `path` for every record, parents before children.
///
/// Traversal order already guarantees a parent precedes its children, so a
/// single forward pass suffices.
fn assign_paths(records: &mut [NodeRecord]) {
    let mut paths: AHashMap<String, String> = AHashMap::with_capacity(records.len());

    for rec in records.iter_mut() {
        let path = if rec.depth == 0 {
            format!("/{}", rec.hostname)
        } else {
            let parent_path = paths
                .get(&rec.parent)
                .expect("parent path assigned before child");
            format!("{}/{}", parent_path, rec.hostname)
        };

        rec.path = path.clone();
        paths.insert(rec.hostname.clone(), path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{ActionKind, NodeStats, Pid};

    /// Minimal environment exposing only an adjacency list.
    struct GraphEnv {
        edges: Vec<(&'static str, &'static str)>,
    }

    impl GraphEnv {
        fn new(edges: Vec<(&'static str, &'static str)>) -> Self {
            Self { edges }
        }
    }

    impl Environment for GraphEnv {
        fn scan(&self, host: &str) -> Vec<String> {
            self.edges
                .iter()
                .filter(|(a, _)| *a == host)
                .map(|(_, b)| (*b).to_owned())
                .chain(
                    self.edges
                        .iter()
                        .filter(|(_, b)| *b == host)
                        .map(|(a, _)| (*a).to_owned()),
                )
                .collect()
        }

        fn node_stats(&self, _host: &str) -> NodeStats {
            unreachable!("discovery only scans")
        }
        fn hack_yield(&self, _host: &str) -> f64 {
            unreachable!()
        }
        fn hack_chance(&self, _host: &str) -> f64 {
            unreachable!()
        }
        fn action_time_ms(&self, _host: &str, _kind: ActionKind) -> u64 {
            unreachable!()
        }
        fn weaken_effect(&self, _threads: usize) -> f64 {
            unreachable!()
        }
        fn growth_threads(&self, _host: &str, _factor: f64) -> f64 {
            unreachable!()
        }
        fn hacking_level(&self) -> u32 {
            unreachable!()
        }
        fn free_ram_gb(&self, _host: &str) -> f64 {
            unreachable!()
        }
        fn action_cost_gb(&self, _kind: ActionKind) -> f64 {
            unreachable!()
        }
        fn exec(&mut self, _: ActionKind, _: &str, _: usize, _: &str) -> Pid {
            unreachable!()
        }
        fn is_running(&mut self, _pid: Pid) -> bool {
            unreachable!()
        }
        fn port_crackers(&self) -> u32 {
            unreachable!()
        }
        fn open_ports(&mut self, _host: &str) {
            unreachable!()
        }
        fn nuke(&mut self, _host: &str) -> bool {
            unreachable!()
        }
        fn now_ms(&self) -> u64 {
            unreachable!()
        }
        fn sleep_ms(&mut self, _ms: u64) {
            unreachable!()
        }
    }

    fn find<'a>(records: &'a [NodeRecord], host: &str) -> &'a NodeRecord {
        records.iter().find(|r| r.hostname == host).unwrap()
    }

    #[test]
    fn single_node_network() {
        let env = GraphEnv::new(vec![]);
        let net = discover(&env, "home");
        assert_eq!(net.len(), 1);
        assert_eq!(net[0].depth, 0);
        assert_eq!(net[0].path, "/home");
        assert_eq!(net[0].parent, "");
    }

    #[test]
    fn chain_depths_and_paths() {
        let env = GraphEnv::new(vec![("home", "a"), ("a", "b"), ("b", "c")]);
        let net = discover(&env, "home");
        assert_eq!(net.len(), 4);
        assert_eq!(find(&net, "c").depth, 3);
        assert_eq!(find(&net, "c").path, "/home/a/b/c");
        assert_eq!(find(&net, "b").parent, "a");
    }

    #[test]
    fn diamond_takes_minimal_depth() {
        // home -> a -> c and home -> b -> c; c must land at depth 2, once.
        let env = GraphEnv::new(vec![
            ("home", "a"),
            ("home", "b"),
            ("a", "c"),
            ("b", "c"),
            ("c", "d"),
        ]);
        let net = discover(&env, "home");
        assert_eq!(net.len(), 5);
        assert_eq!(find(&net, "c").depth, 2);
        assert_eq!(find(&net, "d").depth, 3);
        assert_eq!(net.iter().filter(|r| r.hostname == "c").count(), 1);
    }

    #[test]
    fn cycle_terminates() {
        let env = GraphEnv::new(vec![("home", "a"), ("a", "b"), ("b", "home")]);
        let net = discover(&env, "home");
        assert_eq!(net.len(), 3);
        // b is reachable in one hop through the back edge.
        assert_eq!(find(&net, "b").depth, 1);
    }

    #[test]
    fn traversal_order_is_breadth_first() {
        let env = GraphEnv::new(vec![("home", "a"), ("home", "b"), ("a", "c")]);
        let net = discover(&env, "home");
        let depths: Vec<u32> = net.iter().map(|r| r.depth).collect();
        let mut sorted = depths.clone();
        sorted.sort_unstable();
        assert_eq!(depths, sorted, "depths must be non-decreasing");
    }
}
