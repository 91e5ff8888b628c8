//! Properties of breadth-first network discovery.
//!
//! Random connected graphs are generated as a spanning tree plus extra
//! edges; a test-local BFS provides the expected minimal depths.

use std::collections::{HashMap, HashSet, VecDeque};

use autohack_rs::sim::{SimNet, SimNetSpec, SimNodeSpec};
use autohack_rs::topology;
use proptest::prelude::*;

/// A random graph: `parent_of[i]` attaches node `i + 1` somewhere below the
/// root, and `extras` adds cross links.
#[derive(Clone, Debug)]
struct GraphCase {
    parent_of: Vec<usize>,
    extras: Vec<(usize, usize)>,
}

fn graph_case() -> impl Strategy<Value = GraphCase> {
    (1usize..24)
        .prop_flat_map(|n| {
            let parents = proptest::collection::vec(any::<proptest::sample::Index>(), n);
            let extras = proptest::collection::vec((0..=n, 0..=n), 0..4);
            (parents, extras)
        })
        .prop_map(|(parents, extras)| GraphCase {
            parent_of: parents
                .into_iter()
                .enumerate()
                .map(|(i, idx)| idx.index(i + 1))
                .collect(),
            extras,
        })
}

fn hostname(i: usize) -> String {
    if i == 0 {
        "home".to_owned()
    } else {
        format!("node-{i}")
    }
}

fn build_net(case: &GraphCase) -> (SimNet, Vec<(usize, usize)>) {
    let n = case.parent_of.len() + 1;
    let mut edges: Vec<(usize, usize)> = case
        .parent_of
        .iter()
        .enumerate()
        .map(|(i, &p)| (p, i + 1))
        .collect();
    for &(a, b) in &case.extras {
        if a != b {
            edges.push((a, b));
        }
    }

    let mut spec = SimNetSpec::default();
    for i in 0..n {
        spec.nodes.push(SimNodeSpec {
            hostname: hostname(i),
            links: edges
                .iter()
                .filter(|(a, _)| *a == i)
                .map(|(_, b)| hostname(*b))
                .collect(),
            ..SimNodeSpec::default()
        });
    }
    (SimNet::from_spec(&spec), edges)
}

/// Reference BFS over the symmetric edge list.
fn expected_depths(n: usize, edges: &[(usize, usize)]) -> Vec<u32> {
    let mut adjacency = vec![Vec::new(); n];
    for &(a, b) in edges {
        adjacency[a].push(b);
        adjacency[b].push(a);
    }

    let mut depth = vec![u32::MAX; n];
    let mut queue = VecDeque::new();
    depth[0] = 0;
    queue.push_back(0);
    while let Some(i) = queue.pop_front() {
        for &j in &adjacency[i] {
            if depth[j] == u32::MAX {
                depth[j] = depth[i] + 1;
                queue.push_back(j);
            }
        }
    }
    depth
}

proptest! {
    #[test]
    fn depth_is_the_minimal_hop_count(case in graph_case()) {
        let n = case.parent_of.len() + 1;
        let (net, edges) = build_net(&case);
        let expected = expected_depths(n, &edges);

        let records = topology::discover(&net, "home");
        prop_assert_eq!(records.len(), n, "every node is reachable");

        for i in 0..n {
            let rec = records.iter().find(|r| r.hostname == hostname(i)).unwrap();
            prop_assert_eq!(rec.depth, expected[i], "depth of {}", rec.hostname);
        }
    }

    #[test]
    fn no_node_is_visited_twice(case in graph_case()) {
        let (net, _) = build_net(&case);
        let records = topology::discover(&net, "home");
        let unique: HashSet<&str> = records.iter().map(|r| r.hostname.as_str()).collect();
        prop_assert_eq!(unique.len(), records.len());
    }

    #[test]
    fn paths_concatenate_parent_chains(case in graph_case()) {
        let (net, _) = build_net(&case);
        let records = topology::discover(&net, "home");
        let by_name: HashMap<&str, &topology::NodeRecord> =
            records.iter().map(|r| (r.hostname.as_str(), r)).collect();

        for rec in &records {
            if rec.depth == 0 {
                prop_assert_eq!(rec.path.as_str(), "/home");
                prop_assert_eq!(rec.parent.as_str(), "");
                continue;
            }
            let parent = by_name[rec.parent.as_str()];
            prop_assert_eq!(parent.depth + 1, rec.depth);
            prop_assert_eq!(format!("{}/{}", parent.path, rec.hostname), rec.path.clone());
        }
    }
}
