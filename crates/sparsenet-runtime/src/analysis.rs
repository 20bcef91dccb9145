//! Topology analysis - small-world statistics and adjacency dumps.
//!
//! Adjacency slots are directed (rewiring replaces targets one slot at a
//! time), so the directed graph is the faithful one. Clustering and path
//! length are measured on the undirected view, the usual small-world
//! convention.

use petgraph::algo::{connected_components, dijkstra};
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use serde::Serialize;
use sparsenet_core::topology::NetworkTopology;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;

/// Directed graph with one edge per adjacency slot. Node weights are node
/// indices, and `NodeIndex::new(i)` is node `i`.
pub fn to_graph(topology: &NetworkTopology) -> DiGraph<usize, ()> {
    let n = topology.neurons();
    let mut graph = DiGraph::with_capacity(n, topology.slot_count());
    for i in 0..n {
        graph.add_node(i);
    }
    for (i, list) in topology.adjacency().iter().enumerate() {
        for &j in list {
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
        }
    }
    graph
}

/// Undirected view: one edge per connected pair.
pub fn to_undirected(topology: &NetworkTopology) -> UnGraph<usize, ()> {
    let pairs: BTreeSet<(usize, usize)> = topology
        .adjacency()
        .iter()
        .enumerate()
        .flat_map(|(i, list)| list.iter().map(move |&j| (i.min(j), i.max(j))))
        .collect();

    let mut graph = UnGraph::with_capacity(topology.neurons(), pairs.len());
    for i in 0..topology.neurons() {
        graph.add_node(i);
    }
    for (a, b) in pairs {
        graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
    }
    graph
}

/// Structural summary of a topology.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyReport {
    pub neurons: usize,
    pub slots: usize,
    pub mean_degree: f64,
    pub min_degree: usize,
    pub max_degree: usize,
    /// Average local clustering coefficient of the undirected view.
    pub clustering: f64,
    /// Mean shortest-path length over reachable pairs (NaN if none).
    pub path_length: f64,
    /// Weakly connected components.
    pub components: usize,
    /// Slots `i -> j` without a matching `j -> i`.
    pub asymmetric_slots: usize,
}

/// Analyze `topology`. Path length uses BFS from at most `max_sources`
/// evenly spaced nodes (all nodes when `max_sources >= N`).
pub fn analyze(topology: &NetworkTopology, max_sources: usize) -> TopologyReport {
    let n = topology.neurons();
    let degrees: Vec<usize> = topology.adjacency().iter().map(Vec::len).collect();
    let undirected = to_undirected(topology);

    TopologyReport {
        neurons: n,
        slots: topology.slot_count(),
        mean_degree: if n == 0 {
            0.0
        } else {
            topology.slot_count() as f64 / n as f64
        },
        min_degree: degrees.iter().copied().min().unwrap_or(0),
        max_degree: degrees.iter().copied().max().unwrap_or(0),
        clustering: clustering_coefficient(&undirected),
        path_length: characteristic_path_length(&undirected, max_sources),
        components: connected_components(&to_graph(topology)),
        asymmetric_slots: asymmetric_slots(topology),
    }
}

/// Mean over nodes of `links among neighbors / (k (k − 1) / 2)`; nodes with
/// fewer than two neighbors contribute 0.
pub fn clustering_coefficient(graph: &UnGraph<usize, ()>) -> f64 {
    let n = graph.node_count();
    if n == 0 {
        return 0.0;
    }

    let total: f64 = graph
        .node_indices()
        .map(|u| {
            let neighbors: Vec<NodeIndex> = graph
                .neighbors(u)
                .filter(|&v| v != u)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            let k = neighbors.len();
            if k < 2 {
                return 0.0;
            }
            let mut links = 0usize;
            for (a, &v) in neighbors.iter().enumerate() {
                for &w in &neighbors[a + 1..] {
                    if graph.find_edge(v, w).is_some() {
                        links += 1;
                    }
                }
            }
            2.0 * links as f64 / (k * (k - 1)) as f64
        })
        .sum();

    total / n as f64
}

/// Mean BFS distance over reachable ordered pairs from the sampled sources.
pub fn characteristic_path_length(graph: &UnGraph<usize, ()>, max_sources: usize) -> f64 {
    let n = graph.node_count();
    if n == 0 || max_sources == 0 {
        return f64::NAN;
    }
    let sources = max_sources.min(n);
    let stride = n as f64 / sources as f64;

    let mut sum = 0usize;
    let mut pairs = 0usize;
    for s in 0..sources {
        let start = NodeIndex::new((s as f64 * stride) as usize);
        let distances = dijkstra(graph, start, None, |_| 1usize);
        for (&node, &d) in &distances {
            if node != start {
                sum += d;
                pairs += 1;
            }
        }
    }

    if pairs == 0 {
        f64::NAN
    } else {
        sum as f64 / pairs as f64
    }
}

/// Slots whose target does not list the source back.
pub fn asymmetric_slots(topology: &NetworkTopology) -> usize {
    topology
        .adjacency()
        .iter()
        .enumerate()
        .map(|(i, list)| list.iter().filter(|&&j| !topology.is_neighbor(j, i)).count())
        .sum()
}

/// One line per node: `i->j, i->k, ...`.
pub fn adjacency_listing(topology: &NetworkTopology) -> String {
    let mut out = format!(
        "N={}, K={}, w={}\n",
        topology.neurons(),
        topology.degree(),
        topology.rewiring()
    );
    for (i, list) in topology.adjacency().iter().enumerate() {
        for &j in list {
            let _ = write!(out, "{i}->{j}, ");
        }
        out.push('\n');
    }
    out
}

/// Dense 0/1 matrix, row `i` marking the targets of node `i`.
pub fn adjacency_matrix(topology: &NetworkTopology) -> String {
    let n = topology.neurons();
    let mut out = String::with_capacity(n * (2 * n + 1));
    for i in 0..n {
        for j in 0..n {
            out.push_str(if topology.is_neighbor(i, j) { "1 " } else { "0 " });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sparsenet_core::topology::{NetworkConfig, TopologyKind};

    fn ring(neurons: usize, degree: usize, rewiring: f64, seed: u64) -> NetworkTopology {
        let config = NetworkConfig {
            neurons,
            degree,
            rewiring,
            topology: TopologyKind::Ring,
            ..Default::default()
        };
        NetworkTopology::build(&config, &mut StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn ring_lattice_statistics() {
        let top = ring(100, 4, 0.0, 0);
        let report = analyze(&top, 100);
        assert_eq!(report.slots, 400);
        assert_eq!(report.mean_degree, 4.0);
        assert_eq!(report.min_degree, 4);
        assert_eq!(report.max_degree, 4);
        assert_eq!(report.components, 1);
        assert_eq!(report.asymmetric_slots, 0);
        // Ring lattice with K = 4: C = 3(K − 2) / (4(K − 1)) = 0.5
        assert!((report.clustering - 0.5).abs() < 1e-12);
        assert!(report.path_length > 10.0);
    }

    #[test]
    fn rewiring_shortens_paths_and_breaks_symmetry() {
        let lattice = analyze(&ring(200, 6, 0.0, 1), 200);
        let rewired_top = ring(200, 6, 0.2, 1);
        let rewired = analyze(&rewired_top, 200);
        assert!(rewired.path_length < lattice.path_length);
        assert!(rewired.clustering < lattice.clustering);
        assert!(rewired.asymmetric_slots > 0);
        assert_eq!(rewired.slots, lattice.slots);
    }

    #[test]
    fn directed_graph_has_one_edge_per_slot() {
        let top = ring(10, 2, 0.0, 0);
        let g = to_graph(&top);
        assert_eq!(g.node_count(), 10);
        assert_eq!(g.edge_count(), 20);
        assert_eq!(to_undirected(&top).edge_count(), 10);
    }

    #[test]
    fn disconnected_adjacency_counts_components() {
        let top = NetworkTopology::from_adjacency(
            TopologyKind::Ring,
            vec![vec![1], vec![0], vec![3], vec![2]],
        )
        .unwrap();
        let report = analyze(&top, 4);
        assert_eq!(report.components, 2);
        assert_eq!(report.path_length, 1.0);
        assert_eq!(report.clustering, 0.0);
    }

    #[test]
    fn dumps_match_adjacency() {
        let top = ring(4, 2, 0.0, 0);
        let listing = adjacency_listing(&top);
        assert!(listing.starts_with("N=4, K=2, w=0\n"));
        assert!(listing.contains("0->1, 0->3, "));

        let matrix = adjacency_matrix(&top);
        assert_eq!(matrix.lines().next(), Some("0 1 0 1 "));
        assert_eq!(matrix.lines().count(), 4);
    }
}
