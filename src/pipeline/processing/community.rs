//! Modularity-based community detection for the venue graphs.

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};

use crate::pipeline::processing::graph::VenueGraph;

/// Smallest modularity gain still worth another pass
const MIN_GAIN: f64 = 1e-7;

/// Assigns a community id to every node of a venue graph.
///
/// The returned vector is indexed by node position. Ids are dense and start at 0.
pub trait CommunityDetector {
    fn partition(&self, graph: &VenueGraph) -> Vec<usize>;
}

/// Multi-level Louvain with a seeded visiting order
#[derive(Debug, Clone, Copy)]
pub struct Louvain {
    pub seed: u64,
    pub resolution: f64,
}

impl Louvain {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            resolution: 1.0,
        }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }
}

impl CommunityDetector for Louvain {
    fn partition(&self, graph: &VenueGraph) -> Vec<usize> {
        best_partition(graph.graph(), self.resolution, self.seed)
    }
}

/// Weighted adjacency of one aggregation level
#[derive(Debug, Clone)]
struct LevelGraph {
    adj: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
    degrees: Vec<f64>,
    total_weight: f64,
}

impl LevelGraph {
    fn from_graph<N>(graph: &UnGraph<N, f64>) -> Self {
        let n = graph.node_count();
        let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        let mut self_loops = vec![0.0; n];
        for edge in graph.edge_references() {
            let (a, b, w) = (edge.source().index(), edge.target().index(), *edge.weight());
            if a == b {
                self_loops[a] += w;
            } else {
                *adj[a].entry(b).or_insert(0.0) += w;
                *adj[b].entry(a).or_insert(0.0) += w;
            }
        }
        Self::from_parts(adj, self_loops)
    }

    fn from_parts(adj: Vec<BTreeMap<usize, f64>>, self_loops: Vec<f64>) -> Self {
        // a self-loop counts twice towards its node's degree
        let degrees: Vec<f64> = adj
            .iter()
            .zip(&self_loops)
            .map(|(neighbours, own)| neighbours.values().sum::<f64>() + 2.0 * own)
            .collect();
        let total_weight = degrees.iter().sum::<f64>() / 2.0;
        Self {
            adj: adj.into_iter().map(|m| m.into_iter().collect()).collect(),
            self_loops,
            degrees,
            total_weight,
        }
    }

    fn len(&self) -> usize {
        self.degrees.len()
    }

    fn modularity(&self, community: &[usize], resolution: f64) -> f64 {
        if self.total_weight == 0.0 {
            return 0.0;
        }
        let count = community.iter().max().map_or(0, |c| c + 1);
        let mut internal = vec![0.0; count];
        let mut totals = vec![0.0; count];
        for node in 0..self.len() {
            let c = community[node];
            totals[c] += self.degrees[node];
            internal[c] += self.self_loops[node];
            for &(other, w) in &self.adj[node] {
                if community[other] == c {
                    // each undirected edge is seen from both ends
                    internal[c] += w / 2.0;
                }
            }
        }
        let m = self.total_weight;
        internal
            .iter()
            .zip(&totals)
            .map(|(inside, tot)| inside / m - resolution * (tot / (2.0 * m)).powi(2))
            .sum()
    }

    /// Collapse each community into a single node
    fn induced(&self, community: &[usize], count: usize) -> LevelGraph {
        let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        let mut self_loops = vec![0.0; count];
        for node in 0..self.len() {
            let c = community[node];
            self_loops[c] += self.self_loops[node];
            for &(other, w) in &self.adj[node] {
                let d = community[other];
                if c == d {
                    self_loops[c] += w / 2.0;
                } else {
                    *adj[c].entry(d).or_insert(0.0) += w;
                }
            }
        }
        LevelGraph::from_parts(adj, self_loops)
    }
}

/// Dense ids in order of first appearance; returns the number of communities.
fn renumber(community: &mut [usize]) -> usize {
    let mut ids: HashMap<usize, usize> = HashMap::new();
    for c in community.iter_mut() {
        let next = ids.len();
        *c = *ids.entry(*c).or_insert(next);
    }
    ids.len()
}

/// Local moving phase: repeatedly move single nodes to the neighbouring
/// community with the best modularity gain until no pass improves enough.
fn one_level(graph: &LevelGraph, resolution: f64, rng: &mut StdRng) -> (Vec<usize>, usize) {
    let n = graph.len();
    let mut community: Vec<usize> = (0..n).collect();
    if graph.total_weight == 0.0 {
        return (community, n);
    }

    let two_m = 2.0 * graph.total_weight;
    let mut totals = graph.degrees.clone();
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut current = graph.modularity(&community, resolution);
    loop {
        let mut moved = false;
        for &node in &order {
            let own = community[node];
            let k = graph.degrees[node];

            let mut neighbours: BTreeMap<usize, f64> = BTreeMap::new();
            for &(other, w) in &graph.adj[node] {
                *neighbours.entry(community[other]).or_insert(0.0) += w;
            }

            totals[own] -= k;
            let w_own = neighbours.get(&own).copied().unwrap_or(0.0);
            let remove_cost = -w_own + resolution * totals[own] * k / two_m;

            let mut best = own;
            let mut best_gain = 0.0;
            for (&candidate, &w) in &neighbours {
                let gain = remove_cost + w - resolution * totals[candidate] * k / two_m;
                if gain > best_gain {
                    best_gain = gain;
                    best = candidate;
                }
            }

            totals[best] += k;
            community[node] = best;
            if best != own {
                moved = true;
            }
        }

        let next = graph.modularity(&community, resolution);
        if !moved || next - current < MIN_GAIN {
            break;
        }
        current = next;
    }

    let count = renumber(&mut community);
    (community, count)
}

/// Louvain partition of a weighted undirected graph, one id per node index.
///
/// The same graph, resolution and seed always give the same ids. Nodes
/// without edges each get their own community.
pub fn best_partition<N>(graph: &UnGraph<N, f64>, resolution: f64, seed: u64) -> Vec<usize> {
    let n = graph.node_count();
    let mut assignment: Vec<usize> = (0..n).collect();
    let mut level = LevelGraph::from_graph(graph);
    if level.total_weight == 0.0 {
        return assignment;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let (mut community, mut count) = one_level(&level, resolution, &mut rng);
    for a in assignment.iter_mut() {
        *a = community[*a];
    }
    let mut best = level.modularity(&community, resolution);

    while count < level.len() {
        level = level.induced(&community, count);
        let (next, next_count) = one_level(&level, resolution, &mut rng);
        let q = level.modularity(&next, resolution);
        if q - best < MIN_GAIN {
            break;
        }
        for a in assignment.iter_mut() {
            *a = next[*a];
        }
        best = q;
        community = next;
        count = next_count;
    }

    renumber(&mut assignment);
    assignment
}

/// Modularity of `partition` (indexed by node position) on a weighted graph
pub fn modularity<N>(graph: &UnGraph<N, f64>, partition: &[usize], resolution: f64) -> f64 {
    LevelGraph::from_graph(graph).modularity(partition, resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cliques() -> UnGraph<&'static str, f64> {
        let mut g = UnGraph::new_undirected();
        let left: Vec<_> = ["a", "b", "c", "d"].iter().map(|n| g.add_node(*n)).collect();
        let right: Vec<_> = ["e", "f", "g", "h"].iter().map(|n| g.add_node(*n)).collect();
        for side in [&left, &right] {
            for i in 0..side.len() {
                for j in i + 1..side.len() {
                    g.add_edge(side[i], side[j], 1.0);
                }
            }
        }
        g.add_edge(left[0], right[0], 0.1);
        g
    }

    #[test]
    fn test_finds_obvious_communities() {
        let g = two_cliques();
        let partition = best_partition(&g, 1.0, 42);
        assert_eq!(partition.len(), 8);
        assert_eq!(partition[0], 0);
        assert!(partition[..4].iter().all(|c| *c == partition[0]));
        assert!(partition[4..].iter().all(|c| *c == partition[4]));
        assert_ne!(partition[0], partition[4]);

        let singletons: Vec<usize> = (0..8).collect();
        assert!(modularity(&g, &partition, 1.0) > modularity(&g, &singletons, 1.0));
    }

    #[test]
    fn test_same_seed_same_partition() {
        let g = two_cliques();
        for seed in [0, 1, 7, 1234] {
            assert_eq!(best_partition(&g, 1.0, seed), best_partition(&g, 1.0, seed));
        }
    }

    #[test]
    fn test_edgeless_graph_keeps_singletons() {
        let mut g: UnGraph<(), f64> = UnGraph::new_undirected();
        for _ in 0..3 {
            g.add_node(());
        }
        assert_eq!(best_partition(&g, 1.0, 0), vec![0, 1, 2]);
        assert!(best_partition(&UnGraph::<(), f64>::new_undirected(), 1.0, 0).is_empty());
    }

    #[test]
    fn test_modularity_of_two_triangles() {
        let mut g: UnGraph<(), f64> = UnGraph::new_undirected();
        let n: Vec<_> = (0..6).map(|_| g.add_node(())).collect();
        for (a, b) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)] {
            g.add_edge(n[a], n[b], 1.0);
        }
        let q = modularity(&g, &[0, 0, 0, 1, 1, 1], 1.0);
        assert!((q - 0.5).abs() < 1e-12);
        assert_eq!(best_partition(&g, 1.0, 3), vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_renumber_by_first_appearance() {
        let mut ids = vec![5, 5, 2, 9, 2];
        assert_eq!(renumber(&mut ids), 3);
        assert_eq!(ids, vec![0, 0, 1, 2, 1]);
    }
}
