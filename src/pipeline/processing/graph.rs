use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument};

use crate::error::{NetworkError, Result};
use crate::pipeline::processing::aggregate::VenueYearSummary;
use crate::pipeline::processing::community::CommunityDetector;
use crate::pipeline::processing::similarity::SimilarityEdge;

/// A venue-year with its community once partitioned
#[derive(Debug, Clone, PartialEq)]
pub struct VenueNode {
    pub summary: VenueYearSummary,
    pub group: Option<usize>,
}

/// One year's venues linked by shared lineups
#[derive(Debug, Clone)]
pub struct VenueGraph {
    year: i32,
    graph: UnGraph<VenueNode, f64>,
    index: HashMap<String, NodeIndex>,
}

impl VenueGraph {
    /// Nodes keep the order of `venues`, edges the order of `edges`.
    #[instrument(skip(venues, edges), fields(venues = venues.len(), edges = edges.len()))]
    pub fn build(year: i32, venues: &[&VenueYearSummary], edges: &[SimilarityEdge]) -> Result<Self> {
        let mut graph = UnGraph::with_capacity(venues.len(), edges.len());
        let mut index = HashMap::with_capacity(venues.len());

        for summary in venues {
            if summary.year != year {
                return Err(NetworkError::Schema(format!(
                    "venue '{}' belongs to {} but was added to the {} graph",
                    summary.venue_name, summary.year, year
                )));
            }
            if index.contains_key(&summary.venue_name) {
                return Err(NetworkError::DuplicateKey {
                    table: format!("venues of {}", year),
                    key: summary.venue_name.clone(),
                });
            }
            let idx = graph.add_node(VenueNode {
                summary: (*summary).clone(),
                group: None,
            });
            index.insert(summary.venue_name.clone(), idx);
        }

        for edge in edges {
            let lookup = |name: &str| {
                index
                    .get(name)
                    .copied()
                    .ok_or_else(|| NetworkError::UnknownNode(name.to_string()))
            };
            let (a, b) = (lookup(&edge.source)?, lookup(&edge.target)?);
            if a == b {
                return Err(NetworkError::Schema(format!(
                    "self-link on venue '{}'",
                    edge.source
                )));
            }
            graph.add_edge(a, b, edge.weight);
        }

        debug!("Built {} graph: {} nodes, {} edges", year, graph.node_count(), graph.edge_count());
        Ok(Self { year, graph, index })
    }

    pub fn graph(&self) -> &UnGraph<VenueNode, f64> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, venue_name: &str) -> Option<&VenueNode> {
        self.index.get(venue_name).map(|idx| &self.graph[*idx])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &VenueNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// (source name, target name, weight) in insertion order
    pub fn links(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.graph.edge_references().map(move |e| {
            (
                self.graph[e.source()].summary.venue_name.as_str(),
                self.graph[e.target()].summary.venue_name.as_str(),
                *e.weight(),
            )
        })
    }

    /// Run the detector and write each node's community id back onto it.
    /// Returns the number of communities.
    pub fn assign_communities(&mut self, detector: &dyn CommunityDetector) -> Result<usize> {
        let partition = detector.partition(self);
        if partition.len() != self.graph.node_count() {
            return Err(NetworkError::Schema(format!(
                "partition covers {} of {} nodes",
                partition.len(),
                self.graph.node_count()
            )));
        }
        for (idx, group) in self.graph.node_indices().zip(&partition) {
            self.graph[idx].group = Some(*group);
        }
        let communities = partition.iter().collect::<BTreeSet<_>>().len();
        debug!("{} graph split into {} communities", self.year, communities);
        Ok(communities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::community::Louvain;
    use crate::pipeline::processing::multiset::Multiset;

    fn summary(year: i32, name: &str) -> VenueYearSummary {
        VenueYearSummary {
            year,
            venue_name: name.to_string(),
            club_id: name.to_lowercase(),
            region: "London".to_string(),
            country: "UK".to_string(),
            logo: String::new(),
            number_of_dates: 1,
            rank: Some(1),
            number_of_unique_artists: 0,
            total_number_of_artists: 0,
            artists: Multiset::new(),
            followers: None,
            capacity: None,
            attending: 0,
        }
    }

    fn edge(a: &str, b: &str, w: f64) -> SimilarityEdge {
        SimilarityEdge {
            source: a.to_string(),
            target: b.to_string(),
            weight: w,
        }
    }

    #[test]
    fn test_build_and_partition() {
        let venues: Vec<_> = ["A", "B", "C", "D"].iter().map(|n| summary(2019, n)).collect();
        let refs: Vec<_> = venues.iter().collect();
        let edges = vec![edge("A", "B", 0.5), edge("C", "D", 0.4), edge("B", "C", 0.01)];

        let mut graph = VenueGraph::build(2019, &refs, &edges).unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.nodes().all(|n| n.group.is_none()));

        let communities = graph.assign_communities(&Louvain::new(0)).unwrap();
        assert_eq!(communities, 2);
        let group = |n: &str| graph.node(n).unwrap().group.unwrap();
        assert_eq!(group("A"), group("B"));
        assert_eq!(group("C"), group("D"));
        assert_ne!(group("A"), group("C"));

        let links: Vec<_> = graph.links().collect();
        assert_eq!(links[0], ("A", "B", 0.5));
    }

    #[test]
    fn test_edges_must_reference_nodes() {
        let venues = vec![summary(2019, "A")];
        let refs: Vec<_> = venues.iter().collect();
        let err = VenueGraph::build(2019, &refs, &[edge("A", "Ghost", 0.2)]).unwrap_err();
        assert!(matches!(err, NetworkError::UnknownNode(name) if name == "Ghost"));
    }

    #[test]
    fn test_rejects_other_years_and_duplicates() {
        let venues = vec![summary(2019, "A"), summary(2020, "B")];
        let refs: Vec<_> = venues.iter().collect();
        assert!(matches!(
            VenueGraph::build(2019, &refs, &[]),
            Err(NetworkError::Schema(_))
        ));

        let venues = vec![summary(2019, "A"), summary(2019, "A")];
        let refs: Vec<_> = venues.iter().collect();
        assert!(matches!(
            VenueGraph::build(2019, &refs, &[]),
            Err(NetworkError::DuplicateKey { .. })
        ));
    }
}
