//! Weighted allophone graph over phones, backed by petgraph.
//!
//! Nodes are phones that are allophones of some other phone in at least one
//! inventory; edge weights are either distances or similarities derived from
//! the co-occurrence counters.

use ahash::{AHashMap, AHashSet};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::{debug, info, warn};

use crate::cooccurrence::CooccurrenceCounts;
use crate::error::{EngineError, EngineResult};
use crate::types::{Cooccurrence, EdgeWeighting, Phone, PrunedEdge};

/// Undirected phone graph with a phone → node index lookup.
#[derive(Debug, Clone)]
pub struct AllophoneGraph {
    graph: UnGraph<Phone, f64>,
    node_map: AHashMap<Phone, NodeIndex>,
}

/// Result of removing degree-1 nodes.
#[derive(Debug, Clone)]
pub struct PrunedGraph {
    /// Graph without the pendant nodes. Kept nodes that lost every edge remain.
    pub core: AllophoneGraph,
    /// Removed nodes with their sole edge, ordered by node.
    pub pendants: Vec<PrunedEdge>,
}

impl AllophoneGraph {
    /// Create new empty graph
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            node_map: AHashMap::new(),
        }
    }

    /// Build the graph from co-occurrence counters.
    ///
    /// Every pair of distinct phones that are allophones in at least one
    /// inventory becomes an edge whose weight is derived from
    /// `p = allophones(a, b) / |inventories with a or b|`.
    pub fn from_counts(counts: &CooccurrenceCounts, weighting: EdgeWeighting) -> EngineResult<Self> {
        // Sorted so node indices, and everything downstream, are reproducible.
        let mut pairs: Vec<(&Cooccurrence, u32)> = counts
            .allophones
            .iter()
            .filter(|(pair, &count)| !pair.is_self_pair() && count > 0)
            .map(|(pair, &count)| (pair, count))
            .collect();
        pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut graph = Self::new();
        for (pair, count) in pairs {
            let (a, b) = (pair.first(), pair.second());
            let count_a = self_count(counts, a)?;
            let count_b = self_count(counts, b)?;

            let either = f64::from(count_a + count_b) - f64::from(counts.cooccurrence(a, b));
            let probability = f64::from(count) / either;
            let weight = weighting.edge_weight(probability);
            if !(0.0..=1.0).contains(&weight) {
                return Err(EngineError::WeightOutOfRange {
                    first: a.to_string(),
                    second: b.to_string(),
                    weight,
                });
            }
            graph.add_edge(a.to_string(), b.to_string(), weight);
        }

        if graph.node_count() == 0 {
            warn!("allophone graph is empty");
        } else if graph.graph.edge_weights().all(|&weight| weight <= 0.0) {
            warn!(%weighting, "no allophone edge has a positive weight");
        }
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            %weighting,
            "built allophone graph"
        );
        Ok(graph)
    }

    /// Build graph from `(phone, phone, weight)` triples.
    ///
    /// Weights must be finite and non-negative.
    pub fn from_edges<I>(edges: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = (Phone, Phone, f64)>,
    {
        let mut graph = Self::new();
        for (a, b, weight) in edges {
            if a == b {
                return Err(EngineError::SelfLoop(a));
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(EngineError::WeightOutOfRange {
                    first: a,
                    second: b,
                    weight,
                });
            }
            graph.add_edge(a, b, weight);
        }
        Ok(graph)
    }

    /// Add edge to graph (creates nodes if needed)
    pub fn add_edge(&mut self, source: Phone, target: Phone, weight: f64) {
        let source_idx = self.get_or_create_node(source);
        let target_idx = self.get_or_create_node(target);
        self.graph.update_edge(source_idx, target_idx, weight);
    }

    /// Get or create node index
    pub fn get_or_create_node(&mut self, phone: Phone) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&phone) {
            idx
        } else {
            let idx = self.graph.add_node(phone.clone());
            self.node_map.insert(phone, idx);
            idx
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, phone: &str) -> bool {
        self.node_map.contains_key(phone)
    }

    pub fn node_index(&self, phone: &str) -> Option<NodeIndex> {
        self.node_map.get(phone).copied()
    }

    pub fn phone(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// Phones in node index order.
    pub fn phones(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_weights().map(String::as_str)
    }

    pub fn degree(&self, phone: &str) -> Option<usize> {
        self.node_index(phone)
            .map(|idx| self.graph.edges(idx).count())
    }

    /// Weight of the edge between two phones, if adjacent.
    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        let edge = self
            .graph
            .find_edge(self.node_index(a)?, self.node_index(b)?)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Edges as `(first, second, weight)` with canonical endpoints, sorted.
    pub fn edges(&self) -> Vec<(Cooccurrence, f64)> {
        let mut edges: Vec<(Cooccurrence, f64)> = self
            .graph
            .edge_references()
            .map(|edge| {
                (
                    Cooccurrence::new(self.phone(edge.source()), self.phone(edge.target())),
                    *edge.weight(),
                )
            })
            .collect();
        edges.sort_by(|a, b| a.0.cmp(&b.0));
        edges
    }

    pub(crate) fn inner(&self) -> &UnGraph<Phone, f64> {
        &self.graph
    }

    /// Remove every degree-1 node, remembering its sole edge.
    ///
    /// Degrees are taken on the input graph, so both ends of an isolated edge
    /// are pruned. A node with no edge at all is an invariant violation.
    pub fn prune_pendants(&self) -> EngineResult<PrunedGraph> {
        let mut pendants = Vec::new();
        let mut removed: AHashSet<NodeIndex> = AHashSet::new();

        for idx in self.graph.node_indices() {
            let mut edges = self.graph.edges(idx);
            let first = edges.next();
            match (first, edges.next()) {
                (None, _) => return Err(EngineError::IsolatedNode(self.graph[idx].clone())),
                (Some(edge), None) => {
                    let neighbor = if edge.source() == idx { edge.target() } else { edge.source() };
                    if neighbor == idx {
                        return Err(EngineError::SelfLoop(self.graph[idx].clone()));
                    }
                    pendants.push(PrunedEdge::new(
                        self.graph[idx].clone(),
                        self.graph[neighbor].clone(),
                        *edge.weight(),
                    ));
                    removed.insert(idx);
                }
                _ => {}
            }
        }

        let mut core = Self::new();
        for idx in self.graph.node_indices() {
            if !removed.contains(&idx) {
                core.get_or_create_node(self.graph[idx].clone());
            }
        }
        for edge in self.graph.edge_references() {
            if removed.contains(&edge.source()) || removed.contains(&edge.target()) {
                continue;
            }
            core.add_edge(
                self.graph[edge.source()].clone(),
                self.graph[edge.target()].clone(),
                *edge.weight(),
            );
        }

        pendants.sort_by(|a, b| a.node.cmp(&b.node));
        debug!(
            pendants = pendants.len(),
            core_nodes = core.node_count(),
            core_edges = core.edge_count(),
            "pruned degree-1 nodes"
        );
        Ok(PrunedGraph { core, pendants })
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        let num_nodes = self.graph.node_count();
        let num_edges = self.graph.edge_count();
        let avg_degree = if num_nodes > 0 {
            (2 * num_edges) as f64 / num_nodes as f64
        } else {
            0.0
        };

        let density = if num_nodes > 1 {
            (2 * num_edges) as f64 / (num_nodes * (num_nodes - 1)) as f64
        } else {
            0.0
        };

        let num_pendants = self
            .graph
            .node_indices()
            .filter(|&idx| self.graph.edges(idx).count() == 1)
            .count();

        GraphStats {
            num_nodes,
            num_edges,
            avg_degree,
            density,
            num_components: connected_components(&self.graph),
            num_pendants,
        }
    }

    /// Export graph to JSON for visualization
    pub fn to_json(&self) -> String {
        let nodes: Vec<_> = self
            .graph
            .node_indices()
            .map(|idx| {
                serde_json::json!({
                    "id": self.graph[idx],
                    "degree": self.graph.edges(idx).count(),
                })
            })
            .collect();

        let edges: Vec<_> = self
            .edges()
            .into_iter()
            .map(|(pair, weight)| {
                serde_json::json!({
                    "source": pair.first(),
                    "target": pair.second(),
                    "weight": weight,
                })
            })
            .collect();

        serde_json::json!({
            "nodes": nodes,
            "edges": edges,
        })
        .to_string()
    }
}

impl Default for AllophoneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of inventories with `phone`, checked against its self-allophone count.
fn self_count(counts: &CooccurrenceCounts, phone: &str) -> EngineResult<u32> {
    let allophones = counts.allophone(phone, phone);
    let cooccurrences = counts.cooccurrence(phone, phone);
    if allophones != cooccurrences {
        return Err(EngineError::CounterMismatch {
            phone: phone.to_string(),
            allophones,
            cooccurrences,
        });
    }
    Ok(allophones)
}

/// Graph statistics
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub avg_degree: f64,
    pub density: f64,
    pub num_components: usize,
    pub num_pendants: usize,
}
