//! All-pairs closures over the allophone graph.
//!
//! Distances close under the min-sum semiring (shortest paths), similarities
//! under max-product (most probable chain of allophone relations). Both share
//! one sweep routine parameterized by a [`PathSemiring`]; distances can also
//! be computed with per-source Dijkstra, which is the faster choice on sparse
//! graphs.

use ndarray::parallel::prelude::*;
use ndarray::{Array2, Axis};
use petgraph::algo::dijkstra;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use tracing::debug;

use crate::graph::AllophoneGraph;
use crate::types::{Cooccurrence, PrunedEdge, ScoreData};

/// Path algebra: how edge weights compose along a path and which of two
/// path values wins.
pub trait PathSemiring: Send + Sync {
    /// Human-readable name for logs.
    const NAME: &'static str;

    /// Value of the empty path.
    fn identity() -> f64;

    /// Compose a path value with one more edge or sub-path.
    fn extend(path: f64, edge: f64) -> f64;

    /// Whether `candidate` is strictly better than `incumbent`.
    fn prefer(candidate: f64, incumbent: f64) -> bool;
}

/// Shortest paths: sum along a path, smaller is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinSum;

impl PathSemiring for MinSum {
    const NAME: &'static str = "min-sum";

    fn identity() -> f64 {
        0.0
    }

    fn extend(path: f64, edge: f64) -> f64 {
        path + edge
    }

    fn prefer(candidate: f64, incumbent: f64) -> bool {
        candidate < incumbent
    }
}

/// Most probable chain: product along a path, larger is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxProduct;

impl PathSemiring for MaxProduct {
    const NAME: &'static str = "max-product";

    fn identity() -> f64 {
        1.0
    }

    fn extend(path: f64, edge: f64) -> f64 {
        path * edge
    }

    fn prefer(candidate: f64, incumbent: f64) -> bool {
        candidate > incumbent
    }
}

/// Floyd–Warshall style closure over an arbitrary path semiring.
///
/// The table starts from direct edges; `NaN` marks "no path yet". For each
/// intermediate node `y` in node-index order, every pair `(x, z)` reachable
/// through `y` on both legs is relaxed. Rows are updated in parallel within
/// a sweep; a sweep only reads row `y`, which it never writes, so the result
/// is independent of scheduling.
pub fn sweep_closure<S: PathSemiring>(graph: &AllophoneGraph) -> ScoreData {
    let inner = graph.inner();
    let n = inner.node_count();
    let mut table = Array2::<f64>::from_elem((n, n), f64::NAN);

    for edge in inner.edge_references() {
        let (a, b) = (edge.source().index(), edge.target().index());
        table[[a, b]] = *edge.weight();
        table[[b, a]] = *edge.weight();
    }

    for y in 0..n {
        let pivot: Vec<(usize, f64)> = table
            .row(y)
            .iter()
            .enumerate()
            .filter(|&(z, value)| z != y && !value.is_nan())
            .map(|(z, &value)| (z, value))
            .collect();
        if pivot.len() < 2 {
            continue;
        }

        table
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(x, mut row)| {
                let to_pivot = row[y];
                if x == y || to_pivot.is_nan() {
                    return;
                }
                for &(z, from_pivot) in &pivot {
                    if z == x {
                        continue;
                    }
                    let candidate = S::extend(to_pivot, from_pivot);
                    let current = row[z];
                    if current.is_nan() || S::prefer(candidate, current) {
                        row[z] = candidate;
                    }
                }
            });
    }

    let mut scores = ScoreData::new();
    for ((x, z), &value) in table.indexed_iter() {
        if x < z && !value.is_nan() {
            let (a, b) = (&inner[NodeIndex::new(x)], &inner[NodeIndex::new(z)]);
            scores.insert(Cooccurrence::new(a.as_str(), b.as_str()), value);
        }
    }
    debug!(semiring = S::NAME, nodes = n, pairs = scores.len(), "sweep closure done");
    scores
}

/// Shortest-path length between every connected pair, one Dijkstra run per
/// source node (in parallel). Each pair is taken from the run whose source is
/// the smaller phone.
pub fn shortest_path_closure(graph: &AllophoneGraph) -> ScoreData {
    let inner = graph.inner();
    let sources: Vec<_> = inner.node_indices().collect();

    let scores: ScoreData = sources
        .par_iter()
        .flat_map_iter(|&source| {
            let lengths = dijkstra(inner, source, None, |e| *e.weight());
            let origin = &inner[source];
            lengths
                .into_iter()
                .filter(move |&(target, _)| origin.as_str() < inner[target].as_str())
                .map(move |(target, length)| {
                    (Cooccurrence::new(origin.as_str(), inner[target].as_str()), length)
                })
        })
        .collect();

    debug!(nodes = sources.len(), pairs = scores.len(), "dijkstra closure done");
    scores
}

/// Restore results for nodes removed by [`AllophoneGraph::prune_pendants`].
///
/// `scores` holds the closure of `core`. A pendant `p` with neighbor `u` and
/// weight `w` reaches every other node only through `u`, so:
/// - `(p, u) = w`
/// - `(p, t) = w ⊕ (u, t)` for every core node `t` connected to `u`
/// - `(p, q) = w ⊕ (u, v) ⊕ w'` for another pendant `q` hanging off core node
///   `v` (with `(u, u)` the semiring identity)
///
/// Two pendants that are each other's neighbor only get their direct edge.
pub fn reinsert_pendants<S: PathSemiring>(
    core: &AllophoneGraph,
    pendants: &[PrunedEdge],
    scores: &mut ScoreData,
) {
    let core_phones: Vec<&str> = core.phones().collect();
    let mut restored = Vec::new();

    for pendant in pendants {
        restored.push((
            Cooccurrence::new(pendant.node.as_str(), pendant.neighbor.as_str()),
            pendant.weight,
        ));
        if !core.contains(&pendant.neighbor) {
            continue;
        }
        for &target in &core_phones {
            if target == pendant.neighbor {
                continue;
            }
            if let Some(&via) = scores.get(&Cooccurrence::new(pendant.neighbor.as_str(), target)) {
                restored.push((
                    Cooccurrence::new(pendant.node.as_str(), target),
                    S::extend(pendant.weight, via),
                ));
            }
        }
    }

    let attached: Vec<&PrunedEdge> = pendants
        .iter()
        .filter(|pendant| core.contains(&pendant.neighbor))
        .collect();
    for (i, p) in attached.iter().enumerate() {
        for q in &attached[i + 1..] {
            let between = if p.neighbor == q.neighbor {
                Some(S::identity())
            } else {
                scores
                    .get(&Cooccurrence::new(p.neighbor.as_str(), q.neighbor.as_str()))
                    .copied()
            };
            if let Some(between) = between {
                restored.push((
                    Cooccurrence::new(p.node.as_str(), q.node.as_str()),
                    S::extend(S::extend(p.weight, between), q.weight),
                ));
            }
        }
    }

    debug!(
        semiring = S::NAME,
        pendants = pendants.len(),
        restored = restored.len(),
        "reinserted pruned nodes"
    );
    scores.extend(restored);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phone;
    use approx::assert_relative_eq;

    fn edge(a: &str, b: &str, w: f64) -> (Phone, Phone, f64) {
        (a.to_string(), b.to_string(), w)
    }

    fn pair(a: &str, b: &str) -> Cooccurrence {
        Cooccurrence::new(a, b)
    }

    fn triangle_with_tail() -> AllophoneGraph {
        AllophoneGraph::from_edges(vec![
            edge("a", "b", 0.5),
            edge("b", "c", 0.5),
            edge("a", "c", 0.2),
            edge("c", "d", 0.8),
        ])
        .unwrap()
    }

    #[test]
    fn test_max_product_prefers_best_path() {
        let scores = sweep_closure::<MaxProduct>(&triangle_with_tail());

        assert_relative_eq!(scores[&pair("a", "c")], 0.25);
        assert_relative_eq!(scores[&pair("a", "b")], 0.5);
        assert_relative_eq!(scores[&pair("b", "d")], 0.4);
        assert_relative_eq!(scores[&pair("a", "d")], 0.2);
        assert_eq!(scores.len(), 6);
        assert!(scores.keys().all(|p| !p.is_self_pair()));
    }

    #[test]
    fn test_min_sum_sweep_matches_dijkstra() {
        let graph = triangle_with_tail();
        let sweep = sweep_closure::<MinSum>(&graph);
        let dijkstra = shortest_path_closure(&graph);

        assert_eq!(sweep.len(), dijkstra.len());
        for (key, value) in &dijkstra {
            assert_relative_eq!(sweep[key], *value, epsilon = 1e-12);
        }
        assert_relative_eq!(dijkstra[&pair("a", "c")], 0.2);
        assert_relative_eq!(dijkstra[&pair("b", "d")], 1.3);
        assert_relative_eq!(dijkstra[&pair("a", "d")], 1.0);
    }

    #[test]
    fn test_disconnected_pairs_absent() {
        let graph = AllophoneGraph::from_edges(vec![
            edge("a", "b", 0.1),
            edge("b", "c", 0.2),
            edge("x", "y", 0.3),
            edge("y", "z", 0.4),
        ])
        .unwrap();

        for scores in [shortest_path_closure(&graph), sweep_closure::<MaxProduct>(&graph)] {
            assert_eq!(scores.len(), 6);
            assert!(!scores.contains_key(&pair("a", "x")));
            assert!(!scores.contains_key(&pair("c", "z")));
        }
    }

    #[test]
    fn test_reinsert_path_end_is_exact() {
        // a - b - c with b of degree 2
        let graph = AllophoneGraph::from_edges(vec![edge("a", "b", 0.25), edge("b", "c", 0.5)]).unwrap();
        let pruned = graph.prune_pendants().unwrap();

        let mut scores = shortest_path_closure(&pruned.core);
        assert!(scores.is_empty());
        reinsert_pendants::<MinSum>(&pruned.core, &pruned.pendants, &mut scores);

        assert_eq!(scores[&pair("a", "b")], 0.25);
        assert_eq!(scores[&pair("b", "c")], 0.5);
        assert_eq!(scores[&pair("a", "c")], 0.25 + 0.5);
        assert_eq!(scores, shortest_path_closure(&graph));
    }

    #[test]
    fn test_reinsert_mutual_pendants() {
        let graph = AllophoneGraph::from_edges(vec![edge("m", "n", 0.6)]).unwrap();
        let pruned = graph.prune_pendants().unwrap();

        let mut scores = sweep_closure::<MaxProduct>(&pruned.core);
        reinsert_pendants::<MaxProduct>(&pruned.core, &pruned.pendants, &mut scores);

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[&pair("m", "n")], 0.6);
    }

    #[test]
    fn test_reinsert_star_leaves() {
        let graph = AllophoneGraph::from_edges(vec![
            edge("hub", "p", 0.5),
            edge("hub", "q", 0.4),
            edge("hub", "r", 0.9),
        ])
        .unwrap();
        let pruned = graph.prune_pendants().unwrap();
        assert_eq!(pruned.pendants.len(), 3);

        let mut scores = sweep_closure::<MaxProduct>(&pruned.core);
        reinsert_pendants::<MaxProduct>(&pruned.core, &pruned.pendants, &mut scores);

        let baseline = sweep_closure::<MaxProduct>(&graph);
        assert_eq!(scores.len(), baseline.len());
        for (key, value) in &baseline {
            assert_relative_eq!(scores[key], *value, epsilon = 1e-12);
        }
        assert_relative_eq!(scores[&pair("p", "q")], 0.2);
    }
}
