//! End-to-end pipeline: inventories → counters → graph → pruning → closure →
//! reinsertion.

use tracing::{info, info_span};

use crate::closure::{
    reinsert_pendants, shortest_path_closure, sweep_closure, MaxProduct, MinSum, PathSemiring,
};
use crate::config::{DistanceStrategy, EngineConfig};
use crate::cooccurrence::CooccurrenceCounts;
use crate::error::EngineResult;
use crate::graph::AllophoneGraph;
use crate::types::{DistanceData, EdgeWeighting, InventoryDataset, ScoreData, SimilarityData};

/// Computes pairwise phone scores from an inventory dataset.
#[derive(Debug, Clone, Default)]
pub struct AllophoneEngine {
    config: EngineConfig,
}

impl AllophoneEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the weighted allophone graph for the configured weighting.
    pub fn build_graph(&self, dataset: &InventoryDataset) -> EngineResult<AllophoneGraph> {
        let counts =
            CooccurrenceCounts::from_dataset(dataset, self.config.include_combined_inventory)?;
        AllophoneGraph::from_counts(&counts, self.config.weighting)
    }

    /// Scores for every connected pair of distinct phones in the dataset.
    pub fn compute(&self, dataset: &InventoryDataset) -> EngineResult<ScoreData> {
        let _span = info_span!("compute", weighting = %self.config.weighting).entered();
        let graph = self.build_graph(dataset)?;
        self.close(&graph)
    }

    /// All-pairs closure of an already built graph.
    pub fn close(&self, graph: &AllophoneGraph) -> EngineResult<ScoreData> {
        let scores = match self.config.weighting {
            EdgeWeighting::Distance => match self.config.distance_strategy {
                DistanceStrategy::Dijkstra => self.run::<MinSum>(graph, shortest_path_closure)?,
                DistanceStrategy::Sweep => self.run::<MinSum>(graph, sweep_closure::<MinSum>)?,
            },
            EdgeWeighting::Similarity => {
                self.run::<MaxProduct>(graph, sweep_closure::<MaxProduct>)?
            }
        };
        info!(pairs = scores.len(), "computed pairwise scores");
        Ok(scores)
    }

    fn run<S: PathSemiring>(
        &self,
        graph: &AllophoneGraph,
        closure: fn(&AllophoneGraph) -> ScoreData,
    ) -> EngineResult<ScoreData> {
        if !self.config.prune_pendants {
            return Ok(closure(graph));
        }

        let pruned = graph.prune_pendants()?;
        info!(
            removed = pruned.pendants.len(),
            remaining = pruned.core.node_count(),
            "pruned degree-1 nodes"
        );
        let mut scores = closure(&pruned.core);
        reinsert_pendants::<S>(&pruned.core, &pruned.pendants, &mut scores);
        Ok(scores)
    }
}

/// Distances with the default configuration.
pub fn compute_distances(dataset: &InventoryDataset) -> EngineResult<DistanceData> {
    AllophoneEngine::default().compute(dataset)
}

/// Max-product similarities with the default configuration.
pub fn compute_similarity(dataset: &InventoryDataset) -> EngineResult<SimilarityData> {
    AllophoneEngine::new(EngineConfig::similarity()).compute(dataset)
}
