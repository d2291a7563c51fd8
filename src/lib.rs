//! simphones core: phonetic distance and similarity from allophone data.
//!
//! Two phones that are allophones of the same phoneme in many languages are
//! close; phones that never are have no relation. The crate provides:
//! - Inventory extraction from PHOIBLE and IPA normalization
//! - Co-occurrence counting and the weighted allophone graph
//! - All-pairs closures: shortest paths (distance) and max-product (similarity)
//! - CSV/JSON serialization of score data
//!
//! Python bindings are available behind the `python` feature.

pub mod closure;
pub mod config;
pub mod cooccurrence;
pub mod engine;
pub mod error;
pub mod graph;
pub mod histogram;
pub mod normalize;
pub mod phoible;
pub mod serialize;
pub mod similarity;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use closure::{MaxProduct, MinSum, PathSemiring};
pub use config::{DistanceStrategy, EngineConfig, OutputConfig, OutputFormat, Settings};
pub use engine::{compute_distances, compute_similarity, AllophoneEngine};
pub use error::{DatasetError, DatasetResult, EngineError, EngineResult};
pub use graph::{AllophoneGraph, GraphStats, PrunedGraph};
pub use normalize::normalize_ipa;
pub use similarity::similarity_from_distances;
pub use types::{
    AllophoneSet, Cooccurrence, DistanceData, EdgeWeighting, Inventory, InventoryDataset, Phone,
    PrunedEdge, ScoreData, SimilarityData, COMBINED_INVENTORY,
};
