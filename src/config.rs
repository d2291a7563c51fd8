//! Configuration for the engine and for score output.
//!
//! Both structures deserialize from JSON with every field optional; missing
//! fields take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DatasetResult;
use crate::types::EdgeWeighting;

/// All-pairs algorithm for distance mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceStrategy {
    /// One Dijkstra run per source node.
    #[default]
    Dijkstra,
    /// The generic semiring sweep with min-sum.
    Sweep,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distance (`1 - p`) or similarity (`p`) edge weights (default: distance)
    pub weighting: EdgeWeighting,
    /// Remove degree-1 nodes before the closure and restore them after (default: true)
    pub prune_pendants: bool,
    /// Closure algorithm used in distance mode (default: dijkstra)
    pub distance_strategy: DistanceStrategy,
    /// Count the combined `"*"` inventory like a language (default: true)
    pub include_combined_inventory: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weighting: EdgeWeighting::Distance,
            prune_pendants: true,
            distance_strategy: DistanceStrategy::Dijkstra,
            include_combined_inventory: true,
        }
    }
}

impl EngineConfig {
    /// Configuration for the max-product similarity closure.
    pub fn similarity() -> Self {
        Self {
            weighting: EdgeWeighting::Similarity,
            ..Self::default()
        }
    }
}

/// Serialized file format for scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// How scores are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Decimal places to round to; `None` keeps full precision.
    pub ndigits: Option<u32>,
}

/// Optional file holding both sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub output: OutputConfig,
}

impl Settings {
    pub fn from_json_file(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings: Settings =
            serde_json::from_str(r#"{"engine": {"weighting": "similarity"}, "output": {"ndigits": 4}}"#).unwrap();
        assert_eq!(settings.engine.weighting, EdgeWeighting::Similarity);
        assert!(settings.engine.prune_pendants);
        assert_eq!(settings.engine.distance_strategy, DistanceStrategy::Dijkstra);
        assert_eq!(settings.output.format, OutputFormat::Csv);
        assert_eq!(settings.output.ndigits, Some(4));
    }

    #[test]
    fn test_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"engine": {"distance_strategy": "sweep", "prune_pendants": false}}"#).unwrap();

        let settings = Settings::from_json_file(&path).unwrap();
        assert_eq!(settings.engine.distance_strategy, DistanceStrategy::Sweep);
        assert!(!settings.engine.prune_pendants);
        assert_eq!(settings.output, OutputConfig::default());
    }

    #[test]
    fn test_similarity_preset() {
        let config = EngineConfig::similarity();
        assert_eq!(config.weighting, EdgeWeighting::Similarity);
        assert!(config.include_combined_inventory);
    }
}
