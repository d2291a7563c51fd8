//! Similarity derived from distances by normalization.

use ordered_float::OrderedFloat;

use crate::error::{EngineError, EngineResult};
use crate::types::{DistanceData, SimilarityData};

/// Convert distances into similarity scores in [0, 1].
///
/// `similarity = 1 - distance / max_distance`, so the most distant pair gets
/// 0 and smaller distances get larger similarities. Needs at least one
/// positive distance.
pub fn similarity_from_distances(distances: &DistanceData) -> EngineResult<SimilarityData> {
    let max = distances
        .values()
        .copied()
        .max_by_key(|&d| OrderedFloat(d))
        .unwrap_or(0.0);
    if !(max > 0.0) {
        return Err(EngineError::NoPositiveDistance { max });
    }

    Ok(distances
        .iter()
        .map(|(pair, &distance)| (pair.clone(), 1.0 - distance / max))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cooccurrence;

    #[test]
    fn test_relationship_with_distances() {
        let mut distances = DistanceData::new();
        distances.insert(Cooccurrence::new("m", "n"), 0.2);
        distances.insert(Cooccurrence::new("n", "ŋ"), 0.8);
        let similarity = similarity_from_distances(&distances).unwrap();

        let pair1 = Cooccurrence::new("m", "n");
        let pair2 = Cooccurrence::new("n", "ŋ");
        assert!(distances[&pair1] < distances[&pair2]);
        assert!(similarity[&pair1] > similarity[&pair2]);
        assert_eq!(similarity[&pair2], 0.0);
        assert_eq!(similarity[&pair1], 0.75);
    }

    #[test]
    fn test_all_zero_distances_rejected() {
        let mut distances = DistanceData::new();
        distances.insert(Cooccurrence::new("a", "b"), 0.0);
        assert_eq!(
            similarity_from_distances(&distances).unwrap_err(),
            EngineError::NoPositiveDistance { max: 0.0 }
        );
        assert!(similarity_from_distances(&DistanceData::new()).is_err());
    }
}
