//! Shared data structures for the allophone graph engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Normalized IPA string identifying a speech sound.
pub type Phone = String;

/// Language identifier (Glottocode, language name, or [`COMBINED_INVENTORY`]).
pub type LanguageCode = String;

/// Phones that are allophones of a phone, the phone itself included.
pub type AllophoneSet = BTreeSet<Phone>;

/// Phonological inventory of a single language.
pub type Inventory = BTreeMap<Phone, AllophoneSet>;

/// Inventories keyed by language.
pub type InventoryDataset = BTreeMap<LanguageCode, Inventory>;

/// Key of the inventory that merges every language.
pub const COMBINED_INVENTORY: &str = "*";

/// Unordered pair of phones, stored with the smaller phone first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(Phone, Phone)", into = "(Phone, Phone)")]
pub struct Cooccurrence {
    first: Phone,
    second: Phone,
}

impl Cooccurrence {
    /// Canonicalize `(a, b)` so that `first() <= second()`.
    pub fn new(a: impl Into<Phone>, b: impl Into<Phone>) -> Self {
        let (a, b) = (a.into(), b.into());
        if b < a {
            Self { first: b, second: a }
        } else {
            Self { first: a, second: b }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn is_self_pair(&self) -> bool {
        self.first == self.second
    }

    /// Whether `phone` is one of the two endpoints.
    pub fn contains(&self, phone: &str) -> bool {
        self.first == phone || self.second == phone
    }
}

impl From<(Phone, Phone)> for Cooccurrence {
    fn from((a, b): (Phone, Phone)) -> Self {
        Self::new(a, b)
    }
}

impl From<Cooccurrence> for (Phone, Phone) {
    fn from(pair: Cooccurrence) -> Self {
        (pair.first, pair.second)
    }
}

impl fmt::Display for Cooccurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Scores keyed by canonical phone pair. Ordered so that output is stable.
pub type ScoreData = BTreeMap<Cooccurrence, f64>;

/// Pairwise distances (min-sum closure).
pub type DistanceData = ScoreData;

/// Pairwise similarities (max-product closure or normalized distances).
pub type SimilarityData = ScoreData;

/// How edge weights are derived from allophone probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeWeighting {
    /// `1 - p`, composed by addition along paths.
    #[default]
    Distance,
    /// `p`, composed by multiplication along paths.
    Similarity,
}

impl EdgeWeighting {
    /// Turn the empirical allophone probability into an edge weight.
    pub fn edge_weight(self, probability: f64) -> f64 {
        match self {
            Self::Distance => 1.0 - probability,
            Self::Similarity => probability,
        }
    }
}

impl fmt::Display for EdgeWeighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distance => f.write_str("distance"),
            Self::Similarity => f.write_str("similarity"),
        }
    }
}

/// Sole incident edge of a degree-1 node removed before the closure.
#[derive(Debug, Clone, PartialEq)]
pub struct PrunedEdge {
    pub node: Phone,
    pub neighbor: Phone,
    pub weight: f64,
}

impl PrunedEdge {
    pub fn new(node: Phone, neighbor: Phone, weight: f64) -> Self {
        Self {
            node,
            neighbor,
            weight,
        }
    }
}
