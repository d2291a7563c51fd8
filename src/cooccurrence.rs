//! Co-occurrence and allophone counting over inventories.
//!
//! Counting shards by language with rayon; the per-language counters are
//! merged by addition, so the result does not depend on scheduling.

use ahash::AHashMap;
use rayon::prelude::*;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::types::{Cooccurrence, Inventory, InventoryDataset, COMBINED_INVENTORY};

/// Number of inventories per canonical phone pair.
pub type PairCounter = AHashMap<Cooccurrence, u32>;

/// Both counters the graph builder needs.
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceCounts {
    /// Inventories containing both phones. `(a, a)` counts inventories with `a`.
    pub cooccurrences: PairCounter,
    /// Inventories in which the two phones are mutual allophones.
    pub allophones: PairCounter,
    /// Number of inventories counted.
    pub inventories: usize,
}

impl CooccurrenceCounts {
    /// Count over every inventory of the dataset.
    ///
    /// When `include_combined` is false the `"*"` inventory is skipped.
    pub fn from_dataset(dataset: &InventoryDataset, include_combined: bool) -> EngineResult<Self> {
        let counts = dataset
            .par_iter()
            .filter(|(language, _)| include_combined || language.as_str() != COMBINED_INVENTORY)
            .map(|(language, inventory)| Self::from_inventory(language, inventory))
            .try_reduce(Self::default, |a, b| Ok(a.merge(b)))?;

        info!(
            inventories = counts.inventories,
            cooccurring_pairs = counts.cooccurrences.len(),
            allophone_pairs = counts.allophones.len(),
            "counted phone co-occurrences"
        );
        Ok(counts)
    }

    /// Counters for a single inventory.
    pub fn from_inventory(language: &str, inventory: &Inventory) -> EngineResult<Self> {
        let mut counts = Self {
            inventories: 1,
            ..Self::default()
        };
        counts.count_cooccurrences(inventory);
        counts.count_allophones(language, inventory)?;
        Ok(counts)
    }

    /// Every unordered pair of phones in the inventory, self-pairs included.
    fn count_cooccurrences(&mut self, inventory: &Inventory) {
        let phones: Vec<&String> = inventory.keys().collect();
        for (i, a) in phones.iter().enumerate() {
            for b in &phones[..=i] {
                *self
                    .cooccurrences
                    .entry(Cooccurrence::new(a.as_str(), b.as_str()))
                    .or_insert(0) += 1;
            }
        }
    }

    /// Pairs of mutual allophones, counted once per canonical pair.
    fn count_allophones(&mut self, language: &str, inventory: &Inventory) -> EngineResult<()> {
        for (phone, allophones) in inventory {
            if !allophones.contains(phone) {
                return Err(EngineError::MissingSelfAllophone {
                    language: language.to_string(),
                    phone: phone.clone(),
                });
            }

            for allophone in allophones {
                let symmetric = inventory
                    .get(allophone)
                    .is_some_and(|reverse| reverse.contains(phone));
                if !symmetric {
                    return Err(EngineError::AsymmetricInventory {
                        language: language.to_string(),
                        phone: phone.clone(),
                        allophone: allophone.clone(),
                    });
                }
                if phone <= allophone {
                    *self
                        .allophones
                        .entry(Cooccurrence::new(phone.as_str(), allophone.as_str()))
                        .or_insert(0) += 1;
                }
            }
        }
        Ok(())
    }

    /// Add another shard's counts into this one.
    pub fn merge(mut self, other: Self) -> Self {
        for (pair, count) in other.cooccurrences {
            *self.cooccurrences.entry(pair).or_insert(0) += count;
        }
        for (pair, count) in other.allophones {
            *self.allophones.entry(pair).or_insert(0) += count;
        }
        self.inventories += other.inventories;
        self
    }

    pub fn cooccurrence(&self, a: &str, b: &str) -> u32 {
        self.cooccurrences
            .get(&Cooccurrence::new(a, b))
            .copied()
            .unwrap_or(0)
    }

    pub fn allophone(&self, a: &str, b: &str) -> u32 {
        self.allophones
            .get(&Cooccurrence::new(a, b))
            .copied()
            .unwrap_or(0)
    }
}
