//! Sets of cores, grouped by the chip they sit on.

use std::collections::{BTreeMap, BTreeSet};

use crate::machine::Xy;

/// The cores of interest on one chip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreSubset {
    /// Chip the cores sit on.
    pub xy: Xy,
    processor_ids: BTreeSet<u8>,
}

impl CoreSubset {
    /// A subset of the cores of chip `xy`.
    #[must_use]
    pub fn new(xy: Xy, processor_ids: impl IntoIterator<Item = u8>) -> CoreSubset {
        CoreSubset {
            xy,
            processor_ids: processor_ids.into_iter().collect(),
        }
    }

    /// Add a core to the subset.
    pub fn add_processor(&mut self, processor_id: u8) {
        self.processor_ids.insert(processor_id);
    }

    /// Whether the subset holds the given core.
    #[must_use]
    pub fn contains(&self, processor_id: u8) -> bool {
        self.processor_ids.contains(&processor_id)
    }

    /// The cores in the subset, in order.
    pub fn processor_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.processor_ids.iter().copied()
    }

    /// Number of cores in the subset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processor_ids.len()
    }

    /// Whether the subset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processor_ids.is_empty()
    }

    /// Cores in both this subset and `other` (same chip assumed).
    #[must_use]
    pub fn intersect(&self, other: &CoreSubset) -> CoreSubset {
        CoreSubset {
            xy: self.xy,
            processor_ids: self
                .processor_ids
                .intersection(&other.processor_ids)
                .copied()
                .collect(),
        }
    }
}

/// A collection of [`CoreSubset`]s, one per chip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreSubsets {
    subsets: BTreeMap<Xy, CoreSubset>,
}

impl CoreSubsets {
    /// An empty collection.
    #[must_use]
    pub fn new() -> CoreSubsets {
        CoreSubsets::default()
    }

    /// Add a whole subset, merging with any existing cores for its chip.
    pub fn add_core_subset(&mut self, subset: CoreSubset) {
        let entry = self
            .subsets
            .entry(subset.xy)
            .or_insert_with(|| CoreSubset::new(subset.xy, []));
        for id in subset.processor_ids() {
            entry.add_processor(id);
        }
    }

    /// Add a single core.
    pub fn add_processor(&mut self, xy: Xy, processor_id: u8) {
        self.subsets
            .entry(xy)
            .or_insert_with(|| CoreSubset::new(xy, []))
            .add_processor(processor_id);
    }

    /// Whether any core is recorded for the given chip.
    #[must_use]
    pub fn is_chip(&self, xy: Xy) -> bool {
        self.subsets.contains_key(&xy)
    }

    /// Whether the given core is recorded.
    #[must_use]
    pub fn is_core(&self, xy: Xy, processor_id: u8) -> bool {
        self.subsets.get(&xy).is_some_and(|s| s.contains(processor_id))
    }

    /// The subset for a chip, if any core is recorded there.
    #[must_use]
    pub fn core_subset_for_chip(&self, xy: Xy) -> Option<&CoreSubset> {
        self.subsets.get(&xy)
    }

    /// All subsets, in chip order.
    pub fn iter(&self) -> impl Iterator<Item = &CoreSubset> {
        self.subsets.values()
    }

    /// Total cores recorded across all chips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subsets.values().map(CoreSubset::len).sum()
    }

    /// Whether no core is recorded at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }

    /// Cores recorded in both collections.
    #[must_use]
    pub fn intersect(&self, other: &CoreSubsets) -> CoreSubsets {
        let mut result = CoreSubsets::new();
        for (xy, subset) in &self.subsets {
            if let Some(other_subset) = other.subsets.get(xy) {
                let both = subset.intersect(other_subset);
                if !both.is_empty() {
                    result.subsets.insert(*xy, both);
                }
            }
        }
        result
    }
}

impl<'a> IntoIterator for &'a CoreSubsets {
    type Item = &'a CoreSubset;
    type IntoIter = std::collections::btree_map::Values<'a, Xy, CoreSubset>;

    fn into_iter(self) -> Self::IntoIter {
        self.subsets.values()
    }
}
