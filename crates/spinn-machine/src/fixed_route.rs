//! The single fixed-route entry of a chip's router.

use std::collections::BTreeSet;

use spinn_board::Direction;

use crate::error::{Result, SpinnMachineError};

/// The sole fixed-route entry of a chip.
///
/// Fixed-route packets carry no key; every chip forwards them to this
/// one set of destinations, typically the path back towards the
/// Ethernet-enabled chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRouteEntry {
    processor_ids: BTreeSet<u8>,
    link_ids: BTreeSet<Direction>,
}

impl FixedRouteEntry {
    /// An entry from destination processor ids and links.
    ///
    /// # Errors
    ///
    /// If either list names the same destination twice.
    pub fn new(processor_ids: &[u8], link_ids: &[Direction]) -> Result<FixedRouteEntry> {
        let mut processors = BTreeSet::new();
        for &p in processor_ids {
            if !processors.insert(p) {
                return Err(SpinnMachineError::already_exists(
                    "processor ID",
                    p.to_string(),
                ));
            }
        }
        let mut links = BTreeSet::new();
        for &link in link_ids {
            if !links.insert(link) {
                return Err(SpinnMachineError::already_exists(
                    "link ID",
                    link.to_string(),
                ));
            }
        }
        Ok(FixedRouteEntry {
            processor_ids: processors,
            link_ids: links,
        })
    }

    /// Destination processor ids.
    pub fn processor_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.processor_ids.iter().copied()
    }

    /// Destination links.
    pub fn link_ids(&self) -> impl Iterator<Item = Direction> + '_ {
        self.link_ids.iter().copied()
    }
}

impl core::fmt::Display for FixedRouteEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let links: Vec<String> = self.link_ids.iter().map(Direction::to_string).collect();
        let procs: Vec<String> = self.processor_ids.iter().map(u8::to_string).collect();
        write!(f, "{{{}}}:{{{}}}", links.join(", "), procs.join(", "))
    }
}
