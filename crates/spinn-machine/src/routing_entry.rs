//! An entry in a chip's multicast routing table, without its key.

use spinn_board::{layout, Direction};

use crate::error::{Result, SpinnMachineError};

/// Bits 0-5 of a SpiNNaker route select links; processor bits start here.
const LINK_BITS: u8 = Direction::COUNT;

/// Where packets matching a routing entry arrive from.
///
/// A packet enters the router either over one of the six chip-to-chip
/// links or from a processor on the chip itself, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Incoming {
    /// Over the given chip-to-chip link.
    Link(Direction),
    /// From the processor with the given id.
    Processor(u8),
}

/// The destinations of one routing-table entry, encoded the way the
/// router hardware holds them.
///
/// Bit `i` (0-5) of the route sends a copy over link `i`; bit `6 + p`
/// delivers a copy to processor `p`. A *defaultable* entry duplicates
/// the router's default behaviour of sending a packet straight on, out
/// of the link opposite the one it arrived over, so it need not occupy
/// a table slot at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoutingEntry {
    spinnaker_route: u32,
    defaultable: bool,
}

impl RoutingEntry {
    /// An entry from destination processor and link id lists.
    ///
    /// `incoming` names where matching packets arrive from, when known.
    /// Only entries arriving over a link can be defaultable; an entry
    /// fed by a local processor never is.
    ///
    /// # Errors
    ///
    /// If a processor id, destination or incoming, has no bit in the
    /// route word.
    pub fn new(
        processor_ids: &[u8],
        link_ids: &[Direction],
        incoming: Option<Incoming>,
    ) -> Result<RoutingEntry> {
        let mut route = 0;
        for &p in processor_ids {
            if p >= layout::MAX_CORES_PER_CHIP {
                return Err(SpinnMachineError::invalid_parameter(
                    "processor_ids",
                    p.to_string(),
                    "processor ids run from 0 to 17",
                ));
            }
            route |= 1 << (LINK_BITS + p);
        }
        for &link in link_ids {
            route |= 1 << link.id();
        }
        if let Some(Incoming::Processor(p)) = incoming {
            if p >= layout::MAX_CORES_PER_CHIP {
                return Err(SpinnMachineError::invalid_parameter(
                    "incoming",
                    p.to_string(),
                    "processor ids run from 0 to 17",
                ));
            }
        }
        let defaultable = match incoming {
            Some(Incoming::Link(incoming_link)) => {
                processor_ids.is_empty()
                    && link_ids.len() == 1
                    && link_ids[0] == incoming_link.opposite()
            }
            Some(Incoming::Processor(_)) | None => false,
        };
        Ok(RoutingEntry {
            spinnaker_route: route,
            defaultable,
        })
    }

    /// An entry from an already-encoded route.
    #[must_use]
    pub const fn from_spinnaker_route(spinnaker_route: u32, defaultable: bool) -> RoutingEntry {
        RoutingEntry {
            spinnaker_route,
            defaultable,
        }
    }

    /// The encoded route word.
    #[must_use]
    pub const fn spinnaker_route(&self) -> u32 {
        self.spinnaker_route
    }

    /// Whether the default route would carry packets identically.
    #[must_use]
    pub const fn defaultable(&self) -> bool {
        self.defaultable
    }

    /// Destination processor ids, decoded from the route word.
    #[must_use]
    pub fn processor_ids(&self) -> Vec<u8> {
        (0..layout::MAX_CORES_PER_CHIP)
            .filter(|p| self.spinnaker_route & (1 << (LINK_BITS + p)) != 0)
            .collect()
    }

    /// Destination links, decoded from the route word.
    #[must_use]
    pub fn link_ids(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| self.spinnaker_route & (1 << d.id()) != 0)
            .collect()
    }

    /// Merge the destinations of two entries.
    ///
    /// Two different merged routes can never be defaultable.
    #[must_use]
    pub fn merge(&self, other: &RoutingEntry) -> RoutingEntry {
        if self == other {
            return *self;
        }
        RoutingEntry::from_spinnaker_route(self.spinnaker_route | other.spinnaker_route, false)
    }
}

impl core::fmt::Display for RoutingEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let procs: Vec<String> = self.processor_ids().iter().map(u8::to_string).collect();
        let links: Vec<String> = self.link_ids().iter().map(Direction::to_string).collect();
        write!(f, "{{{}}}:{{{}}}", procs.join(", "), links.join(", "))?;
        if self.defaultable {
            write!(f, "(defaultable)")?;
        }
        Ok(())
    }
}

/// A multicast routing-table entry: a [`RoutingEntry`] with the key and
/// mask that select which packets it routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MulticastRoutingEntry {
    key: u32,
    mask: u32,
    entry: RoutingEntry,
}

impl MulticastRoutingEntry {
    /// A multicast entry for the given key and mask.
    ///
    /// # Errors
    ///
    /// If masking the key changes it: such an entry could never match
    /// its own key, which always indicates a tool-chain bug upstream.
    pub fn new(key: u32, mask: u32, entry: RoutingEntry) -> Result<MulticastRoutingEntry> {
        if key & mask != key {
            return Err(SpinnMachineError::invalid_parameter(
                "key and mask",
                format!("0x{key:08x} and 0x{mask:08x}"),
                "the key is changed when masked with the mask",
            ));
        }
        Ok(MulticastRoutingEntry { key, mask, entry })
    }

    /// The routing key.
    #[must_use]
    pub const fn key(&self) -> u32 {
        self.key
    }

    /// The routing mask.
    #[must_use]
    pub const fn mask(&self) -> u32 {
        self.mask
    }

    /// The destinations of the entry.
    #[must_use]
    pub const fn entry(&self) -> &RoutingEntry {
        &self.entry
    }

    /// Merge the destinations of two entries with the same key and mask.
    ///
    /// # Errors
    ///
    /// If the other entry's key or mask differs.
    pub fn merge(&self, other: &MulticastRoutingEntry) -> Result<MulticastRoutingEntry> {
        if other.key != self.key {
            return Err(SpinnMachineError::invalid_parameter(
                "other.key",
                format!("0x{:x}", other.key),
                format!("the key does not match 0x{:x}", self.key),
            ));
        }
        if other.mask != self.mask {
            return Err(SpinnMachineError::invalid_parameter(
                "other.mask",
                format!("0x{:x}", other.mask),
                format!("the mask does not match 0x{:x}", self.mask),
            ));
        }
        MulticastRoutingEntry::new(self.key, self.mask, self.entry.merge(&other.entry))
    }
}

impl core::fmt::Display for MulticastRoutingEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:08X}:0x{:08X}:{}", self.key, self.mask, self.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_encoding() {
        let entry =
            RoutingEntry::new(&[0, 17], &[Direction::East, Direction::South], None).unwrap();
        // links 0 and 5, processors 0 and 17
        assert_eq!(entry.spinnaker_route(), 0b1 | 0b10_0000 | 1 << 6 | 1 << 23);
        assert_eq!(entry.processor_ids(), vec![0, 17]);
        assert_eq!(entry.link_ids(), vec![Direction::East, Direction::South]);
        assert!(!entry.defaultable());
    }

    #[test]
    fn route_decoding_round_trip() {
        let entry = RoutingEntry::from_spinnaker_route(0b100_0000_0100, false);
        assert_eq!(entry.processor_ids(), vec![4]);
        assert_eq!(entry.link_ids(), vec![Direction::North]);
    }

    #[test]
    fn defaultable_needs_sole_opposite_link() {
        let straight_on =
            RoutingEntry::new(&[], &[Direction::West], Some(Incoming::Link(Direction::East)))
                .unwrap();
        assert!(straight_on.defaultable());

        let turns =
            RoutingEntry::new(&[], &[Direction::North], Some(Incoming::Link(Direction::East)))
                .unwrap();
        assert!(!turns.defaultable());

        let with_processor =
            RoutingEntry::new(&[1], &[Direction::West], Some(Incoming::Link(Direction::East)))
                .unwrap();
        assert!(!with_processor.defaultable());

        let no_incoming = RoutingEntry::new(&[], &[Direction::West], None).unwrap();
        assert!(!no_incoming.defaultable());

        // A packet injected by a local core has no link to default over.
        let from_core =
            RoutingEntry::new(&[], &[Direction::West], Some(Incoming::Processor(3))).unwrap();
        assert!(!from_core.defaultable());
    }

    #[test]
    fn merge_ors_routes_and_drops_defaultable() {
        let a = RoutingEntry::new(&[], &[Direction::West], Some(Incoming::Link(Direction::East)))
            .unwrap();
        let b = RoutingEntry::new(&[2], &[], None).unwrap();
        let merged = a.merge(&b);
        assert_eq!(
            merged.spinnaker_route(),
            a.spinnaker_route() | b.spinnaker_route()
        );
        assert!(!merged.defaultable());

        // Merging with itself keeps the entry, defaultable included.
        assert!(a.merge(&a).defaultable());
    }

    #[test]
    fn processor_ids_out_of_range_rejected() {
        assert!(RoutingEntry::new(&[18], &[], None).is_err());
        assert!(RoutingEntry::new(&[17], &[], None).is_ok());
        assert!(RoutingEntry::new(&[], &[], Some(Incoming::Processor(18))).is_err());
        assert!(RoutingEntry::new(&[], &[], Some(Incoming::Processor(17))).is_ok());
    }

    #[test]
    fn multicast_key_must_survive_mask() {
        let entry = RoutingEntry::new(&[1], &[], None).unwrap();
        assert!(MulticastRoutingEntry::new(0xFF00, 0xFF00, entry).is_ok());
        assert!(MulticastRoutingEntry::new(0xFF01, 0xFF00, entry).is_err());
    }

    #[test]
    fn multicast_merge_checks_key_and_mask() {
        let a =
            MulticastRoutingEntry::new(0x10, 0xFF, RoutingEntry::new(&[1], &[], None).unwrap())
                .unwrap();
        let b = MulticastRoutingEntry::new(
            0x10,
            0xFF,
            RoutingEntry::new(&[], &[Direction::East], None).unwrap(),
        )
        .unwrap();
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.entry().processor_ids(), vec![1]);
        assert_eq!(merged.entry().link_ids(), vec![Direction::East]);

        let other_key =
            MulticastRoutingEntry::new(0x20, 0xFF, RoutingEntry::new(&[], &[], None).unwrap())
                .unwrap();
        assert!(a.merge(&other_key).is_err());
    }
}
