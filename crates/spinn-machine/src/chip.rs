//! A single chip: cores, router, memory and its place on a board.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::error::{Result, SpinnMachineError};
use crate::machine::Xy;
use crate::processor::Processor;
use crate::router::Router;

/// IP tag ids available on an Ethernet-enabled chip.
const ETHERNET_TAG_IDS: core::ops::RangeInclusive<u8> = 1..=7;

/// One chip of a machine.
///
/// A chip knows its global coordinates, its working cores, its router,
/// how much SDRAM it has, and which Ethernet-enabled chip serves its
/// board. Chips with an `ip_address` are themselves Ethernet-enabled.
#[derive(Debug, Clone)]
pub struct Chip {
    /// Global x coordinate.
    pub x: u32,
    /// Global y coordinate.
    pub y: u32,
    /// The chip's router.
    pub router: Router,
    /// SDRAM on the chip, in bytes.
    pub sdram: u32,
    /// Coordinates of the Ethernet-enabled chip serving this chip's board.
    pub nearest_ethernet: Xy,
    /// IP address, if this chip is Ethernet-enabled.
    pub ip_address: Option<Ipv4Addr>,
    processors: BTreeMap<u8, Processor>,
    tag_ids: Vec<u8>,
}

impl Chip {
    /// A chip with `n_processors` working cores, core 0 as monitor.
    #[must_use]
    pub fn new(
        x: u32,
        y: u32,
        n_processors: u8,
        router: Router,
        sdram: u32,
        nearest_ethernet: Xy,
        ip_address: Option<Ipv4Addr>,
    ) -> Chip {
        let mut processors = BTreeMap::new();
        processors.insert(0, Processor::monitor(0));
        for id in 1..n_processors {
            processors.insert(id, Processor::new(id));
        }
        Chip {
            x,
            y,
            router,
            sdram,
            nearest_ethernet,
            ip_address,
            processors,
            tag_ids: if ip_address.is_some() {
                ETHERNET_TAG_IDS.collect()
            } else {
                Vec::new()
            },
        }
    }

    /// A chip with some of its cores marked dead.
    ///
    /// # Errors
    ///
    /// If core 0 is in `down_cores`: the monitor core must work for the
    /// chip to be usable at all.
    pub fn with_down_cores(
        x: u32,
        y: u32,
        n_processors: u8,
        router: Router,
        sdram: u32,
        nearest_ethernet: Xy,
        ip_address: Option<Ipv4Addr>,
        down_cores: &[u8],
    ) -> Result<Chip> {
        if down_cores.contains(&0) {
            return Err(SpinnMachineError::invalid_parameter(
                "down_cores",
                "0",
                "core 0 is the monitor and cannot be down",
            ));
        }
        let mut chip = Chip::new(x, y, n_processors, router, sdram, nearest_ethernet, ip_address);
        for core in down_cores {
            chip.processors.remove(core);
        }
        Ok(chip)
    }

    /// Replace the chip's IP tag ids with an explicit set.
    ///
    /// Machine descriptions read from elsewhere may carry tag sets that
    /// differ from the usual Ethernet-or-nothing defaults.
    #[must_use]
    pub fn with_tag_ids(mut self, tag_ids: Vec<u8>) -> Chip {
        self.tag_ids = tag_ids;
        self
    }

    /// Global coordinates as a pair.
    #[must_use]
    pub const fn xy(&self) -> Xy {
        (self.x, self.y)
    }

    /// Number of working cores, monitor included.
    #[must_use]
    pub fn n_processors(&self) -> usize {
        self.processors.len()
    }

    /// Number of cores available to user applications.
    #[must_use]
    pub fn n_user_processors(&self) -> usize {
        self.processors.values().filter(|p| !p.is_monitor()).count()
    }

    /// Whether the core with the given id is present and working.
    #[must_use]
    pub fn is_processor_with_id(&self, id: u8) -> bool {
        self.processors.contains_key(&id)
    }

    /// All working cores, in id order.
    pub fn processors(&self) -> impl Iterator<Item = &Processor> {
        self.processors.values()
    }

    /// Ids of all working cores, in order.
    pub fn processor_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.processors.keys().copied()
    }

    /// The lowest-numbered working core that is not a monitor.
    ///
    /// # Errors
    ///
    /// If every working core is a monitor.
    pub fn first_user_processor(&self) -> Result<Processor> {
        self.processors
            .values()
            .find(|p| !p.is_monitor())
            .copied()
            .ok_or_else(|| {
                SpinnMachineError::invalid_machine(format!(
                    "chip ({}, {}) has no user processors",
                    self.x, self.y
                ))
            })
    }

    /// IP tag ids usable on this chip (empty unless Ethernet-enabled).
    #[must_use]
    pub fn tag_ids(&self) -> &[u8] {
        &self.tag_ids
    }
}

impl core::fmt::Display for Chip {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.ip_address {
            Some(ip) => write!(f, "chip ({}, {}) ip {ip}", self.x, self.y),
            None => write!(f, "chip ({}, {})", self.x, self.y),
        }
    }
}
