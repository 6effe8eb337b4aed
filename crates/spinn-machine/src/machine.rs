//! The machine itself: a rectangle of chips with optional wrap-around.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use spinn_board::{layout::LocalXy, Direction};
use tracing::debug;

use crate::chip::Chip;
use crate::error::{Result, SpinnMachineError};
use crate::version::MachineVersion;

/// Global (x, y) chip coordinates.
pub type Xy = (u32, u32);

/// Which edges of the machine wrap around to the opposite edge.
///
/// Whole-triad machines wrap in both directions; machines with a part
/// row or column of boards lose the wrap on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    /// Neither axis wraps.
    None,
    /// Only the x axis wraps.
    Horizontal,
    /// Only the y axis wraps.
    Vertical,
    /// Both axes wrap.
    Both,
}

impl Wrap {
    /// Whether x coordinates wrap.
    #[must_use]
    pub const fn horizontal(self) -> bool {
        matches!(self, Wrap::Horizontal | Wrap::Both)
    }

    /// Whether y coordinates wrap.
    #[must_use]
    pub const fn vertical(self) -> bool {
        matches!(self, Wrap::Vertical | Wrap::Both)
    }

    /// Short label used in machine descriptions.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Wrap::None => "NoWrap",
            Wrap::Horizontal => "HorWrap",
            Wrap::Vertical => "VerWrap",
            Wrap::Both => "Wrapped",
        }
    }
}

/// A SpiNNaker link: a router link left open for external devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinnakerLinkData {
    /// Id of the SpiNNaker link on its board.
    pub spinnaker_link_id: u32,
    /// Chip the link is on.
    pub xy: Xy,
    /// Direction of the unused router link.
    pub direction: Direction,
    /// Address of the board the link is on.
    pub board_address: Option<Ipv4Addr>,
}

/// A link from a chip to one of the FPGAs on its board's edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpgaLinkData {
    /// Which of the three FPGAs the link goes to.
    pub fpga_id: u8,
    /// Id of the link on that FPGA.
    pub fpga_link_id: u8,
    /// Chip the link is on.
    pub xy: Xy,
    /// Direction of the router link the FPGA sits behind.
    pub direction: Direction,
    /// Address of the board the link is on.
    pub board_address: Option<Ipv4Addr>,
}

/// A machine: a `width` x `height` rectangle of [`Chip`]s.
///
/// The wrap behaviour and the expected chips per board come from the
/// [`MachineVersion`]; the boot chip is always (0, 0) and must be
/// Ethernet-enabled for the machine to validate.
#[derive(Debug, Clone)]
pub struct Machine {
    version: MachineVersion,
    width: u32,
    height: u32,
    wrap: Wrap,
    origin: String,
    chips: BTreeMap<Xy, Chip>,
    ethernet_connected_chips: Vec<Xy>,
    boot_ethernet_address: Option<Ipv4Addr>,
    spinnaker_links: Vec<SpinnakerLinkData>,
    fpga_links: Vec<FpgaLinkData>,
}

impl Machine {
    /// An empty machine. Sizes are assumed already verified against the
    /// version, so this stays crate-private; build machines through
    /// [`MachineVersion::create_machine`].
    pub(crate) fn new(
        version: MachineVersion,
        width: u32,
        height: u32,
        wrap: Wrap,
        origin: &str,
    ) -> Machine {
        Machine {
            version,
            width,
            height,
            wrap,
            origin: origin.to_string(),
            chips: BTreeMap::new(),
            ethernet_connected_chips: Vec::new(),
            boot_ethernet_address: None,
            spinnaker_links: Vec::new(),
            fpga_links: Vec::new(),
        }
    }

    /// Width of the machine in chips.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the machine in chips.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Wrap behaviour of the machine's edges.
    #[must_use]
    pub const fn wrap(&self) -> Wrap {
        self.wrap
    }

    /// The board version the machine is built from.
    #[must_use]
    pub const fn version(&self) -> MachineVersion {
        self.version
    }

    /// Add a chip.
    ///
    /// # Errors
    ///
    /// If a chip already sits at the same coordinates.
    pub fn add_chip(&mut self, chip: Chip) -> Result<()> {
        let xy = chip.xy();
        if self.chips.contains_key(&xy) {
            return Err(SpinnMachineError::already_exists(
                "chip",
                format!("{}, {}", xy.0, xy.1),
            ));
        }
        if let Some(ip) = chip.ip_address {
            self.ethernet_connected_chips.push(xy);
            if xy == (0, 0) {
                self.boot_ethernet_address = Some(ip);
            }
        }
        self.chips.insert(xy, chip);
        Ok(())
    }

    /// The chip at the given coordinates, if it exists.
    #[must_use]
    pub fn chip_at(&self, xy: Xy) -> Option<&Chip> {
        self.chips.get(&xy)
    }

    /// Whether a chip exists at the given coordinates.
    #[must_use]
    pub fn is_chip_at(&self, xy: Xy) -> bool {
        self.chips.contains_key(&xy)
    }

    /// Whether the chip at `xy` exists and has a link in `direction`.
    #[must_use]
    pub fn is_link_at(&self, xy: Xy, direction: Direction) -> bool {
        self.chips
            .get(&xy)
            .is_some_and(|chip| chip.router.is_link(direction))
    }

    /// Number of chips in the machine.
    #[must_use]
    pub fn n_chips(&self) -> usize {
        self.chips.len()
    }

    /// All chips, in coordinate order.
    pub fn chips(&self) -> impl Iterator<Item = &Chip> {
        self.chips.values()
    }

    /// Coordinates of all chips, in order.
    pub fn chip_coordinates(&self) -> impl Iterator<Item = Xy> + '_ {
        self.chips.keys().copied()
    }

    /// All Ethernet-enabled chips.
    pub fn ethernet_connected_chips(&self) -> impl Iterator<Item = &Chip> {
        self.ethernet_connected_chips
            .iter()
            .filter_map(|xy| self.chips.get(xy))
    }

    /// The chip used to boot the machine, at (0, 0).
    #[must_use]
    pub fn boot_chip(&self) -> Option<&Chip> {
        self.chips.get(&(0, 0))
    }

    /// IP address of the boot board, if the boot chip has been added.
    #[must_use]
    pub const fn boot_ethernet_address(&self) -> Option<Ipv4Addr> {
        self.boot_ethernet_address
    }

    /// The coordinates reached from `xy` over `direction`.
    ///
    /// Wrap-arounds are applied; `None` means the link leaves the
    /// machine over a non-wrapping edge. No check is made that a chip
    /// exists at either end.
    #[must_use]
    pub fn xy_over_link(&self, xy: Xy, direction: Direction) -> Option<Xy> {
        let (dx, dy) = direction.offset();
        let x = i64::from(xy.0) + i64::from(dx);
        let y = i64::from(xy.1) + i64::from(dy);
        let x = Self::fold_axis(x, self.width, self.wrap.horizontal())?;
        let y = Self::fold_axis(y, self.height, self.wrap.vertical())?;
        Some((x, y))
    }

    fn fold_axis(value: i64, size: u32, wraps: bool) -> Option<u32> {
        if wraps {
            u32::try_from(value.rem_euclid(i64::from(size))).ok()
        } else if (0..i64::from(size)).contains(&value) {
            u32::try_from(value).ok()
        } else {
            None
        }
    }

    /// Global coordinates of a board-local position, given the board's
    /// Ethernet-enabled chip.
    ///
    /// No check is made that the result is a chip that exists.
    #[must_use]
    pub fn get_global_xy(&self, local: LocalXy, ethernet: Xy) -> Xy {
        let x = local.0 + ethernet.0;
        let y = local.1 + ethernet.1;
        (
            if self.wrap.horizontal() { x % self.width } else { x },
            if self.wrap.vertical() { y % self.height } else { y },
        )
    }

    /// Board-local coordinates of a chip, or `None` if the chip sits
    /// before its own Ethernet chip on a non-wrapping axis.
    #[must_use]
    pub fn get_local_xy(&self, chip: &Chip) -> Option<LocalXy> {
        let (ex, ey) = chip.nearest_ethernet;
        let x = i64::from(chip.x) - i64::from(ex);
        let y = i64::from(chip.y) - i64::from(ey);
        let x = if self.wrap.horizontal() {
            x.rem_euclid(i64::from(self.width))
        } else {
            x
        };
        let y = if self.wrap.vertical() {
            y.rem_euclid(i64::from(self.height))
        } else {
            y
        };
        Some((u32::try_from(x).ok()?, u32::try_from(y).ok()?))
    }

    /// The potential chip coordinates of the board rooted at `ethernet`,
    /// the Ethernet-enabled chip itself included.
    ///
    /// No check is made that the chips exist.
    #[must_use]
    pub fn get_xys_by_ethernet(&self, ethernet: Xy) -> Vec<Xy> {
        self.version
            .chip_core_map()
            .iter()
            .map(|&(local, _)| self.get_global_xy(local, ethernet))
            .collect()
    }

    /// As [`get_xys_by_ethernet`](Self::get_xys_by_ethernet), with the
    /// typical core count of each position.
    #[must_use]
    pub fn get_xy_cores_by_ethernet(&self, ethernet: Xy) -> Vec<(Xy, u8)> {
        self.version
            .chip_core_map()
            .iter()
            .map(|&(local, n_cores)| (self.get_global_xy(local, ethernet), n_cores))
            .collect()
    }

    /// The coordinates of chips that actually exist on the board rooted
    /// at `ethernet`.
    #[must_use]
    pub fn get_existing_xys_by_ethernet(&self, ethernet: Xy) -> Vec<Xy> {
        self.get_xys_by_ethernet(ethernet)
            .into_iter()
            .filter(|xy| self.chips.contains_key(xy))
            .collect()
    }

    /// The coordinates of existing chips on the same board as `chip`.
    #[must_use]
    pub fn get_existing_xys_on_board(&self, chip: &Chip) -> Vec<Xy> {
        self.get_existing_xys_by_ethernet(chip.nearest_ethernet)
    }

    /// The board positions rooted at `ethernet` with no chip, the dead
    /// chips of that board.
    #[must_use]
    pub fn get_down_xys_by_ethernet(&self, ethernet: Xy) -> Vec<Xy> {
        self.get_xys_by_ethernet(ethernet)
            .into_iter()
            .filter(|xy| !self.chips.contains_key(xy))
            .collect()
    }

    /// Coordinates in concentric hexagonal rings around `start`, the
    /// start itself first, out to `radius` rings.
    ///
    /// Coordinates fold over wrapped axes but are otherwise unchecked:
    /// on a non-wrapping machine they can be negative or past an edge.
    #[must_use]
    pub fn concentric_xys(&self, radius: u32, start: Xy) -> Vec<(i64, i64)> {
        let mut xys = Vec::new();
        let (mut x, mut y) = (i64::from(start.0), i64::from(start.1));
        xys.push(self.fold_signed(x, y));
        for ring in 1..=i64::from(radius) {
            // step out to the ring, then walk around it
            y -= 1;
            for (dx, dy) in [(1, 1), (0, 1), (-1, 0), (-1, -1), (0, -1), (1, 0)] {
                for _ in 0..ring {
                    xys.push(self.fold_signed(x, y));
                    x += dx;
                    y += dy;
                }
            }
        }
        xys
    }

    fn fold_signed(&self, x: i64, y: i64) -> (i64, i64) {
        (
            if self.wrap.horizontal() {
                x.rem_euclid(i64::from(self.width))
            } else {
                x
            },
            if self.wrap.vertical() {
                y.rem_euclid(i64::from(self.height))
            } else {
                y
            },
        )
    }

    /// Whether the machine's size allows more than one 48-chip board.
    #[must_use]
    pub const fn multiple_48_chip_boards(&self) -> bool {
        let w_ok = match self.wrap {
            Wrap::Both | Wrap::Horizontal => self.width % 12 == 0,
            Wrap::Vertical | Wrap::None => self.width % 12 == 4,
        };
        let h_ok = match self.wrap {
            Wrap::Both | Wrap::Vertical => self.height % 12 == 0,
            Wrap::Horizontal | Wrap::None => self.height % 12 == 4,
        };
        w_ok && h_ok
    }

    fn axis_deltas(delta: i64, size: u32, wraps: bool) -> Vec<i64> {
        if wraps {
            let up = delta.rem_euclid(i64::from(size));
            vec![up, up - i64::from(size)]
        } else {
            vec![delta]
        }
    }

    /// Length of a minimal (dx, dy) step vector: equal-signed pairs
    /// share diagonal steps, opposite-signed pairs cannot.
    fn step_length(dx: i64, dy: i64) -> i64 {
        if (dx >= 0) == (dy >= 0) {
            dx.abs().max(dy.abs())
        } else {
            dx.abs() + dy.abs()
        }
    }

    /// The number of hops of the shortest path between two chips,
    /// wrap-arounds considered, ignoring dead chips and links.
    #[must_use]
    pub fn get_vector_length(&self, source: Xy, destination: Xy) -> u32 {
        let (dx, dy) = self.shortest_delta(source, destination);
        u32::try_from(Self::step_length(dx, dy)).unwrap_or(u32::MAX)
    }

    /// The shortest (x, y, z) hexagonal vector between two chips.
    ///
    /// A minimised vector has at most two non-zero components; the z
    /// component counts diagonal (NorthEast/SouthWest) hops.
    #[must_use]
    pub fn get_vector(&self, source: Xy, destination: Xy) -> (i64, i64, i64) {
        let (x, y) = self.shortest_delta(source, destination);
        minimize_vector(x, y)
    }

    fn shortest_delta(&self, source: Xy, destination: Xy) -> (i64, i64) {
        let dx = i64::from(destination.0) - i64::from(source.0);
        let dy = i64::from(destination.1) - i64::from(source.1);
        let mut best = None;
        for &cx in &Self::axis_deltas(dx, self.width, self.wrap.horizontal()) {
            for &cy in &Self::axis_deltas(dy, self.height, self.wrap.vertical()) {
                let length = Self::step_length(cx, cy);
                if best.is_none_or(|(_, _, l)| length < l) {
                    best = Some((cx, cy, length));
                }
            }
        }
        // At least one candidate always exists.
        let (x, y, _) = best.unwrap_or((dx, dy, 0));
        (x, y)
    }

    /// Total cores on the machine, monitors included.
    #[must_use]
    pub fn total_cores(&self) -> usize {
        self.chips.values().map(Chip::n_processors).sum()
    }

    /// Total cores available to user applications.
    #[must_use]
    pub fn total_available_user_cores(&self) -> usize {
        self.chips.values().map(Chip::n_user_processors).sum()
    }

    /// Core and bidirectional link counts for the whole machine.
    #[must_use]
    pub fn get_cores_and_link_count(&self) -> (usize, usize) {
        let cores = self.total_cores();
        let unidirectional: usize = self.chips.values().map(|c| c.router.n_links()).sum();
        (cores, unidirectional / 2)
    }

    /// A human-readable description of where a chip is, globally and on
    /// its board.
    #[must_use]
    pub fn where_is_xy(&self, xy: Xy) -> String {
        match self.chip_at(xy) {
            Some(chip) => self.where_is_chip(chip),
            None => format!("No chip {}, {} found", xy.0, xy.1),
        }
    }

    /// As [`where_is_xy`](Self::where_is_xy), for a chip already in hand.
    #[must_use]
    pub fn where_is_chip(&self, chip: &Chip) -> String {
        let boot_ip = self
            .boot_chip()
            .and_then(|c| c.ip_address)
            .map_or_else(|| "unknown".to_string(), |ip| ip.to_string());
        let board_ip = self
            .chip_at(chip.nearest_ethernet)
            .and_then(|c| c.ip_address)
            .map_or_else(|| "unknown".to_string(), |ip| ip.to_string());
        match self.get_local_xy(chip) {
            Some((lx, ly)) => format!(
                "global chip {}, {} on {boot_ip} is chip {lx}, {ly} on {board_ip}",
                chip.x, chip.y
            ),
            None => format!(
                "global chip {}, {} on {boot_ip} is not local to any board",
                chip.x, chip.y
            ),
        }
    }

    /// Chips with no working outgoing link at all.
    ///
    /// Groups of mutually-unreachable chips are not detected.
    #[must_use]
    pub fn unreachable_outgoing_chips(&self) -> Vec<Xy> {
        self.chips
            .values()
            .filter(|chip| chip.router.n_links() == 0)
            .map(Chip::xy)
            .collect()
    }

    /// Chips no neighbour has a working link into.
    ///
    /// Groups of mutually-unreachable chips are not detected.
    #[must_use]
    pub fn unreachable_incoming_chips(&self) -> Vec<Xy> {
        let mut removable = Vec::new();
        for chip in self.chips.values() {
            let has_link = Direction::ALL.iter().any(|&incoming| {
                self.xy_over_link(chip.xy(), incoming.opposite())
                    .is_some_and(|xy| self.is_link_at(xy, incoming))
            });
            if !has_link {
                removable.push(chip.xy());
            }
        }
        removable
    }

    /// Chips with no working outgoing link to a neighbour on their own
    /// board.
    ///
    /// Groups of mutually-unreachable chips are not detected.
    #[must_use]
    pub fn unreachable_outgoing_local_chips(&self) -> Vec<Xy> {
        let mut removable = Vec::new();
        for chip in self.chips.values() {
            let has_link = Direction::ALL.iter().any(|&direction| {
                chip.router.is_link(direction)
                    && self
                        .xy_over_link(chip.xy(), direction)
                        .and_then(|xy| self.chips.get(&xy))
                        .is_some_and(|n| n.nearest_ethernet == chip.nearest_ethernet)
            });
            if !has_link {
                removable.push(chip.xy());
            }
        }
        removable
    }

    /// Chips no neighbour on their own board has a working link into.
    ///
    /// Groups of mutually-unreachable chips are not detected.
    #[must_use]
    pub fn unreachable_incoming_local_chips(&self) -> Vec<Xy> {
        let mut removable = Vec::new();
        for chip in self.chips.values() {
            let has_link = Direction::ALL.iter().any(|&incoming| {
                // The neighbour that would feed this chip over `incoming`
                // sits in the opposite direction.
                self.xy_over_link(chip.xy(), incoming.opposite())
                    .and_then(|xy| self.chips.get(&xy))
                    .is_some_and(|n| {
                        n.router.is_link(incoming)
                            && n.nearest_ethernet == chip.nearest_ethernet
                    })
            });
            if !has_link {
                removable.push(chip.xy());
            }
        }
        removable
    }

    /// Links whose reverse direction does not exist: (source, outgoing
    /// direction, missing return direction).
    #[must_use]
    pub fn one_way_links(&self) -> Vec<(Xy, Direction, Direction)> {
        let mut one_way = Vec::new();
        for chip in self.chips.values() {
            for direction in Direction::ALL {
                if let Some(link) = chip.router.link(direction) {
                    if !self.is_link_at(link.destination, direction.opposite()) {
                        one_way.push((chip.xy(), direction, direction.opposite()));
                    }
                }
            }
        }
        one_way
    }

    /// Record the version's SpiNNaker links for every Ethernet-enabled
    /// chip whose router leaves the relevant link open.
    pub fn add_spinnaker_links(&mut self) {
        let mut links = Vec::new();
        for ethernet in self.ethernet_connected_chips() {
            for (id, &(lx, ly, link)) in self.version.spinnaker_links().iter().enumerate() {
                let xy = self.get_global_xy((lx, ly), ethernet.xy());
                if let Some(chip) = self.chip_at(xy) {
                    if !chip.router.is_link(link) {
                        links.push(SpinnakerLinkData {
                            spinnaker_link_id: id as u32,
                            xy,
                            direction: link,
                            board_address: ethernet.ip_address,
                        });
                    }
                }
            }
        }
        debug!("added {} SpiNNaker links", links.len());
        self.spinnaker_links = links;
    }

    /// Record the version's FPGA links for every Ethernet-enabled chip
    /// that exists on the machine.
    pub fn add_fpga_links(&mut self) {
        let mut links = Vec::new();
        for ethernet in self.ethernet_connected_chips() {
            for &(lx, ly, link, fpga_id, fpga_link_id) in self.version.fpga_links() {
                let xy = self.get_global_xy((lx, ly), ethernet.xy());
                if self.is_chip_at(xy) {
                    links.push(FpgaLinkData {
                        fpga_id,
                        fpga_link_id,
                        xy,
                        direction: link,
                        board_address: ethernet.ip_address,
                    });
                }
            }
        }
        debug!("added {} FPGA links", links.len());
        self.fpga_links = links;
    }

    /// The SpiNNaker link with the given id on the given board, or the
    /// boot board when no address is given.
    #[must_use]
    pub fn spinnaker_link(
        &self,
        board_address: Option<Ipv4Addr>,
        spinnaker_link_id: u32,
    ) -> Option<&SpinnakerLinkData> {
        let address = board_address.or(self.boot_ethernet_address);
        self.spinnaker_links
            .iter()
            .find(|l| l.board_address == address && l.spinnaker_link_id == spinnaker_link_id)
    }

    /// The SpiNNaker link with the given id on the given chip.
    #[must_use]
    pub fn spinnaker_link_at(&self, xy: Xy, spinnaker_link_id: u32) -> Option<&SpinnakerLinkData> {
        self.spinnaker_links
            .iter()
            .find(|l| l.xy == xy && l.spinnaker_link_id == spinnaker_link_id)
    }

    /// All SpiNNaker links on the machine.
    #[must_use]
    pub fn spinnaker_links(&self) -> &[SpinnakerLinkData] {
        &self.spinnaker_links
    }

    /// The FPGA link with the given ids on the given board, or the boot
    /// board when no address is given.
    #[must_use]
    pub fn fpga_link(
        &self,
        board_address: Option<Ipv4Addr>,
        fpga_id: u8,
        fpga_link_id: u8,
    ) -> Option<&FpgaLinkData> {
        let address = board_address.or(self.boot_ethernet_address);
        self.fpga_links.iter().find(|l| {
            l.board_address == address && l.fpga_id == fpga_id && l.fpga_link_id == fpga_link_id
        })
    }

    /// All FPGA links on the machine.
    #[must_use]
    pub fn fpga_links(&self) -> &[FpgaLinkData] {
        &self.fpga_links
    }

    /// Check the machine's invariants.
    ///
    /// # Errors
    ///
    /// If the boot chip is missing or not Ethernet-enabled, a chip lies
    /// outside the machine, an Ethernet-enabled chip sits at an illegal
    /// position, multiple boards appear on a size that cannot hold them,
    /// or a chip's board-local position is not one a board has.
    pub fn validate(&self) -> Result<()> {
        if self.boot_ethernet_address.is_none() {
            return Err(SpinnMachineError::invalid_machine(
                "no ethernet chip at 0, 0 found",
            ));
        }
        if self.ethernet_connected_chips.len() > 1 && !self.multiple_48_chip_boards() {
            return Err(SpinnMachineError::invalid_machine(format!(
                "a {} machine of size {}, {} can not handle multiple ethernet chips",
                self.wrap.label(),
                self.width,
                self.height
            )));
        }
        for chip in self.chips.values() {
            if chip.x >= self.width {
                return Err(SpinnMachineError::invalid_machine(format!(
                    "{chip} has an x larger than width {}",
                    self.width
                )));
            }
            if chip.y >= self.height {
                return Err(SpinnMachineError::invalid_machine(format!(
                    "{chip} has a y larger than height {}",
                    self.height
                )));
            }
            if chip.ip_address.is_some() {
                if let Some(problem) = self.version.illegal_ethernet_message(chip.xy()) {
                    return Err(SpinnMachineError::invalid_machine(format!(
                        "ethernet {chip}: {problem}"
                    )));
                }
            } else {
                if !self.is_chip_at(chip.nearest_ethernet) {
                    return Err(SpinnMachineError::invalid_machine(format!(
                        "{chip} has an invalid ethernet chip"
                    )));
                }
                let local = self.get_local_xy(chip);
                let expected = local
                    .is_some_and(|xy| self.version.chip_core_map().iter().any(|&(l, _)| l == xy));
                if !expected {
                    return Err(SpinnMachineError::invalid_machine(format!(
                        "{chip} has an unexpected local xy of {local:?}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl core::fmt::Display for Machine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[{}{}Machine: width={}, height={}, n_chips={}]",
            self.origin,
            self.wrap.label(),
            self.width,
            self.height,
            self.chips.len()
        )
    }
}

/// Minimise an (x, y, 0) hexagonal vector by adding or subtracting
/// (1, 1, 1), leaving at most two non-zero components.
fn minimize_vector(x: i64, y: i64) -> (i64, i64, i64) {
    if x > 0 {
        if y > 0 {
            // The shared positive distance moves onto the diagonal.
            if x > y {
                (x - y, 0, -y)
            } else {
                (0, y - x, -x)
            }
        } else {
            (x, y, 0)
        }
    } else if y > 0 {
        (x, y, 0)
    } else if x > y {
        (0, y - x, -x)
    } else {
        (x - y, 0, -y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Link;
    use crate::router::Router;
    use spinn_board::layout;

    fn empty(version: MachineVersion, width: u32, height: u32) -> Machine {
        version.create_machine(width, height, "").unwrap()
    }

    fn plain_chip(machine: &Machine, x: u32, y: u32) -> Chip {
        let mut router = Router::new();
        for direction in Direction::ALL {
            if let Some(dest) = machine.xy_over_link((x, y), direction) {
                router
                    .add_link(Link::new((x, y), direction, dest))
                    .unwrap();
            }
        }
        Chip::new(x, y, 18, router, layout::SDRAM_PER_CHIP, (0, 0), None)
    }

    #[test]
    fn wrap_labels() {
        assert_eq!(Wrap::None.label(), "NoWrap");
        assert_eq!(Wrap::Both.label(), "Wrapped");
        assert!(Wrap::Horizontal.horizontal());
        assert!(!Wrap::Horizontal.vertical());
    }

    #[test]
    fn xy_over_link_wraps_on_wrapped_axes() {
        let machine = empty(MachineVersion::FourChip, 2, 2);
        assert_eq!(machine.xy_over_link((1, 1), Direction::East), Some((0, 1)));
        assert_eq!(machine.xy_over_link((0, 0), Direction::South), Some((0, 1)));
        assert_eq!(
            machine.xy_over_link((1, 1), Direction::NorthEast),
            Some((0, 0))
        );
    }

    #[test]
    fn xy_over_link_stops_at_unwrapped_edges() {
        let machine = empty(MachineVersion::FortyEightChip, 16, 16);
        assert_eq!(machine.wrap(), Wrap::None);
        assert_eq!(machine.xy_over_link((15, 3), Direction::East), None);
        assert_eq!(machine.xy_over_link((0, 0), Direction::SouthWest), None);
        assert_eq!(machine.xy_over_link((4, 4), Direction::East), Some((5, 4)));
    }

    #[test]
    fn vector_length_no_wrap() {
        let machine = empty(MachineVersion::FortyEightChip, 16, 16);
        // same sign shares diagonal hops
        assert_eq!(machine.get_vector_length((0, 0), (3, 2)), 3);
        // opposite signs cannot
        assert_eq!(machine.get_vector_length((2, 2), (0, 4)), 4);
        assert_eq!(machine.get_vector_length((5, 5), (5, 5)), 0);
    }

    #[test]
    fn vector_length_full_wrap() {
        let machine = empty(MachineVersion::FortyEightChip, 12, 12);
        assert_eq!(machine.wrap(), Wrap::Both);
        // wrapping is shorter than crossing the machine
        assert_eq!(machine.get_vector_length((0, 0), (11, 11)), 1);
        assert_eq!(machine.get_vector_length((0, 0), (11, 0)), 1);
        assert_eq!(machine.get_vector_length((0, 0), (6, 0)), 6);
    }

    #[test]
    fn minimised_vectors() {
        let machine = empty(MachineVersion::FortyEightChip, 16, 16);
        assert_eq!(machine.get_vector((0, 0), (3, 2)), (1, 0, -2));
        assert_eq!(machine.get_vector((0, 0), (2, 3)), (0, 1, -2));
        assert_eq!(machine.get_vector((2, 2), (0, 4)), (-2, 2, 0));
        assert_eq!(machine.get_vector((3, 3), (1, 1)), (0, 0, 2));
    }

    #[test]
    fn concentric_rings() {
        let machine = empty(MachineVersion::FortyEightChip, 16, 16);
        let xys = machine.concentric_xys(1, (3, 3));
        assert_eq!(xys[0], (3, 3));
        // one ring of six around the start
        assert_eq!(xys.len(), 7);
        assert!(xys.contains(&(4, 4)));
        assert!(xys.contains(&(2, 2)));
        assert_eq!(machine.concentric_xys(2, (3, 3)).len(), 19);

        // unwrapped machines can ring off the edge
        let xys = machine.concentric_xys(1, (0, 0));
        assert!(xys.contains(&(-1, -1)));

        // wrapped machines fold instead
        let wrapped = empty(MachineVersion::FortyEightChip, 12, 12);
        let xys = wrapped.concentric_xys(1, (0, 0));
        assert!(xys.contains(&(11, 11)));
    }

    #[test]
    fn down_xys_are_the_missing_board_positions() {
        let mut machine = empty(MachineVersion::FourChip, 2, 2);
        machine.add_chip(plain_chip(&machine, 0, 0)).unwrap();
        machine.add_chip(plain_chip(&machine, 1, 0)).unwrap();
        let down = machine.get_down_xys_by_ethernet((0, 0));
        assert_eq!(down, vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn duplicate_chip_rejected() {
        let mut machine = empty(MachineVersion::FourChip, 2, 2);
        machine.add_chip(plain_chip(&machine, 0, 0)).unwrap();
        assert!(machine.add_chip(plain_chip(&machine, 0, 0)).is_err());
    }

    #[test]
    fn validate_needs_boot_ethernet() {
        let mut machine = empty(MachineVersion::FourChip, 2, 2);
        machine.add_chip(plain_chip(&machine, 0, 0)).unwrap();
        assert!(matches!(
            machine.validate(),
            Err(SpinnMachineError::InvalidMachine { .. })
        ));
    }

    #[test]
    fn one_way_links_detected() {
        let mut machine = empty(MachineVersion::FourChip, 2, 2);
        for x in 0..2 {
            for y in 0..2 {
                let mut chip = plain_chip(&machine, x, y);
                if (x, y) == (0, 0) {
                    // rebuild the router without the East link
                    let mut router = Router::new();
                    for link in chip.router.links() {
                        if link.direction != Direction::East {
                            router.add_link(*link).unwrap();
                        }
                    }
                    chip.router = router;
                }
                machine.add_chip(chip).unwrap();
            }
        }
        let one_way = machine.one_way_links();
        // (1, 0) still links West to (0, 0); the return is gone
        assert!(one_way.contains(&((1, 0), Direction::West, Direction::East)));
    }
}
