//! Board versions and the rules that differ between them.
//!
//! Version 2 and 3 boards carry 4 chips; version 4 and 5 boards carry
//! 48. Machines are built from one board type, so everything that
//! varies with the board (shape, core map, size rules, SpiNNaker and
//! FPGA links) hangs off [`MachineVersion`].

use spinn_board::{
    geometry::TriadGeometry,
    layout::{self, LocalXy},
    Direction,
};
use tracing::{info, warn};

use crate::config::MachineConfig;
use crate::error::{Result, SpinnMachineError};
use crate::machine::{Machine, Wrap, Xy};

use Direction::{East, North, NorthEast, South, SouthWest, West};

/// SpiNNaker links of a 4-chip board: board-local (x, y) and direction.
const SPINNAKER_LINKS_4: [(u32, u32, Direction); 2] = [(0, 0, West), (1, 0, East)];

/// SpiNNaker links of a 48-chip board.
const SPINNAKER_LINKS_48: [(u32, u32, Direction); 1] = [(0, 0, SouthWest)];

/// FPGA links of a 48-chip board: board-local (x, y), direction, FPGA
/// id and FPGA link id. The three FPGAs sit on the hexagon's edges.
const FPGA_LINKS_48: [(u32, u32, Direction, u8, u8); 48] = [
    (0, 0, West, 1, 1),
    (0, 0, SouthWest, 1, 0),
    (0, 0, South, 0, 15),
    (0, 1, West, 1, 3),
    (0, 1, SouthWest, 1, 2),
    (0, 2, West, 1, 5),
    (0, 2, SouthWest, 1, 4),
    (0, 3, North, 1, 8),
    (0, 3, West, 1, 7),
    (0, 3, SouthWest, 1, 6),
    (1, 0, SouthWest, 0, 14),
    (1, 0, South, 0, 13),
    (1, 4, North, 1, 10),
    (1, 4, West, 1, 9),
    (2, 0, SouthWest, 0, 12),
    (2, 0, South, 0, 11),
    (2, 5, North, 1, 12),
    (2, 5, West, 1, 11),
    (3, 0, SouthWest, 0, 10),
    (3, 0, South, 0, 9),
    (3, 6, North, 1, 14),
    (3, 6, West, 1, 13),
    (4, 0, East, 0, 6),
    (4, 0, SouthWest, 0, 8),
    (4, 0, South, 0, 7),
    (4, 7, NorthEast, 2, 1),
    (4, 7, North, 2, 0),
    (4, 7, West, 1, 15),
    (5, 1, East, 0, 4),
    (5, 1, South, 0, 5),
    (5, 7, NorthEast, 2, 3),
    (5, 7, North, 2, 2),
    (6, 2, East, 0, 2),
    (6, 2, South, 0, 3),
    (6, 7, NorthEast, 2, 5),
    (6, 7, North, 2, 4),
    (7, 3, East, 0, 0),
    (7, 3, NorthEast, 2, 15),
    (7, 3, South, 0, 1),
    (7, 4, East, 2, 14),
    (7, 4, NorthEast, 2, 13),
    (7, 5, East, 2, 12),
    (7, 5, NorthEast, 2, 11),
    (7, 6, East, 2, 10),
    (7, 6, NorthEast, 2, 9),
    (7, 7, East, 2, 8),
    (7, 7, NorthEast, 2, 7),
    (7, 7, North, 2, 6),
];

/// The kind of board a machine is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineVersion {
    /// Version 2 and 3 boards: 2x2 chips, one board per machine.
    FourChip,
    /// Version 4 and 5 boards: the 48-chip hexagon, tiled into triads.
    FortyEightChip,
}

impl MachineVersion {
    /// Human-readable board name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MachineVersion::FourChip => "Spin1 4 Chip",
            MachineVersion::FortyEightChip => "Spin1 48 Chip",
        }
    }

    /// The canonical version number of the board type.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            MachineVersion::FourChip => 3,
            MachineVersion::FortyEightChip => 5,
        }
    }

    /// The board type a `version =` number names, if it names one.
    #[must_use]
    pub const fn from_number(number: u32) -> Option<MachineVersion> {
        match number {
            2 | 3 => Some(MachineVersion::FourChip),
            4 | 5 => Some(MachineVersion::FortyEightChip),
            _ => None,
        }
    }

    /// Width and height of one board's bounding box.
    #[must_use]
    pub const fn board_shape(self) -> (u32, u32) {
        match self {
            MachineVersion::FourChip => layout::BOARD_4_SHAPE,
            MachineVersion::FortyEightChip => layout::BOARD_48_SHAPE,
        }
    }

    /// Expected chip positions on a board and their typical core counts.
    #[must_use]
    pub const fn chip_core_map(self) -> &'static [(LocalXy, u8)] {
        match self {
            MachineVersion::FourChip => &layout::CHIP_CORE_MAP_4,
            MachineVersion::FortyEightChip => &layout::CHIP_CORE_MAP_48,
        }
    }

    /// Number of chips on a fully-working board.
    #[must_use]
    pub const fn n_chips_per_board(self) -> usize {
        self.chip_core_map().len()
    }

    /// SpiNNaker links of one board, in SpiNNaker link id order.
    #[must_use]
    pub const fn spinnaker_links(self) -> &'static [(u32, u32, Direction)] {
        match self {
            MachineVersion::FourChip => &SPINNAKER_LINKS_4,
            MachineVersion::FortyEightChip => &SPINNAKER_LINKS_48,
        }
    }

    /// FPGA links of one board.
    #[must_use]
    pub const fn fpga_links(self) -> &'static [(u32, u32, Direction, u8, u8)] {
        match self {
            MachineVersion::FourChip => &[],
            MachineVersion::FortyEightChip => &FPGA_LINKS_48,
        }
    }

    /// Whether machines of this version can join several boards.
    #[must_use]
    pub const fn supports_multiple_boards(self) -> bool {
        matches!(self, MachineVersion::FortyEightChip)
    }

    /// The chips that would be Ethernet-enabled in a machine of the
    /// given size, assuming the size passes [`verify_size`](Self::verify_size).
    #[must_use]
    pub fn potential_ethernet_chips(self, width: u32, height: u32) -> Vec<Xy> {
        match self {
            MachineVersion::FourChip => vec![(0, 0)],
            MachineVersion::FortyEightChip => {
                TriadGeometry::spinn5().potential_ethernet_chips(width, height)
            }
        }
    }

    /// Why a chip at `xy` must not be Ethernet-enabled, if it must not.
    #[must_use]
    pub fn illegal_ethernet_message(self, xy: Xy) -> Option<&'static str> {
        match self {
            MachineVersion::FourChip => {
                if xy == (0, 0) {
                    None
                } else {
                    Some("only chip 0, 0 may be an ethernet chip")
                }
            }
            MachineVersion::FortyEightChip => {
                if xy.0 % 4 != 0 {
                    Some("only a chip with x divisible by 4 may be an ethernet chip")
                } else if (xy.0 + xy.1) % 12 != 0 {
                    Some("only a chip with x + y divisible by 12 may be an ethernet chip")
                } else {
                    None
                }
            }
        }
    }

    /// Check that `width` x `height` is a size this board type can tile.
    ///
    /// # Errors
    ///
    /// If either dimension is zero, a 4-chip machine is not 2x2, or a
    /// 48-chip machine is neither 8x8 nor built from whole boards
    /// (each dimension a multiple of 12, or of 12 plus 4).
    pub fn verify_size(self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(SpinnMachineError::invalid_parameter(
                "width and height",
                format!("{width} and {height}"),
                "machine dimensions must be positive",
            ));
        }
        match self {
            MachineVersion::FourChip => {
                if (width, height) != (2, 2) {
                    return Err(SpinnMachineError::invalid_parameter(
                        "width and height",
                        format!("{width} and {height}"),
                        "a 4-chip machine is always 2 x 2",
                    ));
                }
            }
            MachineVersion::FortyEightChip => {
                if (width, height) == (8, 8) {
                    return Ok(());
                }
                if width % 12 != 0 && width % 12 != 4 {
                    return Err(SpinnMachineError::invalid_parameter(
                        "width",
                        width.to_string(),
                        "must be a multiple of 12, or a multiple of 12 plus 4",
                    ));
                }
                if height % 12 != 0 && height % 12 != 4 {
                    return Err(SpinnMachineError::invalid_parameter(
                        "height",
                        height.to_string(),
                        "must be a multiple of 12, or a multiple of 12 plus 4",
                    ));
                }
            }
        }
        Ok(())
    }

    /// The wrap behaviour of a machine of the given size.
    #[must_use]
    pub fn wrap_for(self, width: u32, height: u32) -> Wrap {
        match self {
            // A single 4-chip board wraps back onto itself both ways.
            MachineVersion::FourChip => Wrap::Both,
            MachineVersion::FortyEightChip => match (width % 12 == 0, height % 12 == 0) {
                (true, true) => Wrap::Both,
                (true, false) => Wrap::Horizontal,
                (false, true) => Wrap::Vertical,
                (false, false) => Wrap::None,
            },
        }
    }

    /// An empty machine of the given size.
    ///
    /// `origin` tags where the machine came from, for the description
    /// string; `"Virtual"` and `"Json"` are typical.
    ///
    /// # Errors
    ///
    /// If the size fails [`verify_size`](Self::verify_size).
    pub fn create_machine(self, width: u32, height: u32, origin: &str) -> Result<Machine> {
        self.verify_size(width, height)?;
        Ok(Machine::new(
            self,
            width,
            height,
            self.wrap_for(width, height),
            origin,
        ))
    }

    /// The smallest machine size that holds `n_boards` boards, as the
    /// allocation server would choose it.
    #[must_use]
    pub fn size_from_n_boards(self, n_boards: u32) -> (u32, u32) {
        match self {
            MachineVersion::FourChip => (2, 2),
            MachineVersion::FortyEightChip => {
                if n_boards <= 1 {
                    return (8, 8);
                }
                let triads = n_boards.div_ceil(3);
                let mut width = 1;
                while width * width < triads {
                    width += 1;
                }
                let height = triads.div_ceil(width);
                (width * 12 + 4, height * 12 + 4)
            }
        }
    }

    /// Effective per-chip limits after the configuration's caps.
    ///
    /// Caps larger than the hardware's own limits are ignored with a
    /// warning; smaller caps reduce the limits.
    #[must_use]
    pub fn limits(self, config: &MachineConfig) -> VersionLimits {
        let mut max_cores = layout::MAX_CORES_PER_CHIP;
        if let Some(cap) = config.max_machine_core {
            if cap > max_cores {
                warn!(
                    "ignoring max_machine_core {cap}: larger than the {} for a {} board",
                    max_cores,
                    self.name()
                );
            } else if cap < max_cores {
                info!("max cores per chip reduced to {cap} by max_machine_core");
                max_cores = cap;
            }
        }
        let mut max_sdram = layout::SDRAM_PER_CHIP;
        if let Some(cap) = config.max_sdram_allowed_per_chip {
            if cap > max_sdram {
                warn!(
                    "ignoring max_sdram_allowed_per_chip {cap}: larger than the {} of a {} board",
                    max_sdram,
                    self.name()
                );
            } else if cap < max_sdram {
                info!("max sdram per chip reduced to {cap} by max_sdram_allowed_per_chip");
                max_sdram = cap;
            }
        }
        VersionLimits {
            max_cores_per_chip: max_cores,
            max_sdram_per_chip: max_sdram,
        }
    }

    /// Pick the board version a configuration asks for.
    ///
    /// An explicit `version` wins; otherwise a spalloc server or remote
    /// allocation URL implies 48-chip boards, and failing that a 2x2
    /// size means a 4-chip board and any other size a 48-chip board.
    ///
    /// # Errors
    ///
    /// If no key decides the version, the `version` number is unknown,
    /// the chosen version is not in the `versions` cross-check list, or
    /// only one of `width`/`height` is set.
    pub fn from_config(config: &MachineConfig) -> Result<MachineVersion> {
        let version = Self::resolve(config)?;
        if let (Some(width), Some(height)) = (config.width, config.height) {
            version.verify_size(width, height)?;
        } else if config.width.is_some() != config.height.is_some() {
            return Err(SpinnMachineError::invalid_parameter(
                "width and height",
                format!("{:?} and {:?}", config.width, config.height),
                "set both dimensions or neither",
            ));
        }
        if let Some(versions) = &config.versions {
            let compatible = versions
                .iter()
                .any(|&n| MachineVersion::from_number(n) == Some(version));
            if !compatible {
                return Err(SpinnMachineError::invalid_parameter(
                    "versions",
                    format!("{versions:?}"),
                    format!("none of these is the {} board in use", version.name()),
                ));
            }
        }
        Ok(version)
    }

    fn resolve(config: &MachineConfig) -> Result<MachineVersion> {
        if let Some(number) = config.version {
            return MachineVersion::from_number(number).ok_or_else(|| {
                SpinnMachineError::invalid_parameter(
                    "version",
                    number.to_string(),
                    "expected 2, 3, 4 or 5",
                )
            });
        }
        if config.spalloc_server.is_some() || config.remote_spinnaker_url.is_some() {
            return Ok(MachineVersion::FortyEightChip);
        }
        if let (Some(width), Some(height)) = (config.width, config.height) {
            if (width, height) == (2, 2) {
                info!("assuming a 4-chip board from the 2 x 2 size");
                return Ok(MachineVersion::FourChip);
            }
            return Ok(MachineVersion::FortyEightChip);
        }
        Err(SpinnMachineError::invalid_machine(
            "the configuration does not determine a board version",
        ))
    }
}

/// Per-chip limits after configuration caps, from [`MachineVersion::limits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionLimits {
    /// Cores usable per chip.
    pub max_cores_per_chip: u8,
    /// SDRAM reported per chip, in bytes.
    pub max_sdram_per_chip: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_map_to_board_types() {
        assert_eq!(
            MachineVersion::from_number(2),
            Some(MachineVersion::FourChip)
        );
        assert_eq!(
            MachineVersion::from_number(5),
            Some(MachineVersion::FortyEightChip)
        );
        assert_eq!(MachineVersion::from_number(7), None);
        assert_eq!(MachineVersion::FourChip.number(), 3);
    }

    #[test]
    fn sizes_verified_per_version() {
        let v3 = MachineVersion::FourChip;
        assert!(v3.verify_size(2, 2).is_ok());
        assert!(v3.verify_size(8, 8).is_err());

        let v5 = MachineVersion::FortyEightChip;
        assert!(v5.verify_size(8, 8).is_ok());
        assert!(v5.verify_size(12, 12).is_ok());
        assert!(v5.verify_size(16, 16).is_ok());
        assert!(v5.verify_size(12, 16).is_ok());
        assert!(v5.verify_size(9, 12).is_err());
        assert!(v5.verify_size(0, 12).is_err());
    }

    #[test]
    fn wrap_follows_divisibility() {
        let v5 = MachineVersion::FortyEightChip;
        assert_eq!(v5.wrap_for(12, 12), Wrap::Both);
        assert_eq!(v5.wrap_for(12, 16), Wrap::Horizontal);
        assert_eq!(v5.wrap_for(16, 12), Wrap::Vertical);
        assert_eq!(v5.wrap_for(16, 16), Wrap::None);
        assert_eq!(MachineVersion::FourChip.wrap_for(2, 2), Wrap::Both);
    }

    #[test]
    fn factory_resolution_order() {
        let mut config = MachineConfig::default();
        config.version = Some(3);
        config.spalloc_server = Some("spalloc".to_string());
        // explicit version outranks the spalloc hint
        assert_eq!(
            MachineVersion::from_config(&config).unwrap(),
            MachineVersion::FourChip
        );

        let mut config = MachineConfig::default();
        config.remote_spinnaker_url = Some("http://example.com".to_string());
        assert_eq!(
            MachineVersion::from_config(&config).unwrap(),
            MachineVersion::FortyEightChip
        );

        let mut config = MachineConfig::default();
        config.width = Some(2);
        config.height = Some(2);
        assert_eq!(
            MachineVersion::from_config(&config).unwrap(),
            MachineVersion::FourChip
        );
        config.width = Some(12);
        config.height = Some(12);
        assert_eq!(
            MachineVersion::from_config(&config).unwrap(),
            MachineVersion::FortyEightChip
        );

        assert!(MachineVersion::from_config(&MachineConfig::default()).is_err());
    }

    #[test]
    fn factory_rejects_half_a_size() {
        let mut config = MachineConfig::default();
        config.version = Some(5);
        config.width = Some(12);
        assert!(MachineVersion::from_config(&config).is_err());
    }

    #[test]
    fn versions_cross_check() {
        let mut config = MachineConfig::default();
        config.version = Some(5);
        config.versions = Some(vec![4, 5]);
        assert!(MachineVersion::from_config(&config).is_ok());
        config.versions = Some(vec![2, 3]);
        assert!(MachineVersion::from_config(&config).is_err());
    }

    #[test]
    fn limits_apply_caps() {
        let mut config = MachineConfig::default();
        config.max_machine_core = Some(16);
        config.max_sdram_allowed_per_chip = Some(1_000_000);
        let limits = MachineVersion::FortyEightChip.limits(&config);
        assert_eq!(limits.max_cores_per_chip, 16);
        assert_eq!(limits.max_sdram_per_chip, 1_000_000);

        // caps above the hardware limits are ignored
        let mut config = MachineConfig::default();
        config.max_machine_core = Some(40);
        let limits = MachineVersion::FortyEightChip.limits(&config);
        assert_eq!(limits.max_cores_per_chip, 18);
        assert_eq!(limits.max_sdram_per_chip, layout::SDRAM_PER_CHIP);
    }

    #[test]
    fn board_sizes_for_allocations() {
        let v5 = MachineVersion::FortyEightChip;
        assert_eq!(v5.size_from_n_boards(1), (8, 8));
        assert_eq!(v5.size_from_n_boards(3), (16, 16));
        assert_eq!(v5.size_from_n_boards(6), (28, 16));
    }

    #[test]
    fn fpga_table_covers_the_hexagon_edge() {
        // Three FPGAs with 16 links each.
        assert_eq!(FPGA_LINKS_48.len(), 48);
        for fpga in 0..3 {
            let count = FPGA_LINKS_48.iter().filter(|&&(_, _, _, f, _)| f == fpga).count();
            assert_eq!(count, 16);
        }
        // Every entry names a chip position that is on the board.
        for &(x, y, _, _, _) in &FPGA_LINKS_48 {
            assert!(layout::cores_at_48((x, y)).is_some());
        }
    }
}
