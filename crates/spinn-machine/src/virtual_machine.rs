//! Building virtual machines: full-sized models of hardware that is
//! not there, used to plan executions.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use spinn_board::Direction;
use tracing::{debug, info};

use crate::chip::Chip;
use crate::config::MachineConfig;
use crate::error::Result;
use crate::link::Link;
use crate::machine::{Machine, Xy};
use crate::router::Router;
use crate::version::MachineVersion;

/// Links absent on a real 4-chip board: the board's outside edges have
/// no neighbouring board to wrap to.
const FOUR_CHIP_DOWN_LINKS: [(u32, u32, Direction); 8] = [
    (0, 0, Direction::West),
    (0, 0, Direction::SouthWest),
    (0, 1, Direction::West),
    (0, 1, Direction::SouthWest),
    (1, 0, Direction::East),
    (1, 0, Direction::NorthEast),
    (1, 1, Direction::East),
    (1, 1, Direction::NorthEast),
];

/// A virtual machine of the given size, with every chip working.
///
/// # Errors
///
/// If the size does not correspond to whole boards.
pub fn virtual_machine(width: u32, height: u32) -> Result<Machine> {
    VirtualMachineBuilder::new(width, height).build()
}

/// Builds [`Machine`]s from a size and configuration instead of from
/// hardware.
#[derive(Debug, Clone)]
pub struct VirtualMachineBuilder {
    width: u32,
    height: u32,
    config: MachineConfig,
    n_cpus_per_chip: Option<u8>,
    validate: bool,
}

impl VirtualMachineBuilder {
    /// A builder for a `width` x `height` machine with a default
    /// configuration.
    #[must_use]
    pub fn new(width: u32, height: u32) -> VirtualMachineBuilder {
        VirtualMachineBuilder {
            width,
            height,
            config: MachineConfig::default(),
            n_cpus_per_chip: None,
            validate: true,
        }
    }

    /// A builder sized from the configuration's own `width` and `height`.
    ///
    /// # Errors
    ///
    /// If the configuration does not determine a version and size.
    pub fn from_config(config: &MachineConfig) -> Result<VirtualMachineBuilder> {
        let version = MachineVersion::from_config(config)?;
        let (width, height) = match (config.width, config.height) {
            (Some(width), Some(height)) => (width, height),
            // from_config guarantees both or neither are set
            _ => version.board_shape(),
        };
        Ok(VirtualMachineBuilder {
            width,
            height,
            config: config.clone(),
            n_cpus_per_chip: None,
            validate: true,
        })
    }

    /// Use this configuration's faults, caps and version hints.
    #[must_use]
    pub fn with_config(mut self, config: MachineConfig) -> VirtualMachineBuilder {
        self.config = config;
        self
    }

    /// Put a fixed number of cores on every chip instead of the typical
    /// per-position counts.
    #[must_use]
    pub fn with_n_cpus_per_chip(mut self, n_cpus_per_chip: u8) -> VirtualMachineBuilder {
        self.n_cpus_per_chip = Some(n_cpus_per_chip);
        self
    }

    /// Skip the validation pass, as production use does; tests should
    /// leave it on.
    #[must_use]
    pub fn without_validation(mut self) -> VirtualMachineBuilder {
        self.validate = false;
        self
    }

    /// Build the machine.
    ///
    /// # Errors
    ///
    /// If the size does not correspond to whole boards of the version
    /// in use, a configured fault is malformed, or validation fails.
    pub fn build(self) -> Result<Machine> {
        let version = self.version()?;
        let mut machine = version.create_machine(self.width, self.height, "Virtual")?;
        let limits = version.limits(&self.config);

        // Faults with an IP address are local to a physical board and
        // cannot apply to a virtual machine.
        let unused_chips: BTreeSet<Xy> = self
            .config
            .down_chips
            .iter()
            .filter(|c| c.ip_address.is_none())
            .map(|c| (c.x, c.y))
            .collect();
        let mut unused_cores: BTreeMap<Xy, BTreeSet<u8>> = BTreeMap::new();
        for core in &self.config.down_cores {
            if core.ip_address.is_none() {
                unused_cores
                    .entry((core.x, core.y))
                    .or_default()
                    .insert(core.virtual_p()?);
            }
        }
        let mut unused_links: BTreeSet<(u32, u32, Direction)> = self
            .config
            .down_links
            .iter()
            .filter(|l| l.ip_address.is_none())
            .map(|l| (l.x, l.y, l.link))
            .collect();
        if version == MachineVersion::FourChip {
            unused_links.extend(FOUR_CHIP_DOWN_LINKS);
        }

        let ethernet_chips = version.potential_ethernet_chips(self.width, self.height);
        let mut configured_chips: BTreeMap<Xy, (Xy, u8)> = BTreeMap::new();
        for &ethernet in &ethernet_chips {
            for (xy, map_cores) in machine.get_xy_cores_by_ethernet(ethernet) {
                if unused_chips.contains(&xy) {
                    continue;
                }
                let n_cores = self
                    .n_cpus_per_chip
                    .unwrap_or_else(|| map_cores.min(limits.max_cores_per_chip));
                configured_chips.insert(xy, (ethernet, n_cores));
            }
        }
        debug!(
            "virtual machine {} x {}: {} chips over {} boards",
            self.width,
            self.height,
            configured_chips.len(),
            ethernet_chips.len()
        );

        for (&xy, &(ethernet, n_cores)) in &configured_chips {
            let mut router = Router::new();
            for direction in Direction::ALL {
                if unused_links.contains(&(xy.0, xy.1, direction)) {
                    continue;
                }
                if let Some(destination) = machine.xy_over_link(xy, direction) {
                    if configured_chips.contains_key(&destination) {
                        router.add_link(Link::new(xy, direction, destination))?;
                    }
                }
            }
            let ip_address = if xy == ethernet {
                Some(virtual_board_address(xy))
            } else {
                None
            };
            let down: Vec<u8> = unused_cores
                .get(&xy)
                .map(|cores| cores.iter().copied().collect())
                .unwrap_or_default();
            let chip = Chip::with_down_cores(
                xy.0,
                xy.1,
                n_cores,
                router,
                limits.max_sdram_per_chip,
                ethernet,
                ip_address,
                &down,
            )?;
            machine.add_chip(chip)?;
        }

        machine.add_spinnaker_links();
        machine.add_fpga_links();
        if self.validate {
            machine.validate()?;
        }
        info!("built {machine}");
        Ok(machine)
    }

    fn version(&self) -> Result<MachineVersion> {
        if self.config.version.is_some()
            || self.config.spalloc_server.is_some()
            || self.config.remote_spinnaker_url.is_some()
        {
            let version = MachineVersion::from_config(&self.config)?;
            version.verify_size(self.width, self.height)?;
            return Ok(version);
        }
        // Without configuration hints the size itself decides.
        let version = if (self.width, self.height) == (2, 2) {
            MachineVersion::FourChip
        } else {
            MachineVersion::FortyEightChip
        };
        version.verify_size(self.width, self.height)?;
        Ok(version)
    }
}

/// The IP address a virtual board pretends to have.
fn virtual_board_address(ethernet: Xy) -> Ipv4Addr {
    // Coordinates above 255 alias, as they do on real allocations.
    let x = u8::try_from(ethernet.0 % 256).unwrap_or(0);
    let y = u8::try_from(ethernet.1 % 256).unwrap_or(0);
    Ipv4Addr::new(127, 0, x, y)
}
