//! Reading and writing machines as JSON, in the layout the Java tool
//! chain consumes.
//!
//! The format keeps files small by factoring out the resources shared
//! by most chips: a `standardResources` block for ordinary chips, an
//! `ethernetResources` block for Ethernet-enabled ones, and per-chip
//! `exceptions` only where a chip differs from its block.

use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chip::Chip;
use crate::error::{Result, SpinnMachineError};
use crate::link::Link;
use crate::machine::Machine;
use crate::router::Router;
use crate::version::MachineVersion;
use spinn_board::Direction;

/// The Java tool chain holds these values in a signed 32-bit int.
const JAVA_MAX_INT: u32 = 2_147_483_647;

fn java_int(value: u32) -> u32 {
    value.min(JAVA_MAX_INT)
}

/// The resources a block of chips shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonResources {
    /// Monitor cores per chip.
    pub monitors: u8,
    /// Multicast routing entries per router.
    pub router_entries: u32,
    /// SDRAM per chip, in bytes.
    pub sdram: u32,
    /// IP tag ids per chip.
    pub tags: Vec<u8>,
}

/// The per-chip details that never match a resource block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonChipDetails {
    /// Working cores on the chip.
    pub cores: u8,
    /// Coordinates of the chip's Ethernet-enabled chip.
    pub ethernet: (u32, u32),
    /// Link directions with no working link, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dead_links: Vec<u8>,
    /// IP address, for Ethernet-enabled chips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<Ipv4Addr>,
}

/// Where one chip differs from its resource block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonChipExceptions {
    /// Monitor cores, if unusual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitors: Option<u8>,
    /// Routing entries, if unusual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_entries: Option<u32>,
    /// SDRAM, if unusual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdram: Option<u32>,
    /// Tags, if unusual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<u8>>,
}

/// One chip record: `[x, y, details]`, with exceptions when needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonChip {
    /// A chip that differs from its resource block.
    WithExceptions(u32, u32, JsonChipDetails, JsonChipExceptions),
    /// A chip fully described by its resource block.
    Plain(u32, u32, JsonChipDetails),
}

impl JsonChip {
    fn parts(&self) -> (u32, u32, &JsonChipDetails, Option<&JsonChipExceptions>) {
        match self {
            JsonChip::Plain(x, y, details) => (*x, *y, details, None),
            JsonChip::WithExceptions(x, y, details, exceptions) => {
                (*x, *y, details, Some(exceptions))
            }
        }
    }
}

/// A whole machine as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonMachine {
    /// Height of the machine in chips.
    pub height: u32,
    /// Width of the machine in chips.
    pub width: u32,
    /// The boot chip, always (0, 0).
    pub root: (u32, u32),
    /// Resources of ordinary chips.
    pub standard_resources: JsonResources,
    /// Resources of Ethernet-enabled chips.
    pub ethernet_resources: JsonResources,
    /// Every chip on the machine.
    pub chips: Vec<JsonChip>,
}

fn describe_resources(chip: &Chip) -> JsonResources {
    JsonResources {
        monitors: u8::try_from(chip.n_processors() - chip.n_user_processors()).unwrap_or(u8::MAX),
        router_entries: java_int(chip.router.n_available_multicast_entries()),
        sdram: java_int(chip.sdram),
        tags: chip.tag_ids().to_vec(),
    }
}

fn describe_chip(chip: &Chip, block: &JsonResources) -> JsonChip {
    let dead_links: Vec<u8> = Direction::ALL
        .into_iter()
        .filter(|d| !chip.router.is_link(*d))
        .map(Direction::id)
        .collect();
    let details = JsonChipDetails {
        cores: u8::try_from(chip.n_processors()).unwrap_or(u8::MAX),
        ethernet: chip.nearest_ethernet,
        dead_links,
        ip_address: chip.ip_address,
    };

    let own = describe_resources(chip);
    let mut exceptions = JsonChipExceptions::default();
    if own.monitors != block.monitors {
        exceptions.monitors = Some(own.monitors);
    }
    if own.router_entries != block.router_entries {
        exceptions.router_entries = Some(own.router_entries);
    }
    if own.sdram != block.sdram {
        exceptions.sdram = Some(own.sdram);
    }
    if own.tags != block.tags {
        exceptions.tags = Some(own.tags);
    }

    if exceptions == JsonChipExceptions::default() {
        JsonChip::Plain(chip.x, chip.y, details)
    } else {
        JsonChip::WithExceptions(chip.x, chip.y, details, exceptions)
    }
}

/// Describe a machine as JSON.
///
/// # Errors
///
/// If the machine has no boot chip to take the Ethernet resource block
/// from.
pub fn to_json(machine: &Machine) -> Result<JsonMachine> {
    let boot = machine.boot_chip().ok_or_else(|| {
        SpinnMachineError::invalid_machine("a machine without a boot chip cannot be described")
    })?;
    let ethernet_resources = describe_resources(boot);
    // Any non-Ethernet chip stands in for the rest; a single-chip
    // machine never happens, but fall back to the boot chip anyway.
    let standard_resources = machine
        .chips()
        .find(|c| c.ip_address.is_none())
        .map_or_else(|| ethernet_resources.clone(), describe_resources);

    let chips = machine
        .chips()
        .map(|chip| {
            let block = if chip.ip_address.is_some() {
                &ethernet_resources
            } else {
                &standard_resources
            };
            describe_chip(chip, block)
        })
        .collect();

    Ok(JsonMachine {
        height: machine.height(),
        width: machine.width(),
        root: (0, 0),
        standard_resources,
        ethernet_resources,
        chips,
    })
}

/// Write a machine to a JSON file. Overwrites without asking.
///
/// # Errors
///
/// On I/O failure or anything [`to_json`] rejects.
pub fn to_json_path(machine: &Machine, path: &Path) -> Result<()> {
    let json = to_json(machine)?;
    debug!("writing {machine} to {}", path.display());
    let file = std::fs::File::create(path)?;
    serde_json::to_writer(file, &json)?;
    Ok(())
}

/// Rebuild a machine from its JSON description.
///
/// # Errors
///
/// If the size fits no board version, a chip repeats, or a chip has a
/// monitor count other than one.
pub fn machine_from_json(json: &JsonMachine) -> Result<Machine> {
    let version = if (json.width, json.height) == (2, 2) {
        MachineVersion::FourChip
    } else {
        MachineVersion::FortyEightChip
    };
    let mut machine = version.create_machine(json.width, json.height, "Json")?;

    for record in &json.chips {
        let (x, y, details, exceptions) = record.parts();
        let block = if details.ip_address.is_some() {
            &json.ethernet_resources
        } else {
            &json.standard_resources
        };
        let monitors = exceptions
            .and_then(|e| e.monitors)
            .unwrap_or(block.monitors);
        if monitors != 1 {
            return Err(SpinnMachineError::invalid_parameter(
                "monitors",
                monitors.to_string(),
                "only machines with exactly one monitor per chip are supported",
            ));
        }
        let router_entries = exceptions
            .and_then(|e| e.router_entries)
            .unwrap_or(block.router_entries);
        let sdram = exceptions.and_then(|e| e.sdram).unwrap_or(block.sdram);
        let tags = exceptions
            .and_then(|e| e.tags.clone())
            .unwrap_or_else(|| block.tags.clone());

        let mut router = Router::with_entries(router_entries);
        for direction in Direction::ALL {
            if details.dead_links.contains(&direction.id()) {
                continue;
            }
            if let Some(destination) = machine.xy_over_link((x, y), direction) {
                router.add_link(Link::new((x, y), direction, destination))?;
            }
        }
        let chip = Chip::new(
            x,
            y,
            details.cores,
            router,
            sdram,
            details.ethernet,
            details.ip_address,
        )
        .with_tag_ids(tags);
        machine.add_chip(chip)?;
    }

    machine.add_spinnaker_links();
    machine.add_fpga_links();
    Ok(machine)
}

/// Read a machine from a JSON file.
///
/// # Errors
///
/// On I/O failure, malformed JSON, or anything [`machine_from_json`]
/// rejects.
pub fn machine_from_json_path(path: &Path) -> Result<Machine> {
    debug!("reading a machine from {}", path.display());
    let file = std::fs::File::open(path)?;
    let json: JsonMachine = serde_json::from_reader(file)?;
    machine_from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::virtual_machine;

    #[test]
    fn chip_records_serialize_as_arrays() {
        let details = JsonChipDetails {
            cores: 18,
            ethernet: (0, 0),
            dead_links: Vec::new(),
            ip_address: None,
        };
        let plain = JsonChip::Plain(1, 2, details.clone());
        let text = serde_json::to_string(&plain).unwrap();
        assert!(text.starts_with("[1,2,{"));

        let with = JsonChip::WithExceptions(
            1,
            2,
            details,
            JsonChipExceptions {
                sdram: Some(7),
                ..JsonChipExceptions::default()
            },
        );
        let text = serde_json::to_string(&with).unwrap();
        let back: JsonChip = serde_json::from_str(&text).unwrap();
        assert_eq!(back, with);
    }

    #[test]
    fn virtual_machine_round_trips() {
        let machine = virtual_machine(8, 8).unwrap();
        let json = to_json(&machine).unwrap();
        assert_eq!(json.width, 8);
        assert_eq!(json.chips.len(), 48);
        assert_eq!(json.ethernet_resources.tags, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(json.standard_resources.tags.is_empty());

        let back = machine_from_json(&json).unwrap();
        assert_eq!(back.n_chips(), machine.n_chips());
        assert_eq!(back.total_cores(), machine.total_cores());
        assert_eq!(
            back.chip_at((1, 1)).unwrap().n_processors(),
            machine.chip_at((1, 1)).unwrap().n_processors()
        );
        assert_eq!(
            back.boot_chip().unwrap().ip_address,
            machine.boot_chip().unwrap().ip_address
        );
        back.validate().unwrap();
    }

    #[test]
    fn dead_links_survive_the_trip() {
        let machine = virtual_machine(2, 2).unwrap();
        let json = to_json(&machine).unwrap();
        let back = machine_from_json(&json).unwrap();
        assert!(!back.is_link_at((1, 0), Direction::East));
        assert!(back.is_link_at((0, 0), Direction::East));
    }

    #[test]
    fn foreign_tag_sets_survive() {
        let machine = virtual_machine(8, 8).unwrap();
        let mut json = to_json(&machine).unwrap();
        json.ethernet_resources.tags = vec![1, 2, 3];

        let back = machine_from_json(&json).unwrap();
        assert_eq!(back.boot_chip().unwrap().tag_ids(), &[1, 2, 3]);
        assert!(back.chip_at((1, 1)).unwrap().tag_ids().is_empty());
    }

    #[test]
    fn oversized_values_clamp_to_java_int() {
        assert_eq!(java_int(123), 123);
        assert_eq!(java_int(u32::MAX), JAVA_MAX_INT);
    }
}
