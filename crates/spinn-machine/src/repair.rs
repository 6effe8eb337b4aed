//! Repairing machines whose faults leave chips isolated or links
//! one-way.

use std::collections::{BTreeMap, BTreeSet};

use spinn_board::Direction;
use tracing::{error, warn};

use crate::chip::Chip;
use crate::error::{Result, SpinnMachineError};
use crate::machine::{Machine, Xy};
use crate::router::Router;

/// Remove chips that cannot reach or be reached by their board
/// neighbours, and links whose reverse direction is missing.
///
/// With `repair` set each problem is logged as a warning and repaired,
/// iterating until the machine is clean; without it any problem is an
/// error, since a silently-broken machine fails algorithms much later
/// in confusing ways.
///
/// # Errors
///
/// If `repair` is unset and the machine needs repairs.
pub fn machine_repair(machine: Machine, repair: bool) -> Result<Machine> {
    machine_repair_with_removed(machine, repair, &[])
}

/// As [`machine_repair`], with a list of chips already known to have
/// been removed while the machine was built. One-way links into those
/// chips are expected, so they are repaired without logging even when
/// `repair` is unset.
///
/// # Errors
///
/// If `repair` is unset and an unexpected repair is needed.
pub fn machine_repair_with_removed(
    machine: Machine,
    repair: bool,
    removed_chips: &[Xy],
) -> Result<Machine> {
    let mut dead_chips: BTreeSet<Xy> = BTreeSet::new();
    let mut dead_links: BTreeSet<(Xy, Direction)> = BTreeSet::new();
    let mut problems = String::new();

    for xy in machine.unreachable_incoming_local_chips() {
        let message = bad_chip_message(&machine, xy, "unreachable incoming chips");
        if repair {
            warn!("{message}");
            dead_chips.insert(xy);
        } else {
            error!("{message}");
            problems.push_str(&message);
        }
    }
    for xy in machine.unreachable_outgoing_local_chips() {
        let message = bad_chip_message(&machine, xy, "unreachable outgoing chips");
        if repair {
            warn!("{message}");
            dead_chips.insert(xy);
        } else {
            error!("{message}");
            problems.push_str(&message);
        }
    }
    for (source, out, back) in machine.one_way_links() {
        let destination = machine.xy_over_link(source, out);
        if destination.is_some_and(|xy| removed_chips.contains(&xy)) {
            dead_links.insert((source, out));
            continue;
        }
        let message = one_way_link_message(&machine, source, out, back);
        if repair {
            warn!("{message}");
            dead_links.insert((source, out));
        } else {
            error!("{message}");
            problems.push_str(&message);
        }
    }

    if !repair && !problems.is_empty() {
        return Err(SpinnMachineError::invalid_machine(problems));
    }
    if dead_chips.is_empty() && dead_links.is_empty() {
        return Ok(machine);
    }
    let repaired = rebuild_without(&machine, &dead_chips, &dead_links)?;
    // Removing a chip or link can isolate another; iterate until clean.
    machine_repair(repaired, repair)
}

/// A near copy of the machine without the dead chips and links.
///
/// SpiNNaker and FPGA links are recomputed, so removing a wrap-around
/// link can create an extra one.
fn rebuild_without(
    original: &Machine,
    dead_chips: &BTreeSet<Xy>,
    dead_links: &BTreeSet<(Xy, Direction)>,
) -> Result<Machine> {
    let mut machine =
        original
            .version()
            .create_machine(original.width(), original.height(), "Fixed")?;
    let mut removed_directions: BTreeMap<Xy, BTreeSet<Direction>> = BTreeMap::new();
    for &(xy, direction) in dead_links {
        removed_directions.entry(xy).or_default().insert(direction);
    }
    for chip in original.chips() {
        if dead_chips.contains(&chip.xy()) {
            continue;
        }
        let mut chip = chip.clone();
        if let Some(directions) = removed_directions.get(&chip.xy()) {
            let mut router = Router::with_entries(chip.router.n_available_multicast_entries());
            for link in chip.router.links() {
                if !directions.contains(&link.direction) {
                    router.add_link(*link)?;
                }
            }
            chip.router = router;
        }
        machine.add_chip(chip)?;
    }
    machine.add_spinnaker_links();
    machine.add_fpga_links();
    machine.validate()?;
    Ok(machine)
}

fn bad_chip_message(machine: &Machine, xy: Xy, issue: &str) -> String {
    let (local, board) = locate(machine, xy);
    format!(
        "the machine has {issue} at {local} on board {board}, \
         which will cause algorithms to fail\n"
    )
}

fn one_way_link_message(machine: &Machine, source: Xy, out: Direction, back: Direction) -> String {
    let destination = machine.xy_over_link(source, out);
    let (local, board) = locate(machine, source);
    match destination {
        Some(dest) if machine.is_chip_at(dest) => format!(
            "link {out} from chip {}, {} to chip {}, {} exists, but the {back} \
             link back does not (source is chip {local} on board {board})\n",
            source.0, source.1, dest.0, dest.1
        ),
        _ => format!(
            "link {out} from chip {}, {} leads to a dead chip \
             (source is chip {local} on board {board})\n",
            source.0, source.1
        ),
    }
}

fn locate(machine: &Machine, xy: Xy) -> (String, String) {
    let Some(chip) = machine.chip_at(xy) else {
        return (format!("{}, {}", xy.0, xy.1), "unknown".to_string());
    };
    let local = machine
        .get_local_xy(chip)
        .map_or_else(|| "?, ?".to_string(), |(x, y)| format!("{x}, {y}"));
    let board = machine
        .chip_at(chip.nearest_ethernet)
        .and_then(|c| c.ip_address)
        .map_or_else(|| "unknown".to_string(), |ip| ip.to_string());
    (local, board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;
    use crate::ignores::IgnoreLink;
    use crate::virtual_machine::VirtualMachineBuilder;

    fn machine_with_one_way_link() -> Machine {
        // Down link 0 out of (0, 0) removes East but leaves the West
        // link back from (1, 0) in place.
        let mut config = MachineConfig::default();
        config.down_links = IgnoreLink::parse_string("0,0,0").unwrap();
        VirtualMachineBuilder::new(8, 8)
            .with_config(config)
            .build()
            .unwrap()
    }

    #[test]
    fn clean_machine_returned_untouched() {
        let machine = crate::virtual_machine::virtual_machine(8, 8).unwrap();
        let chips = machine.n_chips();
        let repaired = machine_repair(machine, false).unwrap();
        assert_eq!(repaired.n_chips(), chips);
    }

    #[test]
    fn one_way_link_is_an_error_without_repair() {
        let machine = machine_with_one_way_link();
        assert!(machine_repair(machine, false).is_err());
    }

    #[test]
    fn one_way_link_repaired() {
        let machine = machine_with_one_way_link();
        assert!(!machine.one_way_links().is_empty());
        let repaired = machine_repair(machine, true).unwrap();
        assert!(repaired.one_way_links().is_empty());
        assert_eq!(repaired.n_chips(), 48);
        assert!(!repaired.is_link_at((1, 0), Direction::West));
    }

    #[test]
    fn expected_removals_not_errors() {
        let machine = machine_with_one_way_link();
        // the one-way link points at (0, 0), not (2, 2)
        let result = machine_repair_with_removed(machine, false, &[(2, 2)]);
        assert!(result.is_err());

        let machine = machine_with_one_way_link();
        let repaired = machine_repair_with_removed(machine, false, &[(0, 0)]).unwrap();
        assert!(repaired.one_way_links().is_empty());
    }
}
