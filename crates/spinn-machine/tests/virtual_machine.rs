//! Integration tests for virtual machine construction

use spinn_machine::{
    machine_repair, virtual_machine, Chip, MachineConfig, MachineVersion, VirtualMachineBuilder,
    Wrap,
};

#[test]
fn four_chip_board() {
    let machine = virtual_machine(2, 2).unwrap();
    assert_eq!(machine.version(), MachineVersion::FourChip);
    assert_eq!(machine.wrap(), Wrap::Both);
    assert_eq!(machine.n_chips(), 4);
    let ethernets: Vec<_> = machine.ethernet_connected_chips().map(Chip::xy).collect();
    assert_eq!(ethernets, vec![(0, 0)]);
    assert_eq!(
        machine.boot_chip().unwrap().ip_address.unwrap().to_string(),
        "127.0.0.0"
    );
    // The board has eight permanently dead links toward its east edge.
    let (_, links) = machine.get_cores_and_link_count();
    assert_eq!(links, 8);
    machine.validate().unwrap();
}

#[test]
fn single_48_chip_board() {
    let machine = virtual_machine(8, 8).unwrap();
    assert_eq!(machine.version(), MachineVersion::FortyEightChip);
    assert_eq!(machine.wrap(), Wrap::None);
    assert_eq!(machine.n_chips(), 48);
    assert_eq!(machine.total_cores(), 856);
    assert_eq!(machine.total_available_user_cores(), 856 - 48);
    assert_eq!(machine.spinnaker_links().len(), 1);
    assert_eq!(machine.fpga_links().len(), 48);
    machine.validate().unwrap();
}

#[test]
fn three_board_torus() {
    let machine = virtual_machine(12, 12).unwrap();
    assert_eq!(machine.wrap(), Wrap::Both);
    assert_eq!(machine.n_chips(), 144);
    assert_eq!(machine.ethernet_connected_chips().count(), 3);
    // Every chip on a torus has all six links.
    let (cores, links) = machine.get_cores_and_link_count();
    assert_eq!(cores, 856 * 3);
    assert_eq!(links, 144 * 6 / 2);
    machine.validate().unwrap();
}

#[test]
fn down_chips_from_config() {
    let config = MachineConfig::parse_str(
        "[Machine]\n\
         width = 8\n\
         height = 8\n\
         down_chips = 3,3\n",
    )
    .unwrap();
    let machine = VirtualMachineBuilder::from_config(&config)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(machine.n_chips(), 47);
    assert!(!machine.is_chip_at((3, 3)));
    machine.validate().unwrap();
}

#[test]
fn down_cores_from_config() {
    let config = MachineConfig::parse_str(
        "[Machine]\n\
         width = 8\n\
         height = 8\n\
         down_cores = 1,1,5:2,2,-9\n",
    )
    .unwrap();
    let machine = VirtualMachineBuilder::from_config(&config)
        .unwrap()
        .build()
        .unwrap();
    let plain = virtual_machine(8, 8).unwrap();
    assert_eq!(machine.total_cores(), plain.total_cores() - 2);
    assert!(!machine.chip_at((1, 1)).unwrap().is_processor_with_id(5));
    // Physical core -9 maps to virtual core 10 on a typical board.
    assert!(!machine.chip_at((2, 2)).unwrap().is_processor_with_id(10));
}

#[test]
fn down_links_from_config() {
    let config = MachineConfig::parse_str(
        "[Machine]\n\
         width = 12\n\
         height = 12\n\
         down_links = 2,2,0\n",
    )
    .unwrap();
    let machine = VirtualMachineBuilder::from_config(&config)
        .unwrap()
        .build()
        .unwrap();
    assert!(!machine.is_link_at((2, 2), spinn_board::Direction::East));
    assert!(machine.is_link_at((2, 2), spinn_board::Direction::North));
}

#[test]
fn repair_removes_one_way_links() {
    let config = MachineConfig::parse_str(
        "[Machine]\n\
         width = 12\n\
         height = 12\n\
         down_links = 0,0,0\n",
    )
    .unwrap();
    let machine = VirtualMachineBuilder::from_config(&config)
        .unwrap()
        .build()
        .unwrap();
    // (1, 0) still points west at (0, 0); repair trims it.
    assert!(machine_repair(machine.clone(), false).is_err());
    let fixed = machine_repair(machine, true).unwrap();
    assert!(!fixed.is_link_at((1, 0), spinn_board::Direction::West));
    assert!(fixed.one_way_links().is_empty());
    fixed.validate().unwrap();
}

#[test]
fn capped_cores_per_chip() {
    let machine = VirtualMachineBuilder::new(8, 8)
        .with_n_cpus_per_chip(10)
        .build()
        .unwrap();
    assert_eq!(machine.total_cores(), 48 * 10);
}

#[test]
fn board_link_lookup() {
    let machine = virtual_machine(8, 8).unwrap();

    // No address means the boot board.
    let link = machine.spinnaker_link(None, 0).unwrap();
    assert_eq!(link.xy, (0, 0));
    assert_eq!(link.direction, spinn_board::Direction::SouthWest);
    assert_eq!(link.board_address, machine.boot_ethernet_address());
    assert!(machine.spinnaker_link_at((0, 0), 0).is_some());
    assert!(machine.spinnaker_link(None, 1).is_none());

    let fpga = machine.fpga_link(None, 0, 15).unwrap();
    assert_eq!(fpga.xy, (0, 0));
    assert_eq!(fpga.direction, spinn_board::Direction::South);

    // Lookup by the address of a non-boot board.
    let big = virtual_machine(16, 16).unwrap();
    let address = big.chip_at((4, 8)).unwrap().ip_address;
    assert!(address.is_some());
    let link = big.spinnaker_link(address, 0).unwrap();
    assert_eq!(link.xy, (4, 8));
    assert_eq!(link.board_address, address);
}
