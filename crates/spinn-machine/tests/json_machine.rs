//! Integration tests for the JSON machine format

use spinn_board::Direction;
use spinn_machine::json::{machine_from_json_path, to_json_path};
use spinn_machine::{virtual_machine, MachineConfig, VirtualMachineBuilder};

#[test]
fn file_round_trip() {
    let machine = virtual_machine(8, 8).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("machine.json");

    to_json_path(&machine, &path).unwrap();
    let back = machine_from_json_path(&path).unwrap();

    assert_eq!(back.width(), machine.width());
    assert_eq!(back.height(), machine.height());
    assert_eq!(back.n_chips(), machine.n_chips());
    assert_eq!(back.total_cores(), machine.total_cores());
    assert_eq!(
        back.boot_ethernet_address(),
        machine.boot_ethernet_address()
    );
    back.validate().unwrap();
}

#[test]
fn faults_survive_the_trip() {
    let config = MachineConfig::parse_str(
        "[Machine]\n\
         width = 8\n\
         height = 8\n\
         down_chips = 3,3\n\
         down_cores = 1,1,5\n\
         down_links = 2,2,0\n",
    )
    .unwrap();
    let machine = VirtualMachineBuilder::from_config(&config)
        .unwrap()
        .build()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("faulty.json");
    to_json_path(&machine, &path).unwrap();
    let back = machine_from_json_path(&path).unwrap();

    assert!(!back.is_chip_at((3, 3)));
    // (1, 1) is a 17-core board position; the format records the count
    // left after the down core, not the core ids.
    assert_eq!(back.chip_at((1, 1)).unwrap().n_processors(), 16);
    assert!(!back.is_link_at((2, 2), Direction::East));
    assert_eq!(back.total_cores(), machine.total_cores());
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(machine_from_json_path(&dir.path().join("absent.json")).is_err());
}
