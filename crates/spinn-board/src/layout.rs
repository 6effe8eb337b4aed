//! Chip/core layouts and per-chip resource constants for SpiNN-1 boards.
//!
//! Two board types exist:
//!
//! - the **4-chip board** (versions 2 and 3): a 2×2 grid, 18 cores
//!   everywhere, exactly one board per machine;
//! - the **48-chip board** (versions 4 and 5): a hexagonal cut of an 8×8
//!   grid. The million-core machine was built with the 17-core chips in
//!   the same positions on nearly every board, so the layout records the
//!   typical core count per position.

/// Local (x, y) position on a board, relative to its Ethernet chip.
pub type LocalXy = (u32, u32);

/// Maximum cores on any SpiNN-1 chip, monitor included.
pub const MAX_CORES_PER_CHIP: u8 = 18;

/// Cores per chip reserved for the monitor.
pub const MONITOR_CORES: u8 = 1;

/// Multicast routing-table entries available per router.
pub const ROUTER_AVAILABLE_ENTRIES: u32 = 1023;

/// SDRAM per chip in bytes, as reported by a booted SpiNN-1 board.
pub const SDRAM_PER_CHIP: u32 = 123_469_792;

/// Width and height of a 48-chip board's bounding box.
pub const BOARD_48_SHAPE: (u32, u32) = (8, 8);

/// Width and height of a 4-chip board.
pub const BOARD_4_SHAPE: (u32, u32) = (2, 2);

/// Chip positions and typical core counts for a 4-chip board.
pub const CHIP_CORE_MAP_4: [(LocalXy, u8); 4] =
    [((0, 0), 18), ((0, 1), 18), ((1, 0), 18), ((1, 1), 18)];

/// Chip positions and typical core counts for a 48-chip board.
///
/// The missing corners of the 8×8 grid are the hexagonal cut; the eight
/// 17-core positions match the chips used in the million-core machine.
pub const CHIP_CORE_MAP_48: [(LocalXy, u8); 48] = [
    ((0, 0), 18), ((0, 1), 18), ((0, 2), 18), ((0, 3), 18),
    ((1, 0), 18), ((1, 1), 17), ((1, 2), 18), ((1, 3), 17), ((1, 4), 18),
    ((2, 0), 18), ((2, 1), 18), ((2, 2), 18), ((2, 3), 18), ((2, 4), 18),
    ((2, 5), 18),
    ((3, 0), 18), ((3, 1), 17), ((3, 2), 18), ((3, 3), 17), ((3, 4), 18),
    ((3, 5), 17), ((3, 6), 18),
    ((4, 0), 18), ((4, 1), 18), ((4, 2), 18), ((4, 3), 18), ((4, 4), 18),
    ((4, 5), 18), ((4, 6), 18), ((4, 7), 18),
    ((5, 1), 18), ((5, 2), 17), ((5, 3), 18), ((5, 4), 17), ((5, 5), 18),
    ((5, 6), 17), ((5, 7), 18),
    ((6, 2), 18), ((6, 3), 18), ((6, 4), 18), ((6, 5), 18), ((6, 6), 18),
    ((6, 7), 18),
    ((7, 3), 18), ((7, 4), 18), ((7, 5), 18), ((7, 6), 18), ((7, 7), 18),
];

/// Typical core count at a local board position, `None` off the board.
#[must_use]
pub fn cores_at_48(local: LocalXy) -> Option<u8> {
    CHIP_CORE_MAP_48
        .iter()
        .find(|(xy, _)| *xy == local)
        .map(|&(_, n)| n)
}

/// Total user cores on a fully working board of the given map.
#[must_use]
pub fn user_cores(map: &[(LocalXy, u8)]) -> u32 {
    map.iter()
        .map(|&(_, n)| u32::from(n - MONITOR_CORES))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_48_has_48_chips() {
        assert_eq!(CHIP_CORE_MAP_48.len(), 48);
        // 8 positions carry 17 cores, the rest 18
        let seventeens = CHIP_CORE_MAP_48.iter().filter(|&&(_, n)| n == 17).count();
        assert_eq!(seventeens, 8);
        let total: u32 = CHIP_CORE_MAP_48.iter().map(|&(_, n)| u32::from(n)).sum();
        assert_eq!(total, 856);
    }

    #[test]
    fn hexagonal_cut_excludes_corners() {
        assert_eq!(cores_at_48((0, 4)), None);
        assert_eq!(cores_at_48((7, 0)), None);
        assert_eq!(cores_at_48((0, 0)), Some(18));
        assert_eq!(cores_at_48((1, 1)), Some(17));
    }

    #[test]
    fn user_core_totals() {
        assert_eq!(user_cores(&CHIP_CORE_MAP_4), 4 * 17);
        assert_eq!(user_cores(&CHIP_CORE_MAP_48), 856 - 48);
    }
}
