//! The six inter-chip link directions of a SpiNNaker router.
//!
//! Chips sit on a hexagonal mesh: each router has up to six links,
//! numbered 0–5 anticlockwise from East. Link `n` and link `(n + 3) % 6`
//! are opposite directions, so a healthy bidirectional connection uses
//! link `n` on one chip and link `(n + 3) % 6` on its neighbour.

/// A link direction out of a chip's router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Link 0: x + 1, y.
    East = 0,
    /// Link 1: x + 1, y + 1.
    NorthEast = 1,
    /// Link 2: x, y + 1.
    North = 2,
    /// Link 3: x - 1, y.
    West = 3,
    /// Link 4: x - 1, y - 1.
    SouthWest = 4,
    /// Link 5: x, y - 1.
    South = 5,
}

impl Direction {
    /// All six directions, in link-id order.
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::NorthEast,
        Direction::North,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
    ];

    /// Number of links per router.
    pub const COUNT: u8 = 6;

    /// The direction with the given link id, if it is in range 0–5.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Direction> {
        match id {
            0 => Some(Direction::East),
            1 => Some(Direction::NorthEast),
            2 => Some(Direction::North),
            3 => Some(Direction::West),
            4 => Some(Direction::SouthWest),
            5 => Some(Direction::South),
            _ => None,
        }
    }

    /// The link id of this direction (0–5).
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// The (dx, dy) a packet travels when it leaves over this link.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (1, 1),
            Direction::North => (0, 1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (-1, -1),
            Direction::South => (0, -1),
        }
    }

    /// The opposite direction: `(id + 3) % 6`.
    #[must_use]
    pub const fn opposite(self) -> Direction {
        match Direction::from_id((self.id() + 3) % Direction::COUNT) {
            Some(d) => d,
            // (id + 3) % 6 is always in range
            None => unreachable!(),
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_pairs() {
        assert_eq!(Direction::East.opposite(), Direction::West);
        assert_eq!(Direction::NorthEast.opposite(), Direction::SouthWest);
        assert_eq!(Direction::North.opposite(), Direction::South);
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn offsets_cancel_with_opposite() {
        for d in Direction::ALL {
            let (dx, dy) = d.offset();
            let (ox, oy) = d.opposite().offset();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn id_round_trip() {
        for id in 0..6 {
            assert_eq!(Direction::from_id(id).unwrap().id(), id);
        }
        assert_eq!(Direction::from_id(6), None);
    }
}
