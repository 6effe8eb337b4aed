//! A directional link from one chip's router to a neighbouring chip.

use spinn_board::Direction;

use crate::machine::Xy;

/// One outgoing link of a router.
///
/// Links are directional: a healthy bidirectional connection is a `Link`
/// on each of the two chips, in opposite [`Direction`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Chip the link leaves from.
    pub source: Xy,
    /// Direction the link leaves over.
    pub direction: Direction,
    /// Chip the link arrives at.
    pub destination: Xy,
}

impl Link {
    /// A link from `source` to `destination` over `direction`.
    #[must_use]
    pub const fn new(source: Xy, direction: Direction, destination: Xy) -> Link {
        Link {
            source,
            direction,
            destination,
        }
    }
}

impl core::fmt::Display for Link {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "({}, {}, {} -> {}, {})",
            self.source.0, self.source.1, self.direction, self.destination.0, self.destination.1
        )
    }
}
