//! The router of a chip, holding its working outgoing links.

use std::collections::BTreeMap;

use spinn_board::{layout, Direction};

use crate::error::{Result, SpinnMachineError};
use crate::link::Link;

/// A router on a chip: up to six outgoing [`Link`]s and a multicast
/// routing-table entry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    links: BTreeMap<Direction, Link>,
    n_available_multicast_entries: u32,
}

impl Default for Router {
    fn default() -> Router {
        Router::new()
    }
}

impl Router {
    /// A router with the standard entry budget and no links yet.
    #[must_use]
    pub fn new() -> Router {
        Router::with_entries(layout::ROUTER_AVAILABLE_ENTRIES)
    }

    /// A router with a non-standard multicast entry budget.
    #[must_use]
    pub fn with_entries(n_available_multicast_entries: u32) -> Router {
        Router {
            links: BTreeMap::new(),
            n_available_multicast_entries,
        }
    }

    /// Add an outgoing link.
    ///
    /// # Errors
    ///
    /// If a link already leaves in the same direction.
    pub fn add_link(&mut self, link: Link) -> Result<()> {
        if self.links.contains_key(&link.direction) {
            return Err(SpinnMachineError::already_exists(
                "link",
                link.to_string(),
            ));
        }
        self.links.insert(link.direction, link);
        Ok(())
    }

    /// Whether a link leaves in the given direction.
    #[must_use]
    pub fn is_link(&self, direction: Direction) -> bool {
        self.links.contains_key(&direction)
    }

    /// The link leaving in the given direction, if there is one.
    #[must_use]
    pub fn link(&self, direction: Direction) -> Option<&Link> {
        self.links.get(&direction)
    }

    /// All outgoing links, in direction order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Number of outgoing links.
    #[must_use]
    pub fn n_links(&self) -> usize {
        self.links.len()
    }

    /// Multicast routing-table entries available on this router.
    #[must_use]
    pub const fn n_available_multicast_entries(&self) -> u32 {
        self.n_available_multicast_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_links() {
        let mut router = Router::new();
        router
            .add_link(Link::new((0, 0), Direction::East, (1, 0)))
            .unwrap();
        router
            .add_link(Link::new((0, 0), Direction::North, (0, 1)))
            .unwrap();

        assert_eq!(router.n_links(), 2);
        assert!(router.is_link(Direction::East));
        assert!(!router.is_link(Direction::West));
        assert_eq!(router.link(Direction::North).unwrap().destination, (0, 1));
        assert_eq!(
            router.n_available_multicast_entries(),
            layout::ROUTER_AVAILABLE_ENTRIES
        );
    }

    #[test]
    fn duplicate_link_rejected() {
        let mut router = Router::new();
        let link = Link::new((0, 0), Direction::East, (1, 0));
        router.add_link(link).unwrap();
        assert!(matches!(
            router.add_link(link),
            Err(SpinnMachineError::AlreadyExists { .. })
        ));
    }
}
