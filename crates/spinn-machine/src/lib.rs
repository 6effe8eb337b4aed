#![deny(unsafe_code)]

//! A model of a SpiNNaker machine: chips, cores, routers and the links
//! between them.
//!
//! # Layout
//!
//! A machine is a rectangle of chips. Each chip carries up to 18 cores,
//! a router with six links, and its own SDRAM. Chips are grouped into
//! boards of 4 or 48, and one chip per board carries an Ethernet
//! connection. Machines whose dimensions are multiples of 12 wrap
//! around, so every chip has six neighbours.
//!
//! # Example
//!
//! ```
//! use spinn_machine::virtual_machine;
//!
//! # fn main() -> spinn_machine::Result<()> {
//! let machine = virtual_machine(8, 8)?;
//!
//! println!("{machine}");
//! println!("chips: {}", machine.n_chips());
//! println!("cores: {}", machine.total_cores());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod chip;
mod config;
mod core_subsets;
mod error;
mod fixed_route;
mod ignores;
pub mod json;
mod link;
mod machine;
mod processor;
mod repair;
mod router;
mod routing_entry;
mod version;
mod virtual_machine;

pub use chip::Chip;
pub use config::MachineConfig;
pub use core_subsets::{CoreSubset, CoreSubsets};
pub use error::{Result, SpinnMachineError};
pub use fixed_route::FixedRouteEntry;
pub use ignores::{IgnoreChip, IgnoreCore, IgnoreLink, TYPICAL_PHYSICAL_VIRTUAL_MAP};
pub use link::Link;
pub use machine::{FpgaLinkData, Machine, SpinnakerLinkData, Wrap, Xy};
pub use processor::Processor;
pub use repair::{machine_repair, machine_repair_with_removed};
pub use router::Router;
pub use routing_entry::{Incoming, MulticastRoutingEntry, RoutingEntry};
pub use version::{MachineVersion, VersionLimits};
pub use virtual_machine::{virtual_machine, VirtualMachineBuilder};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        virtual_machine, Chip, Machine, MachineConfig, MachineVersion, Result, Wrap, Xy,
    };
}
