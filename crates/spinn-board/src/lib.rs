//! Pure model of SpiNNaker board hardware.
//!
//! This crate has **no dependencies** and **no machine state**. It is a
//! static model of the silicon and how boards tile together: the six
//! inter-chip link directions, the chip/core layout of the 4-chip and
//! 48-chip boards, and the triad geometry that places Ethernet-enabled
//! chips in a multi-board machine.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`direction`] | The six router link directions and their coordinate offsets |
//! | [`layout`] | Chip/core maps and per-chip resource constants per board type |
//! | [`geometry`] | SpiNN-5 triad tiling and hexagonal nearest-Ethernet lookup |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod direction;
pub mod geometry;
pub mod layout;

pub use direction::Direction;
pub use geometry::TriadGeometry;
