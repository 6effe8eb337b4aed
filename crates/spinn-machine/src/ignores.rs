//! Chips, cores and links to leave out when building a machine.
//!
//! Hardware faults are configured as strings of colon-separated entries,
//! one entry per faulty item:
//!
//! ```text
//! down_chips = <x>,<y>[,<ip>][:...]
//! down_cores = <x>,<y>,(<id>|<lo>-<hi>)[,<ip>][:...]
//! down_links = <x>,<y>,<link>[,<ip>][:...]
//! ```
//!
//! Coordinates are global, unless the optional IP address is given, in
//! which case they are local to the board with that address. A core id
//! of zero or below names a physical core, negated; the string `none`
//! (any case) means no ignores at all.

use std::net::Ipv4Addr;

use spinn_board::Direction;

use crate::error::{Result, SpinnMachineError};

/// Virtual core id typically assigned to each physical core.
///
/// The mapping on a real booted machine can differ; this is the usual
/// assignment, with physical core 10 as the monitor (virtual 0).
pub const TYPICAL_PHYSICAL_VIRTUAL_MAP: [u8; 18] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 0, 12, 13, 14, 15, 16, 17, 18,
];

fn parse_coord(parameter: &str, text: &str) -> Result<u32> {
    text.trim().parse().map_err(|_| {
        SpinnMachineError::parse_error(format!("bad {parameter} in ignore entry: {text:?}"))
    })
}

fn parse_ip(text: &str) -> Result<Ipv4Addr> {
    text.trim()
        .parse()
        .map_err(|_| SpinnMachineError::parse_error(format!("bad IP address: {text:?}")))
}

/// Split an ignore string into entries, treating `none` as empty.
fn entries(text: &str) -> Vec<&str> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("none") {
        return Vec::new();
    }
    text.split(':').collect()
}

/// Parse a core field: a single id or an inclusive `lo-hi` range.
///
/// Single ids may be zero or negative (physical cores); ranges are
/// virtual ids only.
fn parse_cores_field(text: &str) -> Result<Vec<i32>> {
    let text = text.trim();
    if let Ok(single) = text.parse::<i32>() {
        return Ok(vec![single]);
    }
    if let Some((lo, hi)) = text.split_once('-') {
        let lo: i32 = lo.trim().parse().map_err(|_| {
            SpinnMachineError::parse_error(format!("bad core range start: {text:?}"))
        })?;
        let hi: i32 = hi.trim().parse().map_err(|_| {
            SpinnMachineError::parse_error(format!("bad core range end: {text:?}"))
        })?;
        if lo < 0 || hi < lo {
            return Err(SpinnMachineError::parse_error(format!(
                "bad core range: {text:?}"
            )));
        }
        return Ok((lo..=hi).collect());
    }
    Err(SpinnMachineError::parse_error(format!(
        "bad core id: {text:?}"
    )))
}

/// A chip to leave out of the machine, typically for a router fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IgnoreChip {
    /// X coordinate (board-local when `ip_address` is set).
    pub x: u32,
    /// Y coordinate (board-local when `ip_address` is set).
    pub y: u32,
    /// Board whose coordinates `x` and `y` are local to, if any.
    pub ip_address: Option<Ipv4Addr>,
}

impl IgnoreChip {
    /// Parse one `x,y[,ip]` entry.
    fn parse_single(text: &str) -> Result<IgnoreChip> {
        let parts: Vec<&str> = text.split(',').collect();
        match parts.as_slice() {
            [x, y] => Ok(IgnoreChip {
                x: parse_coord("x", x)?,
                y: parse_coord("y", y)?,
                ip_address: None,
            }),
            [x, y, ip] => Ok(IgnoreChip {
                x: parse_coord("x", x)?,
                y: parse_coord("y", y)?,
                ip_address: Some(parse_ip(ip)?),
            }),
            _ => Err(SpinnMachineError::parse_error(format!(
                "bad down_chips entry: {text:?}"
            ))),
        }
    }

    /// Parse a whole `down_chips` string.
    ///
    /// # Errors
    ///
    /// If any entry fails the `x,y[,ip]` grammar.
    pub fn parse_string(text: &str) -> Result<Vec<IgnoreChip>> {
        entries(text).iter().map(|e| Self::parse_single(e)).collect()
    }
}

/// A core to leave out of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IgnoreCore {
    /// X coordinate (board-local when `ip_address` is set).
    pub x: u32,
    /// Y coordinate (board-local when `ip_address` is set).
    pub y: u32,
    /// Virtual core id if positive, negated physical core id otherwise.
    pub p: i32,
    /// Board whose coordinates `x` and `y` are local to, if any.
    pub ip_address: Option<Ipv4Addr>,
}

impl IgnoreCore {
    /// The virtual core id to ignore.
    ///
    /// Physical ids go through [`TYPICAL_PHYSICAL_VIRTUAL_MAP`]; the map
    /// on a real booted machine may differ.
    ///
    /// # Errors
    ///
    /// If a physical id is outside 0-17.
    pub fn virtual_p(&self) -> Result<u8> {
        if self.p > 0 {
            return u8::try_from(self.p).map_err(|_| {
                SpinnMachineError::parse_error(format!("bad core id: {}", self.p))
            });
        }
        let physical = usize::try_from(-self.p).ok().filter(|&p| p < 18);
        match physical {
            Some(p) => Ok(TYPICAL_PHYSICAL_VIRTUAL_MAP[p]),
            None => Err(SpinnMachineError::parse_error(format!(
                "no virtual core for physical core {}",
                -self.p
            ))),
        }
    }

    /// Parse one `x,y,(id|lo-hi)[,ip]` entry, one result per core.
    fn parse_single(text: &str) -> Result<Vec<IgnoreCore>> {
        let parts: Vec<&str> = text.split(',').collect();
        let (x, y, cores, ip) = match parts.as_slice() {
            [x, y, cores] => (x, y, cores, None),
            [x, y, cores, ip] => (x, y, cores, Some(parse_ip(ip)?)),
            _ => {
                return Err(SpinnMachineError::parse_error(format!(
                    "bad down_cores entry: {text:?}"
                )))
            }
        };
        let x = parse_coord("x", x)?;
        let y = parse_coord("y", y)?;
        Ok(parse_cores_field(cores)?
            .into_iter()
            .map(|p| IgnoreCore {
                x,
                y,
                p,
                ip_address: ip,
            })
            .collect())
    }

    /// Parse a whole `down_cores` string.
    ///
    /// # Errors
    ///
    /// If any entry fails the `x,y,(id|lo-hi)[,ip]` grammar.
    pub fn parse_string(text: &str) -> Result<Vec<IgnoreCore>> {
        let mut cores = Vec::new();
        for entry in entries(text) {
            cores.extend(Self::parse_single(entry)?);
        }
        Ok(cores)
    }
}

/// A link to leave out of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IgnoreLink {
    /// X coordinate (board-local when `ip_address` is set).
    pub x: u32,
    /// Y coordinate (board-local when `ip_address` is set).
    pub y: u32,
    /// Direction of the link out of the chip.
    pub link: Direction,
    /// Board whose coordinates `x` and `y` are local to, if any.
    pub ip_address: Option<Ipv4Addr>,
}

impl IgnoreLink {
    /// Parse one `x,y,link[,ip]` entry.
    fn parse_single(text: &str) -> Result<IgnoreLink> {
        let parts: Vec<&str> = text.split(',').collect();
        let (x, y, link, ip) = match parts.as_slice() {
            [x, y, link] => (x, y, link, None),
            [x, y, link, ip] => (x, y, link, Some(parse_ip(ip)?)),
            _ => {
                return Err(SpinnMachineError::parse_error(format!(
                    "bad down_links entry: {text:?}"
                )))
            }
        };
        let link_id = parse_coord("link", link)?;
        let link = u8::try_from(link_id)
            .ok()
            .and_then(Direction::from_id)
            .ok_or_else(|| {
                SpinnMachineError::parse_error(format!(
                    "bad link id in down_links entry: {text:?} (must be 0-5)"
                ))
            })?;
        Ok(IgnoreLink {
            x: parse_coord("x", x)?,
            y: parse_coord("y", y)?,
            link,
            ip_address: ip,
        })
    }

    /// Parse a whole `down_links` string.
    ///
    /// # Errors
    ///
    /// If any entry fails the `x,y,link[,ip]` grammar, or a link id is
    /// outside 0-5.
    pub fn parse_string(text: &str) -> Result<Vec<IgnoreLink>> {
        entries(text).iter().map(|e| Self::parse_single(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_empty() {
        assert!(IgnoreChip::parse_string("None").unwrap().is_empty());
        assert!(IgnoreCore::parse_string("none").unwrap().is_empty());
        assert!(IgnoreLink::parse_string("NONE").unwrap().is_empty());
        assert!(IgnoreChip::parse_string("").unwrap().is_empty());
    }

    #[test]
    fn chips_with_and_without_ip() {
        let chips = IgnoreChip::parse_string("4,7:6,5,10.11.12.13").unwrap();
        assert_eq!(chips.len(), 2);
        assert_eq!((chips[0].x, chips[0].y), (4, 7));
        assert_eq!(chips[0].ip_address, None);
        assert_eq!((chips[1].x, chips[1].y), (6, 5));
        assert_eq!(chips[1].ip_address, Some(Ipv4Addr::new(10, 11, 12, 13)));
    }

    #[test]
    fn cores_single_physical_and_range() {
        let cores = IgnoreCore::parse_string("4,7,3:6,5,-2,10.11.12.13:2,3,2-17").unwrap();
        assert_eq!(cores.len(), 2 + 16);

        assert_eq!((cores[0].x, cores[0].y, cores[0].p), (4, 7, 3));
        assert_eq!(cores[0].virtual_p().unwrap(), 3);

        assert_eq!(cores[1].p, -2);
        assert_eq!(cores[1].ip_address, Some(Ipv4Addr::new(10, 11, 12, 13)));
        // physical core 2 is typically virtual core 3
        assert_eq!(cores[1].virtual_p().unwrap(), 3);

        let range: Vec<i32> = cores[2..].iter().map(|c| c.p).collect();
        assert_eq!(range, (2..=17).collect::<Vec<_>>());
    }

    #[test]
    fn physical_monitor_maps_to_zero() {
        let cores = IgnoreCore::parse_string("0,0,-10").unwrap();
        assert_eq!(cores[0].virtual_p().unwrap(), 0);
        // physical core 0 is typically virtual core 1
        let cores = IgnoreCore::parse_string("0,0,0").unwrap();
        assert_eq!(cores[0].virtual_p().unwrap(), 1);
    }

    #[test]
    fn links_validate_direction() {
        let links = IgnoreLink::parse_string("0,0,3:1,2,5,10.11.12.13").unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].link, Direction::West);
        assert_eq!(links[1].link, Direction::South);
        assert!(IgnoreLink::parse_string("0,0,6").is_err());
    }

    #[test]
    fn malformed_entries_rejected() {
        assert!(IgnoreChip::parse_string("4").is_err());
        assert!(IgnoreCore::parse_string("4,7").is_err());
        assert!(IgnoreCore::parse_string("4,7,17-2").is_err());
        assert!(IgnoreLink::parse_string("a,b,c").is_err());
    }
}
