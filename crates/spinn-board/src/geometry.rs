//! Triad geometry: how SpiNN-5 boards tile into a machine.
//!
//! Three 48-chip boards interlock into a 12×12 "triad" with
//! Ethernet-enabled chips at (0,0), (4,8) and (8,4). A machine is a
//! rectangle of triads (possibly plus a part row/column), and every chip
//! belongs to the board whose nominal hexagon centre is nearest under the
//! hexagonal metric.

use std::sync::OnceLock;

/// Global (x, y) chip coordinates.
pub type Xy = (u32, u32);

/// Geometry of a triad of boards.
///
/// The standard SpiNN-5 arrangement comes from [`TriadGeometry::spinn5`];
/// the constructor is exposed so tests can build degenerate tilings.
#[derive(Debug, Clone)]
pub struct TriadGeometry {
    triad_width: u32,
    triad_height: u32,
    board_width: u32,
    board_height: u32,
    roots: Vec<Xy>,
    /// Indexed `[y][x]`: offset of chip (x, y) from its board's Ethernet chip.
    ethernet_offset: Vec<Vec<(i32, i32)>>,
}

static SPINN5: OnceLock<TriadGeometry> = OnceLock::new();

impl TriadGeometry {
    /// The geometry of a SpiNN-5 arrangement of boards.
    pub fn spinn5() -> &'static TriadGeometry {
        // The centre is slightly offset to force which edges belong where.
        SPINN5.get_or_init(|| {
            TriadGeometry::new(12, 12, 8, 8, &[(0, 0), (4, 8), (8, 4)], (3.6, 3.4))
        })
    }

    /// Build a geometry from a triad size, board size, Ethernet roots and
    /// the offset of the nominal hexagon centre from each Ethernet chip.
    #[must_use]
    pub fn new(
        triad_width: u32,
        triad_height: u32,
        board_width: u32,
        board_height: u32,
        roots: &[Xy],
        centre: (f64, f64),
    ) -> TriadGeometry {
        // Copy the Ethernet locations to the surrounding triads so the
        // nearest-centre search never has to reason about wrap-around.
        let tw = triad_width as i32;
        let th = triad_height as i32;
        let extended: Vec<(i32, i32)> = roots
            .iter()
            .flat_map(|&(x, y)| {
                [-tw, 0, tw].into_iter().flat_map(move |x1| {
                    [-th, 0, th]
                        .into_iter()
                        .map(move |y1| (x as i32 + x1, y as i32 + y1))
                })
            })
            .collect();

        let ethernet_offset = (0..th)
            .map(|y| {
                (0..tw)
                    .map(|x| {
                        let (ex, ey) = nearest_ethernet((x, y), &extended, centre);
                        (x - ex, y - ey)
                    })
                    .collect()
            })
            .collect();

        TriadGeometry {
            triad_width,
            triad_height,
            board_width,
            board_height,
            roots: roots.to_vec(),
            ethernet_offset,
        }
    }

    /// Coordinates of a chip relative to its board's Ethernet chip.
    ///
    /// `root` is the boot chip, normally (0, 0).
    #[must_use]
    pub fn local_chip_coordinate(&self, x: u32, y: u32, root: Xy) -> (i32, i32) {
        let dx = (x as i32 - root.0 as i32).rem_euclid(self.triad_width as i32);
        let dy = (y as i32 - root.1 as i32).rem_euclid(self.triad_height as i32);
        self.ethernet_offset[dy as usize][dx as usize]
    }

    /// Coordinates of a chip's Ethernet chip in a `width` × `height`
    /// machine, handling wrap-around.
    ///
    /// The Ethernet chip this names may not actually be working; callers
    /// that care should interrogate the machine itself.
    #[must_use]
    pub fn ethernet_chip_coordinates(&self, x: u32, y: u32, width: u32, height: u32) -> Xy {
        let (dx, dy) = self.local_chip_coordinate(x, y, (0, 0));
        let ex = (x as i32 - dx).rem_euclid(width as i32);
        let ey = (y as i32 - dy).rem_euclid(height as i32);
        (ex as u32, ey as u32)
    }

    /// The chips that would be Ethernet-enabled in a `width` × `height`
    /// machine built from whole boards.
    #[must_use]
    pub fn potential_ethernet_chips(&self, width: u32, height: u32) -> Vec<Xy> {
        let eth_width = if width % self.triad_width == 0 {
            width as i64
        } else {
            width as i64 - self.board_width as i64 + 1
        };
        let eth_height = if height % self.triad_height == 0 {
            height as i64
        } else {
            height as i64 - self.board_height as i64 + 1
        };
        // Single boards (8x8, 2x2) have exactly one Ethernet chip.
        if eth_width <= 0 || eth_height <= 0 {
            return vec![(0, 0)];
        }
        let mut chips = Vec::new();
        for &(start_x, start_y) in &self.roots {
            for y in (start_y..eth_height as u32).step_by(self.triad_height as usize) {
                for x in (start_x..eth_width as u32).step_by(self.triad_width as usize) {
                    chips.push((x, y));
                }
            }
        }
        chips
    }
}

/// Hexagonal metric distance of a chip from a board's hexagon centre.
///
/// Max of the magnitudes of the dot products with the hexagon side
/// normals (1,0), (0,1) and (1,-1); signs do not matter under abs().
fn hex_metric(x: i32, y: i32, centre: (f64, f64)) -> f64 {
    let dx = f64::from(x) - centre.0;
    let dy = f64::from(y) - centre.1;
    dx.abs().max(dy.abs()).max((dx - dy).abs())
}

fn nearest_ethernet(xy: (i32, i32), roots: &[(i32, i32)], centre: (f64, f64)) -> (i32, i32) {
    let (x, y) = xy;
    let (cx, cy) = centre;
    let mut best = roots[0];
    let mut best_d = f64::INFINITY;
    for &(rx, ry) in roots {
        let d = hex_metric(x, y, (f64::from(rx) + cx, f64::from(ry) + cy));
        if d < best_d {
            best_d = d;
            best = (rx, ry);
        }
    }
    best
}
