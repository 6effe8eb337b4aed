//! A single ARM968 core on a chip.

/// Clock speed of a standard core, in Hz.
pub const CLOCK_SPEED: u32 = 200_000_000;

/// Data tightly-coupled memory available per core, in bytes.
pub const DTCM_AVAILABLE: u32 = 1 << 16;

/// One core of a chip, with its virtual id and monitor flag.
///
/// The monitor core runs the operating system; every other core is
/// available to user applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Processor {
    id: u8,
    is_monitor: bool,
}

impl Processor {
    /// A standard application core with the given virtual id.
    #[must_use]
    pub const fn new(id: u8) -> Processor {
        Processor {
            id,
            is_monitor: false,
        }
    }

    /// A monitor core with the given virtual id.
    #[must_use]
    pub const fn monitor(id: u8) -> Processor {
        Processor {
            id,
            is_monitor: true,
        }
    }

    /// The virtual id of the core.
    #[must_use]
    pub const fn id(self) -> u8 {
        self.id
    }

    /// Whether this core runs the monitor.
    #[must_use]
    pub const fn is_monitor(self) -> bool {
        self.is_monitor
    }

    /// Clock speed in MHz.
    #[must_use]
    pub const fn clock_speed_mhz(self) -> u32 {
        CLOCK_SPEED / 1_000_000
    }

    /// Data tightly-coupled memory available to the core, in bytes.
    #[must_use]
    pub const fn dtcm_available(self) -> u32 {
        DTCM_AVAILABLE
    }

    /// CPU cycles available from the core per millisecond.
    #[must_use]
    pub const fn cpu_cycles_available(self) -> u32 {
        CLOCK_SPEED / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creating_processors() {
        let p = Processor::new(2);
        assert_eq!(p.id(), 2);
        assert!(!p.is_monitor());
        assert_eq!(p.clock_speed_mhz(), 200);
        assert_eq!(p.cpu_cycles_available(), 200_000);
        assert_eq!(p.dtcm_available(), 65_536);

        let m = Processor::monitor(0);
        assert!(m.is_monitor());
    }
}
