//! ## Constants
//!
//! Various constants used throughout the project.
//!

pub mod usb {
    /// The vendor id shared by every ACCES I/O USB board
    pub const ACCES_VENDOR_ID: u16 = 0x1605;
}

pub mod clock {
    /// The on-board oscillator the sample clock counters divide down from
    pub const DEFAULT_ROOT_CLOCK_HZ: u32 = 10_000_000;
    /// Smallest divisor the chained counters accept
    pub const MIN_DIVISOR: u16 = 2;
    /// Largest value a 16-bit counter register can hold
    pub const MAX_DIVISOR: u16 = 0xFFFF;
}

pub mod misc {
    use std::time::Duration;

    /// The default timeout duration
    pub const DEFAULT_TIMEOUT_DURATION: Duration = Duration::from_secs(2);
}
