//! ## Types
//!
//! The different types used across the crate
//!

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rusb::{Context, DeviceHandle, Direction, TransferType};

/// ### Handle
///
/// Alias for a libusb device handle wrapped in an Rc and RefCell.
///
pub type Handle = Rc<RefCell<DeviceHandle<Context>>>;

/// ### Timeout
///
/// Alias for a duration wrapped in an Rc and RefCell.
pub type Timeout = Rc<RefCell<Duration>>;

/// ### Device Id
///
/// USB identifiers of a board.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    pub vendor_id: u16,
    pub product_id: u16,
}

/// ### Device Address
///
/// Where a board sits on the USB tree.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddr {
    pub bus: u8,
    pub device: u8,
}

/// ### Device Info
///
/// Identifiers and address of a discovered board.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub address: DeviceAddr,
}

/// ### Device Mode
///
/// A collection of the configuration, interface and interface number. Also if the interface has a kernel driver attached.
///
#[derive(Debug, Clone, Default)]
pub struct DeviceMode {
    /// The USB configuration number
    pub config_number: u8,
    /// The interface number specific to the configuration
    pub interface_number: u8,
    /// The setting number specific to the interface
    pub setting_number: u8,
    /// If the device has a kernel driver. Important for returning control to the OS (on Linux).
    pub has_kernel_driver: bool,
}

/// ### Endpoint
///
/// Properties of an endpoint.
///
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub address: u8,
    pub max_packet_size: u16,
    pub transfer_type: TransferType,
    pub direction: Direction,
}

/// ### Bulk Endpoints
///
/// The streaming endpoints of a board. Digital I/O and relay boards may have neither.
///
#[derive(Clone, Debug, Default)]
pub struct BulkEndpoints {
    /// Sample data coming from the board
    pub bulk_in: Option<Endpoint>,
    /// Data going to the board (e.g. calibration tables)
    pub bulk_out: Option<Endpoint>,
}

/// ### Divisor Pair
///
/// Two chained counter divisors. Their product divides the root clock
/// down to the sample clock.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DivisorPair {
    pub divisor_a: u16,
    pub divisor_b: u16,
}

impl DivisorPair {
    pub fn new(divisor_a: u16, divisor_b: u16) -> DivisorPair {
        DivisorPair {
            divisor_a,
            divisor_b,
        }
    }

    /// ### Product
    ///
    /// Total division applied to the root clock. Two 16-bit factors always fit in a u32.
    ///
    pub fn product(&self) -> u32 {
        self.divisor_a as u32 * self.divisor_b as u32
    }

    /// ### Actual Hz
    ///
    /// The sample rate the hardware really produces with these divisors.
    ///
    pub fn actual_hz(&self, root_clock_hz: u32) -> f64 {
        root_clock_hz as f64 / self.product() as f64
    }

    /// ### Error Hz
    ///
    /// Distance between the produced rate and the requested one.
    ///
    pub fn error_hz(&self, root_clock_hz: u32, target_hz: f64) -> f64 {
        (self.actual_hz(root_clock_hz) - target_hz).abs()
    }
}

impl From<(u16, u16)> for DivisorPair {
    fn from((divisor_a, divisor_b): (u16, u16)) -> Self {
        DivisorPair::new(divisor_a, divisor_b)
    }
}
