//! # Rust AIOUSB
//!
//! Sample clock helpers and device access for ACCES I/O USB data acquisition boards.
//!
//! The analog input boards time their conversions from a 10 MHz oscillator divided by
//! two chained 16-bit counters. [`ClockSolver`] picks the counter divisors for a
//! requested sample rate. [`AiousbClient`] finds and opens a board so that
//! board-specific code can talk to it through an explicit handle.
//!
//! ## Example
//!
//! ```rust
//! use rs_aiousb::{calculate_clocks, ClockSolver, DivisorPair};
//!
//! // 1 kHz from the default 10 MHz root clock
//! let pair = calculate_clocks(1000.0).expect("valid frequency");
//! assert_eq!(pair, DivisorPair::new(100, 100));
//!
//! // a board with a different oscillator
//! let solver = ClockSolver::with_root_clock(12_000_000).expect("non-zero root");
//! let pair = solver.solve(1000.0).expect("valid frequency");
//! assert_eq!(pair.product(), 12_000);
//! ```
//!
//! Opening a board needs the hardware:
//!
//! ```no_run
//! use rs_aiousb::AiousbClient;
//!
//! const USB_AI16_16: u16 = 0x8140;
//!
//! let board = AiousbClient::connect(USB_AI16_16).expect("failed to connect");
//! let mut buffer = [0u8; 512];
//! let read = board.read_bulk(&mut buffer).expect("failed to read samples");
//! println!("read {read} bytes");
//! ```
//!

mod clock;
mod constants;
mod counter;
mod error;
mod init;
mod types;

pub use clock::{calculate_clocks, ClockSolver};
pub use constants::clock::{DEFAULT_ROOT_CLOCK_HZ, MAX_DIVISOR, MIN_DIVISOR};
pub use constants::usb::ACCES_VENDOR_ID;
pub use counter::{start_clock, stop_clock, ClockTarget, SampleClock};
pub use error::Error;
pub use types::{BulkEndpoints, DeviceAddr, DeviceId, DeviceInfo, DivisorPair, Endpoint, Handle};

use constants::misc::DEFAULT_TIMEOUT_DURATION;
use types::{DeviceMode, Timeout};

use anyhow::Result;
use log::warn;

/// ### Device Filter
///
/// Selects which board [`AiousbClient::connect`] opens.
///
pub trait DeviceFilter {
    fn matches(&self, info: &DeviceInfo) -> bool;
}

/// ### AiousbClient
///
/// Client connected to an ACCES I/O board.
///
/// The client owns the claimed interface. Dropping it hands the interface back to the OS.
///
#[derive(Debug)]
pub struct AiousbClient {
    handle: Handle,
    info: DeviceInfo,
    mode: DeviceMode,
    timeout: Timeout,
    endpoints: BulkEndpoints,
}

impl AiousbClient {
    /// ### Devices
    ///
    /// Get a list of connected ACCES boards
    ///
    pub fn devices() -> Result<Vec<DeviceInfo>> {
        let mut context = rusb::Context::new()?;

        init::list_devices(&mut context)
    }

    /// ### Connect
    ///
    /// Open a board and claim its interface.
    ///
    /// Use `filter` argument to select the board:
    /// - `()` - first found board
    /// - `productId` (u16) - first board of that product
    /// - `(idVendor, idProduct)` or `DeviceId` - board by USB identifiers
    /// - `(bus, device)` or `DeviceAddr` - board by USB bus and device number
    /// - `DeviceInfo` - board by both USB identifiers and address
    ///
    pub fn connect(filter: impl DeviceFilter) -> Result<AiousbClient> {
        let mut context = rusb::Context::new()?;
        let (device, mut handle, info) = init::open_device(&mut context, filter)?;

        // GET THE DEVICE MODE
        // ==========
        let mut mode = init::get_device_mode(&device)?;
        init::detach_kernel_driver(&mut mode, &mut handle)?;

        // GET ENDPOINTS
        // ==========
        let endpoints = init::get_endpoints(&mode, &device)?;

        // CONFIGURE DEVICE
        // ==========
        handle.set_active_configuration(mode.config_number)?;
        handle.claim_interface(mode.interface_number)?;
        handle.set_alternate_setting(mode.interface_number, mode.setting_number)?;

        Ok(AiousbClient {
            handle: Handle::new(handle.into()),
            info,
            mode,
            timeout: Timeout::new(DEFAULT_TIMEOUT_DURATION.into()),
            endpoints,
        })
    }

    pub fn info(&self) -> DeviceInfo {
        self.info
    }

    /// ### Handle
    ///
    /// Shared handle to the opened board, for issuing board-specific control transfers.
    ///
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    pub fn endpoints(&self) -> &BulkEndpoints {
        &self.endpoints
    }

    /// ### Set Timeout
    ///
    /// Set a new timeout for transfers on this board.
    ///
    /// #### Arguments
    /// - `duration` -> the duration of the timeout
    ///
    pub fn set_timeout(&self, duration: std::time::Duration) {
        *self.timeout.borrow_mut() = duration;
    }

    pub fn timeout(&self) -> std::time::Duration {
        *self.timeout.borrow()
    }

    /// ### Read Bulk
    ///
    /// Read one bulk transfer of sample data into `buffer`.
    ///
    /// #### Returns
    /// The number of bytes read
    ///
    pub fn read_bulk(&self, buffer: &mut [u8]) -> Result<usize> {
        let endpoint = self
            .endpoints
            .bulk_in
            .as_ref()
            .ok_or(Error::BulkInEndpointNotFound)?;

        let bytes_read =
            self.handle
                .borrow()
                .read_bulk(endpoint.address, buffer, *self.timeout.borrow())?;

        Ok(bytes_read)
    }
}

impl Drop for AiousbClient {
    fn drop(&mut self) {
        let mut handle = match self.handle.try_borrow_mut() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("device handle still borrowed, interface not released");
                return;
            }
        };

        if let Err(e) = handle.release_interface(self.mode.interface_number) {
            warn!("failed to release interface {}: {}", self.mode.interface_number, e);
        }
        if self.mode.has_kernel_driver {
            if let Err(e) = handle.attach_kernel_driver(self.mode.interface_number) {
                warn!("failed to reattach kernel driver: {}", e);
            }
        }
    }
}
