//! ## Initialization
//!
//! A set of functions to help find, open and prepare a board.
//!

use crate::{
    constants::usb::ACCES_VENDOR_ID,
    error::Error,
    types::{BulkEndpoints, DeviceAddr, DeviceId, DeviceInfo, DeviceMode, Endpoint},
    DeviceFilter,
};

use anyhow::Result;
use log::{debug, info};
use rusb::{Context, Device, DeviceHandle, Direction, TransferType, UsbContext};

/// Get first found board
impl DeviceFilter for () {
    fn matches(&self, _info: &DeviceInfo) -> bool {
        true
    }
}

/// Get board by product id
impl DeviceFilter for u16 {
    fn matches(&self, info: &DeviceInfo) -> bool {
        *self == info.id.product_id
    }
}

/// Get board by USB identifiers
impl DeviceFilter for DeviceId {
    fn matches(&self, info: &DeviceInfo) -> bool {
        *self == info.id
    }
}

/// Get board by USB identifiers (idVendor, idProduct)
impl DeviceFilter for (u16, u16) {
    fn matches(&self, info: &DeviceInfo) -> bool {
        self.0 == info.id.vendor_id && self.1 == info.id.product_id
    }
}

/// Get board by USB device address
impl DeviceFilter for DeviceAddr {
    fn matches(&self, info: &DeviceInfo) -> bool {
        *self == info.address
    }
}

/// Get board by USB device address (bus, address)
impl DeviceFilter for (u8, u8) {
    fn matches(&self, info: &DeviceInfo) -> bool {
        self.0 == info.address.bus && self.1 == info.address.device
    }
}

/// Get board by both USB identifiers and address
impl DeviceFilter for DeviceInfo {
    fn matches(&self, info: &DeviceInfo) -> bool {
        self == info
    }
}

impl<T: DeviceFilter> DeviceFilter for &T {
    fn matches(&self, info: &DeviceInfo) -> bool {
        (**self).matches(info)
    }
}

fn describe<T: UsbContext>(device: &Device<T>) -> Option<DeviceInfo> {
    let device_desc = device.device_descriptor().ok()?;

    if device_desc.vendor_id() != ACCES_VENDOR_ID {
        return None;
    }

    Some(DeviceInfo {
        id: DeviceId {
            vendor_id: device_desc.vendor_id(),
            product_id: device_desc.product_id(),
        },
        address: DeviceAddr {
            bus: device.bus_number(),
            device: device.address(),
        },
    })
}

/// ### List Devices
///
/// List all ACCES boards using a libusb context.
///
pub fn list_devices<T: UsbContext>(context: &mut T) -> Result<Vec<DeviceInfo>> {
    let devices: Vec<DeviceInfo> = context.devices()?.iter().filter_map(|d| describe(&d)).collect();

    debug!("found {} ACCES board(s)", devices.len());

    Ok(devices)
}

/// ### Open Device
///
/// Open the first board accepted by `filter`.
///
pub fn open_device<T: UsbContext>(
    context: &mut T,
    filter: impl DeviceFilter,
) -> Result<(Device<T>, DeviceHandle<T>, DeviceInfo)> {
    for device in context.devices()?.iter() {
        let info = match describe(&device) {
            Some(info) if filter.matches(&info) => info,
            _ => continue,
        };

        // a board claimed by another process is skipped, not fatal
        match device.open() {
            Ok(handle) => {
                info!(
                    "opened board {:04x}:{:04x} on bus {} address {}",
                    info.id.vendor_id, info.id.product_id, info.address.bus, info.address.device
                );
                return Ok((device, handle, info));
            }
            Err(e) => debug!("could not open {:?}: {}", info, e),
        }
    }

    Err(Error::DeviceNotFound.into())
}

/// ### Get Device Mode
///
/// The boards expose a single vendor-specific interface; use the first one found.
///
pub fn get_device_mode(device: &Device<Context>) -> Result<DeviceMode> {
    let device_desc = device.device_descriptor()?;

    for n in 0..device_desc.num_configurations() {
        let config_desc = device.config_descriptor(n)?;

        if let Some(interface_desc) = config_desc
            .interfaces()
            .flat_map(|interface| interface.descriptors())
            .next()
        {
            return Ok(DeviceMode {
                config_number: config_desc.number(),
                interface_number: interface_desc.interface_number(),
                setting_number: interface_desc.setting_number(),
                has_kernel_driver: false,
            });
        }
    }

    Err(Error::DeviceIncompatible.into())
}

/// ### Detach Kernel Driver
///
/// If the interface uses a kernel driver, detach it for the duration of the program.
///
pub fn detach_kernel_driver(
    mode: &mut DeviceMode,
    handle: &mut DeviceHandle<Context>,
) -> Result<()> {
    mode.has_kernel_driver = match handle.kernel_driver_active(mode.interface_number) {
        Ok(true) => {
            handle.detach_kernel_driver(mode.interface_number)?;
            true
        }
        _ => false,
    };

    Ok(())
}

/// ### Get Endpoints
///
/// Find the bulk endpoints of the interface selected by `mode`.
///
pub fn get_endpoints(mode: &DeviceMode, device: &Device<Context>) -> Result<BulkEndpoints> {
    let config_desc = device.config_descriptor(mode.config_number.saturating_sub(1))?;

    let interface = config_desc
        .interfaces()
        .find(|inter| inter.number() == mode.interface_number)
        .ok_or(Error::InterfaceNotFound)?;
    let interface_desc = interface
        .descriptors()
        .find(|d| d.setting_number() == mode.setting_number)
        .ok_or(Error::InterfaceSettingNotFound)?;

    let endpoints: Vec<Endpoint> = interface_desc
        .endpoint_descriptors()
        .map(|ep| Endpoint {
            address: ep.address(),
            max_packet_size: ep.max_packet_size(),
            transfer_type: ep.transfer_type(),
            direction: ep.direction(),
        })
        .collect();

    Ok(select_bulk_endpoints(&endpoints))
}

fn select_bulk_endpoints(endpoints: &[Endpoint]) -> BulkEndpoints {
    let first_bulk = |direction: Direction| {
        endpoints
            .iter()
            .find(|ep| ep.transfer_type == TransferType::Bulk && ep.direction == direction)
            .cloned()
    };

    BulkEndpoints {
        bulk_in: first_bulk(Direction::In),
        bulk_out: first_bulk(Direction::Out),
    }
}
