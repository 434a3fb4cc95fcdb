//! ## AIOUSB Errors
//!
//! The errors used throughout the crate.
//!

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid sample frequency: {0} Hz")]
    InvalidFrequency(f64),
    #[error("root clock frequency must be non-zero")]
    InvalidRootClock,
    #[error("device not found")]
    DeviceNotFound,
    #[error("device exposes no usable interface")]
    DeviceIncompatible,
    #[error("specified interface not found")]
    InterfaceNotFound,
    #[error("specified interface setting not found")]
    InterfaceSettingNotFound,
    #[error("device has no bulk in endpoint")]
    BulkInEndpointNotFound,
}
