//! Common error types for HAL operations

use core::fmt;

/// HAL operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Invalid parameter provided
    InvalidParameter,
    /// Operation not supported by this implementation
    NotSupported,
    /// Peripheral is busy
    Busy,
    /// Operation timed out
    Timeout,
    /// Hardware error occurred
    HardwareError,
    /// Configuration error
    ConfigurationError,
    /// Peripheral used before its initialization completed
    NotInitialized,
    /// CAN controller entered bus-off, transmission disabled
    BusOff,
    /// Vendor-specific error code
    VendorError(i32),
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::Busy => write!(f, "peripheral busy"),
            Self::Timeout => write!(f, "operation timeout"),
            Self::HardwareError => write!(f, "hardware error"),
            Self::ConfigurationError => write!(f, "configuration error"),
            Self::NotInitialized => write!(f, "peripheral not initialized"),
            Self::BusOff => write!(f, "controller is bus-off"),
            Self::VendorError(code) => write!(f, "vendor error code: {}", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

#[cfg(feature = "defmt")]
impl defmt::Format for HalError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidParameter => defmt::write!(fmt, "InvalidParameter"),
            Self::NotSupported => defmt::write!(fmt, "NotSupported"),
            Self::Busy => defmt::write!(fmt, "Busy"),
            Self::Timeout => defmt::write!(fmt, "Timeout"),
            Self::HardwareError => defmt::write!(fmt, "HardwareError"),
            Self::ConfigurationError => defmt::write!(fmt, "ConfigurationError"),
            Self::NotInitialized => defmt::write!(fmt, "NotInitialized"),
            Self::BusOff => defmt::write!(fmt, "BusOff"),
            Self::VendorError(code) => defmt::write!(fmt, "VendorError({})", code),
        }
    }
}

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;
