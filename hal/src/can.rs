//! CAN FD controller abstraction
//!
//! Models a message-RAM style controller (M_CAN and similar): the driver owns
//! an opaque context created by [`CanFdController::init`], outbound frames are
//! copied into numbered transmit buffers, and received frames are handed to a
//! [`RxCallback`] from inside the controller's interrupt dispatch routine.

use heapless::Vec;

use crate::error::{HalError, HalResult};

/// Largest payload a CAN FD frame can carry.
pub const MAX_FD_PAYLOAD: usize = 64;

/// Largest payload of a classic CAN frame.
pub const MAX_CLASSIC_PAYLOAD: usize = 8;

/// Highest 11-bit standard identifier.
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Highest 29-bit extended identifier.
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Controller channel index within one CAN FD block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub u8);

/// Remote transmission request indicator of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameKind {
    /// Frame carries payload bytes
    Data,
    /// Frame requests data from another node and carries none
    Remote,
}

/// Converts a 4-bit data length code into a byte count.
///
/// Codes above 15 are masked to their low nibble, as the hardware field is
/// four bits wide.
pub const fn dlc_to_len(dlc: u8) -> usize {
    match dlc & 0x0F {
        code @ 0..=8 => code as usize,
        9 => 12,
        10 => 16,
        11 => 20,
        12 => 24,
        13 => 32,
        14 => 48,
        _ => 64,
    }
}

/// Converts a byte count into the data length code that encodes it exactly.
pub const fn len_to_dlc(len: usize) -> Option<u8> {
    match len {
        0..=8 => Some(len as u8),
        12 => Some(9),
        16 => Some(10),
        20 => Some(11),
        24 => Some(12),
        32 => Some(13),
        48 => Some(14),
        64 => Some(15),
        _ => None,
    }
}

/// View of one hardware receive element (FIFO slot).
///
/// The data area borrows controller-owned message RAM and is only valid for
/// the duration of the [`RxCallback`] invocation that received it.
#[derive(Debug, Clone, Copy)]
pub struct RxRecord<'a> {
    /// Frame identifier
    pub id: u32,
    /// Identifier uses the 29-bit extended format
    pub extended: bool,
    /// Data or remote frame
    pub kind: FrameKind,
    /// Raw data length code
    pub dlc: u8,
    /// Frame was received in FD format
    pub fd_format: bool,
    /// Data phase used the switched bit rate
    pub bit_rate_switch: bool,
    /// Element data area; at least as long as the element size configured
    pub data: &'a [u8],
}

impl RxRecord<'_> {
    /// Payload length in bytes announced by the DLC.
    pub const fn len(&self) -> usize {
        dlc_to_len(self.dlc)
    }

    /// True when the DLC announces no payload.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outbound transmit buffer descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxFrame {
    pub id: u32,
    pub extended: bool,
    pub kind: FrameKind,
    pub fd_format: bool,
    pub bit_rate_switch: bool,
    pub data: Vec<u8, MAX_FD_PAYLOAD>,
}

impl TxFrame {
    /// Data length code for the payload, if its length is encodable.
    pub fn dlc(&self) -> Option<u8> {
        len_to_dlc(self.data.len())
    }

    /// Checks identifier range, payload encodability and format flags.
    pub fn validate(&self) -> HalResult<()> {
        let max_id = if self.extended {
            MAX_EXTENDED_ID
        } else {
            MAX_STANDARD_ID
        };
        if self.id > max_id {
            return Err(HalError::InvalidParameter);
        }
        if self.dlc().is_none() {
            return Err(HalError::InvalidParameter);
        }
        if !self.fd_format && (self.data.len() > MAX_CLASSIC_PAYLOAD || self.bit_rate_switch) {
            return Err(HalError::InvalidParameter);
        }
        if self.fd_format && self.kind == FrameKind::Remote {
            // FD frames have no remote form
            return Err(HalError::InvalidParameter);
        }
        Ok(())
    }
}

/// Static channel configuration handed to [`CanFdController::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanFdConfig {
    /// Arbitration phase bit rate in bit/s
    pub nominal_bitrate: u32,
    /// Data phase bit rate in bit/s
    pub data_bitrate: u32,
    /// Accept and transmit FD format frames
    pub fd_enabled: bool,
    /// Use the data bit rate during the data phase
    pub bit_rate_switch: bool,
    /// Bytes reserved per receive FIFO element
    pub rx_element_size: usize,
    /// Number of dedicated transmit buffers
    pub tx_buffer_count: u8,
}

impl Default for CanFdConfig {
    fn default() -> Self {
        Self {
            nominal_bitrate: 500_000,
            data_bitrate: 2_000_000,
            fd_enabled: true,
            bit_rate_switch: true,
            rx_element_size: MAX_CLASSIC_PAYLOAD,
            tx_buffer_count: 1,
        }
    }
}

impl CanFdConfig {
    /// Checks that the configuration describes a programmable channel.
    pub fn validate(&self) -> HalResult<()> {
        if self.nominal_bitrate == 0 || self.data_bitrate == 0 {
            return Err(HalError::ConfigurationError);
        }
        if self.bit_rate_switch && !self.fd_enabled {
            return Err(HalError::ConfigurationError);
        }
        if len_to_dlc(self.rx_element_size).is_none() || self.rx_element_size < MAX_CLASSIC_PAYLOAD {
            return Err(HalError::ConfigurationError);
        }
        if self.tx_buffer_count == 0 {
            return Err(HalError::ConfigurationError);
        }
        Ok(())
    }
}

/// Receive notification invoked from the controller's interrupt dispatch.
///
/// `valid` is false when the element was flagged as a faulty or aborted
/// reception; `fifo` names the receive FIFO the element came from.
pub trait RxCallback {
    fn on_receive(&mut self, valid: bool, fifo: u8, record: &RxRecord<'_>);
}

/// CAN FD controller driver
pub trait CanFdController: Send {
    /// Driver-owned state (message RAM layout, filters, bookkeeping).
    type Context: Send;

    /// Initialize and start a channel, producing its driver context.
    fn init(&mut self, channel: ChannelId, config: &CanFdConfig) -> HalResult<Self::Context>;

    /// Copy `frame` into transmit buffer `buffer_index` and request transmission.
    fn update_and_transmit(
        &mut self,
        channel: ChannelId,
        frame: &TxFrame,
        buffer_index: u8,
        context: &mut Self::Context,
    ) -> HalResult<()>;

    /// Service the channel interrupt: acknowledge causes and deliver every
    /// received element to `rx`.
    fn irq_dispatch(&mut self, channel: ChannelId, context: &mut Self::Context, rx: &mut dyn RxCallback);
}
