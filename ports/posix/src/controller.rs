//! Simulated CAN FD controller driver.
//!
//! Behaves like a single-channel message-RAM controller: `init` validates the
//! bit timing and attaches to the bus, transmit requests go straight onto the
//! wire, and the interrupt dispatch drains receive FIFO 0 into fixed-size
//! elements of `rx_element_size` data bytes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hal::can::{CanFdConfig, CanFdController, ChannelId, FrameKind, RxCallback, RxRecord, TxFrame};
use hal::error::{HalError, HalResult};
use hal::interrupt::IrqNumber;

use crate::bus::{PortId, Reception, RxFifo, VirtualBus};
use crate::irq::InterruptHub;

/// Channels provided by one simulated controller.
pub const SIM_CHANNELS: u8 = 1;

/// Receive FIFO serviced by the interrupt dispatch.
pub const RX_FIFO: u8 = 0;

/// Error conditions a test or the simulator can force onto a controller.
#[derive(Clone, Default)]
pub struct FaultInjection {
    bus_off: Arc<AtomicBool>,
}

impl FaultInjection {
    pub fn set_bus_off(&self, bus_off: bool) {
        self.bus_off.store(bus_off, Ordering::SeqCst);
    }

    pub fn is_bus_off(&self) -> bool {
        self.bus_off.load(Ordering::SeqCst)
    }
}

/// Driver state produced by [`SimController::init`].
pub struct SimContext {
    channel: ChannelId,
    config: CanFdConfig,
    bus: VirtualBus,
    port: PortId,
    fifo: RxFifo,
    element: Vec<u8>,
}

impl SimContext {
    pub fn port(&self) -> PortId {
        self.port
    }

    pub fn config(&self) -> &CanFdConfig {
        &self.config
    }
}

impl Drop for SimContext {
    fn drop(&mut self) {
        self.bus.detach(self.port);
    }
}

pub struct SimController {
    bus: VirtualBus,
    hub: Arc<InterruptHub>,
    irq: IrqNumber,
    faults: FaultInjection,
}

impl SimController {
    /// Controller on `bus` signalling receptions on line `irq` of `hub`.
    pub fn new(bus: VirtualBus, hub: Arc<InterruptHub>, irq: IrqNumber, faults: FaultInjection) -> Self {
        Self {
            bus,
            hub,
            irq,
            faults,
        }
    }

    pub fn faults(&self) -> &FaultInjection {
        &self.faults
    }

    fn check_frame(frame: &TxFrame, config: &CanFdConfig) -> HalResult<()> {
        frame.validate()?;
        if frame.fd_format && !config.fd_enabled {
            return Err(HalError::InvalidParameter);
        }
        if frame.bit_rate_switch && !config.bit_rate_switch {
            return Err(HalError::InvalidParameter);
        }
        Ok(())
    }
}

impl CanFdController for SimController {
    type Context = SimContext;

    fn init(&mut self, channel: ChannelId, config: &CanFdConfig) -> HalResult<Self::Context> {
        if channel.0 >= SIM_CHANNELS {
            return Err(HalError::InvalidParameter);
        }
        config.validate()?;

        let (port, fifo) = self.bus.attach(Arc::clone(&self.hub), self.irq);
        log::debug!(
            "{}: channel {} attached as {:?} ({} / {} bit/s)",
            self.hub.name(),
            channel.0,
            port,
            config.nominal_bitrate,
            config.data_bitrate
        );

        Ok(SimContext {
            channel,
            config: config.clone(),
            bus: self.bus.clone(),
            port,
            fifo,
            element: vec![0; config.rx_element_size],
        })
    }

    fn update_and_transmit(
        &mut self,
        channel: ChannelId,
        frame: &TxFrame,
        buffer_index: u8,
        context: &mut Self::Context,
    ) -> HalResult<()> {
        if channel != context.channel {
            return Err(HalError::NotInitialized);
        }
        if self.faults.is_bus_off() {
            return Err(HalError::BusOff);
        }
        if buffer_index >= context.config.tx_buffer_count {
            return Err(HalError::InvalidParameter);
        }
        Self::check_frame(frame, &context.config)?;

        context.bus.broadcast(context.port, frame);
        Ok(())
    }

    fn irq_dispatch(&mut self, channel: ChannelId, context: &mut Self::Context, rx: &mut dyn RxCallback) {
        if channel != context.channel {
            log::debug!("{}: dispatch for uninitialized channel {}", self.hub.name(), channel.0);
            return;
        }

        for reception in context.fifo.drain() {
            let record = load_element(&reception, &mut context.element);
            rx.on_receive(reception.valid, RX_FIFO, &record);
        }
    }
}

// Copies a reception into a message RAM element: the data area is always
// `element.len()` bytes, truncated or zero-padded, while the DLC keeps the
// value seen on the wire.
fn load_element<'a>(reception: &Reception, element: &'a mut [u8]) -> RxRecord<'a> {
    let frame = &reception.frame;
    element.fill(0);
    if frame.kind == FrameKind::Data {
        let copied = frame.data.len().min(element.len());
        element[..copied].copy_from_slice(&frame.data[..copied]);
    }

    RxRecord {
        id: frame.id,
        extended: frame.extended,
        kind: frame.kind,
        dlc: frame.dlc().unwrap_or(0),
        fd_format: frame.fd_format,
        bit_rate_switch: frame.bit_rate_switch,
        data: element,
    }
}
