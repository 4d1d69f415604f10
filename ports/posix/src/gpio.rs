//! Simulated GPIO.
//!
//! Both pins are cheap handles over shared state: the board gives one clone
//! to the node and keeps another so the simulator (or a test) can watch the
//! LED and press the button.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use hal::error::{HalError, HalResult};
use hal::gpio::{Edge, GpioPin, GpioPinInterrupt, Level, PinMode};
use hal::interrupt::{InterruptPriority, IrqNumber};

use crate::irq::InterruptHub;

#[derive(Default)]
struct PinState {
    level: AtomicBool,
    mode: Mutex<Option<PinMode>>,
}

impl PinState {
    fn level(&self) -> Level {
        Level::from(self.level.load(Ordering::SeqCst))
    }

    fn mode(&self) -> Option<PinMode> {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_mode(&self, mode: PinMode) {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = Some(mode);
    }
}

#[derive(Default)]
struct LedState {
    pin: PinState,
    toggles: AtomicU32,
}

/// Indicator LED.
#[derive(Clone)]
pub struct SimLed {
    pin: u32,
    state: Arc<LedState>,
}

impl SimLed {
    pub fn new(pin: u32) -> Self {
        Self {
            pin,
            state: Arc::default(),
        }
    }

    pub fn level(&self) -> Level {
        self.state.pin.level()
    }

    pub fn is_lit(&self) -> bool {
        self.level() == Level::High
    }

    pub fn toggles(&self) -> u32 {
        self.state.toggles.load(Ordering::SeqCst)
    }

    pub fn mode(&self) -> Option<PinMode> {
        self.state.pin.mode()
    }
}

impl GpioPin for SimLed {
    fn set_mode(&mut self, mode: PinMode) -> HalResult<()> {
        self.state.pin.set_mode(mode);
        Ok(())
    }

    fn read(&self) -> HalResult<Level> {
        Ok(self.level())
    }

    fn write(&mut self, level: Level) -> HalResult<()> {
        match self.mode() {
            Some(PinMode::Output | PinMode::OutputOpenDrain) => {
                self.state.pin.level.store(level == Level::High, Ordering::SeqCst);
                Ok(())
            }
            _ => Err(HalError::InvalidParameter),
        }
    }

    fn toggle(&mut self) -> HalResult<()> {
        self.write(self.level().toggled())?;
        self.state.toggles.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn pin_number(&self) -> u32 {
        self.pin
    }
}

#[derive(Default)]
struct ButtonState {
    pin: PinState,
    edge: Mutex<Option<Edge>>,
}

/// Push button wired to an interrupt line; pressing pulls the pin low.
#[derive(Clone)]
pub struct SimButton {
    pin: u32,
    irq: IrqNumber,
    hub: Arc<InterruptHub>,
    state: Arc<ButtonState>,
}

impl SimButton {
    pub fn new(pin: u32, irq: IrqNumber, hub: Arc<InterruptHub>) -> Self {
        let state = ButtonState::default();
        state.pin.level.store(true, Ordering::SeqCst);
        Self {
            pin,
            irq,
            hub,
            state: Arc::new(state),
        }
    }

    /// Presses and releases the button.
    pub fn press(&self) {
        self.drive(Level::Low);
        self.drive(Level::High);
    }

    pub fn irq(&self) -> IrqNumber {
        self.irq
    }

    pub fn mode(&self) -> Option<PinMode> {
        self.state.pin.mode()
    }

    pub fn edge(&self) -> Option<Edge> {
        *self.state.edge.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drive(&self, level: Level) {
        let was = self.state.pin.level();
        self.state.pin.level.store(level == Level::High, Ordering::SeqCst);
        if was == level {
            return;
        }

        let fires = match (self.edge(), level) {
            (Some(Edge::Falling | Edge::Both), Level::Low) => true,
            (Some(Edge::Rising | Edge::Both), Level::High) => true,
            _ => false,
        };
        if fires {
            self.hub.raise(self.irq);
        }
    }
}

impl GpioPin for SimButton {
    fn set_mode(&mut self, mode: PinMode) -> HalResult<()> {
        match mode {
            PinMode::Input | PinMode::InputPullUp | PinMode::InputPullDown => {
                self.state.pin.set_mode(mode);
                Ok(())
            }
            _ => Err(HalError::NotSupported),
        }
    }

    fn read(&self) -> HalResult<Level> {
        Ok(self.state.pin.level())
    }

    fn write(&mut self, _level: Level) -> HalResult<()> {
        Err(HalError::NotSupported)
    }

    fn pin_number(&self) -> u32 {
        self.pin
    }
}

impl GpioPinInterrupt for SimButton {
    fn enable_interrupt(&mut self, edge: Edge, priority: InterruptPriority) -> HalResult<()> {
        *self.state.edge.lock().unwrap_or_else(PoisonError::into_inner) = Some(edge);
        self.hub.set_priority(self.irq, priority);
        self.hub.enable(self.irq);
        Ok(())
    }

    fn disable_interrupt(&mut self) -> HalResult<()> {
        *self.state.edge.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.hub.disable(self.irq);
        Ok(())
    }

    fn is_interrupt_pending(&self) -> bool {
        self.hub.is_pending(self.irq)
    }
}
