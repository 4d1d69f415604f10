//! Hosted board: one interrupt hub, an LED, a button and a controller on a
//! shared virtual bus.

use std::sync::Arc;

use hal::error::HalResult;
use hal::interrupt::IrqNumber;

use canfd_node::Board;

use crate::bus::VirtualBus;
use crate::console::SimConsole;
use crate::controller::{FaultInjection, SimController};
use crate::gpio::{SimButton, SimLed};
use crate::irq::{InterruptHub, SimInterruptController};

/// External interrupt line the button is wired to.
pub const BUTTON_IRQ: IrqNumber = 32;

const LED_PIN: u32 = 5;
const BUTTON_PIN: u32 = 13;

pub struct SimBoard {
    hub: Arc<InterruptHub>,
    bus: VirtualBus,
    can_irq: IrqNumber,
    console: SimConsole,
    led: SimLed,
    button: SimButton,
    faults: FaultInjection,
}

impl SimBoard {
    /// Board whose controller raises `can_irq` on `hub` for receptions.
    pub fn new(hub: Arc<InterruptHub>, bus: VirtualBus, can_irq: IrqNumber, console: SimConsole) -> Self {
        let button = SimButton::new(BUTTON_PIN, BUTTON_IRQ, Arc::clone(&hub));
        Self {
            hub,
            bus,
            can_irq,
            console,
            led: SimLed::new(LED_PIN),
            button,
            faults: FaultInjection::default(),
        }
    }

    pub fn hub(&self) -> &Arc<InterruptHub> {
        &self.hub
    }

    pub fn led(&self) -> &SimLed {
        &self.led
    }

    pub fn button_handle(&self) -> &SimButton {
        &self.button
    }

    pub fn faults(&self) -> &FaultInjection {
        &self.faults
    }

    pub fn console_handle(&self) -> &SimConsole {
        &self.console
    }
}

impl Board for SimBoard {
    type Console = SimConsole;
    type Indicator = SimLed;
    type Button = SimButton;
    type Interrupts = SimInterruptController;
    type Controller = SimController;

    fn init(&mut self) -> HalResult<()> {
        log::debug!("{}: board up", self.hub.name());
        Ok(())
    }

    fn console(&mut self) -> HalResult<Self::Console> {
        Ok(self.console.clone())
    }

    fn interrupts(&mut self) -> HalResult<Self::Interrupts> {
        Ok(SimInterruptController::new(Arc::clone(&self.hub)))
    }

    fn indicator(&mut self) -> HalResult<Self::Indicator> {
        Ok(self.led.clone())
    }

    fn button(&mut self) -> HalResult<Self::Button> {
        Ok(self.button.clone())
    }

    fn can_controller(&mut self) -> HalResult<Self::Controller> {
        Ok(SimController::new(
            self.bus.clone(),
            Arc::clone(&self.hub),
            self.can_irq,
            self.faults.clone(),
        ))
    }
}
