//! A started hosted node.
//!
//! Wires the two interrupt vectors to the hub, runs the startup sequence on a
//! [`SimBoard`] and keeps handles on the simulated peripherals so callers can
//! press the button and watch the LED.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use canfd_node::{
    startup, ButtonIrq, CanIrq, Halt, Node, NodeChannel, NodeConfig, SetupError, SharedChannel,
    TxOutcome,
};

use crate::board::{SimBoard, BUTTON_IRQ};
use crate::bus::VirtualBus;
use crate::console::SimConsole;
use crate::controller::FaultInjection;
use crate::gpio::{SimButton, SimLed};
use crate::irq::InterruptHub;
use crate::signal::BlockingSignal;
use crate::{SimError, SimResult};

pub struct SimNode {
    node: Node<'static, SimBoard, BlockingSignal>,
    signal: &'static BlockingSignal,
    hub: Arc<InterruptHub>,
    led: SimLed,
    button: SimButton,
    console: SimConsole,
    faults: FaultInjection,
}

impl SimNode {
    /// Builds a board on `bus` and starts a node on it.
    ///
    /// The interrupt-level thread is stopped again if startup fails.
    pub fn start(bus: &VirtualBus, config: NodeConfig, console: SimConsole) -> SimResult<Self> {
        if config.can_irq == BUTTON_IRQ {
            return Err(SimError::LineInUse(BUTTON_IRQ));
        }

        let hub = InterruptHub::start(console.label())?;
        let started = Self::assemble(Arc::clone(&hub), bus, config, console);
        if started.is_err() {
            hub.shutdown();
        }
        started
    }

    fn assemble(
        hub: Arc<InterruptHub>,
        bus: &VirtualBus,
        config: NodeConfig,
        console: SimConsole,
    ) -> SimResult<Self> {
        // Both live as long as the process, like their statics on a target
        let signal: &'static BlockingSignal = Box::leak(Box::new(BlockingSignal::new()));
        let channel: &'static NodeChannel<SimBoard> = Box::leak(Box::new(SharedChannel::new()));

        hub.bind(BUTTON_IRQ, move || ButtonIrq::new(signal).on_falling_edge())?;
        hub.bind(config.can_irq, move || CanIrq::new(channel).on_interrupt())?;

        let mut board = SimBoard::new(Arc::clone(&hub), bus.clone(), config.can_irq, console);
        let node = startup(&mut board, config, signal, channel)?;

        Ok(Self {
            node,
            signal,
            led: board.led().clone(),
            button: board.button_handle().clone(),
            console: board.console_handle().clone(),
            faults: board.faults().clone(),
            hub,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        self.node.config()
    }

    pub fn led(&self) -> &SimLed {
        &self.led
    }

    pub fn button(&self) -> SimButton {
        self.button.clone()
    }

    pub fn console(&self) -> &SimConsole {
        &self.console
    }

    pub fn faults(&self) -> &FaultInjection {
        &self.faults
    }

    pub fn hub(&self) -> &Arc<InterruptHub> {
        &self.hub
    }

    pub fn signal(&self) -> &BlockingSignal {
        self.signal
    }

    /// Data frames the receive sink decoded so far.
    pub fn received(&self) -> u32 {
        self.node
            .channel()
            .with(|channel| channel.rx().received())
            .unwrap_or(0)
    }

    /// Waits until this node's interrupt level has nothing left to do.
    pub fn settle(&self) {
        self.hub.settle();
    }

    /// One dispatch loop iteration.
    pub fn poll_once(&mut self) -> Option<TxOutcome> {
        self.node.poll_once()
    }

    /// Runs the dispatch loop on its own thread.
    pub fn spawn(self) -> SimResult<JoinHandle<()>> {
        let name = format!("{}-main", self.console.label());
        let node = self.node;
        Ok(thread::Builder::new().name(name).spawn(move || node.run())?)
    }
}

/// Halt policy for the simulator: report and exit the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitHalt;

impl Halt for ExitHalt {
    fn halt(&self, error: &SetupError) -> ! {
        eprintln!("halted: {error}");
        std::process::exit(1)
    }
}
