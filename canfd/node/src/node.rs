//! Board capability surface and the startup sequence.

use hal::can::CanFdController;
use hal::console::Console;
use hal::console_line;
use hal::error::HalResult;
use hal::gpio::{Edge, GpioPin, GpioPinInterrupt, Level, PinMode};
use hal::interrupt::InterruptController;

use crate::channel::{CanChannel, SharedChannel};
use crate::config::NodeConfig;
use crate::dispatch::Dispatcher;
use crate::fault::{escalate, Halt, SetupError};
use crate::frame::FrameTemplate;
use crate::rx::RxSink;
use crate::signal::PendingSignal;
use crate::tx::{TransmitPath, TxOutcome};

const BANNER_RULE: &str = "===========================================================";

/// Peripherals a board hands to the node, already clocked and pinned.
pub trait Board {
    type Console: Console + Clone;
    type Indicator: GpioPin;
    type Button: GpioPinInterrupt;
    type Interrupts: InterruptController;
    type Controller: CanFdController;

    /// Clocks, pins and power domains.
    fn init(&mut self) -> HalResult<()>;

    /// Retargeted debug console.
    fn console(&mut self) -> HalResult<Self::Console>;

    fn interrupts(&mut self) -> HalResult<Self::Interrupts>;

    fn indicator(&mut self) -> HalResult<Self::Indicator>;

    fn button(&mut self) -> HalResult<Self::Button>;

    fn can_controller(&mut self) -> HalResult<Self::Controller>;
}

/// Receive sink type registered for a board.
pub type BoardSink<B> = RxSink<<B as Board>::Indicator, <B as Board>::Console>;

/// Shared channel type for a board; usually a `static`.
pub type NodeChannel<B> = SharedChannel<<B as Board>::Controller, BoardSink<B>>;

/// A node that completed startup.
pub struct Node<'a, B: Board, S: PendingSignal> {
    config: NodeConfig,
    dispatcher: Dispatcher<'a, S, B::Controller, BoardSink<B>, B::Console>,
    channel: &'a NodeChannel<B>,
    _interrupts: B::Interrupts,
    _button: B::Button,
}

impl<'a, B: Board, S: PendingSignal> Node<'a, B, S> {
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher<'a, S, B::Controller, BoardSink<B>, B::Console> {
        &self.dispatcher
    }

    pub fn channel(&self) -> &'a NodeChannel<B> {
        self.channel
    }

    /// One dispatch loop iteration.
    pub fn poll_once(&mut self) -> Option<TxOutcome> {
        self.dispatcher.poll_once()
    }

    /// Enters the dispatch loop.
    pub fn run(mut self) -> ! {
        self.dispatcher.run()
    }
}

/// Brings the node up.
///
/// Order: outbound frame check, board, console and banner, controller
/// interrupt line, indicator, button edge interrupt, global interrupt enable,
/// controller channel. The first failing step is returned as its tagged
/// [`SetupError`].
pub fn startup<'a, B: Board, S: PendingSignal>(
    board: &mut B,
    config: NodeConfig,
    signal: &'a S,
    channel: &'a NodeChannel<B>,
) -> Result<Node<'a, B, S>, SetupError> {
    // The outbound frame is fixed for the lifetime of the node
    let template = FrameTemplate::from_config(&config);
    template
        .builder()
        .identity(config.node_id)
        .build()
        .map_err(SetupError::Frame)?;

    board.init().map_err(SetupError::Board)?;

    let console = board.console().map_err(SetupError::Console)?;
    banner(&console, &config);

    let mut interrupts = board.interrupts().map_err(SetupError::Interrupt)?;
    interrupts
        .set_priority(config.can_irq, config.can_irq_priority)
        .map_err(SetupError::Interrupt)?;
    interrupts
        .enable_interrupt(config.can_irq)
        .map_err(SetupError::Interrupt)?;

    let mut indicator = board.indicator().map_err(SetupError::Indicator)?;
    indicator.set_mode(PinMode::Output).map_err(SetupError::Indicator)?;
    indicator.write(Level::Low).map_err(SetupError::Indicator)?;

    let mut button = board.button().map_err(SetupError::Button)?;
    button.set_mode(PinMode::InputPullUp).map_err(SetupError::Button)?;
    button
        .enable_interrupt(Edge::Falling, config.button_priority)
        .map_err(SetupError::Button)?;

    interrupts.enable_global().map_err(SetupError::Interrupt)?;

    let controller = board.can_controller().map_err(SetupError::Controller)?;
    let sink = RxSink::new(indicator, console.clone());
    let opened = CanChannel::open(controller, config.channel, &config.bus, sink)
        .map_err(SetupError::Controller)?;
    channel.install(opened);
    log::debug!("node {} started on channel {:?}", config.node_id, config.channel);

    let tx = TransmitPath::new(channel, config.node_id, config.tx_buffer_index, template);
    let dispatcher = Dispatcher::new(signal, tx, console);

    Ok(Node {
        config,
        dispatcher,
        channel,
        _interrupts: interrupts,
        _button: button,
    })
}

/// Entry point: start up, halting on any setup failure, then dispatch forever.
pub fn run<B: Board, S: PendingSignal, H: Halt>(
    board: &mut B,
    config: NodeConfig,
    signal: &S,
    channel: &NodeChannel<B>,
    halt: &H,
) -> ! {
    let node = escalate(startup(board, config, signal, channel), halt);
    node.run()
}

fn banner<L: Console>(console: &L, config: &NodeConfig) {
    console_line!(console, "{}", BANNER_RULE);
    console_line!(console, "Welcome to CAN-FD example");
    console_line!(console, "{}", BANNER_RULE);
    console_line!(console, "{}", BANNER_RULE);
    console_line!(console, "CAN-FD Node-{} (message id)", config.node_id);
    console_line!(console, "{}", BANNER_RULE);
}
