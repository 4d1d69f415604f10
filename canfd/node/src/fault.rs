//! Fault escalation.
//!
//! Setup either succeeds completely or nothing runs: every initialization
//! step reports a tagged [`SetupError`], and the entry point hands any error
//! to a [`Halt`] policy that never returns. Per-message transmit and receive
//! outcomes never come through here.

use core::fmt;

use hal::error::HalError;

/// Initialization step that failed, with the underlying HAL error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    /// Outbound frame described by the configuration cannot be sent
    Frame(HalError),
    /// Clocks, pins or other board bring-up
    Board(HalError),
    /// Debug console (retargeted UART)
    Console(HalError),
    /// Indicator output pin
    Indicator(HalError),
    /// Button input pin or its edge interrupt
    Button(HalError),
    /// Interrupt controller configuration
    Interrupt(HalError),
    /// CAN FD controller channel
    Controller(HalError),
}

impl SetupError {
    pub fn cause(&self) -> HalError {
        match *self {
            Self::Frame(err)
            | Self::Board(err)
            | Self::Console(err)
            | Self::Indicator(err)
            | Self::Button(err)
            | Self::Interrupt(err)
            | Self::Controller(err) => err,
        }
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(err) => write!(f, "outbound frame configuration rejected: {}", err),
            Self::Board(err) => write!(f, "board init failed: {}", err),
            Self::Console(err) => write!(f, "console init failed: {}", err),
            Self::Indicator(err) => write!(f, "indicator init failed: {}", err),
            Self::Button(err) => write!(f, "button init failed: {}", err),
            Self::Interrupt(err) => write!(f, "interrupt setup failed: {}", err),
            Self::Controller(err) => write!(f, "CAN FD controller init failed: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SetupError {}

#[cfg(feature = "defmt")]
impl defmt::Format for SetupError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Frame(err) => defmt::write!(fmt, "Frame({})", err),
            Self::Board(err) => defmt::write!(fmt, "Board({})", err),
            Self::Console(err) => defmt::write!(fmt, "Console({})", err),
            Self::Indicator(err) => defmt::write!(fmt, "Indicator({})", err),
            Self::Button(err) => defmt::write!(fmt, "Button({})", err),
            Self::Interrupt(err) => defmt::write!(fmt, "Interrupt({})", err),
            Self::Controller(err) => defmt::write!(fmt, "Controller({})", err),
        }
    }
}

/// Irrecoverable stop of the system.
pub trait Halt {
    fn halt(&self, error: &SetupError) -> !;
}

/// Parks the core forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinHalt;

impl Halt for SpinHalt {
    fn halt(&self, _error: &SetupError) -> ! {
        loop {
            #[cfg(all(target_arch = "arm", target_os = "none"))]
            cortex_m::asm::wfi();
            #[cfg(not(all(target_arch = "arm", target_os = "none")))]
            core::hint::spin_loop();
        }
    }
}

/// Returns the value of a successful setup step, halts on failure.
pub fn escalate<T, H: Halt + ?Sized>(status: Result<T, SetupError>, halt: &H) -> T {
    match status {
        Ok(value) => value,
        Err(err) => {
            log::error!("{}", err);
            halt.halt(&err)
        }
    }
}
