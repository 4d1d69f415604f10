//! GPIO (General Purpose Input/Output) abstraction

use crate::error::HalResult;
use crate::interrupt::InterruptPriority;

/// GPIO pin modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Input (floating)
    Input,
    /// Input with pull-up resistor
    InputPullUp,
    /// Input with pull-down resistor
    InputPullDown,
    /// Output (push-pull)
    Output,
    /// Output (open-drain)
    OutputOpenDrain,
}

/// GPIO pin levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Low level (0V)
    Low,
    /// High level (VCC)
    High,
}

impl Level {
    /// The opposite level.
    pub const fn toggled(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Interrupt trigger edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Rising edge
    Rising,
    /// Falling edge
    Falling,
    /// Both edges
    Both,
}

/// GPIO pin trait (object-safe)
pub trait GpioPin: Send {
    /// Configure pin mode
    fn set_mode(&mut self, mode: PinMode) -> HalResult<()>;

    /// Read current level
    fn read(&self) -> HalResult<Level>;

    /// Write level (for output pins)
    fn write(&mut self, level: Level) -> HalResult<()>;

    /// Toggle output
    fn toggle(&mut self) -> HalResult<()> {
        let current = self.read()?;
        self.write(current.toggled())
    }

    /// Get pin number
    fn pin_number(&self) -> u32;
}

/// GPIO pin with interrupt support
pub trait GpioPinInterrupt: GpioPin {
    /// Enable interrupt on edge at the given priority
    fn enable_interrupt(&mut self, edge: Edge, priority: InterruptPriority) -> HalResult<()>;

    /// Disable interrupt
    fn disable_interrupt(&mut self) -> HalResult<()>;

    /// Check if interrupt is pending
    fn is_interrupt_pending(&self) -> bool;
}
