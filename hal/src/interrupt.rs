//! Interrupt controller abstraction

use crate::error::HalResult;

/// Interrupt priority (0 = highest on most platforms)
pub type InterruptPriority = u8;

/// Interrupt line number as known to the interrupt controller
pub type IrqNumber = u32;

/// Interrupt controller abstraction
///
/// Handler binding itself is a property of the vector table (or of the
/// hosted port's dispatcher); this trait only configures and gates lines.
pub trait InterruptController: Send {
    /// Enable interrupt
    fn enable_interrupt(&mut self, irq_num: IrqNumber) -> HalResult<()>;

    /// Disable interrupt
    fn disable_interrupt(&mut self, irq_num: IrqNumber) -> HalResult<()>;

    /// Set interrupt priority
    fn set_priority(&mut self, irq_num: IrqNumber, priority: InterruptPriority) -> HalResult<()>;

    /// Check if interrupt is pending
    fn is_pending(&self, irq_num: IrqNumber) -> bool;

    /// Globally unmask interrupts
    fn enable_global(&mut self) -> HalResult<()>;
}
