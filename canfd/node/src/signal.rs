//! Transmit-pending signal.
//!
//! The only datum shared between interrupt level and the dispatch loop.
//! Exactly one producer sets it (the button handler) and exactly one consumer
//! clears it (the dispatch loop, after acting on it). Raising an already
//! raised signal is a no-op, so presses arriving while a send is still
//! pending coalesce into that send.

use core::sync::atomic::{AtomicBool, Ordering};

/// Single-producer, single-consumer wake-up flag.
pub trait PendingSignal: Sync {
    /// Producer side; must be callable from interrupt level.
    fn raise(&self);

    /// True while a request is waiting for the consumer.
    fn is_pending(&self) -> bool;

    /// Consumer side; called once the request has been handled.
    fn clear(&self);

    /// Blocks (or idles) until the signal is raised.
    fn wait(&self);
}

/// Atomic flag for bare-metal targets.
#[derive(Debug)]
pub struct TransmitPending {
    flag: AtomicBool,
}

impl TransmitPending {
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }
}

impl Default for TransmitPending {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingSignal for TransmitPending {
    #[inline]
    fn raise(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    fn is_pending(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    #[inline]
    fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }

    fn wait(&self) {
        while !self.is_pending() {
            idle(self);
        }
    }
}

// Sleep until the next interrupt. The check runs with interrupts masked so a
// raise between the check and WFI still wakes the core.
#[cfg(all(target_arch = "arm", target_os = "none"))]
fn idle(signal: &TransmitPending) {
    cortex_m::interrupt::free(|_| {
        if !signal.is_pending() {
            cortex_m::asm::wfi();
        }
    });
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
fn idle(_signal: &TransmitPending) {
    core::hint::spin_loop();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let signal = TransmitPending::new();
        assert!(!signal.is_pending());
    }

    #[test]
    fn raise_then_clear() {
        let signal = TransmitPending::new();
        signal.raise();
        assert!(signal.is_pending());
        signal.clear();
        assert!(!signal.is_pending());
    }

    #[test]
    fn repeated_raises_coalesce() {
        let signal = TransmitPending::new();
        signal.raise();
        signal.raise();
        signal.raise();
        assert!(signal.is_pending());
        signal.clear();
        assert!(!signal.is_pending());
    }

    #[test]
    fn wait_returns_once_raised() {
        let signal = std::sync::Arc::new(TransmitPending::new());
        let producer = std::sync::Arc::clone(&signal);
        let handle = std::thread::spawn(move || producer.raise());
        signal.wait();
        handle.join().unwrap();
        assert!(signal.is_pending());
    }
}
