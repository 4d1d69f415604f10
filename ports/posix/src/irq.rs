//! Interrupt hub for the hosted port.
//!
//! Stands in for an NVIC: lines carry an enable bit, a priority and a pending
//! latch, and a global mask gates them all. A single worker thread plays the
//! role of the core's interrupt level. It services the most urgent deliverable
//! line (lowest priority value, then lowest line number) and runs its handler
//! to completion before looking again, so handlers never nest and always run
//! concurrently with thread-level code.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use hal::error::HalResult;
use hal::interrupt::{InterruptController, InterruptPriority, IrqNumber};

use crate::{SimError, SimResult};

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Line {
    enabled: bool,
    priority: InterruptPriority,
    pending: bool,
    handler: Option<Handler>,
}

#[derive(Default)]
struct HubState {
    lines: BTreeMap<IrqNumber, Line>,
    global: bool,
    active: Option<IrqNumber>,
    serviced: u64,
    shutdown: bool,
}

impl HubState {
    fn line(&mut self, irq: IrqNumber) -> &mut Line {
        self.lines.entry(irq).or_default()
    }

    fn next_deliverable(&self) -> Option<IrqNumber> {
        if !self.global {
            return None;
        }
        self.lines
            .iter()
            .filter(|(_, line)| line.enabled && line.pending && line.handler.is_some())
            .min_by_key(|(irq, line)| (line.priority, **irq))
            .map(|(irq, _)| *irq)
    }
}

/// Simulated interrupt controller shared by one node's peripherals.
pub struct InterruptHub {
    name: String,
    state: Mutex<HubState>,
    changed: Condvar,
}

impl InterruptHub {
    /// Creates a hub and starts its interrupt-level thread.
    pub fn start(name: &str) -> io::Result<Arc<Self>> {
        let hub = Arc::new(Self {
            name: name.to_owned(),
            state: Mutex::new(HubState::default()),
            changed: Condvar::new(),
        });

        let worker = Arc::clone(&hub);
        thread::Builder::new()
            .name(format!("{name}-irq"))
            .spawn(move || worker.service())?;

        Ok(hub)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds `handler` to `irq`, the hosted equivalent of a vector table slot.
    pub fn bind<F>(&self, irq: IrqNumber, handler: F) -> SimResult<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let line = state.line(irq);
        if line.handler.is_some() {
            return Err(SimError::LineInUse(irq));
        }
        line.handler = Some(Arc::new(handler));
        self.changed.notify_all();
        Ok(())
    }

    /// Latches `irq` as pending; it is serviced once enabled and unmasked.
    pub fn raise(&self, irq: IrqNumber) {
        let mut state = self.lock();
        let line = state.line(irq);
        if line.handler.is_none() {
            log::warn!("{}: line {} raised without a handler", self.name, irq);
        }
        line.pending = true;
        self.changed.notify_all();
    }

    pub fn enable(&self, irq: IrqNumber) {
        self.update(|state| state.line(irq).enabled = true);
    }

    pub fn disable(&self, irq: IrqNumber) {
        self.update(|state| state.line(irq).enabled = false);
    }

    pub fn set_priority(&self, irq: IrqNumber, priority: InterruptPriority) {
        self.update(|state| state.line(irq).priority = priority);
    }

    pub fn enable_global(&self) {
        self.update(|state| state.global = true);
    }

    pub fn is_enabled(&self, irq: IrqNumber) -> bool {
        self.lock().lines.get(&irq).map_or(false, |line| line.enabled)
    }

    pub fn is_pending(&self, irq: IrqNumber) -> bool {
        self.lock().lines.get(&irq).map_or(false, |line| line.pending)
    }

    pub fn priority(&self, irq: IrqNumber) -> Option<InterruptPriority> {
        self.lock().lines.get(&irq).map(|line| line.priority)
    }

    pub fn global_enabled(&self) -> bool {
        self.lock().global
    }

    /// Number of handler invocations so far.
    pub fn serviced(&self) -> u64 {
        self.lock().serviced
    }

    /// Blocks until no deliverable line is pending and no handler is running.
    ///
    /// Lines that are pending but masked or disabled do not hold this up.
    pub fn settle(&self) {
        let mut state = self.lock();
        while state.active.is_some() || state.next_deliverable().is_some() {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Stops the interrupt-level thread after the running handler returns.
    pub fn shutdown(&self) {
        self.update(|state| state.shutdown = true);
    }

    fn service(&self) {
        let mut state = self.lock();
        while !state.shutdown {
            let Some(irq) = state.next_deliverable() else {
                state = self
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            };

            let line = state.line(irq);
            line.pending = false;
            let handler = line.handler.clone();
            state.active = Some(irq);
            drop(state);

            if let Some(handler) = handler {
                handler();
            }

            state = self.lock();
            state.active = None;
            state.serviced += 1;
            self.changed.notify_all();
        }
        log::debug!("{}: interrupt thread stopped", self.name);
    }

    fn update(&self, f: impl FnOnce(&mut HubState)) {
        let mut state = self.lock();
        f(&mut state);
        self.changed.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// [`InterruptController`] view of a hub handed out by the board.
#[derive(Clone)]
pub struct SimInterruptController {
    hub: Arc<InterruptHub>,
}

impl SimInterruptController {
    pub fn new(hub: Arc<InterruptHub>) -> Self {
        Self { hub }
    }
}

impl InterruptController for SimInterruptController {
    fn enable_interrupt(&mut self, irq_num: IrqNumber) -> HalResult<()> {
        self.hub.enable(irq_num);
        Ok(())
    }

    fn disable_interrupt(&mut self, irq_num: IrqNumber) -> HalResult<()> {
        self.hub.disable(irq_num);
        Ok(())
    }

    fn set_priority(&mut self, irq_num: IrqNumber, priority: InterruptPriority) -> HalResult<()> {
        self.hub.set_priority(irq_num, priority);
        Ok(())
    }

    fn is_pending(&self, irq_num: IrqNumber) -> bool {
        self.hub.is_pending(irq_num)
    }

    fn enable_global(&mut self) -> HalResult<()> {
        self.hub.enable_global();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting(hub: &InterruptHub, irq: IrqNumber) -> Arc<AtomicU32> {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        hub.bind(irq, move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        count
    }

    #[test]
    fn pending_line_waits_for_enable_and_global_mask() {
        let hub = InterruptHub::start("mask").unwrap();
        let count = counting(&hub, 3);

        hub.raise(3);
        hub.settle();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(hub.is_pending(3));

        hub.enable(3);
        hub.settle();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        hub.enable_global();
        hub.settle();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!hub.is_pending(3));
        hub.shutdown();
    }

    #[test]
    fn repeated_raises_before_service_latch_once() {
        let hub = InterruptHub::start("latch").unwrap();
        let count = counting(&hub, 1);
        hub.enable(1);

        hub.raise(1);
        hub.raise(1);
        hub.enable_global();
        hub.settle();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        hub.shutdown();
    }

    #[test]
    fn most_urgent_line_runs_first() {
        let hub = InterruptHub::start("prio").unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        for irq in [4, 9] {
            let order = Arc::clone(&order);
            hub.bind(irq, move || order.lock().unwrap().push(irq)).unwrap();
            hub.enable(irq);
        }
        hub.set_priority(4, 7);
        hub.set_priority(9, 1);

        hub.raise(4);
        hub.raise(9);
        hub.enable_global();
        hub.settle();

        assert_eq!(*order.lock().unwrap(), vec![9, 4]);
        hub.shutdown();
    }

    #[test]
    fn second_handler_on_a_line_is_rejected() {
        let hub = InterruptHub::start("bind").unwrap();
        hub.bind(2, || {}).unwrap();
        assert!(matches!(hub.bind(2, || {}), Err(SimError::LineInUse(2))));
        hub.shutdown();
    }

    #[test]
    fn controller_view_configures_the_hub() {
        let hub = InterruptHub::start("view").unwrap();
        let mut nvic = SimInterruptController::new(Arc::clone(&hub));

        nvic.set_priority(0, 1).unwrap();
        nvic.enable_interrupt(0).unwrap();
        nvic.enable_global().unwrap();

        assert_eq!(hub.priority(0), Some(1));
        assert!(hub.is_enabled(0));
        assert!(hub.global_enabled());

        nvic.disable_interrupt(0).unwrap();
        assert!(!hub.is_enabled(0));
        hub.shutdown();
    }
}
