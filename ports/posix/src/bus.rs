//! Virtual CAN FD bus.
//!
//! A broadcast medium shared by every controller attached to it. A frame put
//! on the wire lands in the receive FIFO of every other attached port, never
//! in the sender's own, and each receiving port's interrupt line is raised
//! after its FIFO was filled. Arbitration and bit timing are not modelled.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hal::can::TxFrame;
use hal::interrupt::IrqNumber;

use crate::irq::InterruptHub;

/// Receive FIFO depth of a simulated controller.
pub const RX_FIFO_DEPTH: usize = 64;

/// Handle of one attachment to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId(usize);

/// A frame as it arrived at a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reception {
    pub frame: TxFrame,
    /// False when the reception was flagged as faulty
    pub valid: bool,
}

/// Receive FIFO filled by the bus and drained by the owning controller.
#[derive(Clone, Default)]
pub struct RxFifo {
    queue: Arc<Mutex<VecDeque<Reception>>>,
}

impl RxFifo {
    /// Takes every queued reception, oldest first.
    pub fn drain(&self) -> Vec<Reception> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, reception: Reception) -> bool {
        let mut queue = self.lock();
        if queue.len() >= RX_FIFO_DEPTH {
            return false;
        }
        queue.push_back(reception);
        true
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Reception>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Port {
    id: PortId,
    fifo: RxFifo,
    hub: Arc<InterruptHub>,
    irq: IrqNumber,
}

impl Port {
    fn deliver(&self, reception: Reception) {
        let id = reception.frame.id;
        if self.fifo.push(reception) {
            self.hub.raise(self.irq);
        } else {
            log::warn!("{}: rx fifo full, frame {} lost", self.hub.name(), id);
        }
    }
}

#[derive(Default)]
struct BusState {
    ports: Vec<Port>,
    next_port: usize,
    history: Vec<TxFrame>,
}

/// In-process CAN FD bus.
#[derive(Clone, Default)]
pub struct VirtualBus {
    state: Arc<Mutex<BusState>>,
}

impl VirtualBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a controller whose interrupt line `irq` on `hub` is raised
    /// whenever its FIFO receives a frame.
    pub fn attach(&self, hub: Arc<InterruptHub>, irq: IrqNumber) -> (PortId, RxFifo) {
        let mut state = self.lock();
        let id = PortId(state.next_port);
        state.next_port += 1;

        let fifo = RxFifo::default();
        state.ports.push(Port {
            id,
            fifo: fifo.clone(),
            hub,
            irq,
        });
        (id, fifo)
    }

    pub fn detach(&self, port: PortId) {
        self.lock().ports.retain(|attached| attached.id != port);
    }

    pub fn attached(&self) -> usize {
        self.lock().ports.len()
    }

    /// Puts `frame` on the wire on behalf of `sender`.
    pub fn broadcast(&self, sender: PortId, frame: &TxFrame) {
        let mut state = self.lock();
        state.history.push(frame.clone());
        for port in state.ports.iter().filter(|port| port.id != sender) {
            port.deliver(Reception {
                frame: frame.clone(),
                valid: true,
            });
        }
    }

    /// Delivers `frame` to every port as if sent by a node outside the
    /// simulation.
    pub fn inject(&self, frame: &TxFrame) {
        self.inject_with(frame, true);
    }

    /// Delivers `frame` to every port flagged as a faulty reception.
    pub fn inject_faulty(&self, frame: &TxFrame) {
        self.inject_with(frame, false);
    }

    /// Frames sent by attached controllers, in wire order.
    pub fn history(&self) -> Vec<TxFrame> {
        self.lock().history.clone()
    }

    fn inject_with(&self, frame: &TxFrame, valid: bool) {
        let state = self.lock();
        for port in &state.ports {
            port.deliver(Reception {
                frame: frame.clone(),
                valid,
            });
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::can::FrameKind;
    use heapless::Vec as HVec;

    fn frame(id: u32) -> TxFrame {
        TxFrame {
            id,
            extended: false,
            kind: FrameKind::Data,
            fd_format: true,
            bit_rate_switch: true,
            data: HVec::from_slice(&[1, 2, 3]).unwrap(),
        }
    }

    #[test]
    fn broadcast_skips_the_sender() {
        let hub = InterruptHub::start("bus").unwrap();
        let bus = VirtualBus::new();
        let (a, fifo_a) = bus.attach(Arc::clone(&hub), 0);
        let (_b, fifo_b) = bus.attach(Arc::clone(&hub), 1);

        bus.broadcast(a, &frame(1));

        assert!(fifo_a.is_empty());
        assert_eq!(fifo_b.drain(), vec![Reception { frame: frame(1), valid: true }]);
        assert!(hub.is_pending(1));
        assert!(!hub.is_pending(0));
        assert_eq!(bus.history(), vec![frame(1)]);
        hub.shutdown();
    }

    #[test]
    fn injected_frames_reach_every_port_but_stay_off_the_history() {
        let hub = InterruptHub::start("inject").unwrap();
        let bus = VirtualBus::new();
        let (_a, fifo_a) = bus.attach(Arc::clone(&hub), 0);
        let (_b, fifo_b) = bus.attach(Arc::clone(&hub), 1);

        bus.inject_faulty(&frame(9));

        assert!(!fifo_a.drain()[0].valid);
        assert!(!fifo_b.drain()[0].valid);
        assert!(bus.history().is_empty());
        hub.shutdown();
    }

    #[test]
    fn full_fifo_drops_new_frames() {
        let hub = InterruptHub::start("full").unwrap();
        let bus = VirtualBus::new();
        let (_a, fifo) = bus.attach(Arc::clone(&hub), 0);

        for id in 0..(RX_FIFO_DEPTH as u32 + 3) {
            bus.inject(&frame(id));
        }

        let received = fifo.drain();
        assert_eq!(received.len(), RX_FIFO_DEPTH);
        assert_eq!(received.last().map(|r| r.frame.id), Some(RX_FIFO_DEPTH as u32 - 1));
        hub.shutdown();
    }

    #[test]
    fn detached_ports_receive_nothing() {
        let hub = InterruptHub::start("detach").unwrap();
        let bus = VirtualBus::new();
        let (a, fifo_a) = bus.attach(Arc::clone(&hub), 0);
        bus.detach(a);

        bus.inject(&frame(4));

        assert_eq!(bus.attached(), 0);
        assert!(fifo_a.is_empty());
        hub.shutdown();
    }
}
