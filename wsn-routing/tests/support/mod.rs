//! Shared mocks for the end-to-end tests under `tests/`.
//!
//! `Connection` owns its link/timer/callbacks collaborators outright, so
//! these wrap their recorded state in `Rc<RefCell<_>>` and hand the test a
//! cloneable handle to inspect after the collaborator has been moved into
//! `Connection::open`. The crate's own internal unit tests get away with
//! plain fields instead because they share a module with `Connection`
//! itself and can reach its private fields directly; these integration
//! tests only have the public API, so the handle is how they observe what
//! happened inside.

use std::cell::RefCell;
use std::rc::Rc;

use heapless::Vec as HVec;

use wsn_routing::addr::NodeAddress;
use wsn_routing::error::RoutingError;
use wsn_routing::link::{LinkLayer, PacketBuffer, RngSource, RoutingCallbacks, TimerSlot, TimerSource};

pub const MAX_BUF: usize = 128;

pub struct VecPacketBuffer {
    data: HVec<u8, MAX_BUF>,
    rssi: i16,
}

impl VecPacketBuffer {
    pub fn with_payload(payload: &[u8]) -> Self {
        let mut data = HVec::new();
        data.extend_from_slice(payload).expect("payload fits MAX_BUF");
        VecPacketBuffer { data, rssi: 0 }
    }

    pub fn with_rssi(payload: &[u8], rssi: i16) -> Self {
        let mut buf = Self::with_payload(payload);
        buf.rssi = rssi;
        buf
    }
}

impl PacketBuffer for VecPacketBuffer {
    fn grow_header(&mut self, n: usize) -> Result<(), RoutingError> {
        if self.data.len() + n > self.data.capacity() {
            return Err(RoutingError::BufferGrowFailed);
        }
        for _ in 0..n {
            self.data.insert(0, 0).map_err(|_| RoutingError::BufferGrowFailed)?;
        }
        Ok(())
    }

    fn shrink_header(&mut self, n: usize) -> Result<(), RoutingError> {
        if n > self.data.len() {
            return Err(RoutingError::BufferShrinkFailed);
        }
        for _ in 0..n {
            self.data.remove(0);
        }
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) {
        self.data[offset..offset + data.len()].copy_from_slice(data);
    }

    fn read(&self, offset: usize, out: &mut [u8]) {
        out.copy_from_slice(&self.data[offset..offset + out.len()]);
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn rssi(&self) -> i16 {
        self.rssi
    }
}

#[derive(Default)]
pub struct LinkLog {
    pub broadcasts: u32,
    pub unicasts: Vec<(NodeAddress, Vec<u8>)>,
}

#[derive(Clone, Default)]
pub struct RecordingLink {
    log: Rc<RefCell<LinkLog>>,
}

impl RecordingLink {
    pub fn handle(&self) -> Rc<RefCell<LinkLog>> {
        self.log.clone()
    }
}

impl LinkLayer for RecordingLink {
    fn broadcast_send(&mut self, _buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        self.log.borrow_mut().broadcasts += 1;
        Ok(())
    }

    fn unicast_send(&mut self, dest: NodeAddress, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        let mut out = vec![0u8; buf.len()];
        buf.read(0, &mut out);
        self.log.borrow_mut().unicasts.push((dest, out));
        Ok(())
    }
}

#[derive(Default)]
pub struct TimerLog {
    pub scheduled: Vec<(TimerSlot, u32)>,
    pub cancelled: Vec<TimerSlot>,
}

impl TimerLog {
    pub fn is_scheduled(&self, slot: TimerSlot) -> bool {
        self.scheduled.iter().any(|(s, _)| *s == slot)
    }
}

#[derive(Clone, Default)]
pub struct RecordingTimer {
    log: Rc<RefCell<TimerLog>>,
}

impl RecordingTimer {
    pub fn handle(&self) -> Rc<RefCell<TimerLog>> {
        self.log.clone()
    }
}

impl TimerSource for RecordingTimer {
    fn schedule(&mut self, slot: TimerSlot, delay_ms: u32) {
        let mut log = self.log.borrow_mut();
        log.scheduled.retain(|(s, _)| *s != slot);
        log.scheduled.push((slot, delay_ms));
    }

    fn cancel(&mut self, slot: TimerSlot) {
        let mut log = self.log.borrow_mut();
        log.scheduled.retain(|(s, _)| *s != slot);
        log.cancelled.push(slot);
    }
}

pub struct FixedRng(pub u16);

impl RngSource for FixedRng {
    fn next_u16(&mut self) -> u16 {
        self.0
    }
}

#[derive(Default)]
pub struct CallbackLog {
    pub data: Vec<(NodeAddress, u8)>,
    pub commands: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct RecordingCallbacks {
    log: Rc<RefCell<CallbackLog>>,
}

impl RecordingCallbacks {
    pub fn handle(&self) -> Rc<RefCell<CallbackLog>> {
        self.log.clone()
    }
}

impl RoutingCallbacks for RecordingCallbacks {
    fn on_data_received(&mut self, source: NodeAddress, hops: u8) {
        self.log.borrow_mut().data.push((source, hops));
    }

    fn on_command_received(&mut self, hops: u8) {
        self.log.borrow_mut().commands.push(hops);
    }
}

/// Initializes `env_logger` once per test binary so `RUST_LOG=debug cargo
/// test -- --nocapture` surfaces the crate's own diagnostics.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
