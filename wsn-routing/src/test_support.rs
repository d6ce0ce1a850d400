//! In-memory stand-ins for the external collaborators, used only by this
//! crate's own unit tests. A `VecPacketBuffer` big enough for any frame
//! this protocol produces, plus trivial `LinkLayer` / `TimerSource` /
//! `RngSource` / `RoutingCallbacks` recorders.

use heapless::Vec as HVec;

use crate::addr::NodeAddress;
use crate::error::RoutingError;
use crate::link::{LinkLayer, PacketBuffer, RngSource, RoutingCallbacks, TimerSlot, TimerSource};

const MAX_BUF: usize = 128;

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

/// Records every broadcast/unicast send it's asked to do, so tests can
/// assert on what the engine attempted to transmit.
#[derive(Default)]
pub struct RecordingLink {
    pub broadcasts: u32,
    pub unicasts: HVec<(NodeAddress, HVec<u8, MAX_BUF>), 16>,
    pub fail_unicast_to: Option<NodeAddress>,
}

impl LinkLayer for RecordingLink {
    fn broadcast_send(&mut self, _buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        self.broadcasts += 1;
        Ok(())
    }

    fn unicast_send(&mut self, dest: NodeAddress, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        if self.fail_unicast_to == Some(dest) {
            return Err(RoutingError::NoParent);
        }
        let mut bytes: HVec<u8, MAX_BUF> = HVec::new();
        let mut scratch = [0u8; MAX_BUF];
        let len = buf.len();
        buf.read(0, &mut scratch[..len]);
        let _ = bytes.extend_from_slice(&scratch[..len]);
        let _ = self.unicasts.push((dest, bytes));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingTimer {
    pub scheduled: HVec<(TimerSlot, u32), 8>,
    pub cancelled: HVec<TimerSlot, 8>,
}

impl TimerSource for RecordingTimer {
    fn schedule(&mut self, slot: TimerSlot, delay_ms: u32) {
        self.scheduled.retain(|(s, _)| *s != slot);
        let _ = self.scheduled.push((slot, delay_ms));
    }

    fn cancel(&mut self, slot: TimerSlot) {
        self.scheduled.retain(|(s, _)| *s != slot);
        let _ = self.cancelled.push(slot);
    }
}

impl RecordingTimer {
    pub fn is_scheduled(&self, slot: TimerSlot) -> bool {
        self.scheduled.iter().any(|(s, _)| *s == slot)
    }
}

/// Deterministic RNG: always returns the same value, so delay-jitter tests
/// are reproducible without pulling in a `rand` dependency this crate has
/// no other use for.
pub struct FixedRng(pub u16);

impl RngSource for FixedRng {
    fn next_u16(&mut self) -> u16 {
        self.0
    }
}

#[derive(Default)]
pub struct RecordingCallbacks {
    pub data: HVec<(NodeAddress, u8), 16>,
    pub commands: HVec<u8, 16>,
}

impl RoutingCallbacks for RecordingCallbacks {
    fn on_data_received(&mut self, source: NodeAddress, hops: u8) {
        let _ = self.data.push((source, hops));
    }

    fn on_command_received(&mut self, hops: u8) {
        let _ = self.commands.push(hops);
    }
}
