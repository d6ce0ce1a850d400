//! External collaborator contracts.
//!
//! Everything in this module is *consumed*, not implemented, by the core:
//! link-layer datagram transports, the packet buffer, the countdown-timer
//! facility, the random-number source, and the application callbacks. The
//! core ships no production implementation of these — only the traits, and
//! (behind the `testing` feature / `#[cfg(test)]`) the mocks the test suite
//! drives itself with.

use crate::addr::NodeAddress;
use crate::error::RoutingError;

/// The scarce, process-wide scratch buffer owned by the link layer for the
/// duration of one receive/send operation.
///
/// `grow_header` reserves `n` bytes in front of whatever the buffer
/// currently holds; `shrink_header` drops the first `n` bytes. Both report
/// failure rather than panicking — an exhausted buffer or an attempt to
/// shrink past the end of the header are routine, recoverable conditions
/// here (see `RoutingError::BufferGrowFailed` / `BufferShrinkFailed`).
pub trait PacketBuffer {
    /// Reserve `n` bytes at the front of the buffer. Fails if the buffer is
    /// full.
    fn grow_header(&mut self, n: usize) -> Result<(), RoutingError>;

    /// Drop the first `n` bytes of the buffer's current contents. Fails if
    /// `n` exceeds the buffer's current length.
    fn shrink_header(&mut self, n: usize) -> Result<(), RoutingError>;

    /// Write `data` starting at byte `offset` from the front of the buffer.
    fn write(&mut self, offset: usize, data: &[u8]);

    /// Read `out.len()` bytes starting at byte `offset` from the front of
    /// the buffer.
    fn read(&self, offset: usize, out: &mut [u8]);

    /// Current length of the buffer's visible contents, in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// RSSI (dBm) of the last received frame carried in this buffer.
    /// Meaningless for outbound buffers.
    fn rssi(&self) -> i16;
}

/// Best-effort broadcast and single-hop unicast send.
///
/// Reception is not modeled here: the embedder's link layer delivers
/// inbound frames by calling `Connection::on_broadcast_received` /
/// `Connection::on_unicast_received` directly from its own receive
/// callback, passing the populated buffer and sender address.
pub trait LinkLayer {
    /// Broadcast the current contents of `buf` on the beacon channel.
    fn broadcast_send(&mut self, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError>;

    /// Send the current contents of `buf` to `dest` on the unicast
    /// channel. Returns failure on a single-hop delivery failure; there is
    /// no retransmission above link-layer ARQ.
    fn unicast_send(&mut self, dest: NodeAddress, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError>;
}

/// One of the three independently reschedulable one-shot timer slots a
/// `Connection` needs. Kept as distinct slots rather than one reused timer
/// so a topology-report deferral can't clobber a pending beacon
/// rebroadcast, or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    /// Sink-only: periodic beacon re-emission.
    Beacon,
    /// Router-only: deferred rebroadcast of the node's own beacon after a
    /// parent change.
    Forward,
    /// Router-only: deferred dedicated topology report after a parent
    /// change.
    TopologyReport,
}

/// The countdown-timer facility.
///
/// Scheduling the same slot again supersedes any pending expiry for it —
/// a rebroadcast deferred by an earlier parent change that hasn't fired
/// yet is simply replaced by the new delay, not queued alongside it. The
/// embedder's event loop is expected to call the matching
/// `Connection::on_*_timer` method when a slot's delay elapses.
pub trait TimerSource {
    fn schedule(&mut self, slot: TimerSlot, delay_ms: u32);
    fn cancel(&mut self, slot: TimerSlot);
}

/// The random-number source, used only for jittering deferred
/// rebroadcasts and topology reports.
pub trait RngSource {
    fn next_u16(&mut self) -> u16;
}

/// Application-layer callbacks.
pub trait RoutingCallbacks {
    /// Invoked at the sink after header stripping; the payload, if any, is
    /// still readable from the packet buffer the caller holds.
    fn on_data_received(&mut self, source: NodeAddress, hops: u8);

    /// Invoked at a router when a descending command packet terminates at
    /// it. Takes only `hops`, not a back-reference to the owning
    /// `Connection`: the callbacks are themselves a field of `Connection`,
    /// so handing `&mut Connection` into one of its own fields' methods
    /// would need a self-referential borrow. A callback that needs to
    /// react through the connection (e.g. to send a reply) does so on its
    /// next `send_downward`/`send_upward` call from the embedder's own
    /// event loop, not re-entrantly from inside this callback.
    fn on_command_received(&mut self, hops: u8);
}
