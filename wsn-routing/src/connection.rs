//! The per-node `Connection` facade binding the routing engine to
//! concrete link/timer/rng/callback implementations and exposing `open`,
//! `send_upward`, `send_downward`.

use log::{debug, info, warn};

use crate::addr::NodeAddress;
use crate::beacon::{self, BeaconDecision, BeaconObservation, BeaconState};
use crate::codec::{self, BeaconHeader};
use crate::config::RoutingConfig;
use crate::error::RoutingError;
use crate::forwarding;
use crate::link::{LinkLayer, PacketBuffer, RngSource, RoutingCallbacks, TimerSlot, TimerSource};
use crate::logging::{BEACON_TARGET, CONNECTION_TARGET};
use crate::routing_table::RoutingTable;

/// Routing state for one node, generic over the four external
/// collaborator traits it consumes. Carrying them as type parameters
/// rather than `dyn Trait` objects owns its hardware handles as concrete
/// generic fields instead of paying for dynamic dispatch, which is the
/// right trade when the implementations are fixed at compile time for one
/// firmware image.
///
/// Every method that needs to send or parse a frame takes the packet
/// buffer as an explicit argument — it is the embedder's scratch area,
/// never owned by `Connection` itself, so the event loop (whether driven
/// by a link-layer receive callback or a timer expiry) hands in the same
/// buffer it already holds for the duration of the call.
pub struct Connection<L: LinkLayer, T: TimerSource, R: RngSource, C: RoutingCallbacks> {
    self_addr: NodeAddress,
    parent: NodeAddress,
    parent_rssi: i16,
    metric: u16,
    beacon_seqn: u16,
    is_sink: bool,
    config: RoutingConfig,
    routing_table: Option<RoutingTable>,
    link: L,
    timer: T,
    rng: R,
    callbacks: C,
}

impl<L: LinkLayer, T: TimerSource, R: RngSource, C: RoutingCallbacks> Connection<L, T, R, C> {
    /// `open(conn, channel, is_sink, callbacks)` — the channel split
    /// (broadcast on `channel`, unicast on `channel + 1`) is the
    /// embedder's `LinkLayer` implementation's concern; this constructor
    /// only establishes the node's own routing state. The sink's initial
    /// beacon is sent using `initial_beacon_buf`.
    pub fn open(
        self_addr: NodeAddress,
        is_sink: bool,
        link: L,
        timer: T,
        rng: R,
        callbacks: C,
        initial_beacon_buf: &mut dyn PacketBuffer,
    ) -> Self {
        Self::open_with_config(self_addr, is_sink, link, timer, rng, callbacks, RoutingConfig::default(), initial_beacon_buf)
    }

    pub fn open_with_config(
        self_addr: NodeAddress,
        is_sink: bool,
        link: L,
        timer: T,
        rng: R,
        callbacks: C,
        config: RoutingConfig,
        initial_beacon_buf: &mut dyn PacketBuffer,
    ) -> Self {
        let mut conn = Connection {
            self_addr,
            parent: NodeAddress::NULL,
            parent_rssi: i16::MIN,
            metric: u16::MAX,
            beacon_seqn: 0,
            is_sink,
            config,
            routing_table: None,
            link,
            timer,
            rng,
            callbacks,
        };

        if is_sink {
            conn.metric = 0;
            conn.routing_table = Some(RoutingTable::with_max_path_length(self_addr, config.max_path_length));
            info!(target: CONNECTION_TARGET, "{self_addr:?} opened as sink");
            let _ = conn.emit_beacon(initial_beacon_buf);
            conn.timer.schedule(TimerSlot::Beacon, conn.config.beacon_interval_ms);
        } else {
            info!(target: CONNECTION_TARGET, "{self_addr:?} opened as router");
        }

        conn
    }

    pub fn self_addr(&self) -> NodeAddress {
        self.self_addr
    }

    pub fn parent(&self) -> NodeAddress {
        self.parent
    }

    pub fn metric(&self) -> u16 {
        self.metric
    }

    pub fn is_sink(&self) -> bool {
        self.is_sink
    }

    /// Exposes the collaborators for inspection by simulation harnesses
    /// built against mock implementations (see `demos/sim`). Not needed by
    /// production embedders, who already own these values themselves.
    #[cfg(feature = "testing")]
    pub fn link(&self) -> &L {
        &self.link
    }

    #[cfg(feature = "testing")]
    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    fn emit_beacon(&mut self, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        let hdr = BeaconHeader { seqn: self.beacon_seqn, metric: self.metric };
        codec::write_beacon(buf, &hdr)?;
        self.link.broadcast_send(buf)
    }

    /// Called by the embedder's event loop when the sink's periodic
    /// beacon timer elapses.
    pub fn on_beacon_timer(&mut self, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        debug_assert!(self.is_sink, "only the sink schedules the periodic beacon timer");
        self.beacon_seqn = self.beacon_seqn.wrapping_add(1);
        self.emit_beacon(buf)?;
        self.timer.schedule(TimerSlot::Beacon, self.config.beacon_interval_ms);
        Ok(())
    }

    /// Called by the embedder's event loop when a router's deferred
    /// rebroadcast timer elapses.
    pub fn on_forward_timer(&mut self, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        self.emit_beacon(buf)
    }

    /// Called by the embedder's event loop when a router's deferred
    /// dedicated-topology-report timer elapses.
    pub fn on_topology_report_timer(&mut self, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        forwarding::send_upward(self.self_addr, self.parent, &mut self.link, buf)
    }

    /// `on_broadcast_recv`: the link layer hands us a populated buffer
    /// carrying a beacon frame and the sender's address.
    pub fn on_broadcast_received(&mut self, sender: NodeAddress, buf: &dyn PacketBuffer) {
        if self.is_sink {
            // The sink only ever sends beacons; it has nothing to learn
            // from hearing its own broadcast domain.
            return;
        }

        let hdr = match codec::read_beacon(buf) {
            Ok(hdr) => hdr,
            Err(err) => {
                warn!(target: BEACON_TARGET, "malformed frame from {sender:?}: {err}");
                return;
            }
        };

        let local = BeaconState { seqn: self.beacon_seqn, metric: self.metric, parent_rssi: self.parent_rssi };
        let obs = BeaconObservation { sender, seqn: hdr.seqn, metric: hdr.metric, rssi: buf.rssi() };

        match beacon::decide(&local, &obs, self.config.rssi_threshold_dbm) {
            BeaconDecision::Discard => {
                debug!(target: BEACON_TARGET, "discarding beacon from {sender:?} (seqn {}, metric {})", hdr.seqn, hdr.metric);
            }
            BeaconDecision::Adopt { new_metric, epoch_changed } => {
                if epoch_changed {
                    self.beacon_seqn = hdr.seqn;
                }
                self.adopt_parent(sender, new_metric, obs.rssi);
            }
        }
    }

    fn adopt_parent(&mut self, sender: NodeAddress, new_metric: u16, rssi: i16) {
        self.metric = new_metric;
        self.parent = sender;
        self.parent_rssi = rssi;
        info!(target: BEACON_TARGET, "{:?} adopted new parent {sender:?} (metric {new_metric}, rssi {rssi})", self.self_addr);

        let forward_delay = beacon::rebroadcast_delay_ms(self.config.beacon_forward_delay_max_ms, self.rng.next_u16());
        self.timer.schedule(TimerSlot::Forward, forward_delay);

        let report_delay = beacon::topology_report_delay_ms(
            forward_delay,
            self.metric,
            self.config.max_path_length as u16,
            self.config.beacon_interval_ms,
            self.rng.next_u16(),
        );
        self.timer.schedule(TimerSlot::TopologyReport, report_delay);
    }

    /// `on_unicast_recv`: dispatches an inbound collect-frame buffer to
    /// the ascending or descending forwarding path based on
    /// `is_command`.
    pub fn on_unicast_received(&mut self, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        let hdr = codec::read_collect_header(buf)?;

        if hdr.is_command {
            forwarding::forward_downward(self.is_sink, &mut self.link, &mut self.callbacks, buf)
        } else if self.is_sink {
            let table = self
                .routing_table
                .as_mut()
                .expect("sink always has a routing table");
            forwarding::receive_at_sink(self.self_addr, table, &mut self.callbacks, buf)
        } else {
            let result = forwarding::forward_upward(self.self_addr, self.parent, &mut self.link, buf)?;
            if result.subsumes_topology_report {
                self.timer.cancel(TimerSlot::TopologyReport);
            }
            Ok(())
        }
    }

    /// `send_upward(conn)`.
    pub fn send_upward(&mut self, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        forwarding::send_upward(self.self_addr, self.parent, &mut self.link, buf)
    }

    /// `send_downward(conn, dest)`. Sink-only; rejects `dest == self`.
    pub fn send_downward(&mut self, dest: NodeAddress, buf: &mut dyn PacketBuffer) -> Result<(), RoutingError> {
        if dest == self.self_addr {
            return Err(RoutingError::NoPath);
        }
        let table = self.routing_table.as_ref().ok_or(RoutingError::NoParent)?;
        forwarding::send_downward(self.self_addr, table, &mut self.link, dest, buf)
    }

    /// C-ABI-flavored wrapper matching the original `0` on failure,
    /// nonzero on submitted convention, for embedders porting call sites
    /// straight from the firmware this crate replaces.
    pub fn send_upward_raw(&mut self, buf: &mut dyn PacketBuffer) -> u8 {
        self.send_upward(buf).is_ok() as u8
    }

    pub fn send_downward_raw(&mut self, dest: NodeAddress, buf: &mut dyn PacketBuffer) -> u8 {
        self.send_downward(dest, buf).is_ok() as u8
    }
}
