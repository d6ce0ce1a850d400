//! Upward (collection) and downward (source-routed dissemination)
//! forwarding.
//!
//! These are free functions over explicit parameters — no `Connection` in
//! sight — so the header growth/shrink and loop-detection logic can be
//! exercised directly against a mock `PacketBuffer` without wiring up
//! timers or callbacks, keeping hardware glue out of the functions that
//! actually decide what gets forwarded where.

use heapless::Vec as HVec;
use log::{info, warn};

use crate::addr::NodeAddress;
use crate::codec::{self, CollectHeader};
use crate::config::MAX_PATH_LENGTH;
use crate::error::RoutingError;
use crate::link::{LinkLayer, PacketBuffer, RoutingCallbacks};
use crate::logging::FORWARDING_TARGET;
use crate::routing_table::RoutingTable;

/// `send_upward`: build a fresh collect header (`path_length = 1`,
/// `hops = 0`) naming `self_addr` as the sole path entry so far, and
/// unicast it to `parent`.
pub fn send_upward(
    self_addr: NodeAddress,
    parent: NodeAddress,
    link: &mut dyn LinkLayer,
    buf: &mut dyn PacketBuffer,
) -> Result<(), RoutingError> {
    if parent.is_null() {
        return Err(RoutingError::NoParent);
    }
    let hdr = CollectHeader {
        source: self_addr,
        hops: 0,
        is_command: false,
        path_length: 1,
    };
    codec::write_collect_header_and_addrs(buf, &hdr, &[self_addr])?;
    link.unicast_send(parent, buf)
}

/// Result of forwarding an ascending packet one hop closer to the sink.
/// `subsumes_topology_report` tells the caller whether it just relayed a
/// dedicated topology report from a descendant, in which case its own
/// pending report timer should be cancelled: the descendant's report
/// already covers this node's own subtree.
#[derive(Debug)]
pub struct ForwardedUpward {
    pub subsumes_topology_report: bool,
}

/// Router-side forward of an ascending collect/topology-report packet.
/// Detects this node re-seeing a packet it already touched — a stale
/// replay or a routing loop — and refuses to forward it rather than
/// circulating it indefinitely.
pub fn forward_upward(
    self_addr: NodeAddress,
    parent: NodeAddress,
    link: &mut dyn LinkLayer,
    buf: &mut dyn PacketBuffer,
) -> Result<ForwardedUpward, RoutingError> {
    let hdr = codec::read_collect_header(buf)?;
    if hdr.path_length == 0 {
        return Err(RoutingError::MalformedFrame("ascending path_length is 0"));
    }

    let addrs = codec::read_addr_list(buf, hdr.path_length)?;
    if addrs.iter().any(|a| *a == self_addr) {
        warn!(target: FORWARDING_TARGET, "{self_addr:?} already present in ascending path from {:?}, dropping (loop)", hdr.source);
        return Err(RoutingError::LoopDetected);
    }

    let consumed = CollectHeader::WIRE_SIZE + hdr.path_length as usize * NodeAddress::WIRE_SIZE;
    buf.shrink_header(consumed)
        .map_err(|_| RoutingError::BufferShrinkFailed)?;

    let subsumes_topology_report = buf.is_empty();

    if parent.is_null() {
        return Err(RoutingError::NoParent);
    }

    let new_hops = hdr.hops + 1;
    let new_path_length = hdr.path_length + 1;

    let mut new_addrs: HVec<NodeAddress, MAX_PATH_LENGTH> = HVec::new();
    new_addrs.push(self_addr).map_err(|_| RoutingError::BufferGrowFailed)?;
    for a in addrs.iter() {
        new_addrs.push(*a).map_err(|_| RoutingError::BufferGrowFailed)?;
    }

    let new_hdr = CollectHeader {
        source: hdr.source,
        hops: new_hops,
        is_command: false,
        path_length: new_path_length,
    };
    codec::write_collect_header_and_addrs(buf, &new_hdr, &new_addrs)?;
    link.unicast_send(parent, buf)?;

    Ok(ForwardedUpward { subsumes_topology_report })
}

/// Sink-side ingestion of an ascending packet: records every adjacent
/// `(parent, child)` pair from the address list, plus `(sink, list[0])`,
/// then delivers the payload to the application unless it's an empty
/// dedicated topology report.
pub fn receive_at_sink(
    self_addr: NodeAddress,
    table: &mut RoutingTable,
    callbacks: &mut dyn RoutingCallbacks,
    buf: &mut dyn PacketBuffer,
) -> Result<(), RoutingError> {
    let hdr = codec::read_collect_header(buf)?;
    if hdr.path_length == 0 {
        return Err(RoutingError::MalformedFrame("ascending path_length is 0"));
    }
    let addrs = codec::read_addr_list(buf, hdr.path_length)?;

    for pair in addrs.windows(2) {
        table.update(pair[0], pair[1]);
    }
    if let Some(first) = addrs.first() {
        table.update(self_addr, *first);
    }

    let consumed = CollectHeader::WIRE_SIZE + hdr.path_length as usize * NodeAddress::WIRE_SIZE;
    buf.shrink_header(consumed)
        .map_err(|_| RoutingError::BufferShrinkFailed)?;

    if buf.is_empty() {
        info!(target: FORWARDING_TARGET, "dedicated topology report from {:?} (hops {})", hdr.source, hdr.hops);
        return Ok(());
    }

    callbacks.on_data_received(hdr.source, hdr.hops);
    Ok(())
}

/// `send_downward`: looks up the source route to `dest`, splits off the
/// first hop, and embeds the remainder in the outgoing command packet.
pub fn send_downward(
    self_addr: NodeAddress,
    table: &RoutingTable,
    link: &mut dyn LinkLayer,
    dest: NodeAddress,
    buf: &mut dyn PacketBuffer,
) -> Result<(), RoutingError> {
    let route = table.find_route(dest)?;
    if route.is_empty() {
        return Err(RoutingError::NoPath);
    }

    let next_hop = route.next_hop().expect("non-empty route has a next hop");
    let remaining = route.remaining();

    let hdr = CollectHeader {
        source: self_addr,
        hops: 0,
        is_command: true,
        path_length: remaining.len() as u8,
    };
    codec::write_collect_header_and_addrs(buf, &hdr, remaining)?;
    link.unicast_send(next_hop, buf)
}

/// Router-side forward of a descending command packet. When this node is
/// the route's terminus (`path_length == 0`), delivers to the application
/// instead of forwarding.
pub fn forward_downward(
    is_sink: bool,
    link: &mut dyn LinkLayer,
    callbacks: &mut dyn RoutingCallbacks,
    buf: &mut dyn PacketBuffer,
) -> Result<(), RoutingError> {
    if is_sink {
        warn!(target: FORWARDING_TARGET, "sink received a command packet, dropping");
        return Err(RoutingError::MalformedFrame("command packet arrived at sink"));
    }

    let hdr = codec::read_collect_header(buf)?;

    if hdr.path_length == 0 {
        buf.shrink_header(CollectHeader::WIRE_SIZE)
            .map_err(|_| RoutingError::BufferShrinkFailed)?;
        callbacks.on_command_received(hdr.hops);
        return Ok(());
    }

    let next = codec::read_first_addr(buf);
    buf.shrink_header(NodeAddress::WIRE_SIZE)
        .map_err(|_| RoutingError::BufferShrinkFailed)?;

    let new_hdr = CollectHeader {
        source: hdr.source,
        hops: hdr.hops + 1,
        is_command: true,
        path_length: hdr.path_length - 1,
    };
    codec::write_collect_header_fields(buf, &new_hdr);
    link.unicast_send(next, buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingCallbacks, RecordingLink, VecPacketBuffer};

    fn addr(id: u16) -> NodeAddress {
        NodeAddress::new(id)
    }

    #[test]
    fn send_upward_fails_without_parent() {
        let mut link = RecordingLink::default();
        let mut buf = VecPacketBuffer::with_payload(&[1, 2]);
        let err = send_upward(addr(3), NodeAddress::NULL, &mut link, &mut buf).unwrap_err();
        assert_eq!(err, RoutingError::NoParent);
    }

    #[test]
    fn send_upward_builds_single_entry_path() {
        let mut link = RecordingLink::default();
        let mut buf = VecPacketBuffer::with_payload(&[0xDE, 0xAD]);
        send_upward(addr(3), addr(2), &mut link, &mut buf).unwrap();
        assert_eq!(link.unicasts.len(), 1);
        assert_eq!(link.unicasts[0].0, addr(2));

        let hdr = codec::read_collect_header(&buf).unwrap();
        assert_eq!(hdr.path_length, 1);
        assert_eq!(hdr.source, addr(3));
        let list = codec::read_addr_list(&buf, 1).unwrap();
        assert_eq!(list.as_slice(), &[addr(3)]);
    }

    #[test]
    fn forward_upward_prepends_self_and_increments_counters() {
        let mut link = RecordingLink::default();
        let mut buf = VecPacketBuffer::with_payload(&[0xDE, 0xAD]);
        let hdr = CollectHeader { source: addr(3), hops: 0, is_command: false, path_length: 1 };
        codec::write_collect_header_and_addrs(&mut buf, &hdr, &[addr(3)]).unwrap();

        let result = forward_upward(addr(2), addr(1), &mut link, &mut buf).unwrap();
        assert!(!result.subsumes_topology_report);

        let new_hdr = codec::read_collect_header(&buf).unwrap();
        assert_eq!(new_hdr.hops, 1);
        assert_eq!(new_hdr.path_length, 2);
        let list = codec::read_addr_list(&buf, 2).unwrap();
        assert_eq!(list.as_slice(), &[addr(2), addr(3)]);
        assert_eq!(link.unicasts[0].0, addr(1));
    }

    #[test]
    fn forward_upward_drops_self_loop() {
        let mut link = RecordingLink::default();
        let mut buf = VecPacketBuffer::with_payload(&[]);
        let hdr = CollectHeader { source: addr(3), hops: 1, is_command: false, path_length: 2 };
        codec::write_collect_header_and_addrs(&mut buf, &hdr, &[addr(3), addr(5)]).unwrap();

        let err = forward_upward(addr(5), addr(1), &mut link, &mut buf).unwrap_err();
        assert_eq!(err, RoutingError::LoopDetected);
        assert!(link.unicasts.is_empty());
    }

    #[test]
    fn forward_upward_flags_topology_report_subsumption() {
        let mut link = RecordingLink::default();
        let mut buf = VecPacketBuffer::with_payload(&[]);
        let hdr = CollectHeader { source: addr(9), hops: 2, is_command: false, path_length: 1 };
        codec::write_collect_header_and_addrs(&mut buf, &hdr, &[addr(9)]).unwrap();
        let result = forward_upward(addr(4), addr(1), &mut link, &mut buf).unwrap();
        assert!(result.subsumes_topology_report);
    }

    #[test]
    fn receive_at_sink_ingests_all_adjacent_pairs_and_delivers() {
        let mut table = RoutingTable::new(addr(1));
        let mut callbacks = RecordingCallbacks::default();
        let mut buf = VecPacketBuffer::with_payload(&[0xDE, 0xAD]);
        // Chain C -> B -> A(sink); address list = [B, C]
        let hdr = CollectHeader { source: addr(3), hops: 2, is_command: false, path_length: 2 };
        codec::write_collect_header_and_addrs(&mut buf, &hdr, &[addr(2), addr(3)]).unwrap();

        receive_at_sink(addr(1), &mut table, &mut callbacks, &mut buf).unwrap();

        assert_eq!(table.parent_of(addr(2)), addr(1));
        assert_eq!(table.parent_of(addr(3)), addr(2));
        assert_eq!(callbacks.data.as_slice(), &[(addr(3), 2)]);
    }

    #[test]
    fn receive_at_sink_treats_empty_payload_as_topology_report() {
        let mut table = RoutingTable::new(addr(1));
        let mut callbacks = RecordingCallbacks::default();
        let mut buf = VecPacketBuffer::with_payload(&[]);
        let hdr = CollectHeader { source: addr(3), hops: 1, is_command: false, path_length: 1 };
        codec::write_collect_header_and_addrs(&mut buf, &hdr, &[addr(3)]).unwrap();

        receive_at_sink(addr(1), &mut table, &mut callbacks, &mut buf).unwrap();
        assert!(callbacks.data.is_empty());
    }

    #[test]
    fn send_downward_splits_next_hop_from_remainder() {
        let mut table = RoutingTable::new(addr(1));
        table.update(addr(1), addr(2));
        table.update(addr(2), addr(3));
        let mut link = RecordingLink::default();
        let mut buf = VecPacketBuffer::with_payload(&[]);

        send_downward(addr(1), &table, &mut link, addr(3), &mut buf).unwrap();

        assert_eq!(link.unicasts[0].0, addr(2));
        let hdr = codec::read_collect_header(&buf).unwrap();
        assert!(hdr.is_command);
        assert_eq!(hdr.path_length, 1);
        let list = codec::read_addr_list(&buf, 1).unwrap();
        assert_eq!(list.as_slice(), &[addr(3)]);
    }

    #[test]
    fn send_downward_rejects_loop() {
        let mut table = RoutingTable::new(addr(1));
        table.update(addr(3), addr(2));
        table.update(addr(2), addr(3));
        let mut link = RecordingLink::default();
        let mut buf = VecPacketBuffer::with_payload(&[]);
        let err = send_downward(addr(1), &table, &mut link, addr(3), &mut buf).unwrap_err();
        assert_eq!(err, RoutingError::LoopDetected);
    }

    #[test]
    fn forward_downward_terminus_delivers_to_app() {
        let mut link = RecordingLink::default();
        let mut callbacks = RecordingCallbacks::default();
        let mut buf = VecPacketBuffer::with_payload(&[]);
        let hdr = CollectHeader { source: addr(1), hops: 1, is_command: true, path_length: 0 };
        codec::write_collect_header_and_addrs(&mut buf, &hdr, &[]).unwrap();

        forward_downward(false, &mut link, &mut callbacks, &mut buf).unwrap();
        assert_eq!(callbacks.commands.as_slice(), &[1]);
        assert!(link.unicasts.is_empty());
    }

    #[test]
    fn forward_downward_mid_route_consumes_one_hop() {
        let mut link = RecordingLink::default();
        let mut callbacks = RecordingCallbacks::default();
        let mut buf = VecPacketBuffer::with_payload(&[]);
        let hdr = CollectHeader { source: addr(1), hops: 0, is_command: true, path_length: 1 };
        codec::write_collect_header_and_addrs(&mut buf, &hdr, &[addr(3)]).unwrap();

        forward_downward(false, &mut link, &mut callbacks, &mut buf).unwrap();

        assert_eq!(link.unicasts[0].0, addr(3));
        let new_hdr = codec::read_collect_header(&buf).unwrap();
        assert_eq!(new_hdr.hops, 1);
        assert_eq!(new_hdr.path_length, 0);
    }

    #[test]
    fn forward_downward_at_sink_is_rejected() {
        let mut link = RecordingLink::default();
        let mut callbacks = RecordingCallbacks::default();
        let mut buf = VecPacketBuffer::with_payload(&[]);
        let hdr = CollectHeader { source: addr(1), hops: 0, is_command: true, path_length: 0 };
        codec::write_collect_header_and_addrs(&mut buf, &hdr, &[]).unwrap();
        let err = forward_downward(true, &mut link, &mut callbacks, &mut buf).unwrap_err();
        assert!(matches!(err, RoutingError::MalformedFrame(_)));
    }
}
