//! Command-line harness that wires the routing core's own mock
//! collaborators together to run collection and dissemination scenarios
//! for manual inspection. Not part of the library's public surface — a
//! `std::time::Instant`-free, single-threaded stand-in for a real
//! multi-node deployment.

use clap::{Parser, Subcommand};
use log::info;

use wsn_routing::codec::{self, BeaconHeader};
use wsn_routing::test_support::{FixedRng, RecordingCallbacks, RecordingLink, RecordingTimer, VecPacketBuffer};
use wsn_routing::{Connection, NodeAddress};

#[derive(Parser, Debug)]
#[command(name = "wsn-routing-sim")]
struct Cli {
    #[command(subcommand)]
    scenario: Scenario,
}

#[derive(Subcommand, Debug)]
enum Scenario {
    /// A three-node chain ascends one data packet to the sink.
    Collect,
    /// The sink disseminates one command to the far end of a two-hop
    /// chain built from that same chain's own ascending traffic.
    Disseminate,
}

type SimConn = Connection<RecordingLink, RecordingTimer, FixedRng, RecordingCallbacks>;

fn addr(id: u16) -> NodeAddress {
    NodeAddress::new(id)
}

fn open_sink() -> SimConn {
    let mut buf = VecPacketBuffer::with_payload(&[]);
    Connection::open(addr(1), true, RecordingLink::default(), RecordingTimer::default(), FixedRng(11), RecordingCallbacks::default(), &mut buf)
}

fn open_router(id: u16) -> SimConn {
    let mut buf = VecPacketBuffer::with_payload(&[]);
    Connection::open(addr(id), false, RecordingLink::default(), RecordingTimer::default(), FixedRng(11), RecordingCallbacks::default(), &mut buf)
}

fn hear_beacon(conn: &mut SimConn, from: NodeAddress, seqn: u16, metric: u16, rssi: i16) {
    let mut buf = VecPacketBuffer::with_rssi(&[], rssi);
    codec::write_beacon(&mut buf, &BeaconHeader { seqn, metric }).unwrap();
    conn.on_broadcast_received(from, &buf);
}

fn last_unicast(conn: &SimConn) -> (NodeAddress, VecPacketBuffer) {
    let unicasts = &conn.link().unicasts;
    let (dest, bytes) = unicasts.last().expect("no unicast was sent").clone();
    (dest, VecPacketBuffer::with_payload(bytes.as_slice()))
}

fn run_collect() -> (SimConn, SimConn, SimConn) {
    let mut a = open_sink();
    let mut b = open_router(2);
    let mut c = open_router(3);

    hear_beacon(&mut b, addr(1), 1, a.metric(), -60);
    info!("B adopted parent {:?} at metric {}", b.parent(), b.metric());
    hear_beacon(&mut c, addr(2), 1, b.metric(), -60);
    info!("C adopted parent {:?} at metric {}", c.parent(), c.metric());

    let mut c_buf = VecPacketBuffer::with_payload(&[0xC0, 0xFF, 0xEE]);
    c.send_upward(&mut c_buf).unwrap();
    let (dest, mut relay) = last_unicast(&c);
    info!("C -> {:?}", dest);

    b.on_unicast_received(&mut relay).unwrap();
    let (dest, mut relay) = last_unicast(&b);
    info!("B -> {:?}", dest);

    a.on_unicast_received(&mut relay).unwrap();
    info!("sink delivered: {:?}", a.callbacks().data);

    (a, b, c)
}

fn run_disseminate() {
    let (mut a, mut b, mut c) = run_collect();

    let mut cmd_buf = VecPacketBuffer::with_payload(&[]);
    a.send_downward(addr(3), &mut cmd_buf).unwrap();
    let (dest, mut relay) = last_unicast(&a);
    info!("sink -> {:?}", dest);

    b.on_unicast_received(&mut relay).unwrap();
    let (dest, mut relay) = last_unicast(&b);
    info!("B -> {:?}", dest);

    c.on_unicast_received(&mut relay).unwrap();
    info!("C received command after {} hop(s)", c.callbacks().commands.last().copied().unwrap_or(u8::MAX));
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match cli.scenario {
        Scenario::Collect => {
            run_collect();
        }
        Scenario::Disseminate => {
            run_disseminate();
        }
    }
}
