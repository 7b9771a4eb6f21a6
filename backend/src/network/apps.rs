//! UDP applications of the full-stack branch

use crate::core::time::SimTime;
use crate::models::node::NodeId;
use crate::network::Direction;
use serde::{Deserialize, Serialize};
use std::net::SocketAddrV4;

/// Receiving end of a flow; counts what arrives on its port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketSink {
    pub node: NodeId,
    pub port: u16,
    pub received_packets: u64,
    pub received_bytes: u64,
}

impl PacketSink {
    pub fn new(node: NodeId, port: u16) -> Self {
        Self {
            node,
            port,
            received_packets: 0,
            received_bytes: 0,
        }
    }

    pub fn receive(&mut self, bytes: u32) {
        self.received_packets += 1;
        self.received_bytes += u64::from(bytes);
    }
}

/// Constant-bit-rate UDP sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdpClient {
    pub node: NodeId,
    pub remote: SocketAddrV4,
    pub interval: SimTime,
    pub max_packets: u64,
    pub packet_size: u32,
    pub sent_packets: u64,
}

impl UdpClient {
    pub fn new(node: NodeId, remote: SocketAddrV4, interval: SimTime, max_packets: u64, packet_size: u32) -> Self {
        Self {
            node,
            remote,
            interval,
            max_packets,
            packet_size,
            sent_packets: 0,
        }
    }

    /// Payload size of the next datagram, or `None` once the budget is spent
    pub fn next_packet(&mut self) -> Option<u32> {
        if self.sent_packets >= self.max_packets {
            return None;
        }
        self.sent_packets += 1;
        Some(self.packet_size)
    }

    pub fn has_remaining(&self) -> bool {
        self.sent_packets < self.max_packets
    }
}

/// One direction of traffic: a client feeding a sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficFlow {
    pub direction: Direction,
    pub client: UdpClient,
    pub sink: PacketSink,
    pub start: SimTime,
    started: bool,
}

impl TrafficFlow {
    pub fn new(direction: Direction, client: UdpClient, sink: PacketSink, start: SimTime) -> Self {
        Self {
            direction,
            client,
            sink,
            start,
            started: false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Mark both ends started; false if they already were
    pub fn start(&mut self) -> bool {
        !std::mem::replace(&mut self.started, true)
    }
}
