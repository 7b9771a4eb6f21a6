//! Event logging for scenario setup and execution.
//!
//! Every setup step (node creation, mobility, device installation,
//! attachment) and every scheduled occurrence the run driver executes is
//! captured as an [`Event`] stamped with the simulation time at which it
//! happened. The log is append-only and kept in execution order, which makes
//! the setup ordering invariants checkable after the fact:
//!
//! - devices are installed after mobility and building registration
//! - mobility is made consistent before the clock starts
//! - applications start strictly after all setup, at a positive time
//!
//! Per-packet MAC transmissions are not logged here; they go to the trace
//! files.
//!
//! # Example
//!
//! ```rust
//! use mmwave_ca_scenario_core::models::{Event, EventLog};
//! use mmwave_ca_scenario_core::network::Direction;
//! use mmwave_ca_scenario_core::SimTime;
//!
//! let mut log = EventLog::new();
//! log.log(Event::ApplicationStarted {
//!     time: SimTime::from_millis(10),
//!     direction: Direction::Downlink,
//! });
//!
//! assert_eq!(log.events_of_type("ApplicationStarted").len(), 1);
//! ```

use crate::core::time::SimTime;
use crate::models::carrier::CarrierId;
use crate::models::node::{NodeId, NodeKind, Vector3};
use crate::network::{AppRole, DeviceKind, Direction};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Scenario event capturing a setup step or a runtime occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A component carrier was added to the carrier set
    CarrierConfigured {
        time: SimTime,
        carrier_id: CarrierId,
        frequency_hz: f64,
        bandwidth_hz: f64,
        is_primary: bool,
        blockage: bool,
    },

    NodeCreated {
        time: SimTime,
        node: NodeId,
        kind: NodeKind,
    },

    MobilityInstalled {
        time: SimTime,
        node: NodeId,
        model: String,
        position: Vector3,
    },

    /// Node registered with the building subsystem
    BuildingInfoInstalled {
        time: SimTime,
        node: NodeId,
        indoor: bool,
    },

    DeviceInstalled {
        time: SimTime,
        node: NodeId,
        device: DeviceKind,
        carriers: usize,
    },

    /// Point-to-point link between gateway and remote host
    LinkInstalled {
        time: SimTime,
        a: NodeId,
        b: NodeId,
        data_rate_bps: u64,
    },

    IpStackInstalled {
        time: SimTime,
        node: NodeId,
    },

    AddressAssigned {
        time: SimTime,
        node: NodeId,
        address: Ipv4Addr,
    },

    RouteInstalled {
        time: SimTime,
        node: NodeId,
        destination: Ipv4Addr,
        mask: Ipv4Addr,
        gateway: Option<Ipv4Addr>,
        interface: u32,
    },

    /// Terminal attached to its closest base station
    Attached {
        time: SimTime,
        terminal: NodeId,
        base_station: NodeId,
        cell_id: u16,
        rnti: u16,
        distance_m: f64,
    },

    BearerActivated {
        time: SimTime,
        rnti: u16,
        qci: u8,
    },

    ApplicationInstalled {
        time: SimTime,
        node: NodeId,
        role: AppRole,
        direction: Direction,
        port: u16,
    },

    /// Sink and client of one traffic direction started
    ApplicationStarted {
        time: SimTime,
        direction: Direction,
    },

    TracingEnabled {
        time: SimTime,
    },

    /// Indoor/outdoor status reconciled with current positions
    MobilityConsistencyApplied {
        time: SimTime,
        nodes: usize,
    },

    MobilityUpdated {
        time: SimTime,
        node: NodeId,
        position: Vector3,
    },

    SimulationStopped {
        time: SimTime,
    },
}

impl Event {
    /// Get the simulation time when this event occurred
    pub fn time(&self) -> SimTime {
        match self {
            Event::CarrierConfigured { time, .. } => *time,
            Event::NodeCreated { time, .. } => *time,
            Event::MobilityInstalled { time, .. } => *time,
            Event::BuildingInfoInstalled { time, .. } => *time,
            Event::DeviceInstalled { time, .. } => *time,
            Event::LinkInstalled { time, .. } => *time,
            Event::IpStackInstalled { time, .. } => *time,
            Event::AddressAssigned { time, .. } => *time,
            Event::RouteInstalled { time, .. } => *time,
            Event::Attached { time, .. } => *time,
            Event::BearerActivated { time, .. } => *time,
            Event::ApplicationInstalled { time, .. } => *time,
            Event::ApplicationStarted { time, .. } => *time,
            Event::TracingEnabled { time } => *time,
            Event::MobilityConsistencyApplied { time, .. } => *time,
            Event::MobilityUpdated { time, .. } => *time,
            Event::SimulationStopped { time } => *time,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::CarrierConfigured { .. } => "CarrierConfigured",
            Event::NodeCreated { .. } => "NodeCreated",
            Event::MobilityInstalled { .. } => "MobilityInstalled",
            Event::BuildingInfoInstalled { .. } => "BuildingInfoInstalled",
            Event::DeviceInstalled { .. } => "DeviceInstalled",
            Event::LinkInstalled { .. } => "LinkInstalled",
            Event::IpStackInstalled { .. } => "IpStackInstalled",
            Event::AddressAssigned { .. } => "AddressAssigned",
            Event::RouteInstalled { .. } => "RouteInstalled",
            Event::Attached { .. } => "Attached",
            Event::BearerActivated { .. } => "BearerActivated",
            Event::ApplicationInstalled { .. } => "ApplicationInstalled",
            Event::ApplicationStarted { .. } => "ApplicationStarted",
            Event::TracingEnabled { .. } => "TracingEnabled",
            Event::MobilityConsistencyApplied { .. } => "MobilityConsistencyApplied",
            Event::MobilityUpdated { .. } => "MobilityUpdated",
            Event::SimulationStopped { .. } => "SimulationStopped",
        }
    }

    /// Get the node this event concerns, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Event::NodeCreated { node, .. } => Some(*node),
            Event::MobilityInstalled { node, .. } => Some(*node),
            Event::BuildingInfoInstalled { node, .. } => Some(*node),
            Event::DeviceInstalled { node, .. } => Some(*node),
            Event::IpStackInstalled { node, .. } => Some(*node),
            Event::AddressAssigned { node, .. } => Some(*node),
            Event::RouteInstalled { node, .. } => Some(*node),
            Event::Attached { terminal, .. } => Some(*terminal),
            Event::ApplicationInstalled { node, .. } => Some(*node),
            Event::MobilityUpdated { node, .. } => Some(*node),
            _ => None,
        }
    }
}

/// Event log for storing and querying scenario events.
///
/// This is a simple wrapper around Vec<Event> with convenience methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific node
    pub fn events_for_node(&self, node: NodeId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.node() == Some(node))
            .collect()
    }

    /// Position of the first event of a type in execution order
    pub fn first_index_of(&self, event_type: &str) -> Option<usize> {
        self.events.iter().position(|e| e.event_type() == event_type)
    }

    /// Position of the last event of a type in execution order
    pub fn last_index_of(&self, event_type: &str) -> Option<usize> {
        self.events.iter().rposition(|e| e.event_type() == event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_time() {
        let event = Event::BearerActivated {
            time: SimTime::from_millis(3),
            rnti: 1,
            qci: 1,
        };

        assert_eq!(event.time(), SimTime::from_millis(3));
        assert_eq!(event.event_type(), "BearerActivated");
        assert_eq!(event.node(), None);
    }

    #[test]
    fn test_event_log_query_by_node() {
        let mut log = EventLog::new();

        log.log(Event::NodeCreated {
            time: SimTime::ZERO,
            node: NodeId(0),
            kind: NodeKind::BaseStation,
        });
        log.log(Event::NodeCreated {
            time: SimTime::ZERO,
            node: NodeId(1),
            kind: NodeKind::Terminal,
        });
        log.log(Event::IpStackInstalled {
            time: SimTime::ZERO,
            node: NodeId(1),
        });

        assert_eq!(log.events_for_node(NodeId(1)).len(), 2);
        assert_eq!(log.events_for_node(NodeId(0)).len(), 1);
    }

    #[test]
    fn test_first_and_last_index() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.log(Event::TracingEnabled { time: SimTime::ZERO });
        log.log(Event::ApplicationStarted {
            time: SimTime::from_millis(10),
            direction: Direction::Downlink,
        });
        log.log(Event::ApplicationStarted {
            time: SimTime::from_millis(10),
            direction: Direction::Uplink,
        });

        assert_eq!(log.first_index_of("ApplicationStarted"), Some(1));
        assert_eq!(log.last_index_of("ApplicationStarted"), Some(2));
        assert_eq!(log.first_index_of("SimulationStopped"), None);
    }
}
