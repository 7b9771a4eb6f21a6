//! Attachment orchestration
//!
//! Drives a run through its setup phases:
//!
//! ```text
//! Configuring → AttachingDevices ─┬─ FullStackBranch ────┬→ TracingEnabled → Running → Terminated
//!                                 └─ DirectBearerBranch ─┘
//! ```
//!
//! The full-stack branch builds the packet gateway, the remote host, the
//! addressing plan and two UDP flows, and schedules one application start
//! per direction. The direct-bearer branch attaches the terminal and
//! activates a single GBR bearer fed with saturation traffic. Both branches
//! end in the same tracing setup.

use super::engine::ScenarioAction;
use crate::config::{OutputDefaults, ScenarioDefaults};
use crate::core::time::SimTime;
use crate::error::{Result, ScenarioError};
use crate::models::event::{Event, EventLog};
use crate::models::node::{NodeId, NodeKind};
use crate::network::{
    AppRole, CoreNetwork, Direction, PacketSink, Qci, RadioBearer, RadioNetwork, ServingCell,
    StaticRoute, TrafficFlow, UdpClient,
};
use crate::sim::Scheduler;
use crate::topology::{NetworkTopology, RadioTopology};
use crate::trace::TraceSet;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentPhase {
    Configuring,
    AttachingDevices,
    FullStackBranch,
    DirectBearerBranch,
    TracingEnabled,
    Running,
    Terminated,
}

impl AttachmentPhase {
    pub fn can_transition_to(self, next: AttachmentPhase) -> bool {
        use AttachmentPhase::*;
        matches!(
            (self, next),
            (Configuring, AttachingDevices)
                | (AttachingDevices, FullStackBranch)
                | (AttachingDevices, DirectBearerBranch)
                | (FullStackBranch, TracingEnabled)
                | (DirectBearerBranch, TracingEnabled)
                | (TracingEnabled, Running)
                | (Running, Terminated)
        )
    }
}

/// Which branch a run takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentMode {
    FullStack,
    DirectBearer,
}

impl AttachmentMode {
    pub fn from_use_epc(use_epc: bool) -> Self {
        if use_epc {
            AttachmentMode::FullStack
        } else {
            AttachmentMode::DirectBearer
        }
    }

    fn phase(self) -> AttachmentPhase {
        match self {
            AttachmentMode::FullStack => AttachmentPhase::FullStackBranch,
            AttachmentMode::DirectBearer => AttachmentPhase::DirectBearerBranch,
        }
    }
}

/// Gateway, addressing and applications of a full-stack attachment
#[derive(Debug, Clone)]
pub struct FullStackAttachment {
    pub pgw: NodeId,
    pub remote_host: NodeId,
    pub remote_address: Ipv4Addr,
    pub ue_address: Ipv4Addr,
    pub core: CoreNetwork,
    pub serving: ServingCell,
    /// Default EPS bearer carrying both flows
    pub bearer: RadioBearer,
    pub downlink: TrafficFlow,
    pub uplink: TrafficFlow,
}

impl FullStackAttachment {
    pub fn flow(&self, direction: Direction) -> &TrafficFlow {
        match direction {
            Direction::Downlink => &self.downlink,
            Direction::Uplink => &self.uplink,
        }
    }

    pub fn flow_mut(&mut self, direction: Direction) -> &mut TrafficFlow {
        match direction {
            Direction::Downlink => &mut self.downlink,
            Direction::Uplink => &mut self.uplink,
        }
    }
}

/// Single GBR bearer with saturation traffic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectBearerAttachment {
    pub serving: ServingCell,
    pub bearer: RadioBearer,
    pub pdu_bytes: u32,
    pub interval: SimTime,
}

#[derive(Debug, Clone)]
pub enum Attachment {
    FullStack(FullStackAttachment),
    DirectBearer(DirectBearerAttachment),
}

impl Attachment {
    pub fn mode(&self) -> AttachmentMode {
        match self {
            Attachment::FullStack(_) => AttachmentMode::FullStack,
            Attachment::DirectBearer(_) => AttachmentMode::DirectBearer,
        }
    }

    pub fn serving(&self) -> &ServingCell {
        match self {
            Attachment::FullStack(fs) => &fs.serving,
            Attachment::DirectBearer(db) => &db.serving,
        }
    }

    pub fn bearer(&self) -> &RadioBearer {
        match self {
            Attachment::FullStack(fs) => &fs.bearer,
            Attachment::DirectBearer(db) => &db.bearer,
        }
    }
}

/// Everything a branch may touch while attaching
pub struct AttachContext<'a> {
    pub topology: &'a mut NetworkTopology,
    pub radio: &'a mut RadioNetwork,
    pub scheduler: &'a mut Scheduler<ScenarioAction>,
    pub log: &'a mut EventLog,
    pub defaults: &'a ScenarioDefaults,
    pub terminal: NodeId,
}

/// Phase tracker for one run
#[derive(Debug, Clone)]
pub struct AttachmentOrchestrator {
    phase: AttachmentPhase,
    history: Vec<AttachmentPhase>,
}

impl Default for AttachmentOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachmentOrchestrator {
    pub fn new() -> Self {
        Self {
            phase: AttachmentPhase::Configuring,
            history: vec![AttachmentPhase::Configuring],
        }
    }

    pub fn phase(&self) -> AttachmentPhase {
        self.phase
    }

    /// Every phase entered so far, in order
    pub fn history(&self) -> &[AttachmentPhase] {
        &self.history
    }

    fn advance(&mut self, to: AttachmentPhase) -> Result<()> {
        if !self.phase.can_transition_to(to) {
            return Err(ScenarioError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        debug!(from = ?self.phase, to = ?to, "attachment phase");
        self.phase = to;
        self.history.push(to);
        Ok(())
    }

    /// Install the base-station device, then the terminal device
    pub fn install_devices(
        &mut self,
        radio_topology: &mut RadioTopology,
        radio: &mut RadioNetwork,
        time: SimTime,
        log: &mut EventLog,
    ) -> Result<()> {
        self.advance(AttachmentPhase::AttachingDevices)?;
        radio.install_enb_device(&mut radio_topology.topology, radio_topology.base_station, time, log)?;
        radio.install_ue_device(&mut radio_topology.topology, radio_topology.terminal, time, log)?;
        Ok(())
    }

    /// Run the branch selected by `mode`
    pub fn attach(&mut self, mode: AttachmentMode, ctx: AttachContext<'_>) -> Result<Attachment> {
        self.advance(mode.phase())?;
        let attachment = match mode {
            AttachmentMode::FullStack => Attachment::FullStack(attach_full_stack(ctx)?),
            AttachmentMode::DirectBearer => Attachment::DirectBearer(attach_direct_bearer(ctx)?),
        };
        info!(mode = ?mode, rnti = attachment.serving().rnti, "attachment complete");
        Ok(attachment)
    }

    /// Create the trace files and log the tracing milestone
    pub fn enable_tracing(
        &mut self,
        output_dir: &Path,
        names: &OutputDefaults,
        time: SimTime,
        log: &mut EventLog,
    ) -> Result<TraceSet> {
        self.advance(AttachmentPhase::TracingEnabled)?;
        let traces = TraceSet::create(output_dir, names)?;
        log.log(Event::TracingEnabled { time });
        Ok(traces)
    }

    pub fn start(&mut self) -> Result<()> {
        self.advance(AttachmentPhase::Running)
    }

    pub fn terminate(&mut self) -> Result<()> {
        self.advance(AttachmentPhase::Terminated)
    }
}

fn attach_full_stack(ctx: AttachContext<'_>) -> Result<FullStackAttachment> {
    let AttachContext {
        topology,
        radio,
        scheduler,
        log,
        defaults,
        terminal,
    } = ctx;
    let time = scheduler.now();
    let core_defaults = &defaults.core_network;
    let traffic = &defaults.traffic;

    let pgw = topology.create_node(NodeKind::PacketGateway, time, log);
    let remote_host = topology.create_node(NodeKind::RemoteHost, time, log);

    let mut core = CoreNetwork::new(pgw, core_defaults)?;
    core.install_internet_stack(pgw, time, log);
    core.install_internet_stack(remote_host, time, log);
    let remote_address = core.connect_remote_host(remote_host, time, log)?;
    core.add_route(
        remote_host,
        StaticRoute {
            destination: core_defaults.ue_network,
            mask: core_defaults.ue_route_mask,
            gateway: None,
            interface: 1,
        },
        time,
        log,
    )?;

    core.install_internet_stack(terminal, time, log);
    let ue_address = core.assign_ue_address(terminal, time, log)?;
    core.add_route(
        terminal,
        StaticRoute {
            destination: Ipv4Addr::UNSPECIFIED,
            mask: Ipv4Addr::UNSPECIFIED,
            gateway: Some(core.gateway_address()),
            interface: 1,
        },
        time,
        log,
    )?;

    let serving = radio.attach_to_closest_enb(topology, terminal, time, log)?;
    let bearer = radio.activate_bearer(&serving, Qci::NgbrVideoTcpDefault, time, log)?;

    let interval = SimTime::from_millis(traffic.inter_packet_interval_ms);
    let start = time + SimTime::from_millis(traffic.app_start_ms);
    let downlink = TrafficFlow::new(
        Direction::Downlink,
        UdpClient::new(
            remote_host,
            SocketAddrV4::new(ue_address, traffic.dl_port),
            interval,
            traffic.max_packets,
            traffic.packet_size_bytes,
        ),
        PacketSink::new(terminal, traffic.dl_port),
        start,
    );
    let uplink = TrafficFlow::new(
        Direction::Uplink,
        UdpClient::new(
            terminal,
            SocketAddrV4::new(remote_address, traffic.ul_port),
            interval,
            traffic.max_packets,
            traffic.packet_size_bytes,
        ),
        PacketSink::new(remote_host, traffic.ul_port),
        start,
    );

    for flow in [&downlink, &uplink] {
        log.log(Event::ApplicationInstalled {
            time,
            node: flow.sink.node,
            role: AppRole::PacketSink,
            direction: flow.direction,
            port: flow.sink.port,
        });
        log.log(Event::ApplicationInstalled {
            time,
            node: flow.client.node,
            role: AppRole::UdpClient,
            direction: flow.direction,
            port: flow.client.remote.port(),
        });
    }
    for direction in Direction::ALL {
        scheduler.schedule(start, ScenarioAction::StartApplications(direction))?;
    }
    info!(%ue_address, %remote_address, start = %start, "full stack attached");

    Ok(FullStackAttachment {
        pgw,
        remote_host,
        remote_address,
        ue_address,
        core,
        serving,
        bearer,
        downlink,
        uplink,
    })
}

fn attach_direct_bearer(ctx: AttachContext<'_>) -> Result<DirectBearerAttachment> {
    let AttachContext {
        topology,
        radio,
        scheduler,
        log,
        defaults,
        terminal,
    } = ctx;
    let time = scheduler.now();

    let serving = radio.attach_to_closest_enb(topology, terminal, time, log)?;
    let bearer = radio.activate_bearer(&serving, Qci::GbrConvVoice, time, log)?;
    scheduler.schedule(time, ScenarioAction::SaturationTick)?;

    Ok(DirectBearerAttachment {
        serving,
        bearer,
        pdu_bytes: defaults.traffic.saturation_pdu_bytes,
        interval: SimTime::from_micros(defaults.traffic.saturation_interval_us),
    })
}
