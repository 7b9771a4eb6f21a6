//! Network collaborators
//!
//! Lightweight stand-ins for the radio access network and the core network.
//! They keep the bookkeeping the scenario needs (devices, cell identities,
//! RNTIs, bearers, addresses, routes) and turn every packet handed to them
//! into one MAC transport block on a carrier picked by the carrier manager.
//! There is no PHY, channel or loss model: every block is received at the
//! instant it is sent.

pub mod apps;
pub mod epc;

use crate::ccm::ComponentCarrierManager;
use crate::config::ChannelDefaults;
use crate::core::time::SimTime;
use crate::error::{Result, ScenarioError};
use crate::models::carrier::{CarrierConfig, CarrierId, CarrierSet};
use crate::models::event::{Event, EventLog};
use crate::models::node::NodeId;
use crate::topology::NetworkTopology;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub use apps::{PacketSink, TrafficFlow, UdpClient};
pub use epc::{CoreNetwork, Ipv4AddressHelper, StaticRoute};

/// PDCP header added to every SDU
pub const PDCP_HEADER_BYTES: u32 = 2;
/// RLC header added to every PDCP PDU
pub const RLC_HEADER_BYTES: u32 = 2;
/// MAC subheader added to every RLC PDU
pub const MAC_SUBHEADER_BYTES: u32 = 3;
/// IPv4 + UDP headers on application datagrams
pub const IP_UDP_HEADER_BYTES: u32 = 28;

/// Logical channel of the first data radio bearer
const FIRST_DRB_LCID: u8 = 3;

/// Traffic direction relative to the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Downlink,
    Uplink,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Downlink, Direction::Uplink];

    /// Two-letter tag used in trace files
    pub fn tag(&self) -> &'static str {
        match self {
            Direction::Downlink => "DL",
            Direction::Uplink => "UL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    BaseStation,
    Terminal,
    PointToPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    PacketSink,
    UdpClient,
}

/// QoS class identifier of a bearer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Qci {
    GbrConvVoice,
    NgbrVideoTcpDefault,
}

impl Qci {
    pub fn value(&self) -> u8 {
        match self {
            Qci::GbrConvVoice => 1,
            Qci::NgbrVideoTcpDefault => 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnbDevice {
    pub node: NodeId,
    pub cell_id: u16,
    pub carriers: usize,
    next_rnti: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UeDevice {
    pub node: NodeId,
    pub imsi: u64,
    pub serving: Option<ServingCell>,
}

/// Result of attaching a terminal to a base station
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServingCell {
    pub terminal: NodeId,
    pub base_station: NodeId,
    pub cell_id: u16,
    pub imsi: u64,
    pub rnti: u16,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadioBearer {
    pub rnti: u16,
    pub imsi: u64,
    pub cell_id: u16,
    pub qci: Qci,
    pub lcid: u8,
}

/// One MAC transport block, as seen by the trace sinks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacTransmission {
    pub time: SimTime,
    pub direction: Direction,
    pub cell_id: u16,
    pub imsi: u64,
    pub rnti: u16,
    pub lcid: u8,
    pub carrier_id: CarrierId,
    pub blockage: bool,
    /// PDCP PDU size (SDU + PDCP header)
    pub pdcp_bytes: u32,
    /// RLC PDU size (PDCP PDU + RLC header)
    pub rlc_bytes: u32,
    /// Transport block size (RLC PDU + MAC subheader)
    pub tb_size: u32,
}

/// Model of the radio access network for one run
///
/// Holds the carrier configuration (the keyed carrier and blockage maps),
/// the installed devices and the active bearers. Channel settings are
/// reported when the network is configured.
pub struct RadioNetwork {
    carrier_set: CarrierSet,
    carrier_map: BTreeMap<CarrierId, CarrierConfig>,
    blockage_map: BTreeMap<CarrierId, bool>,
    ccm: Box<dyn ComponentCarrierManager>,
    enbs: Vec<EnbDevice>,
    ues: Vec<UeDevice>,
    bearers: Vec<RadioBearer>,
    transmissions: u64,
}

impl RadioNetwork {
    pub fn new(
        carriers: &CarrierSet,
        channel: &ChannelDefaults,
        ccm: Box<dyn ComponentCarrierManager>,
    ) -> Self {
        info!(
            carriers = carriers.len(),
            scenario = %channel.scenario,
            condition = ?channel.condition,
            update_period_ms = channel.update_period_ms,
            ccm = ccm.name(),
            "radio network configured"
        );
        Self {
            carrier_set: carriers.clone(),
            carrier_map: carriers.carrier_map(),
            blockage_map: carriers.blockage_map(),
            ccm,
            enbs: Vec::new(),
            ues: Vec::new(),
            bearers: Vec::new(),
            transmissions: 0,
        }
    }

    pub fn carrier_map(&self) -> &BTreeMap<CarrierId, CarrierConfig> {
        &self.carrier_map
    }

    pub fn blockage_map(&self) -> &BTreeMap<CarrierId, bool> {
        &self.blockage_map
    }

    pub fn ccm_name(&self) -> &'static str {
        self.ccm.name()
    }

    pub fn transmissions(&self) -> u64 {
        self.transmissions
    }

    /// Install a base-station device with every configured carrier
    pub fn install_enb_device(
        &mut self,
        topology: &mut NetworkTopology,
        node: NodeId,
        time: SimTime,
        log: &mut EventLog,
    ) -> Result<u16> {
        topology.mark_device_installed(node)?;
        let cell_id = self.enbs.len() as u16 + 1;
        self.enbs.push(EnbDevice {
            node,
            cell_id,
            carriers: self.carrier_map.len(),
            next_rnti: 1,
        });
        log.log(Event::DeviceInstalled {
            time,
            node,
            device: DeviceKind::BaseStation,
            carriers: self.carrier_map.len(),
        });
        info!(%node, cell_id, "enb dev installed");
        Ok(cell_id)
    }

    /// Install a terminal device; returns its IMSI
    pub fn install_ue_device(
        &mut self,
        topology: &mut NetworkTopology,
        node: NodeId,
        time: SimTime,
        log: &mut EventLog,
    ) -> Result<u64> {
        topology.mark_device_installed(node)?;
        let imsi = self.ues.len() as u64 + 1;
        self.ues.push(UeDevice {
            node,
            imsi,
            serving: None,
        });
        log.log(Event::DeviceInstalled {
            time,
            node,
            device: DeviceKind::Terminal,
            carriers: self.carrier_map.len(),
        });
        info!(%node, imsi, "ue dev installed");
        Ok(imsi)
    }

    /// Attach a terminal to the base station closest to it
    pub fn attach_to_closest_enb(
        &mut self,
        topology: &NetworkTopology,
        terminal: NodeId,
        time: SimTime,
        log: &mut EventLog,
    ) -> Result<ServingCell> {
        let ue_position = topology.position(terminal).ok_or_else(|| {
            ScenarioError::OutOfOrder(format!("attach of {} before mobility", terminal))
        })?;
        let ue_index = self
            .ues
            .iter()
            .position(|u| u.node == terminal)
            .ok_or_else(|| ScenarioError::Collaborator(format!("no terminal device on {}", terminal)))?;

        let mut closest: Option<(usize, f64)> = None;
        for (index, enb) in self.enbs.iter().enumerate() {
            let Some(position) = topology.position(enb.node) else {
                continue;
            };
            let distance = position.distance_to(&ue_position);
            if closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((index, distance));
            }
        }
        let (enb_index, distance_m) = closest.ok_or(ScenarioError::NoBaseStation)?;

        let enb = &mut self.enbs[enb_index];
        let rnti = enb.next_rnti;
        enb.next_rnti += 1;
        let serving = ServingCell {
            terminal,
            base_station: enb.node,
            cell_id: enb.cell_id,
            imsi: self.ues[ue_index].imsi,
            rnti,
            distance_m,
        };
        self.ues[ue_index].serving = Some(serving);

        log.log(Event::Attached {
            time,
            terminal,
            base_station: serving.base_station,
            cell_id: serving.cell_id,
            rnti,
            distance_m,
        });
        info!(%terminal, cell_id = serving.cell_id, rnti, distance_m, "terminal attached");
        Ok(serving)
    }

    /// Activate a data radio bearer of class `qci` on an attachment
    pub fn activate_bearer(
        &mut self,
        serving: &ServingCell,
        qci: Qci,
        time: SimTime,
        log: &mut EventLog,
    ) -> Result<RadioBearer> {
        if !self.ues.iter().any(|u| u.serving.as_ref() == Some(serving)) {
            return Err(ScenarioError::Collaborator(format!(
                "bearer requested for unattached rnti {}",
                serving.rnti
            )));
        }
        let lcid = FIRST_DRB_LCID
            + self
                .bearers
                .iter()
                .filter(|b| b.rnti == serving.rnti && b.cell_id == serving.cell_id)
                .count() as u8;
        let bearer = RadioBearer {
            rnti: serving.rnti,
            imsi: serving.imsi,
            cell_id: serving.cell_id,
            qci,
            lcid,
        };
        self.bearers.push(bearer);
        log.log(Event::BearerActivated {
            time,
            rnti: serving.rnti,
            qci: qci.value(),
        });
        debug!(rnti = serving.rnti, qci = qci.value(), lcid, "bearer activated");
        Ok(bearer)
    }

    /// Send one PDCP SDU over `bearer`, returning the resulting transport block
    pub fn transmit(
        &mut self,
        bearer: &RadioBearer,
        direction: Direction,
        sdu_bytes: u32,
        time: SimTime,
    ) -> MacTransmission {
        let pdcp_bytes = sdu_bytes.saturating_add(PDCP_HEADER_BYTES);
        let rlc_bytes = pdcp_bytes.saturating_add(RLC_HEADER_BYTES);
        let tb_size = rlc_bytes.saturating_add(MAC_SUBHEADER_BYTES);
        let carrier_id = self.ccm.select_carrier(&self.carrier_set, direction, tb_size);
        self.transmissions += 1;

        MacTransmission {
            time,
            direction,
            cell_id: bearer.cell_id,
            imsi: bearer.imsi,
            rnti: bearer.rnti,
            lcid: bearer.lcid,
            carrier_id,
            blockage: self.blockage_map.get(&carrier_id).copied().unwrap_or(false),
            pdcp_bytes,
            rlc_bytes,
            tb_size,
        }
    }
}
