//! Core network: packet gateway, remote-host link, addressing and routes

use crate::config::CoreNetworkDefaults;
use crate::core::time::SimTime;
use crate::error::{Result, ScenarioError};
use crate::models::event::{Event, EventLog};
use crate::models::node::NodeId;
use crate::network::DeviceKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// Sequential host-address allocator over one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4AddressHelper {
    network: u32,
    mask: u32,
    next_host: u32,
}

impl Ipv4AddressHelper {
    pub fn new(base: Ipv4Addr, mask: Ipv4Addr) -> Self {
        let mask = u32::from(mask);
        Self {
            network: u32::from(base) & mask,
            mask,
            next_host: 1,
        }
    }

    /// Hand out the next free host address
    pub fn assign(&mut self) -> Result<Ipv4Addr> {
        let broadcast_host = !self.mask;
        if self.next_host >= broadcast_host {
            return Err(ScenarioError::Collaborator(format!(
                "address pool {}/{} exhausted",
                Ipv4Addr::from(self.network),
                Ipv4Addr::from(self.mask)
            )));
        }
        let address = Ipv4Addr::from(self.network | self.next_host);
        self.next_host += 1;
        Ok(address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoute {
    pub destination: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub gateway: Option<Ipv4Addr>,
    pub interface: u32,
}

impl StaticRoute {
    pub fn matches(&self, address: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask);
        u32::from(address) & mask == u32::from(self.destination) & mask
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointToPointLink {
    pub a: NodeId,
    pub b: NodeId,
    pub a_address: Ipv4Addr,
    pub b_address: Ipv4Addr,
    pub data_rate_bps: u64,
    pub mtu: u32,
    pub delay: SimTime,
}

/// Gateway side of a full-stack run
///
/// Terminals draw addresses from the terminal pool; the gateway itself owns
/// the first address of that pool and acts as the terminals' default
/// gateway.
#[derive(Debug, Clone)]
pub struct CoreNetwork {
    pgw: NodeId,
    defaults: CoreNetworkDefaults,
    ue_pool: Ipv4AddressHelper,
    gateway_address: Ipv4Addr,
    ip_nodes: BTreeSet<NodeId>,
    addresses: BTreeMap<NodeId, Vec<Ipv4Addr>>,
    routes: BTreeMap<NodeId, Vec<StaticRoute>>,
    links: Vec<PointToPointLink>,
}

impl CoreNetwork {
    pub fn new(pgw: NodeId, defaults: &CoreNetworkDefaults) -> Result<Self> {
        let mut ue_pool = Ipv4AddressHelper::new(defaults.ue_network, defaults.ue_network_mask);
        let gateway_address = ue_pool.assign()?;
        let mut ip_nodes = BTreeSet::new();
        ip_nodes.insert(pgw);
        Ok(Self {
            pgw,
            defaults: defaults.clone(),
            ue_pool,
            gateway_address,
            ip_nodes,
            addresses: BTreeMap::new(),
            routes: BTreeMap::new(),
            links: Vec::new(),
        })
    }

    /// Default gateway address handed to terminals
    pub fn gateway_address(&self) -> Ipv4Addr {
        self.gateway_address
    }

    pub fn addresses(&self, node: NodeId) -> &[Ipv4Addr] {
        self.addresses.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn routes(&self, node: NodeId) -> &[StaticRoute] {
        self.routes.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_ip_stack(&self, node: NodeId) -> bool {
        self.ip_nodes.contains(&node)
    }

    pub fn install_internet_stack(&mut self, node: NodeId, time: SimTime, log: &mut EventLog) {
        self.ip_nodes.insert(node);
        log.log(Event::IpStackInstalled { time, node });
    }

    fn require_stack(&self, node: NodeId) -> Result<()> {
        if self.has_ip_stack(node) {
            Ok(())
        } else {
            Err(ScenarioError::OutOfOrder(format!(
                "{} has no internet stack",
                node
            )))
        }
    }

    /// Link the gateway to a remote host and address both ends
    ///
    /// Returns the remote host's address.
    pub fn connect_remote_host(
        &mut self,
        remote: NodeId,
        time: SimTime,
        log: &mut EventLog,
    ) -> Result<Ipv4Addr> {
        self.require_stack(remote)?;
        if self.links.iter().any(|link| link.b == remote) {
            return Err(ScenarioError::Collaborator(format!(
                "remote host {} is already connected",
                remote
            )));
        }
        let mut pool = Ipv4AddressHelper::new(self.defaults.internet_base, self.defaults.internet_mask);
        let a_address = pool.assign()?;
        let b_address = pool.assign()?;

        let link = PointToPointLink {
            a: self.pgw,
            b: remote,
            a_address,
            b_address,
            data_rate_bps: self.defaults.p2p_data_rate_bps,
            mtu: self.defaults.p2p_mtu,
            delay: SimTime::from_micros(self.defaults.p2p_delay_us),
        };
        self.links.push(link);
        log.log(Event::LinkInstalled {
            time,
            a: self.pgw,
            b: remote,
            data_rate_bps: link.data_rate_bps,
        });
        for node in [self.pgw, remote] {
            log.log(Event::DeviceInstalled {
                time,
                node,
                device: DeviceKind::PointToPoint,
                carriers: 0,
            });
        }

        self.record_address(self.pgw, a_address, time, log);
        self.record_address(remote, b_address, time, log);
        info!(
            %a_address,
            %b_address,
            data_rate_bps = link.data_rate_bps,
            mtu = link.mtu,
            "remote host connected"
        );
        Ok(b_address)
    }

    /// Give a terminal the next address of the terminal pool
    pub fn assign_ue_address(&mut self, ue: NodeId, time: SimTime, log: &mut EventLog) -> Result<Ipv4Addr> {
        self.require_stack(ue)?;
        let address = self.ue_pool.assign()?;
        self.record_address(ue, address, time, log);
        Ok(address)
    }

    pub fn add_route(&mut self, node: NodeId, route: StaticRoute, time: SimTime, log: &mut EventLog) -> Result<()> {
        self.require_stack(node)?;
        self.routes.entry(node).or_default().push(route);
        log.log(Event::RouteInstalled {
            time,
            node,
            destination: route.destination,
            mask: route.mask,
            gateway: route.gateway,
            interface: route.interface,
        });
        debug!(%node, destination = %route.destination, mask = %route.mask, "route installed");
        Ok(())
    }

    /// Longest-prefix route lookup
    pub fn lookup(&self, node: NodeId, destination: Ipv4Addr) -> Option<&StaticRoute> {
        self.routes(node)
            .iter()
            .filter(|r| r.matches(destination))
            .max_by_key(|r| u32::from(r.mask).count_ones())
    }

    fn record_address(&mut self, node: NodeId, address: Ipv4Addr, time: SimTime, log: &mut EventLog) {
        self.addresses.entry(node).or_default().push(address);
        log.log(Event::AddressAssigned { time, node, address });
    }
}
