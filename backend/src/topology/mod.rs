//! Scenario topology: nodes, mobility, buildings
//!
//! The radio part of the topology is one base station at a fixed position
//! and one terminal placed uniformly on a disc and then random-walking
//! inside a bounding rectangle. Core-network nodes (packet gateway, remote
//! host) are added later by the full-stack attachment branch and carry no
//! mobility.
//!
//! # Ordering
//!
//! 1. Mobility and building registration for a radio node
//! 2. Radio device installation on that node ([`NetworkTopology::mark_device_installed`])
//! 3. [`NetworkTopology::make_mobility_consistent`] once every device is in,
//!    before the clock starts
//!
//! Steps taken out of order return [`ScenarioError::OutOfOrder`].

pub mod buildings;
pub mod mobility;

use crate::config::TopologyDefaults;
use crate::core::time::SimTime;
use crate::error::{Result, ScenarioError};
use crate::models::event::{Event, EventLog};
use crate::models::node::{NodeId, NodeKind, Vector3};
use crate::rng::RngManager;
use tracing::{debug, info};

pub use buildings::{BuildingInfo, BuildingRegistry};
pub use mobility::{sample_uniform_disc, MobilityModel, RandomWalk2d};

/// One node and the models attached to it
#[derive(Debug, Clone)]
pub struct TopologyNode {
    id: NodeId,
    kind: NodeKind,
    mobility: Option<MobilityModel>,
    building: Option<BuildingInfo>,
    device_installed: bool,
}

impl TopologyNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn mobility(&self) -> Option<&MobilityModel> {
        self.mobility.as_ref()
    }

    pub fn building(&self) -> Option<BuildingInfo> {
        self.building
    }

    pub fn position(&self) -> Option<Vector3> {
        self.mobility.as_ref().map(MobilityModel::position)
    }

    pub fn has_device(&self) -> bool {
        self.device_installed
    }
}

/// All nodes of the run
#[derive(Debug, Clone, Default)]
pub struct NetworkTopology {
    nodes: Vec<TopologyNode>,
    registry: BuildingRegistry,
    buildings_enabled: bool,
    consistent: bool,
}

impl NetworkTopology {
    pub fn new(registry: BuildingRegistry, buildings_enabled: bool) -> Self {
        Self {
            nodes: Vec::new(),
            registry,
            buildings_enabled,
            consistent: false,
        }
    }

    pub fn create_node(&mut self, kind: NodeKind, time: SimTime, log: &mut EventLog) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TopologyNode {
            id,
            kind,
            mobility: None,
            building: None,
            device_installed: false,
        });
        log.log(Event::NodeCreated { time, node: id, kind });
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&TopologyNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn nodes(&self) -> &[TopologyNode] {
        &self.nodes
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &TopologyNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn position(&self, id: NodeId) -> Option<Vector3> {
        self.node(id).and_then(TopologyNode::position)
    }

    pub fn buildings_enabled(&self) -> bool {
        self.buildings_enabled
    }

    pub fn is_consistent(&self) -> bool {
        self.consistent
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TopologyNode> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or_else(|| ScenarioError::Collaborator(format!("unknown node {}", id)))
    }

    pub fn install_mobility(
        &mut self,
        id: NodeId,
        model: MobilityModel,
        time: SimTime,
        log: &mut EventLog,
    ) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.device_installed {
            return Err(ScenarioError::OutOfOrder(format!(
                "mobility installed on {} after its device",
                id
            )));
        }
        let position = model.position();
        let name = model.name().to_string();
        node.mobility = Some(model);
        self.consistent = false;
        log.log(Event::MobilityInstalled {
            time,
            node: id,
            model: name,
            position,
        });
        Ok(())
    }

    /// Register a node with the building subsystem (no-op when disabled)
    pub fn install_building_info(&mut self, id: NodeId, time: SimTime, log: &mut EventLog) -> Result<()> {
        if !self.buildings_enabled {
            return Ok(());
        }
        let position = self.node_mut(id)?.position().ok_or_else(|| {
            ScenarioError::OutOfOrder(format!("building info on {} before mobility", id))
        })?;
        let info = self.registry.classify(&position);
        self.node_mut(id)?.building = Some(info);
        log.log(Event::BuildingInfoInstalled {
            time,
            node: id,
            indoor: info.indoor,
        });
        Ok(())
    }

    /// Record that a radio device now sits on `id`
    ///
    /// Requires mobility, and building registration when buildings are on.
    pub fn mark_device_installed(&mut self, id: NodeId) -> Result<()> {
        let buildings_enabled = self.buildings_enabled;
        let node = self.node_mut(id)?;
        if node.mobility.is_none() {
            return Err(ScenarioError::OutOfOrder(format!(
                "device installed on {} before mobility",
                id
            )));
        }
        if buildings_enabled && node.building.is_none() {
            return Err(ScenarioError::OutOfOrder(format!(
                "device installed on {} before building registration",
                id
            )));
        }
        node.device_installed = true;
        self.consistent = false;
        Ok(())
    }

    /// Reconcile building attributes with current positions
    ///
    /// Must run after every radio node has its device. Returns the number of
    /// nodes reconciled.
    pub fn make_mobility_consistent(&mut self, time: SimTime, log: &mut EventLog) -> Result<usize> {
        if let Some(pending) = self
            .nodes
            .iter()
            .find(|n| n.mobility.is_some() && !n.device_installed)
        {
            return Err(ScenarioError::OutOfOrder(format!(
                "mobility made consistent while {} has no device",
                pending.id
            )));
        }

        let mut reconciled = 0;
        if self.buildings_enabled {
            for node in self.nodes.iter_mut() {
                if let (Some(_), Some(position)) = (node.building, node.position()) {
                    node.building = Some(self.registry.classify(&position));
                    reconciled += 1;
                }
            }
        }
        self.consistent = true;
        log.log(Event::MobilityConsistencyApplied {
            time,
            nodes: reconciled,
        });
        debug!(nodes = reconciled, "mobility made consistent");
        Ok(reconciled)
    }

    /// Complete the current walk leg of `id` and start the next one
    ///
    /// Returns the new position, or `None` for nodes that do not walk.
    pub fn step_walk(
        &mut self,
        id: NodeId,
        rng: &mut RngManager,
        time: SimTime,
        log: &mut EventLog,
    ) -> Result<Option<Vector3>> {
        let buildings_enabled = self.buildings_enabled;
        let registry = &self.registry;
        let node = self
            .nodes
            .get_mut(id.0 as usize)
            .ok_or_else(|| ScenarioError::Collaborator(format!("unknown node {}", id)))?;
        let Some(MobilityModel::RandomWalk2d(walk)) = node.mobility.as_mut() else {
            return Ok(None);
        };
        walk.finish_leg();
        walk.start_leg(rng);
        let position = walk.position();
        if buildings_enabled && node.building.is_some() {
            node.building = Some(registry.classify(&position));
        }
        log.log(Event::MobilityUpdated {
            time,
            node: id,
            position,
        });
        Ok(Some(position))
    }
}

/// Radio topology produced by [`build_radio_topology`]
#[derive(Debug, Clone)]
pub struct RadioTopology {
    pub topology: NetworkTopology,
    pub base_station: NodeId,
    pub terminal: NodeId,
}

/// Place the base station and the terminal, with mobility and buildings
pub fn build_radio_topology(
    defaults: &TopologyDefaults,
    rng: &mut RngManager,
    log: &mut EventLog,
) -> Result<RadioTopology> {
    let time = SimTime::ZERO;
    let registry = BuildingRegistry::new(defaults.buildings.clone());
    let mut topology = NetworkTopology::new(registry, defaults.buildings_enabled);

    let base_station = topology.create_node(NodeKind::BaseStation, time, log);
    topology.install_mobility(
        base_station,
        MobilityModel::ConstantPosition {
            position: defaults.enb_position,
        },
        time,
        log,
    )?;
    topology.install_building_info(base_station, time, log)?;

    let terminal = topology.create_node(NodeKind::Terminal, time, log);
    let start = sample_uniform_disc(rng, (0.0, 0.0), defaults.ue_disc_radius_m, defaults.ue_height_m);
    let mut walk = RandomWalk2d::new(
        start,
        defaults.walk_bounds,
        defaults.walk_speed_mps,
        SimTime::from_millis(defaults.walk_interval_ms),
    );
    walk.start_leg(rng);
    topology.install_mobility(terminal, MobilityModel::RandomWalk2d(walk), time, log)?;
    topology.install_building_info(terminal, time, log)?;

    info!(
        base_station = %defaults.enb_position,
        terminal = %start,
        buildings = defaults.buildings_enabled,
        "radio topology placed"
    );

    Ok(RadioTopology {
        topology,
        base_station,
        terminal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_before_mobility_is_out_of_order() {
        let mut log = EventLog::new();
        let mut topology = NetworkTopology::new(BuildingRegistry::default(), true);
        let node = topology.create_node(NodeKind::Terminal, SimTime::ZERO, &mut log);

        assert!(matches!(
            topology.mark_device_installed(node),
            Err(ScenarioError::OutOfOrder(_))
        ));
    }

    #[test]
    fn test_consistency_requires_all_devices() {
        let mut log = EventLog::new();
        let mut rng = RngManager::new(3);
        let mut radio = build_radio_topology(&TopologyDefaults::default(), &mut rng, &mut log).unwrap();

        radio.topology.mark_device_installed(radio.base_station).unwrap();
        assert!(radio
            .topology
            .make_mobility_consistent(SimTime::ZERO, &mut log)
            .is_err());

        radio.topology.mark_device_installed(radio.terminal).unwrap();
        assert_eq!(
            radio
                .topology
                .make_mobility_consistent(SimTime::ZERO, &mut log)
                .unwrap(),
            2
        );
        assert!(radio.topology.is_consistent());
    }

    #[test]
    fn test_buildings_disabled_skips_registration() {
        let defaults = TopologyDefaults {
            buildings_enabled: false,
            ..Default::default()
        };
        let mut log = EventLog::new();
        let mut rng = RngManager::new(3);
        let mut radio = build_radio_topology(&defaults, &mut rng, &mut log).unwrap();

        assert!(log.events_of_type("BuildingInfoInstalled").is_empty());
        assert!(radio.topology.mark_device_installed(radio.terminal).is_ok());
    }
}
