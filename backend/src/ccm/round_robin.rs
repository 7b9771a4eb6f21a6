//! Round-robin carrier manager
//!
//! Cycles through the carriers in index order, independently per direction.
//! Carrier capacity is ignored.

use super::ComponentCarrierManager;
use crate::models::carrier::{CarrierId, CarrierSet};
use crate::network::Direction;

#[derive(Debug, Default)]
pub struct RoundRobinManager {
    next_downlink: usize,
    next_uplink: usize,
}

impl RoundRobinManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ComponentCarrierManager for RoundRobinManager {
    fn select_carrier(&mut self, carriers: &CarrierSet, direction: Direction, _tb_size: u32) -> CarrierId {
        let cursor = match direction {
            Direction::Downlink => &mut self.next_downlink,
            Direction::Uplink => &mut self.next_uplink,
        };
        let count = carriers.len().max(1);
        let chosen = *cursor % count;
        *cursor = (chosen + 1) % count;
        carriers
            .iter()
            .nth(chosen)
            .map(|c| c.carrier_id())
            .unwrap_or(0)
    }

    fn name(&self) -> &'static str {
        "RoundRobin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScenarioDefaults, ScenarioParameters};
    use crate::spectrum::{allocate, SpectrumShare};

    fn carriers(use_ca: bool) -> CarrierSet {
        let params = ScenarioParameters {
            use_ca,
            ..Default::default()
        };
        let split = allocate(SpectrumShare::new(72, 864), 2, use_ca).unwrap();
        CarrierSet::build(&params, &ScenarioDefaults::default(), &split)
    }

    #[test]
    fn test_alternates_per_direction() {
        let set = carriers(true);
        let mut ccm = RoundRobinManager::new();

        let ul: Vec<CarrierId> = (0..4)
            .map(|_| ccm.select_carrier(&set, Direction::Uplink, 100))
            .collect();
        assert_eq!(ul, vec![0, 1, 0, 1]);

        // downlink cursor untouched by uplink traffic
        assert_eq!(ccm.select_carrier(&set, Direction::Downlink, 100), 0);
    }

    #[test]
    fn test_single_carrier_always_primary() {
        let set = carriers(false);
        let mut ccm = RoundRobinManager::new();
        for _ in 0..3 {
            assert_eq!(ccm.select_carrier(&set, Direction::Downlink, 100), 0);
        }
    }
}
