//! Bandwidth-proportional carrier manager
//!
//! Sends each transport block on the carrier whose normalised load
//! (bytes already assigned plus this block, divided by the carrier's
//! bandwidth) would be smallest. Ties go to the lower carrier index, so the
//! primary carrier wins on equal split. Carriers with zero bandwidth are
//! skipped unless no other carrier exists.

use super::ComponentCarrierManager;
use crate::models::carrier::{CarrierId, CarrierSet};
use crate::network::Direction;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct BandwidthProportionalManager {
    assigned: BTreeMap<(Direction, CarrierId), u64>,
}

impl BandwidthProportionalManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes assigned so far to a carrier in one direction
    pub fn assigned_bytes(&self, direction: Direction, carrier: CarrierId) -> u64 {
        self.assigned.get(&(direction, carrier)).copied().unwrap_or(0)
    }
}

impl ComponentCarrierManager for BandwidthProportionalManager {
    fn select_carrier(&mut self, carriers: &CarrierSet, direction: Direction, tb_size: u32) -> CarrierId {
        let mut best: Option<(f64, CarrierId)> = None;
        for carrier in carriers.iter() {
            let bandwidth = carrier.bandwidth_hz();
            if bandwidth <= 0.0 {
                continue;
            }
            let load = (self.assigned_bytes(direction, carrier.carrier_id()) + u64::from(tb_size)) as f64
                / bandwidth;
            match best {
                Some((best_load, _)) if best_load <= load => {}
                _ => best = Some((load, carrier.carrier_id())),
            }
        }

        let chosen = best.map(|(_, id)| id).unwrap_or_else(|| carriers.primary().carrier_id());
        *self.assigned.entry((direction, chosen)).or_insert(0) += u64::from(tb_size);
        chosen
    }

    fn name(&self) -> &'static str {
        "BandwidthProportional"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScenarioDefaults, ScenarioParameters};
    use crate::spectrum::{allocate, SpectrumShare};

    fn carriers(band_div: u32) -> CarrierSet {
        let params = ScenarioParameters {
            band_div,
            ..Default::default()
        };
        let split = allocate(SpectrumShare::new(72, 864), band_div, true).unwrap();
        CarrierSet::build(&params, &ScenarioDefaults::default(), &split)
    }

    #[test]
    fn test_equal_split_alternates_starting_with_primary() {
        let set = carriers(2);
        let mut ccm = BandwidthProportionalManager::new();

        let picks: Vec<CarrierId> = (0..4)
            .map(|_| ccm.select_carrier(&set, Direction::Uplink, 1000))
            .collect();
        assert_eq!(picks, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_load_follows_bandwidth_ratio() {
        // band_div 4: primary 54 chunks, secondary 18 chunks (3:1)
        let set = carriers(4);
        let mut ccm = BandwidthProportionalManager::new();
        for _ in 0..400 {
            ccm.select_carrier(&set, Direction::Downlink, 100);
        }

        let primary = ccm.assigned_bytes(Direction::Downlink, 0);
        let secondary = ccm.assigned_bytes(Direction::Downlink, 1);
        assert_eq!(primary + secondary, 40_000);
        assert_eq!(primary, 30_000);
    }

    #[test]
    fn test_zero_bandwidth_primary_is_skipped() {
        let set = carriers(1);
        let mut ccm = BandwidthProportionalManager::new();
        for _ in 0..5 {
            assert_eq!(ccm.select_carrier(&set, Direction::Uplink, 10), 1);
        }
    }
}
