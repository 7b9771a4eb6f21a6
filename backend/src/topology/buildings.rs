//! Building registration and indoor classification

use crate::config::BuildingSpec;
use crate::models::node::Vector3;
use serde::{Deserialize, Serialize};

/// Building attributes attached to a registered node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildingInfo {
    pub indoor: bool,
    /// Index into the registry's building list when indoor
    pub building: Option<usize>,
}

/// The scenario's buildings; empty means every node is outdoor
#[derive(Debug, Clone, Default)]
pub struct BuildingRegistry {
    buildings: Vec<BuildingSpec>,
}

impl BuildingRegistry {
    pub fn new(buildings: Vec<BuildingSpec>) -> Self {
        Self { buildings }
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Classify a position; the first building that contains it wins
    pub fn classify(&self, position: &Vector3) -> BuildingInfo {
        self.buildings
            .iter()
            .position(|b| b.footprint.contains(position) && position.z <= b.height_m)
            .map(|index| BuildingInfo {
                indoor: true,
                building: Some(index),
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::Rectangle;

    #[test]
    fn test_inside_footprint_below_roof_is_indoor() {
        let registry = BuildingRegistry::new(vec![BuildingSpec {
            footprint: Rectangle::new(10.0, 20.0, 10.0, 20.0),
            height_m: 9.0,
        }]);

        assert_eq!(
            registry.classify(&Vector3::new(15.0, 15.0, 1.5)),
            BuildingInfo {
                indoor: true,
                building: Some(0)
            }
        );
        assert!(!registry.classify(&Vector3::new(15.0, 15.0, 12.0)).indoor);
        assert!(!registry.classify(&Vector3::new(0.0, 0.0, 1.5)).indoor);
    }
}
