//! Component Carrier Manager Module
//!
//! Decides which component carrier each MAC transport block goes out on.
//! With a single carrier every policy trivially returns carrier 0.
//!
//! # Policy Interface
//!
//! All policies implement the `ComponentCarrierManager` trait:
//! ```rust
//! use mmwave_ca_scenario_core::ccm::ComponentCarrierManager;
//! use mmwave_ca_scenario_core::models::{CarrierId, CarrierSet};
//! use mmwave_ca_scenario_core::network::Direction;
//!
//! struct PrimaryOnly;
//!
//! impl ComponentCarrierManager for PrimaryOnly {
//!     fn select_carrier(&mut self, _carriers: &CarrierSet, _direction: Direction, _tb_size: u32) -> CarrierId {
//!         0
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "PrimaryOnly"
//!     }
//! }
//! ```
//!
//! Available policies:
//! 1. **RoundRobin**: alternate carriers block by block
//! 2. **BandwidthProportional**: keep per-carrier load proportional to bandwidth

mod proportional;
mod round_robin;

pub use proportional::BandwidthProportionalManager;
pub use round_robin::RoundRobinManager;

use crate::config::CcmPolicyKind;
use crate::models::carrier::{CarrierId, CarrierSet};
use crate::network::Direction;

/// Carrier selection for outgoing transport blocks
pub trait ComponentCarrierManager {
    /// Pick the carrier for a transport block of `tb_size` bytes
    fn select_carrier(&mut self, carriers: &CarrierSet, direction: Direction, tb_size: u32) -> CarrierId;

    /// Policy name for logs and the run manifest
    fn name(&self) -> &'static str;
}

/// Instantiate the manager selected on the command line
pub fn create_manager(kind: CcmPolicyKind) -> Box<dyn ComponentCarrierManager> {
    match kind {
        CcmPolicyKind::RoundRobin => Box::new(RoundRobinManager::new()),
        CcmPolicyKind::BandwidthProportional => Box::new(BandwidthProportionalManager::new()),
    }
}
