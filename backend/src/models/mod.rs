//! Domain models for the scenario

pub mod carrier;
pub mod event;
pub mod node;

// Re-exports
pub use carrier::{CarrierConfig, CarrierDiagnostic, CarrierId, CarrierSet};
pub use event::{Event, EventLog};
pub use node::{NodeId, NodeKind, Rectangle, Vector3};
