//! mmWave Carrier-Aggregation Scenario Core
//!
//! Configures and runs a single multi-carrier scenario: one base station,
//! one mobile terminal, one or two component carriers, deterministic
//! execution.
//!
//! # Architecture
//!
//! - **spectrum**: baseline spectrum split between carriers
//! - **models**: carriers, nodes, event log
//! - **topology**: node placement, mobility, buildings
//! - **network**: radio and core network collaborators, UDP applications
//! - **ccm**: component-carrier manager policies
//! - **orchestrator**: attachment phases and the run driver
//! - **trace**: tab-separated output traces
//! - **sim**: discrete-event scheduler
//! - **rng**: deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Carrier 0 is always present and is the only primary carrier
//! 2. All randomness comes from the seeded (seed, run) RNG
//! 3. Applications start strictly after setup, at a positive time

pub mod ccm;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod network;
pub mod orchestrator;
pub mod rng;
pub mod sim;
pub mod spectrum;
pub mod topology;
pub mod trace;

// Re-exports for convenience
pub use config::{CcmPolicyKind, ScenarioDefaults, ScenarioParameters};
pub use crate::core::time::SimTime;
pub use error::{Result, ScenarioError};
pub use models::{
    carrier::{CarrierConfig, CarrierDiagnostic, CarrierId, CarrierSet},
    event::{Event, EventLog},
};
pub use orchestrator::{
    Attachment, AttachmentMode, AttachmentPhase, PreparedScenario, RunManifest, RunSummary,
    ScenarioRunner,
};
pub use rng::RngManager;
pub use spectrum::{allocate, SpectrumShare, SpectrumSplit};
