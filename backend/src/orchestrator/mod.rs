//! Orchestrator - attachment phases and the run driver
//!
//! See `engine.rs` for the run sequence and `attachment.rs` for the phase
//! machine and its two branches.

pub mod attachment;
pub mod engine;
pub mod manifest;

pub use attachment::{
    Attachment, AttachmentMode, AttachmentOrchestrator, AttachmentPhase, DirectBearerAttachment,
    FullStackAttachment,
};
pub use engine::{PreparedScenario, RunSummary, ScenarioAction, ScenarioRunner};
pub use manifest::{compute_config_hash, scenario_config_hash, RunManifest};
