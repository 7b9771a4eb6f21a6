//! Error types for scenario configuration and execution

use crate::orchestrator::attachment::AttachmentPhase;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a scenario run.
///
/// Parameter problems are normally caught at the CLI boundary; the remaining
/// variants come from collaborators (file output, device installation) and
/// abort the run without retry.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A scenario knob or default value is out of range
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The attachment state machine was driven out of order
    #[error("Invalid attachment transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: AttachmentPhase,
        to: AttachmentPhase,
    },

    /// A setup step ran before one it depends on
    #[error("Setup step out of order: {0}")]
    OutOfOrder(String),

    /// A simulation collaborator (device, stack, address pool) failed
    #[error("Collaborator failure: {0}")]
    Collaborator(String),

    /// Attachment requested but no base-station device is installed
    #[error("No base station available for attachment")]
    NoBaseStation,

    /// Attempt to schedule an event before the current simulation time
    #[error("Cannot schedule event at {at_ns} ns, clock is already at {now_ns} ns")]
    PastEvent { at_ns: u64, now_ns: u64 },

    /// File system failure while writing output artifacts
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScenarioError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScenarioError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScenarioError>;
