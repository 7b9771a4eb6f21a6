//! Run manifest
//!
//! A JSON record written next to the trace files at teardown: run id,
//! configuration fingerprint, carriers, attachment mode and trace totals.
//!
//! # Config Hash
//!
//! The fingerprint is a SHA256 over the canonical JSON of the scenario
//! parameters and defaults (object keys sorted recursively). The output
//! directory is left out, so the same configuration written to different
//! places hashes the same.

use super::attachment::AttachmentMode;
use crate::config::{ScenarioDefaults, ScenarioParameters};
use crate::error::{Result, ScenarioError};
use crate::models::carrier::CarrierDiagnostic;
use crate::spectrum::SpectrumShare;
use crate::trace::TraceCounters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub config_hash: String,
    pub parameters: ScenarioParameters,
    pub rng_seed: u64,
    pub attachment_mode: AttachmentMode,
    pub ccm_policy: String,
    pub carriers: Vec<CarrierDiagnostic>,
    pub spectrum_residual: SpectrumShare,
    pub stop_time_s: f64,
    pub event_count: usize,
    pub counters: TraceCounters,
}

impl RunManifest {
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| ScenarioError::io(path, e))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, self)?;
        writeln!(out).map_err(|e| ScenarioError::io(path, e))?;
        out.flush().map_err(|e| ScenarioError::io(path, e))
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ScenarioError::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// SHA256 of the canonical JSON of any serializable value
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String> {
    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical = canonicalize(serde_json::to_value(config)?);
    let json = serde_json::to_string(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Fingerprint of a run's configuration, independent of its output directory
pub fn scenario_config_hash(params: &ScenarioParameters, defaults: &ScenarioDefaults) -> Result<String> {
    let mut parameters = serde_json::to_value(params)?;
    if let Value::Object(map) = &mut parameters {
        map.remove("file_path");
    }
    compute_config_hash(&serde_json::json!({
        "parameters": parameters,
        "defaults": defaults,
    }))
}
