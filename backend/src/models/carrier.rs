//! Component carrier configuration
//!
//! A run operates one or two component carriers. They are stored as an
//! ordered [`CarrierSet`] where each record carries its own primary and
//! blockage flags. The keyed maps the radio collaborator consumes
//! (`carrier index → config`, `carrier index → blockage`) are derived views,
//! so both always cover the same carrier indices.
//!
//! # Invariants
//!
//! 1. Carrier 0 always exists and is the only primary carrier
//! 2. The set holds exactly two carriers iff aggregation is enabled
//! 3. Records are immutable once the set is built

use crate::config::{ScenarioDefaults, ScenarioParameters};
use crate::spectrum::{SpectrumShare, SpectrumSplit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Index of a component carrier (0 = primary)
pub type CarrierId = u8;

/// Physical/MAC configuration of one component carrier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierConfig {
    carrier_id: CarrierId,
    center_frequency_hz: f64,
    chunks_per_rb: u32,
    chunk_width_hz: f64,
    resource_blocks: u32,
    ref_signals_per_symbol: u32,
    is_primary: bool,
    blockage: bool,
}

impl CarrierConfig {
    pub fn carrier_id(&self) -> CarrierId {
        self.carrier_id
    }

    pub fn center_frequency_hz(&self) -> f64 {
        self.center_frequency_hz
    }

    pub fn chunks_per_rb(&self) -> u32 {
        self.chunks_per_rb
    }

    pub fn chunk_width_hz(&self) -> f64 {
        self.chunk_width_hz
    }

    pub fn resource_blocks(&self) -> u32 {
        self.resource_blocks
    }

    pub fn ref_signals_per_symbol(&self) -> u32 {
        self.ref_signals_per_symbol
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn blockage(&self) -> bool {
        self.blockage
    }

    /// Occupied bandwidth: resource blocks × chunk width × chunks per block
    pub fn bandwidth_hz(&self) -> f64 {
        f64::from(self.resource_blocks) * self.chunk_width_hz * f64::from(self.chunks_per_rb)
    }
}

/// One line of the per-carrier configuration report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierDiagnostic {
    pub carrier_id: CarrierId,
    pub frequency_ghz: f64,
    pub bandwidth_mhz: f64,
    pub blockage: bool,
    pub ref_signals_per_symbol: u32,
    pub chunks_per_rb: u32,
}

impl std::fmt::Display for CarrierDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Component Carrier {} frequency : {} GHz, bandwidth : {} MHz, blockage : {}, numRefSc: {}, ChunkPerRB: {}",
            self.carrier_id,
            self.frequency_ghz,
            self.bandwidth_mhz,
            u8::from(self.blockage),
            self.ref_signals_per_symbol,
            self.chunks_per_rb
        )
    }
}

/// Ordered, immutable list of the run's component carriers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierSet {
    carriers: Vec<CarrierConfig>,
}

impl CarrierSet {
    /// Build the carrier set from the scenario knobs and the spectrum split
    ///
    /// Carrier 0 is built first and marked primary. Carrier 1 is built only
    /// when the split is aggregated. Emits one diagnostic log line per
    /// carrier.
    pub fn build(
        params: &ScenarioParameters,
        defaults: &ScenarioDefaults,
        split: &SpectrumSplit,
    ) -> Self {
        let spectrum = &defaults.spectrum;
        let make = |carrier_id: CarrierId,
                    frequency: f64,
                    share: SpectrumShare,
                    is_primary: bool,
                    blockage: bool| CarrierConfig {
            carrier_id,
            center_frequency_hz: frequency,
            chunks_per_rb: share.chunks,
            chunk_width_hz: spectrum.chunk_width_hz,
            resource_blocks: spectrum.resource_blocks,
            ref_signals_per_symbol: share.ref_signals,
            is_primary,
            blockage,
        };

        let mut carriers = vec![make(0, params.frequency0, split.primary(), true, params.blockage0)];
        if let Some(secondary) = split.secondary() {
            carriers.push(make(1, params.frequency1, secondary, false, params.blockage1));
        }

        let set = Self { carriers };
        for diagnostic in set.diagnostics() {
            info!(
                carrier_id = diagnostic.carrier_id,
                frequency_ghz = diagnostic.frequency_ghz,
                bandwidth_mhz = diagnostic.bandwidth_mhz,
                blockage = diagnostic.blockage,
                num_ref_sc = diagnostic.ref_signals_per_symbol,
                chunk_per_rb = diagnostic.chunks_per_rb,
                "component carrier configured"
            );
        }
        set
    }

    pub fn len(&self) -> usize {
        self.carriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }

    pub fn is_aggregated(&self) -> bool {
        self.carriers.len() > 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &CarrierConfig> {
        self.carriers.iter()
    }

    pub fn get(&self, carrier_id: CarrierId) -> Option<&CarrierConfig> {
        self.carriers.iter().find(|c| c.carrier_id == carrier_id)
    }

    /// The anchor carrier used for attachment and control signalling
    pub fn primary(&self) -> &CarrierConfig {
        // build() always creates carrier 0 as primary
        &self.carriers[0]
    }

    /// Keyed view: carrier index → configuration
    pub fn carrier_map(&self) -> BTreeMap<CarrierId, CarrierConfig> {
        self.carriers
            .iter()
            .map(|c| (c.carrier_id, c.clone()))
            .collect()
    }

    /// Keyed view: carrier index → blockage flag
    pub fn blockage_map(&self) -> BTreeMap<CarrierId, bool> {
        self.carriers
            .iter()
            .map(|c| (c.carrier_id, c.blockage))
            .collect()
    }

    /// Per-carrier configuration report, in carrier order
    pub fn diagnostics(&self) -> Vec<CarrierDiagnostic> {
        self.carriers
            .iter()
            .map(|c| CarrierDiagnostic {
                carrier_id: c.carrier_id,
                frequency_ghz: c.center_frequency_hz / 1e9,
                bandwidth_mhz: c.bandwidth_hz() / 1e6,
                blockage: c.blockage,
                ref_signals_per_symbol: c.ref_signals_per_symbol,
                chunks_per_rb: c.chunks_per_rb,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::allocate;

    fn build(params: &ScenarioParameters) -> CarrierSet {
        let defaults = ScenarioDefaults::default();
        let baseline = SpectrumShare::new(
            defaults.spectrum.chunks_per_rb,
            defaults.spectrum.ref_signals_per_symbol,
        );
        let split = allocate(baseline, params.band_div, params.use_ca).unwrap();
        CarrierSet::build(params, &defaults, &split)
    }

    #[test]
    fn test_secondary_carries_its_own_frequency_and_blockage() {
        let params = ScenarioParameters {
            blockage1: true,
            ..Default::default()
        };
        let set = build(&params);

        let secondary = set.get(1).unwrap();
        assert!(!secondary.is_primary());
        assert!(secondary.blockage());
        assert_eq!(secondary.center_frequency_hz(), 73e9);
        assert!(!set.primary().blockage());
    }

    #[test]
    fn test_full_band_is_one_gigahertz() {
        let params = ScenarioParameters {
            use_ca: false,
            ..Default::default()
        };
        let set = build(&params);
        let mhz = set.diagnostics()[0].bandwidth_mhz;
        assert!((mhz - 1000.008).abs() < 1e-6, "got {} MHz", mhz);
    }

    #[test]
    fn test_diagnostic_line_format() {
        let set = build(&ScenarioParameters::default());
        let line = set.diagnostics()[1].to_string();
        assert!(line.starts_with("Component Carrier 1 frequency : 73 GHz"));
        assert!(line.ends_with("blockage : 0, numRefSc: 432, ChunkPerRB: 36"));
    }
}
