//! Scenario configuration
//!
//! Two layers:
//!
//! - [`ScenarioParameters`]: the run-time knobs that come from the command
//!   line (aggregation, split ratio, attachment mode, frequencies, ...).
//! - [`ScenarioDefaults`]: the framework-wide defaults every component is
//!   constructed from (baseline spectrum, channel, geometry, traffic, file
//!   names). Loaded once, optionally from a JSON file, and threaded through
//!   constructors. There is no process-wide mutable configuration.
//!
//! Both are immutable after construction and validated before anything is
//! built.

use crate::error::{Result, ScenarioError};
use crate::models::node::{Rectangle, Vector3};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

/// Upper bound on terminal walk speed
pub const MAX_WALK_SPEED_MPS: f64 = 1_000.0;
/// Largest UDP payload carried by one IPv4 datagram
pub const MAX_UDP_PAYLOAD_BYTES: u32 = 65_507;
/// Largest PDCP SDU accepted on a direct bearer
pub const MAX_PDCP_SDU_BYTES: u32 = 9_000;

// ============================================================================
// Scenario parameters (CLI knobs)
// ============================================================================

/// Which component-carrier manager distributes traffic across carriers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CcmPolicyKind {
    /// Cycle through carriers one transport block at a time
    RoundRobin,
    /// Spread load in proportion to each carrier's bandwidth
    #[default]
    BandwidthProportional,
}

impl CcmPolicyKind {
    /// Map the `use-rr` command-line switch to a policy
    pub fn from_use_rr(use_rr: bool) -> Self {
        if use_rr {
            CcmPolicyKind::RoundRobin
        } else {
            CcmPolicyKind::BandwidthProportional
        }
    }
}

/// Run-time knobs of one scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    /// Operate two component carriers instead of one
    pub use_ca: bool,

    /// Bandwidth divisor: CC0 gets (1 - 1/band_div), CC1 gets 1/band_div
    pub band_div: u32,

    /// Carrier manager used when aggregation is enabled
    pub ccm_policy: CcmPolicyKind,

    /// Attach through the packet gateway with UDP applications
    pub use_epc: bool,

    pub blockage0: bool,
    pub blockage1: bool,

    /// Centre frequency of CC0 (Hz)
    pub frequency0: f64,

    /// Centre frequency of CC1 (Hz), ignored without aggregation
    pub frequency1: f64,

    /// Run duration in seconds
    pub sim_time: f64,

    /// Directory that receives all output artifacts
    pub file_path: PathBuf,

    /// Run number fed to the RNG together with the seed
    pub run_set: u32,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            use_ca: true,
            band_div: 2,
            ccm_policy: CcmPolicyKind::default(),
            use_epc: false,
            blockage0: false,
            blockage1: false,
            frequency0: 28e9,
            frequency1: 73e9,
            sim_time: 5.0,
            file_path: PathBuf::from("."),
            run_set: 1,
        }
    }
}

impl ScenarioParameters {
    /// Check the preconditions downstream builders rely on
    pub fn validate(&self) -> Result<()> {
        if self.band_div == 0 {
            return Err(ScenarioError::InvalidParameter {
                name: "band_div",
                reason: "must be at least 1".to_string(),
            });
        }

        check_positive("frequency0", self.frequency0)?;
        if self.use_ca {
            check_positive("frequency1", self.frequency1)?;
            if self.frequency0 == self.frequency1 {
                return Err(ScenarioError::InvalidParameter {
                    name: "frequency1",
                    reason: format!(
                        "secondary carrier must not share the primary centre frequency ({} Hz)",
                        self.frequency0
                    ),
                });
            }
        }

        check_positive("sim_time", self.sim_time)?;
        Ok(())
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ScenarioError::InvalidParameter {
            name,
            reason: format!("must be a positive finite number, got {}", value),
        })
    }
}

// ============================================================================
// Framework defaults
// ============================================================================

/// All default values applied before any scenario object is constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioDefaults {
    /// Seed half of the (seed, run) pair
    pub rng_seed: u64,
    pub spectrum: SpectrumDefaults,
    pub channel: ChannelDefaults,
    pub topology: TopologyDefaults,
    pub core_network: CoreNetworkDefaults,
    pub traffic: TrafficDefaults,
    pub output: OutputDefaults,
}

impl Default for ScenarioDefaults {
    fn default() -> Self {
        Self {
            rng_seed: 1,
            spectrum: SpectrumDefaults::default(),
            channel: ChannelDefaults::default(),
            topology: TopologyDefaults::default(),
            core_network: CoreNetworkDefaults::default(),
            traffic: TrafficDefaults::default(),
            output: OutputDefaults::default(),
        }
    }
}

impl ScenarioDefaults {
    /// Load defaults from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ScenarioError::io(path, e))?;
        let defaults: ScenarioDefaults = serde_json::from_reader(BufReader::new(file))?;
        defaults.validate()?;
        Ok(defaults)
    }

    pub fn validate(&self) -> Result<()> {
        check_positive("spectrum.chunk_width_hz", self.spectrum.chunk_width_hz)?;
        if self.spectrum.resource_blocks == 0 {
            return Err(ScenarioError::InvalidParameter {
                name: "spectrum.resource_blocks",
                reason: "must be at least 1".to_string(),
            });
        }

        let topo = &self.topology;
        if !topo.walk_bounds.is_well_formed() {
            return Err(ScenarioError::InvalidParameter {
                name: "topology.walk_bounds",
                reason: format!("degenerate rectangle {:?}", topo.walk_bounds),
            });
        }
        if !(topo.ue_disc_radius_m.is_finite() && topo.ue_disc_radius_m >= 0.0) {
            return Err(ScenarioError::InvalidParameter {
                name: "topology.ue_disc_radius_m",
                reason: format!("must be non-negative, got {}", topo.ue_disc_radius_m),
            });
        }
        let r = topo.ue_disc_radius_m;
        let disc_fits = topo.walk_bounds.x_min <= -r
            && topo.walk_bounds.x_max >= r
            && topo.walk_bounds.y_min <= -r
            && topo.walk_bounds.y_max >= r;
        if !disc_fits {
            return Err(ScenarioError::InvalidParameter {
                name: "topology.ue_disc_radius_m",
                reason: "initial placement disc must lie inside the walk bounds".to_string(),
            });
        }
        if topo.walk_interval_ms == 0 {
            return Err(ScenarioError::InvalidParameter {
                name: "topology.walk_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        let (min_speed, max_speed) = topo.walk_speed_mps;
        if !(min_speed >= 0.0 && min_speed <= max_speed && max_speed <= MAX_WALK_SPEED_MPS) {
            return Err(ScenarioError::InvalidParameter {
                name: "topology.walk_speed_mps",
                reason: format!(
                    "speed range ({}, {}) must satisfy 0 <= min <= max <= {}",
                    min_speed, max_speed, MAX_WALK_SPEED_MPS
                ),
            });
        }

        let traffic = &self.traffic;
        if traffic.inter_packet_interval_ms == 0 || traffic.saturation_interval_us == 0 {
            return Err(ScenarioError::InvalidParameter {
                name: "traffic",
                reason: "packet intervals must be positive".to_string(),
            });
        }
        if traffic.app_start_ms == 0 {
            return Err(ScenarioError::InvalidParameter {
                name: "traffic.app_start_ms",
                reason: "applications must start after simulation start".to_string(),
            });
        }
        if traffic.packet_size_bytes == 0 || traffic.saturation_pdu_bytes == 0 {
            return Err(ScenarioError::InvalidParameter {
                name: "traffic",
                reason: "packet sizes must be positive".to_string(),
            });
        }
        if traffic.packet_size_bytes > MAX_UDP_PAYLOAD_BYTES {
            return Err(ScenarioError::InvalidParameter {
                name: "traffic.packet_size_bytes",
                reason: format!("at most {} bytes", MAX_UDP_PAYLOAD_BYTES),
            });
        }
        if traffic.saturation_pdu_bytes > MAX_PDCP_SDU_BYTES {
            return Err(ScenarioError::InvalidParameter {
                name: "traffic.saturation_pdu_bytes",
                reason: format!("at most {} bytes", MAX_PDCP_SDU_BYTES),
            });
        }

        if self.output.stats_epoch_ms == 0 {
            return Err(ScenarioError::InvalidParameter {
                name: "output.stats_epoch_ms",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Baseline spectrum of a carrier operated alone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumDefaults {
    pub chunks_per_rb: u32,
    pub ref_signals_per_symbol: u32,
    pub chunk_width_hz: f64,
    pub resource_blocks: u32,
}

impl Default for SpectrumDefaults {
    fn default() -> Self {
        Self {
            chunks_per_rb: 72,
            ref_signals_per_symbol: 864,
            chunk_width_hz: 13.889e6,
            resource_blocks: 1,
        }
    }
}

/// Line-of-sight condition assumed by the propagation model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelCondition {
    LineOfSight,
    NonLineOfSight,
}

/// Channel and propagation settings handed to the radio collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelDefaults {
    /// 3GPP scenario: RMa, UMa, UMi-StreetCanyon, InH-OfficeMixed, ...
    pub scenario: String,
    pub condition: ChannelCondition,
    pub optional_nlos: bool,
    pub shadowing: bool,
    pub in_car: bool,
    /// 0 disables channel updates
    pub update_period_ms: u64,
    pub cell_scan: bool,
    pub portrait_mode: bool,
    pub num_non_self_blocking: u32,
    pub blocker_speed_mps: f64,
}

impl Default for ChannelDefaults {
    fn default() -> Self {
        Self {
            scenario: "UMa".to_string(),
            condition: ChannelCondition::NonLineOfSight,
            optional_nlos: false,
            shadowing: false,
            in_car: false,
            update_period_ms: 100,
            cell_scan: false,
            portrait_mode: true,
            num_non_self_blocking: 4,
            blocker_speed_mps: 1.0,
        }
    }
}

/// Rectangular building footprint used for indoor classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub footprint: Rectangle,
    pub height_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyDefaults {
    pub enb_position: Vector3,
    pub ue_disc_radius_m: f64,
    pub ue_height_m: f64,
    pub walk_bounds: Rectangle,
    pub walk_interval_ms: u64,
    /// (min, max) speed drawn for each walk leg
    pub walk_speed_mps: (f64, f64),
    pub buildings_enabled: bool,
    pub buildings: Vec<BuildingSpec>,
}

impl Default for TopologyDefaults {
    fn default() -> Self {
        Self {
            enb_position: Vector3::new(0.0, 0.0, 15.0),
            ue_disc_radius_m: 150.0,
            ue_height_m: 1.5,
            walk_bounds: Rectangle::new(-200.0, 200.0, -200.0, 200.0),
            walk_interval_ms: 1000,
            walk_speed_mps: (2.0, 4.0),
            buildings_enabled: true,
            buildings: Vec::new(),
        }
    }
}

/// Gateway, remote-host link and addressing plan for full-stack runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreNetworkDefaults {
    pub p2p_data_rate_bps: u64,
    pub p2p_mtu: u32,
    pub p2p_delay_us: u64,
    pub internet_base: Ipv4Addr,
    pub internet_mask: Ipv4Addr,
    pub ue_network: Ipv4Addr,
    pub ue_network_mask: Ipv4Addr,
    /// Mask of the route the remote host installs towards terminals
    pub ue_route_mask: Ipv4Addr,
}

impl Default for CoreNetworkDefaults {
    fn default() -> Self {
        Self {
            p2p_data_rate_bps: 100_000_000_000,
            p2p_mtu: 1500,
            p2p_delay_us: 10,
            internet_base: Ipv4Addr::new(1, 0, 0, 0),
            internet_mask: Ipv4Addr::new(255, 255, 0, 0),
            ue_network: Ipv4Addr::new(7, 0, 0, 0),
            ue_network_mask: Ipv4Addr::new(255, 0, 0, 0),
            ue_route_mask: Ipv4Addr::new(255, 255, 0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficDefaults {
    pub dl_port: u16,
    pub ul_port: u16,
    pub inter_packet_interval_ms: u64,
    pub max_packets: u64,
    pub packet_size_bytes: u32,
    /// Offset of application start from simulation start
    pub app_start_ms: u64,
    /// Saturation-mode PDU period for direct bearers
    pub saturation_interval_us: u64,
    pub saturation_pdu_bytes: u32,
}

impl Default for TrafficDefaults {
    fn default() -> Self {
        Self {
            dl_port: 1234,
            ul_port: 2000,
            inter_packet_interval_ms: 100,
            max_packets: 1_000_000,
            packet_size_bytes: 1024,
            app_start_ms: 10,
            saturation_interval_us: 1000,
            saturation_pdu_bytes: 1000,
        }
    }
}

/// Output file names, relative to the run's output directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputDefaults {
    pub dl_rlc_stats: String,
    pub ul_rlc_stats: String,
    pub dl_pdcp_stats: String,
    pub ul_pdcp_stats: String,
    pub rx_packet_trace: String,
    pub rlc_am_buffer_size: String,
    pub mac_tx_trace: String,
    pub manifest: String,
    pub stats_epoch_ms: u64,
}

impl Default for OutputDefaults {
    fn default() -> Self {
        Self {
            dl_rlc_stats: "DlRlcStats.txt".to_string(),
            ul_rlc_stats: "UlRlcStats.txt".to_string(),
            dl_pdcp_stats: "DlPdcpStats.txt".to_string(),
            ul_pdcp_stats: "UlPdcpStats.txt".to_string(),
            rx_packet_trace: "RxPacketTrace.txt".to_string(),
            rlc_am_buffer_size: "RlcAmBufferSize.txt".to_string(),
            mac_tx_trace: "TxMacPacketTraceUe.txt".to_string(),
            manifest: "scenario-manifest.json".to_string(),
            stats_epoch_ms: 250,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(ScenarioParameters::default().validate().is_ok());
        assert!(ScenarioDefaults::default().validate().is_ok());
    }

    #[test]
    fn test_zero_band_div_rejected() {
        let params = ScenarioParameters {
            band_div: 0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ScenarioError::InvalidParameter { name: "band_div", .. })
        ));
    }

    #[test]
    fn test_band_div_of_one_is_accepted() {
        let params = ScenarioParameters {
            band_div: 1,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_shared_frequency_rejected_only_with_aggregation() {
        let mut params = ScenarioParameters {
            frequency1: 28e9,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        params.use_ca = false;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_disc_must_fit_inside_walk_bounds() {
        let mut defaults = ScenarioDefaults::default();
        defaults.topology.ue_disc_radius_m = 250.0;
        assert!(defaults.validate().is_err());
    }

    #[test]
    fn test_walk_speed_is_bounded() {
        let mut defaults = ScenarioDefaults::default();
        defaults.topology.walk_speed_mps = (1e20, 1e20);
        assert!(matches!(
            defaults.validate(),
            Err(ScenarioError::InvalidParameter { name: "topology.walk_speed_mps", .. })
        ));

        defaults.topology.walk_speed_mps = (0.0, f64::INFINITY);
        assert!(defaults.validate().is_err());

        defaults.topology.walk_speed_mps = (MAX_WALK_SPEED_MPS, MAX_WALK_SPEED_MPS);
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_oversized_packets_rejected() {
        let mut defaults = ScenarioDefaults::default();
        defaults.traffic.packet_size_bytes = u32::MAX;
        assert!(matches!(
            defaults.validate(),
            Err(ScenarioError::InvalidParameter { name: "traffic.packet_size_bytes", .. })
        ));

        let mut defaults = ScenarioDefaults::default();
        defaults.traffic.saturation_pdu_bytes = MAX_PDCP_SDU_BYTES + 1;
        assert!(defaults.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "rng_seed": 9, "traffic": { "dl_port": 4000 } }"#;
        let defaults: ScenarioDefaults = serde_json::from_str(json).unwrap();
        assert_eq!(defaults.rng_seed, 9);
        assert_eq!(defaults.traffic.dl_port, 4000);
        assert_eq!(defaults.traffic.ul_port, 2000);
        assert_eq!(defaults.spectrum.chunks_per_rb, 72);
    }
}
