//! mmWave Carrier-Aggregation Scenario CLI
//!
//! Runs one scenario and writes its traces under `--file-path`.
//!
//! Usage:
//!   mmwave-ca-scenario --use-ca true --band-div 4 --use-epc true \
//!                      --sim-time 2 --file-path out/
//!
//! The camelCase spellings (`--useCa`, `--bandDiv`, `--useRR`, ...) are
//! accepted as aliases.

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::Parser;
use mmwave_ca_scenario_core::{
    CcmPolicyKind, RunManifest, ScenarioDefaults, ScenarioParameters, ScenarioRunner,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mmwave-ca-scenario",
    about = "Run a single mmWave carrier-aggregation scenario"
)]
struct Args {
    /// Operate two component carriers
    #[arg(long = "use-ca", alias = "useCa", default_value_t = true, value_parser = BoolishValueParser::new(), action = clap::ArgAction::Set)]
    use_ca: bool,

    /// Bandwidth divisor: CC0 gets (1 - 1/n), CC1 gets 1/n
    #[arg(long = "band-div", alias = "bandDiv", default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    band_div: u32,

    /// Round-robin carrier manager instead of the bandwidth-proportional one
    #[arg(long = "use-rr", alias = "useRR", default_value_t = false, value_parser = BoolishValueParser::new(), action = clap::ArgAction::Set)]
    use_rr: bool,

    /// Attach through the packet gateway with UDP applications
    #[arg(long = "use-epc", alias = "useEpc", default_value_t = false, value_parser = BoolishValueParser::new(), action = clap::ArgAction::Set)]
    use_epc: bool,

    /// Blockage on CC0
    #[arg(long, default_value_t = false, value_parser = BoolishValueParser::new(), action = clap::ArgAction::Set)]
    blockage0: bool,

    /// Blockage on CC1
    #[arg(long, default_value_t = false, value_parser = BoolishValueParser::new(), action = clap::ArgAction::Set)]
    blockage1: bool,

    /// CC0 centre frequency in Hz
    #[arg(long, default_value_t = 28e9, value_parser = positive_f64)]
    frequency0: f64,

    /// CC1 centre frequency in Hz
    #[arg(long, default_value_t = 73e9, value_parser = positive_f64)]
    frequency1: f64,

    /// Simulation time in seconds
    #[arg(long = "sim-time", alias = "simTime", default_value_t = 5.0, value_parser = positive_f64)]
    sim_time: f64,

    /// Output directory for traces and the run manifest
    #[arg(long = "file-path", alias = "filePath", default_value = ".")]
    file_path: PathBuf,

    /// Run number of the RNG stream
    #[arg(long = "run-set", alias = "runSet", default_value_t = 1)]
    run_set: u32,

    /// JSON file overriding framework defaults
    #[arg(long)]
    defaults: Option<PathBuf>,

    /// Print the run manifest as JSON when done
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn positive_f64(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("must be a positive number, got {}", s))
    }
}

impl Args {
    fn parameters(&self) -> ScenarioParameters {
        ScenarioParameters {
            use_ca: self.use_ca,
            band_div: self.band_div,
            ccm_policy: CcmPolicyKind::from_use_rr(self.use_rr),
            use_epc: self.use_epc,
            blockage0: self.blockage0,
            blockage1: self.blockage1,
            frequency0: self.frequency0,
            frequency1: self.frequency1,
            sim_time: self.sim_time,
            file_path: self.file_path.clone(),
            run_set: self.run_set,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let defaults = match &args.defaults {
        Some(path) => ScenarioDefaults::from_json_file(path)
            .with_context(|| format!("loading defaults from {}", path.display()))?,
        None => ScenarioDefaults::default(),
    };

    let runner = ScenarioRunner::new(args.parameters(), defaults).context("invalid scenario parameters")?;
    let summary = runner.run().context("scenario run failed")?;

    for carrier in &summary.carriers {
        println!("{}", carrier);
    }

    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Run id:          {}", summary.run_id);
    info!("Attachment:      {:?}", summary.attachment_mode);
    info!("Carrier manager: {}", summary.ccm_policy);
    info!("Stop time:       {}", summary.stop_time);
    info!("Events logged:   {}", summary.events.len());
    info!("UE MAC tx rows:  {}", summary.counters.mac_tx_rows);
    info!("DL bytes:        {}", summary.counters.downlink_bytes);
    info!("UL bytes:        {}", summary.counters.uplink_bytes);
    for (carrier, blocks) in &summary.counters.blocks_per_carrier {
        info!("CC{} blocks:      {}", carrier, blocks);
    }
    info!("Output:          {}", summary.output_dir.display());

    if args.json {
        let manifest = RunManifest::read_from(&summary.manifest_path)
            .with_context(|| format!("reading {}", summary.manifest_path.display()))?;
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scenario_defaults() {
        let args = Args::parse_from(["mmwave-ca-scenario"]);
        assert_eq!(args.parameters(), ScenarioParameters::default());
    }

    #[test]
    fn test_camel_case_aliases() {
        let args = Args::parse_from([
            "mmwave-ca-scenario",
            "--useCa=false",
            "--bandDiv=4",
            "--useRR=1",
            "--useEpc=true",
            "--simTime=0.5",
        ]);
        let params = args.parameters();
        assert!(!params.use_ca);
        assert_eq!(params.band_div, 4);
        assert_eq!(params.ccm_policy, CcmPolicyKind::RoundRobin);
        assert!(params.use_epc);
        assert_eq!(params.sim_time, 0.5);
    }

    #[test]
    fn test_zero_band_div_rejected_at_parse() {
        assert!(Args::try_parse_from(["mmwave-ca-scenario", "--band-div", "0"]).is_err());
        assert!(Args::try_parse_from(["mmwave-ca-scenario", "--sim-time", "-1"]).is_err());
    }
}
