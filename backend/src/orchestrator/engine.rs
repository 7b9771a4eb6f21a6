//! Run driver
//!
//! Builds a scenario from its parameters and defaults, runs it to the stop
//! time and tears it down.
//!
//! # Sequence
//!
//! ```text
//! 1. Split the baseline spectrum and build the carrier set
//! 2. Place the base station and terminal (mobility, buildings)
//! 3. Install the base-station device, then the terminal device
//! 4. Attach (full stack or direct bearer)
//! 5. Enable tracing
//! 6. Make mobility consistent
//! 7. Run the event loop until the stop time
//! 8. Flush traces, write the manifest
//! ```
//!
//! Steps 1-6 happen in [`ScenarioRunner::prepare`] at time zero. The
//! returned [`PreparedScenario`] exposes the queued actions so callers can
//! inspect the schedule before running it.
//!
//! # Example
//!
//! ```rust,no_run
//! use mmwave_ca_scenario_core::{ScenarioDefaults, ScenarioParameters, ScenarioRunner};
//!
//! let params = ScenarioParameters {
//!     sim_time: 1.0,
//!     file_path: "out".into(),
//!     ..Default::default()
//! };
//! let runner = ScenarioRunner::new(params, ScenarioDefaults::default()).unwrap();
//! let summary = runner.run().unwrap();
//! for carrier in &summary.carriers {
//!     println!("{}", carrier);
//! }
//! ```

use super::attachment::{AttachContext, Attachment, AttachmentMode, AttachmentOrchestrator, AttachmentPhase};
use super::manifest::{scenario_config_hash, RunManifest};
use crate::ccm::create_manager;
use crate::config::{ScenarioDefaults, ScenarioParameters};
use crate::core::time::SimTime;
use crate::error::{Result, ScenarioError};
use crate::models::carrier::{CarrierDiagnostic, CarrierSet};
use crate::models::event::{Event, EventLog};
use crate::models::node::NodeId;
use crate::network::{Direction, RadioNetwork, IP_UDP_HEADER_BYTES};
use crate::rng::RngManager;
use crate::sim::Scheduler;
use crate::spectrum::{allocate, SpectrumShare, SpectrumSplit};
use crate::topology::{build_radio_topology, NetworkTopology};
use crate::trace::{TraceCounters, TraceSet};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Actions the event loop executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioAction {
    /// Start sink and client of one direction
    StartApplications(Direction),
    /// Send the next datagram of a running flow
    SendPacket(Direction),
    /// One saturation PDU per direction on the direct bearer
    SaturationTick,
    /// End the current walk leg of a node and draw the next
    WalkStep(NodeId),
    /// Write the RLC/PDCP stats rows of the epoch ending now
    CloseStatsEpoch,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub config_hash: String,
    pub attachment_mode: AttachmentMode,
    pub ccm_policy: String,
    pub carriers: Vec<CarrierDiagnostic>,
    pub spectrum_residual: SpectrumShare,
    pub stop_time: SimTime,
    pub final_phase: AttachmentPhase,
    /// Every attachment phase entered, in order
    pub phase_history: Vec<AttachmentPhase>,
    pub counters: TraceCounters,
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub events: EventLog,
}

/// Validated configuration of one run
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    params: ScenarioParameters,
    defaults: ScenarioDefaults,
}

impl ScenarioRunner {
    pub fn new(params: ScenarioParameters, defaults: ScenarioDefaults) -> Result<Self> {
        params.validate()?;
        defaults.validate()?;
        Ok(Self { params, defaults })
    }

    pub fn params(&self) -> &ScenarioParameters {
        &self.params
    }

    pub fn defaults(&self) -> &ScenarioDefaults {
        &self.defaults
    }

    /// Carry out every setup step at time zero
    pub fn prepare(&self) -> Result<PreparedScenario> {
        let params = &self.params;
        let defaults = &self.defaults;
        let mut log = EventLog::new();
        let mut scheduler: Scheduler<ScenarioAction> = Scheduler::new();
        let time = scheduler.now();

        let baseline = SpectrumShare::new(
            defaults.spectrum.chunks_per_rb,
            defaults.spectrum.ref_signals_per_symbol,
        );
        let split = allocate(baseline, params.band_div, params.use_ca)?;
        let residual = split.residual(baseline);
        if residual.chunks > 0 || residual.ref_signals > 0 {
            warn!(
                band_div = params.band_div,
                lost_chunks = residual.chunks,
                lost_ref_signals = residual.ref_signals,
                "spectrum split loses units to truncation"
            );
        }

        let carriers = CarrierSet::build(params, defaults, &split);
        for carrier in carriers.iter() {
            log.log(Event::CarrierConfigured {
                time,
                carrier_id: carrier.carrier_id(),
                frequency_hz: carrier.center_frequency_hz(),
                bandwidth_hz: carrier.bandwidth_hz(),
                is_primary: carrier.is_primary(),
                blockage: carrier.blockage(),
            });
        }

        let mut rng = RngManager::for_run(defaults.rng_seed, u64::from(params.run_set));
        let mut radio_topology = build_radio_topology(&defaults.topology, &mut rng, &mut log)?;
        let mut radio = RadioNetwork::new(&carriers, &defaults.channel, create_manager(params.ccm_policy));

        let mut orchestrator = AttachmentOrchestrator::new();
        orchestrator.install_devices(&mut radio_topology, &mut radio, time, &mut log)?;

        let terminal = radio_topology.terminal;
        let attachment = orchestrator.attach(
            AttachmentMode::from_use_epc(params.use_epc),
            AttachContext {
                topology: &mut radio_topology.topology,
                radio: &mut radio,
                scheduler: &mut scheduler,
                log: &mut log,
                defaults,
                terminal,
            },
        )?;

        let traces = orchestrator.enable_tracing(&params.file_path, &defaults.output, time, &mut log)?;
        radio_topology.topology.make_mobility_consistent(time, &mut log)?;

        let leg_interval = SimTime::from_millis(defaults.topology.walk_interval_ms);
        scheduler.schedule(time + leg_interval, ScenarioAction::WalkStep(terminal))?;
        let stats_epoch = SimTime::from_millis(defaults.output.stats_epoch_ms);
        scheduler.schedule(time + stats_epoch, ScenarioAction::CloseStatsEpoch)?;

        Ok(PreparedScenario {
            params: params.clone(),
            defaults: defaults.clone(),
            split,
            carriers,
            rng,
            scheduler,
            log,
            topology: radio_topology.topology,
            radio,
            orchestrator,
            attachment,
            traces,
            stop: SimTime::from_secs_f64(params.sim_time),
            leg_interval,
            stats_epoch,
        })
    }

    /// Prepare and run to completion
    pub fn run(&self) -> Result<RunSummary> {
        self.prepare()?.run()
    }
}

/// A fully set-up run, waiting for its clock to start
pub struct PreparedScenario {
    params: ScenarioParameters,
    defaults: ScenarioDefaults,
    split: SpectrumSplit,
    carriers: CarrierSet,
    rng: RngManager,
    scheduler: Scheduler<ScenarioAction>,
    log: EventLog,
    topology: NetworkTopology,
    radio: RadioNetwork,
    orchestrator: AttachmentOrchestrator,
    attachment: Attachment,
    traces: TraceSet,
    stop: SimTime,
    leg_interval: SimTime,
    stats_epoch: SimTime,
}

impl PreparedScenario {
    pub fn phase(&self) -> AttachmentPhase {
        self.orchestrator.phase()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    pub fn carriers(&self) -> &CarrierSet {
        &self.carriers
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn stop_time(&self) -> SimTime {
        self.stop
    }

    /// Queued actions in firing order
    pub fn pending_actions(&self) -> Vec<(SimTime, &ScenarioAction)> {
        self.scheduler.pending_actions()
    }

    /// Run the event loop to the stop time and tear down
    pub fn run(mut self) -> Result<RunSummary> {
        self.orchestrator.start()?;
        info!(stop = %self.stop, mode = ?self.attachment.mode(), "simulation started");

        let mut executed = 0u64;
        while let Some((time, action)) = self.scheduler.pop_before(self.stop) {
            self.handle(time, action)?;
            executed += 1;
        }
        self.scheduler.advance_to(self.stop);
        self.log.log(Event::SimulationStopped { time: self.stop });
        self.orchestrator.terminate()?;
        info!(actions = executed, transmissions = self.radio.transmissions(), "simulation stopped");

        self.teardown()
    }

    fn handle(&mut self, time: SimTime, action: ScenarioAction) -> Result<()> {
        match action {
            ScenarioAction::StartApplications(direction) => {
                let Attachment::FullStack(fs) = &mut self.attachment else {
                    return Err(ScenarioError::Collaborator(
                        "application start without applications".to_string(),
                    ));
                };
                if fs.flow_mut(direction).start() {
                    self.log.log(Event::ApplicationStarted { time, direction });
                    self.scheduler.schedule(time, ScenarioAction::SendPacket(direction))?;
                    debug!(?direction, "applications started");
                }
            }
            ScenarioAction::SendPacket(direction) => {
                let Attachment::FullStack(fs) = &mut self.attachment else {
                    return Err(ScenarioError::Collaborator(
                        "packet send without applications".to_string(),
                    ));
                };
                let bearer = fs.bearer;
                let flow = fs.flow_mut(direction);
                if let Some(payload) = flow.client.next_packet() {
                    let tx = self
                        .radio
                        .transmit(&bearer, direction, payload.saturating_add(IP_UDP_HEADER_BYTES), time);
                    flow.sink.receive(payload);
                    if flow.client.has_remaining() {
                        self.scheduler
                            .schedule_in(flow.client.interval, ScenarioAction::SendPacket(direction));
                    }
                    self.traces.record_transmission(&tx)?;
                }
            }
            ScenarioAction::SaturationTick => {
                let Attachment::DirectBearer(db) = &self.attachment else {
                    return Err(ScenarioError::Collaborator(
                        "saturation traffic without a direct bearer".to_string(),
                    ));
                };
                let (bearer, pdu_bytes, interval) = (db.bearer, db.pdu_bytes, db.interval);
                for direction in Direction::ALL {
                    let tx = self.radio.transmit(&bearer, direction, pdu_bytes, time);
                    self.traces.record_transmission(&tx)?;
                }
                self.scheduler.schedule_in(interval, ScenarioAction::SaturationTick);
            }
            ScenarioAction::WalkStep(node) => {
                if let Some(position) = self.topology.step_walk(node, &mut self.rng, time, &mut self.log)? {
                    debug!(%node, %position, "walk leg");
                }
                self.scheduler.schedule_in(self.leg_interval, ScenarioAction::WalkStep(node));
            }
            ScenarioAction::CloseStatsEpoch => {
                self.traces.close_epoch(time)?;
                self.scheduler.schedule_in(self.stats_epoch, ScenarioAction::CloseStatsEpoch);
            }
        }
        Ok(())
    }

    fn teardown(self) -> Result<RunSummary> {
        let output_dir = self.traces.output_dir().to_path_buf();
        let counters = self.traces.finish(self.stop)?;

        let run_id = Uuid::new_v4();
        let config_hash = scenario_config_hash(&self.params, &self.defaults)?;
        let carriers = self.carriers.diagnostics();
        let spectrum_residual = self.split.residual(SpectrumShare::new(
            self.defaults.spectrum.chunks_per_rb,
            self.defaults.spectrum.ref_signals_per_symbol,
        ));
        let ccm_policy = self.radio.ccm_name().to_string();

        let manifest = RunManifest {
            run_id,
            config_hash: config_hash.clone(),
            parameters: self.params.clone(),
            rng_seed: self.defaults.rng_seed,
            attachment_mode: self.attachment.mode(),
            ccm_policy: ccm_policy.clone(),
            carriers: carriers.clone(),
            spectrum_residual,
            stop_time_s: self.stop.as_secs_f64(),
            event_count: self.log.len(),
            counters: counters.clone(),
        };
        let manifest_path = output_dir.join(&self.defaults.output.manifest);
        manifest.write_to(&manifest_path)?;
        info!(%run_id, path = %manifest_path.display(), "manifest written");

        Ok(RunSummary {
            run_id,
            config_hash,
            attachment_mode: self.attachment.mode(),
            ccm_policy,
            carriers,
            spectrum_residual,
            stop_time: self.stop,
            final_phase: self.orchestrator.phase(),
            phase_history: self.orchestrator.history().to_vec(),
            counters,
            output_dir,
            manifest_path,
            events: self.log,
        })
    }
}
