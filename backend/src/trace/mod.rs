//! Trace output
//!
//! Files created under the run's output directory when tracing is enabled:
//!
//! | File                    | Rows                                         |
//! |-------------------------|----------------------------------------------|
//! | `DlRlcStats.txt` etc.   | one per active bearer per stats epoch        |
//! | `RxPacketTrace.txt`     | one per received transport block, both ways  |
//! | `RlcAmBufferSize.txt`   | one per RLC enqueue                          |
//! | `TxMacPacketTraceUe.txt`| one per uplink transport block sent by the UE|
//!
//! Every file starts with a tab-separated header row. Files are flushed
//! when the run finishes.

mod stats;
mod writer;

pub use stats::{BearerStatsCalculator, StatsLayer, STATS_HEADER};
pub use writer::TsvTrace;

use crate::config::OutputDefaults;
use crate::core::time::SimTime;
use crate::error::{Result, ScenarioError};
use crate::models::carrier::CarrierId;
use crate::network::{Direction, MacTransmission};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MAC_TX_HEADER: [&str; 3] = ["Time", "CC", "Packet size"];
pub const RX_PACKET_HEADER: [&str; 7] = ["DL/UL", "time", "cellId", "rnti", "ccId", "tbSize", "blockage"];
pub const RLC_BUFFER_HEADER: [&str; 5] = ["DL/UL", "Time", "RNTI", "LCID", "BufferSize"];

/// Totals reported once the traces are closed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceCounters {
    pub mac_tx_rows: u64,
    pub rx_packet_rows: u64,
    pub rlc_buffer_rows: u64,
    pub stats_rows: u64,
    pub downlink_bytes: u64,
    pub uplink_bytes: u64,
    /// Transport blocks per carrier, both directions
    pub blocks_per_carrier: BTreeMap<CarrierId, u64>,
}

/// All trace sinks of one run
pub struct TraceSet {
    output_dir: PathBuf,
    mac_tx: TsvTrace,
    rx_packet: TsvTrace,
    rlc_buffer: TsvTrace,
    rlc_stats: BearerStatsCalculator,
    pdcp_stats: BearerStatsCalculator,
    counters: TraceCounters,
}

impl TraceSet {
    pub fn create(output_dir: &Path, names: &OutputDefaults) -> Result<Self> {
        std::fs::create_dir_all(output_dir).map_err(|e| ScenarioError::io(output_dir, e))?;

        let trace_set = Self {
            output_dir: output_dir.to_path_buf(),
            mac_tx: TsvTrace::create(output_dir.join(&names.mac_tx_trace), &MAC_TX_HEADER)?,
            rx_packet: TsvTrace::create(output_dir.join(&names.rx_packet_trace), &RX_PACKET_HEADER)?,
            rlc_buffer: TsvTrace::create(output_dir.join(&names.rlc_am_buffer_size), &RLC_BUFFER_HEADER)?,
            rlc_stats: BearerStatsCalculator::create(
                StatsLayer::Rlc,
                &output_dir.join(&names.dl_rlc_stats),
                &output_dir.join(&names.ul_rlc_stats),
            )?,
            pdcp_stats: BearerStatsCalculator::create(
                StatsLayer::Pdcp,
                &output_dir.join(&names.dl_pdcp_stats),
                &output_dir.join(&names.ul_pdcp_stats),
            )?,
            counters: TraceCounters::default(),
        };
        debug!(dir = %output_dir.display(), "traces created");
        Ok(trace_set)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Feed one transport block to every sink
    pub fn record_transmission(&mut self, tx: &MacTransmission) -> Result<()> {
        let secs = tx.time.as_secs_f64();
        let tag = tx.direction.tag();

        self.rlc_buffer
            .write_row(&[&tag, &secs, &tx.rnti, &tx.lcid, &tx.rlc_bytes])?;
        self.rlc_stats.record(tx);
        self.pdcp_stats.record(tx);

        if tx.direction == Direction::Uplink {
            self.mac_tx.write_row(&[&secs, &tx.carrier_id, &tx.tb_size])?;
        }
        self.rx_packet.write_row(&[
            &tag,
            &secs,
            &tx.cell_id,
            &tx.rnti,
            &tx.carrier_id,
            &tx.tb_size,
            &u8::from(tx.blockage),
        ])?;

        match tx.direction {
            Direction::Downlink => self.counters.downlink_bytes += u64::from(tx.tb_size),
            Direction::Uplink => self.counters.uplink_bytes += u64::from(tx.tb_size),
        }
        *self.counters.blocks_per_carrier.entry(tx.carrier_id).or_insert(0) += 1;
        Ok(())
    }

    /// Write the stats rows of the epoch ending at `now`
    pub fn close_epoch(&mut self, now: SimTime) -> Result<()> {
        self.rlc_stats.close_epoch(now)?;
        self.pdcp_stats.close_epoch(now)
    }

    /// Close the last epoch, flush every file and report totals
    pub fn finish(mut self, now: SimTime) -> Result<TraceCounters> {
        self.close_epoch(now)?;
        self.mac_tx.flush()?;
        self.rx_packet.flush()?;
        self.rlc_buffer.flush()?;
        self.rlc_stats.flush()?;
        self.pdcp_stats.flush()?;

        let (rlc_dl, rlc_ul) = self.rlc_stats.rows();
        let (pdcp_dl, pdcp_ul) = self.pdcp_stats.rows();
        self.counters.mac_tx_rows = self.mac_tx.rows();
        self.counters.rx_packet_rows = self.rx_packet.rows();
        self.counters.rlc_buffer_rows = self.rlc_buffer.rows();
        self.counters.stats_rows = rlc_dl + rlc_ul + pdcp_dl + pdcp_ul;
        Ok(self.counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(time_ms: u64, direction: Direction, carrier_id: CarrierId) -> MacTransmission {
        MacTransmission {
            time: SimTime::from_millis(time_ms),
            direction,
            cell_id: 1,
            imsi: 1,
            rnti: 1,
            lcid: 3,
            carrier_id,
            blockage: false,
            pdcp_bytes: 1002,
            rlc_bytes: 1004,
            tb_size: 1007,
        }
    }

    #[test]
    fn test_mac_trace_only_holds_uplink() {
        let dir = tempfile::tempdir().unwrap();
        let mut traces = TraceSet::create(dir.path(), &OutputDefaults::default()).unwrap();
        traces.record_transmission(&block(1, Direction::Downlink, 0)).unwrap();
        traces.record_transmission(&block(1, Direction::Uplink, 1)).unwrap();
        let counters = traces.finish(SimTime::from_millis(2)).unwrap();

        assert_eq!(counters.mac_tx_rows, 1);
        assert_eq!(counters.rx_packet_rows, 2);
        assert_eq!(counters.blocks_per_carrier.get(&0), Some(&1));
        assert_eq!(counters.blocks_per_carrier.get(&1), Some(&1));

        let mac = std::fs::read_to_string(dir.path().join("TxMacPacketTraceUe.txt")).unwrap();
        let lines: Vec<&str> = mac.lines().collect();
        assert_eq!(lines, vec!["Time\tCC\tPacket size", "0.001\t1\t1007"]);
    }

    #[test]
    fn test_stats_epoch_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut traces = TraceSet::create(dir.path(), &OutputDefaults::default()).unwrap();
        traces.record_transmission(&block(1, Direction::Downlink, 0)).unwrap();
        traces.record_transmission(&block(2, Direction::Downlink, 1)).unwrap();
        traces.close_epoch(SimTime::from_millis(250)).unwrap();
        // quiet epoch writes nothing
        traces.close_epoch(SimTime::from_millis(500)).unwrap();
        let counters = traces.finish(SimTime::from_millis(600)).unwrap();

        // one DL row each for RLC and PDCP
        assert_eq!(counters.stats_rows, 2);
        let rlc = std::fs::read_to_string(dir.path().join("DlRlcStats.txt")).unwrap();
        let row = rlc.lines().nth(1).unwrap();
        assert_eq!(row, "0\t0.25\t1\t1\t1\t3\t2\t2008\t2\t2008");
        let pdcp = std::fs::read_to_string(dir.path().join("DlPdcpStats.txt")).unwrap();
        assert!(pdcp.lines().nth(1).unwrap().ends_with("2\t2004\t2\t2004"));
    }
}
