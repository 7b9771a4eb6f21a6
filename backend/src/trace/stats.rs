//! Per-epoch RLC and PDCP bearer statistics
//!
//! Counts PDUs and bytes per (cell, IMSI, RNTI, LCID) during each epoch and
//! writes one row per active bearer when the epoch closes. Epochs with no
//! traffic produce no rows.

use super::writer::TsvTrace;
use crate::core::time::SimTime;
use crate::error::Result;
use crate::network::{Direction, MacTransmission};
use std::collections::BTreeMap;
use std::path::Path;

pub const STATS_HEADER: [&str; 10] = [
    "% start", "end", "CellId", "IMSI", "RNTI", "LCID", "nTxPDUs", "TxBytes", "nRxPDUs", "RxBytes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct BearerKey {
    cell_id: u16,
    imsi: u64,
    rnti: u16,
    lcid: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    tx_pdus: u64,
    tx_bytes: u64,
    rx_pdus: u64,
    rx_bytes: u64,
}

/// Which layer's PDU size a calculator accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsLayer {
    Rlc,
    Pdcp,
}

struct DirectionStats {
    trace: TsvTrace,
    counters: BTreeMap<BearerKey, Counters>,
}

pub struct BearerStatsCalculator {
    layer: StatsLayer,
    downlink: DirectionStats,
    uplink: DirectionStats,
    epoch_start: SimTime,
}

impl BearerStatsCalculator {
    pub fn create(layer: StatsLayer, dl_path: &Path, ul_path: &Path) -> Result<Self> {
        Ok(Self {
            layer,
            downlink: DirectionStats {
                trace: TsvTrace::create(dl_path, &STATS_HEADER)?,
                counters: BTreeMap::new(),
            },
            uplink: DirectionStats {
                trace: TsvTrace::create(ul_path, &STATS_HEADER)?,
                counters: BTreeMap::new(),
            },
            epoch_start: SimTime::ZERO,
        })
    }

    pub fn record(&mut self, tx: &MacTransmission) {
        let bytes = u64::from(match self.layer {
            StatsLayer::Rlc => tx.rlc_bytes,
            StatsLayer::Pdcp => tx.pdcp_bytes,
        });
        let key = BearerKey {
            cell_id: tx.cell_id,
            imsi: tx.imsi,
            rnti: tx.rnti,
            lcid: tx.lcid,
        };
        let stats = match tx.direction {
            Direction::Downlink => &mut self.downlink,
            Direction::Uplink => &mut self.uplink,
        };
        let counters = stats.counters.entry(key).or_default();
        counters.tx_pdus += 1;
        counters.tx_bytes += bytes;
        // reception is lossless and immediate
        counters.rx_pdus += 1;
        counters.rx_bytes += bytes;
    }

    /// Close the epoch ending at `end` and write its rows
    pub fn close_epoch(&mut self, end: SimTime) -> Result<()> {
        let start = self.epoch_start;
        for stats in [&mut self.downlink, &mut self.uplink] {
            for (key, c) in std::mem::take(&mut stats.counters) {
                stats.trace.write_row(&[
                    &start.as_secs_f64(),
                    &end.as_secs_f64(),
                    &key.cell_id,
                    &key.imsi,
                    &key.rnti,
                    &key.lcid,
                    &c.tx_pdus,
                    &c.tx_bytes,
                    &c.rx_pdus,
                    &c.rx_bytes,
                ])?;
            }
        }
        self.epoch_start = end;
        Ok(())
    }

    pub fn rows(&self) -> (u64, u64) {
        (self.downlink.trace.rows(), self.uplink.trace.rows())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.downlink.trace.flush()?;
        self.uplink.trace.flush()
    }
}
