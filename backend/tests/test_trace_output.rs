//! Trace files and run manifest written by a run

use mmwave_ca_scenario_core::trace::{MAC_TX_HEADER, RX_PACKET_HEADER, STATS_HEADER};
use mmwave_ca_scenario_core::{RunManifest, ScenarioDefaults, ScenarioParameters, ScenarioRunner};
use std::path::Path;

const TRACE_FILES: [&str; 7] = [
    "DlRlcStats.txt",
    "UlRlcStats.txt",
    "DlPdcpStats.txt",
    "UlPdcpStats.txt",
    "RxPacketTrace.txt",
    "RlcAmBufferSize.txt",
    "TxMacPacketTraceUe.txt",
];

fn run(dir: &Path, params: ScenarioParameters) {
    let params = ScenarioParameters {
        file_path: dir.to_path_buf(),
        ..params
    };
    ScenarioRunner::new(params, ScenarioDefaults::default())
        .unwrap()
        .run()
        .unwrap();
}

fn read(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn test_every_trace_starts_with_header() {
    let dir = tempfile::tempdir().unwrap();
    run(
        dir.path(),
        ScenarioParameters {
            sim_time: 0.3,
            ..Default::default()
        },
    );

    for name in TRACE_FILES {
        let contents = read(dir.path(), name);
        let header = contents.lines().next().unwrap_or_default();
        assert!(!header.is_empty(), "{} has no header", name);
        assert!(header.contains('\t'), "{} header is not tab-separated", name);
    }
    assert_eq!(read(dir.path(), "TxMacPacketTraceUe.txt").lines().next(), Some(MAC_TX_HEADER.join("\t").as_str()));
    assert_eq!(read(dir.path(), "RxPacketTrace.txt").lines().next(), Some(RX_PACKET_HEADER.join("\t").as_str()));
    assert_eq!(read(dir.path(), "UlRlcStats.txt").lines().next(), Some(STATS_HEADER.join("\t").as_str()));
}

#[test]
fn test_mac_trace_rows() {
    let dir = tempfile::tempdir().unwrap();
    run(
        dir.path(),
        ScenarioParameters {
            sim_time: 0.01,
            ..Default::default()
        },
    );

    let contents = read(dir.path(), "TxMacPacketTraceUe.txt");
    let rows: Vec<Vec<&str>> = contents.lines().skip(1).map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows.len(), 10);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), 3);
        let time: f64 = row[0].parse().unwrap();
        assert!((time - i as f64 * 0.001).abs() < 1e-12);
        assert!(row[1] == "0" || row[1] == "1");
        // 1000 byte PDU + PDCP, RLC and MAC headers
        assert_eq!(row[2], "1007");
    }
}

#[test]
fn test_single_carrier_traces_only_cc0() {
    let dir = tempfile::tempdir().unwrap();
    run(
        dir.path(),
        ScenarioParameters {
            use_ca: false,
            sim_time: 0.02,
            ..Default::default()
        },
    );

    let contents = read(dir.path(), "RxPacketTrace.txt");
    assert!(contents
        .lines()
        .skip(1)
        .all(|l| l.split('\t').nth(4) == Some("0")));
}

#[test]
fn test_blockage_column_follows_carrier() {
    let dir = tempfile::tempdir().unwrap();
    run(
        dir.path(),
        ScenarioParameters {
            blockage1: true,
            sim_time: 0.02,
            ..Default::default()
        },
    );

    let contents = read(dir.path(), "RxPacketTrace.txt");
    let mut seen = 0;
    for line in contents.lines().skip(1) {
        let fields: Vec<&str> = line.split('\t').collect();
        let expected = if fields[4] == "1" { "1" } else { "0" };
        assert_eq!(fields[6], expected);
        seen += 1;
    }
    assert_eq!(seen, 40);
}

#[test]
fn test_stats_rows_per_epoch() {
    let dir = tempfile::tempdir().unwrap();
    run(
        dir.path(),
        ScenarioParameters {
            sim_time: 0.6,
            ..Default::default()
        },
    );

    // epochs close at 0.25, 0.5 and at the 0.6 s stop
    let contents = read(dir.path(), "DlRlcStats.txt");
    let ends: Vec<&str> = contents
        .lines()
        .skip(1)
        .map(|l| l.split('\t').nth(1).unwrap())
        .collect();
    assert_eq!(ends, vec!["0.25", "0.5", "0.6"]);
}

#[test]
fn test_manifest_matches_run() {
    let dir = tempfile::tempdir().unwrap();
    let params = ScenarioParameters {
        use_epc: true,
        sim_time: 0.2,
        file_path: dir.path().to_path_buf(),
        ..Default::default()
    };
    let summary = ScenarioRunner::new(params.clone(), ScenarioDefaults::default())
        .unwrap()
        .run()
        .unwrap();

    let manifest = RunManifest::read_from(&dir.path().join("scenario-manifest.json")).unwrap();
    assert_eq!(manifest.run_id, summary.run_id);
    assert_eq!(manifest.config_hash, summary.config_hash);
    assert_eq!(manifest.parameters, params);
    assert_eq!(manifest.carriers.len(), summary.carriers.len());
    assert_eq!(manifest.ccm_policy, summary.ccm_policy);
    assert_eq!(manifest.counters, summary.counters);
    assert_eq!(manifest.event_count, summary.events.len());
}

#[test]
fn test_missing_output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("runs").join("a");
    run(
        &nested,
        ScenarioParameters {
            sim_time: 0.01,
            ..Default::default()
        },
    );
    for name in TRACE_FILES {
        assert!(nested.join(name).exists(), "{} missing", name);
    }
}
