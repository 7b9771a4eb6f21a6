//! Carrier set construction and its keyed views

use mmwave_ca_scenario_core::spectrum::{allocate, SpectrumShare};
use mmwave_ca_scenario_core::{CarrierSet, ScenarioDefaults, ScenarioParameters};
use proptest::prelude::*;

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
fn test_scenario_a_even_aggregation() {
    let set = build(&ScenarioParameters::default());

    assert_eq!(set.len(), 2);
    let cc0 = set.get(0).unwrap();
    let cc1 = set.get(1).unwrap();
    assert_eq!((cc0.chunks_per_rb(), cc1.chunks_per_rb()), (36, 36));
    assert_eq!((cc0.ref_signals_per_symbol(), cc1.ref_signals_per_symbol()), (432, 432));
    assert_eq!(cc0.center_frequency_hz(), 28e9);
    assert_eq!(cc1.center_frequency_hz(), 73e9);
    assert!(cc0.is_primary());
    assert!(!cc1.is_primary());
}

#[test]
fn test_scenario_b_single_carrier() {
    let params = ScenarioParameters {
        use_ca: false,
        band_div: 9,
        ..Default::default()
    };
    let set = build(&params);

    assert_eq!(set.len(), 1);
    assert!(!set.is_aggregated());
    let cc0 = set.primary();
    assert_eq!(cc0.carrier_id(), 0);
    assert_eq!(cc0.chunks_per_rb(), 72);
    assert_eq!(cc0.ref_signals_per_symbol(), 864);
    assert!(set.get(1).is_none());
}

#[test]
fn test_blockage_flags_follow_carriers() {
    let params = ScenarioParameters {
        blockage0: false,
        blockage1: true,
        ..Default::default()
    };
    let blockage = build(&params).blockage_map();
    assert_eq!(blockage.get(&0), Some(&false));
    assert_eq!(blockage.get(&1), Some(&true));
}

#[test]
fn test_diagnostic_line_format() {
    let set = build(&ScenarioParameters {
        use_ca: false,
        ..Default::default()
    });
    let line = set.diagnostics()[0].to_string();
    assert!(line.starts_with("Component Carrier 0 frequency : 28 GHz, bandwidth : "));
    assert!(line.ends_with("blockage : 0, numRefSc: 864, ChunkPerRB: 72"));
}

#[test]
fn test_bandwidth_is_product_of_chunk_parameters() {
    let set = build(&ScenarioParameters {
        use_ca: false,
        ..Default::default()
    });
    let cc0 = set.primary();
    let expected = 13.889e6 * 72.0;
    assert!((cc0.bandwidth_hz() - expected).abs() < 1.0);
}

proptest! {
    #[test]
    fn prop_maps_share_domain(
        use_ca in any::<bool>(),
        band_div in 1u32..64,
        blockage0 in any::<bool>(),
        blockage1 in any::<bool>(),
    ) {
        let params = ScenarioParameters {
            use_ca,
            band_div,
            blockage0,
            blockage1,
            ..Default::default()
        };
        let set = build(&params);
        let carriers = set.carrier_map();
        let blockage = set.blockage_map();

        prop_assert_eq!(carriers.len(), if use_ca { 2 } else { 1 });
        prop_assert!(carriers.keys().eq(blockage.keys()));
        prop_assert_eq!(set.iter().filter(|c| c.is_primary()).count(), 1);
        prop_assert!(carriers[&0].is_primary());
        prop_assert_eq!(blockage[&0], blockage0);
    }

    #[test]
    fn prop_single_carrier_independent_of_ratio(band_div in 1u32..1_000) {
        let params = ScenarioParameters {
            use_ca: false,
            band_div,
            ..Default::default()
        };
        let set = build(&params);
        prop_assert_eq!(set.primary().chunks_per_rb(), 72);
        prop_assert_eq!(set.primary().ref_signals_per_symbol(), 864);
    }
}
