//! Spectrum split between primary and secondary carriers

use mmwave_ca_scenario_core::spectrum::{allocate, SpectrumShare, SpectrumSplit};
use mmwave_ca_scenario_core::ScenarioError;
use proptest::prelude::*;

const BASELINE: SpectrumShare = SpectrumShare::new(72, 864);

#[test]
fn test_even_split() {
    let split = allocate(BASELINE, 2, true).unwrap();
    assert_eq!(split.primary(), SpectrumShare::new(36, 432));
    assert_eq!(split.secondary(), Some(SpectrumShare::new(36, 432)));
    assert_eq!(split.residual(BASELINE), SpectrumShare::new(0, 0));
}

#[test]
fn test_no_aggregation_passes_baseline_through() {
    assert_eq!(allocate(BASELINE, 7, false).unwrap(), SpectrumSplit::Single(BASELINE));
}

#[test]
fn test_truncation_is_reported() {
    let split = allocate(BASELINE, 5, true).unwrap();
    assert_eq!(split.primary().chunks, 57);
    assert_eq!(split.secondary().map(|s| s.chunks), Some(14));
    assert_eq!(split.residual(BASELINE).chunks, 1);
}

#[test]
fn test_ratio_one_starves_primary() {
    let split = allocate(BASELINE, 1, true).unwrap();
    assert_eq!(split.primary(), SpectrumShare::new(0, 0));
    assert_eq!(split.secondary(), Some(BASELINE));
}

#[test]
fn test_zero_ratio_with_aggregation_is_rejected() {
    let err = allocate(BASELINE, 0, true).unwrap_err();
    assert!(matches!(err, ScenarioError::InvalidParameter { name: "band_div", .. }));
}

proptest! {
    #[test]
    fn prop_split_never_exceeds_baseline(
        chunks in 0u32..100_000,
        refs in 0u32..100_000,
        ratio in 2u32..1_000,
    ) {
        let baseline = SpectrumShare::new(chunks, refs);
        let split = allocate(baseline, ratio, true).unwrap();
        let primary = split.primary();
        let secondary = split.secondary().unwrap();

        prop_assert!(primary.chunks + secondary.chunks <= chunks);
        prop_assert!(primary.ref_signals + secondary.ref_signals <= refs);
        prop_assert!(primary.chunks >= secondary.chunks);
        prop_assert!(primary.ref_signals >= secondary.ref_signals);
    }

    #[test]
    fn prop_single_carrier_ignores_ratio(ratio in 0u32..1_000) {
        prop_assert_eq!(allocate(BASELINE, ratio, false).unwrap().primary(), BASELINE);
    }

    #[test]
    fn prop_large_baseline_does_not_overflow(chunks in (u32::MAX - 1000)..u32::MAX, ratio in 2u32..10) {
        let split = allocate(SpectrumShare::new(chunks, 1), ratio, true).unwrap();
        prop_assert!(split.primary().chunks >= split.secondary().unwrap().chunks);
    }
}
