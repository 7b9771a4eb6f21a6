//! Spectrum allocation across component carriers
//!
//! A carrier operated alone gets a baseline number of frequency chunks per
//! resource block and reference subcarriers per symbol. With carrier
//! aggregation the same budget is split between the primary and secondary
//! carrier by an integer divisor `r`:
//!
//! ```text
//! primary   = floor(baseline * (r - 1) / r)
//! secondary = floor(baseline / r)
//! ```
//!
//! Truncation is not corrected, so the two shares may sum to less than the
//! baseline. [`SpectrumSplit::residual`] reports the loss.

use crate::error::{Result, ScenarioError};
use serde::{Deserialize, Serialize};

/// Chunk and reference-signal counts assigned to one carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrumShare {
    /// Frequency chunks per resource block
    pub chunks: u32,
    /// Reference subcarriers per symbol
    pub ref_signals: u32,
}

impl SpectrumShare {
    pub const fn new(chunks: u32, ref_signals: u32) -> Self {
        Self {
            chunks,
            ref_signals,
        }
    }
}

/// Allocator output: one share, or a primary/secondary pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SpectrumSplit {
    Single(SpectrumShare),
    Aggregated {
        primary: SpectrumShare,
        secondary: SpectrumShare,
    },
}

impl SpectrumSplit {
    pub fn primary(&self) -> SpectrumShare {
        match self {
            SpectrumSplit::Single(share) => *share,
            SpectrumSplit::Aggregated { primary, .. } => *primary,
        }
    }

    pub fn secondary(&self) -> Option<SpectrumShare> {
        match self {
            SpectrumSplit::Single(_) => None,
            SpectrumSplit::Aggregated { secondary, .. } => Some(*secondary),
        }
    }

    /// Units lost to integer truncation, relative to `baseline`
    pub fn residual(&self, baseline: SpectrumShare) -> SpectrumShare {
        match self {
            SpectrumSplit::Single(_) => SpectrumShare::new(0, 0),
            SpectrumSplit::Aggregated { primary, secondary } => SpectrumShare::new(
                baseline.chunks - primary.chunks - secondary.chunks,
                baseline.ref_signals - primary.ref_signals - secondary.ref_signals,
            ),
        }
    }
}

/// Split a baseline spectrum budget between component carriers
///
/// With `aggregation` disabled the baseline passes through unchanged and
/// `split_ratio` is ignored.
///
/// # Errors
/// Returns [`ScenarioError::InvalidParameter`] if aggregation is enabled
/// and `split_ratio` is zero.
///
/// # Example
/// ```
/// use mmwave_ca_scenario_core::spectrum::{allocate, SpectrumShare};
///
/// let split = allocate(SpectrumShare::new(72, 864), 2, true).unwrap();
/// assert_eq!(split.primary(), SpectrumShare::new(36, 432));
/// assert_eq!(split.secondary(), Some(SpectrumShare::new(36, 432)));
/// ```
pub fn allocate(baseline: SpectrumShare, split_ratio: u32, aggregation: bool) -> Result<SpectrumSplit> {
    if !aggregation {
        return Ok(SpectrumSplit::Single(baseline));
    }
    if split_ratio == 0 {
        return Err(ScenarioError::InvalidParameter {
            name: "band_div",
            reason: "split ratio must be positive".to_string(),
        });
    }

    Ok(SpectrumSplit::Aggregated {
        primary: SpectrumShare::new(
            primary_share(baseline.chunks, split_ratio),
            primary_share(baseline.ref_signals, split_ratio),
        ),
        secondary: SpectrumShare::new(
            baseline.chunks / split_ratio,
            baseline.ref_signals / split_ratio,
        ),
    })
}

fn primary_share(baseline: u32, split_ratio: u32) -> u32 {
    // u64 so baseline * (r - 1) cannot overflow
    let numerator = u64::from(baseline) * u64::from(split_ratio - 1);
    (numerator / u64::from(split_ratio)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uneven_split_truncates() {
        let baseline = SpectrumShare::new(72, 864);
        let split = allocate(baseline, 5, true).unwrap();

        assert_eq!(split.primary(), SpectrumShare::new(57, 691));
        assert_eq!(split.secondary(), Some(SpectrumShare::new(14, 172)));
        assert_eq!(split.residual(baseline), SpectrumShare::new(1, 1));
    }

    #[test]
    fn test_ratio_one_starves_primary() {
        let split = allocate(SpectrumShare::new(72, 864), 1, true).unwrap();

        assert_eq!(split.primary(), SpectrumShare::new(0, 0));
        assert_eq!(split.secondary(), Some(SpectrumShare::new(72, 864)));
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        let split = allocate(SpectrumShare::new(u32::MAX, u32::MAX), 3, true).unwrap();
        assert_eq!(split.primary().chunks, 2_863_311_530);
    }

    #[test]
    fn test_single_has_no_residual() {
        let baseline = SpectrumShare::new(72, 864);
        assert_eq!(
            allocate(baseline, 7, false).unwrap().residual(baseline),
            SpectrumShare::new(0, 0)
        );
    }

    #[test]
    fn test_zero_ratio_is_an_error() {
        let baseline = SpectrumShare::new(72, 864);
        assert!(matches!(
            allocate(baseline, 0, true),
            Err(ScenarioError::InvalidParameter { name: "band_div", .. })
        ));
        // ratio is ignored without aggregation
        assert!(allocate(baseline, 0, false).is_ok());
    }
}
