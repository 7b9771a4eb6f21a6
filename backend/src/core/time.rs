//! Simulation time
//!
//! The scenario runs on a single logical clock with nanosecond resolution.
//! Wall-clock time never leaks into the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

const NANOS_PER_SEC: f64 = 1e9;

/// A point (or span) on the simulation clock, in nanoseconds
///
/// Construction and arithmetic saturate at the ends of the `u64` range.
///
/// # Example
/// ```
/// use mmwave_ca_scenario_core::SimTime;
///
/// let start = SimTime::from_millis(10);
/// assert_eq!(start.as_nanos(), 10_000_000);
/// assert!((start.as_secs_f64() - 0.01).abs() < 1e-12);
/// assert!(start > SimTime::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SimTime(u64);

impl SimTime {
    /// Simulation start
    pub const ZERO: SimTime = SimTime(0);

    pub const fn from_nanos(nanos: u64) -> Self {
        SimTime(nanos)
    }

    pub const fn from_micros(micros: u64) -> Self {
        SimTime(micros.saturating_mul(1_000))
    }

    pub const fn from_millis(millis: u64) -> Self {
        SimTime(millis.saturating_mul(1_000_000))
    }

    /// Convert fractional seconds, rounding to the nearest nanosecond
    ///
    /// Negative and non-finite inputs clamp to zero.
    ///
    /// # Example
    /// ```
    /// use mmwave_ca_scenario_core::SimTime;
    ///
    /// assert_eq!(SimTime::from_secs_f64(0.01), SimTime::from_millis(10));
    /// assert_eq!(SimTime::from_secs_f64(-1.0), SimTime::ZERO);
    /// ```
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return SimTime::ZERO;
        }
        SimTime((secs * NANOS_PER_SEC).round() as u64)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC
    }

    pub fn saturating_sub(self, other: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(other.0))
    }
}

impl Add for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(rhs.0))
    }
}

impl Sub for SimTime {
    type Output = SimTime;

    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs_f64())
    }
}
