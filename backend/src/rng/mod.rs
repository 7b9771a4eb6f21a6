//! Deterministic random number generation
//!
//! Uses xorshift64* seeded from the (seed, run) pair.
//! All randomness in a scenario run (terminal placement, random walk) goes
//! through this module.

mod xorshift;

pub use xorshift::RngManager;
