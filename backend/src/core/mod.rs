//! Simulation clock primitives

pub mod time;
