//! Event-driven execution on a single logical clock

mod scheduler;

pub use scheduler::{EventId, Scheduler};
