//! Discrete-event scheduler
//!
//! A single logical clock and a priority queue of pending actions keyed by
//! `(time, sequence)`. Actions scheduled for the same instant fire in the
//! order they were scheduled. Nothing runs concurrently: the driver pops one
//! action, handles it (possibly scheduling more), and pops the next.

use crate::core::time::SimTime;
use crate::error::{Result, ScenarioError};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Handle of a scheduled action, unique for the scheduler's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

struct Pending<A> {
    at: SimTime,
    seq: u64,
    action: A,
}

impl<A> PartialEq for Pending<A> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<A> Eq for Pending<A> {}

impl<A> PartialOrd for Pending<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Pending<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// Deterministic event queue over actions of type `A`
///
/// # Example
/// ```
/// use mmwave_ca_scenario_core::sim::Scheduler;
/// use mmwave_ca_scenario_core::SimTime;
///
/// let mut sched = Scheduler::new();
/// sched.schedule(SimTime::from_millis(5), "b").unwrap();
/// sched.schedule(SimTime::from_millis(1), "a").unwrap();
///
/// let stop = SimTime::from_millis(10);
/// assert_eq!(sched.pop_before(stop), Some((SimTime::from_millis(1), "a")));
/// assert_eq!(sched.pop_before(stop), Some((SimTime::from_millis(5), "b")));
/// assert_eq!(sched.pop_before(stop), None);
/// ```
pub struct Scheduler<A> {
    now: SimTime,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Pending<A>>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            now: SimTime::ZERO,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current simulation time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule `action` at absolute time `at`
    ///
    /// Scheduling in the past is an error; scheduling at `now` is allowed
    /// and runs after everything already queued for `now`.
    pub fn schedule(&mut self, at: SimTime, action: A) -> Result<EventId> {
        if at < self.now {
            return Err(ScenarioError::PastEvent {
                at_ns: at.as_nanos(),
                now_ns: self.now.as_nanos(),
            });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Pending { at, seq, action }));
        Ok(EventId(seq))
    }

    /// Schedule `action` after a delay relative to now
    pub fn schedule_in(&mut self, delay: SimTime, action: A) -> EventId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Pending {
            at: self.now + delay,
            seq,
            action,
        }));
        EventId(seq)
    }

    /// Pop the next action that fires strictly before `stop`
    ///
    /// Advances the clock to the action's time. Actions at or after `stop`
    /// stay queued and the clock does not move.
    pub fn pop_before(&mut self, stop: SimTime) -> Option<(SimTime, A)> {
        match self.queue.peek() {
            Some(Reverse(next)) if next.at < stop => {}
            _ => return None,
        }
        let Reverse(pending) = self.queue.pop()?;
        self.now = pending.at;
        Some((pending.at, pending.action))
    }

    /// Move the clock forward without running anything (used at stop)
    pub fn advance_to(&mut self, at: SimTime) {
        if at > self.now {
            self.now = at;
        }
    }

    /// Number of queued actions
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queued actions in firing order, without consuming them
    pub fn pending_actions(&self) -> Vec<(SimTime, &A)> {
        let mut items: Vec<&Pending<A>> = self.queue.iter().map(|Reverse(p)| p).collect();
        items.sort_by(|a, b| a.cmp(b));
        items.into_iter().map(|p| (p.at, &p.action)).collect()
    }
}
