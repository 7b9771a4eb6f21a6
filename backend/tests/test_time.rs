//! Simulation clock and scheduler ordering

use mmwave_ca_scenario_core::sim::Scheduler;
use mmwave_ca_scenario_core::{ScenarioError, SimTime};

#[test]
fn test_unit_conversions_agree() {
    assert_eq!(SimTime::from_micros(1_000), SimTime::from_millis(1));
    assert_eq!(SimTime::from_secs_f64(5.0), SimTime::from_millis(5_000));
    assert_eq!(SimTime::from_nanos(1).as_nanos(), 1);
    assert_eq!(SimTime::from_millis(10) + SimTime::from_millis(90), SimTime::from_millis(100));
    assert_eq!(SimTime::from_millis(1).saturating_sub(SimTime::from_millis(2)), SimTime::ZERO);
}

#[test]
fn test_ties_fire_in_scheduling_order() {
    let mut sched = Scheduler::new();
    let t = SimTime::from_millis(10);
    sched.schedule(t, "downlink").unwrap();
    sched.schedule(SimTime::from_millis(1), "walk").unwrap();
    sched.schedule(t, "uplink").unwrap();

    let stop = SimTime::from_secs_f64(1.0);
    let fired: Vec<&str> = std::iter::from_fn(|| sched.pop_before(stop)).map(|(_, a)| a).collect();
    assert_eq!(fired, vec!["walk", "downlink", "uplink"]);
    assert_eq!(sched.now(), t);
}

#[test]
fn test_clock_never_runs_backwards() {
    let mut sched = Scheduler::new();
    for ms in [7u64, 3, 9, 1, 5] {
        sched.schedule(SimTime::from_millis(ms), ms).unwrap();
    }

    let mut last = SimTime::ZERO;
    while let Some((at, _)) = sched.pop_before(SimTime::from_millis(100)) {
        assert!(at >= last);
        last = at;
    }
    assert!(matches!(
        sched.schedule(SimTime::from_millis(2), 0),
        Err(ScenarioError::PastEvent { .. })
    ));
}

#[test]
fn test_stop_leaves_later_actions_queued() {
    let mut sched = Scheduler::new();
    sched.schedule(SimTime::from_millis(1), 'a').unwrap();
    sched.schedule(SimTime::from_millis(5), 'b').unwrap();

    let stop = SimTime::from_millis(5);
    assert_eq!(sched.pop_before(stop), Some((SimTime::from_millis(1), 'a')));
    assert_eq!(sched.pop_before(stop), None);
    sched.advance_to(stop);
    assert_eq!(sched.now(), stop);
    assert_eq!(sched.pending(), 1);
}
