//! Mobility models
//!
//! Base stations never move. Terminals perform a bounded 2-D random walk:
//! each leg draws a heading uniformly in `[0, 2π)` and a speed uniformly in
//! the configured range, moves in a straight line for one leg interval, and
//! bounces off the bounding rectangle. Height is preserved.

use crate::core::time::SimTime;
use crate::models::node::{Rectangle, Vector3};
use crate::rng::RngManager;
use std::f64::consts::TAU;

#[derive(Debug, Clone, PartialEq)]
pub enum MobilityModel {
    ConstantPosition { position: Vector3 },
    RandomWalk2d(RandomWalk2d),
}

impl MobilityModel {
    pub fn position(&self) -> Vector3 {
        match self {
            MobilityModel::ConstantPosition { position } => *position,
            MobilityModel::RandomWalk2d(walk) => walk.position(),
        }
    }

    /// Model name as reported in the event log
    pub fn name(&self) -> &'static str {
        match self {
            MobilityModel::ConstantPosition { .. } => "ConstantPosition",
            MobilityModel::RandomWalk2d(_) => "RandomWalk2d",
        }
    }
}

/// Bounded random walk on the ground plane
#[derive(Debug, Clone, PartialEq)]
pub struct RandomWalk2d {
    position: Vector3,
    bounds: Rectangle,
    /// (vx, vy) in m/s for the current leg
    velocity: (f64, f64),
    speed_range: (f64, f64),
    leg_interval: SimTime,
}

impl RandomWalk2d {
    /// Create a walk starting at `position`, which is clamped into `bounds`
    pub fn new(
        position: Vector3,
        bounds: Rectangle,
        speed_range: (f64, f64),
        leg_interval: SimTime,
    ) -> Self {
        let position = Vector3::new(
            position.x.clamp(bounds.x_min, bounds.x_max),
            position.y.clamp(bounds.y_min, bounds.y_max),
            position.z,
        );
        Self {
            position,
            bounds,
            velocity: (0.0, 0.0),
            speed_range,
            leg_interval,
        }
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn leg_interval(&self) -> SimTime {
        self.leg_interval
    }

    pub fn speed(&self) -> f64 {
        (self.velocity.0 * self.velocity.0 + self.velocity.1 * self.velocity.1).sqrt()
    }

    /// Draw heading and speed for the next leg
    pub fn start_leg(&mut self, rng: &mut RngManager) {
        let heading = rng.uniform(0.0, TAU);
        let speed = rng.uniform(self.speed_range.0, self.speed_range.1);
        self.velocity = (speed * heading.cos(), speed * heading.sin());
    }

    /// Move along the current leg for one leg interval, reflecting at edges
    pub fn finish_leg(&mut self) {
        let dt = self.leg_interval.as_secs_f64();
        let (x, vx) = reflect(
            self.position.x + self.velocity.0 * dt,
            self.velocity.0,
            self.bounds.x_min,
            self.bounds.x_max,
        );
        let (y, vy) = reflect(
            self.position.y + self.velocity.1 * dt,
            self.velocity.1,
            self.bounds.y_min,
            self.bounds.y_max,
        );
        self.position = Vector3::new(x, y, self.position.z);
        self.velocity = (vx, vy);
    }
}

/// Fold a coordinate back into [min, max], flipping velocity per bounce
///
/// The unfolded path is periodic with period `2 * (max - min)`; positions in
/// the second half of a period are mirrored and travel the other way.
fn reflect(coord: f64, velocity: f64, min: f64, max: f64) -> (f64, f64) {
    if (min..=max).contains(&coord) {
        return (coord, velocity);
    }
    let width = max - min;
    if !coord.is_finite() || width <= 0.0 {
        let edge = if coord > max { max } else { min };
        return (edge, -velocity);
    }

    let period = 2.0 * width;
    let offset = (coord - min).rem_euclid(period);
    if offset > width {
        ((min + period - offset).clamp(min, max), -velocity)
    } else {
        ((min + offset).clamp(min, max), velocity)
    }
}

/// Sample a point uniformly over a disc of radius `rho` centred on `center`
///
/// Uses `r = rho·sqrt(U1)`, `θ = 2π·U2` so that area density is uniform.
pub fn sample_uniform_disc(rng: &mut RngManager, center: (f64, f64), rho: f64, z: f64) -> Vector3 {
    let r = rho * rng.next_f64().sqrt();
    let theta = TAU * rng.next_f64();
    Vector3::new(center.0 + r * theta.cos(), center.1 + r * theta.sin(), z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_bounces_back_inside() {
        let (x, v) = reflect(205.0, 3.0, -200.0, 200.0);
        assert_eq!(x, 195.0);
        assert_eq!(v, -3.0);
    }

    #[test]
    fn test_reflect_multiple_bounces() {
        // 2.5 widths past the max edge of a 10 m wide box
        let (x, v) = reflect(35.0, 1.0, 0.0, 10.0);
        assert!((0.0..=10.0).contains(&x));
        assert_eq!(x, 5.0);
        assert_eq!(v, -1.0);
    }

    #[test]
    fn test_reflect_below_min() {
        let (x, v) = reflect(-205.0, -3.0, -200.0, 200.0);
        assert_eq!(x, -195.0);
        assert_eq!(v, 3.0);
    }

    #[test]
    fn test_reflect_even_fold_keeps_heading() {
        // one full period past min lands at the same offset
        let (x, v) = reflect(23.0, 1.0, 0.0, 10.0);
        assert_eq!(x, 3.0);
        assert_eq!(v, 1.0);
    }

    #[test]
    fn test_reflect_huge_displacement_stays_in_bounds() {
        for coord in [1e20, -1e20, 1e300, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let (x, v) = reflect(coord, 1e20, -200.0, 200.0);
            assert!((-200.0..=200.0).contains(&x), "{} folded to {}", coord, x);
            assert_eq!(v.abs(), 1e20);
        }
    }

    #[test]
    fn test_walk_keeps_height() {
        let mut rng = RngManager::new(5);
        let mut walk = RandomWalk2d::new(
            Vector3::new(0.0, 0.0, 1.5),
            Rectangle::new(-10.0, 10.0, -10.0, 10.0),
            (2.0, 4.0),
            SimTime::from_millis(1000),
        );
        for _ in 0..20 {
            walk.start_leg(&mut rng);
            walk.finish_leg();
            assert_eq!(walk.position().z, 1.5);
        }
    }

    #[test]
    fn test_disc_sample_within_radius() {
        let mut rng = RngManager::new(99);
        for _ in 0..500 {
            let p = sample_uniform_disc(&mut rng, (0.0, 0.0), 150.0, 1.5);
            assert!((p.x * p.x + p.y * p.y).sqrt() <= 150.0 + 1e-9);
        }
    }
}
