//! Damped spring smoothing.
//!
//! A [`SpringSmoother`] lags a raw target into a smoothed value using the
//! closed-form solution of a damped harmonic oscillator. The target is held
//! constant across each step, which makes the result exact for that step: it
//! is deterministic and stays stable for steps from well under a millisecond
//! to several seconds.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Displacement below which a slow spring snaps onto its target.
const REST_DELTA: f32 = 1e-3;
/// Velocity (units per second) below which a close spring snaps onto its target.
const REST_SPEED: f32 = 1e-2;
/// Damping ratios this close to 1 use the critically damped branch.
const CRITICAL_EPSILON: f32 = 1e-4;

/// Physical parameters of a spring.
///
/// `damping` is the viscous coefficient, not the ratio; the ratio is
/// `damping / (2·√(stiffness·mass))`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringParams {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 20.0,
            mass: 1.0,
        }
    }
}

impl SpringParams {
    pub const fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
        }
    }

    /// Parameters with exactly critical damping.
    pub fn critical(stiffness: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping: 2.0 * (stiffness * mass).sqrt(),
            mass,
        }
    }

    /// Undamped angular frequency, radians per second.
    pub fn natural_frequency(&self) -> f32 {
        (self.stiffness / self.mass).sqrt()
    }

    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    pub fn validate(&self, signal: &'static str) -> Result<(), ConfigError> {
        let ok = self.stiffness.is_finite()
            && self.damping.is_finite()
            && self.mass.is_finite()
            && self.stiffness > 0.0
            && self.mass > 0.0
            && self.damping >= 0.0;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidSpring {
                signal,
                stiffness: self.stiffness,
                damping: self.damping,
                mass: self.mass,
            })
        }
    }
}

/// Stateful spring filter for one scalar signal.
#[derive(Clone, Debug)]
pub struct SpringSmoother {
    params: SpringParams,
    value: f32,
    velocity: f32,
    target: f32,
    initialised: bool,
}

impl SpringSmoother {
    /// A smoother that starts at rest on the first target it is given.
    pub fn new(params: SpringParams) -> Self {
        Self {
            params,
            value: 0.0,
            velocity: 0.0,
            target: 0.0,
            initialised: false,
        }
    }

    /// A smoother already at rest on `value`.
    pub fn at_rest(params: SpringParams, value: f32) -> Self {
        Self {
            params,
            value,
            velocity: 0.0,
            target: value,
            initialised: true,
        }
    }

    pub fn params(&self) -> SpringParams {
        self.params
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_at_rest(&self) -> bool {
        self.velocity == 0.0 && self.value == self.target
    }

    /// Jump to `value` with zero velocity.
    pub fn snap_to(&mut self, value: f32) {
        self.value = value;
        self.target = value;
        self.velocity = 0.0;
        self.initialised = true;
    }

    /// Translate the value by `delta`, keeping velocity and target. Before the
    /// first update this has no effect, since that update snaps anyway.
    pub fn shift(&mut self, delta: f32) {
        if self.initialised && delta.is_finite() {
            self.value += delta;
        }
    }

    /// Move towards `target` for `elapsed_ms` and return the smoothed value.
    ///
    /// A non-positive step leaves the output untouched.
    pub fn update(&mut self, target: f32, elapsed_ms: f32) -> f32 {
        if !target.is_finite() {
            return self.value;
        }
        if !self.initialised {
            self.snap_to(target);
            return self.value;
        }
        self.target = target;
        if !(elapsed_ms > 0.0) || !elapsed_ms.is_finite() {
            return self.value;
        }

        let t = elapsed_ms / 1000.0;
        let (x, v) = oscillate(&self.params, self.value - target, self.velocity, t);

        if x.abs() < REST_DELTA && v.abs() < REST_SPEED {
            self.value = target;
            self.velocity = 0.0;
        } else {
            self.value = target + x;
            self.velocity = v;
        }
        self.value
    }
}

/// Displacement and velocity after `t` seconds, starting from displacement
/// `x0` and velocity `v0` relative to a fixed target.
fn oscillate(params: &SpringParams, x0: f32, v0: f32, t: f32) -> (f32, f32) {
    let omega = params.natural_frequency();
    let zeta = params.damping_ratio();

    if (zeta - 1.0).abs() < CRITICAL_EPSILON {
        // x(t) = (c1 + c2·t)·e^(−ωt)
        let decay = (-omega * t).exp();
        let c1 = x0;
        let c2 = v0 + omega * x0;
        let x = (c1 + c2 * t) * decay;
        let v = (c2 - omega * (c1 + c2 * t)) * decay;
        (x, v)
    } else if zeta < 1.0 {
        let omega_d = omega * (1.0 - zeta * zeta).sqrt();
        let decay = (-zeta * omega * t).exp();
        let (sin, cos) = (omega_d * t).sin_cos();
        let x = decay * (x0 * cos + (v0 + zeta * omega * x0) / omega_d * sin);
        let v = decay * (v0 * cos - (omega * omega * x0 + zeta * omega * v0) / omega_d * sin);
        (x, v)
    } else {
        let root = (zeta * zeta - 1.0).sqrt();
        let r1 = -omega * (zeta - root);
        let r2 = -omega * (zeta + root);
        let a = (v0 - r2 * x0) / (r1 - r2);
        let b = x0 - a;
        let e1 = (r1 * t).exp();
        let e2 = (r2 * t).exp();
        (a * e1 + b * e2, r1 * a * e1 + r2 * b * e2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(params: SpringParams) -> SpringSmoother {
        let mut spring = SpringSmoother::at_rest(params, 0.0);
        for _ in 0..600 {
            spring.update(1.0, 1000.0 / 60.0);
        }
        spring
    }

    #[test]
    fn test_first_update_snaps_to_target() {
        let mut spring = SpringSmoother::new(SpringParams::default());
        assert_eq!(spring.update(42.0, 16.0), 42.0);
        assert!(spring.is_at_rest());
    }

    #[test]
    fn test_converges_in_every_regime() {
        for params in [
            SpringParams::new(300.0, 12.0, 1.0),   // underdamped
            SpringParams::critical(170.0, 1.0),    // critical
            SpringParams::new(100.0, 60.0, 1.0),   // overdamped
        ] {
            let spring = settle(params);
            assert!(
                (spring.value() - 1.0).abs() < 1e-3,
                "{:?} settled at {}",
                params,
                spring.value()
            );
        }
    }

    #[test]
    fn test_near_critical_does_not_overshoot() {
        let mut spring = SpringSmoother::at_rest(SpringParams::critical(200.0, 1.0), 0.0);
        for _ in 0..240 {
            let v = spring.update(1.0, 1000.0 / 60.0);
            assert!(v <= 1.0 + 1e-5, "overshoot to {}", v);
        }
    }

    #[test]
    fn test_zero_elapsed_is_a_no_op() {
        let mut spring = SpringSmoother::at_rest(SpringParams::default(), 0.0);
        spring.update(10.0, 16.0);
        let value = spring.value();
        let velocity = spring.velocity();
        assert_eq!(spring.update(10.0, 0.0), value);
        assert_eq!(spring.velocity(), velocity);
    }

    #[test]
    fn test_shift_keeps_motion() {
        let mut spring = SpringSmoother::new(SpringParams::default());
        spring.shift(50.0);
        assert_eq!(spring.update(3.0, 16.0), 3.0);

        spring.update(10.0, 16.0);
        let (value, velocity) = (spring.value(), spring.velocity());
        spring.shift(-4.0);
        assert_eq!(spring.value(), value - 4.0);
        assert_eq!(spring.velocity(), velocity);
        assert_eq!(spring.target(), 10.0);
    }

    #[test]
    fn test_long_step_is_stable() {
        let mut spring = SpringSmoother::at_rest(SpringParams::new(400.0, 10.0, 1.0), 0.0);
        let v = spring.update(100.0, 5_000.0);
        assert!(v.is_finite());
        assert!((v - 100.0).abs() < 1e-2);

        let mut tiny = SpringSmoother::at_rest(SpringParams::default(), 0.0);
        let v = tiny.update(100.0, 0.01);
        assert!(v.is_finite());
        assert!(v > -1e-3 && v < 1.0);
    }

    #[test]
    fn test_identical_springs_are_bit_identical() {
        let params = SpringParams::new(250.0, 18.0, 1.2);
        let mut a = SpringSmoother::at_rest(params, 3.0);
        let mut b = SpringSmoother::at_rest(params, 3.0);
        for i in 0..500 {
            let target = (i as f32 * 0.37).sin() * 200.0;
            let dt = 5.0 + (i % 7) as f32 * 3.3;
            assert_eq!(a.update(target, dt).to_bits(), b.update(target, dt).to_bits());
        }
    }

    #[test]
    fn test_validate_rejects_bad_params() {
        assert!(SpringParams::default().validate("offset").is_ok());
        assert!(SpringParams::new(0.0, 1.0, 1.0).validate("scale").is_err());
        assert!(SpringParams::new(1.0, -1.0, 1.0).validate("scale").is_err());
        assert!(SpringParams::new(1.0, 1.0, f32::NAN).validate("scale").is_err());
    }
}
