//! Virtual scroll offset accumulation.
//!
//! The driver integrates a constant velocity against wall-clock time, so the
//! apparent speed does not depend on how often frames are delivered. The
//! offset grows without bound and is kept in `f64`: an `f32` accumulator loses
//! sub-pixel increments after a few hours of scrolling.

use serde::{Deserialize, Serialize};

/// Duration of one frame at 60 fps, the unit velocities are expressed in.
pub const DEFAULT_REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;

/// Default upper bound on a single frame's elapsed time.
pub const DEFAULT_MAX_ELAPSED_MS: f32 = 100.0;

/// What to do with an abnormally long gap between frames (e.g. a tab that was
/// in the background).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum ElapsedPolicy {
    /// Treat any gap longer than `max_ms` as `max_ms`. The strip resumes where
    /// it was instead of jumping ahead.
    #[serde(rename_all = "camelCase")]
    Clamp { max_ms: f32 },
    /// Apply the full gap in one frame.
    Allow,
}

impl Default for ElapsedPolicy {
    fn default() -> Self {
        Self::Clamp {
            max_ms: DEFAULT_MAX_ELAPSED_MS,
        }
    }
}

impl ElapsedPolicy {
    /// Sanitise a host-supplied elapsed time. Negative and non-finite values
    /// become 0.
    pub fn apply(&self, elapsed_ms: f32) -> f32 {
        if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
            return 0.0;
        }
        match *self {
            Self::Clamp { max_ms } => elapsed_ms.min(max_ms),
            Self::Allow => elapsed_ms,
        }
    }
}

/// Raw and smoothed scroll offsets of one carousel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollState {
    pub raw_offset: f64,
    pub smoothed_offset: f64,
}

/// Accumulates the raw offset, `velocity` pixels per reference frame.
#[derive(Clone, Debug)]
pub struct ScrollDriver {
    velocity: f32,
    reference_frame_ms: f32,
    policy: ElapsedPolicy,
    raw_offset: f64,
}

impl ScrollDriver {
    /// Parameters are validated by the owning carousel's config.
    pub fn new(velocity: f32, reference_frame_ms: f32, policy: ElapsedPolicy) -> Self {
        Self {
            velocity,
            reference_frame_ms,
            policy,
            raw_offset: 0.0,
        }
    }

    pub fn raw_offset(&self) -> f64 {
        self.raw_offset
    }

    /// Overwrite the offset. The next `advance` continues from here.
    pub fn set_raw_offset(&mut self, offset: f64) {
        if offset.is_finite() {
            self.raw_offset = offset;
        }
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        if velocity.is_finite() {
            self.velocity = velocity;
        }
    }

    /// Sanitised elapsed time without advancing.
    pub fn effective_elapsed(&self, elapsed_ms: f32) -> f32 {
        self.policy.apply(elapsed_ms)
    }

    /// Advance by one frame and return the elapsed time that was applied.
    pub fn advance(&mut self, elapsed_ms: f32) -> f32 {
        let elapsed = self.effective_elapsed(elapsed_ms);
        if elapsed > 0.0 {
            self.raw_offset +=
                f64::from(self.velocity) * f64::from(elapsed) / f64::from(self.reference_frame_ms);
        }
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_frame_rate_independent() {
        let mut at_60 = ScrollDriver::new(1.0, DEFAULT_REFERENCE_FRAME_MS, ElapsedPolicy::Allow);
        let mut at_30 = ScrollDriver::new(1.0, DEFAULT_REFERENCE_FRAME_MS, ElapsedPolicy::Allow);
        for _ in 0..60 {
            at_60.advance(1000.0 / 60.0);
        }
        for _ in 0..30 {
            at_30.advance(1000.0 / 30.0);
        }
        assert!((at_60.raw_offset() - 60.0).abs() < 0.01);
        assert!((at_30.raw_offset() - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_zero_and_invalid_elapsed() {
        let mut driver = ScrollDriver::new(2.0, 10.0, ElapsedPolicy::default());
        driver.set_raw_offset(5.0);
        assert_eq!(driver.advance(0.0), 0.0);
        assert_eq!(driver.advance(-16.0), 0.0);
        assert_eq!(driver.advance(f32::NAN), 0.0);
        assert_eq!(driver.raw_offset(), 5.0);
    }

    #[test]
    fn test_clamp_policy_limits_long_gaps() {
        let mut driver = ScrollDriver::new(1.0, 10.0, ElapsedPolicy::Clamp { max_ms: 100.0 });
        assert_eq!(driver.advance(5_000.0), 100.0);
        assert!((driver.raw_offset() - 10.0).abs() < 1e-4);

        let mut driver = ScrollDriver::new(1.0, 10.0, ElapsedPolicy::Allow);
        assert_eq!(driver.advance(5_000.0), 5_000.0);
        assert!((driver.raw_offset() - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_external_overwrite_is_respected() {
        let mut driver = ScrollDriver::new(-1.0, 10.0, ElapsedPolicy::Allow);
        driver.advance(100.0);
        driver.set_raw_offset(1_000.0);
        driver.advance(10.0);
        assert!((driver.raw_offset() - 999.0).abs() < 1e-4);
    }

    #[test]
    fn test_far_offsets_keep_full_speed() {
        let far = -(2.0_f64.powi(23));
        let mut driver = ScrollDriver::new(-0.45, DEFAULT_REFERENCE_FRAME_MS, ElapsedPolicy::default());
        driver.set_raw_offset(far);
        for _ in 0..600 {
            driver.advance(1000.0 / 60.0);
        }
        assert!((driver.raw_offset() - far + 270.0).abs() < 1e-3);

        let mut driver = ScrollDriver::new(-0.45, DEFAULT_REFERENCE_FRAME_MS, ElapsedPolicy::default());
        driver.set_raw_offset(far);
        for _ in 0..144 {
            driver.advance(1000.0 / 144.0);
        }
        assert!((driver.raw_offset() - far + 27.0).abs() < 1e-3);
    }

    #[test]
    fn test_policy_deserialize() {
        let clamp: ElapsedPolicy = serde_json::from_str(r#"{"mode":"clamp","maxMs":50}"#).unwrap();
        assert_eq!(clamp, ElapsedPolicy::Clamp { max_ms: 50.0 });
        let allow: ElapsedPolicy = serde_json::from_str(r#"{"mode":"allow"}"#).unwrap();
        assert_eq!(allow, ElapsedPolicy::Allow);
    }
}
