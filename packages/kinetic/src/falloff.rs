//! Distance-from-centre falloff curves.
//!
//! Each visual property is a piecewise-linear function of an item's signed
//! distance from the viewport centre. Together they produce the depth-of-field
//! look: centred cards are large, opaque and in full colour; peripheral cards
//! shrink, fade and desaturate.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Piecewise-linear curve over sorted `(input, output)` control points.
///
/// Between points the output is interpolated linearly; outside the outermost
/// points it is clamped to the nearest end value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FalloffCurve {
    points: Vec<(f32, f32)>,
}

impl FalloffCurve {
    /// Build and validate a curve.
    pub fn new(name: &'static str, points: Vec<(f32, f32)>) -> Result<Self, ConfigError> {
        let curve = Self { points };
        curve.validate(name)?;
        Ok(curve)
    }

    /// Unvalidated curve; checked later by [`FalloffCurve::validate`].
    pub fn from_points(points: Vec<(f32, f32)>) -> Self {
        Self { points }
    }

    /// Curve `peak` at the centre, falling linearly to `floor` at `±radius`.
    pub fn symmetric(radius: f32, peak: f32, floor: f32) -> Self {
        Self {
            points: vec![(-radius, floor), (0.0, peak), (radius, floor)],
        }
    }

    /// Constant curve.
    pub fn flat(value: f32) -> Self {
        Self {
            points: vec![(0.0, value)],
        }
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.points.is_empty() {
            return Err(ConfigError::EmptyCurve(name));
        }
        for (position, &(input, output)) in self.points.iter().enumerate() {
            if !input.is_finite() || !output.is_finite() {
                return Err(ConfigError::NonFiniteControlPoint {
                    curve: name,
                    position,
                });
            }
        }
        for (position, pair) in self.points.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(ConfigError::UnorderedControlPoints {
                    curve: name,
                    position: position + 1,
                });
            }
        }
        Ok(())
    }

    /// Evaluate at `x`. The curve must have been validated.
    pub fn sample(&self, x: f32) -> f32 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        // First control point strictly to the right of x; x > first.0 so idx >= 1.
        let idx = self.points.partition_point(|&(input, _)| input <= x);
        let (x0, y0) = self.points[idx - 1];
        let (x1, y1) = self.points[idx];
        let t = (x - x0) / (x1 - x0);
        y0 + (y1 - y0) * t
    }
}

/// Stacking order as a function of distance from the centre.
///
/// Items within `flat_radius` share the `peak` layer; beyond it every further
/// `step` pixels drops one layer, never below 0. A carousel raises `peak` to
/// its ring size (see [`ZOrderRule::spanning`]) so distinct distances never
/// share the floor layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZOrderRule {
    pub peak: i32,
    pub flat_radius: f32,
    pub step: f32,
}

impl Default for ZOrderRule {
    fn default() -> Self {
        Self {
            peak: 100,
            flat_radius: 0.0,
            step: 10.0,
        }
    }
}

impl ZOrderRule {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flat_radius.is_finite() && self.flat_radius >= 0.0 && self.step.is_finite() && self.step > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidZOrder {
                flat_radius: self.flat_radius,
                step: self.step,
            })
        }
    }

    /// This rule with `peak` raised, if needed, so every position within
    /// `half_extent` of the centre stays above the floor.
    pub fn spanning(&self, half_extent: f32) -> Self {
        let beyond = (half_extent - self.flat_radius).max(0.0);
        let needed = (beyond / self.step).ceil() as i32 + 1;
        Self {
            peak: self.peak.max(needed),
            ..*self
        }
    }

    pub fn z_order(&self, x: f32) -> i32 {
        let beyond = (x.abs() - self.flat_radius).max(0.0);
        let drop = (beyond / self.step).ceil();
        let drop = if drop > self.peak as f32 { self.peak } else { drop as i32 };
        (self.peak - drop).max(0)
    }
}

/// Unsmoothed visual targets for one item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualTargets {
    pub scale: f32,
    pub opacity: f32,
    pub brightness: f32,
    pub grayscale: f32,
    pub z_order: i32,
}

/// The full set of falloff curves for one carousel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualMapper {
    pub scale: FalloffCurve,
    pub opacity: FalloffCurve,
    pub brightness: FalloffCurve,
    pub grayscale: FalloffCurve,
    #[serde(default)]
    pub z_order: ZOrderRule,
}

impl Default for VisualMapper {
    fn default() -> Self {
        Self {
            scale: FalloffCurve::symmetric(600.0, 1.05, 0.85),
            opacity: FalloffCurve::symmetric(1000.0, 1.0, 0.3),
            brightness: FalloffCurve::symmetric(350.0, 1.0, 0.6),
            grayscale: FalloffCurve::symmetric(350.0, 0.0, 1.0),
            z_order: ZOrderRule::default(),
        }
    }
}

impl VisualMapper {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scale.validate("scale")?;
        self.opacity.validate("opacity")?;
        self.brightness.validate("brightness")?;
        self.grayscale.validate("grayscale")?;
        self.z_order.validate()
    }

    pub fn map(&self, resolved_x: f32) -> VisualTargets {
        VisualTargets {
            scale: self.scale.sample(resolved_x),
            opacity: self.opacity.sample(resolved_x),
            brightness: self.brightness.sample(resolved_x),
            grayscale: self.grayscale.sample(resolved_x),
            z_order: self.z_order.z_order(resolved_x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_interpolates_and_clamps() {
        let curve = FalloffCurve::new("scale", vec![(-600.0, 0.85), (0.0, 1.05), (600.0, 0.85)]).unwrap();
        assert!((curve.sample(0.0) - 1.05).abs() < 1e-6);
        assert!((curve.sample(300.0) - 0.95).abs() < 1e-5);
        assert!((curve.sample(-300.0) - 0.95).abs() < 1e-5);
        assert_eq!(curve.sample(5_000.0), 0.85);
        assert_eq!(curve.sample(-5_000.0), 0.85);
    }

    #[test]
    fn test_sample_is_continuous_at_control_points() {
        let curve = FalloffCurve::new(
            "opacity",
            vec![(-1000.0, 0.2), (-400.0, 0.7), (0.0, 1.0), (400.0, 0.7), (1000.0, 0.2)],
        )
        .unwrap();
        for &(input, output) in curve.points() {
            assert!((curve.sample(input) - output).abs() < 1e-6);
            assert!((curve.sample(input - 1e-2) - output).abs() < 1e-3);
            assert!((curve.sample(input + 1e-2) - output).abs() < 1e-3);
        }
    }

    #[test]
    fn test_single_point_curve() {
        let curve = FalloffCurve::flat(0.5);
        assert_eq!(curve.sample(-10.0), 0.5);
        assert_eq!(curve.sample(10.0), 0.5);
    }

    #[test]
    fn test_curve_validation() {
        assert_eq!(FalloffCurve::new("scale", vec![]), Err(ConfigError::EmptyCurve("scale")));
        assert_eq!(
            FalloffCurve::new("scale", vec![(0.0, 1.0), (0.0, 2.0)]),
            Err(ConfigError::UnorderedControlPoints {
                curve: "scale",
                position: 1
            })
        );
        assert!(FalloffCurve::new("scale", vec![(0.0, f32::NAN)]).is_err());
    }

    #[test]
    fn test_z_order_decreases_with_distance() {
        let rule = ZOrderRule {
            peak: 50,
            flat_radius: 100.0,
            step: 20.0,
        };
        assert_eq!(rule.z_order(0.0), 50);
        assert_eq!(rule.z_order(-100.0), 50);
        assert_eq!(rule.z_order(101.0), 49);
        assert_eq!(rule.z_order(-141.0), 47);
        assert_eq!(rule.z_order(1e9), 0);
        let mut last = rule.z_order(0.0);
        for i in 0..200 {
            let z = rule.z_order(i as f32 * 7.5);
            assert!(z <= last);
            last = z;
        }
    }

    #[test]
    fn test_spanning_lifts_peak_for_wide_rings() {
        let rule = ZOrderRule {
            peak: 30,
            flat_radius: 40.0,
            step: 50.0,
        };
        assert_eq!(rule.spanning(465.0), rule);
        let wide = rule.spanning(2480.0);
        assert_eq!(wide.peak, 50);
        assert_eq!(wide.z_order(2480.0), 1);
        assert!(wide.z_order(2015.0) > wide.z_order(2325.0));
        assert_eq!(rule.z_order(2015.0), rule.z_order(2325.0));
    }

    #[test]
    fn test_mapper_defaults_are_valid() {
        let mapper = VisualMapper::default();
        assert!(mapper.validate().is_ok());
        let centre = mapper.map(0.0);
        assert!(centre.scale > 1.0);
        assert_eq!(centre.opacity, 1.0);
        assert_eq!(centre.grayscale, 0.0);
    }

    #[test]
    fn test_curve_deserializes_from_pairs() {
        let curve: FalloffCurve = serde_json::from_str("[[-300, 0.5], [0, 1], [300, 0.5]]").unwrap();
        assert_eq!(curve, FalloffCurve::symmetric(300.0, 1.0, 0.5));
    }
}
