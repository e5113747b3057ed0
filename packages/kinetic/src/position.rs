//! Wrapped item positions.
//!
//! Every item owns a slot of width `item_width + gap`. The slots are laid out
//! on a ring of circumference `M = N·step`; as the scroll offset grows the ring
//! rotates and each item's x coordinate cycles through the canonical window
//! `[−M/2, M/2)` centred on the viewport.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Card width and the spacing between cards, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub item_width: f32,
    pub gap: f32,
}

impl Geometry {
    /// `item_width + gap` must be finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let step = self.step();
        if self.item_width.is_finite() && self.gap.is_finite() && step.is_finite() && step > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidGeometry {
                item_width: self.item_width,
                gap: self.gap,
            })
        }
    }

    /// Distance between neighbouring slot centres.
    pub fn step(&self) -> f32 {
        self.item_width + self.gap
    }

    /// Ring circumference for `count` slots.
    pub fn modulus(&self, count: usize) -> f32 {
        count as f32 * self.step()
    }
}

/// Resolves slot ordinals to recentred x coordinates for one ring size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionResolver {
    step: f32,
    modulus: f32,
}

impl PositionResolver {
    /// `None` for an empty ring, so callers never divide by zero.
    pub fn new(geometry: Geometry, count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        Some(Self {
            step: geometry.step(),
            modulus: geometry.modulus(count),
        })
    }

    pub fn modulus(&self) -> f32 {
        self.modulus
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Centre x of slot `ordinal` for the given offset.
    ///
    /// The half-step phase puts slot centres symmetrically around 0: with an
    /// odd count and offset 0 the middle slot sits exactly at the centre.
    /// The wrap runs in `f64` so far-travelled offsets keep sub-pixel detail;
    /// only the recentred result is narrowed.
    pub fn resolve(&self, smoothed_offset: f64, ordinal: usize) -> f32 {
        let step = f64::from(self.step);
        let m = f64::from(self.modulus);
        let base = ordinal as f64 * step;
        let candidate = ((smoothed_offset + base + step * 0.5) % m + m) % m;
        (candidate - m * 0.5) as f32
    }

    /// Shortest signed distance from `from` to `to` on the ring.
    pub fn wrapped_delta(&self, from: f32, to: f32) -> f32 {
        let m = self.modulus;
        let half = m * 0.5;
        (((to - from) + half) % m + m) % m - half
    }
}
