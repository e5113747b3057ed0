//! Configuration errors.
//!
//! Every value that could otherwise turn into a zero modulus or a NaN position
//! is checked when a carousel is constructed, and reported through
//! [`ConfigError`].

use thiserror::Error;

/// A carousel configuration that cannot be run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `item_width + gap` must be a finite, positive distance.
    #[error("invalid geometry: item_width={item_width}, gap={gap} (item_width + gap must be finite and > 0)")]
    InvalidGeometry { item_width: f32, gap: f32 },

    /// The reference frame duration used to scale velocity must be > 0.
    #[error("invalid reference frame duration: {0} ms (must be finite and > 0)")]
    InvalidReferenceFrame(f32),

    /// Scroll velocity must be finite.
    #[error("invalid velocity: {0}")]
    InvalidVelocity(f32),

    /// Elapsed clamp must be a positive duration.
    #[error("invalid elapsed clamp: {0} ms (must be finite and > 0)")]
    InvalidElapsedClamp(f32),

    /// Spring parameters out of range.
    #[error("invalid spring '{signal}': stiffness={stiffness}, damping={damping}, mass={mass}")]
    InvalidSpring {
        signal: &'static str,
        stiffness: f32,
        damping: f32,
        mass: f32,
    },

    /// A falloff curve with no control points.
    #[error("curve '{0}' has no control points")]
    EmptyCurve(&'static str),

    /// A control point that is NaN or infinite.
    #[error("curve '{curve}' has a non-finite control point at position {position}")]
    NonFiniteControlPoint { curve: &'static str, position: usize },

    /// Control point inputs must be strictly increasing.
    #[error("curve '{curve}' control point inputs must be strictly increasing (position {position})")]
    UnorderedControlPoints { curve: &'static str, position: usize },

    /// Z-order falloff step must be > 0.
    #[error("invalid z-order rule: flat_radius={flat_radius}, step={step}")]
    InvalidZOrder { flat_radius: f32, step: f32 },

    /// Cull radius must be > 0 when set.
    #[error("invalid cull radius: {0}")]
    InvalidCullRadius(f32),
}
