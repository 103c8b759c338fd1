//! Error types for particle construction and vector geometry.

use thiserror::Error;

/// Geometry errors raised by [`crate::Vec2`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorError {
    /// `normalized()` or `angle()` was called on a zero-length vector.
    #[error("cannot normalize or take the angle of a zero-length vector")]
    Degenerate,
}

/// Invalid particle configuration, raised at construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParticleError {
    /// Mass must be strictly positive.
    #[error("particle mass must be positive, got {mass}")]
    NonPositiveMass {
        /// The rejected mass
        mass: f64,
    },

    /// A physical quantity was infinite or NaN.
    #[error("particle {field} must be finite, got {value}")]
    NonFinite {
        /// Which quantity was rejected
        field: &'static str,
        /// The rejected value
        value: f64,
    },

    /// An explicitly supplied radius must be positive and finite.
    #[error("particle radius must be positive and finite, got {radius}")]
    InvalidRadius {
        /// The rejected radius
        radius: f64,
    },
}
