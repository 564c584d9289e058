//! Random placement primitives for procedural scene posing.
//!
//! All samplers are pure functions of their bounds and an injected random
//! number generator, so a seeded generator reproduces an entire dataset.
//!
//! # Coordinate conventions
//! - Cartesian vectors are right-handed `(x, y, z)` in scene units.
//! - Spherical draws use azimuth θ about +Z and inclination φ measured from +Z:
//!   `x = r sinφ cosθ, y = r sinφ sinθ, z = r cosφ`.
//! - The ecliptic plane is `z = 0`.

use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use thiserror::Error;

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

/// Errors raised when sampling bounds are malformed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    #[error("invalid bounds on {axis} axis: min {min} > max {max}")]
    InvertedBounds {
        axis: &'static str,
        min: f64,
        max: f64,
    },

    #[error("non-finite bound on {axis} axis: [{min}, {max}]")]
    NonFinite {
        axis: &'static str,
        min: f64,
        max: f64,
    },

    #[error("invalid radius range: [{min}, {max}] (requires 0 <= min <= max)")]
    InvalidRadius { min: f64, max: f64 },

    #[error("{axis} interval [{min}, {max}] is too wide to sample from")]
    SpanTooWide {
        axis: &'static str,
        min: f64,
        max: f64,
    },
}

/// Uniform float sampling scales the span by `1 / (1 - ε)`, which must stay finite
fn check_span(axis: &'static str, min: f64, max: f64) -> Result<(), SamplingError> {
    if ((max - min) / (1.0 - f64::EPSILON)).is_finite() {
        Ok(())
    } else {
        Err(SamplingError::SpanTooWide { axis, min, max })
    }
}

/// Per-axis closed interval `[min_i, max_i]` for box sampling.
///
/// Construction validates `min_i <= max_i` on every axis, so any `Bounds3`
/// in hand is safe to sample from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds3 {
    min: Vector3<f64>,
    max: Vector3<f64>,
}

impl Bounds3 {
    /// Create per-axis bounds, rejecting inverted or non-finite intervals
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Result<Self, SamplingError> {
        for axis in 0..3 {
            let (lo, hi) = (min[axis], max[axis]);
            if !lo.is_finite() || !hi.is_finite() {
                return Err(SamplingError::NonFinite {
                    axis: AXIS_NAMES[axis],
                    min: lo,
                    max: hi,
                });
            }
            if lo > hi {
                return Err(SamplingError::InvertedBounds {
                    axis: AXIS_NAMES[axis],
                    min: lo,
                    max: hi,
                });
            }
            check_span(AXIS_NAMES[axis], lo, hi)?;
        }
        Ok(Self { min, max })
    }

    /// Same scalar interval on all three axes
    pub fn uniform(min: f64, max: f64) -> Result<Self, SamplingError> {
        Self::new(Vector3::repeat(min), Vector3::repeat(max))
    }

    /// Degenerate bounds that always yield `value`
    pub fn point(value: Vector3<f64>) -> Result<Self, SamplingError> {
        Self::new(value, value)
    }

    pub fn min(&self) -> Vector3<f64> {
        self.min
    }

    pub fn max(&self) -> Vector3<f64> {
        self.max
    }

    /// Whether `v` lies inside the bounds on every axis
    pub fn contains(&self, v: &Vector3<f64>) -> bool {
        (0..3).all(|i| v[i] >= self.min[i] && v[i] <= self.max[i])
    }
}

/// Closed radius interval `[min, max]` for spherical-shell sampling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusRange {
    min: f64,
    max: f64,
}

impl RadiusRange {
    pub fn new(min: f64, max: f64) -> Result<Self, SamplingError> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
            return Err(SamplingError::InvalidRadius { min, max });
        }
        check_span("radius", min, max)?;
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// How the inclination angle of a spherical-shell draw is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShellSampling {
    /// Direction uniform over the sphere surface (`cos φ` uniform in [-1, 1])
    #[default]
    AreaUniform,
    /// φ uniform in [0, π]. Over-samples directions near the poles; kept for
    /// parity with datasets generated by earlier tooling.
    PolarAngle,
}

/// Uniform draw from the closed interval `[lo, hi]`, exact when `lo == hi`
fn uniform_closed<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if lo == hi {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}

/// Draw each axis independently and uniformly from `[min_i, max_i]`
pub fn sample_box<R: Rng + ?Sized>(rng: &mut R, bounds: &Bounds3) -> Vector3<f64> {
    Vector3::new(
        uniform_closed(rng, bounds.min.x, bounds.max.x),
        uniform_closed(rng, bounds.min.y, bounds.max.y),
        uniform_closed(rng, bounds.min.z, bounds.max.z),
    )
}

/// Uniform angle in `[0, 2π)`
pub fn sample_angle<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(0.0..TAU)
}

/// Spherical to Cartesian conversion with inclination measured from +Z
pub fn spherical_to_cartesian(radius: f64, azimuth: f64, inclination: f64) -> Vector3<f64> {
    let (sin_phi, cos_phi) = inclination.sin_cos();
    let (sin_theta, cos_theta) = azimuth.sin_cos();
    Vector3::new(
        radius * sin_phi * cos_theta,
        radius * sin_phi * sin_theta,
        radius * cos_phi,
    )
}

/// Draw a point in the spherical shell `min_r <= |p| <= max_r`.
///
/// The radius is uniform in `[min_r, max_r]` (not volume-weighted) and the
/// azimuth is uniform in `[0, 2π)`. The inclination follows `mode`.
pub fn sample_spherical_shell<R: Rng + ?Sized>(
    rng: &mut R,
    radii: &RadiusRange,
    mode: ShellSampling,
) -> Vector3<f64> {
    let radius = uniform_closed(rng, radii.min, radii.max);
    let azimuth = sample_angle(rng);
    let inclination = match mode {
        ShellSampling::AreaUniform => uniform_closed(rng, -1.0, 1.0).acos(),
        ShellSampling::PolarAngle => uniform_closed(rng, 0.0, PI),
    };
    spherical_to_cartesian(radius, azimuth, inclination)
}

/// Position on the ecliptic plane at `distance` from the origin
pub fn ecliptic_position(distance: f64, angle: f64) -> Vector3<f64> {
    let (sin_a, cos_a) = angle.sin_cos();
    Vector3::new(distance * cos_a, distance * sin_a, 0.0)
}
