//! Euler-angle helpers and track-to orientation math.
//!
//! Euler vectors are `(x, y, z)` radians in XYZ order: the X rotation is
//! applied first, then Y, then Z, so the matrix is `Rz * Ry * Rx`. This is the
//! convention of common 3D content tools and of nalgebra's
//! `Rotation3::from_euler_angles(roll, pitch, yaw)`.

use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from orientation computations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RotationError {
    #[error("track axis {forward} and up axis {up} must be perpendicular")]
    DegenerateAxes { forward: TrackAxis, up: UpAxis },

    #[error("cannot aim along a zero-length direction")]
    ZeroDirection,
}

/// Local axis that is pointed at the tracking target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackAxis {
    PosX,
    PosY,
    PosZ,
    NegX,
    NegY,
    NegZ,
}

impl TrackAxis {
    /// Unit vector of this axis in the entity's local frame
    pub fn unit(&self) -> Vector3<f64> {
        match self {
            TrackAxis::PosX => Vector3::x(),
            TrackAxis::PosY => Vector3::y(),
            TrackAxis::PosZ => Vector3::z(),
            TrackAxis::NegX => -Vector3::x(),
            TrackAxis::NegY => -Vector3::y(),
            TrackAxis::NegZ => -Vector3::z(),
        }
    }
}

impl fmt::Display for TrackAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackAxis::PosX => "x",
            TrackAxis::PosY => "y",
            TrackAxis::PosZ => "z",
            TrackAxis::NegX => "neg-x",
            TrackAxis::NegY => "neg-y",
            TrackAxis::NegZ => "neg-z",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TrackAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" | "+x" | "pos-x" => Ok(TrackAxis::PosX),
            "y" | "+y" | "pos-y" => Ok(TrackAxis::PosY),
            "z" | "+z" | "pos-z" => Ok(TrackAxis::PosZ),
            "-x" | "neg-x" => Ok(TrackAxis::NegX),
            "-y" | "neg-y" => Ok(TrackAxis::NegY),
            "-z" | "neg-z" => Ok(TrackAxis::NegZ),
            other => Err(format!("Unknown track axis '{other}'")),
        }
    }
}

/// Local axis kept as close as possible to world +Z while tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpAxis {
    X,
    Y,
    Z,
}

impl UpAxis {
    pub fn unit(&self) -> Vector3<f64> {
        match self {
            UpAxis::X => Vector3::x(),
            UpAxis::Y => Vector3::y(),
            UpAxis::Z => Vector3::z(),
        }
    }
}

impl fmt::Display for UpAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpAxis::X => "x",
            UpAxis::Y => "y",
            UpAxis::Z => "z",
        };
        write!(f, "{s}")
    }
}

impl FromStr for UpAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(UpAxis::X),
            "y" => Ok(UpAxis::Y),
            "z" => Ok(UpAxis::Z),
            other => Err(format!("Unknown up axis '{other}'")),
        }
    }
}

/// Rotation matrix for an XYZ Euler vector
pub fn euler_to_rotation(euler: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::from_euler_angles(euler.x, euler.y, euler.z)
}

/// XYZ Euler vector for a rotation matrix
pub fn rotation_to_euler(rotation: &Rotation3<f64>) -> Vector3<f64> {
    let (x, y, z) = rotation.euler_angles();
    Vector3::new(x, y, z)
}

/// Rotation that points local `forward` along `direction` with local `up`
/// as close to world +Z as the direction allows.
///
/// When `direction` is (anti)parallel to world +Z the up reference falls back
/// to world +Y.
pub fn track_rotation(
    direction: &Vector3<f64>,
    forward: TrackAxis,
    up: UpAxis,
) -> Result<Rotation3<f64>, RotationError> {
    let local_forward = forward.unit();
    let local_up = up.unit();
    if local_forward.dot(&local_up).abs() > 0.5 {
        return Err(RotationError::DegenerateAxes { forward, up });
    }

    let norm = direction.norm();
    if !norm.is_finite() || norm < 1e-12 {
        return Err(RotationError::ZeroDirection);
    }
    let f = direction / norm;

    let mut u = Vector3::z() - f * f.z;
    if u.norm() < 1e-9 {
        u = Vector3::y() - f * f.y;
    }
    let u = u.normalize();

    let world = Matrix3::from_columns(&[f, u, f.cross(&u)]);
    let local = Matrix3::from_columns(&[local_forward, local_up, local_forward.cross(&local_up)]);

    Ok(Rotation3::from_matrix_unchecked(world * local.transpose()))
}

/// Euler angles of an entity at `from` tracking a target at `to`
pub fn track_euler(
    from: &Vector3<f64>,
    to: &Vector3<f64>,
    forward: TrackAxis,
    up: UpAxis,
) -> Result<Vector3<f64>, RotationError> {
    let rotation = track_rotation(&(to - from), forward, up)?;
    Ok(rotation_to_euler(&rotation))
}

/// Apply a bounded perturbation to tracked Euler angles.
///
/// X and Y are offset by `+delta`, Z by `-delta.z`.
pub fn perturb_euler(base: &Vector3<f64>, delta: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(base.x + delta.x, base.y + delta.y, base.z - delta.z)
}
