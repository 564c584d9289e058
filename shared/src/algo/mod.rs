//! Placement and orientation algorithms for procedural scene posing
//!
//! Sampling routines draw positions and angles from validated bounds; the
//! rotation helpers convert between Euler vectors and track-to orientations.

pub mod rotation;
pub mod sampling;

pub use rotation::{
    euler_to_rotation, perturb_euler, rotation_to_euler, track_euler, track_rotation,
    RotationError, TrackAxis, UpAxis,
};
pub use sampling::{
    ecliptic_position, sample_angle, sample_box, sample_spherical_shell, spherical_to_cartesian,
    Bounds3, RadiusRange, SamplingError, ShellSampling,
};
