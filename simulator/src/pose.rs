//! Pose requests: how an entity's position or rotation is chosen each frame.
//!
//! Requests are validated when constructed, so a run with conflicting or
//! inverted bounds fails before the scene is touched.

use crate::scene::{EntityId, SceneError};
use nalgebra::Vector3;
use shared::algo::rotation::RotationError;
use shared::algo::sampling::{Bounds3, RadiusRange, SamplingError, ShellSampling};
use thiserror::Error;

/// Configuration and resolution errors raised while posing entities
#[derive(Error, Debug)]
pub enum PoseError {
    #[error("{group}: an explicit value cannot be combined with --min/--max bounds")]
    ConflictingRequest { group: &'static str },

    #[error("{group}: {source}")]
    InvalidBounds {
        group: &'static str,
        #[source]
        source: SamplingError,
    },

    #[error("{group} cannot depend on '{reference}' ({role}): it is not posed yet at that point of the frame")]
    PosedOutOfOrder {
        group: &'static str,
        reference: String,
        role: &'static str,
    },

    #[error("'{entity}' cannot be both the {first} and the {second}")]
    SharedEntity {
        entity: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("sun distance must be finite and non-negative, got {0}")]
    InvalidSunDistance(f64),

    #[error("'{entity}' has no track constraint toward '{target}'")]
    MissingTrackConstraint { entity: String, target: String },

    #[error(transparent)]
    Rotation(#[from] RotationError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Position choice for one entity
#[derive(Debug, Clone, PartialEq)]
pub enum PositionRequest {
    Absolute(Vector3<f64>),
    RandomBox(Bounds3),
    /// Fixed offset from the reference entity's current position
    RelativeFixed {
        reference: EntityId,
        offset: Vector3<f64>,
    },
    /// Random spherical-shell offset from the reference entity's current position
    RelativeRandom {
        reference: EntityId,
        radii: RadiusRange,
        sampling: ShellSampling,
    },
}

/// Rotation choice for one entity
#[derive(Debug, Clone, PartialEq)]
pub enum RotationRequest {
    Absolute(Vector3<f64>),
    RandomBox(Bounds3),
    /// Aim along the entity's track constraint, then add a bounded perturbation
    TrackThenPerturb { target: EntityId, perturb: Bounds3 },
}

fn reject_mixed(
    group: &'static str,
    absolute: bool,
    min: &Option<impl Sized>,
    max: &Option<impl Sized>,
) -> Result<(), PoseError> {
    if absolute && (min.is_some() || max.is_some()) {
        return Err(PoseError::ConflictingRequest { group });
    }
    Ok(())
}

fn bounds(
    group: &'static str,
    min: Vector3<f64>,
    max: Vector3<f64>,
) -> Result<Bounds3, PoseError> {
    Bounds3::new(min, max).map_err(|source| PoseError::InvalidBounds { group, source })
}

enum Choice {
    Explicit(Vector3<f64>),
    Box(Bounds3),
}

fn explicit_or_box(
    group: &'static str,
    absolute: Option<Vector3<f64>>,
    min: Option<Vector3<f64>>,
    max: Option<Vector3<f64>>,
    defaults: (Vector3<f64>, Vector3<f64>),
) -> Result<Choice, PoseError> {
    reject_mixed(group, absolute.is_some(), &min, &max)?;
    match absolute {
        Some(v) => {
            bounds(group, v, v)?;
            Ok(Choice::Explicit(v))
        }
        None => Ok(Choice::Box(bounds(
            group,
            min.unwrap_or(defaults.0),
            max.unwrap_or(defaults.1),
        )?)),
    }
}

impl PositionRequest {
    /// Explicit position, or a uniform draw inside per-axis bounds.
    ///
    /// Bounds left unset fall back to the defaults. Giving an explicit value
    /// together with either bound is a configuration error.
    pub fn absolute_or_box(
        group: &'static str,
        absolute: Option<Vector3<f64>>,
        min: Option<Vector3<f64>>,
        max: Option<Vector3<f64>>,
        defaults: (Vector3<f64>, Vector3<f64>),
    ) -> Result<Self, PoseError> {
        Ok(match explicit_or_box(group, absolute, min, max, defaults)? {
            Choice::Explicit(v) => PositionRequest::Absolute(v),
            Choice::Box(b) => PositionRequest::RandomBox(b),
        })
    }

    /// Fixed offset from `reference`, or a spherical-shell draw around it
    pub fn relative(
        group: &'static str,
        reference: EntityId,
        offset: Option<Vector3<f64>>,
        min_dist: Option<f64>,
        max_dist: Option<f64>,
        defaults: (f64, f64),
        sampling: ShellSampling,
    ) -> Result<Self, PoseError> {
        reject_mixed(group, offset.is_some(), &min_dist, &max_dist)?;
        match offset {
            Some(offset) => {
                bounds(group, offset, offset)?;
                Ok(PositionRequest::RelativeFixed { reference, offset })
            }
            None => {
                let radii = RadiusRange::new(
                    min_dist.unwrap_or(defaults.0),
                    max_dist.unwrap_or(defaults.1),
                )
                .map_err(|source| PoseError::InvalidBounds { group, source })?;
                Ok(PositionRequest::RelativeRandom {
                    reference,
                    radii,
                    sampling,
                })
            }
        }
    }

    /// Entity whose position must be resolved before this request
    pub fn reference(&self) -> Option<EntityId> {
        match self {
            PositionRequest::RelativeFixed { reference, .. }
            | PositionRequest::RelativeRandom { reference, .. } => Some(*reference),
            _ => None,
        }
    }
}

impl RotationRequest {
    /// Explicit Euler angles, or a uniform draw inside per-axis bounds
    pub fn absolute_or_box(
        group: &'static str,
        absolute: Option<Vector3<f64>>,
        min: Option<Vector3<f64>>,
        max: Option<Vector3<f64>>,
        defaults: (Vector3<f64>, Vector3<f64>),
    ) -> Result<Self, PoseError> {
        Ok(match explicit_or_box(group, absolute, min, max, defaults)? {
            Choice::Explicit(v) => RotationRequest::Absolute(v),
            Choice::Box(b) => RotationRequest::RandomBox(b),
        })
    }

    /// Explicit Euler angles, or track `target` with a perturbation drawn
    /// from `[min_perturb, max_perturb]` (zero when unset)
    pub fn absolute_or_track(
        group: &'static str,
        absolute: Option<Vector3<f64>>,
        target: EntityId,
        min_perturb: Option<Vector3<f64>>,
        max_perturb: Option<Vector3<f64>>,
    ) -> Result<Self, PoseError> {
        reject_mixed(group, absolute.is_some(), &min_perturb, &max_perturb)?;
        match absolute {
            Some(v) => {
                bounds(group, v, v)?;
                Ok(RotationRequest::Absolute(v))
            }
            None => Ok(RotationRequest::TrackThenPerturb {
                target,
                perturb: bounds(
                    group,
                    min_perturb.unwrap_or_else(Vector3::zeros),
                    max_perturb.unwrap_or_else(Vector3::zeros),
                )?,
            }),
        }
    }

    /// Tracking target, if this request aims at another entity
    pub fn track_target(&self) -> Option<EntityId> {
        match self {
            RotationRequest::TrackThenPerturb { target, .. } => Some(*target),
            _ => None,
        }
    }
}
