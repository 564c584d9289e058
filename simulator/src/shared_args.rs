//! Command-line argument groups for dataset generation.
//!
//! Each group is flattened into the binary's parser and knows how to turn
//! itself into settings or pose requests. Bounds are `Option`s with the
//! defaults applied here, so an explicit value combined with a user-supplied
//! bound can be told apart from one combined with a default.

use crate::pose::{PoseError, PositionRequest, RotationRequest};
use crate::scene::{EntityId, SceneBackend};
use crate::settings::{
    CameraSettings, RenderDevice, RenderEngine, RenderSettings, Resolution, SunSettings,
};
use clap::{Args, ValueEnum};
use nalgebra::Vector3;
use serde::Serialize;
use shared::algo::rotation::{TrackAxis, UpAxis};
use shared::algo::sampling::ShellSampling;
use shared::vec3_arg::Vec3Arg;
use std::f64::consts::TAU;

const DEFAULT_MIN_OBJECT_POS: f64 = 25.0;
const DEFAULT_MAX_OBJECT_POS: f64 = 50.0;
const DEFAULT_MIN_CAMERA_DIST: f64 = 5.0;
const DEFAULT_MAX_CAMERA_DIST: f64 = 10.0;

/// Inclination sampling for spherical-shell draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
pub enum ShellSamplingArg {
    /// Directions uniform over the sphere
    #[default]
    Uniform,
    /// Inclination uniform in [0, π] (legacy, denser near the poles)
    Polar,
}

impl From<ShellSamplingArg> for ShellSampling {
    fn from(arg: ShellSamplingArg) -> Self {
        match arg {
            ShellSamplingArg::Uniform => ShellSampling::AreaUniform,
            ShellSamplingArg::Polar => ShellSampling::PolarAngle,
        }
    }
}

fn vector(arg: Option<Vec3Arg>) -> Option<Vector3<f64>> {
    arg.map(Vector3::from)
}

/// Object placement options
#[derive(Args, Debug, Clone, Serialize)]
pub struct ObjectPoseArgs {
    /// Object position x,y,z (random within bounds when omitted)
    #[arg(long, allow_hyphen_values = true)]
    pub object_pos: Option<Vec3Arg>,

    /// Lower x,y,z bound for a random object position [default: 25,25,25]
    #[arg(long, allow_hyphen_values = true)]
    pub min_object_pos: Option<Vec3Arg>,

    /// Upper x,y,z bound for a random object position [default: 50,50,50]
    #[arg(long, allow_hyphen_values = true)]
    pub max_object_pos: Option<Vec3Arg>,

    /// Position the object relative to this scene entity instead of the origin
    #[arg(long)]
    pub obj_pos_as_dist: Option<String>,

    /// Minimum distance from --obj-pos-as-dist when placing randomly [default: 25]
    #[arg(long)]
    pub min_object_dist: Option<f64>,

    /// Maximum distance from --obj-pos-as-dist when placing randomly [default: 50]
    #[arg(long)]
    pub max_object_dist: Option<f64>,

    /// Object rotation x,y,z in radians (random within bounds when omitted)
    #[arg(long, allow_hyphen_values = true)]
    pub object_rot: Option<Vec3Arg>,

    /// Lower x,y,z bound in radians for a random object rotation [default: 0,0,0]
    #[arg(long, allow_hyphen_values = true)]
    pub min_object_rot: Option<Vec3Arg>,

    /// Upper x,y,z bound in radians for a random object rotation [default: 2π,2π,2π]
    #[arg(long, allow_hyphen_values = true)]
    pub max_object_rot: Option<Vec3Arg>,
}

impl ObjectPoseArgs {
    /// Position request, resolving `--obj-pos-as-dist` against `scene`
    pub fn position_request<S: SceneBackend + ?Sized>(
        &self,
        scene: &S,
        sampling: ShellSampling,
    ) -> Result<PositionRequest, PoseError> {
        const GROUP: &str = "object position";
        match &self.obj_pos_as_dist {
            Some(reference) => {
                if self.min_object_pos.is_some() || self.max_object_pos.is_some() {
                    return Err(PoseError::ConflictingRequest { group: GROUP });
                }
                PositionRequest::relative(
                    GROUP,
                    scene.resolve(reference)?,
                    vector(self.object_pos),
                    self.min_object_dist,
                    self.max_object_dist,
                    (DEFAULT_MIN_OBJECT_POS, DEFAULT_MAX_OBJECT_POS),
                    sampling,
                )
            }
            None => {
                if self.min_object_dist.is_some() || self.max_object_dist.is_some() {
                    return Err(PoseError::ConflictingRequest { group: GROUP });
                }
                PositionRequest::absolute_or_box(
                    GROUP,
                    vector(self.object_pos),
                    vector(self.min_object_pos),
                    vector(self.max_object_pos),
                    (
                        Vector3::repeat(DEFAULT_MIN_OBJECT_POS),
                        Vector3::repeat(DEFAULT_MAX_OBJECT_POS),
                    ),
                )
            }
        }
    }

    pub fn rotation_request(&self) -> Result<RotationRequest, PoseError> {
        RotationRequest::absolute_or_box(
            "object rotation",
            vector(self.object_rot),
            vector(self.min_object_rot),
            vector(self.max_object_rot),
            (Vector3::zeros(), Vector3::repeat(TAU)),
        )
    }
}

/// Camera lens, tracking and placement options
#[derive(Args, Debug, Clone, Serialize)]
pub struct CameraArgs {
    /// Name of the camera entity in the scene
    #[arg(long, default_value = "Camera")]
    pub camera_name: String,

    /// Lens focal length in millimeters
    #[arg(long, default_value_t = 50.0)]
    pub focal_length: f64,

    /// Camera axis aimed at the object (x, y, z, neg-x, neg-y, neg-z)
    #[arg(long, default_value = "neg-z")]
    pub track_axis: TrackAxis,

    /// Camera axis kept toward world up while tracking
    #[arg(long, default_value = "y")]
    pub up_axis: UpAxis,

    /// Camera offset x,y,z from the object (random within radii when omitted)
    #[arg(long, allow_hyphen_values = true)]
    pub camera_dist: Option<Vec3Arg>,

    /// Minimum camera distance from the object [default: 5]
    #[arg(long)]
    pub min_camera_dist: Option<f64>,

    /// Maximum camera distance from the object [default: 10]
    #[arg(long)]
    pub max_camera_dist: Option<f64>,

    /// Camera rotation x,y,z in radians (tracks the object when omitted)
    #[arg(long, allow_hyphen_values = true)]
    pub camera_rot: Option<Vec3Arg>,

    /// Lower x,y,z bound on the perturbation added to the tracked rotation [default: 0,0,0]
    #[arg(long, allow_hyphen_values = true)]
    pub min_camera_rot_perturb: Option<Vec3Arg>,

    /// Upper x,y,z bound on the perturbation added to the tracked rotation [default: 0,0,0]
    #[arg(long, allow_hyphen_values = true)]
    pub max_camera_rot_perturb: Option<Vec3Arg>,
}

impl CameraArgs {
    pub fn settings(&self) -> CameraSettings {
        CameraSettings {
            name: self.camera_name.clone(),
            focal_length_mm: self.focal_length,
            track_axis: self.track_axis,
            up_axis: self.up_axis,
        }
    }

    pub fn position_request(
        &self,
        object: EntityId,
        sampling: ShellSampling,
    ) -> Result<PositionRequest, PoseError> {
        PositionRequest::relative(
            "camera position",
            object,
            vector(self.camera_dist),
            self.min_camera_dist,
            self.max_camera_dist,
            (DEFAULT_MIN_CAMERA_DIST, DEFAULT_MAX_CAMERA_DIST),
            sampling,
        )
    }

    pub fn rotation_request(&self, object: EntityId) -> Result<RotationRequest, PoseError> {
        RotationRequest::absolute_or_track(
            "camera rotation",
            vector(self.camera_rot),
            object,
            vector(self.min_camera_rot_perturb),
            vector(self.max_camera_rot_perturb),
        )
    }
}

/// Renderer options
#[derive(Args, Debug, Clone, Serialize)]
pub struct RenderArgs {
    /// Output resolution as WIDTHxHEIGHT
    #[arg(long, default_value = "1920x1080")]
    pub resolution: Resolution,

    #[arg(long, value_enum, default_value_t = RenderEngine::Cycles)]
    pub render_engine: RenderEngine,

    /// Samples per pixel
    #[arg(long, default_value_t = 128, value_parser = clap::value_parser!(u32).range(1..))]
    pub render_samples: u32,

    #[arg(long, value_enum, default_value_t = RenderDevice::Cpu)]
    pub render_device: RenderDevice,
}

impl RenderArgs {
    pub fn settings(&self) -> RenderSettings {
        RenderSettings {
            resolution: self.resolution,
            engine: self.render_engine,
            samples: self.render_samples,
            device: self.render_device,
        }
    }
}

/// Sun placement options
#[derive(Args, Debug, Clone, Serialize)]
pub struct SunArgs {
    /// Name of the sun light entity
    #[arg(long, default_value = "Sun")]
    pub sun_name: String,

    /// Name of the entity the sun is aimed at
    #[arg(long, default_value = "Planet")]
    pub planet_name: String,

    /// Sun distance from the origin along the ecliptic; sun posing is off when omitted
    #[arg(long)]
    pub sun_distance: Option<f64>,
}

impl SunArgs {
    pub fn settings(&self) -> Option<SunSettings> {
        self.sun_distance
            .map(|d| SunSettings::new(self.sun_name.clone(), self.planet_name.clone(), d))
    }
}
