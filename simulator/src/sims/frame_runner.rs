//! Frame-generation loop for procedural datasets.
//!
//! One frame is: pose the object, pose the sun, pose the camera, render.
//! Frames run strictly in sequence against a single mutable scene, and each
//! frame's poses are written to the `poses.csv` manifest and then dropped.

use crate::pose::{PoseError, PositionRequest, RotationRequest};
use crate::pose_controller::PoseController;
use crate::scene::{EntityId, SceneBackend, SceneError};
use crate::settings::{CameraSettings, RenderSettings, SunSettings};
use log::{debug, info};
use nalgebra::Vector3;
use serde::Serialize;
use shared::algo::rotation::{TrackAxis, UpAxis};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Manifest file written next to the rendered frames
pub const MANIFEST_FILE: &str = "poses.csv";

/// Errors that abort a generation run
#[derive(Error, Debug)]
pub enum FrameError {
    #[error(transparent)]
    Pose(#[from] PoseError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("failed to write pose manifest: {0}")]
    Manifest(#[from] csv::Error),

    #[error("I/O error while writing frames: {0}")]
    Io(#[from] std::io::Error),
}

/// Position of the generation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Nothing generated yet
    Idle,
    /// Object position then object rotation
    PosingObject { frame: usize },
    /// Sun position and aim; passed through when no sun is configured
    PosingSun { frame: usize },
    /// Camera position then camera rotation
    PosingCamera { frame: usize },
    /// Render call in flight
    Rendering { frame: usize },
    /// All requested frames rendered
    Done { frames: usize },
}

impl FrameState {
    /// State following `self` in a run of `total` frames
    pub fn next(self, total: usize) -> FrameState {
        match self {
            FrameState::Idle if total == 0 => FrameState::Done { frames: 0 },
            FrameState::Idle => FrameState::PosingObject { frame: 0 },
            FrameState::PosingObject { frame } => FrameState::PosingSun { frame },
            FrameState::PosingSun { frame } => FrameState::PosingCamera { frame },
            FrameState::PosingCamera { frame } => FrameState::Rendering { frame },
            FrameState::Rendering { frame } if frame + 1 < total => {
                FrameState::PosingObject { frame: frame + 1 }
            }
            FrameState::Rendering { .. } => FrameState::Done { frames: total },
            done @ FrameState::Done { .. } => done,
        }
    }
}

/// Sun entity, its tracking target, and standoff distance
#[derive(Debug, Clone, PartialEq)]
pub struct SunPlan {
    pub sun: EntityId,
    pub planet: EntityId,
    pub distance: f64,
    pub track_axis: TrackAxis,
    pub up_axis: UpAxis,
}

impl SunPlan {
    /// Resolve the sun and planet named in `settings`
    pub fn resolve<S: SceneBackend + ?Sized>(
        scene: &S,
        settings: &SunSettings,
    ) -> Result<Self, PoseError> {
        if !(settings.distance.is_finite() && settings.distance >= 0.0) {
            return Err(PoseError::InvalidSunDistance(settings.distance));
        }
        Ok(Self {
            sun: scene.resolve(&settings.name)?,
            planet: scene.resolve(&settings.planet_name)?,
            distance: settings.distance,
            track_axis: settings.track_axis,
            up_axis: settings.up_axis,
        })
    }
}

/// Everything posed each frame, with entities already resolved to handles
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub object: EntityId,
    pub object_position: PositionRequest,
    pub object_rotation: RotationRequest,
    pub camera: EntityId,
    pub camera_position: PositionRequest,
    pub camera_rotation: RotationRequest,
    pub sun: Option<SunPlan>,
}

impl FramePlan {
    /// Check that every pose only depends on entities already posed earlier
    /// in the frame, and that no entity fills two roles.
    ///
    /// Per frame the object is posed first, then the sun, then the camera.
    pub fn validate<S: SceneBackend + ?Sized>(&self, scene: &S) -> Result<(), PoseError> {
        let name = |id: EntityId| scene.name(id).map(str::to_string);

        let mut later = vec![(self.object, "the posed object"), (self.camera, "the camera")];
        if let Some(sun) = &self.sun {
            later.push((sun.sun, "the sun"));
        }
        if let Some(reference) = self.object_position.reference() {
            let role = later
                .iter()
                .find(|(id, _)| *id == reference)
                .map(|&(_, role)| role);
            if let Some(role) = role {
                return Err(PoseError::PosedOutOfOrder {
                    group: "object position",
                    reference: name(reference)?,
                    role,
                });
            }
        }
        if self.camera_position.reference() == Some(self.camera) {
            return Err(PoseError::PosedOutOfOrder {
                group: "camera position",
                reference: name(self.camera)?,
                role: "the camera",
            });
        }
        if self.object == self.camera {
            return Err(PoseError::SharedEntity {
                entity: name(self.object)?,
                first: "object",
                second: "camera",
            });
        }

        if let Some(sun) = &self.sun {
            for (id, role) in [(self.object, "object"), (self.camera, "camera")] {
                if sun.sun == id {
                    return Err(PoseError::SharedEntity {
                        entity: name(id)?,
                        first: "sun",
                        second: role,
                    });
                }
            }
            // the sun aims at its planet before the camera is posed
            for (id, role) in [(sun.sun, "the sun"), (self.camera, "the camera")] {
                if sun.planet == id {
                    return Err(PoseError::PosedOutOfOrder {
                        group: "sun rotation",
                        reference: name(id)?,
                        role,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Poses applied for one rendered frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub frame: usize,
    pub image: PathBuf,
    pub object_position: Vector3<f64>,
    pub object_rotation: Vector3<f64>,
    pub camera_position: Vector3<f64>,
    pub camera_rotation: Vector3<f64>,
    pub sun_position: Option<Vector3<f64>>,
}

/// Flat `poses.csv` row
#[derive(Debug, Serialize)]
struct ManifestRow<'a> {
    frame: usize,
    image: &'a str,
    object_x: f64,
    object_y: f64,
    object_z: f64,
    object_rx: f64,
    object_ry: f64,
    object_rz: f64,
    camera_x: f64,
    camera_y: f64,
    camera_z: f64,
    camera_rx: f64,
    camera_ry: f64,
    camera_rz: f64,
    sun_x: Option<f64>,
    sun_y: Option<f64>,
    sun_z: Option<f64>,
}

impl<'a> ManifestRow<'a> {
    fn new(record: &FrameRecord, image: &'a str) -> Self {
        let sun = record.sun_position;
        Self {
            frame: record.frame,
            image,
            object_x: record.object_position.x,
            object_y: record.object_position.y,
            object_z: record.object_position.z,
            object_rx: record.object_rotation.x,
            object_ry: record.object_rotation.y,
            object_rz: record.object_rotation.z,
            camera_x: record.camera_position.x,
            camera_y: record.camera_position.y,
            camera_z: record.camera_position.z,
            camera_rx: record.camera_rotation.x,
            camera_ry: record.camera_rotation.y,
            camera_rz: record.camera_rotation.z,
            sun_x: sun.map(|s| s.x),
            sun_y: sun.map(|s| s.y),
            sun_z: sun.map(|s| s.z),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    pub frames: usize,
    pub manifest: PathBuf,
}

/// Output stem for frame `index`; the backend adds the file extension
pub fn frame_stem(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("img{index}"))
}

/// Drives the per-frame pose and render sequence
#[derive(Debug)]
pub struct FrameGenerator {
    plan: FramePlan,
    poses: PoseController,
    state: FrameState,
}

impl FrameGenerator {
    pub fn new(plan: FramePlan, poses: PoseController) -> Self {
        Self {
            plan,
            poses,
            state: FrameState::Idle,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    /// One-time scene setup: active camera, track constraints and renderer.
    ///
    /// The camera only receives a track constraint when its rotation request
    /// tracks a target. The sun always tracks its planet.
    pub fn prepare<S: SceneBackend + ?Sized>(
        &self,
        scene: &mut S,
        camera: &CameraSettings,
        render: &RenderSettings,
    ) -> Result<(), FrameError> {
        self.plan.validate(scene)?;
        scene.set_camera(self.plan.camera, camera.focal_length_mm)?;

        if let Some(target) = self.plan.camera_rotation.track_target() {
            scene.add_track_constraint(
                self.plan.camera,
                target,
                camera.track_axis,
                camera.up_axis,
            )?;
            debug!(
                "{} tracks {} along {} (up {})",
                scene.name(self.plan.camera)?,
                scene.name(target)?,
                camera.track_axis,
                camera.up_axis
            );
        }

        if let Some(sun) = &self.plan.sun {
            scene.add_track_constraint(sun.sun, sun.planet, sun.track_axis, sun.up_axis)?;
        }

        scene.configure_render(render)?;
        Ok(())
    }

    fn pose_object<S: SceneBackend + ?Sized>(
        &mut self,
        scene: &mut S,
        record: &mut FrameRecord,
    ) -> Result<(), PoseError> {
        let plan = &self.plan;
        record.object_position = self
            .poses
            .place(scene, plan.object, &plan.object_position)?;
        record.object_rotation = self
            .poses
            .orient(scene, plan.object, &plan.object_rotation)?;
        Ok(())
    }

    fn pose_sun<S: SceneBackend + ?Sized>(
        &mut self,
        scene: &mut S,
        record: &mut FrameRecord,
    ) -> Result<(), PoseError> {
        if let Some(sun) = &self.plan.sun {
            record.sun_position = Some(self.poses.place_sun(
                scene,
                sun.sun,
                sun.planet,
                sun.distance,
            )?);
        }
        Ok(())
    }

    fn pose_camera<S: SceneBackend + ?Sized>(
        &mut self,
        scene: &mut S,
        record: &mut FrameRecord,
    ) -> Result<(), PoseError> {
        let plan = &self.plan;
        record.camera_position = self
            .poses
            .place(scene, plan.camera, &plan.camera_position)?;
        record.camera_rotation = self
            .poses
            .orient(scene, plan.camera, &plan.camera_rotation)?;
        Ok(())
    }

    /// Generate `frames` images into `output_dir` and write the pose manifest.
    ///
    /// `on_frame` is called after each render with the frame's poses.
    pub fn run<S, F>(
        &mut self,
        scene: &mut S,
        frames: usize,
        output_dir: &Path,
        mut on_frame: F,
    ) -> Result<GenerationSummary, FrameError>
    where
        S: SceneBackend + ?Sized,
        F: FnMut(&FrameRecord),
    {
        self.plan.validate(scene)?;
        std::fs::create_dir_all(output_dir)?;
        let manifest = output_dir.join(MANIFEST_FILE);
        let mut writer = csv::Writer::from_path(&manifest)?;

        let mut record = FrameRecord {
            frame: 0,
            image: PathBuf::new(),
            object_position: Vector3::zeros(),
            object_rotation: Vector3::zeros(),
            camera_position: Vector3::zeros(),
            camera_rotation: Vector3::zeros(),
            sun_position: None,
        };

        self.state = FrameState::Idle;
        loop {
            self.state = self.state.next(frames);
            match self.state {
                FrameState::Idle => {}
                FrameState::PosingObject { frame } => {
                    record.frame = frame;
                    record.sun_position = None;
                    self.pose_object(scene, &mut record)?;
                }
                FrameState::PosingSun { .. } => self.pose_sun(scene, &mut record)?,
                FrameState::PosingCamera { .. } => self.pose_camera(scene, &mut record)?,
                FrameState::Rendering { frame } => {
                    record.image = scene.render_to(&frame_stem(output_dir, frame))?;

                    let image = record
                        .image
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    writer.serialize(ManifestRow::new(&record, &image))?;
                    on_frame(&record);
                }
                FrameState::Done { frames } => {
                    writer.flush()?;
                    info!(
                        "Generated {frames} frame(s); manifest at {}",
                        manifest.display()
                    );
                    return Ok(GenerationSummary { frames, manifest });
                }
            }
        }
    }
}
