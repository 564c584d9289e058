//! Scene backend abstraction for procedural dataset generation.
//!
//! The pose controller and frame loop never touch a global scene: they are
//! handed a [`SceneBackend`] explicitly and address entities through typed
//! [`EntityId`] handles. Names are only resolved at this boundary.
//!
//! # Coordinate conventions
//! - Positions are world-space `(x, y, z)` in scene units.
//! - Rotations are XYZ Euler vectors in radians (see `shared::algo::rotation`).
//! - Cameras look down their local −Z axis with +Y up.

use crate::settings::RenderSettings;
use nalgebra::Vector3;
use shared::algo::rotation::{TrackAxis, UpAxis};
use shared::image_proc::ImageIoError;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Opaque handle to an entity owned by a scene backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(usize);

impl EntityId {
    pub fn from_index(index: usize) -> Self {
        EntityId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Standing orientation rule making one entity face another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackConstraint {
    pub target: EntityId,
    pub forward: TrackAxis,
    pub up: UpAxis,
}

/// Errors reported by scene backends
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scene file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate entity name '{0}' in scene")]
    DuplicateEntity(String),

    #[error("no entity named '{0}' in scene")]
    UnknownEntity(String),

    #[error("entity handle {0} does not belong to this scene")]
    InvalidHandle(EntityId),

    #[error("unsupported import format for {} (expected .obj, .fbx or .stl)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("importing {} produced {count} new objects, expected exactly one", .path.display())]
    ImportAmbiguity { path: PathBuf, count: usize },

    #[error("invalid render settings: {0}")]
    InvalidRenderSettings(String),

    #[error("render requested before the renderer was configured")]
    RenderNotConfigured,

    #[error("render requested without an active camera")]
    NoActiveCamera,

    #[error("failed to write render output: {0}")]
    Output(#[from] ImageIoError),
}

/// Operations the dataset generator needs from a 3D scene host.
///
/// Implementations own all entity state. Every method taking an [`EntityId`]
/// fails with [`SceneError::InvalidHandle`] for handles the backend did not issue.
pub trait SceneBackend {
    /// Load a scene description, replacing any entities already present
    fn open_scene(&mut self, path: &Path) -> Result<(), SceneError>;

    /// Import a mesh file, which must introduce exactly one new entity
    fn import_object(&mut self, path: &Path) -> Result<EntityId, SceneError>;

    /// Look up an entity by its unique name
    fn resolve(&self, name: &str) -> Result<EntityId, SceneError>;

    fn name(&self, id: EntityId) -> Result<&str, SceneError>;

    fn position(&self, id: EntityId) -> Result<Vector3<f64>, SceneError>;

    fn rotation(&self, id: EntityId) -> Result<Vector3<f64>, SceneError>;

    fn set_position(&mut self, id: EntityId, position: Vector3<f64>) -> Result<(), SceneError>;

    fn set_rotation(&mut self, id: EntityId, rotation: Vector3<f64>) -> Result<(), SceneError>;

    /// Attach a track-to constraint from `id` toward `target`.
    ///
    /// An entity holds at most one constraint; a later call replaces it.
    fn add_track_constraint(
        &mut self,
        id: EntityId,
        target: EntityId,
        forward: TrackAxis,
        up: UpAxis,
    ) -> Result<(), SceneError>;

    fn track_constraint(&self, id: EntityId) -> Result<Option<TrackConstraint>, SceneError>;

    /// Make `id` the render camera with the given lens focal length
    fn set_camera(&mut self, id: EntityId, focal_length_mm: f64) -> Result<(), SceneError>;

    fn configure_render(&mut self, settings: &RenderSettings) -> Result<(), SceneError>;

    /// Render the current scene state.
    ///
    /// `stem` is the output path without extension; the backend appends its
    /// own and returns the path actually written.
    fn render_to(&mut self, stem: &Path) -> Result<PathBuf, SceneError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::from_index(3);
        assert_eq!(id.index(), 3);
        assert_eq!(id.to_string(), "#3");
    }

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = SceneError::UnknownEntity("Camera.001".to_string());
        assert!(err.to_string().contains("Camera.001"));

        let err = SceneError::ImportAmbiguity {
            path: PathBuf::from("models/pair.obj"),
            count: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("models/pair.obj"));
        assert!(msg.contains("2 new objects"));
    }
}
