//! In-memory scene backend with a placeholder renderer.
//!
//! Scenes are described by a small JSON document:
//!
//! ```json
//! { "entities": [
//!     { "name": "Camera", "position": [0, 0, 10], "rotation": [0, 0, 0] },
//!     { "name": "Planet", "position": [0, 0, 0], "radius": 6.0 },
//!     { "name": "Sun" }
//! ] }
//! ```
//!
//! Entities with a radius are drawn by [`SimulatedScene::render_to`]; lights
//! and cameras are plain transforms.

use super::import::read_mesh_objects;
use super::render::{rasterize, Body, PinholeCamera};
use crate::scene::{EntityId, SceneBackend, SceneError, TrackConstraint};
use crate::settings::RenderSettings;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use shared::algo::rotation::{euler_to_rotation, TrackAxis, UpAxis};
use shared::image_proc::save_gray_image;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension appended by [`SimulatedScene::render_to`]
pub const RENDER_EXTENSION: &str = "png";

/// One entity entry of a scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescription {
    pub name: String,
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default)]
    pub rotation: [f64; 3],
    #[serde(default)]
    pub radius: f64,
}

/// Top-level scene file document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub entities: Vec<EntityDescription>,
}

#[derive(Debug, Clone)]
struct Entity {
    name: String,
    position: Vector3<f64>,
    rotation: Vector3<f64>,
    radius: f64,
    track: Option<TrackConstraint>,
}

impl From<EntityDescription> for Entity {
    fn from(desc: EntityDescription) -> Self {
        Self {
            name: desc.name,
            position: Vector3::from(desc.position),
            rotation: Vector3::from(desc.rotation),
            radius: desc.radius.max(0.0),
            track: None,
        }
    }
}

/// Scene backend holding all entity state in memory
#[derive(Debug, Default)]
pub struct SimulatedScene {
    entities: Vec<Entity>,
    by_name: HashMap<String, EntityId>,
    camera: Option<(EntityId, f64)>,
    render: Option<RenderSettings>,
    renders: usize,
}

impl SimulatedScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene directly from a description
    pub fn from_description(desc: SceneDescription) -> Result<Self, SceneError> {
        let mut scene = Self::new();
        scene.load(desc)?;
        Ok(scene)
    }

    fn load(&mut self, desc: SceneDescription) -> Result<(), SceneError> {
        let mut entities = Vec::with_capacity(desc.entities.len());
        let mut by_name = HashMap::new();
        for (index, entity) in desc.entities.into_iter().enumerate() {
            if by_name
                .insert(entity.name.clone(), EntityId::from_index(index))
                .is_some()
            {
                return Err(SceneError::DuplicateEntity(entity.name));
            }
            entities.push(Entity::from(entity));
        }

        self.entities = entities;
        self.by_name = by_name;
        self.camera = None;
        Ok(())
    }

    /// Number of entities currently in the scene
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of completed `render_to` calls
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Radius used when drawing the entity
    pub fn radius(&self, id: EntityId) -> Result<f64, SceneError> {
        Ok(self.entity(id)?.radius)
    }

    fn entity(&self, id: EntityId) -> Result<&Entity, SceneError> {
        self.entities
            .get(id.index())
            .ok_or(SceneError::InvalidHandle(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, SceneError> {
        self.entities
            .get_mut(id.index())
            .ok_or(SceneError::InvalidHandle(id))
    }

    /// Blender-style unique name: `Name`, `Name.001`, `Name.002`, ...
    fn unique_name(&self, base: &str) -> String {
        if !self.by_name.contains_key(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}.{n:03}"))
            .find(|candidate| !self.by_name.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn light_position(&self, camera: EntityId) -> Option<Vector3<f64>> {
        // a light is any radius-less entity with a track constraint other than the camera
        self.entities
            .iter()
            .enumerate()
            .find(|(i, e)| *i != camera.index() && e.radius == 0.0 && e.track.is_some())
            .map(|(_, e)| e.position)
    }
}

impl SceneBackend for SimulatedScene {
    fn open_scene(&mut self, path: &Path) -> Result<(), SceneError> {
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let desc: SceneDescription =
            serde_json::from_str(&text).map_err(|source| SceneError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        self.load(desc)?;
        log::info!(
            "Opened scene {} with {} entities",
            path.display(),
            self.entities.len()
        );
        Ok(())
    }

    fn import_object(&mut self, path: &Path) -> Result<EntityId, SceneError> {
        let mut objects = read_mesh_objects(path)?;
        if objects.len() != 1 {
            return Err(SceneError::ImportAmbiguity {
                path: path.to_path_buf(),
                count: objects.len(),
            });
        }
        let object = objects.remove(0);

        let name = self.unique_name(&object.name);
        let id = EntityId::from_index(self.entities.len());
        self.entities.push(Entity {
            name: name.clone(),
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            radius: object.radius,
            track: None,
        });
        self.by_name.insert(name.clone(), id);

        log::info!(
            "Imported '{}' from {} (radius {:.3})",
            name,
            path.display(),
            object.radius
        );
        Ok(id)
    }

    fn resolve(&self, name: &str) -> Result<EntityId, SceneError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| SceneError::UnknownEntity(name.to_string()))
    }

    fn name(&self, id: EntityId) -> Result<&str, SceneError> {
        Ok(&self.entity(id)?.name)
    }

    fn position(&self, id: EntityId) -> Result<Vector3<f64>, SceneError> {
        Ok(self.entity(id)?.position)
    }

    fn rotation(&self, id: EntityId) -> Result<Vector3<f64>, SceneError> {
        Ok(self.entity(id)?.rotation)
    }

    fn set_position(&mut self, id: EntityId, position: Vector3<f64>) -> Result<(), SceneError> {
        self.entity_mut(id)?.position = position;
        Ok(())
    }

    fn set_rotation(&mut self, id: EntityId, rotation: Vector3<f64>) -> Result<(), SceneError> {
        self.entity_mut(id)?.rotation = rotation;
        Ok(())
    }

    fn add_track_constraint(
        &mut self,
        id: EntityId,
        target: EntityId,
        forward: TrackAxis,
        up: UpAxis,
    ) -> Result<(), SceneError> {
        self.entity(target)?;
        self.entity_mut(id)?.track = Some(TrackConstraint {
            target,
            forward,
            up,
        });
        Ok(())
    }

    fn track_constraint(&self, id: EntityId) -> Result<Option<TrackConstraint>, SceneError> {
        Ok(self.entity(id)?.track)
    }

    fn set_camera(&mut self, id: EntityId, focal_length_mm: f64) -> Result<(), SceneError> {
        self.entity(id)?;
        if !(focal_length_mm.is_finite() && focal_length_mm > 0.0) {
            return Err(SceneError::InvalidRenderSettings(format!(
                "focal length must be positive, got {focal_length_mm} mm"
            )));
        }
        self.camera = Some((id, focal_length_mm));
        Ok(())
    }

    fn configure_render(&mut self, settings: &RenderSettings) -> Result<(), SceneError> {
        if settings.resolution.width == 0 || settings.resolution.height == 0 {
            return Err(SceneError::InvalidRenderSettings(format!(
                "resolution must be non-zero, got {}",
                settings.resolution
            )));
        }
        if settings.samples == 0 {
            return Err(SceneError::InvalidRenderSettings(
                "sample count must be at least 1".to_string(),
            ));
        }
        log::debug!(
            "Render configured: {} {:?} on {:?}, {} samples",
            settings.resolution,
            settings.engine,
            settings.device,
            settings.samples
        );
        self.render = Some(settings.clone());
        Ok(())
    }

    fn render_to(&mut self, stem: &Path) -> Result<PathBuf, SceneError> {
        let settings = self.render.as_ref().ok_or(SceneError::RenderNotConfigured)?;
        let (camera_id, focal_length_mm) = self.camera.ok_or(SceneError::NoActiveCamera)?;
        let camera_entity = self.entity(camera_id)?;

        let camera = PinholeCamera::new(
            camera_entity.position,
            euler_to_rotation(&camera_entity.rotation),
            focal_length_mm,
            settings.resolution.width as usize,
            settings.resolution.height as usize,
        );

        let bodies: Vec<Body> = self
            .entities
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != camera_id.index())
            .map(|(_, e)| Body {
                center: e.position,
                radius: e.radius,
            })
            .collect();

        let frame = rasterize(&camera, &bodies, self.light_position(camera_id));

        let mut file: OsString = stem.as_os_str().to_owned();
        file.push(".");
        file.push(RENDER_EXTENSION);
        let path = PathBuf::from(file);

        save_gray_image(&frame, &path)?;
        self.renders += 1;
        log::debug!("Rendered {}", path.display());
        Ok(path)
    }
}
