//! Mesh file inspection for object import.
//!
//! Only the object structure is read: how many objects a file introduces,
//! their names, and a bounding radius for each. Triangle data is not kept.

use crate::scene::SceneError;
use nalgebra::Vector3;
use std::path::{Path, PathBuf};

/// Radius assigned when a file carries no readable vertex data
pub const DEFAULT_OBJECT_RADIUS: f64 = 1.0;

/// Mesh formats accepted by `import_object`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Fbx,
    Stl,
}

impl MeshFormat {
    /// Pick the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self, SceneError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("obj") => Ok(MeshFormat::Obj),
            Some("fbx") => Ok(MeshFormat::Fbx),
            Some("stl") => Ok(MeshFormat::Stl),
            _ => Err(SceneError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// One object found in a mesh file
#[derive(Debug, Clone, PartialEq)]
pub struct MeshObject {
    pub name: String,
    /// Half the diagonal of the object's vertex bounding box
    pub radius: f64,
}

/// Running axis-aligned extents of a vertex set
#[derive(Debug, Clone, Default)]
struct Extents {
    min: Option<Vector3<f64>>,
    max: Option<Vector3<f64>>,
}

impl Extents {
    fn add(&mut self, v: Vector3<f64>) {
        self.min = Some(self.min.map_or(v, |m| m.inf(&v)));
        self.max = Some(self.max.map_or(v, |m| m.sup(&v)));
    }

    fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    fn radius(&self) -> f64 {
        match (self.min, self.max) {
            (Some(min), Some(max)) if (max - min).norm() > 0.0 => (max - min).norm() / 2.0,
            _ => DEFAULT_OBJECT_RADIUS,
        }
    }
}

fn parse_xyz<'a>(mut fields: impl Iterator<Item = &'a str>) -> Option<Vector3<f64>> {
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;
    let z = fields.next()?.parse().ok()?;
    Some(Vector3::new(x, y, z))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Object".to_string())
}

/// Count the objects introduced by a Wavefront OBJ text.
///
/// Each `o` statement starts an object. Vertices seen before the first `o`
/// statement form an unnamed object called `default_name`; a text without
/// vertices or object statements introduces nothing.
pub fn obj_objects(text: &str, default_name: &str) -> Vec<MeshObject> {
    let mut objects: Vec<(String, Extents)> = Vec::new();
    let mut loose = Extents::default();

    for line in text.lines() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("o") => {
                let name = fields.collect::<Vec<_>>().join(" ");
                let name = if name.is_empty() {
                    default_name.to_string()
                } else {
                    name
                };
                objects.push((name, Extents::default()));
            }
            Some("v") => {
                if let Some(v) = parse_xyz(fields) {
                    match objects.last_mut() {
                        Some((_, extents)) => extents.add(v),
                        None => loose.add(v),
                    }
                }
            }
            _ => {}
        }
    }

    if !loose.is_empty() {
        objects.insert(0, (default_name.to_string(), loose));
    }

    objects
        .into_iter()
        .map(|(name, extents)| MeshObject {
            radius: extents.radius(),
            name,
        })
        .collect()
}

/// Count the `solid` blocks of an ASCII STL text
pub fn ascii_stl_objects(text: &str, default_name: &str) -> Vec<MeshObject> {
    let mut objects: Vec<(String, Extents)> = Vec::new();

    for line in text.lines() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("solid") => {
                let name = fields.collect::<Vec<_>>().join(" ");
                let name = if name.is_empty() {
                    default_name.to_string()
                } else {
                    name
                };
                objects.push((name, Extents::default()));
            }
            Some("vertex") => {
                if let (Some(v), Some((_, extents))) = (parse_xyz(fields), objects.last_mut()) {
                    extents.add(v);
                }
            }
            _ => {}
        }
    }

    objects
        .into_iter()
        .map(|(name, extents)| MeshObject {
            radius: extents.radius(),
            name,
        })
        .collect()
}

/// Binary STL: 80-byte header, triangle count, then 50-byte triangle records
fn binary_stl_radius(bytes: &[u8]) -> f64 {
    let mut extents = Extents::default();
    let body = bytes.get(84..).unwrap_or_default();
    for record in body.chunks_exact(50) {
        // skip the normal, read three vertices
        for corner in record[12..48].chunks_exact(12) {
            let f = |i: usize| {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&corner[i * 4..i * 4 + 4]);
                f32::from_le_bytes(raw) as f64
            };
            let v = Vector3::new(f(0), f(1), f(2));
            if v.iter().all(|c| c.is_finite()) {
                extents.add(v);
            }
        }
    }
    extents.radius()
}

fn looks_like_ascii_stl(bytes: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(bytes).ok()?;
    let trimmed = text.trim_start();
    if trimmed.starts_with("solid") && (text.contains("facet") || text.contains("endsolid")) {
        Some(text)
    } else {
        None
    }
}

/// Read the objects a mesh file would add to the scene
pub fn read_mesh_objects(path: &Path) -> Result<Vec<MeshObject>, SceneError> {
    let format = MeshFormat::from_path(path)?;
    let io_err = |source| SceneError::Io {
        path: PathBuf::from(path),
        source,
    };
    let stem = file_stem(path);

    let objects = match format {
        MeshFormat::Obj => {
            let text = std::fs::read_to_string(path).map_err(io_err)?;
            obj_objects(&text, &stem)
        }
        MeshFormat::Stl => {
            let bytes = std::fs::read(path).map_err(io_err)?;
            match looks_like_ascii_stl(&bytes) {
                Some(text) => ascii_stl_objects(text, &stem),
                None => vec![MeshObject {
                    name: stem,
                    radius: binary_stl_radius(&bytes),
                }],
            }
        }
        MeshFormat::Fbx => {
            // existence check only; the binary node tree is not parsed
            std::fs::metadata(path).map_err(io_err)?;
            vec![MeshObject {
                name: stem,
                radius: DEFAULT_OBJECT_RADIUS,
            }]
        }
    };

    log::debug!(
        "{} ({:?}) contains {} object(s)",
        path.display(),
        format,
        objects.len()
    );
    Ok(objects)
}
