//! Scene backend implementations.
//!
//! [`SimulatedScene`] keeps every entity in memory and renders a placeholder
//! image, which is enough to drive the generator and its tests without an
//! external 3D host.

pub mod import;
pub mod render;
pub mod simulated;

pub use import::{read_mesh_objects, MeshFormat, MeshObject};
pub use simulated::{EntityDescription, SceneDescription, SimulatedScene, RENDER_EXTENSION};
