//! Procedural pose sampling and frame generation for synthetic space imagery
//!
//! This crate poses an object, a camera and an optional sun inside a scene
//! backend and renders one image per frame. The backend is a trait so the
//! same loop can drive any 3D host; [`backend::SimulatedScene`] is the
//! in-memory implementation used by the binary and the tests.

pub mod backend;
pub mod pose;
pub mod pose_controller;
pub mod scene;
pub mod settings;
pub mod shared_args;
pub mod sims;

// Re-exports for easier access
pub use backend::SimulatedScene;
pub use pose::{PoseError, PositionRequest, RotationRequest};
pub use pose_controller::PoseController;
pub use scene::{EntityId, SceneBackend, SceneError, TrackConstraint};
pub use settings::{
    CameraSettings, RenderDevice, RenderEngine, RenderSettings, Resolution, SunSettings,
};
pub use sims::{FrameError, FrameGenerator, FramePlan, FrameRecord, FrameState, SunPlan};
