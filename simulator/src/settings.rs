//! Per-run configuration bundles for camera, renderer and sun.
//!
//! Each run builds its own values from parsed options; nothing here is a
//! shared static default.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use shared::algo::rotation::{TrackAxis, UpAxis};
use std::fmt;
use std::str::FromStr;

/// Render engine requested from the scene host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum RenderEngine {
    #[default]
    Cycles,
    Eevee,
    Workbench,
}

/// Compute device requested from the scene host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum RenderDevice {
    #[default]
    Cpu,
    Gpu,
}

/// Output image size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl FromStr for Resolution {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `1920x1080`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("Resolution must be in format 'WIDTHxHEIGHT', got '{s}'"))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("Invalid width '{}'", w.trim()))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("Invalid height '{}'", h.trim()))?;
        if width == 0 || height == 0 {
            return Err(format!("Resolution must be non-zero, got {width}x{height}"));
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Renderer configuration applied once at scene setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub resolution: Resolution,
    pub engine: RenderEngine,
    /// Samples per pixel
    pub samples: u32,
    pub device: RenderDevice,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            engine: RenderEngine::default(),
            samples: 128,
            device: RenderDevice::default(),
        }
    }
}

/// Camera entity, lens and tracking axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub name: String,
    pub focal_length_mm: f64,
    /// Local axis aimed at the tracked object
    pub track_axis: TrackAxis,
    /// Local axis kept toward world up while tracking
    pub up_axis: UpAxis,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            name: "Camera".to_string(),
            focal_length_mm: 50.0,
            track_axis: TrackAxis::NegZ,
            up_axis: UpAxis::Y,
        }
    }
}

/// Sun light placed on the ecliptic and aimed at a planet entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunSettings {
    pub name: String,
    pub planet_name: String,
    /// Standoff distance from the origin along the ecliptic plane
    pub distance: f64,
    pub track_axis: TrackAxis,
    pub up_axis: UpAxis,
}

impl SunSettings {
    pub fn new(name: impl Into<String>, planet_name: impl Into<String>, distance: f64) -> Self {
        Self {
            name: name.into(),
            planet_name: planet_name.into(),
            distance,
            track_axis: TrackAxis::NegZ,
            up_axis: UpAxis::Y,
        }
    }
}
