//! Placeholder rasterizer for the simulated scene backend.
//!
//! Every body with a radius is drawn as a Lambert-shaded sphere impostor
//! projected through an ideal pinhole camera. There is no occlusion test
//! beyond painter's ordering and no physically based lighting.

use nalgebra::{Rotation3, Vector3};
use ndarray::Array2;

/// Full-frame sensor width assumed when converting focal length to pixels
pub const SENSOR_WIDTH_MM: f64 = 36.0;

/// Intensity of surfaces facing away from the light
const AMBIENT: f64 = 0.05;

/// Ideal pinhole camera looking down its local −Z axis with +Y up
#[derive(Debug, Clone)]
pub struct PinholeCamera {
    position: Vector3<f64>,
    /// World-to-camera rotation
    world_to_camera: Rotation3<f64>,
    focal_px: f64,
    width: usize,
    height: usize,
}

impl PinholeCamera {
    pub fn new(
        position: Vector3<f64>,
        orientation: Rotation3<f64>,
        focal_length_mm: f64,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            position,
            world_to_camera: orientation.inverse(),
            focal_px: focal_length_mm / SENSOR_WIDTH_MM * width as f64,
            width,
            height,
        }
    }

    /// World point in camera coordinates
    pub fn to_camera(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.world_to_camera * (world - self.position)
    }

    /// World direction in camera coordinates
    pub fn direction_to_camera(&self, dir: &Vector3<f64>) -> Vector3<f64> {
        self.world_to_camera * dir
    }

    /// Project a camera-space point to pixel coordinates `(x, y)`.
    ///
    /// Returns `None` for points on or behind the image plane.
    pub fn project(&self, cam: &Vector3<f64>) -> Option<(f64, f64)> {
        let depth = -cam.z;
        if depth <= 0.0 {
            return None;
        }
        let cx = self.width as f64 / 2.0;
        let cy = self.height as f64 / 2.0;
        Some((
            cx + self.focal_px * cam.x / depth,
            cy - self.focal_px * cam.y / depth,
        ))
    }
}

/// A sphere to draw
#[derive(Debug, Clone)]
pub struct Body {
    pub center: Vector3<f64>,
    pub radius: f64,
}

/// Rasterize `bodies` lit from `light_position` (or from the camera when `None`).
///
/// Returns a `(height, width)` intensity map in `[0, 1]`.
pub fn rasterize(
    camera: &PinholeCamera,
    bodies: &[Body],
    light_position: Option<Vector3<f64>>,
) -> Array2<f64> {
    let mut frame = Array2::<f64>::zeros((camera.height, camera.width));

    let mut visible: Vec<(f64, &Body, Vector3<f64>)> = bodies
        .iter()
        .filter(|b| b.radius > 0.0)
        .map(|b| {
            let cam = camera.to_camera(&b.center);
            (-cam.z, b, cam)
        })
        .filter(|(depth, b, _)| *depth > b.radius)
        .collect();

    // far to near
    visible.sort_by(|a, b| b.0.total_cmp(&a.0));

    for (depth, body, cam) in visible {
        let Some((px, py)) = camera.project(&cam) else {
            continue;
        };
        let radius_px = camera.focal_px * body.radius / depth;
        if radius_px < 0.5 {
            continue;
        }

        let light = match light_position {
            Some(p) => camera.direction_to_camera(&(p - body.center)),
            None => -cam,
        };
        let light = if light.norm() > 0.0 {
            light.normalize()
        } else {
            Vector3::z()
        };

        let x0 = (px - radius_px).floor().max(0.0) as usize;
        let y0 = (py - radius_px).floor().max(0.0) as usize;
        let x1 = ((px + radius_px).ceil() as i64).clamp(0, camera.width as i64) as usize;
        let y1 = ((py + radius_px).ceil() as i64).clamp(0, camera.height as i64) as usize;

        for y in y0..y1 {
            for x in x0..x1 {
                let u = (x as f64 + 0.5 - px) / radius_px;
                let v = -(y as f64 + 0.5 - py) / radius_px;
                let r2 = u * u + v * v;
                if r2 > 1.0 {
                    continue;
                }
                let normal = Vector3::new(u, v, (1.0 - r2).sqrt());
                let lambert = normal.dot(&light).max(0.0);
                frame[[y, x]] = AMBIENT + (1.0 - AMBIENT) * lambert;
            }
        }
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use shared::algo::rotation::{track_rotation, TrackAxis, UpAxis};

    fn camera_at(position: Vector3<f64>, target: Vector3<f64>) -> PinholeCamera {
        let orientation = track_rotation(&(target - position), TrackAxis::NegZ, UpAxis::Y).unwrap();
        PinholeCamera::new(position, orientation, 50.0, 64, 48)
    }

    #[test]
    fn test_target_projects_to_center() {
        let cam = camera_at(Vector3::new(10.0, 0.0, 5.0), Vector3::new(10.0, 0.0, 0.0));
        let (x, y) = cam
            .project(&cam.to_camera(&Vector3::new(10.0, 0.0, 0.0)))
            .unwrap();
        assert_relative_eq!(x, 32.0, epsilon = 1e-9);
        assert_relative_eq!(y, 24.0, epsilon = 1e-9);
    }

    #[test]
    fn test_point_behind_camera_not_projected() {
        let cam = camera_at(Vector3::zeros(), Vector3::new(0.0, 5.0, 0.0));
        assert!(cam
            .project(&cam.to_camera(&Vector3::new(0.0, -5.0, 0.0)))
            .is_none());
    }

    #[test]
    fn test_body_drawn_at_center_and_lit_from_camera() {
        let cam = camera_at(Vector3::new(0.0, 0.0, 5.0), Vector3::zeros());
        let frame = rasterize(
            &cam,
            &[Body {
                center: Vector3::zeros(),
                radius: 1.0,
            }],
            None,
        );
        assert_eq!(frame.dim(), (48, 64));
        assert!(frame[[24, 32]] > 0.95);
        assert_eq!(frame[[0, 0]], 0.0);
    }

    #[test]
    fn test_body_behind_camera_leaves_black_frame() {
        let cam = camera_at(Vector3::new(0.0, 0.0, 5.0), Vector3::zeros());
        let frame = rasterize(
            &cam,
            &[Body {
                center: Vector3::new(0.0, 0.0, 10.0),
                radius: 1.0,
            }],
            None,
        );
        assert!(frame.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_light_side_is_brighter() {
        let cam = camera_at(Vector3::new(0.0, 0.0, 5.0), Vector3::zeros());
        let frame = rasterize(
            &cam,
            &[Body {
                center: Vector3::zeros(),
                radius: 1.5,
            }],
            Some(Vector3::new(100.0, 0.0, 0.0)),
        );
        let row = 24;
        let lit = frame[[row, 36]];
        let dark = frame[[row, 28]];
        assert!(lit > dark, "lit {lit} dark {dark}");
    }
}
