//! Applies pose requests to scene entities.
//!
//! The controller owns the run's single random generator; the scene is passed
//! in explicitly on every call. Each method mutates exactly one entity and
//! returns the value it wrote so callers can log or record it.

use crate::pose::{PoseError, PositionRequest, RotationRequest};
use crate::scene::{EntityId, SceneBackend};
use log::debug;
use nalgebra::Vector3;
use rand_chacha::ChaCha8Rng;
use shared::algo::rotation::{perturb_euler, track_euler};
use shared::algo::sampling::{
    ecliptic_position, sample_angle, sample_box, sample_spherical_shell, Bounds3,
};

/// Resolves pose requests into concrete positions and rotations
#[derive(Debug, Clone)]
pub struct PoseController {
    rng: ChaCha8Rng,
}

impl PoseController {
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self { rng }
    }

    /// Resolve `request` and write the result as the position of `entity`.
    ///
    /// Relative requests read the reference entity's position as it stands
    /// now, so the reference must already be posed for this frame.
    pub fn place<S: SceneBackend + ?Sized>(
        &mut self,
        scene: &mut S,
        entity: EntityId,
        request: &PositionRequest,
    ) -> Result<Vector3<f64>, PoseError> {
        let position = match request {
            PositionRequest::Absolute(v) => *v,
            PositionRequest::RandomBox(bounds) => sample_box(&mut self.rng, bounds),
            PositionRequest::RelativeFixed { reference, offset } => {
                scene.position(*reference)? + offset
            }
            PositionRequest::RelativeRandom {
                reference,
                radii,
                sampling,
            } => {
                let base = scene.position(*reference)?;
                base + sample_spherical_shell(&mut self.rng, radii, *sampling)
            }
        };

        scene.set_position(entity, position)?;
        debug!(
            "{} position -> ({:.4}, {:.4}, {:.4})",
            scene.name(entity)?,
            position.x,
            position.y,
            position.z
        );
        Ok(position)
    }

    /// Resolve `request` and write the result as the rotation of `entity`.
    ///
    /// Tracking requests need a track constraint toward the same target,
    /// registered on `entity` at scene setup. The perturbation is added after
    /// the tracked orientation is computed: `x + dx, y + dy, z - dz`.
    pub fn orient<S: SceneBackend + ?Sized>(
        &mut self,
        scene: &mut S,
        entity: EntityId,
        request: &RotationRequest,
    ) -> Result<Vector3<f64>, PoseError> {
        let rotation = match request {
            RotationRequest::Absolute(v) => *v,
            RotationRequest::RandomBox(bounds) => sample_box(&mut self.rng, bounds),
            RotationRequest::TrackThenPerturb { target, perturb } => {
                let tracked = self.tracked_rotation(scene, entity, *target)?;
                let delta = sample_box(&mut self.rng, perturb);
                perturb_euler(&tracked, &delta)
            }
        };

        scene.set_rotation(entity, rotation)?;
        debug!(
            "{} rotation -> ({:.4}, {:.4}, {:.4})",
            scene.name(entity)?,
            rotation.x,
            rotation.y,
            rotation.z
        );
        Ok(rotation)
    }

    /// Euler angles that satisfy the track constraint of `entity` toward `target`
    pub fn tracked_rotation<S: SceneBackend + ?Sized>(
        &self,
        scene: &S,
        entity: EntityId,
        target: EntityId,
    ) -> Result<Vector3<f64>, PoseError> {
        let constraint = scene
            .track_constraint(entity)?
            .filter(|c| c.target == target);
        let Some(constraint) = constraint else {
            return Err(PoseError::MissingTrackConstraint {
                entity: scene.name(entity)?.to_string(),
                target: scene.name(target)?.to_string(),
            });
        };

        let from = scene.position(entity)?;
        let to = scene.position(target)?;
        Ok(track_euler(&from, &to, constraint.forward, constraint.up)?)
    }

    /// Put the sun on the ecliptic plane at `distance` with a random angle and
    /// aim it at `planet` without perturbation.
    pub fn place_sun<S: SceneBackend + ?Sized>(
        &mut self,
        scene: &mut S,
        sun: EntityId,
        planet: EntityId,
        distance: f64,
    ) -> Result<Vector3<f64>, PoseError> {
        let angle = sample_angle(&mut self.rng);
        let position = ecliptic_position(distance, angle);
        self.place(scene, sun, &PositionRequest::Absolute(position))?;

        let aim = RotationRequest::TrackThenPerturb {
            target: planet,
            perturb: Bounds3::point(Vector3::zeros())
                .map_err(|source| PoseError::InvalidBounds {
                    group: "sun rotation",
                    source,
                })?,
        };
        self.orient(scene, sun, &aim)?;
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{EntityDescription, SceneDescription, SimulatedScene};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use shared::algo::rotation::{euler_to_rotation, TrackAxis, UpAxis};
    use shared::algo::sampling::{RadiusRange, ShellSampling};

    fn entity(name: &str, position: [f64; 3]) -> EntityDescription {
        EntityDescription {
            name: name.into(),
            position,
            rotation: [0.0; 3],
            radius: 0.0,
        }
    }

    fn scene() -> (SimulatedScene, EntityId, EntityId, EntityId, EntityId) {
        let scene = SimulatedScene::from_description(SceneDescription {
            entities: vec![
                entity("Object", [0.0; 3]),
                entity("Camera", [0.0, 0.0, 10.0]),
                entity("Sun", [0.0; 3]),
                entity("Planet", [0.0; 3]),
            ],
        })
        .unwrap();
        let ids = ["Object", "Camera", "Sun", "Planet"].map(|n| scene.resolve(n).unwrap());
        (scene, ids[0], ids[1], ids[2], ids[3])
    }

    fn controller(seed: u64) -> PoseController {
        PoseController::new(ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_absolute_and_relative_fixed() {
        let (mut scene, object, camera, _, _) = scene();
        let mut poses = controller(0);

        poses
            .place(
                &mut scene,
                object,
                &PositionRequest::Absolute(Vector3::new(10.0, 0.0, 0.0)),
            )
            .unwrap();
        let cam = poses
            .place(
                &mut scene,
                camera,
                &PositionRequest::RelativeFixed {
                    reference: object,
                    offset: Vector3::new(0.0, 0.0, 5.0),
                },
            )
            .unwrap();

        assert_eq!(cam, Vector3::new(10.0, 0.0, 5.0));
        assert_eq!(scene.position(camera).unwrap(), cam);
    }

    #[test]
    fn test_relative_random_uses_current_reference_position() {
        let (mut scene, object, camera, _, _) = scene();
        let mut poses = controller(4);
        let request = PositionRequest::RelativeRandom {
            reference: object,
            radii: RadiusRange::new(5.0, 10.0).unwrap(),
            sampling: ShellSampling::AreaUniform,
        };

        for i in 0..200 {
            let base = Vector3::new(i as f64, -3.0 * i as f64, 40.0);
            scene.set_position(object, base).unwrap();
            let cam = poses.place(&mut scene, camera, &request).unwrap();
            let dist = (cam - base).norm();
            assert!((5.0 - 1e-9..=10.0 + 1e-9).contains(&dist), "distance {dist}");
        }
    }

    #[test]
    fn test_random_box_reproducible_by_seed() {
        let (mut a, object, ..) = scene();
        let (mut b, ..) = scene();
        let request = PositionRequest::RandomBox(Bounds3::uniform(25.0, 50.0).unwrap());

        let mut pa = controller(123);
        let mut pb = controller(123);
        for _ in 0..50 {
            assert_eq!(
                pa.place(&mut a, object, &request).unwrap(),
                pb.place(&mut b, object, &request).unwrap()
            );
        }
    }

    #[test]
    fn test_zero_perturbation_equals_tracked_rotation() {
        let (mut scene, object, camera, _, _) = scene();
        scene
            .add_track_constraint(camera, object, TrackAxis::NegZ, UpAxis::Y)
            .unwrap();
        scene.set_position(object, Vector3::new(10.0, 0.0, 0.0)).unwrap();
        scene.set_position(camera, Vector3::new(13.0, 4.0, 5.0)).unwrap();

        let mut poses = controller(9);
        let expected = poses.tracked_rotation(&scene, camera, object).unwrap();
        let request = RotationRequest::TrackThenPerturb {
            target: object,
            perturb: Bounds3::point(Vector3::zeros()).unwrap(),
        };
        let rotation = poses.orient(&mut scene, camera, &request).unwrap();

        assert_eq!(rotation, expected);
        let forward = euler_to_rotation(&rotation) * -Vector3::z();
        let to_target = (Vector3::new(10.0, 0.0, 0.0) - Vector3::new(13.0, 4.0, 5.0)).normalize();
        for i in 0..3 {
            assert_relative_eq!(forward[i], to_target[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_perturbation_subtracts_z() {
        let (mut scene, object, camera, _, _) = scene();
        scene
            .add_track_constraint(camera, object, TrackAxis::NegZ, UpAxis::Y)
            .unwrap();
        scene.set_position(camera, Vector3::new(3.0, 2.0, 8.0)).unwrap();

        let mut poses = controller(1);
        let tracked = poses.tracked_rotation(&scene, camera, object).unwrap();
        let delta = Vector3::new(0.01, 0.02, 0.03);
        let request = RotationRequest::TrackThenPerturb {
            target: object,
            perturb: Bounds3::point(delta).unwrap(),
        };
        let rotation = poses.orient(&mut scene, camera, &request).unwrap();

        assert_relative_eq!(rotation.x, tracked.x + 0.01);
        assert_relative_eq!(rotation.y, tracked.y + 0.02);
        assert_relative_eq!(rotation.z, tracked.z - 0.03);
    }

    #[test]
    fn test_tracking_without_constraint_fails() {
        let (mut scene, object, camera, _, planet) = scene();
        let mut poses = controller(2);
        let request = RotationRequest::TrackThenPerturb {
            target: object,
            perturb: Bounds3::point(Vector3::zeros()).unwrap(),
        };
        let err = poses.orient(&mut scene, camera, &request).unwrap_err();
        assert!(matches!(err, PoseError::MissingTrackConstraint { .. }));

        // constraint toward a different target does not count
        scene
            .add_track_constraint(camera, planet, TrackAxis::NegZ, UpAxis::Y)
            .unwrap();
        let err = poses.orient(&mut scene, camera, &request).unwrap_err();
        assert!(err.to_string().contains("'Camera'"));
        assert!(err.to_string().contains("'Object'"));
    }

    #[test]
    fn test_sun_on_ecliptic_aimed_at_planet() {
        let (mut scene, _, _, sun, planet) = scene();
        scene.set_position(planet, Vector3::new(0.0, 0.0, 0.0)).unwrap();
        scene
            .add_track_constraint(sun, planet, TrackAxis::NegZ, UpAxis::Y)
            .unwrap();

        let mut poses = controller(77);
        for _ in 0..100 {
            let p = poses.place_sun(&mut scene, sun, planet, 1000.0).unwrap();
            assert_eq!(p.z, 0.0);
            assert_relative_eq!(p.norm(), 1000.0, max_relative = 1e-12);

            let aim = euler_to_rotation(&scene.rotation(sun).unwrap()) * -Vector3::z();
            let expected = -p.normalize();
            for i in 0..3 {
                assert_relative_eq!(aim[i], expected[i], epsilon = 1e-9);
            }
        }
    }
}
