//! End-to-end generation runs against the simulated scene backend

use approx::assert_relative_eq;
use nalgebra::Vector3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shared::algo::rotation::{TrackAxis, UpAxis};
use shared::algo::sampling::{Bounds3, RadiusRange, ShellSampling};
use simulator::sims::{FrameGenerator, FramePlan, SunPlan, MANIFEST_FILE};
use simulator::{
    CameraSettings, EntityId, FrameState, PoseController, PoseError, PositionRequest, RenderSettings,
    Resolution, RotationRequest, SceneBackend, SceneError, SimulatedScene, SunSettings,
    TrackConstraint,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCENE_JSON: &str = r#"{
  "entities": [
    { "name": "Camera", "position": [0, 0, 10] },
    { "name": "Sun" },
    { "name": "Planet", "position": [0, 0, -500], "radius": 100.0 }
  ]
}"#;

const SATELLITE_OBJ: &str = "\
o Satellite
v -1 -1 -1
v 1 1 1
v 1 -1 0
f 1 2 3
";

fn write_fixtures(dir: &Path) -> (PathBuf, PathBuf) {
    let scene = dir.join("scene.json");
    let object = dir.join("satellite.obj");
    fs::write(&scene, SCENE_JSON).unwrap();
    fs::write(&object, SATELLITE_OBJ).unwrap();
    (scene, object)
}

fn small_render() -> RenderSettings {
    RenderSettings {
        resolution: Resolution::new(64, 48),
        samples: 1,
        ..RenderSettings::default()
    }
}

fn fixed_plan(object: EntityId, camera: EntityId) -> FramePlan {
    FramePlan {
        object,
        object_position: PositionRequest::Absolute(Vector3::new(10.0, 0.0, 0.0)),
        object_rotation: RotationRequest::Absolute(Vector3::zeros()),
        camera,
        camera_position: PositionRequest::RelativeFixed {
            reference: object,
            offset: Vector3::new(0.0, 0.0, 5.0),
        },
        camera_rotation: RotationRequest::TrackThenPerturb {
            target: object,
            perturb: Bounds3::point(Vector3::zeros()).unwrap(),
        },
        sun: None,
    }
}

#[test]
fn test_single_frame_fixed_poses() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let (scene_path, object_path) = write_fixtures(dir.path());
    let output = dir.path().join("out");

    let mut scene = SimulatedScene::new();
    scene.open_scene(&scene_path).unwrap();
    let object = scene.import_object(&object_path).unwrap();
    let camera = scene.resolve("Camera").unwrap();
    assert_eq!(scene.name(object).unwrap(), "Satellite");

    let mut generator = FrameGenerator::new(
        fixed_plan(object, camera),
        PoseController::new(ChaCha8Rng::seed_from_u64(0)),
    );
    generator
        .prepare(&mut scene, &CameraSettings::default(), &small_render())
        .unwrap();

    let mut records = Vec::new();
    let summary = generator
        .run(&mut scene, 1, &output, |r| records.push(r.clone()))
        .unwrap();

    assert_eq!(summary.frames, 1);
    assert_eq!(generator.state(), FrameState::Done { frames: 1 });
    assert_eq!(scene.render_count(), 1);

    let image = output.join("img0.png");
    assert!(image.is_file());
    assert!(!output.join("img1.png").exists());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].image, image);

    assert_eq!(
        scene.position(object).unwrap(),
        Vector3::new(10.0, 0.0, 0.0)
    );
    assert_eq!(
        scene.position(camera).unwrap(),
        Vector3::new(10.0, 0.0, 5.0)
    );
    // camera directly above the object, so tracking leaves it unrotated
    let rotation = scene.rotation(camera).unwrap();
    for i in 0..3 {
        assert_relative_eq!(rotation[i], 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_tracked_object_is_centered_in_render() {
    let dir = TempDir::new().unwrap();
    let (scene_path, object_path) = write_fixtures(dir.path());

    let mut scene = SimulatedScene::new();
    scene.open_scene(&scene_path).unwrap();
    let object = scene.import_object(&object_path).unwrap();
    let camera = scene.resolve("Camera").unwrap();

    let mut plan = fixed_plan(object, camera);
    plan.camera_position = PositionRequest::RelativeFixed {
        reference: object,
        offset: Vector3::new(3.0, -4.0, 6.0),
    };
    let mut generator = FrameGenerator::new(plan, PoseController::new(ChaCha8Rng::seed_from_u64(1)));
    generator
        .prepare(&mut scene, &CameraSettings::default(), &small_render())
        .unwrap();
    generator.run(&mut scene, 1, dir.path(), |_| {}).unwrap();

    let frame = dir.path().join("img0.png");
    fs::copy(&frame, test_helpers::output_path("simulated_tracked_frame.png")).unwrap();

    let img = image::open(&frame).unwrap().to_luma8();
    assert_eq!(img.dimensions(), (64, 48));
    let center = img.get_pixel(32, 24)[0];
    let corner = img.get_pixel(0, 0)[0];
    assert!(center > corner, "center {center}, corner {corner}");
}

#[test]
fn test_manifest_rows_match_frames() {
    let dir = TempDir::new().unwrap();
    let (scene_path, object_path) = write_fixtures(dir.path());

    let mut scene = SimulatedScene::new();
    scene.open_scene(&scene_path).unwrap();
    let object = scene.import_object(&object_path).unwrap();
    let camera = scene.resolve("Camera").unwrap();

    let sun = SunPlan::resolve(&scene, &SunSettings::new("Sun", "Planet", 1000.0)).unwrap();
    let plan = FramePlan {
        object_position: PositionRequest::RandomBox(Bounds3::uniform(25.0, 50.0).unwrap()),
        object_rotation: RotationRequest::RandomBox(
            Bounds3::uniform(0.0, std::f64::consts::TAU).unwrap(),
        ),
        camera_position: PositionRequest::RelativeRandom {
            reference: object,
            radii: RadiusRange::new(5.0, 10.0).unwrap(),
            sampling: ShellSampling::AreaUniform,
        },
        sun: Some(sun),
        ..fixed_plan(object, camera)
    };

    let mut generator = FrameGenerator::new(plan, PoseController::new(ChaCha8Rng::seed_from_u64(3)));
    generator
        .prepare(&mut scene, &CameraSettings::default(), &small_render())
        .unwrap();

    let mut records = Vec::new();
    let summary = generator
        .run(&mut scene, 3, dir.path(), |r| records.push(r.clone()))
        .unwrap();
    assert_eq!(summary.manifest, dir.path().join(MANIFEST_FILE));

    let mut reader = csv::Reader::from_path(&summary.manifest).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "frame");
    assert_eq!(&headers[1], "image");
    assert_eq!(headers.len(), 17);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    for (i, (row, record)) in rows.iter().zip(&records).enumerate() {
        assert_eq!(row[0].parse::<usize>().unwrap(), i);
        assert_eq!(&row[1], format!("img{i}.png"));

        let object_x: f64 = row[2].parse().unwrap();
        assert_relative_eq!(object_x, record.object_position.x, max_relative = 1e-12);
        assert!((25.0..=50.0).contains(&object_x));

        let camera_offset = record.camera_position - record.object_position;
        assert!((5.0 - 1e-9..=10.0 + 1e-9).contains(&camera_offset.norm()));

        let sun = record.sun_position.unwrap();
        assert_eq!(sun.z, 0.0);
        let sun_z: f64 = row[16].parse().unwrap();
        assert_eq!(sun_z, 0.0);
        assert!(dir.path().join(format!("img{i}.png")).is_file());
    }
}

#[test]
fn test_same_seed_same_poses() {
    let run = |seed: u64| {
        let dir = TempDir::new().unwrap();
        let (scene_path, object_path) = write_fixtures(dir.path());
        let mut scene = SimulatedScene::new();
        scene.open_scene(&scene_path).unwrap();
        let object = scene.import_object(&object_path).unwrap();
        let camera = scene.resolve("Camera").unwrap();

        let plan = FramePlan {
            object_position: PositionRequest::RandomBox(Bounds3::uniform(25.0, 50.0).unwrap()),
            camera_rotation: RotationRequest::TrackThenPerturb {
                target: object,
                perturb: Bounds3::uniform(-0.05, 0.05).unwrap(),
            },
            ..fixed_plan(object, camera)
        };
        let mut generator =
            FrameGenerator::new(plan, PoseController::new(ChaCha8Rng::seed_from_u64(seed)));
        generator
            .prepare(&mut scene, &CameraSettings::default(), &small_render())
            .unwrap();
        let mut records = Vec::new();
        generator
            .run(&mut scene, 4, dir.path(), |r| {
                records.push((r.object_position, r.camera_rotation))
            })
            .unwrap();
        records
    };

    assert_eq!(run(11), run(11));
    assert_ne!(run(11), run(12));
}

#[test]
fn test_zero_frames_renders_nothing() {
    let dir = TempDir::new().unwrap();
    let (scene_path, object_path) = write_fixtures(dir.path());
    let mut scene = SimulatedScene::new();
    scene.open_scene(&scene_path).unwrap();
    let object = scene.import_object(&object_path).unwrap();
    let camera = scene.resolve("Camera").unwrap();

    let mut generator = FrameGenerator::new(
        fixed_plan(object, camera),
        PoseController::new(ChaCha8Rng::seed_from_u64(0)),
    );
    generator
        .prepare(&mut scene, &CameraSettings::default(), &small_render())
        .unwrap();
    let summary = generator.run(&mut scene, 0, dir.path(), |_| {}).unwrap();

    assert_eq!(summary.frames, 0);
    assert_eq!(generator.state(), FrameState::Done { frames: 0 });
    assert_eq!(scene.render_count(), 0);
    assert!(!dir.path().join("img0.png").exists());
}

#[test]
fn test_importing_second_copy_gets_suffixed_name() {
    let dir = TempDir::new().unwrap();
    let (scene_path, object_path) = write_fixtures(dir.path());
    let mut scene = SimulatedScene::new();
    scene.open_scene(&scene_path).unwrap();

    let first = scene.import_object(&object_path).unwrap();
    let second = scene.import_object(&object_path).unwrap();
    assert_ne!(first, second);
    assert_eq!(scene.name(second).unwrap(), "Satellite.001");
}

/// Scene backend that forwards to [`SimulatedScene`] and logs every mutation
struct RecordingScene {
    inner: SimulatedScene,
    calls: Vec<String>,
}

impl RecordingScene {
    fn record(&mut self, op: &str, id: EntityId) {
        let name = self.inner.name(id).unwrap_or("?").to_string();
        self.calls.push(format!("{op} {name}"));
    }
}

impl SceneBackend for RecordingScene {
    fn open_scene(&mut self, path: &Path) -> Result<(), SceneError> {
        self.inner.open_scene(path)
    }

    fn import_object(&mut self, path: &Path) -> Result<EntityId, SceneError> {
        self.inner.import_object(path)
    }

    fn resolve(&self, name: &str) -> Result<EntityId, SceneError> {
        self.inner.resolve(name)
    }

    fn name(&self, id: EntityId) -> Result<&str, SceneError> {
        self.inner.name(id)
    }

    fn position(&self, id: EntityId) -> Result<Vector3<f64>, SceneError> {
        self.inner.position(id)
    }

    fn rotation(&self, id: EntityId) -> Result<Vector3<f64>, SceneError> {
        self.inner.rotation(id)
    }

    fn set_position(&mut self, id: EntityId, position: Vector3<f64>) -> Result<(), SceneError> {
        self.record("position", id);
        self.inner.set_position(id, position)
    }

    fn set_rotation(&mut self, id: EntityId, rotation: Vector3<f64>) -> Result<(), SceneError> {
        self.record("rotation", id);
        self.inner.set_rotation(id, rotation)
    }

    fn add_track_constraint(
        &mut self,
        id: EntityId,
        target: EntityId,
        forward: TrackAxis,
        up: UpAxis,
    ) -> Result<(), SceneError> {
        self.record("track", id);
        self.inner.add_track_constraint(id, target, forward, up)
    }

    fn track_constraint(&self, id: EntityId) -> Result<Option<TrackConstraint>, SceneError> {
        self.inner.track_constraint(id)
    }

    fn set_camera(&mut self, id: EntityId, focal_length_mm: f64) -> Result<(), SceneError> {
        self.record("camera", id);
        self.inner.set_camera(id, focal_length_mm)
    }

    fn configure_render(&mut self, settings: &RenderSettings) -> Result<(), SceneError> {
        self.calls.push("configure".to_string());
        self.inner.configure_render(settings)
    }

    fn render_to(&mut self, stem: &Path) -> Result<PathBuf, SceneError> {
        let path = self.inner.render_to(stem)?;
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.push(format!("render {file}"));
        Ok(path)
    }
}

#[test]
fn test_pose_order_per_frame() {
    let dir = TempDir::new().unwrap();
    let (scene_path, object_path) = write_fixtures(dir.path());

    let mut scene = RecordingScene {
        inner: SimulatedScene::new(),
        calls: Vec::new(),
    };
    scene.open_scene(&scene_path).unwrap();
    let object = scene.import_object(&object_path).unwrap();
    let camera = scene.resolve("Camera").unwrap();
    let sun = SunPlan::resolve(&scene, &SunSettings::new("Sun", "Planet", 800.0)).unwrap();

    let plan = FramePlan {
        sun: Some(sun),
        ..fixed_plan(object, camera)
    };
    let mut generator = FrameGenerator::new(plan, PoseController::new(ChaCha8Rng::seed_from_u64(5)));
    generator
        .prepare(&mut scene, &CameraSettings::default(), &small_render())
        .unwrap();
    assert_eq!(
        scene.calls,
        vec!["camera Camera", "track Camera", "track Sun", "configure"]
    );

    scene.calls.clear();
    generator.run(&mut scene, 2, dir.path(), |_| {}).unwrap();

    let frame = |i: usize| {
        vec![
            "position Satellite".to_string(),
            "rotation Satellite".to_string(),
            "position Sun".to_string(),
            "rotation Sun".to_string(),
            "position Camera".to_string(),
            "rotation Camera".to_string(),
            format!("render img{i}.png"),
        ]
    };
    let expected: Vec<String> = frame(0).into_iter().chain(frame(1)).collect();
    assert_eq!(scene.calls, expected);
}

#[test]
fn test_sun_without_planet_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    let (scene_path, _) = write_fixtures(dir.path());
    let mut scene = SimulatedScene::new();
    scene.open_scene(&scene_path).unwrap();

    let err = SunPlan::resolve(&scene, &SunSettings::new("Sun", "Jupiter", 10.0)).unwrap_err();
    assert!(matches!(
        err,
        PoseError::Scene(SceneError::UnknownEntity(ref name)) if name == "Jupiter"
    ));
}

fn recording_scene(dir: &Path) -> (RecordingScene, EntityId, EntityId) {
    let (scene_path, object_path) = write_fixtures(dir);
    let mut scene = RecordingScene {
        inner: SimulatedScene::new(),
        calls: Vec::new(),
    };
    scene.open_scene(&scene_path).unwrap();
    let object = scene.import_object(&object_path).unwrap();
    let camera = scene.resolve("Camera").unwrap();
    (scene, object, camera)
}

fn relative_to(reference: EntityId) -> PositionRequest {
    PositionRequest::RelativeFixed {
        reference,
        offset: Vector3::new(0.0, 0.0, -20.0),
    }
}

#[test]
fn test_object_relative_to_later_entities_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (mut scene, object, camera) = recording_scene(dir.path());
    let sun = SunPlan::resolve(&scene, &SunSettings::new("Sun", "Planet", 800.0)).unwrap();
    let sun_id = sun.sun;

    for (reference, expected) in [(camera, "Camera"), (object, "Satellite"), (sun_id, "Sun")] {
        let plan = FramePlan {
            object_position: relative_to(reference),
            sun: Some(sun.clone()),
            ..fixed_plan(object, camera)
        };
        let mut generator =
            FrameGenerator::new(plan, PoseController::new(ChaCha8Rng::seed_from_u64(0)));

        let err = generator
            .prepare(&mut scene, &CameraSettings::default(), &small_render())
            .unwrap_err();
        assert!(err.to_string().contains(expected), "{err}");

        let out = dir.path().join("out");
        let err = generator.run(&mut scene, 4, &out, |_| {}).unwrap_err();
        assert!(matches!(
            err,
            simulator::FrameError::Pose(PoseError::PosedOutOfOrder {
                group: "object position",
                ..
            })
        ));
        assert!(scene.calls.is_empty(), "{:?}", scene.calls);
        assert!(!out.exists());
    }
}

#[test]
fn test_object_relative_to_static_entity_keeps_fixed_pose() {
    let dir = TempDir::new().unwrap();
    let (mut scene, object, camera) = recording_scene(dir.path());
    let planet = scene.resolve("Planet").unwrap();

    let plan = FramePlan {
        object_position: relative_to(planet),
        ..fixed_plan(object, camera)
    };
    let mut generator = FrameGenerator::new(plan, PoseController::new(ChaCha8Rng::seed_from_u64(0)));
    generator
        .prepare(&mut scene, &CameraSettings::default(), &small_render())
        .unwrap();

    let mut heights = Vec::new();
    generator
        .run(&mut scene, 4, dir.path(), |r| heights.push(r.object_position.z))
        .unwrap();
    assert_eq!(heights, vec![-520.0; 4]);
}

#[test]
fn test_sun_aimed_at_camera_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (mut scene, object, camera) = recording_scene(dir.path());
    let sun = SunPlan::resolve(&scene, &SunSettings::new("Sun", "Camera", 800.0)).unwrap();

    let plan = FramePlan {
        sun: Some(sun),
        ..fixed_plan(object, camera)
    };
    let generator = FrameGenerator::new(plan, PoseController::new(ChaCha8Rng::seed_from_u64(0)));
    let err = generator
        .prepare(&mut scene, &CameraSettings::default(), &small_render())
        .unwrap_err();
    assert!(matches!(
        err,
        simulator::FrameError::Pose(PoseError::PosedOutOfOrder {
            group: "sun rotation",
            ..
        })
    ));
    assert!(scene.calls.is_empty());
}

#[test]
fn test_camera_cannot_be_the_object() {
    let dir = TempDir::new().unwrap();
    let (mut scene, object, _) = recording_scene(dir.path());

    let plan = FramePlan {
        camera_position: PositionRequest::Absolute(Vector3::new(0.0, 0.0, 5.0)),
        ..fixed_plan(object, object)
    };
    let generator = FrameGenerator::new(plan, PoseController::new(ChaCha8Rng::seed_from_u64(0)));
    let err = generator
        .prepare(&mut scene, &CameraSettings::default(), &small_render())
        .unwrap_err();
    assert!(matches!(
        err,
        simulator::FrameError::Pose(PoseError::SharedEntity { .. })
    ));
}

#[test]
fn test_invalid_sun_distance_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    let (scene_path, _) = write_fixtures(dir.path());
    let mut scene = SimulatedScene::new();
    scene.open_scene(&scene_path).unwrap();

    for distance in [-1.0, f64::NAN, f64::INFINITY] {
        let err = SunPlan::resolve(&scene, &SunSettings::new("Sun", "Planet", distance))
            .unwrap_err();
        assert!(matches!(err, PoseError::InvalidSunDistance(_)), "{err}");
    }
    assert!(SunPlan::resolve(&scene, &SunSettings::new("Sun", "Planet", 0.0)).is_ok());
}
