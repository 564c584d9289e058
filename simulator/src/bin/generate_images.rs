//! Synthetic space imagery generator
//!
//! Loads a scene, imports one object, and renders `--num-images` frames with
//! the object, sun and camera posed procedurally for each frame:
//!
//! 1. Object position (absolute, random box, or relative to another entity)
//! 2. Object rotation (absolute or random)
//! 3. Sun on the ecliptic plane, aimed at the planet (when `--sun-distance` is set)
//! 4. Camera offset from the object (fixed or random spherical shell)
//! 5. Camera rotation (absolute, or tracking the object plus a bounded perturbation)
//!
//! Frames are written as `img{index}.png` with a `poses.csv` ground-truth
//! manifest alongside.
//!
//! Usage:
//! ```
//! cargo run --release --bin generate_images -- scene.json satellite.obj --num-images 10 --seed 7
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::Serialize;
use shared::run_args::{save_cmd_args, seeded_rng, RunArgs};
use simulator::shared_args::{CameraArgs, ObjectPoseArgs, RenderArgs, ShellSamplingArg, SunArgs};
use simulator::sims::{FrameGenerator, FramePlan, SunPlan};
use simulator::{PoseController, SceneBackend, SimulatedScene};
use std::path::PathBuf;

/// Command line arguments for dataset generation
#[derive(Parser, Debug, Serialize)]
#[command(
    name = "generate_images",
    about = "Generate procedurally posed synthetic images of an object in a space scene"
)]
struct Args {
    /// Scene description to load
    scene_path: PathBuf,

    /// Mesh file (.obj, .fbx, .stl) imported as the posed object
    object_path: PathBuf,

    /// Number of frames to render
    #[arg(long, default_value_t = 1000)]
    num_images: usize,

    #[command(flatten)]
    object: ObjectPoseArgs,

    #[command(flatten)]
    camera: CameraArgs,

    #[command(flatten)]
    render: RenderArgs,

    #[command(flatten)]
    sun: SunArgs,

    /// Inclination sampling for random spherical-shell offsets
    #[arg(long, value_enum, default_value_t = ShellSamplingArg::Uniform)]
    shell_sampling: ShellSamplingArg,

    #[command(flatten)]
    run: RunArgs,

    /// Seed actually used, recorded in cmd_args.json
    #[arg(skip)]
    resolved_seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = Args::parse();
    let output_dir = args
        .run
        .prepare_output_dir()
        .with_context(|| format!("creating {}", args.run.output_dir.display()))?
        .to_path_buf();

    let (rng, seed) = seeded_rng(args.run.seed);
    args.resolved_seed = Some(seed);
    if args.run.save_cmd_args {
        save_cmd_args(&args, &output_dir).context("saving command arguments")?;
    }

    let mut scene = SimulatedScene::new();
    scene
        .open_scene(&args.scene_path)
        .context("opening scene")?;
    let object = scene
        .import_object(&args.object_path)
        .context("importing object")?;

    let sampling = args.shell_sampling.into();
    let camera_settings = args.camera.settings();
    let camera = scene
        .resolve(&camera_settings.name)
        .context("resolving camera")?;

    let sun = match args.sun.settings() {
        Some(settings) => Some(SunPlan::resolve(&scene, &settings).context("resolving sun")?),
        None => None,
    };

    let plan = FramePlan {
        object,
        object_position: args.object.position_request(&scene, sampling)?,
        object_rotation: args.object.rotation_request()?,
        camera,
        camera_position: args.camera.position_request(object, sampling)?,
        camera_rotation: args.camera.rotation_request(object)?,
        sun,
    };

    let mut generator = FrameGenerator::new(plan, PoseController::new(rng));
    generator
        .prepare(&mut scene, &camera_settings, &args.render.settings())
        .context("preparing scene")?;

    info!(
        "Rendering {} frame(s) to {} (seed {seed})",
        args.num_images,
        output_dir.display()
    );

    let progress = ProgressBar::new(args.num_images as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let summary = generator
        .run(&mut scene, args.num_images, &output_dir, |record| {
            progress.set_message(format!("img{}", record.frame));
            progress.inc(1);
        })
        .context("generating frames")?;
    progress.finish_with_message("done");

    info!(
        "Wrote {} frame(s) and {}",
        summary.frames,
        summary.manifest.display()
    );
    Ok(())
}
