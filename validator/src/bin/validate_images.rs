//! Synthetic image validator
//!
//! Scores a directory of synthetic images against a directory of reference
//! images with SSIM and writes the score table to the output directory
//! (`ssims.csv` for index-aligned pairing, `ssims_best_match.csv` for the
//! exhaustive best-match search).
//!
//! Usage:
//! ```
//! cargo run --release --bin validate_images -- synth/ real/ --calc-ssim best-match --ssim-hist --seed 3
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::Serialize;
use shared::run_args::{save_cmd_args, seeded_rng, RunArgs};
use std::path::PathBuf;
use validator::{
    summary_line, write_image_histogram, BoxplotSink, GrayscaleMode, HistogramSink, ImageCorpus,
    ImageHistogramOptions, PairingStrategy, ScoreSink, SsimParams,
};

/// Command line arguments for corpus validation
#[derive(Parser, Debug, Serialize)]
#[command(
    name = "validate_images",
    about = "Compare synthetic images against reference images using SSIM"
)]
struct Args {
    /// Directory of synthetic images
    synthetic_dir: PathBuf,

    /// Directory of reference images
    reference_dir: PathBuf,

    /// Convert synthetic images to grayscale before scoring
    #[arg(long, default_value_t = false)]
    grayscale_synth: bool,

    /// Convert reference images to grayscale before scoring
    #[arg(long, default_value_t = false)]
    grayscale_ref: bool,

    /// Pairing strategy
    #[arg(long, value_enum, default_value_t = PairingStrategy::Standard)]
    calc_ssim: PairingStrategy,

    /// Write an ASCII histogram of the scores
    #[arg(long, default_value_t = false)]
    ssim_hist: bool,

    /// Write an ASCII boxplot of the scores
    #[arg(long, default_value_t = false)]
    ssim_boxplot: bool,

    /// Write a 256-bin pixel-intensity histogram of this image to img_hist.txt
    #[arg(long)]
    img_hist: Option<PathBuf>,

    /// Count every color channel in the intensity histogram instead of luminance
    #[arg(long, default_value_t = false)]
    img_hist_color: bool,

    /// Use linear instead of log10 bar lengths in the intensity histogram
    #[arg(long, default_value_t = false)]
    img_hist_linear: bool,

    /// Randomly choose this many images from each directory
    #[arg(long)]
    use_n_rand_imgs: Option<usize>,

    /// Side length of the square SSIM window (odd, at least 3)
    #[arg(long, default_value_t = 7)]
    window_size: usize,

    #[command(flatten)]
    run: RunArgs,

    /// Seed actually used, recorded in cmd_args.json
    #[arg(skip)]
    resolved_seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = Args::parse();
    let params = SsimParams::with_window(args.window_size).context("invalid --window-size")?;
    let output_dir = args
        .run
        .prepare_output_dir()
        .with_context(|| format!("creating {}", args.run.output_dir.display()))?
        .to_path_buf();

    let (mut rng, seed) = seeded_rng(args.run.seed);
    args.resolved_seed = Some(seed);
    if args.run.save_cmd_args {
        save_cmd_args(&args, &output_dir).context("saving command arguments")?;
    }

    let strategy = args.calc_ssim;
    let synthetic_paths = ImageCorpus::select(&args.synthetic_dir, args.use_n_rand_imgs, &mut rng)
        .context("listing synthetic images")?;
    let reference_paths = ImageCorpus::select(&args.reference_dir, args.use_n_rand_imgs, &mut rng)
        .context("listing reference images")?;
    strategy.check_sizes(synthetic_paths.len(), reference_paths.len())?;

    let synthetic = ImageCorpus::decode(&args.synthetic_dir, &synthetic_paths)
        .context("loading synthetic images")?;
    let reference = ImageCorpus::decode(&args.reference_dir, &reference_paths)
        .context("loading reference images")?;

    if let Some(image) = &args.img_hist {
        let options = ImageHistogramOptions {
            grayscale: !args.img_hist_color,
            log_scale: !args.img_hist_linear,
            ..ImageHistogramOptions::default()
        };
        write_image_histogram(image, &options, &output_dir)
            .with_context(|| format!("writing intensity histogram of {}", image.display()))?;
    }

    let mode = GrayscaleMode::from_flags(args.grayscale_synth, args.grayscale_ref);

    let progress = ProgressBar::new(strategy.work(&synthetic, &reference) as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let table = strategy
        .run(&synthetic, &reference, mode, &params, || progress.inc(1))
        .context("scoring images")?;
    progress.finish_with_message("done");

    let table_path = output_dir.join(strategy.table_file());
    table
        .write_csv(&table_path)
        .with_context(|| format!("writing {}", table_path.display()))?;

    let mut sinks: Vec<Box<dyn ScoreSink>> = Vec::new();
    if args.ssim_hist {
        sinks.push(Box::new(HistogramSink::default()));
    }
    if args.ssim_boxplot {
        sinks.push(Box::new(BoxplotSink::default()));
    }
    for sink in &sinks {
        sink.write(&table, &output_dir)
            .with_context(|| format!("writing {}", sink.file_name()))?;
    }

    info!("SSIM {}", summary_line(&table.summary()?));
    Ok(())
}
