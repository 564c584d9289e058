//! Command-line options common to every dataset tool.
//!
//! Both binaries flatten [`RunArgs`] into their own parser so seeding, output
//! placement and parameter capture behave identically across the pipeline.

use clap::Args;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name used by [`save_cmd_args`]
pub const CMD_ARGS_FILE: &str = "cmd_args.json";

/// Seed, output directory and invocation capture options
#[derive(Args, Debug, Clone, Serialize)]
pub struct RunArgs {
    /// Seed for the random generator; drawn from OS entropy and logged when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory receiving all outputs (created if missing)
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Write the parsed command-line parameters to cmd_args.json in the output directory
    #[arg(long, default_value_t = false)]
    pub save_cmd_args: bool,
}

impl RunArgs {
    /// Create the output directory and return its path
    pub fn prepare_output_dir(&self) -> io::Result<&Path> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(&self.output_dir)
    }
}

/// Build the run's single random generator.
///
/// Returns the generator together with the seed actually used, so a run
/// seeded from entropy can still be reproduced later.
pub fn seeded_rng(seed: Option<u64>) -> (ChaCha8Rng, u64) {
    let seed = match seed {
        Some(seed) => seed,
        None => {
            let seed = rand::thread_rng().next_u64();
            log::info!("No seed given, using {seed}");
            seed
        }
    };
    (ChaCha8Rng::seed_from_u64(seed), seed)
}

/// Serialize invocation parameters as pretty JSON into `dir/cmd_args.json`
pub fn save_cmd_args<T: Serialize>(args: &T, dir: &Path) -> io::Result<PathBuf> {
    let path = dir.join(CMD_ARGS_FILE);
    let json = serde_json::to_string_pretty(args)?;
    fs::write(&path, json)?;
    log::info!("Saved command arguments to {}", path.display());
    Ok(path)
}
