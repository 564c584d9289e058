//! Image corpus loading.
//!
//! A corpus is every image file directly inside one directory, sorted by
//! path, optionally cut down to a random subset, and decoded up front. Index
//! `i` of the pixel buffers and of the file names always refer to the same
//! file.

use crate::error::{Result, ValidationError};
use image::ImageFormat;
use log::{debug, info};
use rand::seq::index;
use rand::Rng;
use rayon::prelude::*;
use shared::image_proc::{load_float_image, FloatImage};
use std::path::{Path, PathBuf};

/// Decoded images plus their file names, in load order
#[derive(Debug, Clone)]
pub struct ImageCorpus {
    dir: PathBuf,
    names: Vec<String>,
    images: Vec<FloatImage>,
}

/// Image files directly inside `dir`, sorted by path.
///
/// Files whose extension is not a known image format are skipped.
pub fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir = |source| ValidationError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir)? {
        let path = entry.map_err(read_dir)?.path();
        if !path.is_file() {
            continue;
        }
        if ImageFormat::from_path(&path).is_err() {
            debug!("Skipping non-image file {}", path.display());
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Pick `n` of `paths` uniformly without replacement, in draw order
pub fn choose_subset<R: Rng + ?Sized>(
    dir: &Path,
    paths: Vec<PathBuf>,
    n: usize,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    if n > paths.len() {
        return Err(ValidationError::CorpusSize {
            dir: dir.to_path_buf(),
            requested: n,
            available: paths.len(),
        });
    }
    let picks = index::sample(rng, paths.len(), n);
    Ok(picks.into_iter().map(|i| paths[i].clone()).collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl ImageCorpus {
    /// Load every image in `dir`, or a random subset of `subset` of them.
    ///
    /// Subsets keep the order in which they were drawn, so the same seed
    /// always yields the same sequence. Any decode failure aborts the load.
    pub fn load<R: Rng + ?Sized>(dir: &Path, subset: Option<usize>, rng: &mut R) -> Result<Self> {
        let paths = Self::select(dir, subset, rng)?;
        Self::decode(dir, &paths)
    }

    /// List `dir` and draw the optional random subset without decoding anything
    pub fn select<R: Rng + ?Sized>(
        dir: &Path,
        subset: Option<usize>,
        rng: &mut R,
    ) -> Result<Vec<PathBuf>> {
        let mut paths = list_image_files(dir)?;
        if let Some(n) = subset {
            paths = choose_subset(dir, paths, n, rng)?;
        }
        Ok(paths)
    }

    /// Decode `paths` in parallel, keeping their order
    pub fn decode(dir: &Path, paths: &[PathBuf]) -> Result<Self> {
        if paths.is_empty() {
            return Err(ValidationError::EmptyCorpus {
                dir: dir.to_path_buf(),
            });
        }

        let images = paths
            .par_iter()
            .map(load_float_image)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let names = paths.iter().map(|p| file_name(p)).collect();

        info!("Loaded {} image(s) from {}", images.len(), dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            names,
            images,
        })
    }

    /// Build a corpus from already decoded images
    pub fn from_images(dir: impl Into<PathBuf>, entries: Vec<(String, FloatImage)>) -> Self {
        let (names, images): (Vec<String>, Vec<FloatImage>) = entries.into_iter().unzip();
        Self {
            dir: dir.into(),
            names,
            images,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn image(&self, index: usize) -> Option<&FloatImage> {
        self.images.get(index)
    }

    /// Original file name of the image at `index`
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn images(&self) -> &[FloatImage] {
        &self.images
    }
}
