//! Test helpers for the dataset workspace
//!
//! Workspace-root discovery, a persistent `test_output/` directory for
//! artifacts worth inspecting by hand, and generators for small synthetic
//! images used as corpus fixtures.

use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::Array2;
use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::env;
use std::path::{Path, PathBuf};

/// Error type for test helper operations
#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Failed to find project root: {0}")]
    ProjectRootNotFound(String),
}

/// Returns the path to the project root directory.
///
/// Walks up from the current directory until a `Cargo.toml` declaring
/// `[workspace]` is found.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let mut current_dir = env::current_dir().map_err(|e| {
        TestHelperError::ProjectRootNotFound(format!("Failed to get current directory: {e}"))
    })?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml).map_err(|e| {
                TestHelperError::ProjectRootNotFound(format!("Failed to read Cargo.toml: {e}"))
            })?;

            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Err(TestHelperError::ProjectRootNotFound(
        "Workspace root not found".to_string(),
    ))
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("Failed to find project root directory"));

/// Directory for test artifacts (rendered frames, reports), created on demand
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");
    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }
    output_dir
}

/// Path of `path` inside [`get_output_dir`]
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    get_output_dir().join(path)
}

/// Horizontal ramp from 0 at the left edge to 1 at the right edge
pub fn gradient(height: usize, width: usize) -> Array2<f64> {
    let denom = (width.max(2) - 1) as f64;
    Array2::from_shape_fn((height, width), |(_, x)| x as f64 / denom)
}

/// Alternating 0/1 squares of `cell` pixels
pub fn checkerboard(height: usize, width: usize, cell: usize) -> Array2<f64> {
    let cell = cell.max(1);
    Array2::from_shape_fn((height, width), |(y, x)| {
        if (y / cell + x / cell) % 2 == 0 {
            0.0
        } else {
            1.0
        }
    })
}

/// Uniform noise in `[0, 1)`, reproducible by seed
pub fn noise(height: usize, width: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Array2::from_shape_fn((height, width), |_| rng.gen::<f64>())
}

fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Write a normalized plane as an 8-bit grayscale image (format from extension)
pub fn write_gray<P: AsRef<Path>>(path: P, plane: &Array2<f64>) -> PathBuf {
    let (height, width) = plane.dim();
    let img = GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([to_u8(plane[[y as usize, x as usize]])])
    });
    let path = path.as_ref().to_path_buf();
    img.save(&path).expect("Failed to write grayscale test image");
    path
}

/// Write three normalized planes as an 8-bit RGB image
pub fn write_rgb<P: AsRef<Path>>(
    path: P,
    r: &Array2<f64>,
    g: &Array2<f64>,
    b: &Array2<f64>,
) -> PathBuf {
    assert_eq!(r.dim(), g.dim());
    assert_eq!(r.dim(), b.dim());
    let (height, width) = r.dim();
    let img = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([to_u8(r[[y, x]]), to_u8(g[[y, x]]), to_u8(b[[y, x]])])
    });
    let path = path.as_ref().to_path_buf();
    img.save(&path).expect("Failed to write RGB test image");
    path
}

/// Write `count` distinct noise images named `{prefix}{i}.png` into `dir`
pub fn write_noise_corpus(
    dir: &Path,
    prefix: &str,
    count: usize,
    size: (usize, usize),
    seed: u64,
) -> Vec<PathBuf> {
    std::fs::create_dir_all(dir).expect("Failed to create corpus directory");
    (0..count)
        .map(|i| {
            write_gray(
                dir.join(format!("{prefix}{i}.png")),
                &noise(size.0, size.1, seed + i as u64),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_root_exists() {
        let root = find_project_root().expect("Failed to find project root");
        assert!(root.exists());
        assert!(root.join("Cargo.toml").exists());
    }

    #[test]
    fn test_output_dir_created() {
        let output = get_output_dir();
        assert!(output.exists());
        assert!(output.is_dir());
    }

    #[test]
    fn test_output_path() {
        let path = output_path("test.png");
        assert_eq!(path, get_output_dir().join("test.png"));
    }

    #[test]
    fn test_generators() {
        let g = gradient(3, 5);
        assert_eq!(g.dim(), (3, 5));
        assert_eq!(g[[1, 0]], 0.0);
        assert_eq!(g[[2, 4]], 1.0);

        let c = checkerboard(4, 4, 2);
        assert_eq!(c[[0, 0]], 0.0);
        assert_eq!(c[[0, 2]], 1.0);
        assert_eq!(c[[2, 2]], 0.0);

        assert_eq!(noise(4, 4, 9), noise(4, 4, 9));
        assert_ne!(noise(4, 4, 9), noise(4, 4, 10));
    }

    #[test]
    fn test_write_noise_corpus() {
        let dir = output_path("helper_corpus");
        let files = write_noise_corpus(&dir, "n", 3, (8, 6), 1);
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.is_file()));
        let img = image::open(&files[0]).unwrap();
        assert_eq!((img.width(), img.height()), (6, 8));
    }
}
