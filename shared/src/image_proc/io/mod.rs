//! Image I/O utilities for loading and saving normalized pixel buffers
//!
//! Decoding goes through the image crate with format detection from file
//! contents, so extensions are only a hint.

use super::image::{dynamic_to_float, float_to_dynamic, float_to_gray_image, FloatImage};
use image::ImageReader;
use ndarray::{Array2, ArrayView3};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or writing images
#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("failed to open image {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write image {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("decoded image {} has inconsistent shape: {source}", .path.display())]
    Shape {
        path: PathBuf,
        #[source]
        source: ndarray::ShapeError,
    },
}

/// Load an image file as a normalized float buffer
///
/// # Arguments
/// * `path` - Image file to decode
///
/// # Returns
/// * `Ok(FloatImage)` - `(height, width, channels)` buffer with values in `[0, 1]`
/// * `Err(ImageIoError)` - The file could not be opened or decoded
pub fn load_float_image<P: AsRef<Path>>(path: P) -> Result<FloatImage, ImageIoError> {
    let path = path.as_ref();

    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| ImageIoError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let decoded = reader.decode().map_err(|source| ImageIoError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!(
        "Decoded {} as {:?} ({}x{})",
        path.display(),
        decoded.color(),
        decoded.width(),
        decoded.height()
    );

    dynamic_to_float(&decoded).map_err(|source| ImageIoError::Shape {
        path: path.to_path_buf(),
        source,
    })
}

/// Save a normalized float buffer as an 8-bit image; format follows the extension
pub fn save_float_image<P: AsRef<Path>>(
    image: &ArrayView3<f64>,
    path: P,
) -> Result<(), ImageIoError> {
    let path = path.as_ref();
    float_to_dynamic(image)
        .save(path)
        .map_err(|source| ImageIoError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

/// Save a normalized single-plane intensity map as an 8-bit grayscale image
pub fn save_gray_image<P: AsRef<Path>>(image: &Array2<f64>, path: P) -> Result<(), ImageIoError> {
    let path = path.as_ref();
    float_to_gray_image(image)
        .save(path)
        .map_err(|source| ImageIoError::Encode {
            path: path.to_path_buf(),
            source,
        })
}
