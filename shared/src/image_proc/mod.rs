//! Pixel buffer handling shared by the renderer and the validator.
//!
//! # Module Organization
//!
//! - **image**: Conversions between image crate types and normalized `Array3<f64>` buffers
//! - **io**: Loading and saving image files with format detection

pub mod image;
pub mod io;

pub use image::{
    dynamic_to_float, float_to_dynamic, float_to_gray_image, to_grayscale, FloatImage,
    LUMA_WEIGHTS,
};
pub use io::{load_float_image, save_float_image, save_gray_image, ImageIoError};
