//! Pixel buffer conversions between the image crate and ndarray.
//!
//! Decoded images are held as `Array3<f64>` with shape `(height, width, channels)`
//! and intensities normalized to `[0, 1]`. Only one (luminance) or three (RGB)
//! channels are produced; alpha is discarded on decode.
//!
//! # Coordinate System Conversions
//!
//! - **ndarray**: Uses matrix indexing [row, col] = [y, x] with (height, width) dimensions
//! - **image crate**: Uses graphics indexing (x, y) with (width, height) dimensions

use image::{ColorType, DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use ndarray::{Array2, Array3, ArrayView3, Axis};

/// Normalized floating-point pixel buffer, shape `(height, width, channels)`
pub type FloatImage = Array3<f64>;

/// Luminance weights applied by [`to_grayscale`] (ITU-R BT.709)
pub const LUMA_WEIGHTS: [f64; 3] = [0.2125, 0.7154, 0.0721];

fn normalized<T: Copy + Into<f64>>(
    raw: &[T],
    shape: (usize, usize, usize),
    scale: f64,
) -> Result<FloatImage, ndarray::ShapeError> {
    let data: Vec<f64> = raw.iter().map(|&v| v.into() / scale).collect();
    Array3::from_shape_vec(shape, data)
}

/// Convert a decoded image to a normalized float buffer.
///
/// 8-bit data is divided by 255 and 16-bit data by 65535; float data is
/// clamped to `[0, 1]`. Grayscale sources yield one channel, color sources three.
pub fn dynamic_to_float(img: &DynamicImage) -> Result<FloatImage, ndarray::ShapeError> {
    let (w, h) = (img.width() as usize, img.height() as usize);

    match img.color() {
        ColorType::L8 | ColorType::La8 => normalized(img.to_luma8().as_raw(), (h, w, 1), 255.0),
        ColorType::L16 | ColorType::La16 => {
            normalized(img.to_luma16().as_raw(), (h, w, 1), 65535.0)
        }
        ColorType::Rgb8 | ColorType::Rgba8 => {
            normalized(img.to_rgb8().as_raw(), (h, w, 3), 255.0)
        }
        ColorType::Rgb16 | ColorType::Rgba16 => {
            normalized(img.to_rgb16().as_raw(), (h, w, 3), 65535.0)
        }
        _ => {
            let rgb = img.to_rgb32f();
            let data: Vec<f64> = rgb
                .as_raw()
                .iter()
                .map(|&v| (v as f64).clamp(0.0, 1.0))
                .collect();
            Array3::from_shape_vec((h, w, 3), data)
        }
    }
}

/// Collapse a color image to single-channel luminance.
///
/// Single-channel inputs are returned unchanged. Two-channel inputs keep the
/// first channel; three or more channels use [`LUMA_WEIGHTS`] on the first three.
pub fn to_grayscale(img: &ArrayView3<f64>) -> FloatImage {
    let (h, w, c) = img.dim();
    match c {
        0 => Array3::zeros((h, w, 1)),
        1 => img.to_owned(),
        2 => img.select(Axis(2), &[0]),
        _ => Array3::from_shape_fn((h, w, 1), |(y, x, _)| {
            LUMA_WEIGHTS[0] * img[[y, x, 0]]
                + LUMA_WEIGHTS[1] * img[[y, x, 1]]
                + LUMA_WEIGHTS[2] * img[[y, x, 2]]
        }),
    }
}

fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Convert a normalized intensity map to an 8-bit grayscale image
pub fn float_to_gray_image(arr: &Array2<f64>) -> GrayImage {
    let (height, width) = arr.dim();
    let mut img = GrayImage::new(width as u32, height as u32);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Luma([to_u8(arr[[y as usize, x as usize]])]);
    }
    img
}

/// Convert a normalized float buffer back to an 8-bit image.
///
/// One channel produces a grayscale image; anything else is written as RGB
/// from the first three channels (a two-channel buffer repeats its first).
pub fn float_to_dynamic(img: &ArrayView3<f64>) -> DynamicImage {
    let (height, width, channels) = img.dim();
    if channels <= 1 {
        let plane = Array2::from_shape_fn((height, width), |(y, x)| {
            if channels == 0 {
                0.0
            } else {
                img[[y, x, 0]]
            }
        });
        return DynamicImage::ImageLuma8(float_to_gray_image(&plane));
    }

    let mut out = RgbImage::new(width as u32, height as u32);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (x, y) = (x as usize, y as usize);
        let channel = |c: usize| to_u8(img[[y, x, c.min(channels - 1)]]);
        *pixel = Rgb([channel(0), channel(1), channel(2)]);
    }
    DynamicImage::ImageRgb8(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn test_luma8_normalization() {
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(0, 0, Luma([0]));
        img.put_pixel(2, 1, Luma([255]));
        img.put_pixel(1, 0, Luma([51]));

        let arr = dynamic_to_float(&DynamicImage::ImageLuma8(img)).unwrap();
        assert_eq!(arr.dim(), (2, 3, 1));
        assert_eq!(arr[[0, 0, 0]], 0.0);
        assert_eq!(arr[[1, 2, 0]], 1.0);
        assert_relative_eq!(arr[[0, 1, 0]], 0.2);
    }

    #[test]
    fn test_luma16_normalization() {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(2, 2, |x, _| Luma([if x == 0 { 0 } else { 65535 }]));
        let arr = dynamic_to_float(&DynamicImage::ImageLuma16(img)).unwrap();
        assert_eq!(arr[[0, 0, 0]], 0.0);
        assert_eq!(arr[[1, 1, 0]], 1.0);
    }

    #[test]
    fn test_rgba_drops_alpha() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(4, 4, Rgba([255, 0, 0, 10]));
        let arr = dynamic_to_float(&DynamicImage::ImageRgba8(img)).unwrap();
        assert_eq!(arr.dim(), (4, 4, 3));
        assert_eq!(arr[[2, 2, 0]], 1.0);
        assert_eq!(arr[[2, 2, 1]], 0.0);
    }

    #[test]
    fn test_grayscale_weights() {
        let mut rgb = Array3::<f64>::zeros((1, 3, 3));
        rgb[[0, 0, 0]] = 1.0;
        rgb[[0, 1, 1]] = 1.0;
        rgb[[0, 2, 2]] = 1.0;

        let gray = to_grayscale(&rgb.view());
        assert_eq!(gray.dim(), (1, 3, 1));
        assert_relative_eq!(gray[[0, 0, 0]], 0.2125);
        assert_relative_eq!(gray[[0, 1, 0]], 0.7154);
        assert_relative_eq!(gray[[0, 2, 0]], 0.0721);
    }

    #[test]
    fn test_grayscale_of_white_is_white() {
        let rgb = Array3::<f64>::ones((2, 2, 3));
        let gray = to_grayscale(&rgb.view());
        assert_relative_eq!(gray[[1, 1, 0]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_grayscale_passthrough_single_channel() {
        let single = Array3::from_elem((2, 2, 1), 0.3);
        assert_eq!(to_grayscale(&single.view()), single);
    }

    #[test]
    fn test_float_to_gray_image_clamps() {
        let arr = Array2::from_shape_vec((1, 3), vec![-0.5, 0.5, 2.0]).unwrap();
        let img = float_to_gray_image(&arr);
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(1, 0)[0], 128);
        assert_eq!(img.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_float_to_dynamic_channel_count() {
        let gray = Array3::<f64>::zeros((2, 2, 1));
        assert!(matches!(
            float_to_dynamic(&gray.view()),
            DynamicImage::ImageLuma8(_)
        ));
        let color = Array3::<f64>::zeros((2, 2, 3));
        assert!(matches!(
            float_to_dynamic(&color.view()),
            DynamicImage::ImageRgb8(_)
        ));
    }
}
