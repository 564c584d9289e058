//! Structural similarity (SSIM) between normalized images.
//!
//! Local statistics are taken over a uniform square window using summed-area
//! tables, so each window costs O(1) regardless of its size. For a window of
//! `N` pixels:
//!
//! ```text
//! SSIM = (2 μx μy + C1)(2 σxy + C2) / ((μx² + μy² + C1)(σx² + σy² + C2))
//! C1 = (K1 L)²,  C2 = (K2 L)²
//! ```
//!
//! with sample (co)variances normalized by `N - 1` and `L` the data range.
//! Only windows lying fully inside the image are scored; the result is the
//! mean over windows, then over channels.

use crate::error::{Result, ValidationError};
use clap::ValueEnum;
use ndarray::{Array2, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use shared::image_proc::to_grayscale;

/// Which operands are reduced to luminance before scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum GrayscaleMode {
    #[default]
    None,
    /// First (synthetic) image only
    Img1,
    /// Second (reference) image only
    Img2,
    Both,
}

impl GrayscaleMode {
    pub fn from_flags(first: bool, second: bool) -> Self {
        match (first, second) {
            (false, false) => GrayscaleMode::None,
            (true, false) => GrayscaleMode::Img1,
            (false, true) => GrayscaleMode::Img2,
            (true, true) => GrayscaleMode::Both,
        }
    }

    pub fn first(self) -> bool {
        matches!(self, GrayscaleMode::Img1 | GrayscaleMode::Both)
    }

    pub fn second(self) -> bool {
        matches!(self, GrayscaleMode::Img2 | GrayscaleMode::Both)
    }
}

/// Window and stabilizing constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SsimParams {
    /// Side of the square window; odd and at least 3
    pub window: usize,
    pub k1: f64,
    pub k2: f64,
    /// Span of pixel values; 1.0 for normalized images
    pub data_range: f64,
}

impl Default for SsimParams {
    fn default() -> Self {
        Self {
            window: 7,
            k1: 0.01,
            k2: 0.03,
            data_range: 1.0,
        }
    }
}

impl SsimParams {
    pub fn with_window(window: usize) -> Result<Self> {
        let params = Self {
            window,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window < 3 || self.window % 2 == 0 {
            return Err(ValidationError::InvalidParameter(format!(
                "window size must be odd and at least 3, got {}",
                self.window
            )));
        }
        for (name, value) in [("k1", self.k1), ("k2", self.k2), ("data range", self.data_range)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ValidationError::InvalidParameter(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    fn c1(&self) -> f64 {
        (self.k1 * self.data_range).powi(2)
    }

    fn c2(&self) -> f64 {
        (self.k2 * self.data_range).powi(2)
    }
}

/// Summed-area table with a leading row and column of zeros
fn integral(plane: &ArrayView2<f64>, f: impl Fn(usize, usize) -> f64) -> Array2<f64> {
    let (h, w) = plane.dim();
    let mut table = Array2::<f64>::zeros((h + 1, w + 1));
    for y in 0..h {
        let mut row_sum = 0.0;
        for x in 0..w {
            row_sum += f(y, x);
            table[[y + 1, x + 1]] = table[[y, x + 1]] + row_sum;
        }
    }
    table
}

fn window_sum(table: &Array2<f64>, y: usize, x: usize, n: usize) -> f64 {
    table[[y + n, x + n]] - table[[y, x + n]] - table[[y + n, x]] + table[[y, x]]
}

/// Mean SSIM of two equally shaped planes
fn plane_ssim(a: &ArrayView2<f64>, b: &ArrayView2<f64>, params: &SsimParams) -> f64 {
    let (h, w) = a.dim();
    let n = params.window;
    let count = (n * n) as f64;
    let (c1, c2) = (params.c1(), params.c2());

    let sa = integral(a, |y, x| a[[y, x]]);
    let sb = integral(b, |y, x| b[[y, x]]);
    let saa = integral(a, |y, x| a[[y, x]] * a[[y, x]]);
    let sbb = integral(b, |y, x| b[[y, x]] * b[[y, x]]);
    let sab = integral(a, |y, x| a[[y, x]] * b[[y, x]]);

    let mut total = 0.0;
    for y in 0..=(h - n) {
        for x in 0..=(w - n) {
            let sum_a = window_sum(&sa, y, x, n);
            let sum_b = window_sum(&sb, y, x, n);
            let mu_a = sum_a / count;
            let mu_b = sum_b / count;

            let var_a = (window_sum(&saa, y, x, n) - sum_a * sum_a / count) / (count - 1.0);
            let var_b = (window_sum(&sbb, y, x, n) - sum_b * sum_b / count) / (count - 1.0);
            let cov = (window_sum(&sab, y, x, n) - sum_a * sum_b / count) / (count - 1.0);

            let num = (2.0 * mu_a * mu_b + c1) * (2.0 * cov + c2);
            let den = (mu_a * mu_a + mu_b * mu_b + c1) * (var_a + var_b + c2);
            total += num / den;
        }
    }

    let windows = ((h - n + 1) * (w - n + 1)) as f64;
    total / windows
}

/// Mean SSIM of two images with identical `(height, width, channels)`.
///
/// Multi-channel images are scored per channel and averaged.
pub fn structural_similarity(
    a: &ArrayView3<f64>,
    b: &ArrayView3<f64>,
    params: &SsimParams,
) -> Result<f64> {
    params.validate()?;
    if a.dim() != b.dim() {
        return Err(ValidationError::DimensionMismatch {
            first: a.dim(),
            second: b.dim(),
        });
    }

    let (height, width, channels) = a.dim();
    if height < params.window || width < params.window {
        return Err(ValidationError::ImageTooSmall {
            height,
            width,
            window: params.window,
        });
    }
    if channels == 0 {
        return Err(ValidationError::InvalidParameter(
            "images have no channels".to_string(),
        ));
    }

    let sum: f64 = (0..channels)
        .map(|c| {
            plane_ssim(
                &a.index_axis(Axis(2), c),
                &b.index_axis(Axis(2), c),
                params,
            )
        })
        .sum();
    Ok(sum / channels as f64)
}

/// Score `a` against `b` after the grayscale conversions selected by `mode`
pub fn score(
    a: &ArrayView3<f64>,
    b: &ArrayView3<f64>,
    mode: GrayscaleMode,
    params: &SsimParams,
) -> Result<f64> {
    let gray_a = mode.first().then(|| to_grayscale(a));
    let gray_b = mode.second().then(|| to_grayscale(b));
    let a = gray_a.as_ref().map_or_else(|| a.view(), |g| g.view());
    let b = gray_b.as_ref().map_or_else(|| b.view(), |g| g.view());
    structural_similarity(&a, &b, params)
}
