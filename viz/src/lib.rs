//! ASCII visualization of score distributions.
//!
//! Validation runs produce one similarity score per image pair. This crate
//! renders those scores as text so reports can be written next to the CSV
//! tables, diffed, and read over SSH:
//!
//! - [`histogram`]: fixed-range binned counts with proportional bars
//! - [`boxplot`]: five-number summary drawn on a scaled axis
//!
//! ```rust
//! use viz::histogram::histogram;
//! use viz::boxplot::FiveNumberSummary;
//!
//! let scores = vec![0.41, 0.55, 0.62, 0.63, 0.71, 0.90];
//! let text = histogram(&scores, 10, -1.0..1.0, Some("SSIM".to_string()))?;
//! assert!(text.contains("SSIM"));
//!
//! let summary = FiveNumberSummary::from_values(&scores)?;
//! assert_eq!(summary.min, 0.41);
//! # Ok::<(), viz::VizError>(())
//! ```

use std::fmt;
use thiserror::Error;

/// Errors raised while binning, summarizing or formatting values
#[derive(Debug, Error)]
pub enum VizError {
    #[error("Histogram error: {0}")]
    HistogramError(String),

    #[error("Boxplot error: {0}")]
    BoxplotError(String),

    #[error("Formatting error: {0}")]
    FmtError(#[from] fmt::Error),
}

pub type Result<T> = std::result::Result<T, VizError>;

pub mod boxplot;
pub mod histogram;
