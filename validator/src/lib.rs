//! Image-similarity validation for synthetic datasets
//!
//! Scores a corpus of synthetic images against a corpus of real reference
//! images with the structural similarity index (SSIM). Pairing is either
//! index-aligned or an exhaustive best-match search, and results are written
//! as a CSV table with optional text histogram and boxplot reports.

pub mod corpus;
pub mod error;
pub mod pairing;
pub mod report;
pub mod ssim;

pub use corpus::ImageCorpus;
pub use error::{Result, ValidationError};
pub use pairing::PairingStrategy;
pub use report::{
    image_histogram, summary_line, write_image_histogram, BoxplotSink, HistogramSink,
    ImageHistogramOptions, ScoreSink, SimilarityRecord, SimilarityTable,
};
pub use ssim::{score, structural_similarity, GrayscaleMode, SsimParams};
