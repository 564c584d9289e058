use shared::image_proc::ImageIoError;
use std::path::PathBuf;
use thiserror::Error;

/// Shape of a decoded image as `(height, width, channels)`
pub type Shape = (usize, usize, usize);

/// Errors raised while loading corpora, scoring images, or writing reports
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error(
        "{} contains only {available} image(s), cannot randomly choose {requested}",
        .dir.display()
    )]
    CorpusSize {
        dir: PathBuf,
        requested: usize,
        available: usize,
    },

    #[error("no images to load from {}", .dir.display())]
    EmptyCorpus { dir: PathBuf },

    #[error(
        "standard pairing needs equal corpus sizes, got {synthetic} synthetic and {reference} reference image(s)"
    )]
    CorpusLengthMismatch { synthetic: usize, reference: usize },

    #[error("image shapes differ: {first:?} vs {second:?} (height, width, channels)")]
    DimensionMismatch { first: Shape, second: Shape },

    #[error("{height}x{width} image is smaller than the {window}x{window} similarity window")]
    ImageTooSmall {
        height: usize,
        width: usize,
        window: usize,
    },

    #[error("invalid similarity parameter: {0}")]
    InvalidParameter(String),

    #[error("scoring {synthetic} against {reference} failed: {source}")]
    Pair {
        synthetic: String,
        reference: String,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("failed to list {}: {source}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Image(#[from] ImageIoError),

    #[error("failed to write score table: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Report(#[from] viz::VizError),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
