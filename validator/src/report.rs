//! Score tables and the text reports drawn from them.

use crate::error::Result;
use log::info;
use ndarray::ArrayView3;
use serde::{Deserialize, Serialize};
use shared::image_proc::{load_float_image, to_grayscale};
use std::path::{Path, PathBuf};
use viz::boxplot::{BoxPlot, FiveNumberSummary};
use viz::histogram::{Histogram, HistogramConfig, Scale};

/// Range every SSIM score falls in
pub const SSIM_RANGE: std::ops::Range<f64> = -1.0..1.0;

/// One scored synthetic image
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityRecord {
    pub synthetic: String,
    pub reference: String,
    /// Position of `reference` in its corpus; unknown for tables read back from CSV
    pub reference_index: Option<usize>,
    pub ssim: f64,
}

/// CSV row layout: `index,synth_img,ref_img,ssim`
#[derive(Debug, Serialize, Deserialize)]
struct TableRow {
    index: usize,
    synth_img: String,
    ref_img: String,
    ssim: f64,
}

/// Ordered, append-only collection of similarity records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityTable {
    records: Vec<SimilarityRecord>,
}

impl From<Vec<SimilarityRecord>> for SimilarityTable {
    fn from(records: Vec<SimilarityRecord>) -> Self {
        Self { records }
    }
}

impl SimilarityTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: SimilarityRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SimilarityRecord] {
        &self.records
    }

    pub fn scores(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.ssim).collect()
    }

    /// Count, mean, quartiles and extremes of the scores
    pub fn summary(&self) -> Result<FiveNumberSummary> {
        Ok(FiveNumberSummary::from_values(&self.scores())?)
    }

    /// Write the table as CSV; the index column is the row number
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for (index, record) in self.records.iter().enumerate() {
            writer.serialize(TableRow {
                index,
                synth_img: record.synthetic.clone(),
                ref_img: record.reference.clone(),
                ssim: record.ssim,
            })?;
        }
        writer.flush()?;
        info!("Wrote {} score(s) to {}", self.len(), path.display());
        Ok(())
    }

    /// Read a table written by [`SimilarityTable::write_csv`].
    ///
    /// The file does not store reference indices, so they read back as `None`.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut table = Self::default();
        for row in reader.deserialize() {
            let row: TableRow = row?;
            table.push(SimilarityRecord {
                synthetic: row.synth_img,
                reference: row.ref_img,
                reference_index: None,
                ssim: row.ssim,
            });
        }
        Ok(table)
    }
}

/// One-line digest logged at the end of a run
pub fn summary_line(summary: &FiveNumberSummary) -> String {
    format!(
        "n={} mean={:.4} min={:.4} median={:.4} max={:.4}",
        summary.count, summary.mean, summary.min, summary.median, summary.max
    )
}

/// Consumer of a finished score table that renders it as text
pub trait ScoreSink {
    /// File name the rendering is saved under
    fn file_name(&self) -> &str;

    fn render(&self, table: &SimilarityTable) -> Result<String>;

    /// Render into `dir/file_name()` and return the written path
    fn write(&self, table: &SimilarityTable, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.render(table)?)?;
        info!("Wrote {}", path.display());
        Ok(path)
    }
}

/// Binned score counts over the full SSIM range
#[derive(Debug, Clone)]
pub struct HistogramSink {
    pub bins: usize,
    pub title: String,
}

impl Default for HistogramSink {
    fn default() -> Self {
        Self {
            bins: 20,
            title: "SSIM Scores Histogram".to_string(),
        }
    }
}

impl ScoreSink for HistogramSink {
    fn file_name(&self) -> &str {
        "ssim_hist.txt"
    }

    fn render(&self, table: &SimilarityTable) -> Result<String> {
        let mut hist = Histogram::new_equal_bins(SSIM_RANGE, self.bins)?.with_config(
            HistogramConfig {
                title: Some(self.title.clone()),
                ..HistogramConfig::default()
            },
        );
        hist.add_all(table.scores());
        Ok(hist.format()?)
    }
}

/// Five-number summary drawn over the full SSIM range
#[derive(Debug, Clone)]
pub struct BoxplotSink {
    pub width: usize,
    pub title: String,
}

impl Default for BoxplotSink {
    fn default() -> Self {
        Self {
            width: 61,
            title: "SSIM Scores Boxplot".to_string(),
        }
    }
}

impl ScoreSink for BoxplotSink {
    fn file_name(&self) -> &str {
        "ssim_boxplot.txt"
    }

    fn render(&self, table: &SimilarityTable) -> Result<String> {
        let plot = BoxPlot::new(table.summary()?, SSIM_RANGE, self.width)?.with_title(&self.title);
        Ok(plot.format()?)
    }
}

/// File written by [`write_image_histogram`]
pub const IMAGE_HIST_FILE: &str = "img_hist.txt";

/// One bin per 8-bit intensity level over `[0, 1]`
pub const IMAGE_HIST_BINS: usize = 256;

/// Options for a pixel-intensity histogram of a single image
#[derive(Debug, Clone)]
pub struct ImageHistogramOptions {
    /// Convert to luminance first; otherwise every channel value is counted
    pub grayscale: bool,
    pub log_scale: bool,
    pub title: String,
}

impl Default for ImageHistogramOptions {
    fn default() -> Self {
        Self {
            grayscale: true,
            log_scale: true,
            title: "Image Histogram".to_string(),
        }
    }
}

/// Bin the pixel intensities of a normalized image
pub fn image_histogram(
    image: &ArrayView3<f64>,
    options: &ImageHistogramOptions,
) -> Result<Histogram> {
    let pixels = if options.grayscale {
        to_grayscale(image)
    } else {
        image.to_owned()
    };

    let scale = if options.log_scale {
        Scale::Log10
    } else {
        Scale::Linear
    };
    let mut hist = Histogram::new_equal_bins(0.0..1.0, IMAGE_HIST_BINS)?.with_config(
        HistogramConfig {
            title: Some(options.title.clone()),
            scale,
            show_empty_bins: false,
            ..HistogramConfig::default()
        },
    );
    hist.add_all(pixels.iter().copied());
    Ok(hist)
}

/// Load `image_path` and write its intensity histogram to `dir/img_hist.txt`
pub fn write_image_histogram(
    image_path: &Path,
    options: &ImageHistogramOptions,
    dir: &Path,
) -> Result<PathBuf> {
    let image = load_float_image(image_path)?;
    let text = image_histogram(&image.view(), options)?.format()?;
    let path = dir.join(IMAGE_HIST_FILE);
    std::fs::write(&path, text)?;
    info!(
        "Wrote intensity histogram of {} to {}",
        image_path.display(),
        path.display()
    );
    Ok(path)
}
