//! Histogram visualization
//!
//! Values are counted into equal-width bins over a fixed range so that
//! reports from different runs line up bin for bin. Values outside the range
//! (or NaN) are tallied separately and reported under the table.

use crate::{Result, VizError};
use std::fmt::Write;
use std::ops::Range;

/// Bar length scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    /// Longest bar spans `max_bar_width`
    #[default]
    Linear,
    /// Ten characters per decade of count
    Log10,
}

/// Display options for [`Histogram::format`]
#[derive(Debug, Clone)]
pub struct HistogramConfig {
    pub title: Option<String>,
    pub bar_char: char,
    pub show_percentage: bool,
    pub show_counts: bool,
    pub scale: Scale,
    pub show_empty_bins: bool,
    /// Maximum bar width in characters
    pub max_bar_width: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            title: None,
            bar_char: '#',
            show_percentage: true,
            show_counts: true,
            scale: Scale::Linear,
            show_empty_bins: true,
            max_bar_width: 40,
        }
    }
}

/// Binned counts over a fixed range
#[derive(Debug, Clone)]
pub struct Histogram {
    bin_edges: Vec<f64>,
    counts: Vec<u64>,
    outside: u64,
    config: HistogramConfig,
}

impl Histogram {
    /// Create a histogram from strictly ascending, finite bin edges
    pub fn new(bin_edges: Vec<f64>) -> Result<Self> {
        if bin_edges.len() < 2 {
            return Err(VizError::HistogramError(
                "Histogram must have at least 2 bin edges".to_string(),
            ));
        }
        if bin_edges.iter().any(|e| !e.is_finite()) {
            return Err(VizError::HistogramError(
                "Histogram bin edges must be finite".to_string(),
            ));
        }
        if bin_edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(VizError::HistogramError(
                "Histogram bin edges must be in ascending order".to_string(),
            ));
        }

        let counts = vec![0; bin_edges.len() - 1];
        Ok(Self {
            bin_edges,
            counts,
            outside: 0,
            config: HistogramConfig::default(),
        })
    }

    /// Create a histogram with `num_bins` equal-width bins spanning `range`
    pub fn new_equal_bins(range: Range<f64>, num_bins: usize) -> Result<Self> {
        if num_bins == 0 {
            return Err(VizError::HistogramError(
                "Histogram must have at least 1 bin".to_string(),
            ));
        }
        let step = (range.end - range.start) / num_bins as f64;
        let edges = (0..=num_bins)
            .map(|i| range.start + step * i as f64)
            .collect();
        Self::new(edges)
    }

    pub fn with_config(mut self, config: HistogramConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add(&mut self, value: f64) {
        match self.find_bin(value) {
            Some(idx) => self.counts[idx] += 1,
            None => self.outside += 1,
        }
    }

    pub fn add_all<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = f64>,
    {
        for value in values {
            self.add(value);
        }
    }

    /// Bins are half-open except the last, which also holds the upper edge
    fn find_bin(&self, value: f64) -> Option<usize> {
        let last = self.counts.len() - 1;
        let upper = self.bin_edges[last + 1];
        if value == upper {
            return Some(last);
        }
        if !(value >= self.bin_edges[0] && value < upper) {
            return None;
        }
        // first edge strictly above the value, minus one
        let above = self.bin_edges.partition_point(|&e| e <= value);
        Some(above - 1)
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    /// Values that fell inside the range
    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Values below, above, or not comparable to the range
    pub fn outside_count(&self) -> u64 {
        self.outside
    }

    fn bar_length(&self, count: u64, max_count: u64) -> usize {
        if count == 0 {
            return 0;
        }
        match self.config.scale {
            Scale::Linear => {
                ((count as f64 / max_count as f64) * self.config.max_bar_width as f64).round()
                    as usize
            }
            Scale::Log10 => ((count as f64).log10() * 10.0).round() as usize + 1,
        }
    }

    pub fn format(&self) -> Result<String> {
        let mut output = String::new();

        if let Some(title) = &self.config.title {
            writeln!(output, "{title}")?;
            writeln!(output, "{}", "=".repeat(title.chars().count()))?;
        }

        let total = self.total_count();
        let max_count = self.counts.iter().copied().max().unwrap_or(0).max(1);
        let count_width = self
            .counts
            .iter()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max("Count".len());

        let mut header = format!("{:<17}", "Range");
        if self.config.show_counts {
            write!(header, " | {:>count_width$}", "Count")?;
        }
        if self.config.show_percentage {
            write!(header, " | {:>7}", "Percent")?;
        }
        header.push_str(" | Bar");
        writeln!(output, "{header}")?;
        writeln!(output, "{}", "-".repeat(header.len()))?;

        for (i, &count) in self.counts.iter().enumerate() {
            if count == 0 && !self.config.show_empty_bins {
                continue;
            }

            write!(
                output,
                "{:+.3} - {:+.3}",
                self.bin_edges[i],
                self.bin_edges[i + 1]
            )?;
            if self.config.show_counts {
                write!(output, " | {count:>count_width$}")?;
            }
            if self.config.show_percentage {
                let pct = if total > 0 {
                    count as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                write!(output, " | {pct:>6.2}%")?;
            }
            let bar = self
                .config
                .bar_char
                .to_string()
                .repeat(self.bar_length(count, max_count));
            writeln!(output, " | {bar}")?;
        }

        if self.outside > 0 {
            writeln!(output, "({} value(s) outside range)", self.outside)?;
        }
        if self.config.scale == Scale::Log10 {
            writeln!(
                output,
                "Note: bar lengths use log10 scale (10 x '{}' per decade)",
                self.config.bar_char
            )?;
        }

        Ok(output)
    }
}

/// Bin `values` into `bin_count` equal bins over `range` and format the table
pub fn histogram(
    values: &[f64],
    bin_count: usize,
    range: Range<f64>,
    title: Option<String>,
) -> Result<String> {
    let mut hist = Histogram::new_equal_bins(range, bin_count)?.with_config(HistogramConfig {
        title,
        ..HistogramConfig::default()
    });
    hist.add_all(values.iter().copied());
    hist.format()
}
