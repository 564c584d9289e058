//! Boxplot visualization
//!
//! A [`FiveNumberSummary`] is drawn on a horizontal axis of fixed width:
//!
//! ```text
//!          |-------[=====|===]-----|
//! -1.000                              +1.000
//! ```
//!
//! Whiskers run to the extremes; no outlier fences are applied.

use crate::{Result, VizError};
use std::fmt::Write;
use std::ops::Range;

/// Min, quartiles, max, and mean of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiveNumberSummary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

/// Linearly interpolated quantile of sorted data
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

impl FiveNumberSummary {
    /// Summarize `values`; fails on an empty slice or any non-finite value
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(VizError::BoxplotError(
                "cannot summarize an empty sample".to_string(),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(VizError::BoxplotError(format!(
                "sample contains non-finite value {bad}"
            )));
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Ok(Self {
            count: sorted.len(),
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Boxplot of one sample over a fixed axis
#[derive(Debug, Clone)]
pub struct BoxPlot {
    summary: FiveNumberSummary,
    axis: Range<f64>,
    width: usize,
    title: Option<String>,
}

impl BoxPlot {
    /// `width` is the number of character cells spanning `axis`
    pub fn new(summary: FiveNumberSummary, axis: Range<f64>, width: usize) -> Result<Self> {
        if width < 2 {
            return Err(VizError::BoxplotError(format!(
                "plot width must be at least 2 characters, got {width}"
            )));
        }
        if !(axis.start.is_finite() && axis.end.is_finite() && axis.start < axis.end) {
            return Err(VizError::BoxplotError(format!(
                "invalid axis range {}..{}",
                axis.start, axis.end
            )));
        }
        Ok(Self {
            summary,
            axis,
            width,
            title: None,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Character cell for `value`, clamped to the axis
    fn column(&self, value: f64) -> usize {
        let span = self.axis.end - self.axis.start;
        let t = ((value - self.axis.start) / span).clamp(0.0, 1.0);
        (t * (self.width - 1) as f64).round() as usize
    }

    pub fn format(&self) -> Result<String> {
        let s = &self.summary;
        let mut row = vec![' '; self.width];

        let (lo, q1, med, q3, hi) = (
            self.column(s.min),
            self.column(s.q1),
            self.column(s.median),
            self.column(s.q3),
            self.column(s.max),
        );
        for cell in &mut row[lo..=hi] {
            *cell = '-';
        }
        for cell in &mut row[q1..=q3] {
            *cell = '=';
        }
        row[lo] = '|';
        row[hi] = '|';
        row[q1] = '[';
        row[q3] = ']';
        row[med] = '|';

        let mut output = String::new();
        if let Some(title) = &self.title {
            writeln!(output, "{title}")?;
            writeln!(output, "{}", "=".repeat(title.chars().count()))?;
        }

        let left = format!("{:+.3}", self.axis.start);
        let right = format!("{:+.3}", self.axis.end);
        let indent = " ".repeat(left.len());
        writeln!(output, "{indent}{}", row.into_iter().collect::<String>())?;
        writeln!(
            output,
            "{left}{}{right}",
            " ".repeat(self.width.saturating_sub(right.len()))
        )?;
        writeln!(output)?;
        writeln!(output, "n      = {}", s.count)?;
        writeln!(output, "min    = {:+.4}", s.min)?;
        writeln!(output, "q1     = {:+.4}", s.q1)?;
        writeln!(output, "median = {:+.4}", s.median)?;
        writeln!(output, "q3     = {:+.4}", s.q3)?;
        writeln!(output, "max    = {:+.4}", s.max)?;
        writeln!(output, "mean   = {:+.4}", s.mean)?;
        Ok(output)
    }
}

/// Summarize `values` and draw them over `axis`
pub fn boxplot(
    values: &[f64],
    axis: Range<f64>,
    width: usize,
    title: Option<String>,
) -> Result<String> {
    let mut plot = BoxPlot::new(FiveNumberSummary::from_values(values)?, axis, width)?;
    if let Some(title) = title {
        plot = plot.with_title(title);
    }
    plot.format()
}
