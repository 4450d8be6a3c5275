//! Terminal histogram of image pixel values.
//!
//! Gives a quick look at an image's dynamic range from the command line:
//! how much of the map is noise, and how far the emission peak sits above it.
//! Blanked (non-finite) pixels are counted separately and left out of the bins.

use crate::{Result, VizError};
use ndarray::ArrayView2;
use std::fmt::Write;

/// Scale type for bar lengths
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    Linear,
    /// Logarithmic scale (base 10), useful when noise pixels dominate
    Log10,
}

/// Display configuration
#[derive(Debug, Clone)]
pub struct HistogramConfig {
    pub title: Option<String>,
    /// Character to use for bars
    pub bar_char: char,
    pub show_percentage: bool,
    pub scale: Scale,
    /// Whether to show empty bins
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
            scale: Scale::Linear,
            show_empty_bins: false,
            max_bar_width: 40,
        }
    }
}

/// Equal-width histogram over the finite pixels of an image
#[derive(Debug, Clone)]
pub struct PixelHistogram {
    bin_edges: Vec<f64>,
    counts: Vec<u64>,
    /// Finite pixels binned
    total_count: u64,
    /// Non-finite pixels skipped
    blank_count: u64,
    config: HistogramConfig,
}

impl PixelHistogram {
    /// Bin the finite pixels of `image` into `num_bins` bins spanning min..max.
    pub fn from_image(image: &ArrayView2<f64>, num_bins: usize) -> Result<Self> {
        if num_bins == 0 {
            return Err(VizError::HistogramError(
                "Histogram must have at least 1 bin".to_string(),
            ));
        }

        let finite: Vec<f64> = image.iter().copied().filter(|v| v.is_finite()).collect();
        let blank_count = (image.len() - finite.len()) as u64;
        if finite.is_empty() {
            return Err(VizError::HistogramError(
                "Image has no finite pixels".to_string(),
            ));
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // A flat image still gets one bin of non-zero width
        let max = if max > min { max } else { min + 1.0 };
        let step = (max - min) / num_bins as f64;

        let bin_edges: Vec<f64> = (0..=num_bins).map(|i| min + step * i as f64).collect();
        let mut counts = vec![0u64; num_bins];
        for v in &finite {
            let idx = (((v - min) / step) as usize).min(num_bins - 1);
            counts[idx] += 1;
        }

        Ok(Self {
            bin_edges,
            counts,
            total_count: finite.len() as u64,
            blank_count,
            config: HistogramConfig::default(),
        })
    }

    pub fn with_config(mut self, config: HistogramConfig) -> Self {
        self.config = config;
        self
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn blank_count(&self) -> u64 {
        self.blank_count
    }

    fn bar_length(&self, count: u64, max_count: f64) -> usize {
        match self.config.scale {
            Scale::Linear => {
                ((count as f64 / max_count) * self.config.max_bar_width as f64).round() as usize
            }
            Scale::Log10 if count > 0 => {
                let full = max_count.log10().max(1.0);
                (((count as f64).log10() + 1.0) / (full + 1.0) * self.config.max_bar_width as f64)
                    .round() as usize
            }
            Scale::Log10 => 0,
        }
    }

    /// Format the histogram as a string
    pub fn format(&self) -> Result<String> {
        let mut output = String::new();

        if let Some(title) = &self.config.title {
            writeln!(output, "{title}")?;
            writeln!(output, "{}", "=".repeat(title.chars().count()))?;
        }

        let max_count = self.counts.iter().copied().max().unwrap_or(1).max(1) as f64;
        let count_width = self
            .counts
            .iter()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(5)
            .max(5);

        let mut header = format!("{:<23} | {:<count_width$} ", "Range", "Count");
        if self.config.show_percentage {
            write!(header, "| {:<8} ", "Percent")?;
        }
        write!(header, "| Bar")?;
        writeln!(output, "{header}")?;
        writeln!(output, "{}", "-".repeat(header.len()))?;

        for (i, &count) in self.counts.iter().enumerate() {
            if count == 0 && !self.config.show_empty_bins {
                continue;
            }

            write!(
                output,
                "{:>+10.3e} - {:>+10.3e} | {:<count_width$} ",
                self.bin_edges[i],
                self.bin_edges[i + 1],
                count
            )?;

            if self.config.show_percentage {
                let percentage = count as f64 / self.total_count as f64 * 100.0;
                write!(output, "| {percentage:7.2}% ")?;
            }

            let bar = self
                .config
                .bar_char
                .to_string()
                .repeat(self.bar_length(count, max_count));
            writeln!(output, "| {bar}")?;
        }

        if self.blank_count > 0 {
            writeln!(output)?;
            writeln!(output, "{} blank pixels not shown", self.blank_count)?;
        }
        if self.config.scale == Scale::Log10 {
            writeln!(output)?;
            writeln!(output, "Note: Bar lengths use log10 scale")?;
        }

        Ok(output)
    }

    /// Print the histogram to stdout
    pub fn print(&self) -> Result<()> {
        println!("{}", self.format()?);
        Ok(())
    }
}
