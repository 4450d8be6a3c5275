//! Two-panel triage figure for a continuum image.
//!
//! The left panel shows the full intensity map on the hot colour scale with
//! the patch used for the noise estimate outlined in white. The right panel
//! zooms to the emission and overlays two contour families: fractions of the
//! peak in hot colours, and multiples of the sigma threshold in black.
//!
//! Row 0 of the image is drawn at the bottom, matching sky orientation.

use crate::colormap::{hot, hot_scaled};
use crate::contour::{marching_squares, Segment};
use crate::VizError;
use log::{debug, info};
use ndarray::ArrayView2;
use plotters::coord::Shift;
use plotters::prelude::*;
use shared::image_proc::{
    auto_zoom, estimate_rms, peak_levels, sigma_levels, NoiseError, NoiseEstimate, ZoomError,
    ZoomWindow, DEFAULT_PATCH_FRACTION,
};
use std::path::Path;
use thiserror::Error;

/// Largest number of blocks drawn per axis of the intensity map
const MAX_MAP_BLOCKS: usize = 300;

/// Width reserved for each colorbar, in pixels
const COLORBAR_WIDTH: u32 = 90;

/// Errors that prevent a triage figure from being produced
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("noise estimate failed: {0}")]
    Noise(#[from] NoiseError),

    #[error("zoom failed: {0}")]
    Zoom(#[from] ZoomError),

    #[error(transparent)]
    Viz(#[from] VizError),
}

/// Triage figure settings
#[derive(Debug, Clone)]
pub struct TriageOptions {
    /// Sigma multiplier of the black contour family
    pub sigma: f64,
    /// Noise patch side relative to the shorter image axis
    pub patch_fraction: f64,
    /// Panel title, typically the file name
    pub title: Option<String>,
    /// Figure width in pixels
    pub width: u32,
    /// Figure height in pixels
    pub height: u32,
}

impl Default for TriageOptions {
    fn default() -> Self {
        Self {
            sigma: 3.0,
            patch_fraction: DEFAULT_PATCH_FRACTION,
            title: None,
            width: 1500,
            height: 500,
        }
    }
}

/// Quantities derived from an image for its triage figure
#[derive(Debug, Clone, PartialEq)]
pub struct TriageAnalysis {
    pub noise: NoiseEstimate,
    pub zoom: ZoomWindow,
    /// Peak of the finite pixels inside the zoom window
    pub zoom_max: f64,
    pub peak_levels: Vec<f64>,
    pub sigma_levels: Vec<f64>,
}

fn finite_range<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Noise estimate, zoom window and contour levels for `image`.
pub fn analyze(image: &ArrayView2<f64>, options: &TriageOptions) -> Result<TriageAnalysis, TriageError> {
    let noise = estimate_rms(image, options.patch_fraction)?;
    let zoom = auto_zoom(image, &noise)?;
    let zoom_max = finite_range(zoom.slice(image).iter())
        .map(|(_, hi)| hi)
        .unwrap_or(0.0);

    debug!(
        "Zoom window rows {}..={}, cols {}..={}, peak {:.4e}",
        zoom.min_row, zoom.max_row, zoom.min_col, zoom.max_col, zoom_max
    );

    Ok(TriageAnalysis {
        noise,
        zoom,
        zoom_max,
        peak_levels: peak_levels(zoom_max),
        sigma_levels: sigma_levels(options.sigma, noise.rms),
    })
}

/// Analyze `image` and write its triage figure to `path` as PNG.
pub fn render_triage<P: AsRef<Path>>(
    image: &ArrayView2<f64>,
    path: P,
    options: &TriageOptions,
) -> Result<TriageAnalysis, TriageError> {
    let analysis = analyze(image, options)?;
    draw_figure(image, &analysis, path.as_ref(), options)?;
    info!(
        "Wrote {} (rms {:.3e}, zoom {}x{})",
        path.as_ref().display(),
        analysis.noise.rms,
        analysis.zoom.width(),
        analysis.zoom.height()
    );
    Ok(analysis)
}

fn draw_figure(
    image: &ArrayView2<f64>,
    analysis: &TriageAnalysis,
    path: &Path,
    options: &TriageOptions,
) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((1, 2));
    let map_title = options.title.clone().unwrap_or_default();
    let contour_title = options
        .title
        .clone()
        .unwrap_or_else(|| format!("{} sigma", options.sigma));

    draw_intensity_map(&panels[0], image, &analysis.noise, &map_title)?;
    draw_contour_panel(&panels[1], image, analysis, &contour_title)?;

    root.present()?;
    Ok(())
}

/// Mean of the finite pixels in a block, if any.
fn block_mean(image: &ArrayView2<f64>, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for r in rows {
        for c in cols.clone() {
            let v = image[[r, c]];
            if v.is_finite() {
                sum += v;
                n += 1;
            }
        }
    }
    (n > 0).then(|| sum / n as f64)
}

fn draw_intensity_map(
    area: &DrawingArea<BitMapBackend, Shift>,
    image: &ArrayView2<f64>,
    noise: &NoiseEstimate,
    title: &str,
) -> crate::Result<()> {
    let (rows, cols) = image.dim();
    let (vmin, vmax) = finite_range(image.iter()).unwrap_or((0.0, 1.0));

    let (width, _) = area.dim_in_pixel();
    let (map_area, bar_area) = area.split_horizontally(width.saturating_sub(COLORBAR_WIDTH));

    let mut chart = ChartBuilder::on(&map_area)
        .caption(title, ("sans-serif", 18))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(45)
        .build_cartesian_2d(0.0..cols as f64, 0.0..rows as f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("x (pixel)")
        .y_desc("y (pixel)")
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;

    // Downsample large maps into blocks so the bitmap is drawn in bounded time
    let block = rows.max(cols).div_ceil(MAX_MAP_BLOCKS).max(1);
    let mut blocks = Vec::new();
    for r0 in (0..rows).step_by(block) {
        let r1 = (r0 + block).min(rows);
        for c0 in (0..cols).step_by(block) {
            let c1 = (c0 + block).min(cols);
            if let Some(mean) = block_mean(image, r0..r1, c0..c1) {
                blocks.push(Rectangle::new(
                    [(c0 as f64, r0 as f64), (c1 as f64, r1 as f64)],
                    hot_scaled(mean, vmin, vmax).filled(),
                ));
            }
        }
    }
    chart.draw_series(blocks)?;

    let patch = noise.patch;
    chart.draw_series(std::iter::once(Rectangle::new(
        [
            (patch.col_start as f64, patch.row_start as f64),
            (patch.col_end as f64, patch.row_end as f64),
        ],
        WHITE.stroke_width(2),
    )))?;

    draw_gradient_colorbar(&bar_area, vmin, vmax)?;
    Ok(())
}

fn draw_gradient_colorbar(
    area: &DrawingArea<BitMapBackend, Shift>,
    vmin: f64,
    vmax: f64,
) -> crate::Result<()> {
    let vmax = if vmax > vmin { vmax } else { vmin + 1.0 };
    let mut chart = ChartBuilder::on(area)
        .margin_top(30)
        .margin_bottom(35)
        .margin_right(5)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..1.0, vmin..vmax)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_label_formatter(&|v| format!("{v:.2e}"))
        .draw()?;

    let steps = 128;
    let step = (vmax - vmin) / steps as f64;
    chart.draw_series((0..steps).map(|i| {
        let lo = vmin + step * i as f64;
        Rectangle::new(
            [(0.0, lo), (1.0, lo + step)],
            hot((i as f64 + 0.5) / steps as f64).filled(),
        )
    }))?;
    Ok(())
}

/// Colour of the `index`-th of `count` peak levels.
fn peak_level_color(index: usize, count: usize) -> RGBColor {
    hot(index as f64 / count.max(1) as f64)
}

/// Segments shifted from zoom-window indices to pixel-centre chart coordinates.
fn place_segments(segments: Vec<Segment>, zoom: &ZoomWindow) -> Vec<Vec<(f64, f64)>> {
    let dx = zoom.min_col as f64 + 0.5;
    let dy = zoom.min_row as f64 + 0.5;
    segments
        .into_iter()
        .map(|(s, e)| vec![(s.0 + dx, s.1 + dy), (e.0 + dx, e.1 + dy)])
        .collect()
}

fn draw_contour_panel(
    area: &DrawingArea<BitMapBackend, Shift>,
    image: &ArrayView2<f64>,
    analysis: &TriageAnalysis,
    title: &str,
) -> crate::Result<()> {
    let zoom = &analysis.zoom;
    let zoomed = zoom.slice(image);

    let (width, _) = area.dim_in_pixel();
    let (plot_area, bar_area) = area.split_horizontally(width.saturating_sub(COLORBAR_WIDTH));

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(title, ("sans-serif", 18))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(45)
        .build_cartesian_2d(
            zoom.min_col as f64..(zoom.max_col + 1) as f64,
            zoom.min_row as f64..(zoom.max_row + 1) as f64,
        )?;

    chart
        .configure_mesh()
        .x_desc("x (pixel)")
        .y_desc("y (pixel)")
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.15))
        .draw()?;

    let count = analysis.peak_levels.len();
    for (i, &level) in analysis.peak_levels.iter().enumerate() {
        let color = peak_level_color(i, count);
        let lines = place_segments(marching_squares(&zoomed, level), zoom);
        chart.draw_series(lines.into_iter().map(|line| PathElement::new(line, color.stroke_width(1))))?;
    }

    for &level in &analysis.sigma_levels {
        let lines = place_segments(marching_squares(&zoomed, level), zoom);
        chart.draw_series(lines.into_iter().map(|line| PathElement::new(line, BLACK.stroke_width(1))))?;
    }

    draw_level_colorbar(&bar_area, &analysis.peak_levels)?;
    Ok(())
}

/// Discrete colorbar with one band per peak level.
fn draw_level_colorbar(area: &DrawingArea<BitMapBackend, Shift>, levels: &[f64]) -> crate::Result<()> {
    let top = match levels.last() {
        Some(&top) => top,
        None => return Ok(()),
    };

    let mut chart = ChartBuilder::on(area)
        .margin_top(30)
        .margin_bottom(35)
        .margin_right(5)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..1.0, 0.0..top)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_label_formatter(&|v| format!("{v:.2e}"))
        .draw()?;

    chart.draw_series(levels.iter().enumerate().map(|(i, &level)| {
        let lo = if i == 0 { 0.0 } else { levels[i - 1] };
        Rectangle::new(
            [(0.0, lo), (1.0, level)],
            peak_level_color(i, levels.len()).filled(),
        )
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use shared::image_proc::test_patterns::synthetic_continuum_image;
    use test_helpers::output_path;

    #[test]
    fn test_analyze_synthetic_continuum() {
        let image = synthetic_continuum_image((256, 256), 1e-4, 1e-2, 42);
        let analysis = analyze(&image.view(), &TriageOptions::default()).unwrap();

        assert_relative_eq!(analysis.noise.rms, 1e-4, max_relative = 0.5);
        // Emission is centred, so the zoom window straddles the middle
        assert!(analysis.zoom.contains(128, 128));
        assert!(analysis.zoom.width() < 128);
        assert!(analysis.zoom.height() < 128);

        assert_eq!(analysis.peak_levels.len(), 10);
        assert_relative_eq!(analysis.peak_levels[9], analysis.zoom_max, epsilon = 1e-12);
        assert_eq!(analysis.sigma_levels.len(), 4);
        assert_relative_eq!(
            analysis.sigma_levels[0],
            3.0 * 2.0 * analysis.noise.rms,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_analyze_reports_noise_failure() {
        let image = Array2::<f64>::from_elem((100, 100), f64::NAN);
        let result = analyze(&image.view(), &TriageOptions::default());
        assert!(matches!(result, Err(TriageError::Noise(_))));
    }

    #[test]
    fn test_analyze_reports_zoom_failure() {
        // Noise so large that rms * 1000 exceeds 1: nothing passes the threshold
        let image = synthetic_continuum_image((128, 128), 1.0, 2.0, 3);
        let result = analyze(&image.view(), &TriageOptions::default());
        assert!(matches!(result, Err(TriageError::Zoom(ZoomError::NoSignal { .. }))));
    }

    #[test]
    fn test_place_segments_offsets_to_pixel_centres() {
        let zoom = ZoomWindow {
            min_row: 10,
            max_row: 20,
            min_col: 4,
            max_col: 8,
        };
        let placed = place_segments(vec![((0.0, 0.0), (1.0, 0.5))], &zoom);
        assert_eq!(placed, vec![vec![(4.5, 10.5), (5.5, 11.0)]]);
    }

    #[test]
    fn test_peak_level_colors_stay_visible() {
        // The top level must not be drawn in white on the white background
        assert_ne!(peak_level_color(9, 10), RGBColor(255, 255, 255));
        assert_eq!(peak_level_color(0, 10), hot(0.0));
    }

    #[test]
    fn test_render_triage_writes_png() {
        let image = synthetic_continuum_image((200, 160), 1e-4, 5e-3, 11);
        let path = output_path("triage_synthetic_continuum.png");
        let options = TriageOptions {
            title: Some("synthetic.cont.image.fits".to_string()),
            ..TriageOptions::default()
        };

        render_triage(&image.view(), &path, &options).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
