//! Auto-zoom window for emission-dominated regions.
//!
//! The triage plots show the whole map on the left and a contour view of the
//! emission on the right. The contour view is cropped to the smallest
//! row/column window containing every pixel above a threshold that scales
//! with the noise floor, so compact sources fill the panel.

use super::noise::NoiseEstimate;
use ndarray::{s, ArrayView2, Axis};
use thiserror::Error;

/// Scale from background rms to the relative zoom limit used by [`auto_zoom`].
pub const ZOOM_RMS_SCALE: f64 = 1000.0;

/// Errors from zoom window extraction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZoomError {
    #[error("image has no pixels")]
    EmptyImage,
    #[error("no pixel exceeds {threshold:.4e}")]
    NoSignal { threshold: f64 },
}

/// Rectangular image window with inclusive bounds.
///
/// Rows increase away from the bottom of the sky image, columns to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomWindow {
    /// First row (inclusive)
    pub min_row: usize,
    /// Last row (inclusive)
    pub max_row: usize,
    /// First column (inclusive)
    pub min_col: usize,
    /// Last column (inclusive)
    pub max_col: usize,
}

impl ZoomWindow {
    /// Number of rows covered
    pub fn height(&self) -> usize {
        self.max_row - self.min_row + 1
    }

    /// Number of columns covered
    pub fn width(&self) -> usize {
        self.max_col - self.min_col + 1
    }

    /// Check whether a pixel lies inside the window
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.min_row && row <= self.max_row && col >= self.min_col && col <= self.max_col
    }

    /// View of the window within `image`.
    pub fn slice<'a>(&self, image: &ArrayView2<'a, f64>) -> ArrayView2<'a, f64> {
        image
            .clone()
            .slice_move(s![self.min_row..=self.max_row, self.min_col..=self.max_col])
    }
}

/// First and last index along `axis` whose lane holds a pixel above `threshold`.
fn extent(image: &ArrayView2<f64>, axis: Axis, threshold: f64) -> Option<(usize, usize)> {
    let hits: Vec<usize> = image
        .axis_iter(axis)
        .enumerate()
        .filter(|(_, lane)| lane.iter().any(|&v| clean(v) > threshold))
        .map(|(idx, _)| idx)
        .collect();
    Some((*hits.first()?, *hits.last()?))
}

/// Blank pixels count as zero signal.
fn clean(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Find the window around pixels brighter than `lim` times the image maximum.
///
/// Non-finite pixels are read as zero; the input is not modified. The row
/// extent and the column extent are found separately, so the window is the
/// bounding box of all pixels above threshold.
///
/// # Arguments
/// * `image` - 2D sky plane
/// * `lim` - Threshold relative to the image maximum
///
/// # Errors
/// * [`ZoomError::EmptyImage`] for a zero-sized image
/// * [`ZoomError::NoSignal`] if no pixel exceeds the threshold
pub fn zoom_window(image: &ArrayView2<f64>, lim: f64) -> Result<ZoomWindow, ZoomError> {
    if image.is_empty() {
        return Err(ZoomError::EmptyImage);
    }

    let max = image
        .iter()
        .map(|&v| clean(v))
        .fold(f64::NEG_INFINITY, f64::max);
    let threshold = lim * max;

    let no_signal = ZoomError::NoSignal { threshold };
    let (min_row, max_row) = extent(image, Axis(0), threshold).ok_or(no_signal.clone())?;
    let (min_col, max_col) = extent(image, Axis(1), threshold).ok_or(no_signal)?;

    Ok(ZoomWindow {
        min_row,
        max_row,
        min_col,
        max_col,
    })
}

/// Zoom window using the noise-relative limit `rms * ZOOM_RMS_SCALE`.
pub fn auto_zoom(image: &ArrayView2<f64>, noise: &NoiseEstimate) -> Result<ZoomWindow, ZoomError> {
    zoom_window(image, noise.rms * ZOOM_RMS_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_proc::noise::PatchWindow;
    use ndarray::Array2;

    #[test]
    fn test_single_bright_pixel() {
        let mut image = Array2::<f64>::zeros((10, 10));
        image[[4, 7]] = 1.0;

        let window = zoom_window(&image.view(), 0.5).unwrap();
        assert_eq!(
            window,
            ZoomWindow {
                min_row: 4,
                max_row: 4,
                min_col: 7,
                max_col: 7
            }
        );
        assert_eq!(window.height(), 1);
        assert_eq!(window.width(), 1);
    }

    #[test]
    fn test_extents_found_separately() {
        // Two sources on a diagonal; the window spans both
        let mut image = Array2::<f64>::zeros((20, 30));
        image[[2, 25]] = 10.0;
        image[[15, 3]] = 8.0;

        let window = zoom_window(&image.view(), 0.1).unwrap();
        assert_eq!(window.min_row, 2);
        assert_eq!(window.max_row, 15);
        assert_eq!(window.min_col, 3);
        assert_eq!(window.max_col, 25);
        assert!(window.contains(10, 10));
        assert!(!window.contains(1, 10));
    }

    #[test]
    fn test_non_square_image() {
        let mut image = Array2::<f64>::zeros((5, 40));
        image[[1, 30]] = 3.0;
        image[[3, 35]] = 3.0;

        let window = zoom_window(&image.view(), 0.5).unwrap();
        assert_eq!((window.min_row, window.max_row), (1, 3));
        assert_eq!((window.min_col, window.max_col), (30, 35));
        assert_eq!(window.slice(&image.view()).dim(), (3, 6));
    }

    #[test]
    fn test_blank_pixels_read_as_zero() {
        let mut image = Array2::<f64>::from_elem((8, 8), f64::NAN);
        image[[2, 2]] = 1.0;
        image[[5, 6]] = f64::INFINITY;

        let window = zoom_window(&image.view(), 0.5).unwrap();
        assert_eq!(window.min_row, 2);
        assert_eq!(window.max_row, 2);
        // Input untouched
        assert!(image[[0, 0]].is_nan());
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut image = Array2::<f64>::zeros((4, 4));
        image[[1, 1]] = 1.0;
        image[[2, 2]] = 0.5;

        let window = zoom_window(&image.view(), 0.5).unwrap();
        assert_eq!(window.max_row, 1);
        assert_eq!(window.max_col, 1);
    }

    #[test]
    fn test_no_signal() {
        let image = Array2::<f64>::zeros((4, 4));
        assert!(matches!(
            zoom_window(&image.view(), 0.1),
            Err(ZoomError::NoSignal { .. })
        ));

        let mut image = Array2::<f64>::zeros((4, 4));
        image[[0, 0]] = 1.0;
        assert!(zoom_window(&image.view(), 1.0).is_err());
    }

    #[test]
    fn test_empty_image() {
        let image = Array2::<f64>::zeros((0, 5));
        assert_eq!(zoom_window(&image.view(), 0.1), Err(ZoomError::EmptyImage));
    }

    #[test]
    fn test_auto_zoom_uses_noise_scale() {
        let mut image = Array2::<f64>::zeros((10, 10));
        image[[5, 5]] = 1.0;
        image[[8, 8]] = 0.04;
        let noise = NoiseEstimate {
            rms: 5e-5,
            patch: PatchWindow {
                row_start: 0,
                row_end: 1,
                col_start: 0,
                col_end: 1,
            },
        };

        // lim = 0.05, so the 0.04 pixel is excluded
        let window = auto_zoom(&image.view(), &noise).unwrap();
        assert_eq!(window.max_row, 5);
        assert_eq!(window.max_col, 5);
    }
}
