//! Regional noise estimate for astronomical images.
//!
//! Cleaned interferometric maps have emission concentrated near the phase
//! centre and a noise-dominated background elsewhere. The background rms is
//! estimated by tiling the image with non-overlapping square patches and
//! taking the smallest standard deviation among patches that contain only
//! valid pixels. Patches touching blanked (non-finite) or masked (exactly
//! zero) pixels are skipped, which keeps the primary-beam edge and any
//! zero-padded border from biasing the estimate.

use log::info;
use ndarray::{s, ArrayView2};
use thiserror::Error;

/// Patch side as a fraction of the shorter image axis.
pub const DEFAULT_PATCH_FRACTION: f64 = 0.03;

/// Errors from the noise estimator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseError {
    #[error("image {rows}x{cols} is too small for patch fraction {fraction}")]
    ImageTooSmall {
        rows: usize,
        cols: usize,
        fraction: f64,
    },
    #[error("no patch free of blank or zero pixels with non-zero spread")]
    NoValidPatch,
}

/// Square image region with half-open bounds.
///
/// Rows are `row_start..row_end` and columns `col_start..col_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl PatchWindow {
    /// Patch height in pixels
    pub fn height(&self) -> usize {
        self.row_end - self.row_start
    }

    /// Patch width in pixels
    pub fn width(&self) -> usize {
        self.col_end - self.col_start
    }

    /// View of the patch pixels within `image`.
    pub fn view<'a>(&self, image: &ArrayView2<'a, f64>) -> ArrayView2<'a, f64> {
        image
            .clone()
            .slice_move(s![self.row_start..self.row_end, self.col_start..self.col_end])
    }
}

/// Result of a noise floor estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseEstimate {
    /// Background rms in image units (Jy/beam for ALMA products)
    pub rms: f64,
    /// Patch the rms was measured in
    pub patch: PatchWindow,
}

/// Estimate the background rms from the quietest valid patch.
///
/// The patch side is `floor(fraction * min(rows, cols))`. Patches are visited
/// in row-major order and the first one with the strictly smallest non-zero
/// population standard deviation wins.
///
/// # Arguments
/// * `image` - 2D sky plane, rows by columns
/// * `fraction` - Patch side relative to the shorter axis (see [`DEFAULT_PATCH_FRACTION`])
///
/// # Errors
/// * [`NoiseError::ImageTooSmall`] if the patch side rounds down to zero
/// * [`NoiseError::NoValidPatch`] if every patch holds a blank or zero pixel
///   or has zero spread
pub fn estimate_rms(image: &ArrayView2<f64>, fraction: f64) -> Result<NoiseEstimate, NoiseError> {
    let (rows, cols) = image.dim();
    let side = (rows.min(cols) as f64 * fraction).floor();
    if !side.is_finite() || side < 1.0 {
        return Err(NoiseError::ImageTooSmall {
            rows,
            cols,
            fraction,
        });
    }
    let side = side as usize;

    let mut best: Option<NoiseEstimate> = None;

    for i in 0..rows / side {
        for j in 0..cols / side {
            let patch = PatchWindow {
                row_start: i * side,
                row_end: (i + 1) * side,
                col_start: j * side,
                col_end: (j + 1) * side,
            };
            let pixels = patch.view(image);

            if pixels.iter().any(|&v| !v.is_finite() || v == 0.0) {
                continue;
            }

            let std = pixels.std(0.0);
            let improves = best.map_or(true, |b| std < b.rms);
            if std > 0.0 && improves {
                best = Some(NoiseEstimate { rms: std, patch });
            }
        }
    }

    let estimate = best.ok_or(NoiseError::NoValidPatch)?;
    info!(
        "Rms: {:.4e} Jy/beam, patch rows {}..{} cols {}..{}",
        estimate.rms,
        estimate.patch.row_start,
        estimate.patch.row_end,
        estimate.patch.col_start,
        estimate.patch.col_end
    );
    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_proc::test_patterns::{simple_normal_array, synthetic_continuum_image};
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn test_patch_side_from_shorter_axis() {
        // 100 x 200 image -> side 3, 33 x 66 patches
        let image = simple_normal_array((100, 200), 0.0, 1.0, 7);
        let estimate = estimate_rms(&image.view(), DEFAULT_PATCH_FRACTION).unwrap();
        assert_eq!(estimate.patch.height(), 3);
        assert_eq!(estimate.patch.width(), 3);
        assert!(estimate.patch.row_end <= 99);
        assert!(estimate.patch.col_end <= 198);
    }

    #[test]
    fn test_image_too_small() {
        let image = Array2::<f64>::ones((20, 20));
        let err = estimate_rms(&image.view(), DEFAULT_PATCH_FRACTION).unwrap_err();
        assert!(matches!(err, NoiseError::ImageTooSmall { rows: 20, cols: 20, .. }));
    }

    #[test]
    fn test_picks_quietest_patch() {
        // Loud background with one quiet 10x10 block at rows 20..30, cols 40..50
        let mut image = simple_normal_array((100, 100), 5.0, 2.0, 11);
        let quiet = simple_normal_array((10, 10), 5.0, 0.01, 12);
        image.slice_mut(s![20..30, 40..50]).assign(&quiet);

        let estimate = estimate_rms(&image.view(), 0.1).unwrap();
        assert_eq!(
            estimate.patch,
            PatchWindow {
                row_start: 20,
                row_end: 30,
                col_start: 40,
                col_end: 50
            }
        );
        assert!(estimate.rms < 0.05);
    }

    #[test]
    fn test_skips_patches_with_blank_or_zero_pixels() {
        let mut image = simple_normal_array((40, 40), 1.0, 1.0, 3);
        // Make the top-left patch very quiet but poison it with a NaN
        let quiet = simple_normal_array((10, 10), 1.0, 0.001, 4);
        image.slice_mut(s![0..10, 0..10]).assign(&quiet);
        image[[3, 3]] = f64::NAN;
        // Same for the next patch with an exact zero
        image.slice_mut(s![0..10, 10..20]).assign(&quiet);
        image[[5, 15]] = 0.0;

        let estimate = estimate_rms(&image.view(), 0.25).unwrap();
        let poisoned = [
            PatchWindow {
                row_start: 0,
                row_end: 10,
                col_start: 0,
                col_end: 10,
            },
            PatchWindow {
                row_start: 0,
                row_end: 10,
                col_start: 10,
                col_end: 20,
            },
        ];
        assert!(!poisoned.contains(&estimate.patch), "picked {:?}", estimate.patch);
        assert!(estimate.rms > 0.1);
    }

    #[test]
    fn test_constant_patches_are_ignored() {
        // Constant patches have zero spread; only the noisy corner qualifies
        let mut image = Array2::from_elem((40, 40), 2.0);
        let noisy = simple_normal_array((10, 10), 2.0, 0.5, 9);
        image.slice_mut(s![30..40, 30..40]).assign(&noisy);

        let estimate = estimate_rms(&image.view(), 0.25).unwrap();
        assert_eq!(estimate.patch.row_start, 30);
        assert_eq!(estimate.patch.col_start, 30);
    }

    #[test]
    fn test_no_valid_patch() {
        let image = Array2::from_elem((50, 50), f64::NAN);
        assert_eq!(
            estimate_rms(&image.view(), DEFAULT_PATCH_FRACTION),
            Err(NoiseError::NoValidPatch)
        );
    }

    #[test]
    fn test_population_std() {
        // Single 2x2 patch: values 1,2,3,4 -> population std sqrt(1.25)
        let image = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let estimate = estimate_rms(&image.view(), 1.0).unwrap();
        assert_relative_eq!(estimate.rms, 1.25f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_recovers_noise_level_on_synthetic_map() {
        let noise_std = 5e-5;
        let image = synthetic_continuum_image((256, 256), noise_std, 1e-2, 42);

        let estimate = estimate_rms(&image.view(), DEFAULT_PATCH_FRACTION).unwrap();

        // The minimum over many patches is biased low, but stays within a factor of two
        assert!(estimate.rms > noise_std * 0.4);
        assert!(estimate.rms < noise_std * 1.1);
    }
}
