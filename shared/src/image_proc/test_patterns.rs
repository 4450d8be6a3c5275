//! Synthetic sky planes for validating the triage pipeline
//!
//! Provides deterministic noise fields, Gaussian sources and a complete
//! primary-beam-corrected continuum map imitation (noise + central source +
//! blanked corners) for tests and demos.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Generate a 2D array of normally distributed values.
///
/// # Arguments
/// * `size` - Tuple of (rows, cols)
/// * `mean` - Mean of the distribution
/// * `std_dev` - Standard deviation of the distribution (must be positive)
/// * `seed` - Random seed for deterministic output
pub fn simple_normal_array(
    size: (usize, usize),
    mean: f64,
    std_dev: f64,
    seed: u64,
) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal_dist = Normal::new(mean, std_dev)
        .expect("Normal distribution parameters must be valid (std_dev > 0)");
    Array2::from_shape_fn(size, |_| normal_dist.sample(&mut rng))
}

/// Add a circular Gaussian source centred at `(row, col)`.
///
/// # Arguments
/// * `image` - Plane to add the source to
/// * `center` - (row, col) of the peak, may be fractional
/// * `sigma` - Gaussian width in pixels
/// * `amplitude` - Peak value
pub fn add_gaussian_source(
    image: &mut Array2<f64>,
    center: (f64, f64),
    sigma: f64,
    amplitude: f64,
) {
    let two_sigma_sq = 2.0 * sigma * sigma;
    for ((row, col), pixel) in image.indexed_iter_mut() {
        let dr = row as f64 - center.0;
        let dc = col as f64 - center.1;
        *pixel += amplitude * (-(dr * dr + dc * dc) / two_sigma_sq).exp();
    }
}

/// Blank every pixel outside a centred circle of `radius` pixels with NaN.
pub fn blank_outside_radius(image: &mut Array2<f64>, radius: f64) {
    let (rows, cols) = image.dim();
    let (cr, cc) = ((rows as f64 - 1.0) / 2.0, (cols as f64 - 1.0) / 2.0);
    for ((row, col), pixel) in image.indexed_iter_mut() {
        let dr = row as f64 - cr;
        let dc = col as f64 - cc;
        if (dr * dr + dc * dc).sqrt() > radius {
            *pixel = f64::NAN;
        }
    }
}

/// Imitation of a primary-beam-corrected continuum image.
///
/// Gaussian noise of `noise_std`, a compact source of peak `peak` at the
/// centre with width `rows / 32`, and NaN outside a circle of radius
/// `0.45 * min(rows, cols)`.
pub fn synthetic_continuum_image(
    size: (usize, usize),
    noise_std: f64,
    peak: f64,
    seed: u64,
) -> Array2<f64> {
    let (rows, cols) = size;
    let mut image = simple_normal_array(size, 0.0, noise_std, seed);
    let center = ((rows as f64 - 1.0) / 2.0, (cols as f64 - 1.0) / 2.0);
    add_gaussian_source(&mut image, center, (rows as f64 / 32.0).max(1.0), peak);
    blank_outside_radius(&mut image, 0.45 * rows.min(cols) as f64);
    image
}
