//! Image analysis for radio continuum and line cubes.
//!
//! # Module Organization
//!
//! - **io**: FITS loading, reducing 2-, 3- and 4-axis cubes to one sky plane
//! - **noise**: regional noise floor estimate from the quietest image patch
//! - **zoom**: auto-zoom window around emission above a noise-relative threshold
//! - **contour_levels**: peak-relative and sigma-relative contour levels
//! - **test_patterns**: synthetic sky planes for tests and demos
//!
//! All routines operate on `ndarray` views of `f64` pixels. Non-finite pixels
//! (blanked regions outside the primary beam) are expected and handled.

pub mod contour_levels;
pub mod io;
pub mod noise;
pub mod test_patterns;
pub mod zoom;

pub use contour_levels::{peak_levels, sigma_levels};
pub use io::{read_fits_plane, FitsError, FitsPlane};
pub use noise::{estimate_rms, NoiseError, NoiseEstimate, PatchWindow, DEFAULT_PATCH_FRACTION};
pub use zoom::{auto_zoom, zoom_window, ZoomError, ZoomWindow, ZOOM_RMS_SCALE};
