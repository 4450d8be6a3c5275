//! Visualization of ALMA continuum images for quick-look triage.
//!
//! # Core Modules
//!
//! ## Triage figures (`triage`)
//! Two-panel PNG per image: the full intensity map with the noise patch
//! outlined, and a contour view of the auto-zoomed emission with peak and
//! sigma contour families.
//!
//! ## Building blocks
//! - `colormap`: matplotlib-compatible "hot" colour ramp
//! - `contour`: marching-squares iso-lines over image arrays
//!
//! ## Terminal output (`pixel_histogram`)
//! ASCII histogram of pixel values for inspecting an image's dynamic range
//! without opening the PNG.
//!
//! # Usage
//! ```rust,no_run
//! use shared::image_proc::read_fits_plane;
//! use viz::triage::{render_triage, TriageOptions};
//!
//! let plane = read_fits_plane("HD_163296.cont.image.fits")?;
//! let options = TriageOptions {
//!     title: Some("HD_163296.cont.image.fits".to_string()),
//!     ..TriageOptions::default()
//! };
//! let analysis = render_triage(&plane.data.view(), "plots/HD_163296.png", &options)?;
//! println!("rms = {:.3e}", analysis.noise.rms);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use plotters::drawing::DrawingAreaErrorKind;
use std::fmt;
use thiserror::Error;

/// Error types for visualization operations.
#[derive(Debug, Error)]
pub enum VizError {
    /// Histogram creation error, e.g. invalid bin configuration
    #[error("Histogram error: {0}")]
    HistogramError(String),

    /// Text formatting error while building terminal output
    #[error("Formatting error: {0}")]
    FmtError(#[from] fmt::Error),

    /// Failure inside the plotting backend
    #[error("Drawing error: {0}")]
    DrawError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl<E> From<DrawingAreaErrorKind<E>> for VizError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        VizError::DrawError(err.to_string())
    }
}

/// Standard Result type for all visualization operations.
pub type Result<T> = std::result::Result<T, VizError>;

pub mod colormap;
pub mod contour;
pub mod pixel_histogram;
pub mod triage;
