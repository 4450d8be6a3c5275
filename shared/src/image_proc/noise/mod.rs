//! Noise floor estimation for interferometric images.
//!
//! - **quantify**: patch-based estimate of the background rms

pub mod quantify;

pub use quantify::{estimate_rms, NoiseError, NoiseEstimate, PatchWindow, DEFAULT_PATCH_FRACTION};
