//! Shared components for the ALMA triage tools.
//!
//! This crate holds the image analysis kernel used before plotting (noise
//! floor estimation, auto-zoom, contour levels), FITS plane loading, and the
//! persistent configuration shared by the archive and visualization binaries.

pub mod config_storage;
pub mod image_proc;
