//! FITS image loading for ALMA data products.
//!
//! ALMA pipeline images are stored as 4-axis cubes (RA, Dec, frequency,
//! Stokes) in the primary HDU, continuum images having degenerate frequency
//! and Stokes axes. The triage tools look at one sky plane: the first
//! channel of the first Stokes parameter, read without loading the rest of
//! the cube.
//!
//! # Coordinate Convention
//!
//! The returned array has shape `(NAXIS2, NAXIS1)`. Row 0 is the first FITS
//! row, which is the bottom of the sky image; plots draw it at the bottom.

use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::FitsFile;
use ndarray::Array2;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during FITS file operations
#[derive(Error, Debug)]
pub enum FitsError {
    #[error("FITS I/O error: {0}")]
    FitsIo(#[from] fitsio::errors::Error),
    #[error("no image data in {0}")]
    NoImageData(PathBuf),
    #[error("unsupported number of axes: {0}")]
    UnsupportedDimensions(i64),
    #[error("invalid image shape: {0}")]
    InvalidShape(String),
}

/// One sky plane and the header values the plots use
#[derive(Debug, Clone)]
pub struct FitsPlane {
    /// Pixel values, `(rows, cols)`
    pub data: Array2<f64>,
    /// Brightness unit from `BUNIT`, e.g. "Jy/beam"
    pub unit: Option<String>,
    /// Target name from `OBJECT`
    pub object: Option<String>,
}

/// Axis lengths `[NAXIS1, NAXIS2, ...]` of an image HDU.
fn axis_lengths(fptr: &mut FitsFile, hdu: &FitsHdu) -> Result<Vec<usize>, FitsError> {
    let naxis = hdu.read_key::<i64>(fptr, "NAXIS").unwrap_or(0);
    let mut lengths = Vec::with_capacity(naxis.max(0) as usize);
    for axis in 1..=naxis {
        let len = hdu.read_key::<i64>(fptr, &format!("NAXIS{axis}"))?;
        if len < 0 {
            return Err(FitsError::InvalidShape(format!("NAXIS{axis} = {len}")));
        }
        lengths.push(len as usize);
    }
    Ok(lengths)
}

/// Read the first sky plane of the first image HDU in `path`.
///
/// Accepts 2-, 3- and 4-axis images. For cubes, the plane at index 0 of every
/// axis beyond NAXIS2 is returned, which is the whole image for continuum
/// products.
///
/// # Errors
/// * [`FitsError::NoImageData`] if no HDU carries an image
/// * [`FitsError::UnsupportedDimensions`] for 1-axis or more than 4-axis images
pub fn read_fits_plane<P: AsRef<Path>>(path: P) -> Result<FitsPlane, FitsError> {
    let mut fptr = FitsFile::open(path.as_ref())?;

    let mut hdu_idx = 0;
    while let Ok(hdu) = fptr.hdu(hdu_idx) {
        hdu_idx += 1;
        // Tables also carry NAXIS keys
        if !matches!(hdu.info, HduInfo::ImageInfo { .. }) {
            continue;
        }
        let lengths = axis_lengths(&mut fptr, &hdu)?;

        if lengths.is_empty() || lengths.iter().any(|&n| n == 0) {
            continue;
        }
        if !(2..=4).contains(&lengths.len()) {
            return Err(FitsError::UnsupportedDimensions(lengths.len() as i64));
        }

        let (cols, rows) = (lengths[0], lengths[1]);
        let pixels: Vec<f64> = hdu.read_section(&mut fptr, 0, rows * cols)?;
        let data = Array2::from_shape_vec((rows, cols), pixels)
            .map_err(|e| FitsError::InvalidShape(e.to_string()))?;

        let unit = hdu.read_key::<String>(&mut fptr, "BUNIT").ok();
        let object = hdu.read_key::<String>(&mut fptr, "OBJECT").ok();

        log::debug!(
            "Read {}x{} plane from HDU {} of {}",
            rows,
            cols,
            hdu_idx - 1,
            path.as_ref().display()
        );

        return Ok(FitsPlane { data, unit, object });
    }

    Err(FitsError::NoImageData(path.as_ref().to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitsio::images::{ImageDescription, ImageType};
    use fitsio::tables::{ColumnDataType, ColumnDescription};
    use tempfile::TempDir;

    /// Write a `(1, channels, n, n)` cube with pixel value `channel * 10000 + row * 100 + col`.
    fn write_cube(path: &Path, n: usize, channels: usize) {
        let description = ImageDescription {
            data_type: ImageType::Double,
            dimensions: &[1, channels, n, n],
        };
        let mut fptr = FitsFile::create(path)
            .with_custom_primary(&description)
            .open()
            .unwrap();
        let hdu = fptr.primary_hdu().unwrap();

        let mut data = Vec::with_capacity(channels * n * n);
        for channel in 0..channels {
            for row in 0..n {
                for col in 0..n {
                    data.push((channel * 10_000 + row * 100 + col) as f64);
                }
            }
        }
        hdu.write_image(&mut fptr, &data).unwrap();
        hdu.write_key(&mut fptr, "BUNIT", "Jy/beam".to_string()).unwrap();
        hdu.write_key(&mut fptr, "OBJECT", "HD_163296".to_string()).unwrap();
    }

    #[test]
    fn test_fits_error_display() {
        let error = FitsError::UnsupportedDimensions(5);
        assert!(error.to_string().contains("unsupported number of axes: 5"));

        let error = FitsError::NoImageData(PathBuf::from("empty.fits"));
        assert!(error.to_string().contains("empty.fits"));
    }

    #[test]
    fn test_reads_first_plane_of_cube() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cube.fits");
        write_cube(&path, 8, 3);

        let plane = read_fits_plane(&path).unwrap();
        assert_eq!(plane.data.dim(), (8, 8));
        assert_eq!(plane.data[[0, 0]], 0.0);
        assert_eq!(plane.data[[2, 5]], 205.0);
        assert_eq!(plane.data[[7, 7]], 707.0);
        assert_eq!(plane.unit.as_deref(), Some("Jy/beam"));
        assert_eq!(plane.object.as_deref(), Some("HD_163296"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = read_fits_plane(dir.path().join("absent.fits"));
        assert!(matches!(result, Err(FitsError::FitsIo(_))));
    }

    #[test]
    fn test_skips_table_before_image_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sources_then_image.fits");
        {
            let mut fptr = FitsFile::create(&path).open().unwrap();

            let columns = [ColumnDescription::new("FLUX")
                .with_type(ColumnDataType::Double)
                .create()
                .unwrap()];
            let table = fptr.create_table("SOURCES", &columns).unwrap();
            table.write_col(&mut fptr, "FLUX", &[1.5f64, 2.5]).unwrap();

            let description = ImageDescription {
                data_type: ImageType::Double,
                dimensions: &[3, 4],
            };
            let image = fptr.create_image("SKY", &description).unwrap();
            let data: Vec<f64> = (0..12).map(f64::from).collect();
            image.write_image(&mut fptr, &data).unwrap();
        }

        let plane = read_fits_plane(&path).unwrap();
        assert_eq!(plane.data.dim(), (3, 4));
        assert_eq!(plane.data[[1, 2]], 6.0);
        assert_eq!(plane.unit, None);
    }
}
