//! Client for the ALMA science archive.
//!
//! Covers the data acquisition half of the triage workflow:
//!
//! - **constraint**: astroquery-style numeric and date constraints (`"<0.1"`, `">01-01-2015"`)
//! - **query**: ADQL generation against the `ivoa.obscore` table
//! - **tap**: [`ArchiveClient`], mirror fallback, login and TAP queries
//! - **observation**: observation records and table filtering
//! - **selection**: the default star/disk-formation science selection
//! - **datalink**: staging of data products for member OUS ids
//! - **download**: sequential download and tar extraction per target
//! - **spreadsheet**: XLSX and CSV export of observation tables
//! - **fits_finder**: discovery of downloaded FITS images
//! - **args**: command-line arguments shared by the archive binaries

use thiserror::Error;

pub mod args;
pub mod constraint;
pub mod datalink;
pub mod download;
pub mod fits_finder;
pub mod observation;
pub mod query;
pub mod selection;
pub mod spreadsheet;
pub mod tap;

#[cfg(test)]
pub(crate) mod test_server;

pub use constraint::{ArchiveDate, Constraint, DateConstraint, NumericConstraint};
pub use datalink::DataProduct;
pub use download::{download_files, select_files, DownloadOptions, DownloadReport};
pub use observation::{ObservationRecord, ObservationTable, Target};
pub use query::ObservationQuery;
pub use tap::ArchiveClient;

/// Errors raised while talking to the archive or exporting its results
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("archive rejected query: {0}")]
    Query(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("{0} answered with a document that is not a query result")]
    UnexpectedResponse(String),

    #[error("URL has no file name: {0}")]
    InvalidUrl(String),

    #[error("login failed: {0}")]
    Auth(String),

    #[error("no archive mirror configured")]
    NoMirror,
}

/// Standard Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
