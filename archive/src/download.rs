//! Bulk download of archive products per target.
//!
//! For each (project, source) pair the archive is queried, the member OUS
//! ids are staged, the matching tarballs are downloaded into
//! `root/<source name>/` and the members matching the extraction pattern
//! (FITS images by default) are unpacked next to them.

use crate::datalink::{stage_data, DataProduct};
use crate::observation::Target;
use crate::tap::ArchiveClient;
use crate::{ArchiveError, Result};
use log::{error, info, warn};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Pattern for tar members extracted by default
pub const DEFAULT_EXTRACT_PATTERN: &str = r".*\.fits$";

/// Options controlling which files are fetched and what is kept
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Keep only URLs mentioning the source name, dropping calibrator products
    pub remove_calibration: bool,
    /// Case-insensitive substrings; when non-empty only matching URLs are kept
    pub specific: Vec<String>,
    /// Tar members to extract
    pub extract_pattern: Regex,
    /// Keep the tarballs after extraction
    pub keep_archives: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            remove_calibration: true,
            specific: Vec::new(),
            extract_pattern: Regex::new(DEFAULT_EXTRACT_PATTERN)
                .unwrap_or_else(|_| unreachable!("default extract pattern is valid")),
            keep_archives: false,
        }
    }
}

impl DownloadOptions {
    pub fn with_specific<S: Into<String>>(mut self, specific: impl IntoIterator<Item = S>) -> Self {
        self.specific = specific.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extract_pattern(mut self, pattern: &str) -> Result<Self> {
        self.extract_pattern = Regex::new(pattern)?;
        Ok(self)
    }
}

/// Outcome of a [`download_files`] run
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DownloadReport {
    /// URLs downloaded successfully
    pub downloaded: Vec<String>,
    /// Files extracted from the downloaded tarballs
    pub extracted: Vec<PathBuf>,
    /// Targets with no file matching the selection
    pub unavailable: Vec<Target>,
    /// Targets whose processing failed, with the error
    pub failed: Vec<(Target, String)>,
}

/// Pick the tarball URLs worth downloading for `source_name`.
pub fn select_files(
    products: &[DataProduct],
    source_name: &str,
    options: &DownloadOptions,
) -> Vec<String> {
    let source_forms = [source_name.to_uppercase(), source_name.replace(' ', "_").to_uppercase()];

    let candidates: Vec<&str> = products
        .iter()
        .map(|p| p.access_url.as_str())
        .filter(|url| url.ends_with("tar"))
        .filter(|url| {
            !options.remove_calibration || {
                let upper = url.to_uppercase();
                source_forms.iter().any(|s| upper.contains(s.as_str()))
            }
        })
        .collect();

    if options.specific.is_empty() {
        return candidates.into_iter().map(str::to_string).collect();
    }

    let mut seen = HashSet::new();
    options
        .specific
        .iter()
        .flat_map(|sp| {
            let sp = sp.to_uppercase();
            candidates
                .iter()
                .filter(move |url| url.to_uppercase().contains(&sp))
                .copied()
        })
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

/// Last path segment of a URL, without query string.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Download `url` into `dir`, returning the written path.
///
/// The body is streamed to a temporary file next to the destination that is
/// renamed once complete and removed if the transfer fails, so an interrupted
/// download never leaves a truncated tarball behind.
pub fn download_file(client: &ArchiveClient, url: &str, dir: &Path) -> Result<PathBuf> {
    let name =
        file_name_from_url(url).ok_or_else(|| ArchiveError::InvalidUrl(url.to_string()))?;
    let path = dir.join(name);

    let mut response = client.get(url)?;
    let temp = tempfile::Builder::new()
        .prefix(name)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    let mut file = BufWriter::new(temp);
    let bytes = io::copy(&mut response, &mut file)?;
    let temp = file.into_inner().map_err(io::IntoInnerError::into_error)?;

    temp.persist(&path).map_err(|e| e.error)?;
    info!("Downloaded {name} ({:.1} MB)", bytes as f64 / 1.0e6);
    Ok(path)
}

/// Unpack tar members whose path matches `pattern` into `dest`.
///
/// Archive directory structure is preserved below `dest`.
pub fn extract_matching(tar_path: &Path, dest: &Path, pattern: &Regex) -> Result<Vec<PathBuf>> {
    let mut archive = tar::Archive::new(BufReader::new(File::open(tar_path)?));
    let mut extracted = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        if !entry.header().entry_type().is_file() {
            continue;
        }
        if !pattern.is_match(&entry_path.to_string_lossy()) {
            continue;
        }
        if entry.unpack_in(dest)? {
            extracted.push(dest.join(&entry_path));
        } else {
            warn!("Skipped unsafe tar member {}", entry_path.display());
        }
    }

    Ok(extracted)
}

/// Download and extract the files of every target, sequentially.
///
/// Failures are logged and recorded per target; the remaining targets are
/// still processed.
pub fn download_files(
    client: &ArchiveClient,
    targets: &[Target],
    root: &Path,
    options: &DownloadOptions,
) -> DownloadReport {
    let mut report = DownloadReport::default();

    for (i, target) in targets.iter().enumerate() {
        info!("[{}/{}] {target}", i + 1, targets.len());
        if let Err(e) = download_target(client, target, root, options, &mut report) {
            error!("Failed to download {target}: {e}");
            report.failed.push((target.clone(), e.to_string()));
        }
    }

    info!(
        "Downloaded {} files, extracted {}, {} targets unavailable, {} failed",
        report.downloaded.len(),
        report.extracted.len(),
        report.unavailable.len(),
        report.failed.len()
    );
    report
}

fn download_target(
    client: &ArchiveClient,
    target: &Target,
    root: &Path,
    options: &DownloadOptions,
    report: &mut DownloadReport,
) -> Result<()> {
    let table = client.query_object(&target.project_code, &target.source_name)?;
    let uids = table.member_ous_ids();
    let products = stage_data(client, &uids)?;
    let files = select_files(&products, &target.source_name, options);

    if files.is_empty() {
        warn!("No matching products for {target}");
        report.unavailable.push(target.clone());
        return Ok(());
    }

    let location = root.join(&target.source_name);
    fs::create_dir_all(&location)?;

    for url in files {
        let tar_path = download_file(client, &url, &location)?;
        report.downloaded.push(url);

        // A tarball that fails to extract is removed even when archives are kept
        let extracted = extract_matching(&tar_path, &location, &options.extract_pattern);
        if !options.keep_archives || extracted.is_err() {
            if let Err(e) = fs::remove_file(&tar_path) {
                warn!("Failed to remove {}: {e}", tar_path.display());
            }
        }
        let extracted = extracted?;
        info!("Extracted {} files from {}", extracted.len(), tar_path.display());
        report.extracted.extend(extracted);
    }

    Ok(())
}
