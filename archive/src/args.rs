//! Command-line arguments shared by the archive and triage binaries.
//!
//! [`SharedArchiveArgs`] overrides the stored connection settings and handles
//! login; [`SelectionArgs`] turns query flags into an [`ObservationQuery`],
//! starting from the default science selection unless `--no-defaults` is given.

use crate::constraint::{DateConstraint, NumericConstraint};
use crate::query::ObservationQuery;
use crate::selection::{self, EXCLUDED_CATEGORIES};
use crate::tap::ArchiveClient;
use crate::Result;
use clap::Parser;
use log::{info, warn};
use shared::config_storage::{ArchiveConfig, ConfigStorage};
use std::path::PathBuf;

/// Environment variable holding the archive password
pub const PASSWORD_ENV: &str = "ALMA_PASSWORD";

/// Connection arguments shared by the archive binaries
#[derive(Parser, Debug, Clone)]
pub struct SharedArchiveArgs {
    /// Configuration directory (default: ~/.alma_triage)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Archive mirror base URL; repeat to try several in order
    #[arg(long = "archive-url")]
    pub archive_urls: Vec<String>,

    /// HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Archive account; the password is read from ALMA_PASSWORD
    #[arg(long)]
    pub username: Option<String>,
}

impl SharedArchiveArgs {
    /// Stored configuration with command-line overrides applied.
    pub fn resolve_config(&self) -> std::io::Result<ArchiveConfig> {
        let storage = match &self.config_dir {
            Some(dir) => ConfigStorage::with_path(dir.clone()),
            None => ConfigStorage::new()?,
        };
        let mut config = storage.load_archive_config()?;

        if !self.archive_urls.is_empty() {
            config.archive_urls = self.archive_urls.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.username.is_some() {
            config.username = self.username.clone();
        }
        Ok(config)
    }

    /// Build a client, logging in when a username and password are available.
    pub fn connect(&self) -> anyhow::Result<ArchiveClient> {
        let config = self.resolve_config()?;
        let mut client = ArchiveClient::new(&config)?;

        if let Some(username) = &config.username {
            match std::env::var(PASSWORD_ENV) {
                Ok(password) => client.login(username, &password)?,
                Err(_) => warn!("{PASSWORD_ENV} not set, continuing anonymously as public user"),
            }
        }
        info!("Using archive mirrors: {}", client.mirrors().join(", "));
        Ok(client)
    }
}

/// Observation selection arguments; unset fields fall back to the default
/// science selection.
#[derive(Parser, Debug, Clone)]
pub struct SelectionArgs {
    /// Project code, e.g. 2016.1.00484.L
    #[arg(long)]
    pub project_code: Option<String>,

    /// Source name, `*` as wildcard
    #[arg(long)]
    pub source_name: Option<String>,

    /// Observation start date constraint, e.g. ">01-01-2015"
    #[arg(long)]
    pub start_date: Option<DateConstraint>,

    /// Spatial resolution constraint in arcsec, e.g. "<0.1"
    #[arg(long)]
    pub spatial_resolution: Option<NumericConstraint>,

    /// Integration time constraint in seconds, e.g. ">1000"
    #[arg(long)]
    pub integration_time: Option<NumericConstraint>,

    /// Water vapour constraint in mm, e.g. "<2"
    #[arg(long)]
    pub water_vapour: Option<NumericConstraint>,

    /// Receiver bands (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub bands: Vec<u8>,

    /// Science keywords; repeat for several
    #[arg(long = "science-keyword")]
    pub science_keywords: Vec<String>,

    /// Scientific categories to drop; repeat for several
    #[arg(long = "exclude-category")]
    pub exclude_categories: Vec<String>,

    /// Include proprietary data (requires login)
    #[arg(long, default_value_t = false)]
    pub include_proprietary: bool,

    /// Include calibration observations
    #[arg(long, default_value_t = false)]
    pub include_calibration: bool,

    /// Start from an empty query instead of the default science selection
    #[arg(long, default_value_t = false)]
    pub no_defaults: bool,
}

impl SelectionArgs {
    /// Query built from the default selection with these overrides.
    pub fn to_query(&self) -> Result<ObservationQuery> {
        let mut query = if self.no_defaults {
            ObservationQuery::new()
        } else {
            selection::default_science_query()?
        };

        if let Some(code) = &self.project_code {
            query.project_code = Some(code.clone());
        }
        if let Some(name) = &self.source_name {
            query.source_name = Some(name.clone());
        }
        if let Some(date) = self.start_date {
            query.start_date = Some(date);
        }
        if let Some(res) = self.spatial_resolution {
            query.spatial_resolution = Some(res);
        }
        if let Some(time) = self.integration_time {
            query.integration_time = Some(time);
        }
        if let Some(pwv) = self.water_vapour {
            query.water_vapour = Some(pwv);
        }
        if !self.bands.is_empty() {
            query.bands = self.bands.clone();
        }
        if !self.science_keywords.is_empty() {
            query.science_keywords = self.science_keywords.clone();
        }
        query.public_only = !self.include_proprietary;
        query.science_only = !self.include_calibration;

        Ok(query)
    }

    /// Categories to drop from the query result.
    pub fn excluded_categories(&self) -> Vec<String> {
        if !self.exclude_categories.is_empty() {
            self.exclude_categories.clone()
        } else if self.no_defaults {
            Vec::new()
        } else {
            EXCLUDED_CATEGORIES.iter().map(|s| s.to_string()).collect()
        }
    }
}
