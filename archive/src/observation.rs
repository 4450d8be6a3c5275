//! Observation records returned by archive queries.
//!
//! Each row of the obscore table describes one observation of one target
//! within a member observing unit set (OUS). Only the project code and the
//! source name are needed to drive downloads; the remaining columns are
//! carried for the exported table. Unknown columns are ignored and missing
//! ones are left empty.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Read;

/// Column headers of the exported observation table, in export order.
pub const COLUMN_NAMES: [&str; 34] = [
    "Project code",
    "Source name",
    "RA",
    "Dec",
    "Galactic longitude",
    "Galactic latitude",
    "Band",
    "Spatial resolution",
    "Frequency resolution",
    "Array",
    "Mosaic",
    "Integration",
    "Release date",
    "Frequency support",
    "Velocity resolution",
    "Pol products",
    "Observation date",
    "PI name",
    "SB name",
    "Proposal authors",
    "Line sensitivity (10 km/s)",
    "Continuum sensitivity",
    "PWV",
    "Group ous id",
    "Member ous id",
    "Asdm uid",
    "Project title",
    "Project type",
    "Scan intent",
    "Field of view",
    "Largest angular scale",
    "QA2 Status",
    "Science keyword",
    "Scientific category",
];

/// One row of the obscore table
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ObservationRecord {
    #[serde(rename = "proposal_id")]
    pub project_code: String,
    #[serde(rename = "target_name")]
    pub source_name: String,
    #[serde(rename = "s_ra")]
    pub ra: Option<f64>,
    #[serde(rename = "s_dec")]
    pub dec: Option<f64>,
    pub gal_longitude: Option<f64>,
    pub gal_latitude: Option<f64>,
    #[serde(rename = "band_list")]
    pub band: Option<String>,
    pub spatial_resolution: Option<f64>,
    pub frequency_resolution: Option<f64>,
    #[serde(rename = "antenna_arrays")]
    pub array: Option<String>,
    #[serde(rename = "is_mosaic")]
    pub mosaic: Option<String>,
    #[serde(rename = "t_exptime")]
    pub integration: Option<f64>,
    #[serde(rename = "obs_release_date")]
    pub release_date: Option<String>,
    pub frequency_support: Option<String>,
    pub velocity_resolution: Option<f64>,
    #[serde(rename = "pol_states")]
    pub pol_products: Option<String>,
    /// Observation start (MJD)
    #[serde(rename = "t_min")]
    pub observation_date: Option<f64>,
    pub pi_name: Option<String>,
    #[serde(rename = "schedblock_name")]
    pub sb_name: Option<String>,
    pub proposal_authors: Option<String>,
    #[serde(rename = "sensitivity_10kms")]
    pub line_sensitivity: Option<f64>,
    #[serde(rename = "cont_sensitivity_bandwidth")]
    pub continuum_sensitivity: Option<f64>,
    pub pwv: Option<f64>,
    #[serde(rename = "group_ous_uid")]
    pub group_ous_id: Option<String>,
    #[serde(rename = "member_ous_uid")]
    pub member_ous_id: Option<String>,
    pub asdm_uid: Option<String>,
    #[serde(rename = "obs_title")]
    pub project_title: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub scan_intent: Option<String>,
    #[serde(rename = "s_fov")]
    pub field_of_view: Option<f64>,
    #[serde(rename = "spatial_scale_max")]
    pub largest_angular_scale: Option<f64>,
    #[serde(rename = "qa2_passed")]
    pub qa2_status: Option<String>,
    pub science_keyword: Option<String>,
    pub scientific_category: Option<String>,
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn number(value: &Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl ObservationRecord {
    /// Cell values in [`COLUMN_NAMES`] order; missing values are empty.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.project_code.clone(),
            self.source_name.clone(),
            number(&self.ra),
            number(&self.dec),
            number(&self.gal_longitude),
            number(&self.gal_latitude),
            text(&self.band),
            number(&self.spatial_resolution),
            number(&self.frequency_resolution),
            text(&self.array),
            text(&self.mosaic),
            number(&self.integration),
            text(&self.release_date),
            text(&self.frequency_support),
            number(&self.velocity_resolution),
            text(&self.pol_products),
            number(&self.observation_date),
            text(&self.pi_name),
            text(&self.sb_name),
            text(&self.proposal_authors),
            number(&self.line_sensitivity),
            number(&self.continuum_sensitivity),
            number(&self.pwv),
            text(&self.group_ous_id),
            text(&self.member_ous_id),
            text(&self.asdm_uid),
            text(&self.project_title),
            text(&self.project_type),
            text(&self.scan_intent),
            number(&self.field_of_view),
            number(&self.largest_angular_scale),
            text(&self.qa2_status),
            text(&self.science_keyword),
            text(&self.scientific_category),
        ]
    }

    /// Project code and source name of this row
    pub fn target(&self) -> Target {
        Target {
            project_code: self.project_code.clone(),
            source_name: self.source_name.clone(),
        }
    }
}

/// An observed source within a project; the unit of download.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Target {
    pub project_code: String,
    pub source_name: String,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.project_code, self.source_name)
    }
}

/// Result rows of an archive query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    records: Vec<ObservationRecord>,
}

impl ObservationTable {
    pub fn new(records: Vec<ObservationRecord>) -> Self {
        Self { records }
    }

    /// Parse a CSV query response with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);
        let records = csv_reader
            .deserialize()
            .collect::<std::result::Result<Vec<ObservationRecord>, csv::Error>>()?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop rows whose scientific category is one of `categories`.
    pub fn exclude_categories<S: AsRef<str>>(&mut self, categories: &[S]) {
        self.records.retain(|r| match &r.scientific_category {
            Some(category) => !categories.iter().any(|c| c.as_ref() == category),
            None => true,
        });
    }

    /// Distinct (project code, source name) pairs in table order.
    pub fn targets(&self) -> Vec<Target> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(ObservationRecord::target)
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    /// Distinct member OUS ids in table order.
    pub fn member_ous_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter_map(|r| r.member_ous_id.clone())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect()
    }
}
