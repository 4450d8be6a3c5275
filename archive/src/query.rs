//! ADQL generation for observation searches.
//!
//! [`ObservationQuery`] collects the search fields of the archive query form
//! and renders them as a `SELECT` over the `ivoa.obscore` table, with one
//! condition per populated field joined by `AND`.

use crate::constraint::{DateConstraint, NumericConstraint};

/// Table holding one row per observation (member OUS and target).
pub const OBSCORE_TABLE: &str = "ivoa.obscore";

/// Search over the archive's observation table
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationQuery {
    pub project_code: Option<String>,
    /// Target name, `*` matches any run of characters
    pub source_name: Option<String>,
    pub start_date: Option<DateConstraint>,
    /// Angular resolution in arcsec
    pub spatial_resolution: Option<NumericConstraint>,
    /// Integration time in seconds
    pub integration_time: Option<NumericConstraint>,
    /// Precipitable water vapour in mm
    pub water_vapour: Option<NumericConstraint>,
    /// Receiver bands, any of which may match
    pub bands: Vec<u8>,
    /// Science keywords, any of which may match
    pub science_keywords: Vec<String>,
    /// Restrict to data past its proprietary period
    pub public_only: bool,
    /// Restrict to science (non-calibration) observations
    pub science_only: bool,
}

impl Default for ObservationQuery {
    fn default() -> Self {
        Self {
            project_code: None,
            source_name: None,
            start_date: None,
            spatial_resolution: None,
            integration_time: None,
            water_vapour: None,
            bands: Vec::new(),
            science_keywords: Vec::new(),
            public_only: true,
            science_only: true,
        }
    }
}

/// Quote a string literal, doubling embedded single quotes.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Join alternatives with OR, parenthesised when there is more than one.
fn any_of(conditions: Vec<String>) -> Option<String> {
    match conditions.len() {
        0 => None,
        1 => conditions.into_iter().next(),
        _ => Some(format!("({})", conditions.join(" OR "))),
    }
}

impl ObservationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_code(mut self, code: impl Into<String>) -> Self {
        self.project_code = Some(code.into());
        self
    }

    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn start_date(mut self, constraint: DateConstraint) -> Self {
        self.start_date = Some(constraint);
        self
    }

    pub fn spatial_resolution(mut self, constraint: NumericConstraint) -> Self {
        self.spatial_resolution = Some(constraint);
        self
    }

    pub fn integration_time(mut self, constraint: NumericConstraint) -> Self {
        self.integration_time = Some(constraint);
        self
    }

    pub fn water_vapour(mut self, constraint: NumericConstraint) -> Self {
        self.water_vapour = Some(constraint);
        self
    }

    pub fn bands(mut self, bands: impl IntoIterator<Item = u8>) -> Self {
        self.bands = bands.into_iter().collect();
        self
    }

    pub fn science_keywords<S: Into<String>>(mut self, keywords: impl IntoIterator<Item = S>) -> Self {
        self.science_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn public_only(mut self, public_only: bool) -> Self {
        self.public_only = public_only;
        self
    }

    pub fn science_only(mut self, science_only: bool) -> Self {
        self.science_only = science_only;
        self
    }

    /// Conditions of the WHERE clause, in a stable order.
    pub fn conditions(&self) -> Vec<String> {
        let mut conditions = Vec::new();

        if let Some(code) = &self.project_code {
            conditions.push(format!("proposal_id={}", quote(code)));
        }
        if let Some(name) = &self.source_name {
            if name.contains('*') {
                conditions.push(format!("target_name LIKE {}", quote(&name.replace('*', "%"))));
            } else {
                conditions.push(format!("target_name={}", quote(name)));
            }
        }
        if let Some(date) = &self.start_date {
            conditions.push(date.to_adql("t_min"));
        }
        if let Some(res) = &self.spatial_resolution {
            conditions.push(res.to_adql("spatial_resolution"));
        }
        if let Some(time) = &self.integration_time {
            conditions.push(time.to_adql("t_exptime"));
        }
        if let Some(pwv) = &self.water_vapour {
            conditions.push(pwv.to_adql("pwv"));
        }
        if let Some(bands) = any_of(
            self.bands
                .iter()
                .map(|b| format!("band_list LIKE '%{b}%'"))
                .collect(),
        ) {
            conditions.push(bands);
        }
        if let Some(keywords) = any_of(
            self.science_keywords
                .iter()
                .map(|k| format!("science_keyword LIKE {}", quote(&format!("%{k}%"))))
                .collect(),
        ) {
            conditions.push(keywords);
        }
        if self.public_only {
            conditions.push("data_rights='Public'".to_string());
        }
        if self.science_only {
            conditions.push("science_observation='T'".to_string());
        }

        conditions
    }

    /// Render the query as ADQL.
    pub fn to_adql(&self) -> String {
        let conditions = self.conditions();
        if conditions.is_empty() {
            format!("SELECT * FROM {OBSCORE_TABLE}")
        } else {
            format!(
                "SELECT * FROM {OBSCORE_TABLE} WHERE {}",
                conditions.join(" AND ")
            )
        }
    }
}
