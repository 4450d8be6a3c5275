//! Default science selection: recent, high resolution, deep observations of
//! star and disk formation in bands 6 to 9.

use crate::observation::{ObservationTable, Target};
use crate::query::ObservationQuery;
use crate::tap::ArchiveClient;
use crate::{ArchiveError, Result};
use log::info;

pub const DEFAULT_START_DATE: &str = ">01-01-2015";
pub const DEFAULT_SPATIAL_RESOLUTION: &str = "<0.1";
pub const DEFAULT_INTEGRATION_TIME: &str = ">1000";
pub const DEFAULT_WATER_VAPOUR: &str = "<2";
pub const DEFAULT_BANDS: [u8; 4] = [6, 7, 8, 9];

pub const SCIENCE_KEYWORDS: [&str; 10] = [
    "Debris disks",
    "Disks around high-mass stars",
    "Disks around low-mass stars",
    "Astrochemistry",
    "HII regions",
    "High-mass star formation",
    "Low-mass star formation",
    "Inter-Stellar Medium (ISM)/Molecular clouds",
    "Intermediate-mass star formation",
    "Outflows, jets and ionized winds",
];

/// Categories dropped after the query; keyword matches can still pull in
/// extragalactic projects.
pub const EXCLUDED_CATEGORIES: [&str; 3] = ["Active galaxies", "Cosmology", "Galaxy evolution"];

/// The default science query.
pub fn default_science_query() -> Result<ObservationQuery> {
    Ok(ObservationQuery::new()
        .start_date(DEFAULT_START_DATE.parse().map_err(ArchiveError::InvalidConstraint)?)
        .spatial_resolution(
            DEFAULT_SPATIAL_RESOLUTION
                .parse()
                .map_err(ArchiveError::InvalidConstraint)?,
        )
        .integration_time(
            DEFAULT_INTEGRATION_TIME
                .parse()
                .map_err(ArchiveError::InvalidConstraint)?,
        )
        .water_vapour(DEFAULT_WATER_VAPOUR.parse().map_err(ArchiveError::InvalidConstraint)?)
        .bands(DEFAULT_BANDS)
        .science_keywords(SCIENCE_KEYWORDS))
}

/// Run `query`, drop the excluded categories and list the distinct targets.
pub fn build_data_table<S: AsRef<str>>(
    client: &ArchiveClient,
    query: &ObservationQuery,
    excluded_categories: &[S],
) -> Result<(Vec<Target>, ObservationTable)> {
    let mut table = client.query(query)?;
    let total = table.len();
    table.exclude_categories(excluded_categories);
    info!(
        "Kept {} of {} observations after category filtering",
        table.len(),
        total
    );

    let targets = table.targets();
    info!("{} distinct targets selected", targets.len());
    Ok((targets, table))
}

/// Run the default science query and return its targets and table.
pub fn init_data_table(client: &ArchiveClient) -> Result<(Vec<Target>, ObservationTable)> {
    build_data_table(client, &default_science_query()?, &EXCLUDED_CATEGORIES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_science_query_adql() {
        let adql = default_science_query().unwrap().to_adql();

        assert!(adql.starts_with("SELECT * FROM ivoa.obscore WHERE t_min>=57023.0"));
        assert!(adql.contains("spatial_resolution<=0.1"));
        assert!(adql.contains("t_exptime>=1000"));
        assert!(adql.contains("pwv<=2"));
        assert!(adql.contains("band_list LIKE '%9%'"));
        assert!(adql.contains("science_keyword LIKE '%Outflows, jets and ionized winds%'"));
        assert!(adql.ends_with("data_rights='Public' AND science_observation='T'"));
    }

    #[test]
    fn test_default_selection_lists() {
        let query = default_science_query().unwrap();
        assert_eq!(query.bands, vec![6, 7, 8, 9]);
        assert_eq!(query.science_keywords.len(), 10);
    }

    #[test]
    #[ignore] // Requires network access to the archive
    fn test_init_data_table_live() {
        let client =
            ArchiveClient::new(&shared::config_storage::ArchiveConfig::default()).unwrap();
        let (targets, table) = init_data_table(&client).unwrap();
        assert!(targets.len() <= table.len());
        assert!(table.records().iter().all(|r| r
            .scientific_category
            .as_deref()
            .map_or(true, |c| !EXCLUDED_CATEGORIES.contains(&c))));
    }
}
