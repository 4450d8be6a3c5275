//! DataLink staging of data products.
//!
//! A member OUS id resolves to a list of downloadable products (raw ASDM
//! tarballs, product tarballs, auxiliary files). Some rows point at a further
//! DataLink document rather than a file; those are followed recursively.

use crate::tap::ArchiveClient;
use crate::{ArchiveError, Result};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;

/// Maximum nesting of `#datalink` indirections followed
pub const MAX_DATALINK_DEPTH: usize = 3;

const DATALINK_SEMANTICS: &str = "#datalink";

/// One row of a DataLink response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataProduct {
    #[serde(rename = "ID")]
    pub id: String,
    pub access_url: String,
    pub service_def: String,
    pub error_message: String,
    pub semantics: String,
    pub description: String,
    pub content_type: String,
    /// Size in bytes, when the archive reports it
    pub content_length: Option<u64>,
}

impl DataProduct {
    /// Whether this row points at another DataLink document
    pub fn is_nested(&self) -> bool {
        self.semantics == DATALINK_SEMANTICS
    }

    pub fn is_error(&self) -> bool {
        !self.error_message.trim().is_empty()
    }
}

/// Parse a tab-separated DataLink response with a header row.
pub fn parse_datalink_tsv<R: Read>(reader: R) -> Result<Vec<DataProduct>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<DataProduct>, csv::Error>>()
        .map_err(ArchiveError::from)
}

/// Resolve member OUS ids to their downloadable products.
///
/// Error rows are logged and dropped. Returned products are unique by URL.
pub fn stage_data(client: &ArchiveClient, uids: &[String]) -> Result<Vec<DataProduct>> {
    let mut products = Vec::new();
    let mut seen = HashSet::new();

    for uid in uids {
        debug!("Staging {uid}");
        let rows = client.with_mirror(|mirror| {
            let url = format!(
                "{mirror}/datalink/sync?ID={}&RESPONSEFORMAT=text/tab-separated-values",
                encode_query_value(uid)
            );
            fetch_products(client, &url)
        })?;
        collect_products(client, rows, 0, &mut seen, &mut products)?;
    }

    let total_bytes: u64 = products.iter().filter_map(|p| p.content_length).sum();
    info!(
        "Staged {} products ({:.1} MB) for {} member OUS",
        products.len(),
        total_bytes as f64 / 1.0e6,
        uids.len()
    );
    Ok(products)
}

fn fetch_products(client: &ArchiveClient, url: &str) -> Result<Vec<DataProduct>> {
    let response = client.get(url)?;
    parse_datalink_tsv(response)
}

fn collect_products(
    client: &ArchiveClient,
    rows: Vec<DataProduct>,
    depth: usize,
    seen: &mut HashSet<String>,
    products: &mut Vec<DataProduct>,
) -> Result<()> {
    for row in rows {
        if row.is_error() {
            warn!("DataLink error for {}: {}", row.id, row.error_message);
            continue;
        }
        if row.is_nested() {
            if depth >= MAX_DATALINK_DEPTH {
                warn!("Not following nested DataLink for {}: too deep", row.id);
                continue;
            }
            let nested = fetch_products(client, &row.access_url)?;
            collect_products(client, nested, depth + 1, seen, products)?;
            continue;
        }
        if row.access_url.is_empty() || !seen.insert(row.access_url.clone()) {
            continue;
        }
        products.push(row);
    }
    Ok(())
}

/// Percent-encode the characters that appear in archive uids.
fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
