//! TAP access to the archive's observation table.
//!
//! The archive is served from several regional mirrors. Every request goes
//! to the first mirror that answers; the others are fallbacks for outages.

use crate::observation::ObservationTable;
use crate::query::ObservationQuery;
use crate::{ArchiveError, Result};
use log::{debug, info, warn};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use shared::config_storage::ArchiveConfig;
use std::time::Duration;

/// Blocking client for archive queries and downloads
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: Client,
    mirrors: Vec<String>,
    auth_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ArchiveClient {
    /// Build a client from stored settings. No request is made until first use.
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        if config.archive_urls.is_empty() {
            return Err(ArchiveError::NoMirror);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("alma-triage/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            mirrors: config
                .archive_urls
                .iter()
                .map(|url| url.trim_end_matches('/').to_string())
                .collect(),
            auth_url: config.auth_url.clone(),
            token: None,
        })
    }

    /// Configured mirror base URLs, in the order they are tried
    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    /// Whether `login` succeeded for this client
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Obtain a bearer token for proprietary data.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.auth_url)
            .form(&[
                ("grant_type", "password"),
                ("client_id", "oidc"),
                ("username", username),
                ("password", password),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(ArchiveError::Auth(format!(
                "{} returned status {}",
                self.auth_url,
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| ArchiveError::Auth(format!("unexpected token response: {e}")))?;
        self.token = Some(token.access_token);
        info!("Authenticated as {username}");
        Ok(())
    }

    /// GET a URL, attaching the bearer token when logged in.
    pub fn get(&self, url: &str) -> Result<Response> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send()?;
        if !response.status().is_success() {
            return Err(ArchiveError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    /// Run `request` against each mirror until one succeeds.
    ///
    /// Query rejections are returned immediately since another mirror
    /// would reject them the same way.
    pub(crate) fn with_mirror<T>(&self, mut request: impl FnMut(&str) -> Result<T>) -> Result<T> {
        let mut last_error = ArchiveError::NoMirror;
        for mirror in &self.mirrors {
            match request(mirror) {
                Ok(value) => return Ok(value),
                Err(e @ ArchiveError::Query(_)) => return Err(e),
                Err(e) => {
                    warn!("Mirror {mirror} failed: {e}");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    /// Run a query against the observation table.
    pub fn query(&self, query: &ObservationQuery) -> Result<ObservationTable> {
        let adql = query.to_adql();
        debug!("ADQL: {adql}");

        let table = self.with_mirror(|mirror| {
            let url = format!("{mirror}/tap/sync");
            let mut request = self.client.post(&url).form(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "csv"),
                ("QUERY", adql.as_str()),
            ]);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response = request.send()?;
            let status = response.status();
            let body = response.text()?;

            // Rejected queries come back as a VOTable with QUERY_STATUS=ERROR,
            // whatever the status code
            if let Some(message) = votable_error(&body) {
                return Err(ArchiveError::Query(message));
            }
            if !status.is_success() {
                return Err(ArchiveError::Status {
                    url,
                    status: status.as_u16(),
                });
            }
            if body.trim_start().starts_with('<') {
                return Err(ArchiveError::UnexpectedResponse(url));
            }

            ObservationTable::from_csv_reader(body.as_bytes())
        })?;

        info!("Query returned {} rows", table.len());
        Ok(table)
    }

    /// Observations of one source within one project.
    ///
    /// Source names are sometimes registered with underscores instead of
    /// spaces, so a failed or empty lookup is retried in that form.
    pub fn query_object(&self, project_code: &str, source_name: &str) -> Result<ObservationTable> {
        let query = ObservationQuery::new()
            .project_code(project_code)
            .source_name(source_name);

        let underscored = source_name.replace(' ', "_");
        let retry = || {
            info!("Retrying {project_code} with source name {underscored}");
            self.query(
                &ObservationQuery::new()
                    .project_code(project_code)
                    .source_name(underscored.as_str()),
            )
        };

        match self.query(&query) {
            Ok(table) if table.is_empty() && underscored != source_name => retry(),
            Ok(table) => Ok(table),
            Err(e) if underscored != source_name => {
                warn!("Query for {project_code} / {source_name} failed: {e}");
                retry()
            }
            Err(e) => Err(e),
        }
    }
}

/// Message of the `QUERY_STATUS` INFO element when it reports an error.
fn votable_error(body: &str) -> Option<String> {
    body.split("<INFO").skip(1).find_map(|info| {
        let open_end = info.find('>')?;
        let attributes = &info[..open_end];
        if !attributes.contains("QUERY_STATUS") || !attributes.contains("\"ERROR\"") {
            return None;
        }
        let text = info[open_end + 1..]
            .split("</INFO>")
            .next()
            .unwrap_or_default()
            .trim();
        Some(if text.is_empty() || attributes.ends_with('/') {
            "query rejected without a message".to_string()
        } else {
            text.to_string()
        })
    })
}
