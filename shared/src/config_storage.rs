//! Configuration storage for archive access settings.
//!
//! Settings live in `~/.alma_triage/archive.json` by default. A missing file
//! yields the defaults; command-line flags override whatever is stored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// ALMA science archive mirrors, tried in order.
pub const DEFAULT_ARCHIVE_URLS: [&str; 3] = [
    "https://almascience.eso.org",
    "https://almascience.nrao.edu",
    "https://almascience.nao.ac.jp",
];

/// OIDC token endpoint of the ALMA single sign-on service.
pub const DEFAULT_AUTH_URL: &str =
    "https://asa.alma.cl/auth/realms/ALMA/protocol/openid-connect/token";

/// Persistent settings for talking to the archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Archive base URLs, first reachable one wins
    pub archive_urls: Vec<String>,
    /// Token endpoint used by `login`
    pub auth_url: String,
    /// Archive account for proprietary data
    pub username: Option<String>,
    /// HTTP timeout for queries and downloads
    pub timeout_secs: u64,
    /// Default directory for downloaded products
    pub download_root: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_urls: DEFAULT_ARCHIVE_URLS.iter().map(|s| s.to_string()).collect(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            username: None,
            timeout_secs: 300,
            download_root: None,
        }
    }
}

/// Configuration storage manager.
///
/// Manages loading and saving of the archive configuration from a
/// centralized directory (defaults to ~/.alma_triage/).
#[derive(Debug, Clone)]
pub struct ConfigStorage {
    /// Root directory for all configuration (e.g., ~/.alma_triage)
    root_path: PathBuf,
}

impl ConfigStorage {
    /// Create a new config storage with default path (~/.alma_triage)
    pub fn new() -> std::io::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;
        Ok(Self {
            root_path: home.join(".alma_triage"),
        })
    }

    /// Create a new config storage with custom root path
    pub fn with_path(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Get the root configuration path
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn archive_config_path(&self) -> PathBuf {
        self.root_path.join("archive.json")
    }

    /// Load the archive configuration.
    ///
    /// Returns the defaults if no file exists, an error if it cannot be parsed.
    pub fn load_archive_config(&self) -> std::io::Result<ArchiveConfig> {
        let path = self.archive_config_path();
        if !path.exists() {
            return Ok(ArchiveConfig::default());
        }

        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save the archive configuration, creating the directory if needed.
    ///
    /// Returns the path where the config was saved.
    pub fn save_archive_config(&self, config: &ArchiveConfig) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.root_path)?;

        let path = self.archive_config_path();
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::with_path(temp_dir.path().join("cfg"));

        let config = storage.load_archive_config().unwrap();
        assert_eq!(config, ArchiveConfig::default());
        assert_eq!(config.archive_urls.len(), 3);
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::with_path(temp_dir.path().join("cfg"));

        let config = ArchiveConfig {
            username: Some("vmart".to_string()),
            download_root: Some(PathBuf::from("/data/alma")),
            archive_urls: vec!["https://almascience.nrao.edu".to_string()],
            ..ArchiveConfig::default()
        };

        let saved = storage.save_archive_config(&config).unwrap();
        assert!(saved.exists());
        assert_eq!(storage.load_archive_config().unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::with_path(temp_dir.path().to_path_buf());
        std::fs::write(
            temp_dir.path().join("archive.json"),
            r#"{"username": "vmart", "timeout_secs": 60}"#,
        )
        .unwrap();

        let config = storage.load_archive_config().unwrap();
        assert_eq!(config.username.as_deref(), Some("vmart"));
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::with_path(temp_dir.path().to_path_buf());
        std::fs::write(temp_dir.path().join("archive.json"), "not json").unwrap();

        let err = storage.load_archive_config().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
