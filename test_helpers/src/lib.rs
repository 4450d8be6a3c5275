//! Test helpers for the ALMA triage workspace.
//!
//! Rendered figures, exported tables and other artifacts written by tests go
//! to `<workspace>/test_output/` (or `$TRIAGE_TEST_OUTPUT` when set) so they
//! can be inspected after a run.

use once_cell::sync::Lazy;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the artifact directory
pub const OUTPUT_DIR_ENV: &str = "TRIAGE_TEST_OUTPUT";

#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Failed to find workspace root: {0}")]
    WorkspaceRootNotFound(String),
}

/// Walk up from the current directory to the Cargo.toml declaring `[workspace]`.
pub fn find_workspace_root() -> Result<PathBuf, TestHelperError> {
    let mut dir = env::current_dir().map_err(|e| {
        TestHelperError::WorkspaceRootNotFound(format!("no current directory: {e}"))
    })?;

    loop {
        let manifest = dir.join("Cargo.toml");
        if manifest.is_file() {
            let content = std::fs::read_to_string(&manifest).map_err(|e| {
                TestHelperError::WorkspaceRootNotFound(format!(
                    "cannot read {}: {e}",
                    manifest.display()
                ))
            })?;
            if content.contains("[workspace]") {
                return Ok(dir);
            }
        }
        if !dir.pop() {
            return Err(TestHelperError::WorkspaceRootNotFound(
                "no [workspace] manifest above the current directory".to_string(),
            ));
        }
    }
}

static OUTPUT_DIR: Lazy<PathBuf> = Lazy::new(|| match env::var_os(OUTPUT_DIR_ENV) {
    Some(dir) => PathBuf::from(dir),
    None => find_workspace_root()
        .expect("Failed to find workspace root")
        .join("test_output"),
});

/// Directory for test artifacts, created on first use.
pub fn get_output_dir() -> PathBuf {
    let dir = OUTPUT_DIR.clone();
    std::fs::create_dir_all(&dir).expect("Failed to create test output directory");
    dir
}

/// Path of an artifact inside the output directory; parent directories are created.
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let full = get_output_dir().join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create artifact directory");
    }
    full
}
