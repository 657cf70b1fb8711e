//! Test helpers for the galform workspace
//!
//! Seeded synthetic catalogs for the analysis tests, and per-run product
//! directories under `<workspace>/test_output/` for JSON products that tests
//! keep around for inspection.

pub mod synthetic;

pub use synthetic::{
    populate_catalog, synthetic_subvolume, SyntheticCatalogConfig, SyntheticSubvolume,
};

use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

/// Directory under the workspace root that holds kept test products
pub const OUTPUT_DIR_NAME: &str = "test_output";

#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("no workspace manifest above {0}")]
    WorkspaceNotFound(PathBuf),

    #[error("cannot prepare {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Nearest ancestor of `start` (inclusive) whose `Cargo.toml` declares a workspace.
pub fn locate_workspace_root(start: &Path) -> Result<PathBuf, TestHelperError> {
    start
        .ancestors()
        .find(|dir| {
            std::fs::read_to_string(dir.join("Cargo.toml"))
                .map(|manifest| manifest.lines().any(|line| line.trim() == "[workspace]"))
                .unwrap_or(false)
        })
        .map(Path::to_path_buf)
        .ok_or_else(|| TestHelperError::WorkspaceNotFound(start.to_path_buf()))
}

static WORKSPACE_ROOT: Lazy<Result<PathBuf, String>> = Lazy::new(|| {
    locate_workspace_root(Path::new(env!("CARGO_MANIFEST_DIR"))).map_err(|e| e.to_string())
});

/// Workspace root, resolved once from this crate's manifest directory.
pub fn workspace_root() -> Result<&'static Path, TestHelperError> {
    WORKSPACE_ROOT
        .as_deref()
        .map_err(|_| TestHelperError::WorkspaceNotFound(PathBuf::from(env!("CARGO_MANIFEST_DIR"))))
}

/// Empty directory `<workspace>/test_output/<run>` for one test's products.
///
/// Products of a previous run with the same name are removed first, so each
/// test should use its own `run` name.
pub fn fresh_products_dir(run: &str) -> Result<PathBuf, TestHelperError> {
    let dir = workspace_root()?.join(OUTPUT_DIR_NAME).join(run);
    if dir.exists() {
        std::fs::remove_dir_all(&dir).map_err(|source| TestHelperError::Prepare {
            path: dir.clone(),
            source,
        })?;
    }
    std::fs::create_dir_all(&dir).map_err(|source| TestHelperError::Prepare {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
