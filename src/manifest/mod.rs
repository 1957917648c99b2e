//! Manifest loading and normalisation: the first two pipeline stages.

pub mod loader;
pub mod model;
pub mod normalize;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub use model::{Remote, Repository, Vcs, WorkspaceLabel, WorktreeSpec};

/// Load and normalise a manifest in one step: either an explicit path, or
/// the discovered set of conventional manifest files.
pub fn load(explicit_path: Option<&Path>, cwd: &Path) -> Result<Vec<Repository>, ConfigError> {
    let paths = resolve_paths(explicit_path)?;
    let raw = loader::load_files(&paths)?;
    normalize::normalize(raw, cwd)
}

fn resolve_paths(explicit_path: Option<&Path>) -> Result<Vec<PathBuf>, ConfigError> {
    if let Some(path) = explicit_path {
        return Ok(vec![path.to_path_buf()]);
    }
    let home = home::home_dir().ok_or(ConfigError::NotFound)?;
    let found = loader::discover_config_files(&home, true)?;
    if found.is_empty() {
        return Err(ConfigError::NotFound);
    }
    Ok(found)
}
