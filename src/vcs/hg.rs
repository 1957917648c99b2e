use std::collections::BTreeMap;
use std::path::Path;

use super::{VcsDriver, run_checked};
use crate::error::DriverError;
use crate::manifest::model::Remote;

/// Shells out to the `hg` executable. Clone separates fetch from
/// checkout (`--noupdate` then `update -q`) so progress can be
/// surfaced cleanly instead of as one opaque call.
pub struct HgDriver;

impl VcsDriver for HgDriver {
    fn clone(&self, url: &str, target_path: &Path, rev: Option<&str>) -> Result<(), DriverError> {
        if let Some(parent) = target_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DriverError::NetworkError {
                url: url.to_string(),
                detail: format!("could not create parent directory: {e}"),
            })?;
        }

        let target = target_path.display().to_string();
        run_checked("hg", &["clone", "--noupdate", url, &target], None)?;

        match rev {
            Some(rev) => {
                run_checked("hg", &["update", "-q", rev], Some(target_path))?;
            }
            None => {
                run_checked("hg", &["update", "-q"], Some(target_path))?;
            }
        }
        Ok(())
    }

    fn update(&self, path: &Path, _remotes: &BTreeMap<String, Remote>) -> Result<(), DriverError> {
        // `remotes` is a git-only concept in the data model; Mercurial
        // has no equivalent of a second named remote to reconcile here.
        run_checked("hg", &["pull"], Some(path))?;
        run_checked("hg", &["update", "-q"], Some(path))?;
        Ok(())
    }

    fn current_revision(&self, path: &Path) -> Result<String, DriverError> {
        let output = run_checked("hg", &["id", "-i"], Some(path))?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
