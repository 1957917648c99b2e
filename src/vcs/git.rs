use std::collections::BTreeMap;
use std::path::Path;

use super::{VcsDriver, run_checked};
use crate::error::DriverError;
use crate::manifest::model::Remote;

/// Shells out to the `git` executable with fixed argument sets.
pub struct GitDriver;

/// Reconcile one declared remote: add it if git doesn't know about it
/// yet, otherwise point its fetch/push URLs at the declared ones.
fn reconcile_remote(path: &Path, name: &str, remote: &Remote) -> Result<(), DriverError> {
    if run_checked("git", &["remote", "add", name, &remote.fetch_url], Some(path)).is_err() {
        run_checked("git", &["remote", "set-url", name, &remote.fetch_url], Some(path))?;
    }
    if remote.push_url != remote.fetch_url {
        run_checked(
            "git",
            &["remote", "set-url", "--push", name, &remote.push_url],
            Some(path),
        )?;
    }
    Ok(())
}

impl VcsDriver for GitDriver {
    fn clone(&self, url: &str, target_path: &Path, rev: Option<&str>) -> Result<(), DriverError> {
        if let Some(parent) = target_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DriverError::NetworkError {
                url: url.to_string(),
                detail: format!("could not create parent directory: {e}"),
            })?;
        }

        let target = target_path.display().to_string();
        run_checked("git", &["clone", "--progress", url, &target], None)?;

        if let Some(rev) = rev {
            run_checked("git", &["checkout", rev], Some(target_path))?;
        }
        Ok(())
    }

    fn update(&self, path: &Path, remotes: &BTreeMap<String, Remote>) -> Result<(), DriverError> {
        run_checked("git", &["fetch"], Some(path))?;
        run_checked("git", &["pull", "--ff-only"], Some(path))?;
        for (name, remote) in remotes {
            reconcile_remote(path, name, remote)?;
        }
        Ok(())
    }

    fn current_revision(&self, path: &Path) -> Result<String, DriverError> {
        let output = run_checked("git", &["rev-parse", "HEAD"], Some(path))?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
