use std::collections::BTreeMap;
use std::path::Path;

use super::{VcsDriver, run_checked};
use crate::error::DriverError;
use crate::manifest::model::Remote;

/// Shells out to the `svn` executable. Revision options are read from
/// the URL's `@rev` suffix rather than a separate argument, matching
/// how `svn checkout`/`svn update` accept pegged revisions.
pub struct SvnDriver;

fn split_peg_revision(url: &str) -> (&str, Option<&str>) {
    match url.rsplit_once('@') {
        Some((base, rev)) if !rev.is_empty() => (base, Some(rev)),
        _ => (url, None),
    }
}

impl VcsDriver for SvnDriver {
    fn clone(&self, url: &str, target_path: &Path, rev: Option<&str>) -> Result<(), DriverError> {
        if let Some(parent) = target_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DriverError::NetworkError {
                url: url.to_string(),
                detail: format!("could not create parent directory: {e}"),
            })?;
        }

        let (base_url, pegged_rev) = split_peg_revision(url);
        let target = target_path.display().to_string();
        let effective_rev = rev.or(pegged_rev);

        match effective_rev {
            Some(rev) => {
                run_checked("svn", &["checkout", "-r", rev, base_url, &target], None)?;
            }
            None => {
                run_checked("svn", &["checkout", base_url, &target], None)?;
            }
        }
        Ok(())
    }

    fn update(&self, path: &Path, _remotes: &BTreeMap<String, Remote>) -> Result<(), DriverError> {
        // `remotes` is a git-only concept in the data model; Subversion
        // has no equivalent of a second named remote to reconcile here.
        run_checked("svn", &["update"], Some(path))?;
        Ok(())
    }

    fn current_revision(&self, path: &Path) -> Result<String, DriverError> {
        let output = run_checked("svn", &["info", "--show-item", "revision"], Some(path))?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
