//! Status Probe: reads on-disk repository state without ever mutating it.

use std::path::Path;
use std::process::Command;

use crate::error::DriverError;
use crate::manifest::Repository;
use crate::shell_exec::run;

/// Probe depth: `Fast` only checks existence/kind; `Detailed` additionally
/// shells out to read branch/upstream/ahead-behind/dirty state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Fast,
    Detailed,
}

/// The observed state of one on-disk repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub exists: bool,
    pub is_git: bool,
    pub branch: Option<String>,
    pub remote_branch: Option<String>,
    pub current_rev: Option<String>,
    pub ahead: Option<usize>,
    pub behind: Option<usize>,
    pub dirty: Option<bool>,
}

/// Probe `repo.path` on disk. Never touches the working tree; tolerant
/// of detached HEAD, no upstream, and (for non-git VCS kinds) skips
/// detailed inspection entirely since it is git-specific. When `fetch`
/// is set, refreshes remote-tracking refs with a best-effort `git
/// fetch` first so the ahead/behind counts reflect current remote
/// state rather than whatever was last fetched.
pub fn probe(repo: &Repository, mode: Mode, fetch: bool) -> Result<Status, DriverError> {
    let exists = repo.path.is_dir();
    if !exists {
        return Ok(Status {
            exists: false,
            ..Default::default()
        });
    }

    let is_git = is_git_checkout(&repo.path);

    if mode == Mode::Fast || !is_git || repo.vcs != crate::manifest::Vcs::Git {
        return Ok(Status {
            exists,
            is_git,
            ..Default::default()
        });
    }

    probe_git_detailed(&repo.path, fetch)
}

fn is_git_checkout(path: &Path) -> bool {
    path.join(".git").exists()
}

fn probe_git_detailed(path: &Path, fetch: bool) -> Result<Status, DriverError> {
    if fetch {
        if let Err(e) = git_output(path, &["fetch"]) {
            log::warn!("{}: best-effort fetch failed: {e}", path.display());
        }
    }

    let current_rev = git_output(path, &["rev-parse", "HEAD"])?.map(|s| s.trim().to_string());

    let branch = match git_output(path, &["symbolic-ref", "--short", "-q", "HEAD"])? {
        Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    let dirty = git_output(path, &["status", "--porcelain"])?.map(|s| !s.trim().is_empty());

    let (remote_branch, ahead, behind) = match &branch {
        Some(b) => upstream_counts(path, b)?,
        None => (None, None, None),
    };

    Ok(Status {
        exists: true,
        is_git: true,
        branch,
        remote_branch,
        current_rev,
        ahead,
        behind,
        dirty,
    })
}

fn upstream_counts(
    path: &Path,
    branch: &str,
) -> Result<(Option<String>, Option<usize>, Option<usize>), DriverError> {
    let upstream_ref = format!("{branch}@{{upstream}}");
    let Some(upstream) = git_output(path, &["rev-parse", "--abbrev-ref", &upstream_ref])? else {
        return Ok((None, None, None));
    };
    let upstream = upstream.trim().to_string();
    if upstream.is_empty() {
        return Ok((None, None, None));
    }

    let range = format!("{branch}...{upstream}");
    let Some(counts) = git_output(path, &["rev-list", "--left-right", "--count", &range])? else {
        return Ok((Some(upstream), None, None));
    };
    let mut parts = counts.split_whitespace();
    let ahead = parts.next().and_then(|s| s.parse::<usize>().ok());
    let behind = parts.next().and_then(|s| s.parse::<usize>().ok());
    Ok((Some(upstream), ahead, behind))
}

/// Run a git subcommand in `path`; returns `None` on non-zero exit (the
/// caller treats that as "no such ref" rather than a hard failure, e.g.
/// detached HEAD or no upstream), and an error only when git itself could
/// not be invoked.
fn git_output(path: &Path, args: &[&str]) -> Result<Option<String>, DriverError> {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(path);
    let output = run(&mut cmd, Some("status")).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DriverError::NotInstalled("git")
        } else if e.kind() == std::io::ErrorKind::TimedOut {
            DriverError::NetworkError {
                url: path.display().to_string(),
                detail: "timeout".to_string(),
            }
        } else {
            DriverError::NetworkError {
                url: path.display().to_string(),
                detail: e.to_string(),
            }
        }
    })?;

    if !output.status.success() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&output.stdout).to_string()))
}
