//! Executes a worktree's planned action. Dry-run: planner runs
//! unchanged, but this module is never invoked so nothing happens.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{DriverError, WorktreeError};
use crate::manifest::model::{RefSpec, WorktreeSpec};

use super::planner::{WorktreePlanEntry, orphans};
use crate::plan::Action;

fn run_git(repo_path: &Path, args: &[&str]) -> Result<std::process::Output, DriverError> {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(repo_path);
    let output = crate::shell_exec::run(&mut cmd, Some("worktree")).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DriverError::NotInstalled("git")
        } else if e.kind() == std::io::ErrorKind::TimedOut {
            DriverError::NetworkError {
                url: repo_path.display().to_string(),
                detail: "timeout".to_string(),
            }
        } else {
            DriverError::NonZeroExit {
                command: format!("git {}", args.join(" ")),
                code: -1,
                stderr: e.to_string(),
            }
        }
    })?;
    if !output.status.success() {
        return Err(DriverError::NonZeroExit {
            command: format!("git {}", args.join(" ")),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// Apply one plan entry. The owning repository's own path (`repo_path`)
/// is treated as read-only: every invocation is rooted there, but the
/// only directories mutated are the worktree's own `dir` (and git's
/// internal `.git/worktrees/` bookkeeping).
pub fn apply(
    repo_path: &Path,
    spec: &WorktreeSpec,
    entry: &WorktreePlanEntry,
) -> Result<(), WorktreeError> {
    match entry.action {
        Action::Clone => {
            let resolved = entry
                .resolved_ref
                .as_deref()
                .ok_or_else(|| WorktreeError::RefNotFound {
                    reference: spec.reference.value().to_string(),
                })?;
            let dir = spec.dir.display().to_string();
            let mut args = vec!["worktree", "add"];
            if spec.effective_detach() {
                args.push("--detach");
            }
            let lock_flag;
            if spec.lock {
                lock_flag = match &spec.lock_reason {
                    Some(reason) => format!("--lock={reason}"),
                    None => "--lock".to_string(),
                };
                args.push(&lock_flag);
            }
            args.push(&dir);
            args.push(resolved);
            run_git(repo_path, &args)?;
            Ok(())
        }
        Action::Update => match &spec.reference {
            RefSpec::Branch(_) => {
                run_git(&spec.dir, &["pull", "--ff-only"])?;
                Ok(())
            }
            RefSpec::Tag(_) | RefSpec::Commit(_) => {
                run_git(&spec.dir, &["checkout", "--detach", spec.reference.value()])?;
                Ok(())
            }
        },
        Action::Unchanged | Action::Blocked | Action::Error => Ok(()),
    }
}

/// Remove every on-disk worktree of `repo_path` not present in
/// `configured_dirs`. Failures leave the worktree in place and are
/// reported but don't stop the rest of the prune; successes are
/// returned as the list of removed paths.
pub fn prune(
    repo_path: &Path,
    configured_dirs: &[PathBuf],
) -> Result<Vec<PathBuf>, DriverError> {
    let stale = orphans(repo_path, configured_dirs)?;
    let mut removed = Vec::new();
    for wt in stale {
        let path_str = wt.path.display().to_string();
        match run_git(repo_path, &["worktree", "remove", &path_str]) {
            Ok(_) => removed.push(wt.path),
            Err(_) => continue,
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worktree::planner::plan_worktree;

    #[test]
    fn create_then_prune_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = dir.path();
        let init = Command::new("git").args(["init", "-q"]).current_dir(repo).status();
        if init.is_err() {
            return;
        }
        std::fs::write(repo.join("f"), "x").unwrap();
        let _ = Command::new("git")
            .args(["-c", "user.email=t@t.com", "-c", "user.name=t", "add", "."])
            .current_dir(repo)
            .status();
        let _ = Command::new("git")
            .args(["-c", "user.email=t@t.com", "-c", "user.name=t", "commit", "-q", "-m", "x"])
            .current_dir(repo)
            .status();

        let spec = WorktreeSpec {
            dir: repo.join("sibling"),
            reference: RefSpec::Branch("master".to_string()),
            lock: false,
            lock_reason: None,
            detach: None,
        };
        let entry = plan_worktree(repo, &spec).unwrap();
        apply(repo, &spec, &entry).unwrap();
        assert!(spec.dir.join(".git").exists());

        let removed = prune(repo, &[]).unwrap();
        assert_eq!(removed, vec![spec.dir.clone()]);
        assert!(!spec.dir.exists());
    }
}
