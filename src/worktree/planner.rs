//! Per-WorktreeSpec decision table: CREATE/UPDATE/UNCHANGED/BLOCKED/ERROR.

use std::path::Path;
use std::process::Command;

use crate::error::{DriverError, WorktreeError};
use crate::manifest::model::{RefSpec, WorktreeSpec};
use crate::plan::Action;

use super::{OnDiskWorktree, list_worktrees};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreePlanEntry {
    pub dir: std::path::PathBuf,
    pub action: Action,
    pub detail: String,
    pub resolved_ref: Option<String>,
}

/// Resolve a [`RefSpec`] against `repo_path`'s object database: exact
/// local ref, then `origin/<ref>`, then as a commit prefix.
fn resolve_ref(repo_path: &Path, spec: &RefSpec) -> Option<String> {
    let value = spec.value();
    for candidate in [value.to_string(), format!("origin/{value}")] {
        if rev_parse(repo_path, &candidate).is_some() {
            return Some(candidate);
        }
    }
    if matches!(spec, RefSpec::Commit(_)) && rev_parse(repo_path, value).is_some() {
        return Some(value.to_string());
    }
    None
}

fn rev_parse(repo_path: &Path, rev: &str) -> Option<String> {
    let mut cmd = Command::new("git");
    cmd.args(["rev-parse", "--verify", "-q", &format!("{rev}^{{commit}}")])
        .current_dir(repo_path);
    let output = crate::shell_exec::run(&mut cmd, Some("worktree")).ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn head_commit(worktree_dir: &Path) -> Option<String> {
    rev_parse(worktree_dir, "HEAD")
}

fn is_dirty(worktree_dir: &Path) -> Option<bool> {
    let mut cmd = Command::new("git");
    cmd.args(["status", "--porcelain"]).current_dir(worktree_dir);
    let output = crate::shell_exec::run(&mut cmd, Some("worktree")).ok()?;
    if !output.status.success() {
        return None;
    }
    Some(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// Plan one [`WorktreeSpec`] against `repo_path`'s current on-disk worktrees.
pub fn plan_worktree(
    repo_path: &Path,
    spec: &WorktreeSpec,
) -> Result<WorktreePlanEntry, WorktreeError> {
    let Some(resolved) = resolve_ref(repo_path, &spec.reference) else {
        return Err(WorktreeError::RefNotFound {
            reference: spec.reference.value().to_string(),
        });
    };

    if !spec.dir.exists() {
        return Ok(WorktreePlanEntry {
            dir: spec.dir.clone(),
            action: Action::Clone,
            detail: format!("create {} {}", spec.reference.kind_name(), spec.reference.value()),
            resolved_ref: Some(resolved),
        });
    }

    if spec.dir.join(".git").is_dir() {
        return Err(WorktreeError::NotAWorktree {
            dir: spec.dir.clone(),
        });
    }

    if is_dirty(&spec.dir) == Some(true) {
        return Ok(WorktreePlanEntry {
            dir: spec.dir.clone(),
            action: Action::Blocked,
            detail: "uncommitted changes".to_string(),
            resolved_ref: Some(resolved),
        });
    }

    let resolved_commit = rev_parse(repo_path, &resolved);
    let current_commit = head_commit(&spec.dir);

    if resolved_commit.is_some() && resolved_commit == current_commit {
        return Ok(WorktreePlanEntry {
            dir: spec.dir.clone(),
            action: Action::Unchanged,
            detail: String::new(),
            resolved_ref: Some(resolved),
        });
    }

    let detail = match &spec.reference {
        RefSpec::Branch(b) => format!("pull {b}"),
        RefSpec::Tag(_) | RefSpec::Commit(_) => format!("checkout {}", spec.reference.value()),
    };

    Ok(WorktreePlanEntry {
        dir: spec.dir.clone(),
        action: Action::Update,
        detail,
        resolved_ref: Some(resolved),
    })
}

/// Compare the configured worktree set to what's on disk; every on-disk
/// worktree whose path is not among `configured_dirs` is an orphan.
pub fn orphans(
    repo_path: &Path,
    configured_dirs: &[std::path::PathBuf],
) -> Result<Vec<OnDiskWorktree>, DriverError> {
    let on_disk = list_worktrees(repo_path)?;
    Ok(on_disk
        .into_iter()
        .filter(|wt| {
            let normalized = normalize_path::NormalizePath::normalize(wt.path.as_path());
            !configured_dirs
                .iter()
                .any(|d| normalize_path::NormalizePath::normalize(d.as_path()) == normalized)
        })
        .collect())
}
