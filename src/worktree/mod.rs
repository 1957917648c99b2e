//! Worktree sub-planner/executor: treats a repository's `worktrees` list
//! as a second manifest, each entry a sibling directory pinned to a ref.

pub mod executor;
pub mod planner;

use std::path::PathBuf;
use std::process::Command;

use crate::error::DriverError;

/// One worktree as reported by `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnDiskWorktree {
    pub path: PathBuf,
    pub head: String,
    pub branch: Option<String>,
    pub bare: bool,
}

/// Parse `git worktree list --porcelain` output into a flat list,
/// filtering out the bare entry every repo with worktrees has first.
pub fn parse_porcelain_list(output: &str) -> Vec<OnDiskWorktree> {
    let mut result = Vec::new();
    let mut path = None;
    let mut head = String::new();
    let mut branch = None;
    let mut bare = false;

    let flush = |path: &mut Option<PathBuf>,
                 head: &mut String,
                 branch: &mut Option<String>,
                 bare: &mut bool,
                 out: &mut Vec<OnDiskWorktree>| {
        if let Some(p) = path.take() {
            out.push(OnDiskWorktree {
                path: p,
                head: std::mem::take(head),
                branch: branch.take(),
                bare: std::mem::take(bare),
            });
        }
    };

    for line in output.lines() {
        if line.is_empty() {
            flush(&mut path, &mut head, &mut branch, &mut bare, &mut result);
            continue;
        }
        let (key, value) = match line.split_once(' ') {
            Some((k, v)) => (k, Some(v)),
            None => (line, None),
        };
        match key {
            "worktree" => {
                flush(&mut path, &mut head, &mut branch, &mut bare, &mut result);
                path = value.map(PathBuf::from);
            }
            "HEAD" => head = value.unwrap_or_default().to_string(),
            "branch" => {
                branch = value.map(|v| {
                    v.strip_prefix("refs/heads/").unwrap_or(v).to_string()
                })
            }
            "bare" => bare = true,
            _ => {}
        }
    }
    flush(&mut path, &mut head, &mut branch, &mut bare, &mut result);
    result.into_iter().filter(|wt| !wt.bare).collect()
}

/// List the on-disk worktrees of the git repository rooted at `repo_path`.
pub fn list_worktrees(repo_path: &std::path::Path) -> Result<Vec<OnDiskWorktree>, DriverError> {
    let mut cmd = Command::new("git");
    cmd.args(["worktree", "list", "--porcelain"])
        .current_dir(repo_path);
    let output = crate::shell_exec::run(&mut cmd, Some("worktree")).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DriverError::NotInstalled("git")
        } else {
            DriverError::NonZeroExit {
                command: "git worktree list --porcelain".to_string(),
                code: -1,
                stderr: e.to_string(),
            }
        }
    })?;
    if !output.status.success() {
        return Err(DriverError::NonZeroExit {
            command: "git worktree list --porcelain".to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(parse_porcelain_list(&String::from_utf8_lossy(
        &output.stdout,
    )))
}
