//! Sync Planner: a pure function from observed [`Status`] to a [`PlanEntry`].

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::manifest::Repository;
use crate::status::Status;

/// What the executor should do with one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    Clone,
    Update,
    #[default]
    Unchanged,
    Blocked,
    Error,
}

/// The planner's verdict for one repository: an action plus a short
/// human-readable reason, independent of how it will later be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub repo_name: String,
    pub action: Action,
    pub detail: String,
}

/// Knobs the planner consults when ahead/behind counts could not be
/// determined; `offline` overrides `fetch` when both are set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOptions {
    pub fetch: bool,
    pub offline: bool,
}

/// Decide what to do with `repo` given its observed `status`. Never
/// touches the filesystem or network; consumes only what it's handed.
pub fn plan(repo: &Repository, status: &Status, opts: PlanOptions) -> PlanEntry {
    let name = repo.name.clone();

    if !status.exists {
        return PlanEntry {
            repo_name: name,
            action: Action::Clone,
            detail: "missing".to_string(),
        };
    }

    if repo.vcs != crate::manifest::Vcs::Git || !status.is_git {
        return PlanEntry {
            repo_name: name,
            action: Action::Update,
            detail: "non-git VCS (detailed plan n/a)".to_string(),
        };
    }

    if status.dirty == Some(true) {
        return PlanEntry {
            repo_name: name,
            action: Action::Blocked,
            detail: "working tree has local changes".to_string(),
        };
    }

    match (status.ahead, status.behind) {
        (Some(ahead), Some(behind)) if ahead > 0 && behind > 0 => PlanEntry {
            repo_name: name,
            action: Action::Blocked,
            detail: format!("diverged (ahead {ahead}, behind {behind})"),
        },
        (Some(ahead), _) if ahead > 0 => PlanEntry {
            repo_name: name,
            action: Action::Blocked,
            detail: format!("ahead by {ahead}"),
        },
        (_, Some(behind)) if behind > 0 => PlanEntry {
            repo_name: name,
            action: Action::Update,
            detail: format!("behind {behind}"),
        },
        (Some(0), Some(0)) => PlanEntry {
            repo_name: name,
            action: Action::Unchanged,
            detail: "up to date".to_string(),
        },
        _ if opts.offline => PlanEntry {
            repo_name: name,
            action: Action::Update,
            detail: "remote state unknown (offline)".to_string(),
        },
        _ if !opts.fetch => PlanEntry {
            repo_name: name,
            action: Action::Update,
            detail: "remote state unknown; use --fetch".to_string(),
        },
        _ => PlanEntry {
            repo_name: name,
            action: Action::Unchanged,
            detail: "up to date".to_string(),
        },
    }
}

/// Cross-worker mutable state: the only thing the executor's worker pool
/// shares, accumulated via atomics so no lock is needed on the hot path.
#[derive(Debug, Default)]
pub struct PlanSummary {
    pub cloned: AtomicUsize,
    pub updated: AtomicUsize,
    pub unchanged: AtomicUsize,
    pub blocked: AtomicUsize,
    pub errored: AtomicUsize,
}

impl PlanSummary {
    pub fn record(&self, action: Action) {
        let counter = match action {
            Action::Clone => &self.cloned,
            Action::Update => &self.updated,
            Action::Unchanged => &self.unchanged,
            Action::Blocked => &self.blocked,
            Action::Error => &self.errored,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> usize {
        self.cloned.load(Ordering::Relaxed)
            + self.updated.load(Ordering::Relaxed)
            + self.unchanged.load(Ordering::Relaxed)
            + self.blocked.load(Ordering::Relaxed)
            + self.errored.load(Ordering::Relaxed)
    }

    /// Exit code for "some repositories were blocked or errored" when the
    /// run continued to completion. Exit code 2 is reserved for an actual
    /// early abort via `--exit-on-error`; a caller that ran to completion
    /// with errors gets 1, same as a caller that only hit blocked repos.
    pub fn exit_code(&self) -> i32 {
        if self.errored.load(Ordering::Relaxed) > 0 || self.blocked.load(Ordering::Relaxed) > 0 {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::model::{Vcs, WorkspaceLabel};
    use std::path::PathBuf;

    fn repo() -> Repository {
        Repository {
            name: "r".to_string(),
            workspace_label: WorkspaceLabel::new("~/code/", &PathBuf::from("/")),
            path: PathBuf::from("/code/r"),
            url: "git+https://example.test/r.git".to_string(),
            vcs: Vcs::Git,
            remotes: Default::default(),
            rev: None,
            shell_command_after: Vec::new(),
            worktrees: Vec::new(),
        }
    }

    fn status(exists: bool, is_git: bool) -> Status {
        Status {
            exists,
            is_git,
            ..Default::default()
        }
    }

    #[test]
    fn missing_repo_is_cloned() {
        let entry = plan(&repo(), &status(false, false), PlanOptions::default());
        assert_eq!(entry.action, Action::Clone);
    }

    #[test]
    fn existing_non_git_directory_updates() {
        let entry = plan(&repo(), &status(true, false), PlanOptions::default());
        assert_eq!(entry.action, Action::Update);
    }

    #[test]
    fn dirty_tree_is_blocked() {
        let mut s = status(true, true);
        s.dirty = Some(true);
        let entry = plan(&repo(), &s, PlanOptions::default());
        assert_eq!(entry.action, Action::Blocked);
    }

    #[test]
    fn diverged_is_blocked_with_both_counts() {
        let mut s = status(true, true);
        s.dirty = Some(false);
        s.ahead = Some(2);
        s.behind = Some(3);
        let entry = plan(&repo(), &s, PlanOptions::default());
        assert_eq!(entry.action, Action::Blocked);
        assert_eq!(entry.detail, "diverged (ahead 2, behind 3)");
    }

    #[test]
    fn ahead_only_is_blocked() {
        let mut s = status(true, true);
        s.dirty = Some(false);
        s.ahead = Some(1);
        s.behind = Some(0);
        let entry = plan(&repo(), &s, PlanOptions::default());
        assert_eq!(entry.action, Action::Blocked);
        assert_eq!(entry.detail, "ahead by 1");
    }

    #[test]
    fn behind_only_updates() {
        let mut s = status(true, true);
        s.dirty = Some(false);
        s.ahead = Some(0);
        s.behind = Some(4);
        let entry = plan(&repo(), &s, PlanOptions::default());
        assert_eq!(entry.action, Action::Update);
        assert_eq!(entry.detail, "behind 4");
    }

    #[test]
    fn up_to_date_is_unchanged() {
        let mut s = status(true, true);
        s.dirty = Some(false);
        s.ahead = Some(0);
        s.behind = Some(0);
        let entry = plan(&repo(), &s, PlanOptions::default());
        assert_eq!(entry.action, Action::Unchanged);
    }

    #[test]
    fn unknown_remote_state_offline_updates() {
        let mut s = status(true, true);
        s.dirty = Some(false);
        let entry = plan(
            &repo(),
            &s,
            PlanOptions {
                fetch: false,
                offline: true,
            },
        );
        assert_eq!(entry.action, Action::Update);
        assert_eq!(entry.detail, "remote state unknown (offline)");
    }

    #[test]
    fn unknown_remote_state_without_fetch_updates() {
        let mut s = status(true, true);
        s.dirty = Some(false);
        let entry = plan(
            &repo(),
            &s,
            PlanOptions {
                fetch: false,
                offline: false,
            },
        );
        assert_eq!(entry.detail, "remote state unknown; use --fetch");
    }

    #[test]
    fn summary_counts_and_exit_codes() {
        let summary = PlanSummary::default();
        summary.record(Action::Clone);
        summary.record(Action::Blocked);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.exit_code(), 1);
        summary.record(Action::Error);
        assert_eq!(summary.exit_code(), 1);
    }
}
