//! Sync Executor: applies a stream of PlanEntries to the filesystem,
//! bounded by a bounded worker pool and a single shared PlanSummary.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::DriverError;
use crate::manifest::Repository;
use crate::output::{OperationRecord, Sink};
use crate::plan::{Action, PlanEntry, PlanSummary};
use crate::shell_exec;
use crate::vcs::driver_for;

use super::semaphore::Semaphore;

/// Executor-wide knobs, independent of planning.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorOptions {
    pub max_concurrent: usize,
    pub exit_on_error: bool,
    pub dry_run: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        ExecutorOptions {
            max_concurrent: crate::config::DEFAULT_MAX_CONCURRENT,
            exit_on_error: false,
            dry_run: false,
        }
    }
}

/// Apply `entries` (paired with their repositories, same order) against
/// the filesystem, emitting one record per entry through `sink` and a
/// final summary. Returns the accumulated [`PlanSummary`].
pub fn execute(
    work: Vec<(Repository, PlanEntry)>,
    sink: &Mutex<Box<dyn Sink + Send>>,
    opts: ExecutorOptions,
) -> PlanSummary {
    let summary = PlanSummary::default();
    let cancelled = AtomicBool::new(false);
    let permits = opts.max_concurrent.max(1);
    let semaphore = Semaphore::new(permits);

    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(work.len());
        for (repo, entry) in work {
            let semaphore = semaphore.clone();
            let summary = &summary;
            let cancelled = &cancelled;
            let sink = sink;
            handles.push(scope.spawn(move || {
                if cancelled.load(Ordering::Acquire) {
                    emit_cancelled(&repo, sink, summary);
                    return;
                }
                let _guard = semaphore.acquire();
                if cancelled.load(Ordering::Acquire) {
                    emit_cancelled(&repo, sink, summary);
                    return;
                }

                let record = apply_entry(&repo, &entry, opts.dry_run);
                let became_error =
                    entry.action != Action::Error && record.action == Action::Error;

                {
                    let mut sink = sink.lock().unwrap();
                    sink.operation(&record);
                }
                summary.record(record.action);

                if opts.exit_on_error && became_error {
                    cancelled.store(true, Ordering::Release);
                }
            }));
        }
        for handle in handles {
            let _ = handle.join();
        }
    });

    summary
}

fn emit_cancelled(repo: &Repository, sink: &Mutex<Box<dyn Sink + Send>>, summary: &PlanSummary) {
    let record = OperationRecord {
        name: repo.name.clone(),
        path: repo.path.display().to_string(),
        workspace_root: repo.workspace_label.display().to_string(),
        action: Action::Error,
        detail: "cancelled".to_string(),
        error: Some("cancelled".to_string()),
        ..Default::default()
    };
    sink.lock().unwrap().operation(&record);
    summary.record(Action::Error);
}

/// Per-action effect: CLONE/UPDATE invoke a driver, the rest are no-ops
/// that only produce a status record.
fn apply_entry(repo: &Repository, entry: &PlanEntry, dry_run: bool) -> OperationRecord {
    let mut record = OperationRecord {
        name: repo.name.clone(),
        path: repo.path.display().to_string(),
        workspace_root: repo.workspace_label.display().to_string(),
        action: entry.action,
        detail: entry.detail.clone(),
        url: Some(repo.driver_url().to_string()),
        ..Default::default()
    };

    if dry_run {
        return record;
    }

    let result = match entry.action {
        Action::Clone => {
            let driver = driver_for(repo.vcs);
            driver.clone(repo.driver_url(), &repo.path, repo.rev.as_deref())
                .and_then(|()| run_shell_command_after(repo))
        }
        Action::Update => {
            let driver = driver_for(repo.vcs);
            driver.update(&repo.path, &repo.remotes)
        }
        Action::Unchanged | Action::Blocked | Action::Error => Ok(()),
    };

    if let Err(err) = result {
        record.action = Action::Error;
        record.detail = err.to_string();
        record.error = Some(err.to_string());
    }

    record
}

fn run_shell_command_after(repo: &Repository) -> Result<(), DriverError> {
    for command in &repo.shell_command_after {
        let mut cmd = shell_exec::ShellConfig::get().command(command);
        cmd.current_dir(&repo.path);
        let output = shell_exec::run(&mut cmd, Some("shell_command_after")).map_err(|e| {
            DriverError::NonZeroExit {
                command: command.clone(),
                code: -1,
                stderr: e.to_string(),
            }
        })?;
        if !output.status.success() {
            return Err(DriverError::NonZeroExit {
                command: command.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::model::{Vcs, WorkspaceLabel};
    use crate::output::HumanSink;
    use std::path::PathBuf;

    fn repo(path: PathBuf) -> Repository {
        Repository {
            name: "r".to_string(),
            workspace_label: WorkspaceLabel::new("~/code/", &PathBuf::from("/")),
            path,
            url: "git+https://example.test/r.git".to_string(),
            vcs: Vcs::Git,
            remotes: Default::default(),
            rev: None,
            shell_command_after: Vec::new(),
            worktrees: Vec::new(),
        }
    }

    #[test]
    fn unchanged_entries_are_a_no_op_and_counted() {
        let entry = PlanEntry {
            repo_name: "r".to_string(),
            action: Action::Unchanged,
            detail: "up to date".to_string(),
        };
        let sink: Mutex<Box<dyn Sink + Send>> = Mutex::new(Box::new(HumanSink::default()));
        let summary = execute(
            vec![(repo(PathBuf::from("/tmp/nonexistent-vcspull-test")), entry)],
            &sink,
            ExecutorOptions {
                max_concurrent: 2,
                exit_on_error: false,
                dry_run: false,
            },
        );
        assert_eq!(summary.total(), 1);
        assert_eq!(summary.unchanged.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn dry_run_never_touches_the_filesystem() {
        let entry = PlanEntry {
            repo_name: "r".to_string(),
            action: Action::Clone,
            detail: "missing".to_string(),
        };
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("would-be-cloned");
        let sink: Mutex<Box<dyn Sink + Send>> = Mutex::new(Box::new(HumanSink::default()));
        let summary = execute(
            vec![(repo(target.clone()), entry)],
            &sink,
            ExecutorOptions {
                max_concurrent: 1,
                exit_on_error: false,
                dry_run: true,
            },
        );
        assert_eq!(summary.cloned.load(Ordering::Relaxed), 1);
        assert!(!target.exists());
    }
}
