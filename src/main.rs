use std::io::stdout;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;
use vcspull::cli::Cli;
use vcspull::config::VcspullConfig;
use vcspull::filter::{FilterSpec, filter_repos};
use vcspull::manifest::Repository;
use vcspull::output::{HumanSink, JsonSink, NdjsonSink, OperationRecord, Sink, SummaryRecord};
use vcspull::plan::{Action, PlanOptions};
use vcspull::sync::{ExecutorOptions, execute};
use vcspull::worktree::executor::apply as apply_worktree;
use vcspull::worktree::planner::plan_worktree;
use vcspull::{manifest, plan, status};

fn main() {
    let cli = Cli::parse();
    vcspull::logging::init(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            log::error!("{err:#}");
            std::process::exit(3);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let started = Instant::now();
    let cwd = std::env::current_dir().context("could not determine current directory")?;

    let repos = manifest::load(cli.config.as_deref(), &cwd).context("loading manifest")?;

    let repos = if let Some(workspace) = &cli.workspace {
        let label = manifest::model::WorkspaceLabel::new(workspace, &cwd);
        repos
            .into_iter()
            .filter(|r| r.workspace_label == label)
            .collect()
    } else {
        repos
    };

    let specs = FilterSpec::from_terms(&cli.terms);
    let selected: Vec<_> = filter_repos(&repos, &specs).into_iter().cloned().collect();

    let config = VcspullConfig::load().unwrap_or_default();
    let max_concurrent = cli.max_concurrent.unwrap_or(config.max_concurrent);
    vcspull::shell_exec::set_timeout(config.timeout_secs.map(std::time::Duration::from_secs));

    let plan_opts = PlanOptions {
        fetch: cli.fetch_enabled(config.fetch),
        offline: cli.offline,
    };

    // Status probing never touches the working tree (a best-effort `git
    // fetch` may update remote-tracking refs when requested) and is
    // independent per repository, so it fans out across Rayon's pool the
    // same way the teacher's `list` command collects per-worktree git
    // state in parallel.
    let probe_fetch = plan_opts.fetch && !plan_opts.offline;
    let probed: Vec<_> = selected
        .par_iter()
        .map(|repo| {
            status::probe(repo, status::Mode::Detailed, probe_fetch)
                .with_context(|| format!("probing status of {}", repo.name))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let work: Vec<_> = selected
        .into_iter()
        .zip(probed)
        .map(|(repo, probed)| {
            let entry = plan::plan(&repo, &probed, plan_opts);
            (repo, entry)
        })
        .collect();

    let mut sink: Box<dyn Sink + Send> = if cli.json {
        Box::new(JsonSink::default())
    } else if cli.ndjson {
        Box::new(NdjsonSink::default())
    } else {
        Box::new(HumanSink::default())
    };

    if cli.dry_run {
        for (repo, entry) in &work {
            let record = OperationRecord {
                name: repo.name.clone(),
                path: repo.path.display().to_string(),
                workspace_root: repo.workspace_label.display().to_string(),
                action: entry.action,
                detail: entry.detail.clone(),
                ..Default::default()
            };
            sink.operation(&record);
        }
        let summary = plan::PlanSummary::default();
        for (_, entry) in &work {
            summary.record(entry.action);
        }

        let (wt_blocked, wt_errored) = if cli.include_worktrees {
            run_worktrees(&work, true, sink.as_mut())
        } else {
            (0, 0)
        };

        sink.summary(&SummaryRecord::from_plan_summary(
            &summary,
            Some(started.elapsed().as_millis()),
        ));
        let mut out = stdout().lock();
        sink.finish(&mut out)?;
        return Ok(combined_exit_code(summary.exit_code(), wt_blocked, wt_errored));
    }

    let sink_mutex: Mutex<Box<dyn Sink + Send>> = Mutex::new(sink);
    let summary = execute(
        work.clone(),
        &sink_mutex,
        ExecutorOptions {
            max_concurrent,
            exit_on_error: cli.exit_on_error,
            dry_run: false,
        },
    );

    let mut sink = sink_mutex.into_inner().unwrap();

    let (wt_blocked, wt_errored) = if cli.include_worktrees {
        run_worktrees(&work, false, sink.as_mut())
    } else {
        (0, 0)
    };

    sink.summary(&SummaryRecord::from_plan_summary(
        &summary,
        Some(started.elapsed().as_millis()),
    ));
    let mut out = stdout().lock();
    sink.finish(&mut out)?;

    if cli.exit_on_error
        && (summary.errored.load(std::sync::atomic::Ordering::Relaxed) > 0 || wt_errored > 0)
    {
        return Ok(2);
    }
    Ok(combined_exit_code(summary.exit_code(), wt_blocked, wt_errored))
}

/// Runs the worktree sub-planner (and, unless `dry_run`, the executor) for
/// every repository that declares `worktrees`, emitting one record per
/// worktree through `sink`. Returns `(blocked_count, errored_count)`.
fn run_worktrees(
    work: &[(Repository, plan::PlanEntry)],
    dry_run: bool,
    sink: &mut dyn Sink,
) -> (usize, usize) {
    let mut blocked = 0usize;
    let mut errored = 0usize;

    for (repo, _) in work {
        for spec in &repo.worktrees {
            let name = format!("{}:{}", repo.name, spec.dir.display());
            let outcome = plan_worktree(&repo.path, spec).and_then(|entry| {
                if !dry_run {
                    apply_worktree(&repo.path, spec, &entry)?;
                }
                Ok(entry)
            });

            let record = match outcome {
                Ok(entry) => {
                    if entry.action == Action::Blocked {
                        blocked += 1;
                    }
                    OperationRecord {
                        name,
                        path: spec.dir.display().to_string(),
                        workspace_root: repo.workspace_label.display().to_string(),
                        action: entry.action,
                        detail: entry.detail,
                        target_rev: entry.resolved_ref,
                        ..Default::default()
                    }
                }
                Err(err) => {
                    errored += 1;
                    OperationRecord {
                        name,
                        path: spec.dir.display().to_string(),
                        workspace_root: repo.workspace_label.display().to_string(),
                        action: Action::Error,
                        detail: err.to_string(),
                        error: Some(err.to_string()),
                        ..Default::default()
                    }
                }
            };
            sink.operation(&record);
        }
    }

    (blocked, errored)
}

/// Folds worktree blocked/errored counts into the repo-level exit code.
/// Exit code 2 is reserved for an early `--exit-on-error` abort, checked
/// by the caller before this runs; here, a worktree error or block that
/// didn't trigger an abort contributes at most 1, same as a repo error.
fn combined_exit_code(repo_exit_code: i32, wt_blocked: usize, wt_errored: usize) -> i32 {
    if wt_errored > 0 || wt_blocked > 0 {
        return repo_exit_code.max(1);
    }
    repo_exit_code
}
