//! End-to-end scenarios against real local git repositories, standing in
//! for a remote, exercised through the library's pipeline functions
//! directly (manifest -> status -> plan -> execute).

use std::path::Path;
use std::process::Command;
use std::sync::Mutex;

use tempfile::TempDir;
use vcspull::output::{HumanSink, Sink};
use vcspull::plan::{self, PlanOptions};
use vcspull::sync::{ExecutorOptions, execute};
use vcspull::{manifest, status};

fn git_available() -> bool {
    which::which("git").is_ok()
}

fn run_git(dir: &Path, args: &[&str]) {
    let status = Command::new("git").args(args).current_dir(dir).status().unwrap();
    assert!(status.success(), "git {args:?} failed in {dir:?}");
}

fn init_origin(dir: &Path) {
    run_git(dir, &["init", "-q"]);
    std::fs::write(dir.join("README"), "hello\n").unwrap();
    run_git(dir, &["-c", "user.email=t@t.com", "-c", "user.name=t", "add", "."]);
    run_git(
        dir,
        &["-c", "user.email=t@t.com", "-c", "user.name=t", "commit", "-q", "-m", "init"],
    );
}

fn write_manifest(dir: &Path, yaml: &str) -> std::path::PathBuf {
    let path = dir.join("vcspull.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn clone_missing_repository() {
    if !git_available() {
        return;
    }
    let workdir = TempDir::new().unwrap();
    let origin = workdir.path().join("origin");
    std::fs::create_dir(&origin).unwrap();
    init_origin(&origin);

    let code_dir = workdir.path().join("code");
    std::fs::create_dir(&code_dir).unwrap();
    let manifest_yaml = format!(
        "{}:\n  flask:\n    url: \"git+file://{}\"\n",
        code_dir.display(),
        origin.display()
    );
    let manifest_path = write_manifest(workdir.path(), &manifest_yaml);

    let repos = manifest::load(Some(&manifest_path), workdir.path()).unwrap();
    assert_eq!(repos.len(), 1);

    let probed = status::probe(&repos[0], status::Mode::Detailed, false).unwrap();
    let entry = plan::plan(&repos[0], &probed, PlanOptions::default());
    assert_eq!(entry.action, plan::Action::Clone);
    assert_eq!(entry.detail, "missing");

    let sink: Mutex<Box<dyn Sink + Send>> = Mutex::new(Box::new(HumanSink::default()));
    let summary = execute(
        vec![(repos[0].clone(), entry)],
        &sink,
        ExecutorOptions {
            max_concurrent: 2,
            ..Default::default()
        },
    );

    assert_eq!(summary.cloned.load(std::sync::atomic::Ordering::Relaxed), 1);
    assert!(repos[0].path.join(".git").exists());
}

#[test]
fn up_to_date_clone_reports_unchanged() {
    if !git_available() {
        return;
    }
    let workdir = TempDir::new().unwrap();
    let origin = workdir.path().join("origin");
    std::fs::create_dir(&origin).unwrap();
    init_origin(&origin);

    let checkout = workdir.path().join("code").join("flask");
    std::fs::create_dir_all(checkout.parent().unwrap()).unwrap();
    run_git(workdir.path(), &["clone", "-q", origin.to_str().unwrap(), checkout.to_str().unwrap()]);
    run_git(&checkout, &["branch", "--set-upstream-to=origin/master"]);

    let manifest_yaml = format!(
        "{}:\n  flask:\n    url: \"git+file://{}\"\n",
        checkout.parent().unwrap().display(),
        origin.display()
    );
    let manifest_path = write_manifest(workdir.path(), &manifest_yaml);
    let repos = manifest::load(Some(&manifest_path), workdir.path()).unwrap();

    let probed = status::probe(&repos[0], status::Mode::Detailed, true).unwrap();
    assert_eq!(probed.dirty, Some(false));
    let entry = plan::plan(&repos[0], &probed, PlanOptions { fetch: true, offline: false });
    assert_eq!(entry.action, plan::Action::Unchanged);
    assert_eq!(entry.detail, "up to date");
}

#[test]
fn dirty_checkout_blocks_and_leaves_filesystem_untouched() {
    if !git_available() {
        return;
    }
    let workdir = TempDir::new().unwrap();
    let origin = workdir.path().join("origin");
    std::fs::create_dir(&origin).unwrap();
    init_origin(&origin);

    let checkout = workdir.path().join("code").join("flask");
    std::fs::create_dir_all(checkout.parent().unwrap()).unwrap();
    run_git(workdir.path(), &["clone", "-q", origin.to_str().unwrap(), checkout.to_str().unwrap()]);
    std::fs::write(checkout.join("untracked.txt"), "oops").unwrap();

    let manifest_yaml = format!(
        "{}:\n  flask:\n    url: \"git+file://{}\"\n",
        checkout.parent().unwrap().display(),
        origin.display()
    );
    let manifest_path = write_manifest(workdir.path(), &manifest_yaml);
    let repos = manifest::load(Some(&manifest_path), workdir.path()).unwrap();

    let probed = status::probe(&repos[0], status::Mode::Detailed, false).unwrap();
    let entry = plan::plan(&repos[0], &probed, PlanOptions::default());
    assert_eq!(entry.action, plan::Action::Blocked);
    assert_eq!(entry.detail, "working tree has local changes");

    let sink: Mutex<Box<dyn Sink + Send>> = Mutex::new(Box::new(HumanSink::default()));
    let summary = execute(
        vec![(repos[0].clone(), entry)],
        &sink,
        ExecutorOptions::default(),
    );
    assert_eq!(summary.exit_code(), 1);
    assert!(checkout.join("untracked.txt").exists());
}

#[test]
fn duplicate_workspace_key_merges_both_repositories() {
    let workdir = TempDir::new().unwrap();
    let code_dir = workdir.path().join("code");
    let yaml = format!(
        "{dir}:\n  flask: git+https://example.test/flask.git\n{dir}:\n  django: git+https://example.test/django.git\n",
        dir = code_dir.display()
    );
    let manifest_path = write_manifest(workdir.path(), &yaml);
    let repos = manifest::load(Some(&manifest_path), workdir.path()).unwrap();

    let mut names: Vec<_> = repos.iter().map(|r| r.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["django".to_string(), "flask".to_string()]);

    let labels: std::collections::HashSet<_> =
        repos.iter().map(|r| r.workspace_label.clone()).collect();
    assert_eq!(labels.len(), 1, "both repos should share one canonical workspace label");
}
