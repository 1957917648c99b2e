//! Error taxonomy for every subsystem.
//!
//! Each subsystem gets its own `thiserror` enum with a stable kind name
//! per variant. Call sites that cross a module boundary wrap these in
//! `anyhow::Result` with `.context(...)` naming the manifest path or
//! repository involved, so a failure deep in a driver still reports
//! what triggered it.

use std::path::PathBuf;

/// Errors raised while loading, parsing, or validating a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported manifest extension: {path}")]
    Format { path: PathBuf },

    #[error("could not parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("manifest {path} does not have a mapping at its root")]
    Schema { path: PathBuf },

    #[error("repository {name:?} is invalid: {reason}")]
    InvalidRepository { name: String, reason: String },

    #[error(
        "two repositories map to path {path}: {first_url} ({first_vcs}) vs {second_url} ({second_vcs})"
    )]
    DuplicatePath {
        path: PathBuf,
        first_url: String,
        first_vcs: String,
        second_url: String,
        second_vcs: String,
    },

    #[error("found more than one top-level manifest in {dir}: {candidates:?}")]
    MultipleConfig {
        dir: PathBuf,
        candidates: Vec<PathBuf>,
    },

    #[error("no manifest file found")]
    NotFound,
}

/// Errors raised by a VCS driver invocation (clone/update/current_revision).
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("{0} executable not found on PATH")]
    NotInstalled(&'static str),

    #[error("authentication required for {url}")]
    AuthRequired { url: String },

    #[error("network error talking to {url}: {detail}")]
    NetworkError { url: String, detail: String },

    #[error("`{command}` exited with status {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("could not parse output of `{command}`: {detail}")]
    OutputParseError { command: String, detail: String },
}

/// Errors raised while validating or executing a worktree sub-manifest.
#[derive(Debug, thiserror::Error)]
pub enum WorktreeError {
    #[error("worktree spec for {dir} must set exactly one of tag, branch, commit (found {count})")]
    AmbiguousRef { dir: PathBuf, count: usize },

    #[error("worktree spec is missing a `dir`")]
    MissingDir,

    #[error("{dir} exists and is not a git worktree")]
    NotAWorktree { dir: PathBuf },

    #[error("ref {reference:?} not found locally or on any declared remote")]
    RefNotFound { reference: String },

    #[error(transparent)]
    Driver(#[from] DriverError),
}
