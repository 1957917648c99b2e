//! Declarative multi-repository VCS management.
//!
//! Given a YAML/JSON manifest describing where a fleet of git/hg/svn
//! checkouts should live on disk, vcspull brings the local filesystem
//! into conformance with that manifest: missing repositories are cloned,
//! behind ones are fast-forwarded, dirty or diverged ones are left alone
//! and reported.
//!
//! The library API is organised around the same pipeline the `sync`
//! command drives: [`manifest`] (load + normalise) → [`filter`] →
//! [`status`] → [`plan`] → [`sync::executor`], with [`worktree`] as a
//! parallel planner/executor pair for per-repository worktree
//! sub-manifests.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod path;
pub mod plan;
pub mod shell_exec;
pub mod status;
pub mod sync;
pub mod vcs;
pub mod worktree;

pub use error::{ConfigError, DriverError, WorktreeError};
pub use manifest::model::{Repository, Vcs, WorkspaceLabel, WorktreeSpec};
pub use plan::{Action, PlanEntry, PlanSummary};
