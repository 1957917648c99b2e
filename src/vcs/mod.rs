//! VCS Driver: a narrow trait consumed by the sync executor and the
//! worktree executor, with one implementation per backend and a small
//! registry keyed on [`Vcs`] rather than any inheritance chain.

mod git;
mod hg;
mod svn;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DriverError;
use crate::manifest::Vcs;
use crate::manifest::model::Remote;

pub use git::GitDriver;
pub use hg::HgDriver;
pub use svn::SvnDriver;

/// The three operations every VCS backend must provide. `remotes` is the
/// repository's declared extra-remotes map (git only per the data model;
/// other backends accept and ignore it so the trait stays uniform).
pub trait VcsDriver {
    fn clone(&self, url: &str, target_path: &Path, rev: Option<&str>) -> Result<(), DriverError>;
    fn update(&self, path: &Path, remotes: &BTreeMap<String, Remote>) -> Result<(), DriverError>;
    fn current_revision(&self, path: &Path) -> Result<String, DriverError>;
}

/// Resolve the driver for a [`Vcs`] tag. A plain match, not a registry
/// object, since the set of backends is closed and known at compile time.
pub fn driver_for(vcs: Vcs) -> Box<dyn VcsDriver> {
    match vcs {
        Vcs::Git => Box::new(GitDriver),
        Vcs::Hg => Box::new(HgDriver),
        Vcs::Svn => Box::new(SvnDriver),
    }
}

/// Shared helper: run `program` with `args` in `cwd` (or the current
/// directory when `cwd` is `None`), translating a missing executable
/// and a non-zero exit into the matching [`DriverError`] variants. Every
/// driver invocation goes through this so logging/timing is uniform.
fn run_checked(
    program: &'static str,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<std::process::Output, DriverError> {
    let mut cmd = std::process::Command::new(program);
    cmd.args(args);
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    let output = crate::shell_exec::run(&mut cmd, Some(program)).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DriverError::NotInstalled(program)
        } else if e.kind() == std::io::ErrorKind::TimedOut {
            DriverError::NetworkError {
                url: cwd.map(|p| p.display().to_string()).unwrap_or_default(),
                detail: "timeout".to_string(),
            }
        } else {
            DriverError::NonZeroExit {
                command: format!("{program} {}", args.join(" ")),
                code: -1,
                stderr: e.to_string(),
            }
        }
    })?;

    if !output.status.success() {
        return Err(DriverError::NonZeroExit {
            command: format!("{program} {}", args.join(" ")),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}
