//! Thin clap surface over the sync pipeline. Argument parsing itself is
//! out of scope beyond what's needed to run the core end-to-end.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "vcspull", version, about = "Declarative multi-repository VCS manager")]
pub struct Cli {
    /// Repo-term globs matching name, path, or URL; empty selects everything.
    pub terms: Vec<String>,

    /// Explicit manifest path; otherwise discovered from the conventional locations.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Restrict to repositories under this workspace label.
    #[arg(short = 'w', long = "workspace")]
    pub workspace: Option<String>,

    /// Stop scheduling new work on the first repository error.
    #[arg(short = 'x', long = "exit-on-error")]
    pub exit_on_error: bool,

    /// Permit the planner to refresh remote state before deciding.
    #[arg(long = "fetch", overrides_with = "no_fetch")]
    pub fetch: bool,

    #[arg(long = "no-fetch", overrides_with = "fetch")]
    pub no_fetch: bool,

    /// Forbid any network call; overrides --fetch.
    #[arg(long)]
    pub offline: bool,

    /// Print the plan without executing it.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Worker pool size; defaults to the runtime config's value.
    #[arg(long = "max-concurrent")]
    pub max_concurrent: Option<usize>,

    /// Also run the worktree sub-planner for each repository.
    #[arg(long = "include-worktrees")]
    pub include_worktrees: bool,

    /// Emit a buffered JSON array instead of human-readable lines.
    #[arg(long, conflicts_with = "ndjson")]
    pub json: bool,

    /// Emit newline-delimited JSON, streamed as records complete.
    #[arg(long, conflicts_with = "json")]
    pub ndjson: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease log verbosity (repeatable).
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// Resolve the effective fetch permission: `--offline` always wins,
    /// an explicit `--fetch`/`--no-fetch` wins next, otherwise falls back
    /// to the runtime config's default the same way `max_concurrent` does.
    pub fn fetch_enabled(&self, config_default: bool) -> bool {
        if self.offline {
            return false;
        }
        if self.fetch {
            return true;
        }
        if self.no_fetch {
            return false;
        }
        config_default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_terms_and_flags() {
        let cli = Cli::parse_from(["vcspull", "flask", "--dry-run", "-vv"]);
        assert_eq!(cli.terms, vec!["flask".to_string()]);
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn no_fetch_overrides_fetch() {
        let cli = Cli::parse_from(["vcspull", "--fetch", "--no-fetch"]);
        assert!(!cli.fetch_enabled(true));
    }

    #[test]
    fn offline_overrides_fetch_flag() {
        let cli = Cli::parse_from(["vcspull", "--fetch", "--offline"]);
        assert!(!cli.fetch_enabled(true));
    }

    #[test]
    fn unset_flags_fall_back_to_config_default() {
        let cli = Cli::parse_from(["vcspull"]);
        assert!(cli.fetch_enabled(true));
        assert!(!cli.fetch_enabled(false));
    }
}
