//! Core manifest data model: the normalised, ordered view of a manifest.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which VCS backend a [`Repository`] is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vcs {
    Git,
    Hg,
    Svn,
}

impl Vcs {
    /// Infer a VCS kind from a URL, honouring the `<vcs>+` scheme prefix
    /// vcspull manifests use, SSH shorthand (`user@host:path.git`), and
    /// bare scheme prefixes (`git://`, `svn://`).
    pub fn infer_from_url(url: &str) -> Option<Self> {
        if let Some(rest) = url.strip_prefix("git+") {
            let _ = rest;
            return Some(Vcs::Git);
        }
        if url.strip_prefix("hg+").is_some() {
            return Some(Vcs::Hg);
        }
        if url.strip_prefix("svn+").is_some() {
            return Some(Vcs::Svn);
        }
        if url.starts_with("git://") || url.ends_with(".git") {
            return Some(Vcs::Git);
        }
        if url.starts_with("svn://") || url.starts_with("svn+") {
            return Some(Vcs::Svn);
        }
        // SSH shorthand: user@host:path, no scheme at all.
        if !url.contains("://") && url.contains('@') && url.contains(':') {
            return Some(Vcs::Git);
        }
        None
    }

    /// Strip the `<vcs>+` prefix vcspull manifests use to tag a URL's
    /// kind, returning the URL a driver would actually invoke.
    pub fn strip_prefix(url: &str) -> &str {
        for prefix in ["git+", "hg+", "svn+"] {
            if let Some(rest) = url.strip_prefix(prefix) {
                return rest;
            }
        }
        url
    }
}

impl fmt::Display for Vcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Vcs::Git => "git",
            Vcs::Hg => "hg",
            Vcs::Svn => "svn",
        })
    }
}

impl std::str::FromStr for Vcs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "git" => Ok(Vcs::Git),
            "hg" => Ok(Vcs::Hg),
            "svn" => Ok(Vcs::Svn),
            other => Err(format!("unknown vcs kind: {other}")),
        }
    }
}

/// The canonical form of a workspace-label mapping key, e.g. `~/code/`
/// canonicalised to an absolute, trailing-slash-terminated path.
///
/// Two labels are equivalent iff their canonical forms compare equal;
/// construction is the only place canonicalisation happens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkspaceLabel {
    /// Absolute, trailing-separator-terminated path.
    canonical: PathBuf,
    /// The label as the user wrote it, kept only for display.
    display: String,
}

impl WorkspaceLabel {
    /// Canonicalise a raw manifest key relative to `cwd` (used to resolve
    /// purely relative labels; `~` and `$VARS` are expanded first).
    pub fn new(raw: &str, cwd: &Path) -> Self {
        let expanded = crate::path::expand_user_vars(raw);
        let mut path = PathBuf::from(expanded.as_ref());
        if path.is_relative() {
            path = cwd.join(path);
        }
        let mut canonical = normalize_path::NormalizePath::normalize(path.as_path());
        // Re-terminate with a path separator so `~/code` and `~/code/`
        // collapse to the same canonical form.
        if !canonical.as_os_str().is_empty() {
            canonical.push("");
        }
        WorkspaceLabel {
            canonical,
            display: raw.to_string(),
        }
    }

    pub fn canonical_path(&self) -> &Path {
        &self.canonical
    }

    pub fn display(&self) -> &str {
        &self.display
    }
}

impl fmt::Display for WorkspaceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical.display())
    }
}

/// One remote's fetch/push URL pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub fetch_url: String,
    pub push_url: String,
}

impl Remote {
    pub fn single(url: impl Into<String>) -> Self {
        let url = url.into();
        Remote {
            push_url: url.clone(),
            fetch_url: url,
        }
    }
}

/// Exactly one of the three ref kinds a [`WorktreeSpec`] may pin to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSpec {
    Tag(String),
    Branch(String),
    Commit(String),
}

impl RefSpec {
    pub fn value(&self) -> &str {
        match self {
            RefSpec::Tag(v) | RefSpec::Branch(v) | RefSpec::Commit(v) => v,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            RefSpec::Tag(_) => "tag",
            RefSpec::Branch(_) => "branch",
            RefSpec::Commit(_) => "commit",
        }
    }

    /// Default detach behaviour: tags and commits default to detached,
    /// branches default to attached.
    pub fn default_detach(&self) -> bool {
        !matches!(self, RefSpec::Branch(_))
    }
}

/// One entry of a repository's worktree sub-manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeSpec {
    /// Absolute target directory (resolved once the parent repo is known).
    pub dir: PathBuf,
    pub reference: RefSpec,
    pub lock: bool,
    pub lock_reason: Option<String>,
    /// `None` means "use the ref kind's default".
    pub detach: Option<bool>,
}

impl WorktreeSpec {
    pub fn effective_detach(&self) -> bool {
        self.detach.unwrap_or_else(|| self.reference.default_detach())
    }
}

/// The fully-expanded declaration of one repository, as produced by the
/// normaliser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub workspace_label: WorkspaceLabel,
    pub path: PathBuf,
    pub url: String,
    pub vcs: Vcs,
    pub remotes: BTreeMap<String, Remote>,
    pub rev: Option<String>,
    pub shell_command_after: Vec<String>,
    pub worktrees: Vec<WorktreeSpec>,
}

impl Repository {
    /// The URL with any `<vcs>+` scheme prefix stripped, i.e. what a
    /// driver actually passes to the VCS executable.
    pub fn driver_url(&self) -> &str {
        Vcs::strip_prefix(&self.url)
    }
}
