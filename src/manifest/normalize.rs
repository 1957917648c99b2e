//! Shorthand expansion and validation: raw loader output -> ordered
//! [`Repository`] list.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;

use super::loader::{RawManifest, RawValue};
use super::model::{RefSpec, Remote, Repository, Vcs, WorkspaceLabel, WorktreeSpec};

/// Normalise a [`RawManifest`] into an ordered list of [`Repository`],
/// applying shorthand expansion and cross-repository duplicate-path
/// detection.
pub fn normalize(manifest: RawManifest, cwd: &Path) -> Result<Vec<Repository>, ConfigError> {
    let mut repos = Vec::new();
    let mut by_path: BTreeMap<std::path::PathBuf, (String, Vcs)> = BTreeMap::new();

    for (label, raw_repos) in manifest {
        let workspace_label = WorkspaceLabel::new(&label, cwd);
        for (name, entry) in raw_repos {
            let repo = normalize_repository(&name, &entry, &workspace_label)?;

            if let Some((existing_url, existing_vcs)) = by_path.get(&repo.path) {
                if *existing_url == repo.url && *existing_vcs == repo.vcs {
                    // Identical (path, url, vcs): collapse silently.
                    continue;
                }
                return Err(ConfigError::DuplicatePath {
                    path: repo.path.clone(),
                    first_url: existing_url.clone(),
                    first_vcs: existing_vcs.to_string(),
                    second_url: repo.url.clone(),
                    second_vcs: repo.vcs.to_string(),
                });
            }
            by_path.insert(repo.path.clone(), (repo.url.clone(), repo.vcs));
            repos.push(repo);
        }
    }

    Ok(repos)
}

fn normalize_repository(
    name: &str,
    entry: &RawValue,
    workspace_label: &WorkspaceLabel,
) -> Result<Repository, ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::InvalidRepository {
            name: name.to_string(),
            reason: "repository name must not be empty".to_string(),
        });
    }

    // Shorthand: `name: "url"` -> `name: { url: "url" }`.
    let mapping = match entry {
        RawValue::String(url) => {
            let mut m = indexmap::IndexMap::new();
            m.insert("url".to_string(), RawValue::String(url.clone()));
            std::borrow::Cow::Owned(m)
        }
        RawValue::Mapping(m) => std::borrow::Cow::Borrowed(m),
        _ => {
            return Err(ConfigError::InvalidRepository {
                name: name.to_string(),
                reason: "repository entry must be a URL string or a mapping".to_string(),
            });
        }
    };

    // `repo` is a legacy alias of `url`.
    let url = mapping
        .get("url")
        .or_else(|| mapping.get("repo"))
        .and_then(RawValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::InvalidRepository {
            name: name.to_string(),
            reason: "missing `url` (or legacy `repo`)".to_string(),
        })?;
    if url.is_empty() {
        return Err(ConfigError::InvalidRepository {
            name: name.to_string(),
            reason: "`url` must not be empty".to_string(),
        });
    }

    let vcs = match mapping.get("vcs").and_then(RawValue::as_str) {
        Some(explicit) => explicit.parse().map_err(|reason| ConfigError::InvalidRepository {
            name: name.to_string(),
            reason,
        })?,
        None => Vcs::infer_from_url(&url).ok_or_else(|| ConfigError::InvalidRepository {
            name: name.to_string(),
            reason: format!("could not infer vcs kind from url {url:?}"),
        })?,
    };

    let path = match mapping.get("path").and_then(RawValue::as_str) {
        Some(explicit) => {
            let expanded = crate::path::expand_user_vars(explicit);
            std::path::PathBuf::from(expanded.as_ref())
        }
        None => workspace_label.canonical_path().join(name),
    };

    let remotes = normalize_remotes(mapping.get("remotes"));

    let rev = mapping
        .get("rev")
        .and_then(RawValue::as_str)
        .map(str::to_string);

    let shell_command_after = normalize_shell_commands(mapping.get("shell_command_after"));

    let worktrees = match mapping.get("worktrees").and_then(RawValue::as_sequence) {
        Some(seq) => seq
            .iter()
            .map(|w| normalize_worktree_spec(w, &path))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| ConfigError::InvalidRepository {
                name: name.to_string(),
                reason,
            })?,
        None => Vec::new(),
    };

    Ok(Repository {
        name: name.to_string(),
        workspace_label: workspace_label.clone(),
        path,
        url,
        vcs,
        remotes,
        rev,
        shell_command_after,
        worktrees,
    })
}

fn normalize_remotes(raw: Option<&RawValue>) -> BTreeMap<String, Remote> {
    let Some(mapping) = raw.and_then(RawValue::as_mapping) else {
        return BTreeMap::new();
    };
    mapping
        .iter()
        .filter_map(|(name, value)| {
            let remote = match value {
                RawValue::String(url) => Remote::single(url.clone()),
                RawValue::Mapping(m) => Remote {
                    fetch_url: m.get("fetch_url").and_then(RawValue::as_str)?.to_string(),
                    push_url: m.get("push_url").and_then(RawValue::as_str)?.to_string(),
                },
                _ => return None,
            };
            Some((name.clone(), remote))
        })
        .collect()
}

fn normalize_shell_commands(raw: Option<&RawValue>) -> Vec<String> {
    match raw {
        Some(RawValue::String(s)) => vec![s.clone()],
        Some(RawValue::Sequence(seq)) => seq
            .iter()
            .filter_map(RawValue::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_worktree_spec(
    raw: &RawValue,
    repo_path: &Path,
) -> Result<WorktreeSpec, String> {
    let mapping = raw
        .as_mapping()
        .ok_or_else(|| "worktree entry must be a mapping".to_string())?;

    let dir_raw = mapping
        .get("dir")
        .and_then(RawValue::as_str)
        .ok_or_else(|| "worktree spec is missing `dir`".to_string())?;
    let dir = {
        let expanded = crate::path::expand_user_vars(dir_raw);
        let candidate = std::path::PathBuf::from(expanded.as_ref());
        if candidate.is_absolute() {
            candidate
        } else {
            // Relative to the repository's parent directory, matching
            // the sibling-directory semantics of `git worktree add`.
            repo_path
                .parent()
                .unwrap_or(repo_path)
                .join(candidate)
        }
    };

    let mut refs = Vec::new();
    if let Some(tag) = mapping.get("tag").and_then(RawValue::as_str) {
        refs.push(RefSpec::Tag(tag.to_string()));
    }
    if let Some(branch) = mapping.get("branch").and_then(RawValue::as_str) {
        refs.push(RefSpec::Branch(branch.to_string()));
    }
    if let Some(commit) = mapping.get("commit").and_then(RawValue::as_str) {
        refs.push(RefSpec::Commit(commit.to_string()));
    }
    if refs.len() != 1 {
        return Err(format!(
            "worktree spec for {} must set exactly one of tag, branch, commit (found {})",
            dir.display(),
            refs.len()
        ));
    }
    let reference = refs.into_iter().next().unwrap();

    let lock = mapping.get("lock").and_then(RawValue::as_bool).unwrap_or(false);
    let lock_reason = mapping
        .get("lock_reason")
        .and_then(RawValue::as_str)
        .map(str::to_string);
    let detach = mapping.get("detach").and_then(RawValue::as_bool);

    Ok(WorktreeSpec {
        dir,
        reference,
        lock,
        lock_reason,
        detach,
    })
}
