//! Duplicate-aware manifest loading.
//!
//! Standard YAML/JSON mapping semantics silently retain only the last
//! occurrence of a repeated key. Manifests edited over time by hand may
//! legitimately repeat a workspace key (`~/code/:` appearing twice in
//! the same file, or across files during discovery); the loader
//! preserves every occurrence and merges children with a left-precedent
//! policy instead of letting the dedup happen before we ever see it.
//!
//! Deserializing straight into `serde_yaml::Value` does not give us
//! that: `Value::Mapping`'s own `Deserialize` impl folds duplicate keys
//! via ordinary map-insert semantics while it's built, so by the time
//! any code walks the resulting tree the second occurrence is already
//! gone. `ParsedYaml` below is deserialized through a hand-written
//! `Visitor` instead, one that collects every mapping entry into a
//! plain `Vec` as it's visited rather than folding into a deduplicating
//! map — serde_yaml's `MapAccess` streams every entry in the document
//! as parsed, duplicates included, so nothing is lost before
//! `merge_workspaces`/`merge_repo_entry` get a chance to apply the
//! documented left-precedent policy explicitly.
//!
//! This is the single load path used everywhere a manifest is read, so
//! the duplicate-dropping bug the original implementation had in one of
//! its two loaders cannot recur here.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};

use crate::error::ConfigError;

/// The raw, loader-level shape: workspace label -> (repo name -> raw
/// repo entry). Values are kept as [`serde_yaml::Value`] /
/// [`serde_json::Value`]-agnostic [`RawValue`] until the normaliser
/// interprets them, so both file formats share one representation.
pub type RawWorkspace = IndexMap<String, RawValue>;
pub type RawManifest = IndexMap<String, RawWorkspace>;

/// A format-agnostic JSON-like value; the loader folds both
/// `serde_yaml::Value` and `serde_json::Value` into this shape so the
/// normaliser never has to care which file format produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    String(String),
    Mapping(IndexMap<String, RawValue>),
    Sequence(Vec<RawValue>),
}

impl RawValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, RawValue>> {
        match self {
            RawValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[RawValue]> {
        match self {
            RawValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Load and merge a single manifest file at `path`.
pub fn load_file(path: &Path) -> Result<RawManifest, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let root = match ext.as_deref() {
        Some("yaml") | Some("yml") => {
            let value: ParsedYaml =
                serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: Box::new(e),
                })?;
            value
        }
        Some("json") => {
            let value: serde_json::Value =
                serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: Box::new(e),
                })?;
            json_to_parsed(value)
        }
        _ => {
            return Err(ConfigError::Format {
                path: path.to_path_buf(),
            });
        }
    };

    let ParsedYaml::Mapping(top) = root else {
        return Err(ConfigError::Schema {
            path: path.to_path_buf(),
        });
    };

    Ok(merge_workspaces(top, path))
}

/// Load and merge several manifest files in order (first file wins on
/// conflicting repository definitions), applying the same left-precedent
/// policy across file boundaries as within one file.
pub fn load_files(paths: &[PathBuf]) -> Result<RawManifest, ConfigError> {
    let mut merged: RawManifest = IndexMap::new();
    for path in paths {
        let manifest = load_file(path)?;
        for (label, repos) in manifest {
            let entry = merged.entry(label).or_default();
            for (name, repo) in repos {
                merge_repo_entry(entry, name, repo);
            }
        }
    }
    Ok(merged)
}

/// An untyped YAML/JSON tree that keeps every mapping entry in parse
/// order, including duplicate keys — unlike [`serde_yaml::Value`],
/// whose own `Deserialize` impl folds them away before we'd ever see
/// them. See the module doc for why that distinction matters here.
#[derive(Debug, Clone, PartialEq)]
enum ParsedYaml {
    Null,
    Bool(bool),
    String(String),
    Sequence(Vec<ParsedYaml>),
    Mapping(Vec<(String, ParsedYaml)>),
}

impl<'de> Deserialize<'de> for ParsedYaml {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ParsedYamlVisitor;

        impl<'de> Visitor<'de> for ParsedYamlVisitor {
            type Value = ParsedYaml;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("any YAML value")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(ParsedYaml::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(ParsedYaml::Null)
            }

            fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
            where
                D2: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_newtype_struct<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
            where
                D2: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
                Ok(ParsedYaml::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ParsedYaml::String(v.to_string()))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ParsedYaml::String(v.to_string()))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ParsedYaml::String(v.to_string()))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ParsedYaml::String(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
                Ok(ParsedYaml::String(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut out = Vec::new();
                while let Some(v) = seq.next_element()? {
                    out.push(v);
                }
                Ok(ParsedYaml::Sequence(out))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                // Unlike `serde_yaml::Value::Mapping`'s own impl, this
                // pushes every entry `MapAccess` hands us instead of
                // folding into a deduplicating map, so repeated keys in
                // the source document survive into `pairs`.
                let mut pairs = Vec::new();
                while let Some((k, v)) = map.next_entry::<String, ParsedYaml>()? {
                    pairs.push((k, v));
                }
                Ok(ParsedYaml::Mapping(pairs))
            }
        }

        deserializer.deserialize_any(ParsedYamlVisitor)
    }
}

fn json_to_parsed(value: serde_json::Value) -> ParsedYaml {
    match value {
        serde_json::Value::Null => ParsedYaml::Null,
        serde_json::Value::Bool(b) => ParsedYaml::Bool(b),
        serde_json::Value::Number(n) => ParsedYaml::String(n.to_string()),
        serde_json::Value::String(s) => ParsedYaml::String(s),
        serde_json::Value::Array(seq) => {
            ParsedYaml::Sequence(seq.into_iter().map(json_to_parsed).collect())
        }
        // `serde_json::Value::Object` is already deduplicated by the
        // time we see it, but well-formed JSON has no duplicate-key
        // ambiguity in the first place, so nothing is lost converting
        // it into the same shape `merge_workspaces` expects from YAML.
        serde_json::Value::Object(map) => {
            ParsedYaml::Mapping(map.into_iter().map(|(k, v)| (k, json_to_parsed(v))).collect())
        }
    }
}

/// Fold a raw, not-yet-deduplicated top-level document into the final
/// workspace -> repo-name -> repo-value manifest shape. This is the one
/// place the loader's left-precedent policy is applied: repeated
/// workspace labels are merged (their repos unioned), and repeated
/// repository names within that union keep the first definition and
/// warn on the rest.
fn merge_workspaces(root: Vec<(String, ParsedYaml)>, path: &Path) -> RawManifest {
    let mut manifest: RawManifest = IndexMap::new();
    for (label, value) in root {
        let ParsedYaml::Mapping(repos) = value else {
            log::warn!(
                "{}: workspace {label:?} is not a mapping, skipping",
                path.display()
            );
            continue;
        };
        let entry = manifest.entry(label).or_default();
        for (name, repo) in repos {
            merge_repo_entry(entry, name, from_parsed(repo));
        }
    }
    manifest
}

fn merge_repo_entry(workspace: &mut RawWorkspace, name: String, repo: RawValue) {
    if workspace.contains_key(&name) {
        log::warn!("duplicate repository entry {name:?}, keeping the first definition");
        return;
    }
    workspace.insert(name, repo);
}

/// Recursively fold a leaf value (a single repository's own definition,
/// or anything nested under it) into the normaliser-facing [`RawValue`]
/// shape. Duplicate keys below the repository level use ordinary
/// first-wins-with-warning semantics; there is no merge-children policy
/// at this depth, unlike at the workspace/repository levels above.
fn from_parsed(value: ParsedYaml) -> RawValue {
    match value {
        ParsedYaml::Null => RawValue::Null,
        ParsedYaml::Bool(b) => RawValue::Bool(b),
        ParsedYaml::String(s) => RawValue::String(s),
        ParsedYaml::Sequence(seq) => RawValue::Sequence(seq.into_iter().map(from_parsed).collect()),
        ParsedYaml::Mapping(pairs) => {
            let mut out: IndexMap<String, RawValue> = IndexMap::new();
            for (key, v) in pairs {
                if out.contains_key(&key) {
                    log::warn!("duplicate key {key:?} in manifest, keeping the first definition");
                    continue;
                }
                out.insert(key, from_parsed(v));
            }
            RawValue::Mapping(out)
        }
    }
}

/// Candidate discovery paths, in priority order, for when no explicit
/// `--config` is given.
pub fn discover_config_files(home: &Path, include_legacy: bool) -> Result<Vec<PathBuf>, ConfigError> {
    let mut top_level_candidates = Vec::new();
    for name in [".vcspull.yaml", ".vcspull.json"] {
        let candidate = home.join(name);
        if candidate.is_file() {
            top_level_candidates.push(candidate);
        }
    }
    if top_level_candidates.len() > 1 {
        return Err(ConfigError::MultipleConfig {
            dir: home.to_path_buf(),
            candidates: top_level_candidates,
        });
    }

    let mut found = top_level_candidates;

    let xdg_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home.join(".config"))
        .join("vcspull");
    found.extend(glob_manifest_files(&xdg_dir));

    if include_legacy {
        found.extend(glob_manifest_files(&home.join(".vcspull")));
    }

    Ok(found)
}

fn glob_manifest_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml") | Some("json")
            )
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn merges_duplicate_workspace_keys_within_one_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "m.yaml",
            r#"
"~/code/":
  flask: "git+https://example.test/flask.git"
"~/code/":
  django: "git+https://example.test/django.git"
"#,
        );
        let manifest = load_file(&path).unwrap();
        let repos = &manifest["~/code/"];
        assert!(repos.contains_key("flask"));
        assert!(repos.contains_key("django"));
    }

    #[test]
    fn left_precedent_on_duplicate_repo_name() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "m.yaml",
            r#"
"~/code/":
  flask: "git+https://example.test/first.git"
  flask: "git+https://example.test/second.git"
"#,
        );
        let manifest = load_file(&path).unwrap();
        let repos = &manifest["~/code/"];
        assert_eq!(
            repos["flask"].as_str(),
            Some("git+https://example.test/first.git")
        );
    }

    #[test]
    fn json_round_trips_the_same_shape() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "m.json",
            r#"{"~/code/": {"flask": "git+https://example.test/flask.git"}}"#,
        );
        let manifest = load_file(&path).unwrap();
        assert_eq!(
            manifest["~/code/"]["flask"].as_str(),
            Some("git+https://example.test/flask.git")
        );
    }

    #[test]
    fn unsupported_extension_is_a_format_error() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "m.toml", "x = 1");
        assert!(matches!(load_file(&path), Err(ConfigError::Format { .. })));
    }

    #[test]
    fn non_mapping_root_is_a_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "m.yaml", "- a\n- b\n");
        assert!(matches!(load_file(&path), Err(ConfigError::Schema { .. })));
    }

    #[test]
    fn discovery_rejects_two_top_level_manifests() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".vcspull.yaml", "{}");
        write(dir.path(), ".vcspull.json", "{}");
        assert!(matches!(
            discover_config_files(dir.path(), false),
            Err(ConfigError::MultipleConfig { .. })
        ));
    }
}
