//! Glob-based repository selection, shared by the sync command, the CLI's
//! argument parsing, and shell completion.

use globset::Glob;

use crate::manifest::Repository;

/// A term the operator typed, classified into which field it filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Path(String),
    Url(String),
    Name(String),
}

/// Classify an unqualified repo-term the way `vcspull sync <term>` does:
/// a leading path marker selects by path, a leading VCS-scheme-like
/// prefix selects by URL, otherwise the term selects by name.
pub fn classify(term: &str) -> Term {
    const PATH_PREFIXES: &[&str] = &["./", "/", "~", "$HOME"];
    const URL_PREFIXES: &[&str] = &["http", "git", "svn", "hg"];

    if PATH_PREFIXES.iter().any(|p| term.starts_with(p)) {
        Term::Path(term.to_string())
    } else if URL_PREFIXES.iter().any(|p| term.starts_with(p)) {
        Term::Url(term.to_string())
    } else {
        Term::Name(term.to_string())
    }
}

/// The three independent predicates the Filter Engine accepts. All
/// supplied predicates must match (`AND`); an absent predicate matches
/// everything.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub path: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
}

impl FilterSpec {
    /// Build a spec from a list of raw repo-term strings, classifying
    /// each and merging same-kind terms so that e.g. two name globs
    /// both apply.
    pub fn from_terms(terms: &[String]) -> Vec<FilterSpec> {
        terms
            .iter()
            .map(|t| match classify(t) {
                Term::Path(p) => FilterSpec {
                    path: Some(p),
                    ..Default::default()
                },
                Term::Url(u) => FilterSpec {
                    url: Some(u),
                    ..Default::default()
                },
                Term::Name(n) => FilterSpec {
                    name: Some(n),
                    ..Default::default()
                },
            })
            .collect()
    }

    fn matches(&self, repo: &Repository) -> bool {
        if let Some(pattern) = &self.path
            && !glob_matches(pattern, &repo.path.display().to_string())
        {
            return false;
        }
        if let Some(pattern) = &self.url
            && !glob_matches(pattern, &repo.url)
        {
            return false;
        }
        if let Some(pattern) = &self.name
            && !glob_matches(pattern, &repo.name)
        {
            return false;
        }
        true
    }
}

fn glob_matches(pattern: &str, candidate: &str) -> bool {
    Glob::new(pattern)
        .map(|g| g.compile_matcher().is_match(candidate))
        .unwrap_or(false)
}

/// Select the repositories matching ANY of the given specs (the CLI
/// passes one spec per positional repo-term and a repository should
/// sync if it matches at least one term), preserving manifest order. An
/// empty spec list selects everything.
pub fn filter_repos<'a>(repos: &'a [Repository], specs: &[FilterSpec]) -> Vec<&'a Repository> {
    if specs.is_empty() {
        return repos.iter().collect();
    }
    repos
        .iter()
        .filter(|repo| specs.iter().any(|spec| spec.matches(repo)))
        .collect()
}
