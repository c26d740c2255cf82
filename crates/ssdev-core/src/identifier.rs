//! Parsing of free-form GitHub references.
//!
//! Accepted shapes, each optionally prefixed with `https://github.com/`,
//! `https://www.github.com/`, `github.com/` or `git@github.com:`:
//!
//! - `org/repo`
//! - `org/repo/pull/123` or `org/repo#123`
//! - `org/repo/tree/some-branch`

use crate::error::{Result, SsdevError};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

static REFERENCE_RE: OnceLock<Regex> = OnceLock::new();

fn reference_re() -> &'static Regex {
    REFERENCE_RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?:(?:https?://)?(?:www\.)?github\.com/|git@github\.com:)?",
            r"(?P<org>[A-Za-z0-9_.-]*)/(?P<repo>[A-Za-z0-9_.-]*?)(?:\.git)?",
            r"(?:(?:/pull/|#)(?P<pr>[0-9]+)(?:[/#?].*)?|/tree/(?P<branch>.+?))?/?$",
        ))
        .unwrap()
    })
}

/// What part of a repository a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RefTarget {
    Repository,
    PullRequest(u64),
    Branch(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub org: String,
    pub repo: String,
    pub target: RefTarget,
}

impl Identifier {
    pub fn parse(raw: &str) -> Result<Self> {
        let input = raw.trim();
        let caps = reference_re().captures(input).ok_or_else(|| {
            SsdevError::invalid_reference(raw, "expected org/repo, a pull request or a branch URL")
        })?;

        let org = caps.name("org").map_or("", |m| m.as_str());
        let repo = caps.name("repo").map_or("", |m| m.as_str());
        if org.is_empty() {
            return Err(SsdevError::invalid_reference(raw, "missing organisation"));
        }
        if repo.is_empty() {
            return Err(SsdevError::invalid_reference(raw, "missing repository name"));
        }

        let target = if let Some(pr) = caps.name("pr") {
            let number = pr
                .as_str()
                .parse::<u64>()
                .map_err(|_| SsdevError::invalid_reference(raw, "pull request number out of range"))?;
            RefTarget::PullRequest(number)
        } else if let Some(branch) = caps.name("branch") {
            RefTarget::Branch(branch.as_str().to_string())
        } else {
            RefTarget::Repository
        };

        Ok(Identifier {
            org: org.to_string(),
            repo: repo.to_string(),
            target,
        })
    }

    pub fn pr(&self) -> Option<u64> {
        match self.target {
            RefTarget::PullRequest(n) => Some(n),
            _ => None,
        }
    }

    pub fn branch(&self) -> Option<&str> {
        match &self.target {
            RefTarget::Branch(b) => Some(b),
            _ => None,
        }
    }

    /// `org/repo`, the fallback display name when the canonical package
    /// name is unknown.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }

    pub fn ssh_url(&self) -> String {
        format!("git@github.com:{}/{}.git", self.org, self.repo)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            RefTarget::Repository => write!(f, "{}/{}", self.org, self.repo),
            RefTarget::PullRequest(n) => write!(f, "{}/{}#{}", self.org, self.repo, n),
            RefTarget::Branch(b) => write!(f, "{}/{}/tree/{}", self.org, self.repo, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIXES: [&str; 5] = [
        "",
        "https://github.com/",
        "https://www.github.com/",
        "github.com/",
        "git@github.com:",
    ];

    #[test]
    fn plain_repository_round_trips() {
        for prefix in PREFIXES {
            let raw = format!("{prefix}silverstripe/silverstripe-framework");
            let id = Identifier::parse(&raw).unwrap_or_else(|e| panic!("{raw}: {e}"));
            assert_eq!(id.org, "silverstripe");
            assert_eq!(id.repo, "silverstripe-framework");
            assert_eq!(id.target, RefTarget::Repository, "{raw}");
        }
    }

    #[test]
    fn pull_request_round_trips() {
        for prefix in PREFIXES {
            for suffix in ["/pull/123", "#123"] {
                let raw = format!("{prefix}creative-commoners/silverstripe-admin{suffix}");
                let id = Identifier::parse(&raw).unwrap_or_else(|e| panic!("{raw}: {e}"));
                assert_eq!(id.org, "creative-commoners");
                assert_eq!(id.repo, "silverstripe-admin");
                assert_eq!(id.pr(), Some(123), "{raw}");
                assert_eq!(id.branch(), None);
            }
        }
    }

    #[test]
    fn branch_round_trips() {
        for prefix in PREFIXES {
            let raw = format!("{prefix}silverstripe/recipe-cms/tree/pulls/5/new-thing");
            let id = Identifier::parse(&raw).unwrap_or_else(|e| panic!("{raw}: {e}"));
            assert_eq!(id.repo, "recipe-cms");
            assert_eq!(id.branch(), Some("pulls/5/new-thing"), "{raw}");
            assert_eq!(id.pr(), None);
        }
    }

    #[test]
    fn display_reparses_to_same_identifier() {
        for raw in ["a.b/c_d", "org/repo#7", "org/repo/tree/5.1"] {
            let id = Identifier::parse(raw).unwrap();
            assert_eq!(Identifier::parse(&id.to_string()).unwrap(), id);
        }
    }

    #[test]
    fn git_suffix_and_pr_subpath_are_tolerated() {
        let id = Identifier::parse("git@github.com:org/repo.git").unwrap();
        assert_eq!(id.repo, "repo");

        let id = Identifier::parse("https://github.com/org/repo/pull/42/files").unwrap();
        assert_eq!(id.pr(), Some(42));

        let id = Identifier::parse("https://github.com/org/repo/pull/5#issuecomment-1").unwrap();
        assert_eq!(id.pr(), Some(5));
        let id = Identifier::parse("https://github.com/org/repo/pull/5?w=1").unwrap();
        assert_eq!(id.pr(), Some(5));
    }

    #[test]
    fn malformed_references_fail() {
        for raw in [
            "",
            "org",
            "org/",
            "/repo",
            "https://github.com/org/",
            "org/repo/pull/abc",
            "org/repo#",
            "org/re po",
            "https://gitlab.com/org/repo",
        ] {
            let err = Identifier::parse(raw).unwrap_err();
            assert!(
                matches!(err, SsdevError::InvalidReference { .. }),
                "expected InvalidReference for {raw:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn urls_use_ssh_form() {
        let id = Identifier::parse("org/repo#1").unwrap();
        assert_eq!(id.slug(), "org/repo");
        assert_eq!(id.ssh_url(), "git@github.com:org/repo.git");
    }
}
