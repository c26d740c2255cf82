use crate::error::{Result, SsdevError};
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Clone URL prefix for the creative-commoners organisation.
pub const CC_ACCOUNT: &str = "git@github.com:creative-commoners/";
/// Clone URL prefix for the private security organisation.
pub const SECURITY_ACCOUNT: &str = "git@github.com:silverstripe-security/";

/// Local git remote alias used for a fork or pull request source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteName {
    Cc,
    Security,
    Pr,
}

impl RemoteName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteName::Cc => "cc",
            RemoteName::Security => "security",
            RemoteName::Pr => "pr",
        }
    }

    /// Classify a clone URL by the organisation it belongs to. Anything that
    /// is not one of the two known organisations is an ordinary PR remote.
    pub fn classify(clone_url: &str) -> Self {
        if clone_url.starts_with(CC_ACCOUNT) {
            RemoteName::Cc
        } else if clone_url.starts_with(SECURITY_ACCOUNT) {
            RemoteName::Security
        } else {
            RemoteName::Pr
        }
    }

    /// Organisation prefix this remote is created from, if it has a fixed one.
    pub fn account(&self) -> Option<&'static str> {
        match self {
            RemoteName::Cc => Some(CC_ACCOUNT),
            RemoteName::Security => Some(SECURITY_ACCOUNT),
            RemoteName::Pr => None,
        }
    }
}

impl fmt::Display for RemoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static ORIGIN_RE: OnceLock<Regex> = OnceLock::new();

fn origin_re() -> &'static Regex {
    ORIGIN_RE.get_or_init(|| Regex::new(r"^(?:git@github\.com:|https://github\.com/)[^/]*/").unwrap())
}

/// Point an origin URL at the same repository under `account`.
///
/// `git@github.com:silverstripe/silverstripe-admin.git` with the
/// creative-commoners account becomes
/// `git@github.com:creative-commoners/silverstripe-admin.git`.
pub fn rewrite_origin(origin: &str, account: &str) -> Result<String> {
    let origin = origin.trim();
    let re = origin_re();
    if !re.is_match(origin) {
        return Err(SsdevError::InvalidOrigin(origin.to_string()));
    }
    Ok(re.replace(origin, NoExpand(account)).into_owned())
}
