//! Writing forked packages into composer.json.
//!
//! Each fork gets a `vcs` repository entry and a `<branch> as <alias>`
//! constraint, where the alias keeps the package satisfying whatever range
//! the rest of the dependency tree expects.

use crate::composer::{ComposerJson, Section};
use crate::constraint::Constraint;
use crate::error::{Result, SsdevError};
use crate::remote::RemoteName;
use crate::version::normalize_branch;
use serde::Serialize;
use tracing::{debug, warn};

/// Metapackage listing every supported module. Its versions say nothing
/// about the modules it lists, so forks of it always get a fixed alias
/// that sorts above any real release.
pub const SUPPORTED_MODULES_PACKAGE: &str = "silverstripe/supported-modules";
pub const SUPPORTED_MODULES_ALIAS: &str = "99.999.999";

/// Everything needed to point composer at one fork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForkDescriptor {
    pub composer_name: String,
    pub org: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_org: Option<String>,
    pub remote_url: String,
    pub remote_name: RemoteName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
}

impl ForkDescriptor {
    /// The branch the fork should be installed from.
    pub fn target_branch(&self) -> Option<&str> {
        self.pr_branch.as_deref().or(self.branch.as_deref())
    }
}

/// Fork descriptors keyed by composer name, in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ForkSet {
    forks: Vec<ForkDescriptor>,
}

impl ForkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Two references resolving to the same package is an
    /// error rather than a silent overwrite.
    pub fn insert(&mut self, fork: ForkDescriptor) -> Result<()> {
        if self.get(&fork.composer_name).is_some() {
            return Err(SsdevError::DuplicatePackage(fork.composer_name));
        }
        self.forks.push(fork);
        Ok(())
    }

    pub fn get(&self, composer_name: &str) -> Option<&ForkDescriptor> {
        self.forks.iter().find(|f| f.composer_name == composer_name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForkDescriptor> {
        self.forks.iter()
    }

    pub fn len(&self) -> usize {
        self.forks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forks.is_empty()
    }
}

impl<'a> IntoIterator for &'a ForkSet {
    type Item = &'a ForkDescriptor;
    type IntoIter = std::slice::Iter<'a, ForkDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.forks.iter()
    }
}

// ---------------------------------------------------------------------------
// Manifest updates
// ---------------------------------------------------------------------------

/// Register a `vcs` repository for every fork. Existing entries with the
/// same name are replaced.
pub fn add_forks(composer: &mut ComposerJson, forks: &ForkSet) {
    for fork in forks {
        debug!(package = %fork.composer_name, url = %fork.remote_url, "adding repository");
        composer.set_repository(&fork.composer_name, &fork.remote_url);
    }
}

/// Write a `<branch> as <alias>` constraint for every fork that has a
/// branch to install. Returns how many constraints were written.
pub fn add_forked_deps(composer: &mut ComposerJson, forks: &ForkSet) -> usize {
    let mut written = 0;
    for fork in forks {
        let Some(branch) = fork.target_branch() else {
            debug!(package = %fork.composer_name, "no branch to install, leaving constraint alone");
            continue;
        };
        let section = composer
            .section_of(&fork.composer_name)
            .unwrap_or(Section::Require);
        let branch = normalize_branch(branch);
        let constraint = match alias_for(composer, fork, section, &branch) {
            Some(alias) => format!("{branch} as {alias}"),
            None => branch,
        };
        debug!(package = %fork.composer_name, section = section.key(), %constraint, "setting constraint");
        composer.set_constraint(section, &fork.composer_name, &constraint);
        written += 1;
    }
    written
}

/// The version the forked branch should pretend to be.
fn alias_for(
    composer: &ComposerJson,
    fork: &ForkDescriptor,
    section: Section,
    branch: &str,
) -> Option<String> {
    if fork.composer_name == SUPPORTED_MODULES_PACKAGE {
        return Some(SUPPORTED_MODULES_ALIAS.to_string());
    }
    let existing = composer
        .constraint_in(&fork.composer_name, section)
        .filter(|c| !c.is_empty() && c != branch);
    existing
        .and_then(|current| alias_from_constraint(&current))
        .or_else(|| fork.base_branch.as_deref().map(normalize_branch))
}

/// A range such as `^5.2` cannot follow `as`, so it is narrowed to the
/// branch alias just under its upper bound. Other constraints are usable
/// as they stand.
fn alias_from_constraint(current: &str) -> Option<String> {
    match Constraint::parse(current) {
        Ok(parsed) if parsed.kind().needs_point_alias() => parsed.upper_bound().alias_version(),
        Ok(_) => Some(current.to_string()),
        Err(e) => {
            warn!("keeping unrecognised constraint as alias: {e}");
            Some(current.to_string())
        }
    }
}
