//! Working out which PHP version a project should run on.

use crate::composer::{ComposerJson, PHP_PACKAGE};
use crate::constraint::Constraint;
use crate::error::Result;
use crate::identifier::{Identifier, RefTarget};
use crate::paths;
use crate::resolver::Resolver;
use crate::version::BRANCH_WILDCARD;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Core packages whose own PHP requirement stands in for the project's when
/// the project does not declare one, most specific first.
pub const FALLBACK_DEPENDENCIES: [&str; 5] = [
    "silverstripe/recipe-cms",
    "silverstripe/recipe-core",
    "silverstripe/framework",
    "silverstripe/cms",
    "silverstripe/admin",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhpVersionSource {
    Platform,
    Composer,
    Dependency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhpVersion {
    /// `major.minor`, e.g. `8.1`.
    pub version: String,
    pub source: PhpVersionSource,
    /// The dependency consulted, for `PhpVersionSource::Dependency`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency: Option<String>,
}

/// Find the PHP version for the project at `root`.
///
/// `.platform.yml` wins, then the lowest version the project's own `php`
/// constraint allows, then the PHP requirement of the first core dependency
/// found.
pub fn detect(root: &Path, composer: &ComposerJson, resolver: &Resolver) -> Result<Option<PhpVersion>> {
    if let Some(version) = from_platform(root)? {
        return Ok(Some(PhpVersion {
            version,
            source: PhpVersionSource::Platform,
            dependency: None,
        }));
    }
    if let Some(version) = composer
        .constraint(PHP_PACKAGE)
        .and_then(|c| lowest_minor(&c))
    {
        return Ok(Some(PhpVersion {
            version,
            source: PhpVersionSource::Composer,
            dependency: None,
        }));
    }
    for dependency in FALLBACK_DEPENDENCIES {
        let Some(branch) = composer.constraint(dependency).and_then(|c| lowest_minor(&c)) else {
            continue;
        };
        let id = package_identifier(dependency);
        let manifest = match resolver.fetch_manifest(&id, Some(&branch)) {
            Ok(m) => m,
            Err(e) => {
                warn!(%dependency, %branch, "could not read dependency manifest: {e}");
                continue;
            }
        };
        let Some(version) = manifest
            .require
            .get(PHP_PACKAGE)
            .and_then(|c| lowest_minor(c))
        else {
            debug!(%dependency, %branch, "dependency declares no php requirement");
            continue;
        };
        return Ok(Some(PhpVersion {
            version,
            source: PhpVersionSource::Dependency,
            dependency: Some(dependency.to_string()),
        }));
    }
    Ok(None)
}

/// `php_settings.version` from `.platform.yml`, when it is numeric.
pub fn from_platform(root: &Path) -> Result<Option<String>> {
    let path = paths::platform_yml_path(root);
    if !path.is_file() {
        debug!("no {} to check", paths::PLATFORM_YML);
        return Ok(None);
    }
    let data = std::fs::read_to_string(&path)?;
    let doc: serde_yaml::Value = serde_yaml::from_str(&data)?;
    let version = match doc.get("php_settings").and_then(|s| s.get("version")) {
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::String(s)) if s.trim().parse::<f64>().is_ok() => {
            Some(s.trim().to_string())
        }
        _ => None,
    };
    if version.is_none() {
        warn!(
            "invalid or missing php_settings.version in {}, checking composer.json instead",
            paths::PLATFORM_YML
        );
    }
    Ok(version)
}

/// `major.minor` of the lowest version `constraint` admits, which doubles
/// as the name of the branch that version is developed on.
pub fn lowest_minor(constraint: &str) -> Option<String> {
    let parsed = match Constraint::parse(constraint) {
        Ok(c) => c,
        Err(e) => {
            debug!("{e}");
            return None;
        }
    };
    let lower = parsed.lower_bound();
    let version = lower.version()?;
    if version.numbers == [0; 4] {
        return None;
    }
    // `5.x-dev` has no minor of its own.
    if version.minor() == BRANCH_WILDCARD {
        return Some(version.major().to_string());
    }
    Some(format!("{}.{}", version.major(), version.minor()))
}

/// GitHub repository for a core package: `silverstripe/framework` lives in
/// `silverstripe/silverstripe-framework`, recipes keep their name.
pub fn package_identifier(package: &str) -> Identifier {
    let (org, name) = package.split_once('/').unwrap_or(("silverstripe", package));
    let repo = if name.starts_with("recipe-") || name.starts_with("silverstripe-") {
        name.to_string()
    } else {
        format!("silverstripe-{name}")
    };
    Identifier {
        org: org.to_string(),
        repo,
        target: RefTarget::Repository,
    }
}
