use crate::error::{Result, SsdevError};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File and directory constants
// ---------------------------------------------------------------------------

pub const COMPOSER_JSON: &str = "composer.json";
pub const VENDOR_DIR: &str = "vendor";
pub const PLATFORM_YML: &str = ".platform.yml";

pub const CONFIG_DIR: &str = ".ssdev";
pub const CONFIG_FILE: &str = "config.yaml";

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "SSDEV_CONFIG";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn composer_json_path(root: &Path) -> PathBuf {
    root.join(COMPOSER_JSON)
}

pub fn platform_yml_path(root: &Path) -> PathBuf {
    root.join(PLATFORM_YML)
}

/// Where composer installs `package` (e.g. `vendor/silverstripe/framework`).
pub fn vendor_package_dir(root: &Path, package: &str) -> PathBuf {
    let mut dir = root.join(VENDOR_DIR);
    for part in package.split('/') {
        dir.push(part);
    }
    dir
}

/// Directory name used when cloning `repo`: the `silverstripe-` prefix
/// carried by most module repositories is dropped.
pub fn clone_dir_name(repo: &str) -> &str {
    repo.strip_prefix("silverstripe-").unwrap_or(repo)
}

/// Resolve the user config file: `$SSDEV_CONFIG` if set, otherwise
/// `~/.ssdev/config.yaml`.
pub fn config_path() -> Result<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(explicit));
    }
    let home = home::home_dir().ok_or(SsdevError::HomeNotFound)?;
    Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            composer_json_path(root),
            PathBuf::from("/tmp/proj/composer.json")
        );
        assert_eq!(
            vendor_package_dir(root, "silverstripe/framework"),
            PathBuf::from("/tmp/proj/vendor/silverstripe/framework")
        );
    }

    #[test]
    fn clone_dir_drops_module_prefix() {
        assert_eq!(clone_dir_name("silverstripe-framework"), "framework");
        assert_eq!(clone_dir_name("recipe-cms"), "recipe-cms");
    }
}
