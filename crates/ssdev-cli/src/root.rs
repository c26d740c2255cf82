use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `SSDEV_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `composer.json`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, |dir| dir.join("composer.json").is_file())
        .or_else(|| find_upward(&cwd, |dir| dir.join(".git").exists()))
        .unwrap_or(cwd)
}

fn find_upward(start: &Path, found: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    start.ancestors().find(|dir| found(*dir)).map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_nearest_composer_json() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("composer.json"), "{}").unwrap();
        let deep = dir.path().join("app/src/Model");
        std::fs::create_dir_all(&deep).unwrap();

        let found = find_upward(&deep, |d| d.join("composer.json").is_file());
        assert_eq!(found.as_deref(), Some(dir.path()));
    }

    #[test]
    fn nothing_found_is_none() {
        let dir = TempDir::new().unwrap();
        let found = find_upward(dir.path(), |d| d.join("no-such-marker-file").exists());
        assert!(found.is_none());
    }
}
