//! Thin wrapper over the `git` binary.

use crate::error::{Result, SsdevError};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Locate the git binary, or return `GitNotInstalled`.
pub fn git_bin() -> Result<PathBuf> {
    which::which("git").map_err(|_| SsdevError::GitNotInstalled)
}

/// A git binary bound to a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    bin: PathBuf,
    dir: PathBuf,
}

impl Git {
    pub fn new(dir: &Path) -> Result<Self> {
        Ok(Git {
            bin: git_bin()?,
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `git <args>` in the working directory and return trimmed stdout.
    pub fn run(&self, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        debug!(dir = %self.dir.display(), %command, "running git");
        let output = Command::new(&self.bin)
            .args(args)
            .current_dir(&self.dir)
            .output()
            .map_err(|e| SsdevError::GitFailed {
                command: command.clone(),
                stderr: e.to_string(),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SsdevError::GitFailed {
                command,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Clone `url` into `dir_name` under the working directory and return a
    /// `Git` for the new checkout.
    pub fn clone_into(&self, url: &str, dir_name: &str) -> Result<Git> {
        self.run(&["clone", url, dir_name])?;
        Ok(Git {
            bin: self.bin.clone(),
            dir: self.dir.join(dir_name),
        })
    }

    pub fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.run(&["remote", "add", name, url]).map(drop)
    }

    pub fn rename_remote(&self, from: &str, to: &str) -> Result<()> {
        self.run(&["remote", "rename", from, to]).map(drop)
    }

    pub fn remote_url(&self, name: &str) -> Result<String> {
        self.run(&["remote", "get-url", name])
    }

    pub fn has_remote(&self, name: &str) -> Result<bool> {
        let remotes = self.run(&["remote"])?;
        Ok(remotes.lines().any(|r| r.trim() == name))
    }

    pub fn fetch(&self, remote: &str) -> Result<()> {
        self.run(&["fetch", remote]).map(drop)
    }

    pub fn fetch_all(&self) -> Result<()> {
        self.run(&["fetch", "--all"]).map(drop)
    }

    /// Switch to a local branch tracking `<remote>/<branch>`.
    pub fn track_remote_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let upstream = format!("{remote}/{branch}");
        self.run(&["switch", "--track", "--no-guess", &upstream])
            .map(drop)
    }

    /// Add the remote for a fork if missing, fetch it and check out the
    /// branch. Used for both fresh clones and vendor checkouts.
    pub fn checkout_fork(&self, remote: &str, url: &str, branch: &str) -> Result<()> {
        if !self.has_remote(remote)? {
            self.add_remote(remote, url)?;
        }
        self.fetch(remote)?;
        self.track_remote_branch(remote, branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_available() -> bool {
        git_bin().is_ok()
    }

    fn init_repo(dir: &Path) -> Git {
        let git = Git::new(dir).unwrap();
        git.run(&["init", "-q"]).unwrap();
        git.run(&["config", "user.email", "dev@example.com"]).unwrap();
        git.run(&["config", "user.name", "Dev"]).unwrap();
        git
    }

    #[test]
    fn remotes_round_trip() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let git = init_repo(dir.path());
        git.add_remote("origin", "git@github.com:silverstripe/silverstripe-admin.git")
            .unwrap();
        assert!(git.has_remote("origin").unwrap());
        git.rename_remote("origin", "orig").unwrap();
        assert!(!git.has_remote("origin").unwrap());
        assert_eq!(
            git.remote_url("orig").unwrap(),
            "git@github.com:silverstripe/silverstripe-admin.git"
        );
    }

    #[test]
    fn failure_carries_stderr() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let git = init_repo(dir.path());
        let err = git.remote_url("missing").unwrap_err();
        match err {
            SsdevError::GitFailed { command, stderr } => {
                assert_eq!(command, "remote get-url missing");
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn checkout_fork_tracks_remote_branch() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();

        // An upstream repository with a feature branch stands in for the fork.
        let upstream_dir = dir.path().join("upstream");
        std::fs::create_dir(&upstream_dir).unwrap();
        let upstream = init_repo(&upstream_dir);
        std::fs::write(upstream_dir.join("README.md"), "hello\n").unwrap();
        upstream.run(&["add", "README.md"]).unwrap();
        upstream.run(&["commit", "-q", "-m", "initial"]).unwrap();
        upstream.run(&["branch", "feature-x"]).unwrap();

        let workspace = Git::new(dir.path()).unwrap();
        let local = workspace
            .clone_into(upstream_dir.to_str().unwrap(), "local")
            .unwrap();
        assert_eq!(local.dir(), dir.path().join("local"));

        local
            .checkout_fork("cc", upstream_dir.to_str().unwrap(), "feature-x")
            .unwrap();
        assert_eq!(local.run(&["rev-parse", "--abbrev-ref", "HEAD"]).unwrap(), "feature-x");
        assert_eq!(
            local
                .run(&["rev-parse", "--abbrev-ref", "feature-x@{upstream}"])
                .unwrap(),
            "cc/feature-x"
        );
    }
}
