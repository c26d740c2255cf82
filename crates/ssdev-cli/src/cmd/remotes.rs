use crate::output::{print_json, step, success};
use anyhow::Context;
use ssdev_core::{
    git::Git,
    remote::{rewrite_origin, RemoteName},
};
use std::path::Path;

const ORIGIN: &str = "origin";
const RENAMED_ORIGIN: &str = "orig";

pub fn run(
    root: &Path,
    rename_origin: bool,
    security: bool,
    fetch: bool,
    json: bool,
) -> anyhow::Result<()> {
    let git = Git::new(root)?;
    let origin = git
        .remote_url(ORIGIN)
        .context("failed to read the origin remote")?;

    let remote = if security {
        RemoteName::Security
    } else {
        RemoteName::Cc
    };
    let account = remote
        .account()
        .context("remote has no fixed GitHub account")?;
    let url = rewrite_origin(&origin, account)?;

    if !json {
        step(&format!("Adding remote '{remote}' -> {url}"));
    }
    git.add_remote(remote.as_str(), &url)
        .with_context(|| format!("failed to add remote '{remote}'"))?;

    if rename_origin {
        if !json {
            step(&format!("Renaming '{ORIGIN}' to '{RENAMED_ORIGIN}'"));
        }
        git.rename_remote(ORIGIN, RENAMED_ORIGIN)
            .context("failed to rename origin")?;
    }

    if fetch {
        if !json {
            step("Fetching all remotes");
        }
        git.fetch_all().context("failed to fetch remotes")?;
    }

    if json {
        print_json(&serde_json::json!({
            "remote": remote,
            "url": url,
            "origin_renamed": rename_origin,
            "fetched": fetch,
        }))?;
    } else {
        success("Remotes added");
    }
    Ok(())
}
