use crate::output::{print_json, step, sub_step, success, warning};
use anyhow::Context;
use serde::Serialize;
use ssdev_core::{fork::ForkDescriptor, git::Git, paths};
use std::path::Path;

#[derive(Serialize)]
struct CheckoutResult<'a> {
    package: &'a str,
    branch: Option<&'a str>,
    error: Option<String>,
}

pub fn run(root: &Path, refs: &[String], json: bool) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let mut resolver = super::resolver(&config)?;
    let forks = resolver
        .fork_details(refs, false)
        .context("failed to resolve pull request details")?;

    if !json {
        step("Checking out pull requests");
    }
    let mut results = Vec::new();
    for f in &forks {
        let outcome = checkout_one(root, f);
        match &outcome {
            Ok(()) if !json => sub_step(&format!(
                "{} is on {}",
                f.composer_name,
                f.target_branch().unwrap_or_default()
            )),
            Err(e) if !json => warning(&format!("could not check out {}: {e:#}", f.composer_name)),
            _ => {}
        }
        results.push(CheckoutResult {
            package: &f.composer_name,
            branch: f.target_branch(),
            error: outcome.err().map(|e| format!("{e:#}")),
        });
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if json {
        print_json(&results)?;
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} pull request(s) could not be checked out", results.len());
    }
    if !json {
        success(&format!("Checked out {} pull request(s)", results.len()));
    }
    Ok(())
}

fn checkout_one(root: &Path, fork: &ForkDescriptor) -> anyhow::Result<()> {
    let dir = paths::vendor_package_dir(root, &fork.composer_name);
    if !dir.is_dir() {
        anyhow::bail!("{} does not exist; run composer install first", dir.display());
    }
    let branch = fork
        .target_branch()
        .context("pull request has no head branch")?;
    let git = Git::new(&dir)?;
    git.checkout_fork(fork.remote_name.as_str(), &fork.remote_url, branch)?;
    Ok(())
}
