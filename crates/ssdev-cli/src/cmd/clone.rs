use crate::output::{print_json, step, sub_step, success};
use anyhow::Context;
use ssdev_core::{git::Git, paths};
use std::path::Path;

pub fn run(reference: &str, dir: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let parent = match dir.or(config.clone_dir.as_deref()) {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    if !parent.is_dir() {
        anyhow::bail!("clone directory {} does not exist", parent.display());
    }

    let mut resolver = super::resolver(&config)?;
    let details = resolver
        .repository_details(reference)
        .with_context(|| format!("failed to resolve '{reference}'"))?;

    let dir_name = paths::clone_dir_name(&details.repo);
    if !json {
        step(&format!("Cloning {} into {}", details.output_name, parent.join(dir_name).display()));
    }
    let workspace = Git::new(&parent)?;
    let checkout = workspace
        .clone_into(&details.clone_url, dir_name)
        .with_context(|| format!("failed to clone {}", details.clone_url))?;

    if let Some(pr) = &details.pr {
        if !json {
            sub_step(&format!(
                "Checking out {} from remote '{}'",
                pr.pr_branch, pr.remote_name
            ));
        }
        checkout
            .checkout_fork(pr.remote_name.as_str(), &pr.remote_url, &pr.pr_branch)
            .with_context(|| format!("failed to check out pull request branch {}", pr.pr_branch))?;
    }

    if json {
        print_json(&serde_json::json!({
            "repository": details,
            "path": checkout.dir(),
        }))?;
    } else {
        success(&format!("Cloned {} to {}", details.output_name, checkout.dir().display()));
    }
    Ok(())
}
