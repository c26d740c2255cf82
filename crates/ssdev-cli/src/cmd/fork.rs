use crate::output::{print_json, step, sub_step, success};
use anyhow::Context;
use ssdev_core::{composer::ComposerJson, fork};
use std::path::Path;

pub fn run(root: &Path, refs: &[String], json: bool) -> anyhow::Result<()> {
    if refs.is_empty() {
        anyhow::bail!("at least one repository or pull request reference is required");
    }
    let mut composer = ComposerJson::load(root).context("failed to load composer.json")?;

    let config = super::load_config()?;
    let mut resolver = super::resolver(&config)?;

    if !json {
        step("Resolving references");
    }
    let forks = resolver
        .fork_details(refs, true)
        .context("failed to resolve fork details")?;

    if !json {
        step("Adding forks to composer.json");
        for f in &forks {
            sub_step(&format!("{} from {}", f.composer_name, f.remote_url));
        }
    }
    fork::add_forks(&mut composer, &forks);
    let written = fork::add_forked_deps(&mut composer, &forks);
    composer.save().context("failed to save composer.json")?;

    if json {
        print_json(&serde_json::json!({
            "forks": forks,
            "constraints_written": written,
        }))?;
    } else {
        for f in &forks {
            if let Some(constraint) = composer.raw_constraint(&f.composer_name) {
                sub_step(&format!("{}: {constraint}", f.composer_name));
            }
        }
        success(&format!(
            "Updated {} with {} fork(s). Run composer update to install them.",
            composer.path().display(),
            forks.len()
        ));
    }
    Ok(())
}
