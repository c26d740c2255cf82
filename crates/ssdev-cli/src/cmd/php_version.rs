use crate::output::print_json;
use anyhow::Context;
use ssdev_core::{composer::ComposerJson, php};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let composer = ComposerJson::load(root).context("failed to load composer.json")?;
    let config = super::load_config()?;
    let resolver = super::resolver(&config)?;

    let Some(found) = php::detect(root, &composer, &resolver)? else {
        anyhow::bail!(
            "could not work out a PHP version for this project; add a php constraint to composer.json"
        );
    };

    if json {
        print_json(&found)?;
    } else {
        println!("{}", found.version);
    }
    Ok(())
}
