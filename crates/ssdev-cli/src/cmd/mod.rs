pub mod checkout;
pub mod clone;
pub mod fork;
pub mod php_version;
pub mod prepare_input;
pub mod remotes;

use anyhow::Context;
use ssdev_core::{config::Config, github::GitHubClient, resolver::Resolver};

/// Build the per-command resolver from the user config.
pub fn resolver(config: &Config) -> anyhow::Result<Resolver> {
    let client = GitHubClient::from_config(config).context("failed to set up GitHub client")?;
    Ok(Resolver::new(client))
}

pub fn load_config() -> anyhow::Result<Config> {
    Config::load().context("failed to load config")
}
