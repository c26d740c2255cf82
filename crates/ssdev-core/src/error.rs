use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SsdevError {
    #[error("invalid reference '{input}': {reason}")]
    InvalidReference { input: String, reason: String },

    #[error("could not fetch {target}: {reason}")]
    RemoteFetch { target: String, reason: String },

    #[error("could not parse manifest for {target}: {reason}")]
    ManifestParse { target: String, reason: String },

    #[error("composer.json for {0} does not declare a package name")]
    MissingName(String),

    #[error("more than one reference resolves to package '{0}'")]
    DuplicatePackage(String),

    #[error("composer.json not found at {}", .0.display())]
    ComposerJsonNotFound(PathBuf),

    #[error("invalid version constraint '{0}'")]
    InvalidConstraint(String),

    #[error("origin {0} does not appear to be a GitHub remote")]
    InvalidOrigin(String),

    #[error("git is not installed or not on PATH")]
    GitNotInstalled,

    #[error("git {command} failed: {stderr}")]
    GitFailed { command: String, stderr: String },

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SsdevError {
    pub(crate) fn invalid_reference(input: &str, reason: impl Into<String>) -> Self {
        SsdevError::InvalidReference {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SsdevError>;
