//! Read/modify/write access to a project's composer.json.
//!
//! The document is held as an ordered JSON tree so that saving it back
//! keeps the author's key order. Saving always rewrites the whole file;
//! changes made on disk between `load` and `save` are overwritten.

use crate::error::{Result, SsdevError};
use crate::paths;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// The pseudo-package composer uses for the PHP runtime.
pub const PHP_PACKAGE: &str = "php";

/// Which dependency list a package lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Section {
    #[serde(rename = "require")]
    Require,
    #[serde(rename = "require-dev")]
    RequireDev,
}

impl Section {
    pub fn key(&self) -> &'static str {
        match self {
            Section::Require => "require",
            Section::RequireDev => "require-dev",
        }
    }
}

/// A `repositories` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ComposerJson {
    path: PathBuf,
    doc: Value,
}

impl ComposerJson {
    /// Load `composer.json` from the project directory `root`.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_file(&paths::composer_json_path(root))
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SsdevError::ComposerJsonNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::parse(path, &data)
    }

    /// Build from already-read content; `path` is where `save` will write.
    pub fn parse(path: &Path, data: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(data)?;
        if !doc.is_object() {
            return Err(SsdevError::ManifestParse {
                target: path.display().to_string(),
                reason: "top level is not an object".to_string(),
            });
        }
        Ok(ComposerJson {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        let data = self.to_pretty_string()?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }

    /// Serialize the way composer itself writes the file: four-space
    /// indentation, unescaped slashes, trailing newline.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.doc.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    // -----------------------------------------------------------------------
    // Dotted-key access
    // -----------------------------------------------------------------------

    /// Look up a dotted key such as `config.platform.php`.
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        let keys: Vec<&str> = dotted.split('.').collect();
        self.get_path(&keys)
    }

    /// Set a dotted key, creating intermediate objects as needed.
    pub fn set(&mut self, dotted: &str, value: Value) {
        let keys: Vec<&str> = dotted.split('.').collect();
        self.set_path(&keys, value);
    }

    fn get_path(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().try_fold(&self.doc, |node, key| node.get(*key))
    }

    fn set_path(&mut self, keys: &[&str], value: Value) {
        let Some((last, parents)) = keys.split_last() else {
            return;
        };
        let mut node = &mut self.doc;
        for key in parents {
            node = object_mut(node)
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        object_mut(node).insert(last.to_string(), value);
    }

    // -----------------------------------------------------------------------
    // Dependencies
    // -----------------------------------------------------------------------

    /// Which section currently declares `package`. `require-dev` wins if a
    /// malformed file declares it in both.
    pub fn section_of(&self, package: &str) -> Option<Section> {
        [Section::RequireDev, Section::Require]
            .into_iter()
            .find(|s| self.get_path(&[s.key(), package]).is_some())
    }

    /// The constraint stored for `package` in `section`, with any
    /// `<branch> as ` prefix removed so only the alias remains.
    ///
    /// For `php` a `config.platform.php` override takes precedence.
    pub fn constraint_in(&self, package: &str, section: Section) -> Option<String> {
        if let Some(platform) = self.platform_php(package) {
            return Some(platform);
        }
        self.get_path(&[section.key(), package])
            .and_then(Value::as_str)
            .map(strip_branch_alias)
    }

    /// The constraint for `package` from whichever section declares it.
    pub fn constraint(&self, package: &str) -> Option<String> {
        if let Some(platform) = self.platform_php(package) {
            return Some(platform);
        }
        let section = self.section_of(package)?;
        self.constraint_in(package, section)
    }

    /// The stored value as written, alias prefix included.
    pub fn raw_constraint(&self, package: &str) -> Option<&str> {
        let section = self.section_of(package)?;
        self.get_path(&[section.key(), package]).and_then(Value::as_str)
    }

    pub fn set_constraint(&mut self, section: Section, package: &str, constraint: &str) {
        self.set_path(&[section.key(), package], Value::String(constraint.to_string()));
    }

    fn platform_php(&self, package: &str) -> Option<String> {
        if package != PHP_PACKAGE {
            return None;
        }
        self.get_path(&["config", "platform", PHP_PACKAGE])
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    // -----------------------------------------------------------------------
    // Repositories
    // -----------------------------------------------------------------------

    pub fn repository(&self, name: &str) -> Option<Repository> {
        let entry = self.get_path(&["repositories", name])?;
        Some(Repository {
            kind: entry.get("type")?.as_str()?.to_string(),
            url: entry.get("url")?.as_str()?.to_string(),
        })
    }

    /// Add or replace the `vcs` repository registered under `name`.
    pub fn set_repository(&mut self, name: &str, url: &str) {
        self.normalize_repositories();
        let entry = serde_json::json!({ "type": "vcs", "url": url });
        self.set_path(&["repositories", name], entry);
    }

    /// Composer also accepts `repositories` as a list. Named entries need the
    /// object form, so a list is converted, keyed by position.
    fn normalize_repositories(&mut self) {
        let Some(Value::Array(list)) = self.get_path(&["repositories"]) else {
            return;
        };
        let map: Map<String, Value> = list
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect();
        self.set_path(&["repositories"], Value::Object(map));
    }
}

/// Replace a non-object node with an empty object so it can hold children.
fn object_mut(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// `dev-feature as 5.x-dev` -> `5.x-dev`; anything else unchanged.
pub fn strip_branch_alias(constraint: &str) -> String {
    match constraint.split_once(" as ") {
        Some((_, alias)) => alias.trim().to_string(),
        None => constraint.to_string(),
    }
}
