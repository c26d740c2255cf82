//! Turning GitHub references into package names, PR details and fork
//! descriptors.
//!
//! A `Resolver` is built once per command. It owns the HTTP client and a
//! cache of remote manifests keyed by the reference string exactly as the
//! user typed it, so asking twice never costs a second request.

use crate::error::{Result, SsdevError};
use crate::fork::{ForkDescriptor, ForkSet};
use crate::github::GitHubClient;
use crate::identifier::Identifier;
use crate::paths::COMPOSER_JSON;
use crate::remote::RemoteName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

fn default_package_type() -> String {
    "library".to_string()
}

/// The parts of a remote composer.json the tools care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteManifest {
    pub name: String,
    /// composer's `type`, `library` when absent.
    pub package_type: String,
    pub require: BTreeMap<String, String>,
}

/// Where a pull request comes from and goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrDetails {
    pub from_org: String,
    pub remote_url: String,
    pub remote_name: RemoteName,
    pub pr_branch: String,
    pub base_branch: String,
}

/// What `ssdev clone` needs to know about a reference.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryDetails {
    pub output_name: String,
    pub clone_url: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr: Option<PrDetails>,
}

/// Only the fields `RemoteManifest` needs are kept; `name` is checked
/// separately so a nameless manifest gets its own error.
#[derive(Deserialize)]
struct RawManifest {
    name: Option<String>,
    #[serde(rename = "type")]
    package_type: Option<String>,
    #[serde(default)]
    require: serde_json::Value,
}

/// String-valued entries of `require`. PHP writes an empty map as `[]`, and
/// anything else that is not an object is treated as empty too.
fn require_map(value: serde_json::Value) -> BTreeMap<String, String> {
    let serde_json::Value::Object(entries) = value else {
        return BTreeMap::new();
    };
    entries
        .into_iter()
        .filter_map(|(package, constraint)| match constraint {
            serde_json::Value::String(c) => Some((package, c)),
            _ => None,
        })
        .collect()
}

pub struct Resolver {
    client: GitHubClient,
    manifests: HashMap<String, RemoteManifest>,
}

impl Resolver {
    pub fn new(client: GitHubClient) -> Self {
        Resolver {
            client,
            manifests: HashMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Manifests
    // -----------------------------------------------------------------------

    /// Fetch and parse the composer.json behind `id`, cached under `raw`.
    pub fn resolve_manifest(
        &mut self,
        raw: &str,
        id: &Identifier,
        branch: Option<&str>,
    ) -> Result<RemoteManifest> {
        if let Some(cached) = self.manifests.get(raw) {
            debug!(reference = raw, "manifest cache hit");
            return Ok(cached.clone());
        }
        let manifest = self.fetch_manifest(id, branch)?;
        self.manifests.insert(raw.to_string(), manifest.clone());
        Ok(manifest)
    }

    /// Fetch without touching the cache.
    pub fn fetch_manifest(&self, id: &Identifier, branch: Option<&str>) -> Result<RemoteManifest> {
        let bytes = self
            .client
            .file_contents(&id.org, &id.repo, COMPOSER_JSON, branch)?;
        let target = match branch {
            Some(b) => format!("{}@{b}", id.slug()),
            None => id.slug(),
        };
        let raw: RawManifest =
            serde_json::from_slice(&bytes).map_err(|e| SsdevError::ManifestParse {
                target: target.clone(),
                reason: e.to_string(),
            })?;
        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(SsdevError::MissingName(target))?;
        Ok(RemoteManifest {
            name,
            package_type: raw.package_type.unwrap_or_else(default_package_type),
            require: require_map(raw.require),
        })
    }

    /// The package name if it can be resolved, otherwise `org/repo`.
    pub fn display_name(&mut self, raw: &str, id: &Identifier, branch: Option<&str>) -> String {
        match self.resolve_manifest(raw, id, branch) {
            Ok(manifest) => manifest.name,
            Err(e) => {
                warn!(reference = raw, "could not resolve package name: {e}");
                id.slug()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Pull requests
    // -----------------------------------------------------------------------

    pub fn resolve_pr(&self, id: &Identifier, number: u64) -> Result<PrDetails> {
        let pr = self.client.pull_request(&id.org, &id.repo, number)?;
        let head_repo = pr.head.repo.ok_or_else(|| SsdevError::RemoteFetch {
            target: format!("{}#{number}", id.slug()),
            reason: "the repository this pull request came from no longer exists".to_string(),
        })?;
        let remote_name = RemoteName::classify(&head_repo.ssh_url);
        debug!(pr = number, remote = %remote_name, "resolved pull request");
        Ok(PrDetails {
            from_org: pr.head.user.login,
            remote_url: head_repo.ssh_url,
            remote_name,
            pr_branch: pr.head.git_ref,
            base_branch: pr.base.git_ref,
        })
    }

    // -----------------------------------------------------------------------
    // Batches
    // -----------------------------------------------------------------------

    /// Resolve every reference into a fork descriptor. Plain repository and
    /// branch references are accepted only with `allow_non_pr`.
    pub fn fork_details<S: AsRef<str>>(&mut self, refs: &[S], allow_non_pr: bool) -> Result<ForkSet> {
        let mut forks = ForkSet::new();
        for raw in refs {
            let raw = raw.as_ref();
            let id = Identifier::parse(raw)?;
            let fork = match id.pr() {
                Some(number) => self.pr_fork(raw, &id, number)?,
                None if allow_non_pr => self.branch_fork(raw, &id)?,
                None => {
                    return Err(SsdevError::invalid_reference(
                        raw,
                        "expected a pull request reference",
                    ))
                }
            };
            forks.insert(fork)?;
        }
        Ok(forks)
    }

    fn pr_fork(&mut self, raw: &str, id: &Identifier, number: u64) -> Result<ForkDescriptor> {
        let details = self.resolve_pr(id, number)?;
        // The PR branch only exists on the head repository, so the
        // manifest is read from the base repository's target branch.
        let manifest = self.resolve_manifest(raw, id, Some(&details.base_branch))?;
        Ok(ForkDescriptor {
            composer_name: manifest.name,
            org: id.org.clone(),
            repo: id.repo.clone(),
            pr: Some(number),
            branch: None,
            from_org: Some(details.from_org),
            remote_url: details.remote_url,
            remote_name: details.remote_name,
            pr_branch: Some(details.pr_branch),
            base_branch: Some(details.base_branch),
            package_type: Some(manifest.package_type),
        })
    }

    fn branch_fork(&mut self, raw: &str, id: &Identifier) -> Result<ForkDescriptor> {
        let manifest = self.resolve_manifest(raw, id, id.branch())?;
        let remote_url = id.ssh_url();
        Ok(ForkDescriptor {
            composer_name: manifest.name,
            org: id.org.clone(),
            repo: id.repo.clone(),
            pr: None,
            branch: id.branch().map(str::to_string),
            from_org: None,
            remote_name: RemoteName::classify(&remote_url),
            remote_url,
            pr_branch: None,
            base_branch: None,
            package_type: Some(manifest.package_type),
        })
    }

    /// Everything needed to clone the repository a reference points at.
    pub fn repository_details(&mut self, raw: &str) -> Result<RepositoryDetails> {
        let id = Identifier::parse(raw)?;
        let pr = match id.pr() {
            Some(number) => Some(self.resolve_pr(&id, number)?),
            None => None,
        };
        let branch = pr
            .as_ref()
            .map(|p| p.base_branch.clone())
            .or_else(|| id.branch().map(str::to_string));
        let output_name = self.display_name(raw, &id, branch.as_deref());
        Ok(RepositoryDetails {
            output_name,
            clone_url: id.ssh_url(),
            repo: id.repo.clone(),
            pr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const ADMIN_MANIFEST: &str =
        r#"{"name": "silverstripe/admin", "type": "silverstripe-vendormodule", "require": {"php": "^8.1"}}"#;

    fn resolver(server: &Server) -> Resolver {
        Resolver::new(GitHubClient::new(&server.url(), None).unwrap())
    }

    fn pr_body(ssh_url: &str, head: &str, base: &str) -> String {
        serde_json::json!({
            "head": {
                "repo": {"ssh_url": ssh_url},
                "ref": head,
                "user": {"login": "someone"}
            },
            "base": {"ref": base}
        })
        .to_string()
    }

    #[test]
    fn manifest_is_cached_by_raw_reference() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/repos/silverstripe/silverstripe-admin/contents/composer.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(ADMIN_MANIFEST)
            .expect(1)
            .create();

        let mut resolver = resolver(&server);
        let raw = "silverstripe/silverstripe-admin";
        let id = Identifier::parse(raw).unwrap();
        let first = resolver.resolve_manifest(raw, &id, None).unwrap();
        let second = resolver.resolve_manifest(raw, &id, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name, "silverstripe/admin");
        assert_eq!(first.package_type, "silverstripe-vendormodule");
        assert_eq!(first.require.get("php").map(String::as_str), Some("^8.1"));
        mock.assert();
    }

    #[test]
    fn empty_require_list_is_accepted() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/repos/org/repo/contents/composer.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"name": "org/pkg", "require": [], "type": "library"}"#)
            .create();
        let manifest = resolver(&server)
            .fetch_manifest(&Identifier::parse("org/repo").unwrap(), None)
            .unwrap();
        assert_eq!(manifest.name, "org/pkg");
        assert!(manifest.require.is_empty());
    }

    #[test]
    fn non_string_require_entries_are_dropped() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/repos/org/repo/contents/composer.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"name": "org/pkg", "require": {"php": "^8.1", "odd/pkg": 3}}"#)
            .create();
        let manifest = resolver(&server)
            .fetch_manifest(&Identifier::parse("org/repo").unwrap(), None)
            .unwrap();
        assert_eq!(manifest.require.len(), 1);
        assert_eq!(manifest.require.get("php").map(String::as_str), Some("^8.1"));
    }

    #[test]
    fn missing_type_defaults_to_library() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/repos/org/repo/contents/composer.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"name": "org/pkg"}"#)
            .create();
        let resolver = resolver(&server);
        let manifest = resolver
            .fetch_manifest(&Identifier::parse("org/repo").unwrap(), None)
            .unwrap();
        assert_eq!(manifest.package_type, "library");
    }

    #[test]
    fn nameless_manifest_is_missing_name() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/repos/org/repo/contents/composer.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"type": "library"}"#)
            .create();
        let err = resolver(&server)
            .fetch_manifest(&Identifier::parse("org/repo").unwrap(), None)
            .unwrap_err();
        assert!(matches!(err, SsdevError::MissingName(_)), "{err:?}");
    }

    #[test]
    fn non_json_manifest_is_parse_error() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/repos/org/repo/contents/composer.json")
            .match_query(Matcher::Any)
            .with_body("<html>")
            .create();
        let err = resolver(&server)
            .fetch_manifest(&Identifier::parse("org/repo").unwrap(), None)
            .unwrap_err();
        assert!(matches!(err, SsdevError::ManifestParse { .. }), "{err:?}");
    }

    #[test]
    fn display_name_falls_back_to_slug() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/repos/org/repo/contents/composer.json")
            .match_query(Matcher::Any)
            .with_status(404)
            .create();
        let mut resolver = resolver(&server);
        let id = Identifier::parse("org/repo").unwrap();
        assert_eq!(resolver.display_name("org/repo", &id, None), "org/repo");
    }

    #[test]
    fn pr_remote_is_classified() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/repos/silverstripe/silverstripe-admin/pulls/7")
            .with_body(pr_body(
                "git@github.com:silverstripe-security/silverstripe-admin.git",
                "pulls/5/fix",
                "5.2",
            ))
            .create();
        let id = Identifier::parse("silverstripe/silverstripe-admin#7").unwrap();
        let details = resolver(&server).resolve_pr(&id, 7).unwrap();
        assert_eq!(details.remote_name, RemoteName::Security);
        assert_eq!(details.pr_branch, "pulls/5/fix");
        assert_eq!(details.base_branch, "5.2");
        assert_eq!(details.from_org, "someone");
    }

    #[test]
    fn deleted_head_repository_is_an_error() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/repos/org/repo/pulls/3")
            .with_body(r#"{"head": {"repo": null, "ref": "x", "user": {"login": "u"}}, "base": {"ref": "5"}}"#)
            .create();
        let id = Identifier::parse("org/repo#3").unwrap();
        let err = resolver(&server).resolve_pr(&id, 3).unwrap_err();
        assert!(matches!(err, SsdevError::RemoteFetch { .. }), "{err:?}");
    }

    #[test]
    fn fork_details_builds_pr_and_branch_descriptors() {
        let mut server = Server::new();
        let _pr = server
            .mock("GET", "/repos/silverstripe/silverstripe-admin/pulls/12")
            .with_body(pr_body(
                "git@github.com:creative-commoners/silverstripe-admin.git",
                "pulls/5/feature-x",
                "5",
            ))
            .create();
        let _admin = server
            .mock("GET", "/repos/silverstripe/silverstripe-admin/contents/composer.json")
            .match_query(Matcher::UrlEncoded("ref".into(), "5".into()))
            .with_body(ADMIN_MANIFEST)
            .create();
        let _framework = server
            .mock("GET", "/repos/someone/silverstripe-framework/contents/composer.json")
            .match_query(Matcher::UrlEncoded("ref".into(), "my-branch".into()))
            .with_body(r#"{"name": "silverstripe/framework"}"#)
            .create();

        let refs = [
            "https://github.com/silverstripe/silverstripe-admin/pull/12",
            "someone/silverstripe-framework/tree/my-branch",
        ];
        let forks = resolver(&server).fork_details(&refs, true).unwrap();
        assert_eq!(forks.len(), 2);

        let admin = forks.get("silverstripe/admin").unwrap();
        assert_eq!(admin.pr, Some(12));
        assert_eq!(admin.remote_name, RemoteName::Cc);
        assert_eq!(admin.pr_branch.as_deref(), Some("pulls/5/feature-x"));
        assert_eq!(admin.base_branch.as_deref(), Some("5"));

        let framework = forks.get("silverstripe/framework").unwrap();
        assert_eq!(framework.branch.as_deref(), Some("my-branch"));
        assert_eq!(framework.remote_url, "git@github.com:someone/silverstripe-framework.git");
        assert_eq!(framework.remote_name, RemoteName::Pr);
        assert_eq!(framework.package_type.as_deref(), Some("library"));
    }

    #[test]
    fn non_pr_reference_rejected_when_prs_required() {
        let server = Server::new();
        let err = resolver(&server)
            .fork_details(&["org/repo"], false)
            .unwrap_err();
        assert!(matches!(err, SsdevError::InvalidReference { .. }), "{err:?}");
    }

    #[test]
    fn duplicate_packages_fail() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/repos/[^/]+/repo/contents/composer.json".into()))
            .match_query(Matcher::Any)
            .with_body(r#"{"name": "org/pkg"}"#)
            .create();
        let err = resolver(&server)
            .fork_details(&["one/repo", "two/repo"], true)
            .unwrap_err();
        assert!(matches!(err, SsdevError::DuplicatePackage(name) if name == "org/pkg"));
    }

    #[test]
    fn repository_details_for_pr() {
        let mut server = Server::new();
        let _pr = server
            .mock("GET", "/repos/silverstripe/silverstripe-cms/pulls/4")
            .with_body(pr_body(
                "git@github.com:someone/silverstripe-cms.git",
                "fix-it",
                "5.1",
            ))
            .create();
        let _manifest = server
            .mock("GET", "/repos/silverstripe/silverstripe-cms/contents/composer.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"name": "silverstripe/cms"}"#)
            .create();

        let details = resolver(&server)
            .repository_details("silverstripe/silverstripe-cms#4")
            .unwrap();
        assert_eq!(details.output_name, "silverstripe/cms");
        assert_eq!(details.clone_url, "git@github.com:silverstripe/silverstripe-cms.git");
        assert_eq!(details.repo, "silverstripe-cms");
        let pr = details.pr.unwrap();
        assert_eq!(pr.remote_name, RemoteName::Pr);
        assert_eq!(pr.pr_branch, "fix-it");
    }
}
