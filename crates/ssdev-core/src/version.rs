//! Composer-style version normalization.
//!
//! Composer compares versions in a four-component normalized form
//! (`5.2.0.0`, `5.9999999.9999999.9999999-dev`) and treats `dev-<name>`
//! as an opaque branch version. Only the subset of Composer's version
//! parser needed to read constraints and write branch aliases is covered.

use crate::error::{Result, SsdevError};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Component value Composer uses for `x` in `5.x-dev`.
pub const BRANCH_WILDCARD: u64 = 9_999_999;

/// Pre-release stability, ordered from least to most stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stability {
    Dev,
    Alpha,
    Beta,
    Rc,
    Stable,
    Patch,
}

impl Stability {
    fn from_modifier(modifier: &str) -> Option<Self> {
        match modifier.to_ascii_lowercase().as_str() {
            "dev" => Some(Stability::Dev),
            "alpha" | "a" => Some(Stability::Alpha),
            "beta" | "b" => Some(Stability::Beta),
            "rc" => Some(Stability::Rc),
            "stable" => Some(Stability::Stable),
            "patch" | "pl" | "p" => Some(Stability::Patch),
            _ => None,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Stability::Dev => "dev",
            Stability::Alpha => "alpha",
            Stability::Beta => "beta",
            Stability::Rc => "RC",
            Stability::Stable => "",
            Stability::Patch => "patch",
        }
    }
}

/// A normalized numeric version: four components plus stability.
///
/// Ordering follows Composer: numbers first, then stability
/// (`-dev` < `-alpha` < `-beta` < `-RC` < stable < `-patch`), then the
/// stability's own number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub numbers: [u64; 4],
    pub stability: Stability,
    pub stability_number: Option<u64>,
}

impl Version {
    pub const ZERO_DEV: Version = Version {
        numbers: [0, 0, 0, 0],
        stability: Stability::Dev,
        stability_number: None,
    };

    pub fn dev(numbers: [u64; 4]) -> Self {
        Version {
            numbers,
            stability: Stability::Dev,
            stability_number: None,
        }
    }

    pub fn major(&self) -> u64 {
        self.numbers[0]
    }

    pub fn minor(&self) -> u64 {
        self.numbers[1]
    }

    /// True for the `M.x-dev` family: a dev version whose trailing
    /// components are the branch wildcard.
    pub fn is_branch_alias(&self) -> bool {
        self.stability == Stability::Dev && self.numbers.contains(&BRANCH_WILDCARD)
    }

    /// Human form as written in composer.json: `5.x-dev`, `5.2.1`,
    /// `6.0.0-beta1`.
    pub fn pretty(&self) -> String {
        if self.is_branch_alias() {
            let head: Vec<String> = self
                .numbers
                .iter()
                .take_while(|n| **n != BRANCH_WILDCARD)
                .map(u64::to_string)
                .collect();
            return format!("{}.x-dev", head.join("."));
        }
        let shown = if self.numbers[3] == 0 { 3 } else { 4 };
        let mut out = self.numbers[..shown]
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        if self.stability != Stability::Stable {
            out.push('-');
            out.push_str(self.stability.suffix());
            if let Some(n) = self.stability_number {
                out.push_str(&n.to_string());
            }
        }
        out
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers
            .cmp(&other.numbers)
            .then(self.stability.cmp(&other.stability))
            .then(
                self.stability_number
                    .unwrap_or(0)
                    .cmp(&other.stability_number.unwrap_or(0)),
            )
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nums = self
            .numbers
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{nums}")?;
        if self.stability != Stability::Stable {
            write!(f, "-{}", self.stability.suffix())?;
            if let Some(n) = self.stability_number {
                write!(f, "{n}")?;
            }
        }
        Ok(())
    }
}

/// A version as it can appear on either side of a constraint operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedVersion {
    Numeric(Version),
    /// `dev-<name>` branch, stored without the prefix.
    Branch(String),
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

static CLASSICAL_RE: OnceLock<Regex> = OnceLock::new();
static BRANCH_RE: OnceLock<Regex> = OnceLock::new();

fn classical_re() -> &'static Regex {
    CLASSICAL_RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)^v?(\d{1,9})(?:\.(\d+))?(?:\.(\d+))?(?:\.(\d+))?",
            r"(?:[._-]?(stable|beta|b|rc|alpha|a|patch|pl|p)(?:[.-]?(\d+))?)?",
            r"([.-]?dev)?$",
        ))
        .unwrap()
    })
}

fn branch_re() -> &'static Regex {
    BRANCH_RE.get_or_init(|| {
        Regex::new(r"(?i)^v?(\d+)(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?$").unwrap()
    })
}

/// Normalize a single version string the way Composer's version parser
/// does for the forms used in composer.json.
pub fn normalize(raw: &str) -> Result<ParsedVersion> {
    let mut version = raw.trim();

    // Inline alias (`dev-x as 1.0.x-dev`): the left side is the real version.
    if let Some((left, _)) = version.split_once(" as ") {
        version = left.trim();
    }
    // Stability flag (`@dev`) and commit reference (`#abc123`) do not change
    // the version itself.
    if let Some(idx) = version.find(['@', '#']) {
        if idx > 0 {
            version = &version[..idx];
        }
    }
    if version.is_empty() {
        return Err(SsdevError::InvalidConstraint(raw.to_string()));
    }

    let lower = version.to_ascii_lowercase();
    if matches!(lower.as_str(), "master" | "trunk" | "default") {
        return Ok(ParsedVersion::Branch(version.to_string()));
    }
    if lower.starts_with("dev-") {
        return Ok(ParsedVersion::Branch(version[4..].to_string()));
    }

    if let Some(caps) = classical_re().captures(version) {
        let mut numbers = [0u64; 4];
        for (i, slot) in numbers.iter_mut().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                *slot = m
                    .as_str()
                    .parse()
                    .map_err(|_| SsdevError::InvalidConstraint(raw.to_string()))?;
            }
        }
        let mut stability = caps
            .get(5)
            .and_then(|m| Stability::from_modifier(m.as_str()))
            .unwrap_or(Stability::Stable);
        let stability_number = caps.get(6).and_then(|m| m.as_str().parse().ok());
        if caps.get(7).is_some() {
            stability = Stability::Dev;
        }
        return Ok(ParsedVersion::Numeric(Version {
            numbers,
            stability,
            stability_number,
        }));
    }

    // `5.x-dev`, `5.1.x-dev`
    if let Some(head) = lower.strip_suffix("-dev").or_else(|| lower.strip_suffix(".dev")) {
        if let Some(numbers) = branch_numbers(head) {
            return Ok(ParsedVersion::Numeric(Version::dev(numbers)));
        }
    }

    Err(SsdevError::InvalidConstraint(raw.to_string()))
}

/// Parse a numeric branch name (`5`, `5.1`, `5.x`) into its padded
/// components, with wildcards and missing parts set to [`BRANCH_WILDCARD`].
fn branch_numbers(name: &str) -> Option<[u64; 4]> {
    let caps = branch_re().captures(name)?;
    let mut numbers = [BRANCH_WILDCARD; 4];
    for (i, slot) in numbers.iter_mut().enumerate() {
        let Some(m) = caps.get(i + 1) else { continue };
        let part = m.as_str().trim_start_matches('.');
        if part.eq_ignore_ascii_case("x") || part == "*" {
            continue;
        }
        *slot = part.parse().ok()?;
    }
    Some(numbers)
}

/// Canonical composer.json form of a git branch name.
///
/// Numeric branches become `M.x-dev` / `M.m.x-dev`; everything else gets
/// the `dev-` prefix. Already-normalized names are returned unchanged.
pub fn normalize_branch(branch: &str) -> String {
    let branch = branch.trim();
    let lower = branch.to_ascii_lowercase();
    if lower.starts_with("dev-") {
        return branch.to_string();
    }
    if let Some(head) = lower.strip_suffix("-dev") {
        if branch_numbers(head).is_some() {
            return branch.to_string();
        }
    }
    if let Some(numbers) = branch_numbers(branch) {
        return Version::dev(numbers).pretty();
    }
    format!("dev-{branch}")
}
