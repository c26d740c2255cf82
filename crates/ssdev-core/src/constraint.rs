//! Composer version constraints reduced to the interval they describe.
//!
//! Constraints are parsed into a small tree of comparisons joined by AND
//! (whitespace or comma) and OR (`||`). Only the bounds of that tree are
//! exposed; matching individual versions is left to Composer itself.

use crate::error::{Result, SsdevError};
use crate::version::{normalize, ParsedVersion, Stability, Version};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// The syntactic family a constraint string belongs to, decided by its
/// leading operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `5.2.1`, `=5.2.1`, `5.x-dev`
    Exact,
    /// `dev-main`
    Branch,
    /// `^5.2`
    Caret,
    /// `~5.2`
    Tilde,
    /// `5.*`, `5.2.x`
    Wildcard,
    /// `!=4.0`
    Not,
    /// `>=5.0 <6.0`, `1.0 - 2.0`
    Comparison,
    /// `*`
    Any,
}

impl ConstraintKind {
    /// Range kinds that cannot stand in for a single version in a
    /// `branch as version` alias.
    pub fn needs_point_alias(self) -> bool {
        matches!(self, ConstraintKind::Caret | ConstraintKind::Not)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Any,
    Branch(String),
    Cmp(Op, Version),
    And(Vec<Node>),
    Or(Vec<Node>),
}

/// One end of the interval a constraint admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    Unbounded,
    Inclusive(Version),
    Exclusive(Version),
}

impl Bound {
    pub fn version(&self) -> Option<&Version> {
        match self {
            Bound::Unbounded => None,
            Bound::Inclusive(v) | Bound::Exclusive(v) => Some(v),
        }
    }

    /// The single version to present as when this is an upper bound.
    ///
    /// An exclusive bound such as `6.0.0.0-dev` (from `^5.2`) means "anything
    /// below 6", so the highest development branch under it is used:
    /// `5.x-dev`. An inclusive bound is used as-is.
    pub fn alias_version(&self) -> Option<String> {
        match self {
            Bound::Unbounded => None,
            Bound::Inclusive(v) => Some(v.pretty()),
            Bound::Exclusive(v) => {
                let last = v.numbers.iter().rposition(|n| *n > 0)?;
                let mut parts: Vec<String> =
                    v.numbers[..last].iter().map(u64::to_string).collect();
                parts.push((v.numbers[last] - 1).to_string());
                Some(format!("{}.x-dev", parts.join(".")))
            }
        }
    }
}

/// A parsed composer constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    kind: ConstraintKind,
    root: Node,
}

static WILDCARD_RE: OnceLock<Regex> = OnceLock::new();
static HYPHEN_RE: OnceLock<Regex> = OnceLock::new();
static PARTS_RE: OnceLock<Regex> = OnceLock::new();

fn wildcard_re() -> &'static Regex {
    WILDCARD_RE.get_or_init(|| {
        Regex::new(r"(?i)^v?(\d+)(?:\.(\d+|[x*]))?(?:\.(\d+|[x*]))?(?:\.[x*])?$").unwrap()
    })
}

fn hyphen_re() -> &'static Regex {
    HYPHEN_RE.get_or_init(|| Regex::new(r"^(\S+)\s+-\s+(\S+)$").unwrap())
}

fn parts_re() -> &'static Regex {
    PARTS_RE.get_or_init(|| Regex::new(r"(?i)^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.(\d+))?").unwrap())
}

impl Constraint {
    pub fn parse(raw: &str) -> Result<Self> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(SsdevError::InvalidConstraint(raw.to_string()));
        }
        // An inline alias constrains on its left side only.
        let input = input
            .split_once(" as ")
            .map_or(input, |(left, _)| left.trim());

        let root = parse_or(input).map_err(|_| SsdevError::InvalidConstraint(raw.to_string()))?;
        Ok(Constraint {
            kind: classify(input),
            root,
        })
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn lower_bound(&self) -> Bound {
        lower(&self.root)
    }

    pub fn upper_bound(&self) -> Bound {
        upper(&self.root)
    }
}

fn classify(input: &str) -> ConstraintKind {
    let first = input.split(['|', ',', ' ']).next().unwrap_or(input);
    if first == "*" || first.eq_ignore_ascii_case("x") {
        ConstraintKind::Any
    } else if first.starts_with('^') {
        ConstraintKind::Caret
    } else if first.starts_with('~') {
        ConstraintKind::Tilde
    } else if first.starts_with('!') || first.starts_with("<>") {
        ConstraintKind::Not
    } else if first.starts_with(['<', '>']) || hyphen_re().is_match(input) {
        ConstraintKind::Comparison
    } else if first.to_ascii_lowercase().starts_with("dev-") {
        ConstraintKind::Branch
    } else if wildcard_re().is_match(first) && first.contains(['x', 'X', '*']) {
        ConstraintKind::Wildcard
    } else {
        ConstraintKind::Exact
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

type ParseResult = std::result::Result<Node, ()>;

fn parse_or(input: &str) -> ParseResult {
    let alternatives: Vec<&str> = input
        .split("||")
        .flat_map(|part| part.split('|'))
        .map(str::trim)
        .collect();
    if alternatives.iter().any(|a| a.is_empty()) {
        return Err(());
    }
    let mut nodes = alternatives
        .into_iter()
        .map(parse_and)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        Node::Or(nodes)
    })
}

fn parse_and(input: &str) -> ParseResult {
    if let Some(caps) = hyphen_re().captures(input) {
        return parse_hyphen(&caps[1], &caps[2]);
    }
    let terms: Vec<&str> = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    // `>= 5.0` is one term written with a space.
    let mut merged: Vec<String> = Vec::new();
    let mut pending: Option<&str> = None;
    for term in terms {
        if let Some(op) = pending.take() {
            merged.push(format!("{op}{term}"));
        } else if term.trim_end_matches(['<', '>', '=', '!', '^', '~']).is_empty() {
            pending = Some(term);
        } else {
            merged.push(term.to_string());
        }
    }
    if pending.is_some() || merged.is_empty() {
        return Err(());
    }
    let mut nodes = merged
        .iter()
        .map(|t| parse_single(t))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        Node::And(nodes)
    })
}

fn parse_single(term: &str) -> ParseResult {
    // Stability flags only affect which releases Composer will consider.
    let term = match term.find('@') {
        Some(0) => return Ok(Node::Any),
        Some(idx) => &term[..idx],
        None => term,
    };

    if term == "*" || term.eq_ignore_ascii_case("x") {
        return Ok(Node::Any);
    }
    if let Some(rest) = term.strip_prefix('^') {
        return parse_caret(rest);
    }
    if let Some(rest) = term.strip_prefix('~') {
        return parse_tilde(rest);
    }
    if !term.to_ascii_lowercase().ends_with("-dev") {
        if let Some(node) = parse_wildcard(term) {
            return Ok(node);
        }
    }

    let (op, version) = split_operator(term);
    match normalize(version).map_err(|_| ())? {
        ParsedVersion::Branch(name) => match op {
            Op::Eq => Ok(Node::Branch(name)),
            // Composer gives any other comparison with a branch the full range.
            _ => Ok(Node::Any),
        },
        ParsedVersion::Numeric(v) => {
            // A bare `<5.0` should exclude 5.0 pre-releases too.
            let v = if matches!(op, Op::Lt | Op::Ge) && v.stability == Stability::Stable {
                Version::dev(v.numbers)
            } else {
                v
            };
            Ok(Node::Cmp(op, v))
        }
    }
}

fn split_operator(term: &str) -> (Op, &str) {
    for (prefix, op) in [
        (">=", Op::Ge),
        ("<=", Op::Le),
        ("!=", Op::Ne),
        ("<>", Op::Ne),
        ("==", Op::Eq),
        (">", Op::Gt),
        ("<", Op::Lt),
        ("=", Op::Eq),
    ] {
        if let Some(rest) = term.strip_prefix(prefix) {
            return (op, rest);
        }
    }
    (Op::Eq, term)
}

/// Numeric components of a partial version plus how many were written.
fn parts(input: &str) -> Option<([u64; 4], usize)> {
    let caps = parts_re().captures(input)?;
    let mut numbers = [0u64; 4];
    let mut given = 0;
    for (i, slot) in numbers.iter_mut().enumerate() {
        if let Some(m) = caps.get(i + 1) {
            *slot = m.as_str().parse().ok()?;
            given = i + 1;
        }
    }
    Some((numbers, given))
}

/// Bump the component at `position` and zero everything after it.
fn bump(numbers: [u64; 4], position: usize) -> Option<[u64; 4]> {
    let mut out = numbers;
    out[position] = out[position].checked_add(1)?;
    for slot in out.iter_mut().skip(position + 1) {
        *slot = 0;
    }
    Some(out)
}

fn low_version(rest: &str, numbers: [u64; 4]) -> std::result::Result<Version, ()> {
    match normalize(rest).map_err(|_| ())? {
        ParsedVersion::Numeric(v) if v.stability != Stability::Stable => Ok(v),
        _ => Ok(Version::dev(numbers)),
    }
}

fn parse_caret(rest: &str) -> ParseResult {
    let (numbers, given) = parts(rest).ok_or(())?;
    // The first non-zero component among those written decides the range;
    // if all are zero the last written one does.
    let position = numbers[..given]
        .iter()
        .position(|n| *n > 0)
        .unwrap_or(given.saturating_sub(1));
    let low = low_version(rest, numbers)?;
    let high = Version::dev(bump(numbers, position).ok_or(())?);
    Ok(Node::And(vec![Node::Cmp(Op::Ge, low), Node::Cmp(Op::Lt, high)]))
}

fn parse_tilde(rest: &str) -> ParseResult {
    let (numbers, given) = parts(rest).ok_or(())?;
    let position = given.saturating_sub(2);
    let low = low_version(rest, numbers)?;
    let high = Version::dev(bump(numbers, position).ok_or(())?);
    Ok(Node::And(vec![Node::Cmp(Op::Ge, low), Node::Cmp(Op::Lt, high)]))
}

fn parse_wildcard(term: &str) -> Option<Node> {
    let caps = wildcard_re().captures(term)?;
    if !term.contains(['x', 'X', '*']) {
        return None;
    }
    let mut numbers = [0u64; 4];
    let mut given = 0;
    for (i, slot) in numbers.iter_mut().enumerate().take(3) {
        let Some(m) = caps.get(i + 1) else { break };
        let Ok(n) = m.as_str().parse() else { break };
        *slot = n;
        given = i + 1;
    }
    if given == 0 {
        return None;
    }
    let low = Version::dev(numbers);
    let high = Version::dev(bump(numbers, given - 1)?);
    Some(Node::And(vec![Node::Cmp(Op::Ge, low), Node::Cmp(Op::Lt, high)]))
}

fn parse_hyphen(from: &str, to: &str) -> ParseResult {
    let (low_numbers, _) = parts(from).ok_or(())?;
    let low = low_version(from, low_numbers)?;
    let (high_numbers, given) = parts(to).ok_or(())?;
    // A partial upper version means "up to the end of that series".
    let high = if given >= 3 {
        match normalize(to).map_err(|_| ())? {
            ParsedVersion::Numeric(v) => Node::Cmp(Op::Le, v),
            ParsedVersion::Branch(_) => return Err(()),
        }
    } else {
        Node::Cmp(Op::Lt, Version::dev(bump(high_numbers, given - 1).ok_or(())?))
    };
    Ok(Node::And(vec![Node::Cmp(Op::Ge, low), high]))
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

fn lower(node: &Node) -> Bound {
    match node {
        Node::Any | Node::Branch(_) => Bound::Inclusive(Version::ZERO_DEV),
        Node::Cmp(op, v) => match op {
            Op::Eq | Op::Ge => Bound::Inclusive(v.clone()),
            Op::Gt => Bound::Exclusive(v.clone()),
            Op::Ne | Op::Lt | Op::Le => Bound::Inclusive(Version::ZERO_DEV),
        },
        Node::And(nodes) => nodes
            .iter()
            .map(lower)
            .reduce(|a, b| if cmp_lower(&a, &b) == Ordering::Less { b } else { a })
            .unwrap_or(Bound::Inclusive(Version::ZERO_DEV)),
        Node::Or(nodes) => nodes
            .iter()
            .map(lower)
            .reduce(|a, b| if cmp_lower(&b, &a) == Ordering::Less { b } else { a })
            .unwrap_or(Bound::Inclusive(Version::ZERO_DEV)),
    }
}

fn upper(node: &Node) -> Bound {
    match node {
        Node::Any | Node::Branch(_) => Bound::Unbounded,
        Node::Cmp(op, v) => match op {
            Op::Eq | Op::Le => Bound::Inclusive(v.clone()),
            Op::Lt => Bound::Exclusive(v.clone()),
            Op::Ne | Op::Gt | Op::Ge => Bound::Unbounded,
        },
        Node::And(nodes) => nodes
            .iter()
            .map(upper)
            .reduce(|a, b| if cmp_upper(&b, &a) == Ordering::Less { b } else { a })
            .unwrap_or(Bound::Unbounded),
        Node::Or(nodes) => nodes
            .iter()
            .map(upper)
            .reduce(|a, b| if cmp_upper(&a, &b) == Ordering::Less { b } else { a })
            .unwrap_or(Bound::Unbounded),
    }
}

/// Order lower bounds by how much they admit: a smaller bound admits more.
fn cmp_lower(a: &Bound, b: &Bound) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Less,
        (_, Bound::Unbounded) => Ordering::Greater,
        _ => {
            let (va, vb) = (a.version(), b.version());
            va.cmp(&vb).then_with(|| match (a, b) {
                (Bound::Inclusive(_), Bound::Exclusive(_)) => Ordering::Less,
                (Bound::Exclusive(_), Bound::Inclusive(_)) => Ordering::Greater,
                _ => Ordering::Equal,
            })
        }
    }
}

/// Order upper bounds: a greater bound admits more.
fn cmp_upper(a: &Bound, b: &Bound) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Greater,
        (_, Bound::Unbounded) => Ordering::Less,
        _ => {
            let (va, vb) = (a.version(), b.version());
            va.cmp(&vb).then_with(|| match (a, b) {
                (Bound::Exclusive(_), Bound::Inclusive(_)) => Ordering::Less,
                (Bound::Inclusive(_), Bound::Exclusive(_)) => Ordering::Greater,
                _ => Ordering::Equal,
            })
        }
    }
}
