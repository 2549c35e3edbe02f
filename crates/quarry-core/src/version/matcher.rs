//! Version selectors and latest-version selection

use std::cmp::Ordering;

/// Decides whether a candidate version satisfies a requested selector.
pub trait VersionMatcher: Send + Sync {
    /// Whether the selector can match more than one version, so resolution
    /// must list versions before fetching metadata.
    fn is_dynamic(&self, selector: &str) -> bool;

    fn accepts(&self, selector: &str, candidate: &str) -> bool;
}

/// Orders versions to pick the newest one.
pub trait LatestStrategy: Send + Sync {
    fn compare(&self, a: &str, b: &str) -> Ordering;

    fn find_latest(&self, versions: &[String]) -> Option<String> {
        versions
            .iter()
            .max_by(|a, b| self.compare(a, b))
            .cloned()
    }
}

/// Parsed form of a requested version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// `+` or `latest.<status>`; candidates carry no status here, so any
    /// version is accepted
    Latest,

    /// `1.+` matches every version starting with `1.`
    Prefix(String),

    /// Semantic version requirement (`^1.2`, `>=1.0, <2.0`) or an interval
    /// (`[1.0,2.0)`)
    Range(semver::VersionReq),

    /// Exact version
    Exact(String),
}

impl VersionConstraint {
    /// Parse a selector; anything unrecognised is an exact version.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        if input == "+" || input.starts_with("latest.") {
            return VersionConstraint::Latest;
        }

        if let Some(prefix) = input.strip_suffix('+') {
            return VersionConstraint::Prefix(prefix.to_string());
        }

        if let Some(req) = parse_interval(input) {
            return VersionConstraint::Range(req);
        }

        if input.starts_with(['^', '~', '>', '<', '=', '*'])
            && let Ok(req) = semver::VersionReq::parse(input)
        {
            return VersionConstraint::Range(req);
        }

        VersionConstraint::Exact(input.to_string())
    }

    pub fn is_dynamic(&self) -> bool {
        !matches!(self, VersionConstraint::Exact(_))
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        match self {
            VersionConstraint::Latest => true,
            VersionConstraint::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
            VersionConstraint::Range(req) => {
                parse_lenient(candidate).is_some_and(|version| req.matches(&version))
            }
            VersionConstraint::Exact(version) => version == candidate,
        }
    }
}

/// `[lower,upper]` with `(`/`)` for exclusive bounds; either bound may be empty.
fn parse_interval(input: &str) -> Option<semver::VersionReq> {
    let lower_op = match input.chars().next()? {
        '[' => ">=",
        '(' => ">",
        _ => return None,
    };
    let upper_op = match input.chars().last()? {
        ']' => "<=",
        ')' => "<",
        _ => return None,
    };
    let (lower, upper) = input[1..input.len() - 1].split_once(',')?;
    let (lower, upper) = (lower.trim(), upper.trim());

    let comparators: Vec<String> = [(lower_op, lower), (upper_op, upper)]
        .into_iter()
        .filter(|(_, bound)| !bound.is_empty())
        .map(|(op, bound)| format!("{op}{bound}"))
        .collect();
    if comparators.is_empty() {
        return Some(semver::VersionReq::STAR);
    }
    semver::VersionReq::parse(&comparators.join(", ")).ok()
}

/// Parse `1`, `1.2` or `1.2.3` style versions, padding missing components.
fn parse_lenient(version: &str) -> Option<semver::Version> {
    if let Ok(parsed) = semver::Version::parse(version) {
        return Some(parsed);
    }
    let mut parts: Vec<&str> = version.split('.').collect();
    let numeric = |part: &&str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
    if parts.len() > 3 || !parts.iter().all(numeric) {
        return None;
    }
    parts.resize(3, "0");
    semver::Version::parse(&parts.join(".")).ok()
}

/// Matches exact, prefix, `latest.*` and range selectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultVersionMatcher;

impl VersionMatcher for DefaultVersionMatcher {
    fn is_dynamic(&self, selector: &str) -> bool {
        VersionConstraint::parse(selector).is_dynamic()
    }

    fn accepts(&self, selector: &str, candidate: &str) -> bool {
        VersionConstraint::parse(selector).accepts(candidate)
    }
}

/// Semantic version ordering, falling back to string comparison for versions
/// that are not semver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SemverLatestStrategy;

impl LatestStrategy for SemverLatestStrategy {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        match (parse_lenient(a), parse_lenient(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.cmp(b),
        }
    }
}
