//! Protocol version identifiers
//!
//! WFS versions are written as semantic versions (`2.0.0`). This module
//! provides the parsed, totally ordered [`ProtocolVersion`] and the
//! [`VersionSet`] the negotiator walks through.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

// https://semver.org grammar, without the leading "v" some tools accept
static SEMVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[A-Za-z-][0-9A-Za-z-]*)(?:\.(?:0|[1-9]\d*|\d*[A-Za-z-][0-9A-Za-z-]*))*))?(?:\+([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$",
    )
    .unwrap()
});

/// A semantic protocol version
///
/// Equality and ordering follow semver precedence, so build metadata is
/// carried for display only.
#[derive(Debug, Clone)]
pub struct ProtocolVersion {
    /// Major component
    pub major: u64,
    /// Minor component
    pub minor: u64,
    /// Patch component
    pub patch: u64,
    /// Pre-release identifiers (after `-`)
    pub pre: Option<String>,
    /// Build metadata (after `+`)
    pub build: Option<String>,
}

impl ProtocolVersion {
    /// Create a release version
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
            build: None,
        }
    }

    /// Parse a version, returning `None` when the text is not a valid semantic version
    pub fn parse(text: &str) -> Option<Self> {
        let caps = SEMVER.captures(text)?;
        let number = |i: usize| caps.get(i)?.as_str().parse::<u64>().ok();
        Some(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            pre: caps.get(4).map(|m| m.as_str().to_string()),
            build: caps.get(5).map(|m| m.as_str().to_string()),
        })
    }

    fn compare_pre(a: &str, b: &str) -> Ordering {
        let mut left = a.split('.');
        let mut right = b.split('.');
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(x), Some(y)) => {
                    let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                        (Ok(x), Ok(y)) => x.cmp(&y),
                        // numeric identifiers have lower precedence
                        (Ok(_), Err(_)) => Ordering::Less,
                        (Err(_), Ok(_)) => Ordering::Greater,
                        (Err(_), Err(_)) => x.cmp(y),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::Config(format!("Invalid version: '{}'", s)))
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.pre {
            write!(f, "-{}", pre)?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl Ord for ProtocolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => Self::compare_pre(a, b),
            })
    }
}

impl PartialOrd for ProtocolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ProtocolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ProtocolVersion {}

impl Hash for ProtocolVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.pre.hash(state);
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid version '{}'", text)))
    }
}

/// Non-empty set of versions in strictly descending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSet {
    versions: Vec<ProtocolVersion>,
}

impl VersionSet {
    /// Build a set from versions listed highest first
    pub fn new(versions: Vec<ProtocolVersion>) -> Result<Self> {
        if versions.is_empty() {
            return Err(Error::Config("Version set must not be empty".to_string()));
        }
        if let Some(pair) = versions.windows(2).find(|w| w[0] <= w[1]) {
            return Err(Error::Config(format!(
                "Versions must be strictly descending: {} is listed before {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self { versions })
    }

    /// Build a set from versions in any order, dropping duplicates
    pub fn from_unordered(mut versions: Vec<ProtocolVersion>) -> Result<Self> {
        versions.sort_by(|a, b| b.cmp(a));
        versions.dedup();
        Self::new(versions)
    }

    /// Highest version
    pub fn highest(&self) -> &ProtocolVersion {
        &self.versions[0]
    }

    /// The set's own entry equal to `version`
    ///
    /// Equality ignores build metadata, so the returned entry may differ in
    /// display from `version`.
    pub fn get(&self, version: &ProtocolVersion) -> Option<&ProtocolVersion> {
        self.versions
            .binary_search_by(|v| version.cmp(v))
            .ok()
            .map(|i| &self.versions[i])
    }

    /// Whether the set contains the version
    pub fn contains(&self, version: &ProtocolVersion) -> bool {
        self.get(version).is_some()
    }

    /// Greatest version strictly less than `version`
    pub fn next_below(&self, version: &ProtocolVersion) -> Option<&ProtocolVersion> {
        self.versions.iter().find(|v| *v < version)
    }

    /// Iterate versions highest first
    pub fn iter(&self) -> impl Iterator<Item = &ProtocolVersion> {
        self.versions.iter()
    }

    /// Number of versions
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
