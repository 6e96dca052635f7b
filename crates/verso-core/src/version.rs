//! API version type and parsing
//!
//! Provides the totally ordered, dotted-numeric version identifier used
//! everywhere else in the crate.

use crate::error::{Result, VersioningError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// API version as a dotted sequence of non-negative integers
///
/// Supports formats like:
/// - `1`, `2` (major only)
/// - `1.0`, `6.9` (major.minor)
/// - `1.0.0`, `2.1.3.4` (any number of components)
/// - `v1.2`, `V2` (optional leading `v`)
///
/// Comparison pads the shorter sequence with zeros, so `1.0` and `1.0.0`
/// are equal and hash identically. The canonical string keeps the declared
/// components, so `6.9` displays as `6.9`.
#[derive(Debug, Clone)]
pub struct ApiVersion {
    parts: SmallVec<[u64; 4]>,
}

impl ApiVersion {
    /// Create a `major.minor.patch` version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            parts: SmallVec::from_slice(&[major, minor, patch]),
        }
    }

    /// Create a version with only a major number
    pub fn major_only(major: u64) -> Self {
        Self {
            parts: SmallVec::from_slice(&[major]),
        }
    }

    /// Create a version from explicit components
    pub fn from_parts(parts: &[u64]) -> Result<Self> {
        if parts.is_empty() {
            return Err(VersioningError::InvalidVersionFormat(String::new()));
        }
        Ok(Self {
            parts: SmallVec::from_slice(parts),
        })
    }

    /// Parse a version string
    ///
    /// Fails with [`VersioningError::InvalidVersionFormat`] unless the input is
    /// a non-empty dotted sequence of decimal integers. Each component must
    /// fit in a `u64`; larger components are rejected the same way.
    pub fn parse(s: &str) -> Result<Self> {
        let body = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .unwrap_or(s);

        if body.is_empty() {
            return Err(VersioningError::InvalidVersionFormat(s.to_string()));
        }

        let mut parts = SmallVec::new();
        for segment in body.split('.') {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersioningError::InvalidVersionFormat(s.to_string()));
            }
            let number = segment
                .parse()
                .map_err(|_| VersioningError::InvalidVersionFormat(s.to_string()))?;
            parts.push(number);
        }

        Ok(Self { parts })
    }

    /// The declared components
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// Major component
    pub fn major(&self) -> u64 {
        self.component(0)
    }

    /// Minor component (0 when not declared)
    pub fn minor(&self) -> u64 {
        self.component(1)
    }

    /// Patch component (0 when not declared)
    pub fn patch(&self) -> u64 {
        self.component(2)
    }

    /// Component at `index`, zero-padded
    pub fn component(&self, index: usize) -> u64 {
        self.parts.get(index).copied().unwrap_or(0)
    }

    /// Compare against a raw string, parsing it first
    ///
    /// There is deliberately no infallible `PartialOrd<str>`: a malformed
    /// string must surface as an error instead of comparing as "not equal".
    pub fn compare_str(&self, other: &str) -> Result<Ordering> {
        Ok(self.cmp(&Self::parse(other)?))
    }

    /// Components with trailing zeros removed
    fn significant(&self) -> &[u64] {
        let len = self
            .parts
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |i| i + 1);
        &self.parts[..len]
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.parts {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for ApiVersion {
    type Err = VersioningError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ApiVersion {
    type Error = VersioningError;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for ApiVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ApiVersion {}

impl Hash for ApiVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
