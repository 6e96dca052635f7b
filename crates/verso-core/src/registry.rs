//! Registry of known versions and default-version policy

use crate::config::VersioningConfig;
use crate::error::{Result, VersioningError};
use crate::version::ApiVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which version a request without an explicit version is served
///
/// Deserializes from `"earliest"`, `"latest"`, or any other string, which is
/// treated as a specific version and looked up in the registry on use.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DefaultVersion {
    /// The lowest registered version
    Earliest,
    /// The highest registered version
    #[default]
    Latest,
    /// A specific version string
    Specific(String),
}

impl From<String> for DefaultVersion {
    fn from(value: String) -> Self {
        match value.as_str() {
            "earliest" => Self::Earliest,
            "latest" => Self::Latest,
            _ => Self::Specific(value),
        }
    }
}

impl From<&str> for DefaultVersion {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<DefaultVersion> for String {
    fn from(value: DefaultVersion) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DefaultVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Earliest => f.write_str("earliest"),
            Self::Latest => f.write_str("latest"),
            Self::Specific(version) => f.write_str(version),
        }
    }
}

/// Ordered, duplicate-free set of known versions
///
/// Built once from configuration and read-only afterwards. Each entry keeps
/// the notes it was declared with, for changelog reporting.
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    versions: BTreeMap<ApiVersion, Vec<String>>,
    default: DefaultVersion,
}

impl VersionRegistry {
    /// Create a registry from versions without notes
    pub fn new(
        versions: impl IntoIterator<Item = ApiVersion>,
        default: DefaultVersion,
    ) -> Result<Self> {
        Self::with_notes(versions.into_iter().map(|v| (v, Vec::new())), default)
    }

    /// Create a registry from versions and their notes
    ///
    /// Fails with [`VersioningError::EmptyRegistry`] when no versions are given
    /// and [`VersioningError::DuplicateVersion`] when two entries compare equal
    /// (`1.0` and `1.0.0` count as duplicates).
    pub fn with_notes(
        entries: impl IntoIterator<Item = (ApiVersion, Vec<String>)>,
        default: DefaultVersion,
    ) -> Result<Self> {
        let mut versions = BTreeMap::new();
        for (version, notes) in entries {
            if versions.contains_key(&version) {
                return Err(VersioningError::DuplicateVersion(version.to_string()));
            }
            versions.insert(version, notes);
        }

        if versions.is_empty() {
            return Err(VersioningError::EmptyRegistry);
        }

        Ok(Self { versions, default })
    }

    /// Build a registry from static configuration
    pub fn from_config(config: &VersioningConfig) -> Result<Self> {
        let entries = config
            .versions
            .iter()
            .map(|entry| Ok((ApiVersion::parse(&entry.version)?, entry.notes.clone())))
            .collect::<Result<Vec<_>>>()?;
        Self::with_notes(entries, config.default_version.clone())
    }

    /// Registered versions, ascending
    pub fn list(&self) -> impl DoubleEndedIterator<Item = &ApiVersion> + ExactSizeIterator + '_ {
        self.versions.keys()
    }

    /// Number of registered versions
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether the registry is empty (never true for a constructed registry)
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Whether `version` is registered
    pub fn contains(&self, version: &ApiVersion) -> bool {
        self.versions.contains_key(version)
    }

    /// Notes declared for `version`
    pub fn notes(&self, version: &ApiVersion) -> &[String] {
        self.versions.get(version).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The configured default policy
    pub fn default_policy(&self) -> &DefaultVersion {
        &self.default
    }

    /// Lowest registered version
    pub fn earliest(&self) -> Result<&ApiVersion> {
        self.versions
            .keys()
            .next()
            .ok_or(VersioningError::EmptyRegistry)
    }

    /// Highest registered version
    pub fn latest(&self) -> Result<&ApiVersion> {
        self.versions
            .keys()
            .next_back()
            .ok_or(VersioningError::EmptyRegistry)
    }

    /// Look up a registered version by its string form
    ///
    /// Malformed input fails with [`VersioningError::InvalidVersionFormat`];
    /// well-formed input that matches no entry fails with
    /// [`VersioningError::VersionNotFound`].
    pub fn get(&self, version: &str) -> Result<&ApiVersion> {
        let parsed = ApiVersion::parse(version)?;
        self.resolve(&parsed)
            .ok_or_else(|| VersioningError::VersionNotFound(version.to_string()))
    }

    /// The registered entry equal to `version`, if any
    pub fn resolve(&self, version: &ApiVersion) -> Option<&ApiVersion> {
        self.versions.get_key_value(version).map(|(k, _)| k)
    }

    /// Apply the default-version policy
    pub fn resolve_default(&self) -> Result<&ApiVersion> {
        match &self.default {
            DefaultVersion::Earliest => self.earliest(),
            DefaultVersion::Latest => self.latest(),
            DefaultVersion::Specific(version) => self.get(version),
        }
    }
}
