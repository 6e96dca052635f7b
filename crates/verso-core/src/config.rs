//! Static versioning configuration
//!
//! The configuration is loaded once at startup and handed to
//! [`Versioning::builder`](crate::Versioning::builder). It can come from JSON
//! or, with the `env` feature, from environment variables (and a `.env`
//! file).
//!
//! # Example
//!
//! ```rust
//! use verso_core::config::VersioningConfig;
//!
//! let config = VersioningConfig::from_json_str(r#"{
//!     "versions": [
//!         "1.0.0",
//!         {"version": "2.0.0", "notes": ["Added Thing model."]}
//!     ],
//!     "default_version": "earliest"
//! }"#).unwrap();
//! assert_eq!(config.versions.len(), 2);
//! ```

use crate::error::{Result, VersioningError};
use crate::registry::DefaultVersion;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix used by [`VersioningConfig::from_env`]
pub const ENV_PREFIX: &str = "VERSO_";

/// One known version and its release notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntryRepr")]
pub struct VersionEntry {
    /// Version string
    pub version: String,
    /// Human-readable notes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl VersionEntry {
    /// An entry without notes
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            notes: Vec::new(),
        }
    }

    /// Add a note
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntryRepr {
    Bare(String),
    Full {
        version: String,
        #[serde(default)]
        notes: Vec<String>,
    },
}

impl From<EntryRepr> for VersionEntry {
    fn from(repr: EntryRepr) -> Self {
        match repr {
            EntryRepr::Bare(version) => Self::new(version),
            EntryRepr::Full { version, notes } => Self { version, notes },
        }
    }
}

/// Versioning configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Known versions
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
    /// Default-version policy for requests without a version
    #[serde(default)]
    pub default_version: DefaultVersion,
}

impl VersioningConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a version
    pub fn version(mut self, entry: impl Into<VersionEntry>) -> Self {
        self.versions.push(entry.into());
        self
    }

    /// Set the default policy
    pub fn default_version(mut self, default: impl Into<DefaultVersion>) -> Self {
        self.default_version = default.into();
        self
    }

    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| VersioningError::Config(e.to_string()))
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| VersioningError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    /// Load from `VERSO_*` environment variables
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// - `VERSO_VERSIONS`: comma-separated version list
    /// - `VERSO_DEFAULT_VERSION`: `earliest`, `latest` or a version (default `latest`)
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_env_prefixed(ENV_PREFIX)
    }

    /// Load from environment variables with a custom prefix
    #[cfg(feature = "env")]
    pub fn from_env_prefixed(prefix: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct EnvConfig {
            versions: Vec<String>,
            #[serde(default)]
            default_version: DefaultVersion,
        }

        let env: EnvConfig = envy::prefixed(prefix)
            .from_env()
            .map_err(|e| VersioningError::Config(e.to_string()))?;

        Ok(Self {
            versions: env
                .versions
                .into_iter()
                .map(|v| VersionEntry::new(v.trim()))
                .collect(),
            default_version: env.default_version,
        })
    }
}

impl From<&str> for VersionEntry {
    fn from(version: &str) -> Self {
        Self::new(version)
    }
}

impl From<String> for VersionEntry {
    fn from(version: String) -> Self {
        Self::new(version)
    }
}
