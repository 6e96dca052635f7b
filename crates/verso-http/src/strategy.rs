//! Version extraction strategies
//!
//! Strategies locate the raw version string in a request. They do not parse
//! it: a request that names a malformed version must be told so, while a
//! request that names no version at all is served the default. Parsing and
//! resolution happen in [`VersionLayer`](crate::VersionLayer).

use http::{header, HeaderMap, Uri};
use serde::{Deserialize, Serialize};

const PLACEHOLDER: &str = "{version}";

/// Strategy for locating the API version in a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionStrategy {
    /// Extract version from URL path (e.g., /v1.0/things)
    ///
    /// The pattern must contain a `{version}` placeholder.
    /// Example: "/v{version}/" or "/api/{version}/"
    Path {
        /// Pattern for matching version in path
        pattern: String,
    },

    /// Extract version from an HTTP header
    ///
    /// Example: X-API-Version: 1.0
    Header {
        /// Header name to read version from
        name: String,
    },

    /// Extract version from a query parameter
    ///
    /// Example: ?version=1.0 (the value is percent-decoded)
    Query {
        /// Query parameter name
        param: String,
    },

    /// Extract version from a media-type parameter of the Accept header
    ///
    /// Example: Accept: application/json; version=1.0
    Accept {
        /// Media-type parameter name
        param: String,
    },

    /// Extract version from the request host
    ///
    /// Example: 1.0.api.example.com with pattern "{version}.api.example.com"
    Host {
        /// Host pattern with version placeholder
        pattern: String,
    },
}

impl VersionStrategy {
    /// Path-based strategy with the pattern "/v{version}/"
    pub fn path() -> Self {
        Self::path_with_pattern("/v{version}/")
    }

    /// Path strategy with a custom pattern
    pub fn path_with_pattern(pattern: impl Into<String>) -> Self {
        Self::Path {
            pattern: pattern.into(),
        }
    }

    /// Header-based strategy reading "X-API-Version"
    pub fn header() -> Self {
        Self::header_with_name("X-API-Version")
    }

    /// Header strategy with a custom header name
    pub fn header_with_name(name: impl Into<String>) -> Self {
        Self::Header { name: name.into() }
    }

    /// Query strategy reading the "version" parameter
    pub fn query() -> Self {
        Self::query_with_param("version")
    }

    /// Query strategy with a custom parameter name
    pub fn query_with_param(param: impl Into<String>) -> Self {
        Self::Query {
            param: param.into(),
        }
    }

    /// Accept-header strategy reading the "version" media-type parameter
    pub fn accept() -> Self {
        Self::accept_with_param("version")
    }

    /// Accept-header strategy with a custom parameter name
    pub fn accept_with_param(param: impl Into<String>) -> Self {
        Self::Accept {
            param: param.into(),
        }
    }

    /// Host strategy with a pattern such as "{version}.api.example.com"
    pub fn host(pattern: impl Into<String>) -> Self {
        Self::Host {
            pattern: pattern.into(),
        }
    }

    fn source(&self) -> VersionSource {
        match self {
            Self::Path { .. } => VersionSource::Path,
            Self::Header { .. } => VersionSource::Header,
            Self::Query { .. } => VersionSource::Query,
            Self::Accept { .. } => VersionSource::Accept,
            Self::Host { .. } => VersionSource::Host,
        }
    }

    fn extract(&self, uri: &Uri, headers: &HeaderMap) -> Option<String> {
        match self {
            Self::Path { pattern } => extract_path_version(uri.path(), pattern),
            Self::Header { name } => headers
                .get(name.as_str())
                .map(|value| String::from_utf8_lossy(value.as_bytes()).trim().to_string()),
            Self::Query { param } => extract_query_version(uri.query()?, param),
            Self::Accept { param } => headers
                .get_all(header::ACCEPT)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .find_map(|accept| extract_accept_version(accept, param)),
            Self::Host { pattern } => {
                let host = headers
                    .get(header::HOST)
                    .and_then(|value| value.to_str().ok())
                    .or_else(|| uri.host())?;
                extract_host_version(host, pattern)
            }
        }
    }
}

impl Default for VersionStrategy {
    fn default() -> Self {
        Self::header()
    }
}

/// Ordered list of strategies; the first one that finds a value wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionExtractor {
    strategies: Vec<VersionStrategy>,
}

impl VersionExtractor {
    /// Header strategy first, then the Accept media-type parameter
    pub fn new() -> Self {
        Self::with_strategies(vec![VersionStrategy::header(), VersionStrategy::accept()])
    }

    /// Create an extractor with a single strategy
    pub fn with_strategy(strategy: VersionStrategy) -> Self {
        Self::with_strategies(vec![strategy])
    }

    /// Create an extractor with multiple strategies (tried in order)
    pub fn with_strategies(strategies: Vec<VersionStrategy>) -> Self {
        Self { strategies }
    }

    /// Add a strategy to try
    pub fn add_strategy(mut self, strategy: VersionStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Configured strategies
    pub fn strategies(&self) -> &[VersionStrategy] {
        &self.strategies
    }

    /// Locate the raw version string, if the request carries one
    pub fn extract(&self, uri: &Uri, headers: &HeaderMap) -> Option<ExtractedVersion> {
        self.strategies.iter().find_map(|strategy| {
            strategy.extract(uri, headers).map(|raw| ExtractedVersion {
                raw,
                source: strategy.source(),
            })
        })
    }

    /// Locate the raw version string in a request
    pub fn extract_from_request<B>(&self, req: &http::Request<B>) -> Option<ExtractedVersion> {
        self.extract(req.uri(), req.headers())
    }

    /// Remove the version segment from a path, for routers that do not expect it
    pub fn strip_version_from_path(&self, path: &str) -> String {
        for strategy in &self.strategies {
            if let VersionStrategy::Path { pattern } = strategy {
                if let Some(stripped) = strip_path_version(path, pattern) {
                    return stripped;
                }
            }
        }
        path.to_string()
    }
}

impl Default for VersionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// A raw version string and where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedVersion {
    /// The string as sent, not yet parsed
    pub raw: String,
    /// Source of the version
    pub source: VersionSource,
}

/// Source from which the version was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    /// URL path
    Path,
    /// HTTP header
    Header,
    /// Query parameter
    Query,
    /// Accept header media-type parameter
    Accept,
    /// Request host
    Host,
    /// No version in the request; the default policy was applied
    Default,
}

fn split_pattern(pattern: &str) -> Option<(&str, &str)> {
    pattern.split_once(PLACEHOLDER)
}

/// Locate `(start, end)` of the version segment in `haystack`
///
/// Path and host segments only count as a version when they start with a
/// digit, so `/verbose/` under "/v{version}/" is not a malformed version but
/// no version at all.
fn locate(haystack: &str, before: &str, after: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    while let Some(found) = haystack[offset..].find(before) {
        let start = offset + found + before.len();
        let remaining = &haystack[start..];
        let len = if after.is_empty() {
            remaining.len()
        } else {
            remaining.find(after).unwrap_or(remaining.len())
        };
        if remaining.starts_with(|c: char| c.is_ascii_digit()) {
            return Some((start, start + len));
        }
        offset = offset + found + 1;
        if offset >= haystack.len() {
            break;
        }
    }
    None
}

fn extract_path_version(path: &str, pattern: &str) -> Option<String> {
    let (before, after) = split_pattern(pattern)?;
    let (start, end) = locate(path, before, after)?;
    Some(path[start..end].to_string())
}

fn strip_path_version(path: &str, pattern: &str) -> Option<String> {
    let (before, after) = split_pattern(pattern)?;
    let (start, end) = locate(path, before, after)?;
    let prefix = path[..start - before.len()].trim_end_matches('/');
    let suffix = path[end..].strip_prefix(after).unwrap_or(&path[end..]);
    // the segment separators consumed with the pattern are put back as one
    if before.starts_with('/') || path.starts_with('/') {
        return Some(format!("{}/{}", prefix, suffix.trim_start_matches('/')));
    }
    Some(format!("{}{}", prefix, suffix))
}

fn extract_query_version(query: &str, param: &str) -> Option<String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .ok()?
        .into_iter()
        .find_map(|(key, value)| (key == param).then(|| value.trim().to_string()))
}

fn extract_accept_version(accept: &str, param: &str) -> Option<String> {
    accept.split(',').find_map(|media_type| {
        media_type.split(';').skip(1).find_map(|parameter| {
            let (key, value) = parameter.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case(param)
                .then(|| value.trim().trim_matches('"').to_string())
        })
    })
}

fn extract_host_version(host: &str, pattern: &str) -> Option<String> {
    let host = host.rsplit_once(':').map_or(host, |(name, port)| {
        if port.chars().all(|c| c.is_ascii_digit()) {
            name
        } else {
            host
        }
    });
    let (before, after) = split_pattern(pattern)?;
    let rest = host.strip_prefix(before)?;
    let candidate = if after.is_empty() {
        rest
    } else {
        rest.strip_suffix(after)?
    };
    candidate
        .starts_with(|c: char| c.is_ascii_digit())
        .then(|| candidate.to_string())
}
